//! SELECT statement builder
//!
//! A `Select` is assembled from a base table plus an ordered chain of
//! validated options; each option either returns the extended builder or
//! fails the whole construction. Joins are separate operations returning a
//! new `Select` with one more query block. The finished value is an ordinary
//! expression node, so it nests as a sub-select, a CTE body or a UNION
//! branch.

use crate::expr::{write_parts, Expr, ToSql};
use crate::ident::is_valid_identifier;
use crate::{Error, Result, Value};

/// Sort direction for ORDER BY entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// One ORDER BY entry: a column name plus a direction.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    column: String,
    direction: SortDirection,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl ToSql for OrderBy {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        Ok((
            format!("{} {}", self.column, self.direction.as_str()),
            Vec::new(),
        ))
    }
}

/// Join linkage between consecutive query blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    LeftInner,
    RightInner,
    LeftOuter,
    RightOuter,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinType::LeftInner => "LEFT INNER JOIN",
            JoinType::RightInner => "RIGHT INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
        }
    }
}

/// A common table expression: `name(columns) AS (inner)`
#[derive(Debug, Clone)]
pub struct Cte {
    name: String,
    columns: Vec<Expr>,
    inner: Select,
}

impl ToSql for Cte {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let mut buf = String::new();
        let mut args = Vec::new();
        buf.push_str(&self.name);
        buf.push('(');
        write_parts(&mut buf, &mut args, &self.columns)?;
        buf.push_str(") AS (");
        let (sql, mut vals) = self.inner.to_sql()?;
        buf.push_str(&sql);
        args.append(&mut vals);
        buf.push(')');
        Ok((buf, args))
    }
}

/// One FROM-clause entry: a source, its projected columns, and how it is
/// joined to the previous block. The first block carries no join.
#[derive(Debug, Clone)]
struct QueryBlock {
    columns: Vec<Expr>,
    table: Expr,
    join: Option<(JoinType, Expr)>,
}

/// SELECT statement
#[derive(Debug, Clone)]
pub struct Select {
    ctes: Vec<Cte>,
    blocks: Vec<QueryBlock>,
    where_clause: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderBy>,
    limit: i64,
    offset: i64,
    distinct: bool,
}

impl Select {
    /// Create a SELECT over the given table. The table name is validated
    /// when the statement renders.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            ctes: Vec::new(),
            blocks: vec![QueryBlock {
                columns: Vec::new(),
                table: Expr::ident(table),
                join: None,
            }],
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
            distinct: false,
        }
    }

    /// Project columns by name into the current query block. Every name
    /// must be a valid identifier.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let block = self.blocks.last_mut().expect("select has a query block");
        for column in columns {
            let column = column.as_ref();
            if !is_valid_identifier(column) {
                return Err(Error::invalid_identifier(column));
            }
            block.columns.push(Expr::ident(column));
        }
        Ok(self)
    }

    /// Project an arbitrary expression node into the current query block.
    pub fn column(mut self, expr: Expr) -> Self {
        let block = self.blocks.last_mut().expect("select has a query block");
        block.columns.push(expr);
        self
    }

    /// Request DISTINCT rows.
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Alias the base table.
    pub fn alias(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(Error::invalid_identifier(name));
        }
        self.blocks[0].table = self.blocks[0].table.clone().alias(name);
        Ok(self)
    }

    /// Set the WHERE clause; the expression must be relational.
    pub fn where_(mut self, expr: Expr) -> Result<Self> {
        if !expr.is_relational() {
            return Err(Error::syntax("where: expected a relational expression"));
        }
        self.where_clause = Some(expr);
        Ok(self)
    }

    /// Append GROUP BY targets.
    pub fn group_by<I>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        self.group_by.extend(columns);
        self
    }

    /// Set the HAVING clause; the expression must be relational. The
    /// clause only renders together with GROUP BY.
    pub fn having(mut self, expr: Expr) -> Result<Self> {
        if !expr.is_relational() {
            return Err(Error::syntax("having: expected a relational expression"));
        }
        self.having = Some(expr);
        Ok(self)
    }

    /// Append ORDER BY entries; every column must be a valid identifier.
    pub fn order_by<I>(mut self, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = OrderBy>,
    {
        for entry in entries {
            if !is_valid_identifier(entry.column()) {
                return Err(Error::invalid_identifier(entry.column()));
            }
            self.order_by.push(entry);
        }
        Ok(self)
    }

    /// Set the LIMIT. Zero leaves the clause out; negative values fail.
    pub fn limit(mut self, limit: i64) -> Result<Self> {
        if limit < 0 {
            return Err(Error::invalid_limit(limit));
        }
        self.limit = limit;
        Ok(self)
    }

    /// Set the OFFSET. Zero leaves the clause out; negative values fail.
    pub fn offset(mut self, offset: i64) -> Result<Self> {
        if offset < 0 {
            return Err(Error::invalid_limit(offset));
        }
        self.offset = offset;
        Ok(self)
    }

    /// Attach a common table expression.
    pub fn with<I>(mut self, name: impl Into<String>, query: Select, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = Expr>,
    {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(Error::invalid_identifier(name));
        }
        self.ctes.push(Cte {
            name,
            columns: columns.into_iter().collect(),
            inner: query,
        });
        Ok(self)
    }

    pub fn left_inner_join(self, source: Expr, condition: Expr) -> Result<Self> {
        self.join(JoinType::LeftInner, source, condition)
    }

    pub fn right_inner_join(self, source: Expr, condition: Expr) -> Result<Self> {
        self.join(JoinType::RightInner, source, condition)
    }

    pub fn left_outer_join(self, source: Expr, condition: Expr) -> Result<Self> {
        self.join(JoinType::LeftOuter, source, condition)
    }

    pub fn right_outer_join(self, source: Expr, condition: Expr) -> Result<Self> {
        self.join(JoinType::RightOuter, source, condition)
    }

    fn join(mut self, join: JoinType, source: Expr, condition: Expr) -> Result<Self> {
        if !source.is_joinable() {
            return Err(Error::syntax("join: source can not be joined"));
        }
        match condition {
            Expr::Compare { .. } | Expr::And { .. } | Expr::Or { .. } | Expr::List(_) => {}
            _ => return Err(Error::syntax("join: invalid condition type")),
        }
        self.blocks.push(QueryBlock {
            columns: Vec::new(),
            table: source,
            join: Some((join, condition)),
        });
        Ok(self)
    }

    /// Wrap this statement in an EXISTS node.
    pub fn exists(self) -> Expr {
        Expr::exists(self.into())
    }

    /// Total number of projected columns across all query blocks.
    pub(crate) fn columns_count(&self) -> usize {
        self.blocks.iter().map(|block| block.columns.len()).sum()
    }
}

impl ToSql for Select {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let mut buf = String::new();
        let mut args = Vec::new();
        if !self.ctes.is_empty() {
            buf.push_str("WITH ");
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                let (sql, mut vals) = cte.to_sql()?;
                buf.push_str(&sql);
                args.append(&mut vals);
            }
            buf.push(' ');
        }
        buf.push_str("SELECT ");
        if self.distinct {
            buf.push_str("DISTINCT ");
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                buf.push_str(", ");
            }
            if block.columns.is_empty() {
                buf.push('*');
                continue;
            }
            write_parts(&mut buf, &mut args, &block.columns)?;
        }
        buf.push_str(" FROM ");
        for block in &self.blocks {
            if let Some((join, _)) = &block.join {
                buf.push(' ');
                buf.push_str(join.keyword());
                buf.push(' ');
            }
            let (sql, mut vals) = block.table.to_sql()?;
            buf.push_str(&sql);
            args.append(&mut vals);

            if let Some((_, condition)) = &block.join {
                let (sql, mut vals) = condition.to_sql()?;
                match condition {
                    Expr::Compare { .. } | Expr::And { .. } | Expr::Or { .. } => {
                        buf.push_str(" ON ");
                        buf.push_str(&sql);
                    }
                    Expr::List(_) => {
                        buf.push_str(" USING (");
                        buf.push_str(&sql);
                        buf.push(')');
                    }
                    _ => return Err(Error::syntax("join: invalid condition type")),
                }
                args.append(&mut vals);
            }
        }
        if let Some(where_clause) = &self.where_clause {
            let (sql, mut vals) = where_clause.to_sql()?;
            buf.push_str(" WHERE ");
            buf.push_str(&sql);
            args.append(&mut vals);
        }
        if !self.group_by.is_empty() {
            buf.push_str(" GROUP BY ");
            write_parts(&mut buf, &mut args, &self.group_by)?;
            if let Some(having) = &self.having {
                buf.push_str(" HAVING ");
                let (sql, mut vals) = having.to_sql()?;
                buf.push_str(&sql);
                args.append(&mut vals);
            }
        }
        if !self.order_by.is_empty() {
            buf.push_str(" ORDER BY ");
            for (i, entry) in self.order_by.iter().enumerate() {
                if i > 0 {
                    buf.push_str(", ");
                }
                let (sql, _) = entry.to_sql()?;
                buf.push_str(&sql);
            }
        }
        if self.limit > 0 {
            buf.push_str(" LIMIT ");
            buf.push_str(&self.limit.to_string());
        }
        if self.offset > 0 {
            buf.push_str(" OFFSET ");
            buf.push_str(&self.offset.to_string());
        }
        Ok((buf, args))
    }
}

/// UNION of two SELECT statements
#[derive(Debug, Clone)]
pub struct Union {
    left: Select,
    right: Select,
    all: bool,
}

impl Union {
    /// `left UNION right`; both sides must project the same number of
    /// columns.
    pub fn new(left: Select, right: Select) -> Result<Self> {
        Self::build(left, right, false)
    }

    /// `left UNION ALL right`; both sides must project the same number of
    /// columns.
    pub fn new_all(left: Select, right: Select) -> Result<Self> {
        Self::build(left, right, true)
    }

    fn build(left: Select, right: Select, all: bool) -> Result<Self> {
        if left.columns_count() != right.columns_count() {
            return Err(Error::syntax("union: columns count mismatch"));
        }
        Ok(Self { left, right, all })
    }
}

impl ToSql for Union {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let (left_sql, mut args) = self.left.to_sql()?;
        let (right_sql, mut vals) = self.right.to_sql()?;
        args.append(&mut vals);
        let keyword = if self.all { "UNION ALL" } else { "UNION" };
        Ok((format!("{left_sql} {keyword} {right_sql}"), args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_star() {
        let (sql, args) = Select::new("users").to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
        assert!(args.is_empty());
    }

    #[test]
    fn test_select_columns_and_limit() {
        let query = Select::new("users")
            .columns(["id", "first", "last"])
            .unwrap()
            .limit(10)
            .unwrap();
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(sql, "SELECT id, first, last FROM users LIMIT 10");
    }

    #[test]
    fn test_select_where_with_argument() {
        let query = Select::new("users")
            .where_(Expr::equal(Expr::ident("role"), Expr::arg("role", "admin")))
            .unwrap();
        let (sql, args) = query.to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE role = @role");
        assert_eq!(args, vec![Value::Text("admin".to_string())]);
    }

    #[test]
    fn test_select_alias_and_order_by() {
        let query = Select::new("users")
            .column(Expr::qualified("id", ["u"]))
            .column(Expr::qualified("first", ["u"]))
            .column(Expr::qualified("last", ["u"]))
            .order_by([OrderBy::asc("first"), OrderBy::asc("last")])
            .unwrap()
            .alias("u")
            .unwrap()
            .where_(Expr::equal(Expr::ident("role"), Expr::arg("role", "admin")))
            .unwrap();
        let (sql, args) = query.to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT u.id, u.first, u.last FROM users AS u WHERE role = @role \
             ORDER BY first ASC, last ASC"
        );
        assert_eq!(args, vec![Value::Text("admin".to_string())]);
    }

    #[test]
    fn test_select_group_by() {
        let query = Select::new("users")
            .group_by([Expr::ident("active")])
            .column(Expr::func("COUNT", [Expr::ident("id")]));
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(sql, "SELECT COUNT(id) FROM users GROUP BY active");
    }

    #[test]
    fn test_select_having_needs_group_by_to_render() {
        let query = Select::new("users")
            .column(Expr::func("COUNT", [Expr::ident("id")]))
            .having(Expr::greater_than(
                Expr::func("COUNT", [Expr::ident("id")]),
                Expr::literal(5),
            ))
            .unwrap();
        let (sql, _) = query.to_sql().unwrap();
        // no GROUP BY, so HAVING is omitted
        assert_eq!(sql, "SELECT COUNT(id) FROM users");

        let (sql, _) = query
            .clone()
            .group_by([Expr::ident("active")])
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(id) FROM users GROUP BY active HAVING COUNT(id) > 5"
        );
    }

    #[test]
    fn test_select_distinct() {
        let query = Select::new("users").columns(["role"]).unwrap().distinct();
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(sql, "SELECT DISTINCT role FROM users");
    }

    #[test]
    fn test_negative_limit_fails() {
        let err = Select::new("users").limit(-1).unwrap_err();
        assert_eq!(err, Error::invalid_limit(-1));

        let err = Select::new("users").offset(-5).unwrap_err();
        assert_eq!(err, Error::invalid_limit(-5));
    }

    #[test]
    fn test_zero_limit_omits_clause() {
        let query = Select::new("users").limit(0).unwrap().offset(0).unwrap();
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_where_rejects_non_relational() {
        let err = Select::new("users").where_(Expr::literal(1)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid syntax: where: expected a relational expression"
        );
    }

    #[test]
    fn test_invalid_column_fails() {
        let err = Select::new("users").columns(["1bad"]).unwrap_err();
        assert_eq!(err, Error::invalid_identifier("1bad"));
    }

    fn users() -> Select {
        Select::new("users")
            .column(Expr::qualified("id", ["u"]))
            .column(Expr::qualified("first", ["u"]))
            .column(Expr::qualified("last", ["u"]))
            .alias("u")
            .unwrap()
    }

    fn join_fixture(
        join: impl FnOnce(Select, Expr, Expr) -> Result<Select>,
    ) -> Result<Select> {
        let source = Expr::ident("positions").alias("p");
        let condition = Expr::equal(
            Expr::qualified("id", ["u"]),
            Expr::qualified("user", ["p"]),
        );
        let joined = join(users(), source, condition)?;
        Ok(joined
            .column(Expr::qualified("id", ["p"]))
            .column(Expr::qualified("name", ["p"])))
    }

    #[test]
    fn test_joins() {
        let cases: [(fn(Select, Expr, Expr) -> Result<Select>, &str); 4] = [
            (Select::left_inner_join, "LEFT INNER JOIN"),
            (Select::right_inner_join, "RIGHT INNER JOIN"),
            (Select::left_outer_join, "LEFT OUTER JOIN"),
            (Select::right_outer_join, "RIGHT OUTER JOIN"),
        ];
        for (join, keyword) in cases {
            let (sql, _) = join_fixture(join).unwrap().to_sql().unwrap();
            assert_eq!(
                sql,
                format!(
                    "SELECT u.id, u.first, u.last, p.id, p.name FROM users AS u \
                     {keyword} positions AS p ON u.id = p.user"
                )
            );
        }
    }

    #[test]
    fn test_join_using_renders_column_list() {
        let joined = users()
            .left_inner_join(
                Expr::ident("positions").alias("p"),
                Expr::list([Expr::ident("user")]),
            )
            .unwrap();
        let (sql, _) = joined.to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT u.id, u.first, u.last FROM users AS u \
             LEFT INNER JOIN positions AS p USING (user)"
        );
    }

    #[test]
    fn test_join_rejects_bad_source_and_condition() {
        let condition = Expr::equal(Expr::ident("a"), Expr::ident("b"));
        let err = users()
            .left_inner_join(Expr::literal(1), condition.clone())
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid syntax: join: source can not be joined");

        let err = users()
            .left_inner_join(Expr::ident("positions"), Expr::literal(1))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid syntax: join: invalid condition type");
    }

    #[test]
    fn test_subquery_as_join_source() {
        let inner = Select::new("events").columns(["user_id"]).unwrap();
        let joined = users()
            .left_inner_join(
                Expr::from(inner).alias("e"),
                Expr::equal(
                    Expr::qualified("id", ["u"]),
                    Expr::qualified("user_id", ["e"]),
                ),
            )
            .unwrap();
        let (sql, _) = joined.to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT u.id, u.first, u.last FROM users AS u LEFT INNER JOIN \
             (SELECT user_id FROM events) AS e ON u.id = e.user_id"
        );
    }

    #[test]
    fn test_cte_rendering() {
        let inner = Select::new("events")
            .columns(["user_id", "at"])
            .unwrap();
        let query = Select::new("recent")
            .with("recent", inner, [Expr::ident("user_id"), Expr::ident("at")])
            .unwrap();
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(
            sql,
            "WITH recent(user_id, at) AS (SELECT user_id, at FROM events) \
             SELECT * FROM recent"
        );
    }

    #[test]
    fn test_select_nests_as_subquery_in_where() {
        let average = Select::new("users")
            .column(Expr::func("AVG", [Expr::ident("conn")]))
            .group_by([Expr::ident("id")]);
        let query = Select::new("users")
            .where_(Expr::greater_or_equal(Expr::ident("conn"), average.into()))
            .unwrap();
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT * FROM users WHERE conn >= \
             (SELECT AVG(conn) FROM users GROUP BY id)"
        );
    }

    #[test]
    fn test_exists_wrapper() {
        let (sql, _) = Select::new("users").exists().to_sql().unwrap();
        assert_eq!(sql, "EXISTS SELECT * FROM users");
    }

    #[test]
    fn test_union() {
        let left = Select::new("users").columns(["id"]).unwrap();
        let right = Select::new("admins").columns(["id"]).unwrap();
        let union = Union::new(left.clone(), right.clone()).unwrap();
        let (sql, _) = union.to_sql().unwrap();
        assert_eq!(sql, "SELECT id FROM users UNION SELECT id FROM admins");

        let union = Union::new_all(left, right).unwrap();
        let (sql, _) = union.to_sql().unwrap();
        assert_eq!(sql, "SELECT id FROM users UNION ALL SELECT id FROM admins");
    }

    #[test]
    fn test_union_column_count_mismatch_fails() {
        let left = Select::new("users").columns(["id", "first"]).unwrap();
        let right = Select::new("admins").columns(["id"]).unwrap();
        let err = Union::new(left, right).unwrap_err();
        assert_eq!(err.to_string(), "invalid syntax: union: columns count mismatch");
    }

    #[test]
    fn test_union_argument_order() {
        let left = Select::new("users")
            .columns(["id"])
            .unwrap()
            .where_(Expr::equal(Expr::ident("role"), Expr::arg("left", "a")))
            .unwrap();
        let right = Select::new("admins")
            .columns(["id"])
            .unwrap()
            .where_(Expr::equal(Expr::ident("role"), Expr::arg("right", "b")))
            .unwrap();
        let (sql, args) = Union::new(left, right).unwrap().to_sql().unwrap();
        assert_eq!(
            sql,
            "SELECT id FROM users WHERE role = @left UNION \
             SELECT id FROM admins WHERE role = @right"
        );
        assert_eq!(
            args,
            vec![Value::Text("a".to_string()), Value::Text("b".to_string())]
        );
    }
}
