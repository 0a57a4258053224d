//! DELETE statement builder

use crate::expr::{write_parts, Expr, ToSql};
use crate::ident::is_valid_identifier;
use crate::{Error, Result, Value};

/// DELETE statement
#[derive(Debug, Clone)]
pub struct Delete {
    table: Expr,
    where_clause: Option<Expr>,
    returning: Vec<Expr>,
}

impl Delete {
    /// Create a DELETE from the given table. The table name is validated
    /// when the statement renders.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: Expr::ident(table),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    /// Alias the target table.
    pub fn alias(mut self, name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if !is_valid_identifier(&name) {
            return Err(Error::invalid_identifier(name));
        }
        self.table = self.table.alias(name);
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

    /// Append RETURNING expressions.
    pub fn returning<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = Expr>,
    {
        self.returning.extend(values);
        self
    }
}

impl ToSql for Delete {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        let mut buf = String::new();
        let mut args = Vec::new();
        buf.push_str("DELETE FROM ");
        let (sql, mut vals) = self.table.to_sql()?;
        buf.push_str(&sql);
        args.append(&mut vals);
        if let Some(where_clause) = &self.where_clause {
            buf.push_str(" WHERE ");
            let (sql, mut vals) = where_clause.to_sql()?;
            buf.push_str(&sql);
            args.append(&mut vals);
        }
        if !self.returning.is_empty() {
            buf.push_str(" RETURNING ");
            write_parts(&mut buf, &mut args, &self.returning)?;
        }
        Ok((buf, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Select;

    #[test]
    fn test_delete_all_rows() {
        let (sql, args) = Delete::new("users").to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM users");
        assert!(args.is_empty());
    }

    #[test]
    fn test_delete_with_where() {
        let query = Delete::new("users")
            .where_(Expr::equal(Expr::ident("role"), Expr::literal("admin")))
            .unwrap();
        let (sql, _) = query.to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE role = 'admin'");
    }

    #[test]
    fn test_delete_with_alias_and_argument() {
        let query = Delete::new("users")
            .alias("u")
            .unwrap()
            .where_(Expr::not_equal(
                Expr::qualified("role", ["u"]),
                Expr::arg("role", "test"),
            ))
            .unwrap();
        let (sql, args) = query.to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM users AS u WHERE u.role <> @role");
        assert_eq!(args, vec![Value::Text("test".to_string())]);
    }

    #[test]
    fn test_delete_with_subquery_condition() {
        let average = Select::new("users")
            .column(Expr::func("AVG", [Expr::ident("conn")]))
            .group_by([Expr::ident("id")]);
        let query = Delete::new("users")
            .where_(Expr::and(
                Expr::greater_or_equal(Expr::ident("conn"), average.into()),
                Expr::not_equal(Expr::ident("role"), Expr::arg("role", "test")),
            ))
            .unwrap();
        let (sql, args) = query.to_sql().unwrap();
        assert_eq!(
            sql,
            "DELETE FROM users WHERE conn >= \
             (SELECT AVG(conn) FROM users GROUP BY id) AND role <> @role"
        );
        assert_eq!(args, vec![Value::Text("test".to_string())]);
    }

    #[test]
    fn test_delete_returning() {
        let query = Delete::new("users")
            .where_(Expr::equal(Expr::ident("id"), Expr::arg("id", 3)))
            .unwrap()
            .returning([Expr::ident("id")]);
        let (sql, args) = query.to_sql().unwrap();
        assert_eq!(sql, "DELETE FROM users WHERE id = @id RETURNING id");
        assert_eq!(args, vec![Value::I32(3)]);
    }

    #[test]
    fn test_delete_where_rejects_non_relational() {
        let err = Delete::new("users")
            .where_(Expr::literal("admin"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid syntax: where: expected a relational expression"
        );
    }
}
