//! UPDATE statement builder

use crate::expr::{write_parts, Expr, ToSql};
use crate::ident::is_valid_identifier;
use crate::{Error, Result, Value};

/// UPDATE statement
#[derive(Debug, Clone)]
pub struct Update {
    table: Expr,
    assignments: Vec<Expr>,
    where_clause: Option<Expr>,
    returning: Vec<Expr>,
}

impl Update {
    /// Create an UPDATE of the given table. The table name is validated
    /// when the statement renders.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: Expr::ident(table),
            assignments: Vec::new(),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    /// Assign a value to a column; renders `column = value`.
    pub fn set(mut self, column: impl AsRef<str>, value: Expr) -> Result<Self> {
        let column = column.as_ref();
        if !is_valid_identifier(column) {
            return Err(Error::invalid_identifier(column));
        }
        self.assignments
            .push(Expr::equal(Expr::ident(column), value));
        Ok(self)
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

impl ToSql for Update {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        if self.assignments.is_empty() {
            return Err(Error::syntax("update: no columns given to be set"));
        }
        let mut buf = String::new();
        let mut args = Vec::new();
        buf.push_str("UPDATE ");
        let (sql, _) = self.table.to_sql()?;
        buf.push_str(&sql);
        buf.push_str(" SET ");
        write_parts(&mut buf, &mut args, &self.assignments)?;
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
