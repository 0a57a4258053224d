//! INSERT statement builder

use crate::expr::{write_parts, Expr, ToSql};
use crate::ident::is_valid_identifier;
use crate::{Error, Result, Value};

/// INSERT statement
#[derive(Debug, Clone)]
pub struct Insert {
    table: Expr,
    columns: Vec<Expr>,
    rows: Vec<Vec<Expr>>,
    returning: Vec<Expr>,
}

impl Insert {
    /// Create an INSERT into the given table. The table name is validated
    /// when the statement renders.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: Expr::ident(table),
            columns: Vec::new(),
            rows: Vec::new(),
            returning: Vec::new(),
        }
    }

    /// Name the target columns. Every name must be a valid identifier.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for column in columns {
            let column = column.as_ref();
            if !is_valid_identifier(column) {
                return Err(Error::invalid_identifier(column));
            }
            self.columns.push(Expr::ident(column));
        }
        Ok(self)
    }

    /// Append one value row. Rows must not be empty; when columns are
    /// named, each row must match their count.
    pub fn values<I>(mut self, row: I) -> Result<Self>
    where
        I: IntoIterator<Item = Expr>,
    {
        let row: Vec<Expr> = row.into_iter().collect();
        if row.is_empty() {
            return Err(Error::syntax("values: no values given"));
        }
        self.rows.push(row);
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

impl ToSql for Insert {
    fn to_sql(&self) -> Result<(String, Vec<Value>)> {
        if self.rows.is_empty() {
            return Err(Error::syntax("insert: no values given to be inserted"));
        }
        let mut buf = String::new();
        let mut args = Vec::new();
        buf.push_str("INSERT INTO ");
        let (sql, _) = self.table.to_sql()?;
        buf.push_str(&sql);
        if !self.columns.is_empty() {
            buf.push('(');
            write_parts(&mut buf, &mut args, &self.columns)?;
            buf.push(')');
        }
        buf.push_str(" VALUES ");
        for (i, row) in self.rows.iter().enumerate() {
            if !self.columns.is_empty() && row.len() != self.columns.len() {
                return Err(Error::syntax(
                    "insert: values mismatched number of columns",
                ));
            }
            if i > 0 {
                buf.push_str(", ");
            }
            buf.push('(');
            write_parts(&mut buf, &mut args, row)?;
            buf.push(')');
        }
        if !self.returning.is_empty() {
            buf.push_str(" RETURNING ");
            write_parts(&mut buf, &mut args, &self.returning)?;
        }
        Ok((buf, args))
    }
}
