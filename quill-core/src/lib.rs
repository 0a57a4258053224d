//! Quill Core - a composable, parameterized SQL statement builder
//!
//! This crate provides the core functionality for building SQL statements
//! as immutable expression trees: callers compose typed nodes (identifiers,
//! literals, bind arguments, comparisons, logical connectives, functions,
//! sub-selects) and render them once or many times into statement text plus
//! a positionally ordered argument list, ready for a parameterized-query
//! execution API.

pub mod builder;
pub mod error;
pub mod expr;
pub mod func;
pub mod ident;
pub mod operator;
pub mod value;

// Re-export main types
pub use builder::{Cte, Delete, Insert, JoinType, OrderBy, Select, SortDirection, Union, Update};
pub use error::{Error, Result};
pub use expr::{Case, Expr, Ident, ToSql};
pub use ident::{default_keywords, is_valid_identifier, set_default_keywords, Keywords};
pub use operator::{ArithOp, CompareOp, TimeUnit};
pub use value::Value;

/// Create a new SELECT builder for the given table
pub fn table(name: &str) -> Select {
    Select::new(name)
}

/// Create a new INSERT builder for the given table
pub fn insert(name: &str) -> Insert {
    Insert::new(name)
}

/// Create a new UPDATE builder for the given table
pub fn update(name: &str) -> Update {
    Update::new(name)
}

/// Create a new DELETE builder for the given table
pub fn delete(name: &str) -> Delete {
    Delete::new(name)
}
