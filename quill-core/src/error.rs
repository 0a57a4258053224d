//! Error types for Quill

use thiserror::Error;

/// The main error type for Quill operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed or reserved-word identifier
    #[error("invalid identifier {ident:?}")]
    InvalidIdentifier { ident: String },

    /// Negative LIMIT or OFFSET
    #[error("negative limit: {value}")]
    InvalidLimit { value: i64 },

    /// Structurally invalid statement or expression tree
    #[error("invalid syntax: {message}")]
    Syntax { message: String },
}

/// Convenience Result type for Quill operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid identifier error
    pub fn invalid_identifier(ident: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            ident: ident.into(),
        }
    }

    /// Create a new invalid limit error
    pub fn invalid_limit(value: i64) -> Self {
        Self::InvalidLimit { value }
    }

    /// Create a new syntax error
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identifier_error() {
        let err = Error::invalid_identifier("1abc");
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
        assert_eq!(err.to_string(), "invalid identifier \"1abc\"");
    }

    #[test]
    fn test_invalid_limit_error() {
        let err = Error::invalid_limit(-1);
        assert!(matches!(err, Error::InvalidLimit { .. }));
        assert_eq!(err.to_string(), "negative limit: -1");
    }

    #[test]
    fn test_syntax_error() {
        let err = Error::syntax("where: expected a relational expression");
        assert!(matches!(err, Error::Syntax { .. }));
        assert_eq!(
            err.to_string(),
            "invalid syntax: where: expected a relational expression"
        );
    }
}
