//! Error types for the cLab minute-factor engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the cLab minute-factor engine.
#[derive(Error, Debug)]
pub enum Error {
    /// A precondition on caller input was violated (empty table, missing
    /// column, non-positive horizon, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A raw trade field could not be parsed. Fatal for the whole batch.
    #[error("Parse error: record {index}, field `{field}`: {message}")]
    Parse {
        /// Zero-based index of the offending record in the batch.
        index: usize,
        /// Raw field name (`T`, `p`, `q`, ...).
        field: &'static str,
        /// What went wrong, including the offending text.
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a parse error for a record field.
    pub fn parse(index: usize, field: &'static str, msg: impl Into<String>) -> Self {
        Error::Parse {
            index,
            field,
            message: msg.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether this error came from precondition checks.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
