//! Match pattern parse errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Missing scheme separator in pattern: {0}")]
    MissingScheme(String),

    #[error("Unsupported scheme '{scheme}' in pattern: {pattern}")]
    InvalidScheme { scheme: String, pattern: String },

    #[error("Missing path in pattern: {0}")]
    MissingPath(String),

    #[error("Invalid host '{host}' in pattern: {pattern}")]
    InvalidHost { host: String, pattern: String },
}
