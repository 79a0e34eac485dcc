//! Core errors.

use fanout_protocols::PatternError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Platform already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Platform not found: {0}")]
    NotFound(String),

    #[error("Invalid pattern for platform {platform}: {source}")]
    InvalidPattern {
        platform: String,
        #[source]
        source: PatternError,
    },
}
