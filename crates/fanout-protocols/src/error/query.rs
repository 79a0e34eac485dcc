//! Query errors.
//!
//! Every variant is scoped to exactly one platform's query. None of them is
//! fatal to the coordinator.

use thiserror::Error;

use super::BrowserError;

#[derive(Debug, Error)]
pub enum QueryError {
    /// The caller asked for a platform the registry does not know.
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    /// No open tab matches the platform's page pattern.
    #[error("Target tab not found for {platform}: please open and log in to {site}")]
    TargetNotFound { platform: String, site: String },

    #[error("Failed to activate {platform} tab: {message}")]
    Activation { platform: String, message: String },

    #[error("Failed to inject scraper into {platform} tab: {message}")]
    Injection { platform: String, message: String },

    #[error("Failed to send prompt to {platform} tab: {message}")]
    Delivery { platform: String, message: String },

    /// Error reported by the page scraper itself, including its own
    /// observation timeout. The message is shown to the user verbatim.
    #[error("{message}")]
    Scrape { platform: String, message: String },

    /// No terminal event arrived before the backstop timeout.
    #[error("{platform} did not finish within {seconds} seconds")]
    Timeout { platform: String, seconds: u64 },

    #[error("Query for {0} was superseded by a newer query")]
    Superseded(String),

    #[error("Query for {0} was dropped before it finished")]
    Cancelled(String),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),
}

impl QueryError {
    /// Platform the error belongs to, when it is scoped to one.
    pub fn platform(&self) -> Option<&str> {
        match self {
            Self::UnknownPlatform(p) | Self::Superseded(p) | Self::Cancelled(p) => Some(p),
            Self::TargetNotFound { platform, .. }
            | Self::Activation { platform, .. }
            | Self::Injection { platform, .. }
            | Self::Delivery { platform, .. }
            | Self::Scrape { platform, .. }
            | Self::Timeout { platform, .. } => Some(platform),
            Self::Browser(_) => None,
        }
    }

    /// Stable machine-readable code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPlatform(_) => "unknown_platform",
            Self::TargetNotFound { .. } => "target_not_found",
            Self::Activation { .. } => "activation_failed",
            Self::Injection { .. } => "injection_failed",
            Self::Delivery { .. } => "delivery_failed",
            Self::Scrape { .. } => "scrape_failed",
            Self::Timeout { .. } => "timeout",
            Self::Superseded(_) => "superseded",
            Self::Cancelled(_) => "cancelled",
            Self::Browser(_) => "browser_error",
        }
    }
}
