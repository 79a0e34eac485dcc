//! # Fanout Protocols
//!
//! Interface definitions shared by every fanout crate. Contains traits and
//! wire types only - the coordinator, the browser drivers and the HTTP
//! interface live elsewhere.
//!
//! ## Core Types
//!
//! - [`PlatformTarget`] - A supported chat platform: id, page-match pattern, scraper script
//! - [`MatchPattern`] - Browser extension style URL match pattern
//! - [`TabDriver`] - Trait for the component that lists, activates and injects into tabs
//! - [`ScrapeReport`] - Inbound progress/final/error message from a page scraper
//! - [`CoordinatorEvent`] - Outbound broadcast event consumed by UIs
//! - [`QueryOutcome`] - Wire shape of a finished query

pub mod browser;
pub mod error;
pub mod event;
pub mod pattern;
pub mod platform;
pub mod report;

pub use browser::{TabDriver, TabId, TabInfo};
pub use error::{BrowserError, PatternError, QueryError};
pub use event::{ConnectionStatus, CoordinatorEvent, QueryOutcome};
pub use pattern::MatchPattern;
pub use platform::{BUILTIN_PLATFORMS, PlatformId, PlatformTarget, builtin_targets};
pub use report::ScrapeReport;
