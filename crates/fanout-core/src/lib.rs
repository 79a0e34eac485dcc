//! # Fanout Core
//!
//! The request coordinator and the platform registry it resolves platform
//! ids against.
//!
//! ## Components
//!
//! - [`PlatformRegistry`] - Platform id to page pattern and scraper script
//! - [`Coordinator`] - Owns every in-flight query, routes scraper reports
//!   back to the waiting caller and decides when a tab switch is safe
//! - [`CoordinatorSnapshot`] - Point-in-time view of the coordinator state

pub mod coordinator;
pub mod error;
pub mod registry;

pub use coordinator::{
    Coordinator, CoordinatorSettings, CoordinatorSnapshot, FocusSnapshot, QuerySnapshot,
    QueryStatus,
};
pub use error::RegistryError;
pub use registry::PlatformRegistry;
