//! Error types for the fanout protocol layer.

mod browser;
mod pattern;
mod query;

pub use browser::*;
pub use pattern::*;
pub use query::*;
