//! The request coordinator.
//!
//! Owns the lifecycle of every outstanding query:
//!
//! 1. capture the frontmost tab if this is the first query of a burst
//! 2. register the query as pending and add its platform to the active set
//! 3. locate, activate and (after a settle delay) inject into the platform's tab
//! 4. deliver the prompt and wait for the scraper's terminal report
//! 5. broadcast the terminal event, resolve the caller after a short delay
//! 6. once the active set drains, switch back to the captured tab
//!
//! Every failure is scoped to one platform's query. A backstop timeout
//! fails queries whose scraper never reports back.

mod handle;
mod focus;
mod lifecycle;
mod settings;
mod snapshot;
mod state;

pub use handle::Coordinator;
pub use settings::CoordinatorSettings;
pub use snapshot::{CoordinatorSnapshot, FocusSnapshot, QuerySnapshot};
pub use state::QueryStatus;
