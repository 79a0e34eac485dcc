//! CDP-backed [`TabDriver`](fanout_protocols::TabDriver).

mod bridge;
mod config;
mod tab_driver;

pub use bridge::{REPORT_BINDING, START_QUERY_FN};
pub use config::CdpDriverConfig;
pub use tab_driver::CdpTabDriver;
