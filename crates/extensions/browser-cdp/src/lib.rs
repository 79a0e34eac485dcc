//! # Fanout Browser CDP
//!
//! [`TabDriver`](fanout_protocols::TabDriver) implementation over the Chrome
//! DevTools Protocol.
//!
//! The driver attaches to an already running Chrome started with
//! `--remote-debugging-port` (normally the user's own, logged-in profile),
//! lists and activates tabs through the DevTools HTTP endpoints, and injects
//! scraper scripts through `Runtime.evaluate`.
//!
//! Scrapers report back through a page binding; every report is parsed into
//! a [`ScrapeReport`](fanout_protocols::ScrapeReport) and pushed onto the
//! channel returned by [`CdpTabDriver::new`].

pub mod cdp;
mod driver;

pub use cdp::{CdpClient, CdpError, DevToolsHttp, PageSession};
pub use driver::{CdpDriverConfig, CdpTabDriver, REPORT_BINDING, START_QUERY_FN};
