//! Chrome DevTools Protocol (CDP) client implementation.
//!
//! Chrome must be started with remote debugging enabled:
//!
//! ```bash
//! chrome --remote-debugging-port=9222
//! ```
//!
//! [`DevToolsHttp`] covers the `/json/*` discovery endpoints; [`CdpClient`]
//! speaks CDP JSON-RPC over the browser WebSocket and hands out
//! [`PageSession`]s for individual tabs.

mod client;
mod error;
mod http;
mod protocol;
mod session;

pub use client::CdpClient;
pub use error::CdpError;
pub use http::DevToolsHttp;
pub use protocol::{
    BindingCalled, BrowserVersion, CdpErrorResponse, CdpRequest, CdpResponse, ExceptionDetails,
    PageInfo, RemoteObject,
};
pub use session::PageSession;
