//! # Fanout API
//!
//! External interface of the fanout coordinator.
//!
//! - **HTTP**: submit queries, fan a prompt out, check connections, list
//!   tabs, accept scraper reports, inspect coordinator state
//! - **WebSocket**: live progress/final/error events plus the same
//!   request operations over one connection
//!
//! ```text
//!   UI / CLI ──HTTP──┐
//!                    ├──► Coordinator ──► TabDriver ──► browser tabs
//!   UI ─────WS───────┘        │
//!        ◄── broadcast events ┘
//! ```

pub mod error;
pub mod http;
pub mod server;
pub mod state;
pub mod websocket;

pub use error::InterfaceError;
pub use http::handlers::{BatchQueryRequest, BatchQueryResponse, QueryRequest};
pub use http::routes::create_router;
pub use server::{InterfaceConfig, InterfaceServer};
pub use state::AppState;
pub use websocket::WsMessage;
