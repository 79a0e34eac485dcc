//! WebSocket interface module.
//!
//! A connection receives every coordinator event (progress, final, error)
//! as it is broadcast, and may send requests that are answered on the same
//! connection.

mod handler;
mod message;

pub use handler::ws_handler;
pub use message::WsMessage;
