//! Interface error types.

use thiserror::Error;

/// Interface error types.
#[derive(Debug, Error)]
pub enum InterfaceError {
    /// The configured listen address does not parse.
    #[error("Invalid listen address '{addr}': {message}")]
    InvalidAddress { addr: String, message: String },

    /// Binding the listener failed (port in use, permissions).
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),

    /// Request body could not be understood.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocketError(String),
}
