//! WebSocket message types.
//!
//! Coordinator events are pushed in their own JSON shape
//! (`{"type": "progress" | "final" | "error", ...}`); everything else on the
//! socket is a [`WsMessage`].

use serde::{Deserialize, Serialize};

use fanout_protocols::{ConnectionStatus, QueryOutcome, TabInfo};

/// WebSocket message types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    /// Ping/heartbeat.
    Ping { timestamp: i64 },

    /// Pong response.
    Pong { timestamp: i64 },

    /// Connection established.
    Connected { connection_id: String },

    /// Query one platform. `id` is echoed back on the result.
    Query {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        platform: String,
        prompt: String,
    },

    /// Terminal outcome of a `query`.
    QueryResult {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        platform: String,
        outcome: QueryOutcome,
    },

    /// Ask whether a platform's tab is open.
    CheckConnection { platform: String },

    /// Answer to `check_connection`.
    Connection { status: ConnectionStatus },

    /// Ask for the browser's tab list.
    ListTabs,

    /// Answer to `list_tabs`.
    Tabs { tabs: Vec<TabInfo> },

    /// Request-level error (unparsable message, browser unavailable).
    Error { code: String, message: String },
}

impl WsMessage {
    /// Create a new error message.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}
