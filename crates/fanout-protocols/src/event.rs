//! Outbound types consumed by UIs.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Broadcast event emitted by the coordinator.
///
/// Events are fire-and-forget and not scoped to a request: every listener
/// sees every platform's events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoordinatorEvent {
    /// Partial answer text while the platform is still generating.
    Progress {
        platform: String,
        text: String,
        streaming: bool,
    },

    /// Final answer text.
    Final {
        platform: String,
        text: String,
        streaming: bool,
    },

    /// Terminal failure for one platform's query.
    Error { platform: String, error: String },
}

impl CoordinatorEvent {
    pub fn progress(platform: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Progress {
            platform: platform.into(),
            text: text.into(),
            streaming: true,
        }
    }

    pub fn final_answer(platform: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Final {
            platform: platform.into(),
            text: text.into(),
            streaming: false,
        }
    }

    pub fn error(platform: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            platform: platform.into(),
            error: error.into(),
        }
    }

    pub fn platform(&self) -> &str {
        match self {
            Self::Progress { platform, .. }
            | Self::Final { platform, .. }
            | Self::Error { platform, .. } => platform,
        }
    }

    /// Whether this event ends a query's lifecycle.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Wire shape of a finished query: `{success, response}` or `{success, error}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable error code, see [`QueryError::code`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl QueryOutcome {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            error: None,
            code: None,
        }
    }

    pub fn failure(error: &QueryError) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error.to_string()),
            code: Some(error.code().to_string()),
        }
    }
}

impl From<Result<String, QueryError>> for QueryOutcome {
    fn from(result: Result<String, QueryError>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(e) => Self::failure(&e),
        }
    }
}

/// Result of a connection check for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub platform: String,
    pub connected: bool,
    pub message: String,
}

impl ConnectionStatus {
    pub fn connected(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            connected: true,
            message: "Connected".to_string(),
        }
    }

    pub fn tab_not_found(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            connected: false,
            message: "Tab not found".to_string(),
        }
    }

    pub fn unknown_platform(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            connected: false,
            message: "Unknown platform".to_string(),
        }
    }

    pub fn unavailable(platform: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            connected: false,
            message: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_serialization() {
        let event = CoordinatorEvent::progress("chatgpt", "partial");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["platform"], "chatgpt");
        assert_eq!(json["text"], "partial");
        assert_eq!(json["streaming"], true);
    }

    #[test]
    fn test_final_event_serialization() {
        let event = CoordinatorEvent::final_answer("gemini", "done");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "final");
        assert_eq!(json["streaming"], false);
    }

    #[test]
    fn test_error_event_deserialization() {
        let json = r#"{"type":"error","platform":"kimi","error":"boom"}"#;
        let event: CoordinatorEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, CoordinatorEvent::error("kimi", "boom"));
        assert!(event.is_terminal());
        assert_eq!(event.platform(), "kimi");
    }

    #[test]
    fn test_progress_is_not_terminal() {
        assert!(!CoordinatorEvent::progress("a", "b").is_terminal());
        assert!(CoordinatorEvent::final_answer("a", "b").is_terminal());
    }

    #[test]
    fn test_outcome_from_ok() {
        let outcome = QueryOutcome::from(Ok("done".to_string()));
        assert!(outcome.success);
        assert_eq!(outcome.response.as_deref(), Some("done"));

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_outcome_from_err() {
        let outcome = QueryOutcome::from(Err(QueryError::UnknownPlatform("bard".to_string())));
        assert!(!outcome.success);
        assert!(outcome.response.is_none());
        assert!(outcome.error.unwrap().contains("bard"));
        assert_eq!(outcome.code.as_deref(), Some("unknown_platform"));
    }

    #[test]
    fn test_connection_status_constructors() {
        assert!(ConnectionStatus::connected("chatgpt").connected);
        let missing = ConnectionStatus::tab_not_found("grok");
        assert!(!missing.connected);
        assert_eq!(missing.message, "Tab not found");
        assert_eq!(
            ConnectionStatus::unknown_platform("bard").message,
            "Unknown platform"
        );
    }
}
