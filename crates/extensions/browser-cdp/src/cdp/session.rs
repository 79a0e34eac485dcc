//! CDP page session for a single attached tab.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use super::client::Connection;
use super::error::CdpError;
use super::protocol::ExceptionDetails;

/// A flattened session attached to a single page.
pub struct PageSession {
    target_id: String,
    session_id: String,
    conn: Arc<Connection>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, conn: Arc<Connection>) -> Self {
        Self {
            target_id,
            session_id,
            conn,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, Some(&self.session_id)).await
    }

    /// Enable the Runtime domain (required for binding events).
    pub async fn enable_runtime(&self) -> Result<(), CdpError> {
        self.call("Runtime.enable", None).await?;
        debug!("Enabled Runtime for session {}", self.session_id);
        Ok(())
    }

    /// Expose `window.<name>(payload)` to the page. Calls arrive as
    /// `Runtime.bindingCalled` events on this session.
    pub async fn add_binding(&self, name: &str) -> Result<(), CdpError> {
        self.call("Runtime.addBinding", Some(json!({ "name": name })))
            .await?;
        Ok(())
    }

    /// Evaluate a JavaScript expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                    "userGesture": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let message = serde_json::from_value::<ExceptionDetails>(exception.clone())
                .map(|details| details.message())
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CdpError::JavaScript(message));
        }

        Ok(result["result"]["value"].clone())
    }

    /// Detach from the page. The event stream for this session ends.
    pub async fn detach(&self) -> Result<(), CdpError> {
        self.conn.remove_handler(&self.session_id);
        self.conn
            .call(
                "Target.detachFromTarget",
                Some(json!({ "sessionId": self.session_id })),
                None,
            )
            .await?;
        Ok(())
    }
}
