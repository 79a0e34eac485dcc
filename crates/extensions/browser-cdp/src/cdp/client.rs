//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, trace, warn};

use super::error::CdpError;
use super::http::DevToolsHttp;
use super::protocol::{CdpRequest, CdpResponse};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type EventHandlers = Mutex<HashMap<String, mpsc::UnboundedSender<CdpResponse>>>;

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared state of one browser WebSocket connection.
///
/// The client and every page session it hands out send through the same
/// connection; the receive loop routes responses by request id and events
/// by session id.
pub(crate) struct Connection {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>,
    event_handlers: EventHandlers,
    closed: AtomicBool,
}

impl Connection {
    /// Send a CDP command and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CdpError::SessionClosed);
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let sent = {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await
        };
        if let Err(e) = sent {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    pub(crate) fn remove_handler(&self, session_id: &str) {
        self.event_handlers.lock().remove(session_id);
    }

    fn dispatch(&self, text: &str) {
        let resp = match serde_json::from_str::<CdpResponse>(text) {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Failed to parse CDP message: {}", e);
                return;
            }
        };

        if let Some(id) = resp.id {
            let Some(tx) = self.pending.lock().remove(&id) else {
                return;
            };
            let result = match resp.error {
                Some(error) => Err(CdpError::Protocol {
                    code: error.code,
                    message: error.message,
                }),
                None => Ok(resp.result.unwrap_or(Value::Null)),
            };
            let _ = tx.send(result);
        } else if resp.is_event() {
            let session_id = resp.session_id.clone().unwrap_or_default();
            let mut handlers = self.event_handlers.lock();
            if let Some(tx) = handlers.get(&session_id) {
                if tx.send(resp).is_err() {
                    handlers.remove(&session_id);
                }
            }
        }
    }

    /// Fail every in-flight request and end every event stream.
    fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.pending.lock().clear();
        self.event_handlers.lock().clear();
    }
}

/// CDP client attached to the browser-level WebSocket.
pub struct CdpClient {
    http: DevToolsHttp,
    browser_ws_url: String,
    conn: Arc<Connection>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to Chrome at the given endpoint.
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("http://localhost:9222").await?;
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let http = DevToolsHttp::new(endpoint);
        let version = http.version().await?;
        debug!("Connected to browser: {}", version.browser);

        Self::connect_ws(http, version.web_socket_debugger_url).await
    }

    /// Open the browser WebSocket directly, skipping `/json/version`.
    pub(crate) async fn connect_ws(
        http: DevToolsHttp,
        browser_ws_url: String,
    ) -> Result<Self, CdpError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(browser_ws_url.as_str())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("WebSocket: {}", e)))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let conn = Arc::new(Connection {
            ws_tx: tokio::sync::Mutex::new(ws_sink),
            request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            event_handlers: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        });

        let recv_task = tokio::spawn(Self::receive_loop(ws_source, conn.clone()));

        debug!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            http,
            browser_ws_url,
            conn,
            recv_task,
        })
    }

    async fn receive_loop(mut ws_source: WsSource, conn: Arc<Connection>) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    conn.dispatch(&text);
                }
                Ok(Message::Close(_)) => {
                    debug!("WebSocket closed");
                    break;
                }
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }
        conn.shutdown();
    }

    /// Send a browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.conn.call(method, params, None).await
    }

    /// Whether the browser connection has gone away.
    pub fn is_closed(&self) -> bool {
        self.conn.closed.load(Ordering::SeqCst)
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    pub fn http(&self) -> &DevToolsHttp {
        &self.http
    }

    /// Attach to an existing page with a flattened session.
    ///
    /// Returns the session and the stream of events Chrome emits for it.
    /// The stream ends when the session is detached or the connection drops.
    pub async fn attach_page(
        &self,
        target_id: &str,
    ) -> Result<(PageSession, mpsc::UnboundedReceiver<CdpResponse>), CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await
            .map_err(|e| match e {
                CdpError::Protocol { .. } => CdpError::PageNotFound(target_id.to_string()),
                other => other,
            })?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.conn
            .event_handlers
            .lock()
            .insert(session_id.clone(), event_tx);

        debug!("Attached to page {} (session {})", target_id, session_id);

        let session = PageSession::new(target_id.to_string(), session_id, self.conn.clone());
        Ok((session, event_rx))
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
        self.conn.shutdown();
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
