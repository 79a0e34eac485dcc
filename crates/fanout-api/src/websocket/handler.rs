//! WebSocket handler implementation.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use fanout_protocols::QueryOutcome;

use crate::state::AppState;

use super::message::WsMessage;

/// WebSocket upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Serialized outbound frames for one connection.
type Outbox = mpsc::Sender<String>;

async fn send<T: Serialize>(tx: &Outbox, msg: &T) {
    match serde_json::to_string(msg) {
        Ok(json) => {
            let _ = tx.send(json).await;
        }
        Err(e) => error!("Failed to serialize WebSocket message: {}", e),
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = Uuid::new_v4().to_string();
    info!("WebSocket connected: {}", connection_id);

    // Subscribe before announcing the connection so no event is missed.
    let mut events = state.coordinator.subscribe();

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(100);

    send(
        &tx,
        &WsMessage::Connected {
            connection_id: connection_id.clone(),
        },
    )
    .await;

    let sender_task = tokio::spawn(async move {
        while let Some(json) = rx.recv().await {
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let event_task = {
        let tx = tx.clone();
        let conn_id = connection_id.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => send(&tx, &event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("WebSocket {} lagged, {} events dropped", conn_id, skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    };

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => {
                debug!("Received: {}", text);
                match serde_json::from_str::<WsMessage>(&text) {
                    Ok(msg) => handle_message(msg, &tx, &state).await,
                    Err(e) => {
                        warn!("Failed to parse WebSocket message: {}", e);
                        send(&tx, &WsMessage::error("PARSE_ERROR", "Failed to parse message")).await;
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!("WebSocket closed: {}", connection_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    event_task.abort();
    sender_task.abort();
    info!("WebSocket disconnected: {}", connection_id);
}

/// Handle one parsed client message. Queries run in their own task so the
/// connection keeps reading while they are in flight.
async fn handle_message(msg: WsMessage, tx: &Outbox, state: &Arc<AppState>) {
    match msg {
        WsMessage::Ping { timestamp } => {
            send(tx, &WsMessage::Pong { timestamp }).await;
        }
        WsMessage::Query {
            id,
            platform,
            prompt,
        } => {
            state.increment_requests(1);
            let tx = tx.clone();
            let coordinator = state.coordinator.clone();
            tokio::spawn(async move {
                let result = coordinator.submit_query(&platform, &prompt).await;
                let reply = WsMessage::QueryResult {
                    id,
                    platform,
                    outcome: QueryOutcome::from(result),
                };
                send(&tx, &reply).await;
            });
        }
        WsMessage::CheckConnection { platform } => {
            let status = state.coordinator.check_connection(&platform).await;
            send(tx, &WsMessage::Connection { status }).await;
        }
        WsMessage::ListTabs => {
            let reply = match state.coordinator.list_tabs().await {
                Ok(tabs) => WsMessage::Tabs { tabs },
                Err(e) => WsMessage::error(e.code(), e.to_string()),
            };
            send(tx, &reply).await;
        }
        other => {
            debug!("Ignoring server-side message from client: {:?}", other);
            send(
                tx,
                &WsMessage::error("UNSUPPORTED", "Message type is not accepted from clients"),
            )
            .await;
        }
    }
}
