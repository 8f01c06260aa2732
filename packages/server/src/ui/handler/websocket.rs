//! WebSocket connection handler.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::ConnectionId;
use crate::infrastructure::dto::websocket::ClientEvent;

use super::super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Spawns a task that receives events from the rx channel and pushes them
/// to this connection's WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // The connection identifier is assigned here and never leaves the
    // server except as an opaque string in usersList entries.
    let conn_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state.manager.connect(conn_id, tx).await;
    tracing::info!("Connection '{}' established", conn_id);

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let manager = state.manager.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", conn_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => manager.handle_event(conn_id, event).await,
                    Err(e) => {
                        tracing::warn!("Ignoring malformed frame from '{}': {}", conn_id, e);
                    }
                },
                Message::Close(_) => {
                    tracing::debug!("Connection '{}' requested close", conn_id);
                    break;
                }
                // Ping/pong is handled by the protocol layer; binary frames
                // are not part of the event surface.
                _ => {}
            }
        }
    });

    // If either task completes, the connection is done
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.manager.disconnect(conn_id).await;
    tracing::info!("Connection '{}' closed", conn_id);
}
