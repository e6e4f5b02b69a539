//! WebSocket handler implementation.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use super::message::TaskUpdate;
use crate::state::AppState;

const UPDATE_INTERVAL: Duration = Duration::from_secs(1);

/// WebSocket upgrade handler.
///
/// GET /ws/task/{task_id}
pub async fn task_updates(
    ws: WebSocketUpgrade,
    Path(task_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_task(socket, state, task_id))
}

/// Push the task's record every second; close once it is terminal.
async fn stream_task(socket: WebSocket, state: Arc<AppState>, task_id: String) {
    info!("WebSocket subscribed to task {}", task_id);
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(UPDATE_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let update = TaskUpdate::snapshot(&state.registry, &task_id);
                let json = match serde_json::to_string(&update) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("Failed to serialize task update: {}", e);
                        break;
                    }
                };
                if sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
                if update.is_final() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    debug!("WebSocket for task {} closed by client", task_id);
                    return;
                }
                Some(Err(e)) => {
                    debug!("WebSocket error for task {}: {}", task_id, e);
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    info!("WebSocket for task {} finished", task_id);
}
