//! WebSocket Handler
//!
//! 推送会话事件：连接时先发当前快照，之后转发 EventPublisher 的广播

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::events::SessionEvent;
use crate::infrastructure::http::state::AppState;

/// Session WebSocket 连接处理
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, session_id, state))
}

fn to_message(event: &SessionEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_session_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 验证会话存在
    let session = match state.session_manager.get(&session_id) {
        Ok(session) => session,
        Err(_) => {
            tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
            let _ = sender.close().await;
            return;
        }
    };
    let Some(mut event_rx) = state.event_publisher.subscribe(&session_id) else {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: no event channel");
        let _ = sender.close().await;
        return;
    };

    tracing::info!(session_id = %session_id, "WebSocket connected");

    // 先推送当前快照
    let initial = SessionEvent::StateChanged {
        session_id: session_id.clone(),
        snapshot: session.current(),
    };
    if let Some(msg) = to_message(&initial) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }

    let session_id_for_forward = session_id.clone();
    let session_id_for_receive = session_id.clone();

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(
                        session_id = %session_id_for_forward,
                        skipped,
                        "WebSocket subscriber lagged"
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let closing = matches!(event, SessionEvent::SessionClosed { .. });

            if let Some(msg) = to_message(&event) {
                if let Err(e) = sender.send(msg).await {
                    tracing::debug!(
                        session_id = %session_id_for_forward,
                        error = %e,
                        "Failed to send WebSocket message"
                    );
                    break;
                }
            }
            if closing {
                let _ = sender.close().await;
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let session_manager = state.session_manager.clone();
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => {
                    // 任意消息都算作活跃
                    session_manager.touch(&session_id_for_receive);
                }
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}
