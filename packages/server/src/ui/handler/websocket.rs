//! WebSocket snapshot stream.
//!
//! `GET /ws/lobbies/{code}` に接続すると、現在の文書を 1 フレーム送り、
//! 以降は変更のたびに最新の文書を JSON テキストで送ります。
//! 文書が削除されると `null` を送って接続を閉じます。

use std::sync::Arc;

use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};

use crate::{
    domain::{Document, DocumentSubscription, RoomCode},
    ui::state::AppState,
};

use super::http::{ApiError, parse_room_code};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    let room_code = parse_room_code(code)?;
    // Subscribe before upgrading so a missing lobby is a plain 404
    let subscription = state.store.subscribe_document(&room_code).await?;
    tracing::info!("Snapshot stream opened for lobby {}", room_code);
    Ok(ws
        .on_upgrade(move |socket| handle_socket(socket, room_code, subscription))
        .into_response())
}

fn snapshot_frame(snapshot: &Option<Document>) -> Message {
    let text = match snapshot {
        Some(document) => document.to_string(),
        None => "null".to_string(),
    };
    Message::Text(text.into())
}

async fn handle_socket(
    socket: WebSocket,
    room_code: RoomCode,
    mut subscription: DocumentSubscription,
) {
    let (mut sender, mut receiver) = socket.split();

    // Spawn a task to push snapshots to this client
    let push_room_code = room_code.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let snapshot = subscription.borrow_and_update().clone();
            let deleted = snapshot.is_none();
            if let Err(e) = sender.send(snapshot_frame(&snapshot)).await {
                tracing::debug!("Failed to push snapshot of {}: {}", push_room_code, e);
                return;
            }
            if deleted || subscription.changed().await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    // Clients only listen; drain their frames until they close
    let close_room_code = room_code.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::debug!("Client closed snapshot stream of {}", close_room_code);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("WebSocket error on {}: {}", close_room_code, e);
                    break;
                }
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    };

    tracing::info!("Snapshot stream closed for lobby {}", room_code);
}
