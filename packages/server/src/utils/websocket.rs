use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::error::GameError;
use crate::models::chat::{ChatMessage, ChatMessageType};
use crate::models::meeting::MeetingStatus;
use crate::services::{game_service, room_service};
use crate::state::AppState;
use crate::store::{RoomSnapshot, StoreExt};
use crate::utils::session::{self, Session};

#[derive(Debug, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

/// 送信者はソケットのセッションで決まるので、フレーム内の player_id などは読まない
#[derive(Debug, Serialize, Deserialize)]
struct WebSocketMessage {
    message_type: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct StateNotification {
    message_type: &'static str,
    room_id: String,
    revision: u64,
    paths: Vec<String>,
    state: game_service::GameView,
}

#[derive(Debug, Serialize)]
struct ErrorNotification {
    message_type: &'static str,
    content: String,
}

impl WebSocketMessage {
    fn to_chat_message(
        &self,
        player_id: &str,
        player_name: &str,
        during_meeting: bool,
        timestamp: i64,
    ) -> ChatMessage {
        let message_type = match self.message_type.as_str() {
            "system" => ChatMessageType::System,
            _ if during_meeting => ChatMessageType::Meeting,
            _ => ChatMessageType::Public,
        };

        ChatMessage::new(
            player_id.to_string(),
            player_name.to_string(),
            self.content.clone(),
            message_type,
            timestamp,
        )
    }
}

pub async fn handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Query(params): Query<SocketParams>,
    ws: WebSocketUpgrade,
) -> Result<Response, GameError> {
    let token = params.token.ok_or(GameError::InvalidSession)?;
    let session = Session::from(session::verify_token(&token)?);
    let player_id = session.player_in(&room_id)?.to_string();
    state.store.snapshot(&room_id)?.player(&player_id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room_id, player_id)))
}

fn notification(
    state: &AppState,
    snapshot: RoomSnapshot,
    paths: Vec<String>,
    viewer: Option<&str>,
) -> Option<String> {
    let room_id = snapshot.room.room_id.clone();
    let revision = snapshot.revision;
    let view = game_service::view_for(snapshot, viewer, state.now(), state.config.reveal_roles);
    serde_json::to_string(&StateNotification {
        message_type: if paths.is_empty() {
            "snapshot"
        } else {
            "state_changed"
        },
        room_id,
        revision,
        paths,
        state: view,
    })
    .ok()
}

fn store_chat(
    state: &AppState,
    room_id: &str,
    player_id: &str,
    text: &str,
) -> Result<(), String> {
    let mut ws_message = serde_json::from_str::<WebSocketMessage>(text)
        .map_err(|e| format!("Malformed message: {}", e))?;
    if ws_message.message_type == "system" {
        // クライアントはシステムメッセージを送れない
        ws_message.message_type = "public".to_string();
    }
    let now = state.now();
    state
        .store
        .update(room_id, |snap| {
            let player_name = snap.player(player_id)?.name.clone();
            let during_meeting = snap.meeting.status == MeetingStatus::Discussion;
            snap.chat.add_message(ws_message.to_chat_message(
                player_id,
                &player_name,
                during_meeting,
                now,
            ));
            Ok(())
        })
        .map(|_| ())
        .map_err(|e| e.to_string())
}

/// Pushes the room to the client on connect and after every committed change. Chat frames from
/// the client are stored in the room's log and reach everyone through the same stream.
pub async fn handle_socket(
    ws: WebSocket,
    state: AppState,
    room_id: String,
    player_id: String,
) {
    info!("New WebSocket connection established for room: {}", room_id);

    let (mut sender, mut receiver) = ws.split();

    let subscription = (
        state.store.subscribe(&room_id),
        state.store.snapshot(&room_id),
    );
    let (mut rx, snapshot) = match subscription {
        (Ok(rx), Ok(snapshot)) => (rx, snapshot),
        (Err(e), _) | (_, Err(e)) => {
            let error = ErrorNotification {
                message_type: "error",
                content: e.to_string(),
            };
            if let Ok(text) = serde_json::to_string(&error) {
                let _ = sender.send(Message::Text(text)).await;
            }
            return;
        }
    };

    if let Some(text) = notification(&state, snapshot, Vec::new(), Some(&player_id)) {
        if sender.send(Message::Text(text)).await.is_err() {
            return;
        }
    }

    let (direct_tx, mut direct_rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    let send_state = state.clone();
    let viewer = player_id.clone();
    let room_for_send = room_id.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let text = tokio::select! {
                event = rx.recv() => match event {
                    Ok(event) => {
                        let paths = event.changes.iter().map(|c| c.path()).collect();
                        match notification(&send_state, event.snapshot, paths, Some(&viewer)) {
                            Some(text) => text,
                            None => continue,
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscriber in room {} lagged by {} events", room_for_send, skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                direct = direct_rx.recv() => match direct {
                    Some(text) => text,
                    None => break,
                },
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let receive_state = state.clone();
    let room_for_receive = room_id.clone();
    let sender_id = player_id.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Err(e) =
                        store_chat(&receive_state, &room_for_receive, &sender_id, &text)
                    {
                        let error = ErrorNotification {
                            message_type: "error",
                            content: e,
                        };
                        if let Ok(text) = serde_json::to_string(&error) {
                            let _ = direct_tx.send(text);
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => receive_task.abort(),
        _ = &mut receive_task => send_task.abort(),
    }

    if let Err(e) = room_service::disconnect(&state, &room_id, &player_id) {
        warn!("Could not mark {} offline in room {}: {}", player_id, room_id, e);
    }
    info!("WebSocket connection closed for room: {}", room_id);
}
