use axum::{
    extract::{Path, State},
    middleware,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::auth_middleware::auth_middleware;
use crate::{error::GameError, state::AppState, utils::session::Session};

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub file_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/:roomid/chat", post(chat))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state)
}

/// Free-form question to the assistant, optionally about one of the room's files.
async fn chat(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, GameError> {
    session.player_in(&room_id)?;
    let snapshot = state.store.snapshot(&room_id)?;
    let context = match &request.file_id {
        Some(file_id) => Some(snapshot.file(file_id)?.content.clone()),
        None => None,
    };
    let reply = state
        .assistant
        .chat(&request.prompt, context.as_deref())
        .await;
    Ok(Json(ChatResponse { reply }))
}
