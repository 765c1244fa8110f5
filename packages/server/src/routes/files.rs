use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::auth_middleware::auth_middleware;
use crate::{
    error::GameError,
    models::code_file::CodeFile,
    services::{
        assistant::CodeReview,
        file_service::{self, RunReport},
    },
    state::AppState,
    utils::session::Session,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct EditRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HintResponse {
    pub hint: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:roomid",
            Router::new()
                .route("/", get(list_files))
                // レベルリセット
                .route("/reset", post(reset_files))
                .route("/:fileid", get(get_file).put(edit_file))
                // コード実行・AIアシスタント
                .route("/:fileid/run", post(run_file))
                .route("/:fileid/hint", post(hint))
                .route("/:fileid/review", post(review))
                // ルームの参加者だけが触れる
                .route_layer(middleware::from_fn(auth_middleware)),
        )
        .with_state(state)
}

async fn list_files(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<CodeFile>>, GameError> {
    session.player_in(&room_id)?;
    Ok(Json(file_service::list_files(&state, &room_id)?))
}

async fn reset_files(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<Vec<CodeFile>>, GameError> {
    session.player_in(&room_id)?;
    Ok(Json(file_service::reset_files(&state, &room_id)?))
}

async fn get_file(
    State(state): State<AppState>,
    Path((room_id, file_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<Json<CodeFile>, GameError> {
    session.player_in(&room_id)?;
    Ok(Json(file_service::get_file(&state, &room_id, &file_id)?))
}

async fn edit_file(
    State(state): State<AppState>,
    Path((room_id, file_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
    Json(request): Json<EditRequest>,
) -> Result<Json<CodeFile>, GameError> {
    let player_id = session.player_in(&room_id)?;
    Ok(Json(file_service::edit_file(
        &state,
        &room_id,
        &file_id,
        player_id,
        request.content,
    )?))
}

async fn run_file(
    State(state): State<AppState>,
    Path((room_id, file_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<Json<RunReport>, GameError> {
    session.player_in(&room_id)?;
    Ok(Json(file_service::run_file(&state, &room_id, &file_id).await?))
}

async fn hint(
    State(state): State<AppState>,
    Path((room_id, file_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<Json<HintResponse>, GameError> {
    session.player_in(&room_id)?;
    let hint = file_service::hint(&state, &room_id, &file_id).await?;
    Ok(Json(HintResponse { hint }))
}

async fn review(
    State(state): State<AppState>,
    Path((room_id, file_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<Json<CodeReview>, GameError> {
    session.player_in(&room_id)?;
    Ok(Json(file_service::review(&state, &room_id, &file_id).await?))
}
