use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::auth_middleware::auth_middleware;
use crate::{
    error::GameError,
    services::{game_service, room_service},
    state::AppState,
    utils::session::Session,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub x: f32,
    pub y: f32,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:roomid",
            Router::new()
                // ゲームの基本操作
                // curl -X POST -H 'Authorization: Bearer {token}' http://localhost:8080/api/game/{roomid}/start
                .route("/start", post(start_game))
                .route("/end", post(end_game_handler))
                // curl -H 'Authorization: Bearer {token}' http://localhost:8080/api/game/{roomid}/state
                .route("/state", get(get_game_state))
                // プレイヤー操作
                .route("/players/:playerid/position", post(position_handler))
                .route("/players/:playerid/jail", post(jail_handler))
                .route_layer(middleware::from_fn(auth_middleware)),
        )
        .with_state(state)
}

pub async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameError> {
    let requester_id = session.player_in(&room_id)?;
    let assignments = game_service::start_game(&state, &room_id, requester_id)?;
    // 役職はクライアントへ返さない（各自 /state で自分の役職だけ見える）
    Ok((
        StatusCode::OK,
        Json(format!("Game started with {} players", assignments.len())),
    ))
}

pub async fn get_game_state(
    Path(room_id): Path<String>,
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameError> {
    let viewer_id = session.player_in(&room_id)?;
    let view = game_service::get_game_state(&state, &room_id, Some(viewer_id))?;
    Ok((StatusCode::OK, Json(view)))
}

async fn end_game_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameError> {
    let requester_id = session.player_in(&room_id)?;
    game_service::end_game(&state, &room_id, requester_id)?;
    Ok((StatusCode::OK, Json("Game ended successfully")))
}

async fn position_handler(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
    Json(update): Json<PositionUpdate>,
) -> Result<impl IntoResponse, GameError> {
    // 動かせるのは自分だけ
    if session.player_in(&room_id)? != player_id {
        return Err(GameError::NotEligible(player_id));
    }
    room_service::update_position(&state, &room_id, &player_id, update.x, update.y)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn jail_handler(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameError> {
    let requester_id = session.player_in(&room_id)?;
    let player = game_service::jail_player(&state, &room_id, requester_id, &player_id)?;
    Ok((StatusCode::OK, Json(player)))
}
