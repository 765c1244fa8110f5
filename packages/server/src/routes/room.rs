use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use super::auth_middleware::auth_middleware;
use crate::{
    error::GameError,
    services::room_service::{self, JoinRequest, JoinResponse},
    state::AppState,
    utils::{session::Session, websocket},
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: Option<String>,
    pub max_players: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RejoinRequest {
    pub token: String,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        // ルーム脱退
        // curl -X POST -H 'Authorization: Bearer {token}' http://localhost:8080/api/room/{roomid}/leave/{playerid}
        .route("/:roomid/leave/:playerid", post(leave_room))
        // ルーム削除（ホストのみ）
        // curl -X DELETE -H 'Authorization: Bearer {token}' http://localhost:8080/api/room/{roomid}/delete
        .route("/:roomid/delete", delete(delete_room))
        .route_layer(middleware::from_fn(auth_middleware))
        // ルーム作成
        // curl -X POST http://localhost:8080/api/room/create
        .route("/create", post(create_room))
        // ルーム一覧取得
        // curl http://localhost:8080/api/room/rooms
        .route("/rooms", get(get_rooms))
        // セッション復帰
        // curl -X POST -H 'Content-Type: application/json' -d '{"token":"..."}' http://localhost:8080/api/room/rejoin
        .route("/rejoin", post(rejoin))
        // 特定のルーム情報取得
        // curl http://localhost:8080/api/room/{roomid}
        .route("/:roomid", get(get_room_info))
        // ルーム参加
        // curl -X POST -H 'Content-Type: application/json' -d '{"name":"ada"}' http://localhost:8080/api/room/{roomid}/join
        .route("/:roomid/join", post(join_room))
        // WebSocket接続（ブラウザはヘッダーを付けられないのでクエリでトークンを渡す）
        // websocat "ws://localhost:8080/api/room/{roomid}/ws?token={token}"
        .route("/:roomid/ws", get(websocket::handler))
        .with_state(state)
}

pub async fn create_room(
    State(state): State<AppState>,
    body: Option<Json<CreateRoomRequest>>,
) -> Result<Json<CreateRoomResponse>, GameError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let room_id = room_service::create_room(&state, request.name, request.max_players)?;
    Ok(Json(CreateRoomResponse { room_id }))
}

async fn get_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = room_service::get_rooms(&state);
    (StatusCode::OK, Json(rooms))
}

async fn get_room_info(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let room = room_service::get_room_info(&state, &room_id)?;
    Ok((StatusCode::OK, Json(room)))
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, GameError> {
    Ok(Json(room_service::join_room(&state, &room_id, request)?))
}

async fn rejoin(
    State(state): State<AppState>,
    Json(request): Json<RejoinRequest>,
) -> Result<Json<JoinResponse>, GameError> {
    Ok(Json(room_service::rejoin(&state, &request.token)?))
}

pub async fn leave_room(
    State(state): State<AppState>,
    Path((room_id, player_id)): Path<(String, String)>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameError> {
    // 抜けられるのは自分だけ
    if session.player_in(&room_id)? != player_id {
        return Err(GameError::NotEligible(player_id));
    }
    room_service::leave_room(&state, &room_id, &player_id)?;
    Ok((StatusCode::OK, Json("Successfully left room")))
}

async fn delete_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, GameError> {
    let requester_id = session.player_in(&room_id)?;
    room_service::delete_room(&state, &room_id, requester_id)?;
    Ok((
        StatusCode::OK,
        Json(format!("Room {} deleted successfully", room_id)),
    ))
}
