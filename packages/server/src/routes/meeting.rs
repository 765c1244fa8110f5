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
    models::{meeting::MeetingView, vote::Candidate},
    services::meeting_service::{self, VoteReceipt},
    state::AppState,
    utils::session::Session,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteAction {
    pub candidate: Candidate,
    #[serde(default)]
    pub round: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub concluded: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HighlightRequest {
    pub file_id: String,
    pub line: u32,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/:roomid",
            Router::new()
                // 投票者はトークンから決まる
                // curl -X POST -H 'Authorization: Bearer {token}' -H 'Content-Type: application/json' \
                //   -d '{"candidate":"skip"}' http://localhost:8080/api/meeting/{roomid}/vote
                .route("/start", post(start_meeting))
                .route("/vote", post(cast_vote_handler))
                .route("/finalize", post(finalize_handler))
                .route("/highlight", post(highlight_handler))
                .route_layer(middleware::from_fn(auth_middleware))
                // curl http://localhost:8080/api/meeting/{roomid}
                .route("/", get(get_meeting)),
        )
        .with_state(state)
}

async fn get_meeting(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<MeetingView>, GameError> {
    Ok(Json(meeting_service::get_meeting(&state, &room_id)?))
}

async fn start_meeting(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<MeetingView>, GameError> {
    let caller_id = session.player_in(&room_id)?;
    Ok(Json(meeting_service::start_meeting(
        &state, &room_id, caller_id,
    )?))
}

async fn cast_vote_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(vote_action): Json<VoteAction>,
) -> Result<Json<VoteReceipt>, GameError> {
    let voter_id = session.player_in(&room_id)?;
    Ok(Json(meeting_service::cast_vote(
        &state,
        &room_id,
        voter_id,
        vote_action.candidate,
        vote_action.round,
    )?))
}

async fn finalize_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<FinalizeResponse>, GameError> {
    let requester_id = session.player_in(&room_id)?;
    let concluded = meeting_service::finalize(&state, &room_id, requester_id)?;
    Ok(Json(FinalizeResponse { concluded }))
}

async fn highlight_handler(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(request): Json<HighlightRequest>,
) -> Result<Json<MeetingView>, GameError> {
    let presenter_id = session.player_in(&room_id)?;
    Ok(Json(meeting_service::highlight_line(
        &state,
        &room_id,
        presenter_id,
        &request.file_id,
        request.line,
    )?))
}
