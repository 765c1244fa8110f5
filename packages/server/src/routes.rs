use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::state::AppState;

mod assistant;
pub mod auth_middleware;
mod files;
mod game;
mod meeting;
mod room;
mod sabotage;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api/room", room::routes(state.clone()))
        .nest("/api/game", game::routes(state.clone()))
        .nest("/api/meeting", meeting::routes(state.clone()))
        .nest("/api/files", files::routes(state.clone()))
        .nest("/api/sabotage", sabotage::routes(state.clone()))
        .nest("/api/assistant", assistant::routes(state))
}

// エラーハンドリング
impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        let status = match &self {
            GameError::RoomNotFound(_)
            | GameError::PlayerNotFound(_)
            | GameError::FileNotFound(_) => StatusCode::NOT_FOUND,
            GameError::InvalidSession => StatusCode::UNAUTHORIZED,
            GameError::NotArbiter(_) | GameError::NotImposter(_) | GameError::NotEligible(_) => {
                StatusCode::FORBIDDEN
            }
            GameError::RoomClosed(_)
            | GameError::RoomFull(_)
            | GameError::GameInProgress(_)
            | GameError::MeetingInProgress
            | GameError::StaleMeeting { .. }
            | GameError::TerminalLocked(_) => StatusCode::CONFLICT,
            GameError::SabotageCooldown { .. } => StatusCode::TOO_MANY_REQUESTS,
            GameError::InsufficientPlayers { .. }
            | GameError::GameNotStarted(_)
            | GameError::MeetingNotActive
            | GameError::InvalidCandidate(_)
            | GameError::InvalidLine(_)
            | GameError::MissingTarget(_) => StatusCode::BAD_REQUEST,
            GameError::NetworkUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GameError::GenerativeService(_) => StatusCode::BAD_GATEWAY,
            GameError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log::error!("{}", self);
        }

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
