use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};

use super::auth_middleware::auth_middleware;
use crate::{
    error::GameError,
    services::sabotage_service::{self, SabotageReport, SabotageRequest, SabotageView},
    state::AppState,
    utils::session::Session,
};

pub fn routes(state: AppState) -> Router {
    Router::new()
        // curl -X POST -H 'Authorization: Bearer {token}' -H 'Content-Type: application/json' \
        //   -d '{"type":"logic_swap","file_id":"reactor"}' http://localhost:8080/api/sabotage/{roomid}
        .route("/:roomid", get(get_sabotage).post(sabotage))
        .route_layer(middleware::from_fn(auth_middleware))
        .with_state(state)
}

async fn get_sabotage(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
) -> Result<Json<SabotageView>, GameError> {
    let viewer_id = session.player_in(&room_id)?;
    Ok(Json(sabotage_service::get_sabotage(
        &state,
        &room_id,
        Some(viewer_id),
    )?))
}

async fn sabotage(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    Extension(session): Extension<Session>,
    Json(mut request): Json<SabotageRequest>,
) -> Result<Json<SabotageReport>, GameError> {
    request.player_id = session.player_in(&room_id)?.to_string();
    Ok(Json(sabotage_service::sabotage(&state, &room_id, request)?))
}
