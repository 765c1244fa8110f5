use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, Result},
    models::{
        player::Player,
        room::{Room, RoomStatus, RoomSummary},
    },
    state::AppState,
    store::{RoomSnapshot, StoreExt},
    utils::session,
};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JoinRequest {
    pub name: String,
    #[serde(default)]
    pub skin: Option<String>,
    #[serde(default)]
    pub tint: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub player: Player,
    pub token: String,
}

/// The host is the online player who joined first. Everyone else defers to them for
/// host-only actions.
pub fn elect_host(snapshot: &mut RoomSnapshot) {
    let host = snapshot
        .players
        .values()
        .filter(|p| p.is_online)
        .min_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)))
        .map(|p| p.id.clone());
    if snapshot.room.host_id != host {
        info!(
            "Host of room {} is now {:?}",
            snapshot.room.room_id, host
        );
        snapshot.room.host_id = host;
    }
}

pub fn create_room(
    state: &AppState,
    name: Option<String>,
    max_players: Option<usize>,
) -> Result<String> {
    let room_id = state.next_room_id();
    let max_players = max_players
        .unwrap_or(state.config.max_players)
        .min(state.config.max_players);
    let room = Room::new(room_id.clone(), name, Some(max_players), state.now());
    state.store.create_room(RoomSnapshot::new(room))?;
    info!("Created room {}", room_id);
    Ok(room_id)
}

pub fn join_room(state: &AppState, room_id: &str, request: JoinRequest) -> Result<JoinResponse> {
    let now = state.now();
    let player_id = uuid::Uuid::new_v4().to_string();

    let (player, _) = state.store.update(room_id, |snap| {
        if snap.room.status != RoomStatus::Open {
            return Err(GameError::RoomClosed(room_id.to_string()));
        }
        if snap.players.len() >= snap.room.max_players {
            return Err(GameError::RoomFull(room_id.to_string()));
        }

        let name = request.name.trim();
        let mut player = Player::new(
            player_id.clone(),
            if name.is_empty() {
                format!("Player {}", snap.players.len() + 1)
            } else {
                name.to_string()
            },
            now,
        );
        if let Some(skin) = request.skin {
            player.skin = skin;
        }
        if let Some(tint) = request.tint {
            player.tint = tint;
        }
        snap.players.insert(player_id.clone(), player.clone());
        elect_host(snap);
        Ok(player)
    })?;

    let token = session::create_token(&player.id, room_id)?;
    info!("{} joined room {}", player.id, room_id);
    Ok(JoinResponse { player, token })
}

/// Restores a session from its token. A deleted room or removed player means the client's
/// saved credentials are stale and should be cleared.
pub fn rejoin(state: &AppState, token: &str) -> Result<JoinResponse> {
    let claims = session::verify_token(token)?;
    let (player, _) = state.store.update(&claims.room, |snap| {
        let player = snap.player_mut(&claims.sub)?;
        player.is_online = true;
        let player = player.clone();
        elect_host(snap);
        Ok(player)
    })?;
    info!("{} rejoined room {}", player.id, claims.room);
    Ok(JoinResponse {
        player,
        token: token.to_string(),
    })
}

pub fn leave_room(state: &AppState, room_id: &str, player_id: &str) -> Result<()> {
    state.store.update(room_id, |snap| {
        snap.players
            .remove(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))?;
        snap.meeting.votes.remove(player_id);
        // 抜けた人への票も消す（集計が居ない人を指さないように）
        snap.meeting
            .votes
            .retain(|_, candidate| candidate.player_id() != Some(player_id));
        elect_host(snap);
        Ok(())
    })?;
    info!("{} left room {}", player_id, room_id);
    Ok(())
}

pub fn disconnect(state: &AppState, room_id: &str, player_id: &str) -> Result<()> {
    state.store.update(room_id, |snap| {
        snap.player_mut(player_id)?.is_online = false;
        elect_host(snap);
        Ok(())
    })?;
    Ok(())
}

pub fn update_position(
    state: &AppState,
    room_id: &str,
    player_id: &str,
    x: f32,
    y: f32,
) -> Result<()> {
    state.store.update(room_id, |snap| {
        let player = snap.player_mut(player_id)?;
        player.x = x;
        player.y = y;
        Ok(())
    })?;
    Ok(())
}

pub fn get_rooms(state: &AppState) -> Vec<RoomSummary> {
    state
        .store
        .room_ids()
        .iter()
        .filter_map(|id| state.store.snapshot(id).ok())
        .map(|snap| RoomSummary {
            room_id: snap.room.room_id.clone(),
            name: snap.room.name.clone(),
            status: snap.room.status.clone(),
            player_count: snap.players.len(),
            max_players: snap.room.max_players,
        })
        .collect()
}

pub fn get_room_info(state: &AppState, room_id: &str) -> Result<RoomSummary> {
    let snap = state.store.snapshot(room_id)?;
    Ok(RoomSummary {
        room_id: snap.room.room_id,
        name: snap.room.name,
        status: snap.room.status,
        player_count: snap.players.len(),
        max_players: snap.room.max_players,
    })
}

/// Only the host may tear the room down.
pub fn delete_room(state: &AppState, room_id: &str, requester_id: &str) -> Result<()> {
    if !state.store.snapshot(room_id)?.is_host(requester_id) {
        return Err(GameError::NotArbiter(requester_id.to_string()));
    }
    if state.store.remove_room(room_id) {
        info!("Deleted room {}", room_id);
        Ok(())
    } else {
        Err(GameError::RoomNotFound(room_id.to_string()))
    }
}
