use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::{
    error::{GameError, Result},
    models::{
        chat::ChatLog,
        code_file::CodeFile,
        meeting::{Meeting, MeetingView},
        player::{Player, PlayerStatus},
        role::Role,
        room::{Room, RoomStatus},
        sabotage::SabotageState,
    },
    services::{catalog, role_service},
    state::AppState,
    store::{RoomSnapshot, StoreExt},
};

/// A room as one particular player is allowed to see it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub revision: u64,
    pub room: Room,
    pub players: BTreeMap<String, Player>,
    pub meeting: MeetingView,
    pub files: BTreeMap<String, CodeFile>,
    pub sabotage: SabotageState,
    pub chat: ChatLog,
}

/// Hides hidden roles from everyone but their owner. A reformed imposter was caught in public,
/// so that role stays visible. The saboteur's id is hidden the same way.
pub fn view_for(
    snapshot: RoomSnapshot,
    viewer_id: Option<&str>,
    now: i64,
    reveal: bool,
) -> GameView {
    let mut players = snapshot.players;
    if !reveal {
        for player in players.values_mut() {
            let own = viewer_id == Some(player.id.as_str());
            if !own && player.role == Role::Imposter {
                player.role = Role::Hero;
            }
        }
    }

    GameView {
        revision: snapshot.revision,
        room: snapshot.room,
        players,
        meeting: MeetingView {
            remaining_ms: snapshot.meeting.remaining_ms(now),
            server_time: now,
            meeting: snapshot.meeting,
        },
        files: snapshot.files,
        sabotage: if reveal {
            snapshot.sabotage
        } else {
            snapshot.sabotage.seen_by(viewer_id)
        },
        chat: snapshot.chat,
    }
}

/// Assigns roles and sets the level up in a single write. Nothing changes if the room is
/// short of players.
pub fn start_game(
    state: &AppState,
    room_id: &str,
    requester_id: &str,
) -> Result<Vec<role_service::RoleAssignment>> {
    let now = state.now();
    let (assignments, _) = state.store.update(room_id, |snap| {
        if !snap.is_host(requester_id) {
            return Err(GameError::NotArbiter(requester_id.to_string()));
        }
        if snap.room.status == RoomStatus::InProgress {
            return Err(GameError::GameInProgress(room_id.to_string()));
        }

        let player_ids = snap.player_ids_by_join();
        let assignments = state.with_rng(|rng| role_service::assign_roles(&player_ids, rng))?;
        role_service::apply_assignments(snap, &assignments)?;

        let round = snap.meeting.round;
        snap.meeting = Meeting {
            round,
            ..Meeting::default()
        };
        snap.files = catalog::seed_files();
        snap.sabotage = SabotageState::default();
        snap.room.status = RoomStatus::InProgress;
        snap.chat
            .add_system_message("Roles assigned. One of you is the imposter.".to_string(), now);
        Ok(assignments)
    })?;

    info!("Game started in room {} with {} players", room_id, assignments.len());
    Ok(assignments)
}

/// Only the host may close the room.
pub fn end_game(state: &AppState, room_id: &str, requester_id: &str) -> Result<()> {
    state.store.update(room_id, |snap| {
        if !snap.is_host(requester_id) {
            return Err(GameError::NotArbiter(requester_id.to_string()));
        }
        snap.room.status = RoomStatus::Closed;
        Ok(())
    })?;
    info!("Game ended in room {}", room_id);
    Ok(())
}

pub fn get_game_state(
    state: &AppState,
    room_id: &str,
    viewer_id: Option<&str>,
) -> Result<GameView> {
    let snapshot = state.store.snapshot(room_id)?;
    Ok(view_for(snapshot, viewer_id, state.now(), state.config.reveal_roles))
}

/// The host locks an active player up for a while. The arbiter tick lets them out.
pub fn jail_player(
    state: &AppState,
    room_id: &str,
    requester_id: &str,
    target_id: &str,
) -> Result<Player> {
    let now = state.now();
    let (player, _) = state.store.update(room_id, |snap| {
        if snap.room.status != RoomStatus::InProgress {
            return Err(GameError::GameNotStarted(room_id.to_string()));
        }
        if !snap.is_host(requester_id) {
            return Err(GameError::NotArbiter(requester_id.to_string()));
        }
        let target = snap.player_mut(target_id)?;
        if !target.is_alive || target.status != PlayerStatus::Active {
            return Err(GameError::NotEligible(target_id.to_string()));
        }
        target.status = PlayerStatus::Jailed;
        target.jail_end_time = Some(now + state.config.jail_duration_ms);
        Ok(target.clone())
    })?;
    info!("{} was jailed in room {}", target_id, room_id);
    Ok(player)
}
