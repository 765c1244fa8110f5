use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, Result},
    models::{player::PlayerStatus, role::Role},
    store::RoomSnapshot,
};

pub const MIN_PLAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub player_id: String,
    pub role: Role,
}

/// Picks exactly one imposter uniformly at random; everyone else is a hero.
///
/// Every call is independent of previous games. The output keeps the input order.
pub fn assign_roles<R: Rng + ?Sized>(
    player_ids: &[String],
    rng: &mut R,
) -> Result<Vec<RoleAssignment>> {
    if player_ids.len() < MIN_PLAYERS {
        return Err(GameError::InsufficientPlayers {
            count: player_ids.len(),
        });
    }

    let imposter = rng.gen_range(0..player_ids.len());
    Ok(player_ids
        .iter()
        .enumerate()
        .map(|(index, player_id)| RoleAssignment {
            player_id: player_id.clone(),
            role: if index == imposter {
                Role::Imposter
            } else {
                Role::Hero
            },
        })
        .collect())
}

/// Writes a fresh assignment into the room. Meant to run inside a single store transaction so
/// no player is ever observed without a role.
pub fn apply_assignments(
    snapshot: &mut RoomSnapshot,
    assignments: &[RoleAssignment],
) -> Result<()> {
    for assignment in assignments {
        let player = snapshot.player_mut(&assignment.player_id)?;
        player.role = assignment.role;
        player.is_alive = true;
        player.status = PlayerStatus::Active;
        player.jail_end_time = None;
    }
    info!(
        "Assigned roles to {} players in room {}",
        assignments.len(),
        snapshot.room.room_id
    );
    Ok(())
}
