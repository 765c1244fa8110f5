use serde::{Deserialize, Serialize};

use super::role::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    #[default]
    Active,
    Jailed,
    Ejected,
    Reformed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub is_online: bool,
    pub skin: String,
    pub tint: u32,
    pub role: Role,
    pub is_alive: bool,
    pub status: PlayerStatus,
    pub joined_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jail_end_time: Option<i64>,
}

impl Player {
    pub fn new(id: String, name: String, joined_at: i64) -> Self {
        Self {
            id,
            name,
            x: 0.0,
            y: 0.0,
            is_online: true,
            skin: "default".to_string(),
            tint: 0xffffff,
            role: Role::Hero,
            is_alive: true,
            status: PlayerStatus::Active,
            joined_at,
            jail_end_time: None,
        }
    }

    /// Alive players hold a ballot, jailed ones included.
    pub fn can_vote(&self) -> bool {
        self.is_alive
    }

    pub fn can_call_meeting(&self) -> bool {
        self.is_alive && self.status == PlayerStatus::Active
    }

    /// Reformed imposters keep coding alongside the crew.
    pub fn can_edit(&self) -> bool {
        matches!(self.status, PlayerStatus::Active | PlayerStatus::Reformed)
    }
}
