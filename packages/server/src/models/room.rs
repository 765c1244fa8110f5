use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum RoomStatus {
    Open,
    InProgress,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub room_id: String,
    pub name: Option<String>,
    pub max_players: usize,
    pub status: RoomStatus,
    pub host_id: Option<String>,
    pub created_at: i64,
}

impl Room {
    pub fn new(
        room_id: String,
        name: Option<String>,
        max_players: Option<usize>,
        created_at: i64,
    ) -> Self {
        Room {
            room_id,
            name,
            max_players: max_players.unwrap_or(10),
            status: RoomStatus::Open,
            host_id: None,
            created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub name: Option<String>,
    pub status: RoomStatus,
    pub player_count: usize,
    pub max_players: usize,
}
