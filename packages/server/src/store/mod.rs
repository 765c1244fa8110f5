//! Shared room state.
//!
//! Rules code reads rooms through [`GameStateStore::snapshot`] and changes them only through
//! [`GameStateStore::transact`], which applies the whole body as one write or nothing at all.
//! Subscribers receive one [`StoreEvent`] per committed transaction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;

use crate::error::{GameError, Result};
use crate::models::{
    chat::ChatLog, code_file::CodeFile, meeting::Meeting, player::Player, room::Room,
    sabotage::SabotageState,
};

mod memory;

pub use memory::MemoryStore;

/// Everything stored under one room, grouped by key path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub revision: u64,
    pub room: Room,
    pub players: BTreeMap<String, Player>,
    pub meeting: Meeting,
    pub files: BTreeMap<String, CodeFile>,
    pub sabotage: SabotageState,
    pub chat: ChatLog,
}

impl RoomSnapshot {
    pub fn new(room: Room) -> Self {
        Self {
            revision: 0,
            room,
            players: BTreeMap::new(),
            meeting: Meeting::default(),
            files: BTreeMap::new(),
            sabotage: SabotageState::default(),
            chat: ChatLog::default(),
        }
    }

    pub fn player(&self, player_id: &str) -> Result<&Player> {
        self.players
            .get(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))
    }

    pub fn player_mut(&mut self, player_id: &str) -> Result<&mut Player> {
        self.players
            .get_mut(player_id)
            .ok_or_else(|| GameError::PlayerNotFound(player_id.to_string()))
    }

    pub fn file(&self, file_id: &str) -> Result<&CodeFile> {
        self.files
            .get(file_id)
            .ok_or_else(|| GameError::FileNotFound(file_id.to_string()))
    }

    pub fn file_mut(&mut self, file_id: &str) -> Result<&mut CodeFile> {
        self.files
            .get_mut(file_id)
            .ok_or_else(|| GameError::FileNotFound(file_id.to_string()))
    }

    /// Player ids in join order, the order role assignment sees them in.
    pub fn player_ids_by_join(&self) -> Vec<String> {
        let mut players: Vec<&Player> = self.players.values().collect();
        players.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
        players.into_iter().map(|p| p.id.clone()).collect()
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.is_alive)
    }

    pub fn is_host(&self, player_id: &str) -> bool {
        self.room.host_id.as_deref() == Some(player_id)
    }
}

/// A key path touched by a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreChange {
    Room,
    Player(String),
    Meeting,
    File(String),
    Sabotage,
    Chat,
}

impl StoreChange {
    pub fn path(&self) -> String {
        match self {
            StoreChange::Room => "room".to_string(),
            StoreChange::Player(id) => format!("players/{}", id),
            StoreChange::Meeting => "meeting".to_string(),
            StoreChange::File(id) => format!("files/{}", id),
            StoreChange::Sabotage => "sabotage".to_string(),
            StoreChange::Chat => "chat".to_string(),
        }
    }

    /// Paths that differ between two versions of the same room.
    pub fn diff(before: &RoomSnapshot, after: &RoomSnapshot) -> Vec<StoreChange> {
        let mut changes = Vec::new();
        if before.room != after.room {
            changes.push(StoreChange::Room);
        }
        for id in before.players.keys().chain(after.players.keys()) {
            if before.players.get(id) != after.players.get(id)
                && !changes.contains(&StoreChange::Player(id.clone()))
            {
                changes.push(StoreChange::Player(id.clone()));
            }
        }
        if before.meeting != after.meeting {
            changes.push(StoreChange::Meeting);
        }
        for id in before.files.keys().chain(after.files.keys()) {
            if before.files.get(id) != after.files.get(id)
                && !changes.contains(&StoreChange::File(id.clone()))
            {
                changes.push(StoreChange::File(id.clone()));
            }
        }
        if before.sabotage != after.sabotage {
            changes.push(StoreChange::Sabotage);
        }
        if before.chat != after.chat {
            changes.push(StoreChange::Chat);
        }
        changes
    }
}

#[derive(Clone, Debug)]
pub struct StoreEvent {
    pub room_id: String,
    pub revision: u64,
    pub changes: Vec<StoreChange>,
    pub snapshot: RoomSnapshot,
}

/// Result of a committed transaction.
#[derive(Clone, Debug)]
pub struct Committed {
    pub snapshot: RoomSnapshot,
    pub changes: Vec<StoreChange>,
}

pub type TransactionBody<'a> = dyn FnMut(&mut RoomSnapshot) -> Result<()> + 'a;

pub trait GameStateStore: Send + Sync {
    fn create_room(&self, snapshot: RoomSnapshot) -> Result<()>;

    fn remove_room(&self, room_id: &str) -> bool;

    fn room_ids(&self) -> Vec<String>;

    fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot>;

    /// Runs `body` against a working copy of the room. `Ok` replaces the stored room in a single
    /// step and notifies subscribers; `Err` discards the copy.
    fn transact(&self, room_id: &str, body: &mut TransactionBody<'_>) -> Result<Committed>;

    fn subscribe(&self, room_id: &str) -> Result<broadcast::Receiver<StoreEvent>>;
}

pub trait StoreExt {
    /// [`GameStateStore::transact`] for bodies that produce a value.
    fn update<T>(
        &self,
        room_id: &str,
        body: impl FnOnce(&mut RoomSnapshot) -> Result<T>,
    ) -> Result<(T, Committed)>;
}

impl<S: GameStateStore + ?Sized> StoreExt for S {
    fn update<T>(
        &self,
        room_id: &str,
        body: impl FnOnce(&mut RoomSnapshot) -> Result<T>,
    ) -> Result<(T, Committed)> {
        let mut body = Some(body);
        let mut output = None;
        let committed = self.transact(room_id, &mut |snapshot| {
            if let Some(body) = body.take() {
                output = Some(body(snapshot)?);
            }
            Ok(())
        })?;
        let output = output
            .ok_or_else(|| GameError::Internal("transaction body did not run".to_string()))?;
        Ok((output, committed))
    }
}
