use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::broadcast;

use super::{Committed, GameStateStore, RoomSnapshot, StoreChange, StoreEvent, TransactionBody};
use crate::error::{GameError, Result};

const CHANNEL_CAPACITY: usize = 1000;

struct RoomCell {
    state: Mutex<RoomSnapshot>,
    tx: broadcast::Sender<StoreEvent>,
}

/// In-process store. Each room has its own lock so transactions on different rooms never wait
/// on each other.
#[derive(Default)]
pub struct MemoryStore {
    rooms: RwLock<HashMap<String, Arc<RoomCell>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, room_id: &str) -> Result<Arc<RoomCell>> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| GameError::RoomNotFound(room_id.to_string()))
    }
}

impl GameStateStore for MemoryStore {
    fn create_room(&self, snapshot: RoomSnapshot) -> Result<()> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let room_id = snapshot.room.room_id.clone();
        if rooms.contains_key(&room_id) {
            return Err(GameError::Internal(format!("room {} already exists", room_id)));
        }
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        rooms.insert(
            room_id,
            Arc::new(RoomCell {
                state: Mutex::new(snapshot),
                tx,
            }),
        );
        Ok(())
    }

    fn remove_room(&self, room_id: &str) -> bool {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        rooms.remove(room_id).is_some()
    }

    fn room_ids(&self) -> Vec<String> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = rooms.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn snapshot(&self, room_id: &str) -> Result<RoomSnapshot> {
        let cell = self.cell(room_id)?;
        let state = cell.state.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(state.clone())
    }

    fn transact(&self, room_id: &str, body: &mut TransactionBody<'_>) -> Result<Committed> {
        let cell = self.cell(room_id)?;
        let mut state = cell.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut working = state.clone();
        body(&mut working)?;

        let changes = StoreChange::diff(&state, &working);
        if changes.is_empty() {
            return Ok(Committed {
                snapshot: state.clone(),
                changes,
            });
        }

        working.revision = state.revision + 1;
        *state = working;

        // 購読者がいない場合のエラーは無視する
        let _ = cell.tx.send(StoreEvent {
            room_id: room_id.to_string(),
            revision: state.revision,
            changes: changes.clone(),
            snapshot: state.clone(),
        });

        Ok(Committed {
            snapshot: state.clone(),
            changes,
        })
    }

    fn subscribe(&self, room_id: &str) -> Result<broadcast::Receiver<StoreEvent>> {
        Ok(self.cell(room_id)?.tx.subscribe())
    }
}
