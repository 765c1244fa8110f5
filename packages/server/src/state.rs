use rand::{rngs::StdRng, SeedableRng};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};

use crate::models::config::GameConfig;
use crate::services::{assistant::AssistantClient, code_runner::CodeRunner};
use crate::store::{GameStateStore, MemoryStore};
use crate::utils::clock::{Clock, SystemClock};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStateStore>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<Mutex<StdRng>>,
    pub config: Arc<GameConfig>,
    pub code_runner: CodeRunner,
    pub assistant: AssistantClient,
    next_room_id: Arc<AtomicU64>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_parts(
            Arc::new(MemoryStore::new()),
            Arc::new(SystemClock),
            StdRng::from_entropy(),
            GameConfig::from_env(),
        )
    }

    pub fn with_parts(
        store: Arc<dyn GameStateStore>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
        config: GameConfig,
    ) -> Self {
        AppState {
            store,
            clock,
            rng: Arc::new(Mutex::new(rng)),
            config: Arc::new(config),
            code_runner: CodeRunner::from_config(),
            assistant: AssistantClient::from_config(),
            next_room_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Runs `f` with exclusive access to the shared random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    pub fn next_room_id(&self) -> String {
        self.next_room_id.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
