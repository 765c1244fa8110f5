use dotenvy::dotenv;
use rand::{rngs::StdRng, SeedableRng};
use std::sync::{Arc, Once};

use crate::models::config::GameConfig;
use crate::state::AppState;
use crate::store::MemoryStore;
use crate::utils::clock::ManualClock;

static INIT: Once = Once::new();

pub const TEST_EPOCH_MS: i64 = 1_700_000_000_000;

pub fn setup_test_env() {
    INIT.call_once(|| {
        dotenv().ok();
        // .envファイルが存在しない場合のデフォルト値
        if std::env::var("SESSION_SECRET").is_err() {
            std::env::set_var("SESSION_SECRET", "test-session-secret");
        }
        if std::env::var("CODE_RUNNER_URL").is_err() {
            std::env::set_var("CODE_RUNNER_URL", "http://127.0.0.1:9");
        }
        if std::env::var("ASSISTANT_URL").is_err() {
            std::env::set_var("ASSISTANT_URL", "http://127.0.0.1:9/v1/chat/completions");
        }
    });
}

/// A state with an in-memory store, a hand-driven clock and a seeded random source.
pub fn test_state(seed: u64) -> (AppState, Arc<ManualClock>) {
    test_state_with_config(seed, GameConfig::default())
}

pub fn test_state_with_config(seed: u64, config: GameConfig) -> (AppState, Arc<ManualClock>) {
    setup_test_env();
    let clock = Arc::new(ManualClock::new(TEST_EPOCH_MS));
    let state = AppState::with_parts(
        Arc::new(MemoryStore::new()),
        clock.clone(),
        StdRng::seed_from_u64(seed),
        config,
    );
    (state, clock)
}
