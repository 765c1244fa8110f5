use std::env;

/// Rule tuning. Defaults match the live game; every field can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub meeting_duration_ms: i64,
    pub results_duration_ms: i64,
    pub max_players: usize,
    pub sabotage_cooldown_ms: i64,
    pub power_cut_duration_ms: i64,
    pub door_seal_duration_ms: i64,
    pub terminal_lock_duration_ms: i64,
    pub jail_duration_ms: i64,
    // 審判ループの間隔
    pub tick_interval_ms: u64,
    // 他プレイヤーの役職を公開するかどうか（デバッグ用）
    pub reveal_roles: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            meeting_duration_ms: 60_000,
            results_duration_ms: 5_000,
            max_players: 10,
            sabotage_cooldown_ms: 30_000,
            power_cut_duration_ms: 15_000,
            door_seal_duration_ms: 10_000,
            terminal_lock_duration_ms: 20_000,
            jail_duration_ms: 20_000,
            tick_interval_ms: 250,
            reveal_roles: false,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl GameConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            meeting_duration_ms: env_or("MEETING_DURATION_MS", defaults.meeting_duration_ms),
            results_duration_ms: env_or("RESULTS_DURATION_MS", defaults.results_duration_ms),
            max_players: env_or("MAX_PLAYERS", defaults.max_players),
            sabotage_cooldown_ms: env_or("SABOTAGE_COOLDOWN_MS", defaults.sabotage_cooldown_ms),
            power_cut_duration_ms: env_or("POWER_CUT_DURATION_MS", defaults.power_cut_duration_ms),
            door_seal_duration_ms: env_or("DOOR_SEAL_DURATION_MS", defaults.door_seal_duration_ms),
            terminal_lock_duration_ms: env_or(
                "TERMINAL_LOCK_DURATION_MS",
                defaults.terminal_lock_duration_ms,
            ),
            jail_duration_ms: env_or("JAIL_DURATION_MS", defaults.jail_duration_ms),
            tick_interval_ms: env_or("TICK_INTERVAL_MS", defaults.tick_interval_ms),
            reveal_roles: env::var("DEBUG_REVEAL_ROLES")
                .map(|v| v == "true")
                .unwrap_or(defaults.reveal_roles),
        }
    }
}
