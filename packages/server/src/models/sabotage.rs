use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SabotageType {
    SyntaxError,
    LogicSwap,
    ClearLine,
    PowerCut,
    SealDoor,
    LockTerminal,
}

impl SabotageType {
    /// Strategies that rewrite a code buffer rather than the environment.
    pub fn touches_code(&self) -> bool {
        matches!(
            self,
            SabotageType::SyntaxError | SabotageType::LogicSwap | SabotageType::ClearLine
        )
    }
}

impl fmt::Display for SabotageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SabotageType::SyntaxError => "syntax_error",
            SabotageType::LogicSwap => "logic_swap",
            SabotageType::ClearLine => "clear_line",
            SabotageType::PowerCut => "power_cut",
            SabotageType::SealDoor => "seal_door",
            SabotageType::LockTerminal => "lock_terminal",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SabotageOutcome {
    pub success: bool,
    pub new_code: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    SealedDoor,
    LockedTerminal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedEffect {
    pub kind: EffectKind,
    pub target: String,
    pub end_time: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SabotageAction {
    #[serde(rename = "type")]
    pub kind: SabotageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub target: Option<String>,
    pub timestamp: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SabotageState {
    pub last_action: Option<SabotageAction>,
    pub cooldown_end: i64,
    pub power_off: bool,
    pub power_off_until: Option<i64>,
    pub effects: Vec<TimedEffect>,
}

impl SabotageState {
    pub fn cooldown_remaining(&self, now: i64) -> i64 {
        (self.cooldown_end - now).max(0)
    }

    pub fn is_power_off(&self, now: i64) -> bool {
        self.power_off && self.power_off_until.map_or(true, |until| now < until)
    }

    pub fn active_effects(&self, now: i64) -> Vec<&TimedEffect> {
        self.effects.iter().filter(|e| now < e.end_time).collect()
    }

    pub fn is_terminal_locked(&self, file_id: &str, now: i64) -> bool {
        self.active_effects(now)
            .iter()
            .any(|e| e.kind == EffectKind::LockedTerminal && e.target == file_id)
    }

    pub fn is_door_sealed(&self, door_id: &str, now: i64) -> bool {
        self.active_effects(now)
            .iter()
            .any(|e| e.kind == EffectKind::SealedDoor && e.target == door_id)
    }

    /// The record as a given player sees it. Only the saboteur keeps their own id.
    pub fn seen_by(mut self, viewer_id: Option<&str>) -> Self {
        if let Some(action) = self.last_action.as_mut() {
            if action.player_id.as_deref() != viewer_id {
                action.player_id = None;
            }
        }
        self
    }

    /// Drops every effect whose deadline has passed. Returns whether anything changed.
    pub fn expire(&mut self, now: i64) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| now < e.end_time);
        let mut changed = self.effects.len() != before;

        if self.power_off && !self.is_power_off(now) {
            self.power_off = false;
            self.power_off_until = None;
            changed = true;
        }
        changed
    }
}
