use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    error::{GameError, Result},
    models::{
        code_file::{LastSabotage, TestStatus},
        meeting::MeetingStatus,
        role::Role,
        room::RoomStatus,
        sabotage::{EffectKind, SabotageAction, SabotageState, SabotageType, TimedEffect},
    },
    services::sabotage_engine,
    state::AppState,
    store::{RoomSnapshot, StoreExt},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SabotageRequest {
    // HTTP ではセッションから埋める
    #[serde(skip_deserializing)]
    pub player_id: String,
    #[serde(rename = "type")]
    pub kind: SabotageType,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub door_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SabotageReport {
    #[serde(rename = "type")]
    pub kind: SabotageType,
    pub success: bool,
    pub description: String,
    pub cooldown_end: i64,
}

fn ensure_can_sabotage(snapshot: &RoomSnapshot, player_id: &str, now: i64) -> Result<()> {
    if snapshot.room.status != RoomStatus::InProgress {
        return Err(GameError::GameNotStarted(snapshot.room.room_id.clone()));
    }
    let player = snapshot.player(player_id)?;
    if player.role != Role::Imposter || !player.is_alive {
        return Err(GameError::NotImposter(player_id.to_string()));
    }
    if snapshot.meeting.status != MeetingStatus::Idle {
        return Err(GameError::MeetingInProgress);
    }
    let remaining_ms = snapshot.sabotage.cooldown_remaining(now);
    if remaining_ms > 0 {
        return Err(GameError::SabotageCooldown { remaining_ms });
    }
    Ok(())
}

pub fn sabotage(
    state: &AppState,
    room_id: &str,
    request: SabotageRequest,
) -> Result<SabotageReport> {
    let now = state.now();
    let config = &state.config;

    let (report, _) = state.store.update(room_id, |snap| {
        ensure_can_sabotage(snap, &request.player_id, now)?;

        let kind = request.kind;
        let mut target = None;
        let description = match kind {
            SabotageType::SyntaxError | SabotageType::LogicSwap | SabotageType::ClearLine => {
                let file_id = request
                    .file_id
                    .as_deref()
                    .ok_or(GameError::MissingTarget("file_id"))?;
                let file = snap.file_mut(file_id)?;
                let outcome =
                    state.with_rng(|rng| sabotage_engine::apply_sabotage(kind, &file.content, rng));
                if !outcome.success {
                    // 何も壊せなかった場合はクールダウンを消費しない
                    return Ok(SabotageReport {
                        kind,
                        success: false,
                        description: outcome.description,
                        cooldown_end: snap.sabotage.cooldown_end,
                    });
                }
                file.content = outcome.new_code;
                file.is_corrupted = true;
                file.test_status = TestStatus::Pending;
                file.last_sabotage = Some(LastSabotage {
                    kind,
                    timestamp: now,
                });
                target = Some(file_id.to_string());
                outcome.description
            }
            SabotageType::PowerCut => {
                snap.sabotage.power_off = true;
                snap.sabotage.power_off_until = Some(now + config.power_cut_duration_ms);
                "The lights went out".to_string()
            }
            SabotageType::SealDoor => {
                let door_id = request
                    .door_id
                    .as_deref()
                    .ok_or(GameError::MissingTarget("door_id"))?;
                push_effect(
                    &mut snap.sabotage,
                    EffectKind::SealedDoor,
                    door_id,
                    now + config.door_seal_duration_ms,
                );
                target = Some(door_id.to_string());
                format!("Door {} was sealed", door_id)
            }
            SabotageType::LockTerminal => {
                let file_id = request
                    .file_id
                    .as_deref()
                    .ok_or(GameError::MissingTarget("file_id"))?;
                snap.file(file_id)?;
                push_effect(
                    &mut snap.sabotage,
                    EffectKind::LockedTerminal,
                    file_id,
                    now + config.terminal_lock_duration_ms,
                );
                target = Some(file_id.to_string());
                format!("Terminal for {} was locked", file_id)
            }
        };

        snap.sabotage.last_action = Some(SabotageAction {
            kind,
            player_id: Some(request.player_id.clone()),
            target,
            timestamp: now,
        });
        snap.sabotage.cooldown_end = now + config.sabotage_cooldown_ms;

        Ok(SabotageReport {
            kind,
            success: true,
            description,
            cooldown_end: snap.sabotage.cooldown_end,
        })
    })?;

    info!(
        "Sabotage {} in room {}: {}",
        report.kind, room_id, report.description
    );
    Ok(report)
}

fn push_effect(sabotage: &mut SabotageState, kind: EffectKind, target: &str, end_time: i64) {
    // 同じ対象への効果は上書きする
    sabotage
        .effects
        .retain(|e| !(e.kind == kind && e.target == target));
    sabotage.effects.push(TimedEffect {
        kind,
        target: target.to_string(),
        end_time,
    });
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SabotageView {
    #[serde(flatten)]
    pub state: SabotageState,
    pub power_is_off: bool,
    pub active_effects: Vec<TimedEffect>,
    pub cooldown_remaining_ms: i64,
    pub server_time: i64,
}

/// The sabotage record with expired effects already filtered out.
pub fn get_sabotage(
    state: &AppState,
    room_id: &str,
    viewer_id: Option<&str>,
) -> Result<SabotageView> {
    let now = state.now();
    let mut sabotage = state.store.snapshot(room_id)?.sabotage;
    if !state.config.reveal_roles {
        sabotage = sabotage.seen_by(viewer_id);
    }
    Ok(SabotageView {
        power_is_off: sabotage.is_power_off(now),
        active_effects: sabotage.active_effects(now).into_iter().cloned().collect(),
        cooldown_remaining_ms: sabotage.cooldown_remaining(now),
        server_time: now,
        state: sabotage,
    })
}
