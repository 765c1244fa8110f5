use log::{info, warn};
use serde::Serialize;

use crate::{
    error::{GameError, Result},
    models::code_file::{judge, CodeFile, ExecutionOutput, TestStatus},
    services::{assistant::CodeReview, catalog},
    state::AppState,
    store::StoreExt,
};

pub const COMPILER_UNREACHABLE: &str = "could not reach compiler";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub file_id: String,
    pub status: TestStatus,
    pub stdout: String,
    pub stderr: String,
    /// False when the file changed while the sandbox was running and the verdict was dropped.
    pub applied: bool,
}

pub fn list_files(state: &AppState, room_id: &str) -> Result<Vec<CodeFile>> {
    let snapshot = state.store.snapshot(room_id)?;
    Ok(snapshot.files.into_values().collect())
}

pub fn get_file(state: &AppState, room_id: &str, file_id: &str) -> Result<CodeFile> {
    let snapshot = state.store.snapshot(room_id)?;
    snapshot.file(file_id).cloned()
}

pub fn edit_file(
    state: &AppState,
    room_id: &str,
    file_id: &str,
    player_id: &str,
    content: String,
) -> Result<CodeFile> {
    let now = state.now();
    let (file, _) = state.store.update(room_id, |snap| {
        if !snap.player(player_id)?.can_edit() {
            return Err(GameError::NotEligible(player_id.to_string()));
        }
        if snap.sabotage.is_terminal_locked(file_id, now) {
            return Err(GameError::TerminalLocked(file_id.to_string()));
        }
        let file = snap.file_mut(file_id)?;
        if file.content != content {
            file.content = content;
            file.test_status = TestStatus::Pending;
        }
        Ok(file.clone())
    })?;
    Ok(file)
}

/// Level reset: every file goes back to its seed content.
pub fn reset_files(state: &AppState, room_id: &str) -> Result<Vec<CodeFile>> {
    let (_, committed) = state.store.update(room_id, |snap| {
        snap.files = catalog::seed_files();
        Ok(())
    })?;
    info!("Reset challenge files in room {}", room_id);
    Ok(committed.snapshot.files.into_values().collect())
}

/// Sends the file to the sandbox and records the verdict.
///
/// An unreachable sandbox is a failed run, not an error. If the file was edited or sabotaged
/// while the sandbox was busy the verdict no longer describes it and is discarded.
pub async fn run_file(state: &AppState, room_id: &str, file_id: &str) -> Result<RunReport> {
    let file = get_file(state, room_id, file_id)?;

    let (status, output) = match state.code_runner.execute(&file.language, &file.content).await {
        Ok(output) => (judge(&output.stdout, &file.expected_output), output),
        Err(e) => {
            warn!("Execution of {} in room {} failed: {}", file_id, room_id, e);
            (
                TestStatus::Fail,
                ExecutionOutput {
                    stdout: String::new(),
                    stderr: COMPILER_UNREACHABLE.to_string(),
                },
            )
        }
    };

    let (applied, _) = state.store.update(room_id, |snap| {
        let current = snap.file_mut(file_id)?;
        if current.content != file.content {
            return Ok(false);
        }
        current.test_status = status;
        current.last_output = Some(output.clone());
        if status == TestStatus::Pass {
            current.is_corrupted = false;
        }
        Ok(true)
    })?;

    info!(
        "Ran {} in room {}: {:?}{}",
        file_id,
        room_id,
        status,
        if applied { "" } else { " (stale, discarded)" }
    );

    Ok(RunReport {
        file_id: file_id.to_string(),
        status,
        stdout: output.stdout,
        stderr: output.stderr,
        applied,
    })
}

pub async fn hint(state: &AppState, room_id: &str, file_id: &str) -> Result<String> {
    let file = get_file(state, room_id, file_id)?;
    Ok(state.assistant.hint(&file).await)
}

pub async fn review(state: &AppState, room_id: &str, file_id: &str) -> Result<CodeReview> {
    let file = get_file(state, room_id, file_id)?;
    Ok(state.assistant.review(&file).await)
}
