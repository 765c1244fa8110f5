use log::{debug, info};

use crate::{
    error::{GameError, Result},
    models::{
        config::GameConfig,
        meeting::{
            HighlightedLine, Meeting, MeetingStatus, MeetingView, RESULT_IMPOSTER_CAUGHT,
            RESULT_INNOCENT_EJECTED, RESULT_SKIPPED,
        },
        player::PlayerStatus,
        role::Role,
        room::RoomStatus,
        vote::Candidate,
    },
    services::voting,
    state::AppState,
    store::{RoomSnapshot, StoreExt},
};

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub round: u64,
    pub votes_cast: usize,
    pub eligible_voters: usize,
    pub concluded: bool,
}

fn ensure_in_progress(snapshot: &RoomSnapshot) -> Result<()> {
    if snapshot.room.status != RoomStatus::InProgress {
        return Err(GameError::GameNotStarted(snapshot.room.room_id.clone()));
    }
    Ok(())
}

/// IDLE → DISCUSSION.
pub fn begin(
    snapshot: &mut RoomSnapshot,
    caller_id: &str,
    now: i64,
    config: &GameConfig,
) -> Result<()> {
    ensure_in_progress(snapshot)?;
    if snapshot.meeting.status != MeetingStatus::Idle {
        return Err(GameError::MeetingInProgress);
    }
    let caller = snapshot.player(caller_id)?;
    if !caller.can_call_meeting() {
        return Err(GameError::NotEligible(caller_id.to_string()));
    }
    let caller_name = caller.name.clone();

    let round = snapshot.meeting.round + 1;
    snapshot.meeting = Meeting {
        status: MeetingStatus::Discussion,
        round,
        caller_id: Some(caller_id.to_string()),
        presenter_id: Some(caller_id.to_string()),
        meeting_end_time: Some(now + config.meeting_duration_ms),
        ..Meeting::default()
    };
    snapshot
        .chat
        .add_system_message(format!("{} called an emergency meeting", caller_name), now);
    Ok(())
}

/// Records a ballot. Returns whether every alive player has now voted.
pub fn record_vote(
    snapshot: &mut RoomSnapshot,
    voter_id: &str,
    candidate: Candidate,
    round: Option<u64>,
    now: i64,
) -> Result<bool> {
    let meeting = &snapshot.meeting;
    if meeting.status != MeetingStatus::Discussion {
        return Err(GameError::MeetingNotActive);
    }
    if let Some(round) = round {
        if round != meeting.round {
            return Err(GameError::StaleMeeting {
                expected: meeting.round,
                actual: round,
            });
        }
    }
    if meeting.meeting_end_time.is_some_and(|end| now >= end) {
        return Err(GameError::MeetingNotActive);
    }

    if !snapshot.player(voter_id)?.can_vote() {
        return Err(GameError::NotEligible(voter_id.to_string()));
    }
    if let Candidate::Player(target) = &candidate {
        let valid = snapshot.players.get(target).is_some_and(|p| p.is_alive);
        if !valid {
            return Err(GameError::InvalidCandidate(target.clone()));
        }
    }

    snapshot.meeting.votes.insert(voter_id.to_string(), candidate);
    Ok(all_votes_cast(snapshot))
}

pub fn all_votes_cast(snapshot: &RoomSnapshot) -> bool {
    snapshot
        .alive_players()
        .all(|p| snapshot.meeting.votes.contains_key(&p.id))
}

/// DISCUSSION → RESULTS. Running it again on a room that already left DISCUSSION is a no-op,
/// so two arbiters racing to conclude the same meeting end up with the same players.
pub fn conclude(snapshot: &mut RoomSnapshot, now: i64, config: &GameConfig) -> bool {
    if snapshot.meeting.status != MeetingStatus::Discussion {
        return false;
    }

    let tally = voting::tally(&snapshot.meeting.votes);
    let mut ejected_id = None;
    let result = match tally.winner.as_deref().and_then(|id| snapshot.players.get_mut(id)) {
        None => RESULT_SKIPPED,
        Some(player) => {
            ejected_id = Some(player.id.clone());
            player.is_alive = false;
            match player.role {
                Role::Imposter | Role::Reformed => {
                    player.role = Role::Reformed;
                    player.status = PlayerStatus::Reformed;
                    RESULT_IMPOSTER_CAUGHT
                }
                Role::Hero => {
                    player.status = PlayerStatus::Ejected;
                    RESULT_INNOCENT_EJECTED
                }
            }
        }
    };

    info!(
        "Meeting {} in room {} concluded: {} ({:?})",
        snapshot.meeting.round, snapshot.room.room_id, result, tally.outcome
    );

    let announcement = match &ejected_id {
        Some(id) => {
            let name = snapshot
                .players
                .get(id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.clone());
            format!("{} was ejected: {}", name, result)
        }
        None => format!("No one was ejected: {}", result),
    };
    snapshot.chat.add_system_message(announcement, now);

    let meeting = &mut snapshot.meeting;
    meeting.status = MeetingStatus::Results;
    meeting.results_end_time = Some(now + config.results_duration_ms);
    meeting.result = Some(result.to_string());
    meeting.ejected_id = ejected_id;
    meeting.tally = Some(tally);
    true
}

/// RESULTS → IDLE once the display window has passed.
pub fn reset(snapshot: &mut RoomSnapshot, now: i64) -> bool {
    let meeting = &snapshot.meeting;
    if meeting.status != MeetingStatus::Results {
        return false;
    }
    if meeting.results_end_time.is_some_and(|end| now < end) {
        return false;
    }

    let meeting = &mut snapshot.meeting;
    meeting.status = MeetingStatus::Idle;
    meeting.votes.clear();
    meeting.highlighted_line = None;
    meeting.caller_id = None;
    meeting.presenter_id = None;
    meeting.meeting_end_time = None;
    meeting.results_end_time = None;
    true
}

/// Deadline-driven transitions plus expiry of timed effects. Safe to call as often as wanted.
pub fn advance(snapshot: &mut RoomSnapshot, now: i64, config: &GameConfig) -> bool {
    let mut changed = false;

    let deadline_passed = snapshot
        .meeting
        .meeting_end_time
        .is_some_and(|end| now >= end);
    if snapshot.meeting.status == MeetingStatus::Discussion && deadline_passed {
        changed |= conclude(snapshot, now, config);
    }
    changed |= reset(snapshot, now);
    changed |= snapshot.sabotage.expire(now);

    for player in snapshot.players.values_mut() {
        let released = player.status == PlayerStatus::Jailed
            && player.jail_end_time.is_some_and(|end| now >= end);
        if released {
            player.status = PlayerStatus::Active;
            player.jail_end_time = None;
            changed = true;
        }
    }
    changed
}

pub fn start_meeting(state: &AppState, room_id: &str, caller_id: &str) -> Result<MeetingView> {
    let now = state.now();
    let (_, committed) = state
        .store
        .update(room_id, |snap| begin(snap, caller_id, now, &state.config))?;
    info!("Meeting started in room {} by {}", room_id, caller_id);
    Ok(view(&committed.snapshot.meeting, now))
}

pub fn cast_vote(
    state: &AppState,
    room_id: &str,
    voter_id: &str,
    candidate: Candidate,
    round: Option<u64>,
) -> Result<VoteReceipt> {
    let now = state.now();
    let (concluded, committed) = state.store.update(room_id, |snap| {
        let everyone_voted = record_vote(snap, voter_id, candidate, round, now)?;
        Ok(everyone_voted && conclude(snap, now, &state.config))
    })?;

    let snapshot = committed.snapshot;
    debug!("{} voted in room {}", voter_id, room_id);
    Ok(VoteReceipt {
        round: snapshot.meeting.round,
        votes_cast: snapshot.meeting.votes.len(),
        eligible_voters: snapshot.alive_players().count(),
        concluded,
    })
}

/// Client-triggered conclusion. Only the host may ask, and only once the deadline has passed.
pub fn finalize(state: &AppState, room_id: &str, requester_id: &str) -> Result<bool> {
    let now = state.now();
    let (concluded, _) = state.store.update(room_id, |snap| {
        if !snap.is_host(requester_id) {
            return Err(GameError::NotArbiter(requester_id.to_string()));
        }
        let due = snap.meeting.meeting_end_time.is_some_and(|end| now >= end);
        Ok(due && conclude(snap, now, &state.config))
    })?;
    Ok(concluded)
}

pub fn highlight_line(
    state: &AppState,
    room_id: &str,
    presenter_id: &str,
    file_id: &str,
    line: u32,
) -> Result<MeetingView> {
    let now = state.now();
    let (_, committed) = state.store.update(room_id, |snap| {
        if snap.meeting.status != MeetingStatus::Discussion {
            return Err(GameError::MeetingNotActive);
        }
        if snap.meeting.presenter_id.as_deref() != Some(presenter_id) {
            return Err(GameError::NotEligible(presenter_id.to_string()));
        }
        let line_count = snap.file(file_id)?.line_count();
        if line == 0 || line as usize > line_count {
            return Err(GameError::InvalidLine(line));
        }
        snap.meeting.highlighted_line = Some(HighlightedLine {
            file_id: file_id.to_string(),
            line,
        });
        Ok(())
    })?;
    Ok(view(&committed.snapshot.meeting, now))
}

pub fn get_meeting(state: &AppState, room_id: &str) -> Result<MeetingView> {
    let snapshot = state.store.snapshot(room_id)?;
    Ok(view(&snapshot.meeting, state.now()))
}

pub fn tick(state: &AppState, room_id: &str) -> Result<bool> {
    let now = state.now();
    let (changed, _) = state
        .store
        .update(room_id, |snap| Ok(advance(snap, now, &state.config)))?;
    Ok(changed)
}

/// One pass of the server-side arbiter over every room with a game running.
pub fn tick_all(state: &AppState) {
    for room_id in state.store.room_ids() {
        let in_progress = state
            .store
            .snapshot(&room_id)
            .map(|snap| snap.room.status == RoomStatus::InProgress)
            .unwrap_or(false);
        if !in_progress {
            continue;
        }
        if let Err(e) = tick(state, &room_id) {
            // 削除直後のルームは無視してよい
            debug!("Skipping tick for room {}: {}", room_id, e);
        }
    }
}

pub fn spawn_arbiter(state: AppState) -> tokio::task::JoinHandle<()> {
    let period = std::time::Duration::from_millis(state.config.tick_interval_ms.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            tick_all(&state);
        }
    })
}

fn view(meeting: &Meeting, now: i64) -> MeetingView {
    MeetingView {
        meeting: meeting.clone(),
        remaining_ms: meeting.remaining_ms(now),
        server_time: now,
    }
}
