use std::sync::Arc;

use server::{
    error::GameError,
    models::{code_file::TestStatus, role::Role, sabotage::SabotageType},
    services::{
        file_service, game_service, meeting_service, room_service,
        room_service::JoinRequest,
        sabotage_service::{self, SabotageRequest},
    },
    state::AppState,
    utils::{clock::ManualClock, test_setup::test_state},
};

struct Crew {
    state: AppState,
    clock: Arc<ManualClock>,
    room_id: String,
    imposter: String,
    hero: String,
}

fn start_game() -> Crew {
    let (state, clock) = test_state(11);
    let room_id = room_service::create_room(&state, None, None).unwrap();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(
            room_service::join_room(&state, &room_id, JoinRequest::default())
                .unwrap()
                .player
                .id,
        );
        clock.advance(1);
    }
    let assignments = game_service::start_game(&state, &room_id, &ids[0]).unwrap();
    let imposter = assignments
        .iter()
        .find(|a| a.role == Role::Imposter)
        .unwrap()
        .player_id
        .clone();
    let hero = ids.into_iter().find(|id| *id != imposter).unwrap();
    Crew {
        state,
        clock,
        room_id,
        imposter,
        hero,
    }
}

fn request(player_id: &str, kind: SabotageType, file_id: Option<&str>) -> SabotageRequest {
    SabotageRequest {
        player_id: player_id.to_string(),
        kind,
        file_id: file_id.map(str::to_string),
        door_id: None,
    }
}

#[tokio::test]
async fn test_code_sabotage_corrupts_file_and_starts_cooldown() {
    let crew = start_game();
    let original = file_service::get_file(&crew.state, &crew.room_id, "navigation").unwrap();

    let report = sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.imposter, SabotageType::SyntaxError, Some("navigation")),
    )
    .unwrap();
    assert!(report.success);
    assert_eq!(
        report.cooldown_end,
        crew.state.now() + crew.state.config.sabotage_cooldown_ms
    );

    let file = file_service::get_file(&crew.state, &crew.room_id, "navigation").unwrap();
    assert_ne!(file.content, original.content);
    assert!(file.is_corrupted);
    assert_eq!(file.test_status, TestStatus::Pending);
    assert_eq!(file.last_sabotage.unwrap().kind, SabotageType::SyntaxError);

    let again = sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.imposter, SabotageType::PowerCut, None),
    );
    assert_eq!(
        again.unwrap_err(),
        GameError::SabotageCooldown {
            remaining_ms: crew.state.config.sabotage_cooldown_ms
        }
    );
}

#[tokio::test]
async fn test_only_living_imposter_can_sabotage() {
    let crew = start_game();

    let result = sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.hero, SabotageType::PowerCut, None),
    );
    assert_eq!(result.unwrap_err(), GameError::NotImposter(crew.hero.clone()));

    meeting_service::start_meeting(&crew.state, &crew.room_id, &crew.hero).unwrap();
    let during_meeting = sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.imposter, SabotageType::PowerCut, None),
    );
    assert_eq!(during_meeting.unwrap_err(), GameError::MeetingInProgress);
}

#[tokio::test]
async fn test_missing_target_is_rejected() {
    let crew = start_game();

    let result = sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.imposter, SabotageType::ClearLine, None),
    );
    assert_eq!(result.unwrap_err(), GameError::MissingTarget("file_id"));

    // 失敗した妨害はクールダウンを消費しない
    let view =
        sabotage_service::get_sabotage(&crew.state, &crew.room_id, Some(&crew.hero)).unwrap();
    assert_eq!(view.cooldown_remaining_ms, 0);
}

#[tokio::test]
async fn test_power_cut_expires_on_tick() {
    let crew = start_game();
    let config = crew.state.config.clone();

    sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.imposter, SabotageType::PowerCut, None),
    )
    .unwrap();
    let view =
        sabotage_service::get_sabotage(&crew.state, &crew.room_id, Some(&crew.hero)).unwrap();
    assert!(view.power_is_off);

    crew.clock.advance(config.power_cut_duration_ms);
    let view =
        sabotage_service::get_sabotage(&crew.state, &crew.room_id, Some(&crew.hero)).unwrap();
    assert!(!view.power_is_off);

    assert!(meeting_service::tick(&crew.state, &crew.room_id).unwrap());
    let snapshot = crew.state.store.snapshot(&crew.room_id).unwrap();
    assert!(!snapshot.sabotage.power_off);
    assert_eq!(snapshot.sabotage.power_off_until, None);
}

#[tokio::test]
async fn test_locked_terminal_blocks_edits_until_expiry() {
    let crew = start_game();
    let config = crew.state.config.clone();

    sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        request(&crew.imposter, SabotageType::LockTerminal, Some("oxygen")),
    )
    .unwrap();

    let locked = file_service::edit_file(
        &crew.state,
        &crew.room_id,
        "oxygen",
        &crew.hero,
        "fixed".to_string(),
    );
    assert_eq!(locked.unwrap_err(), GameError::TerminalLocked("oxygen".to_string()));

    // 他のファイルは編集できる
    file_service::edit_file(
        &crew.state,
        &crew.room_id,
        "reactor",
        &crew.hero,
        "print(55)\n".to_string(),
    )
    .unwrap();

    crew.clock.advance(config.terminal_lock_duration_ms);
    let edited = file_service::edit_file(
        &crew.state,
        &crew.room_id,
        "oxygen",
        &crew.hero,
        "fixed".to_string(),
    )
    .unwrap();
    assert_eq!(edited.content, "fixed");
}

#[tokio::test]
async fn test_sealed_door() {
    let crew = start_game();

    let report = sabotage_service::sabotage(
        &crew.state,
        &crew.room_id,
        SabotageRequest {
            player_id: crew.imposter.clone(),
            kind: SabotageType::SealDoor,
            file_id: None,
            door_id: Some("engine-room".to_string()),
        },
    )
    .unwrap();
    assert!(report.success);

    let view =
        sabotage_service::get_sabotage(&crew.state, &crew.room_id, Some(&crew.hero)).unwrap();
    assert_eq!(view.active_effects.len(), 1);
    assert_eq!(view.active_effects[0].target, "engine-room");
    let action = view.state.last_action.unwrap();
    assert_eq!(action.target.as_deref(), Some("engine-room"));
    // 妨害した本人以外には誰の仕業か見えない
    assert_eq!(action.player_id, None);

    let own = sabotage_service::get_sabotage(&crew.state, &crew.room_id, Some(&crew.imposter))
        .unwrap();
    assert_eq!(
        own.state.last_action.unwrap().player_id.as_deref(),
        Some(crew.imposter.as_str())
    );
}
