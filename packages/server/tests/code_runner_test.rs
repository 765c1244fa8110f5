use serde_json::json;
use server::{
    models::code_file::TestStatus,
    services::{
        assistant::{AssistantClient, FALLBACK_HINT},
        code_runner::CodeRunner,
        file_service::{self, COMPILER_UNREACHABLE},
        game_service, room_service,
        room_service::JoinRequest,
    },
    state::AppState,
    utils::test_setup::test_state,
};
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

/// サンドボックスの URL を差し替えたゲームを開始する
async fn started_game(runner_url: Option<String>) -> (AppState, String, String) {
    let (mut state, clock) = test_state(3);
    if let Some(url) = runner_url {
        state.code_runner = CodeRunner::new(url);
    }
    let room_id = room_service::create_room(&state, None, None).unwrap();
    let mut host = None;
    for _ in 0..3 {
        let joined = room_service::join_room(&state, &room_id, JoinRequest::default()).unwrap();
        host.get_or_insert(joined.player.id);
        clock.advance(1);
    }
    let host = host.unwrap();
    game_service::start_game(&state, &room_id, &host).unwrap();
    (state, room_id, host)
}

fn piston_reply(stdout: &str, stderr: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "language": "python",
        "version": "3.10.0",
        "run": { "stdout": stdout, "stderr": stderr, "code": 0 },
    }))
}

#[tokio::test]
async fn test_matching_output_passes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .and(body_partial_json(json!({ "language": "python", "version": "*" })))
        .respond_with(piston_reply("55\n", ""))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (state, room_id, _) = started_game(Some(mock_server.uri())).await;
    let report = file_service::run_file(&state, &room_id, "reactor").await.unwrap();
    assert_eq!(report.status, TestStatus::Pass);
    assert!(report.applied);

    let file = file_service::get_file(&state, &room_id, "reactor").unwrap();
    assert_eq!(file.test_status, TestStatus::Pass);
    assert!(!file.is_corrupted);
    assert_eq!(file.last_output.unwrap().stdout, "55\n");
}

#[tokio::test]
async fn test_wrong_output_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(piston_reply("54\n", ""))
        .mount(&mock_server)
        .await;

    let (state, room_id, _) = started_game(Some(mock_server.uri())).await;
    let report = file_service::run_file(&state, &room_id, "reactor").await.unwrap();
    assert_eq!(report.status, TestStatus::Fail);
    assert_eq!(report.stdout, "54\n");
}

#[tokio::test]
async fn test_compile_errors_are_reported() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "compile": { "stdout": "", "stderr": "error: expected ';'" },
            "run": { "stdout": "", "stderr": "" },
        })))
        .mount(&mock_server)
        .await;

    let (state, room_id, _) = started_game(Some(mock_server.uri())).await;
    let report = file_service::run_file(&state, &room_id, "shields").await.unwrap();
    assert_eq!(report.status, TestStatus::Fail);
    assert!(report.stderr.contains("expected ';'"));
}

#[tokio::test]
async fn test_unreachable_sandbox_is_a_failed_run() {
    // テスト環境の CODE_RUNNER_URL は誰も待ち受けていないポート
    let (state, room_id, _) = started_game(None).await;

    let report = file_service::run_file(&state, &room_id, "reactor").await.unwrap();
    assert_eq!(report.status, TestStatus::Fail);
    assert_eq!(report.stderr, COMPILER_UNREACHABLE);

    let file = file_service::get_file(&state, &room_id, "reactor").unwrap();
    assert_eq!(file.test_status, TestStatus::Fail);
}

#[tokio::test]
async fn test_verdict_for_edited_file_is_discarded() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute"))
        .respond_with(piston_reply("55\n", "").set_delay(Duration::from_millis(300)))
        .mount(&mock_server)
        .await;

    let (state, room_id, host) = started_game(Some(mock_server.uri())).await;

    let run_state = state.clone();
    let run_room = room_id.clone();
    let run = tokio::spawn(async move {
        file_service::run_file(&run_state, &run_room, "reactor").await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    file_service::edit_file(&state, &room_id, "reactor", &host, "print(56)\n".to_string())
        .unwrap();

    let report = run.await.unwrap().unwrap();
    assert_eq!(report.status, TestStatus::Pass);
    assert!(!report.applied);

    let file = file_service::get_file(&state, &room_id, "reactor").unwrap();
    assert_eq!(file.content, "print(56)\n");
    assert_eq!(file.test_status, TestStatus::Pending);
    assert_eq!(file.last_output, None);
}

#[tokio::test]
async fn test_assistant_reply_and_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": { "role": "assistant", "content": "82 - tidy loop, good names." },
            }],
        })))
        .mount(&mock_server)
        .await;

    let (mut state, room_id, _) = started_game(None).await;
    state.assistant = AssistantClient::new(
        format!("{}/v1/chat/completions", mock_server.uri()),
        Some("test-key".to_string()),
        "test-model",
    );
    let review = file_service::review(&state, &room_id, "reactor").await.unwrap();
    assert_eq!(review.score, Some(82));
    assert!(review.feedback.contains("tidy loop"));

    // キーが無ければ定型文に落ちる
    state.assistant = AssistantClient::new(
        format!("{}/v1/chat/completions", mock_server.uri()),
        None,
        "test-model",
    );
    let hint = file_service::hint(&state, &room_id, "reactor").await.unwrap();
    assert_eq!(hint, FALLBACK_HINT);
}
