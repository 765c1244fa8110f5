use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use server::{
    app,
    utils::{clock::ManualClock, test_setup::test_state},
};
use tower::ServiceExt;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

struct Seat {
    id: String,
    token: String,
}

/// ルームを作って名前の数だけ参加させる
async fn seat_players(app: &Router, names: &[&str], clock: &ManualClock) -> (String, Vec<Seat>) {
    let (_, created) = send(app, "POST", "/api/room/create", None, None).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();
    let mut seats = Vec::new();
    for name in names {
        let (status, joined) = send(
            app,
            "POST",
            &format!("/api/room/{}/join", room_id),
            None,
            Some(json!({ "name": name })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        seats.push(Seat {
            id: joined["player"]["id"].as_str().unwrap().to_string(),
            token: joined["token"].as_str().unwrap().to_string(),
        });
        clock.advance(1);
    }
    (room_id, seats)
}

/// 各自の /state から自分が偽者かどうかを調べる
async fn find_imposter(app: &Router, room_id: &str, seats: &[Seat]) -> usize {
    let mut imposter = None;
    for (index, seat) in seats.iter().enumerate() {
        let (status, view) = send(
            app,
            "GET",
            &format!("/api/game/{}/state", room_id),
            Some(&seat.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let visible: Vec<&str> = view["players"]
            .as_object()
            .unwrap()
            .values()
            .filter(|p| p["role"] == "imposter")
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert!(visible.len() <= 1);
        if visible == [seat.id.as_str()] {
            imposter = Some(index);
        }
    }
    imposter.unwrap()
}

#[tokio::test]
async fn test_create_and_join_room() {
    let (state, _) = test_state(1);
    let app = app::create_app_with_state(state);

    let (status, created) = send(&app, "POST", "/api/room/create", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let room_id = created["room_id"].as_str().unwrap().to_string();

    let (status, joined) = send(
        &app,
        "POST",
        &format!("/api/room/{}/join", room_id),
        None,
        Some(json!({ "name": "ada" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["player"]["name"], "ada");
    assert_eq!(joined["player"]["role"], "hero");
    assert!(joined["token"].as_str().is_some_and(|t| !t.is_empty()));

    let (status, room) = send(&app, "GET", &format!("/api/room/{}", room_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["playerCount"], 1);
}

#[tokio::test]
async fn test_rejoin_with_stale_credentials() {
    let (state, _) = test_state(1);
    let app = app::create_app_with_state(state);

    let (_, created) = send(&app, "POST", "/api/room/create", None, None).await;
    let room_id = created["room_id"].as_str().unwrap().to_string();
    let (_, joined) = send(
        &app,
        "POST",
        &format!("/api/room/{}/join", room_id),
        None,
        Some(json!({ "name": "ada" })),
    )
    .await;
    let token = joined["token"].as_str().unwrap().to_string();

    let rejoin = Some(json!({ "token": token }));
    let (status, rejoined) = send(&app, "POST", "/api/room/rejoin", None, rejoin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejoined["player"]["id"], joined["player"]["id"]);

    let (status, _) = send(
        &app,
        "POST",
        "/api/room/rejoin",
        None,
        Some(json!({ "token": "not-a-token" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // ルームが消えたら保存済みの認証情報は無効
    let delete_uri = format!("/api/room/{}/delete", room_id);
    let (status, _) = send(&app, "DELETE", &delete_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "DELETE", &delete_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let rejoin = Some(json!({ "token": token }));
    let (status, body) = send(&app, "POST", "/api/room/rejoin", None, rejoin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_hero_token_cannot_see_imposter_or_sabotage() {
    let (state, clock) = test_state(5);
    let app = app::create_app_with_state(state);
    let (room_id, seats) = seat_players(&app, &["p1", "p2", "p3"], &clock).await;
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/game/{}/start", room_id),
        Some(&seats[0].token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let imposter = find_imposter(&app, &room_id, &seats).await;
    let hero = (imposter + 1) % seats.len();

    // 本文やクエリで他人の id を名乗っても無視される
    let (status, view) = send(
        &app,
        "GET",
        &format!("/api/game/{}/state?viewer_id={}", room_id, seats[imposter].id),
        Some(&seats[hero].token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["players"][&seats[imposter].id]["role"], "hero");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sabotage/{}", room_id),
        Some(&seats[hero].token),
        Some(json!({ "player_id": seats[imposter].id, "type": "power_cut" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // トークン無し、または別ルームのトークンは拒否される
    let state_uri = format!("/api/game/{}/state", room_id);
    let (status, _) = send(&app, "GET", &state_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, strangers) = seat_players(&app, &["x"], &clock).await;
    let (status, _) = send(&app, "GET", &state_uri, Some(&strangers[0].token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 本物の偽者の妨害でも、他の人には誰がやったか見えない
    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/sabotage/{}", room_id),
        Some(&seats[imposter].token),
        Some(json!({ "type": "power_cut" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, sabotage) = send(
        &app,
        "GET",
        &format!("/api/sabotage/{}", room_id),
        Some(&seats[hero].token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sabotage["lastAction"]["type"], "power_cut");
    assert!(sabotage["lastAction"].get("playerId").is_none());
}

#[tokio::test]
async fn test_full_meeting_over_http() {
    let (state, clock) = test_state(5);
    let app = app::create_app_with_state(state);
    let (room_id, seats) = seat_players(&app, &["p1", "p2", "p3"], &clock).await;

    let start_uri = format!("/api/game/{}/start", room_id);
    let (status, _) = send(&app, "POST", &start_uri, Some(&seats[1].token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "POST", &start_uri, Some(&seats[0].token), None).await;
    assert_eq!(status, StatusCode::OK);

    let imposter = find_imposter(&app, &room_id, &seats).await;
    let hero = (imposter + 1) % seats.len();

    let (status, meeting) = send(
        &app,
        "POST",
        &format!("/api/meeting/{}/start", room_id),
        Some(&seats[hero].token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meeting["status"], "DISCUSSION");
    let round = meeting["round"].as_u64().unwrap();

    let vote_uri = format!("/api/meeting/{}/vote", room_id);
    let (status, _) = send(
        &app,
        "POST",
        &vote_uri,
        Some(&seats[hero].token),
        Some(json!({ "candidate": seats[imposter].id, "round": round + 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut concluded = false;
    for seat in &seats {
        let (status, receipt) = send(
            &app,
            "POST",
            &vote_uri,
            Some(&seat.token),
            Some(json!({ "candidate": seats[imposter].id, "round": round })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        concluded = receipt["concluded"].as_bool().unwrap();
    }
    assert!(concluded);

    let (status, meeting) =
        send(&app, "GET", &format!("/api/meeting/{}", room_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meeting["status"], "RESULTS");
    assert_eq!(meeting["result"], "IMPOSTER CAUGHT");
    assert_eq!(meeting["ejectedId"], seats[imposter].id.as_str());
}

#[tokio::test]
async fn test_files_over_http() {
    let (state, clock) = test_state(2);
    let app = app::create_app_with_state(state);
    let (room_id, seats) = seat_players(&app, &["", "", ""], &clock).await;
    let token = Some(seats[1].token.as_str());
    send(
        &app,
        "POST",
        &format!("/api/game/{}/start", room_id),
        Some(&seats[0].token),
        None,
    )
    .await;

    let files_uri = format!("/api/files/{}", room_id);
    let (status, _) = send(&app, "GET", &files_uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, files) = send(&app, "GET", &files_uri, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(files.as_array().unwrap().len(), 4);

    let (status, file) = send(
        &app,
        "PUT",
        &format!("/api/files/{}/reactor", room_id),
        token,
        Some(json!({ "content": "print(55)\n" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(file["content"], "print(55)\n");
    assert_eq!(file["testStatus"], "PENDING");

    let nope_uri = format!("/api/files/{}/nope", room_id);
    let (status, _) = send(&app, "GET", &nope_uri, token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, files) =
        send(&app, "POST", &format!("/api/files/{}/reset", room_id), token, None).await;
    assert_eq!(status, StatusCode::OK);
    let reactor = files
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["id"] == "reactor")
        .unwrap();
    assert_ne!(reactor["content"], "print(55)\n");

    let (status, reply) = send(
        &app,
        "POST",
        &format!("/api/assistant/{}/chat", room_id),
        token,
        Some(json!({ "prompt": "why does reactor fail?", "file_id": "reactor" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!reply["reply"].as_str().unwrap().is_empty());
}
