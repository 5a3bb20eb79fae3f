//! Router tests with in-memory games and the `random_uci` engine.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chess_bot::{build_router, AppState};
use chess_session::{
    DifficultyPolicy, FixedCoin, MemoryStore, NewGamePolicy, SessionEngine, SessionSettings,
    UciLauncher,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_app() -> axum::Router {
    let settings = SessionSettings {
        engine_name: "chessbot".to_string(),
        think_time: Duration::from_millis(50),
        on_active_new_game: NewGamePolicy::Reject,
    };
    let engine = SessionEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(UciLauncher::new(env!("CARGO_BIN_EXE_random_uci"))),
        DifficultyPolicy::default(),
        settings,
    )
    .with_coin(FixedCoin(false));
    build_router(AppState::new(engine, "http://bot/chess/{opponent}/"))
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn command(opponent: &str, text: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/chess/{opponent}/command"))
        .header("content-type", "text/plain")
        .body(Body::from(text.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_board_missing_is_404() {
    let app = test_app();
    let (status, json) = send(&app, get("/chess/nobody/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_commands_and_board() {
    let app = test_app();

    let (status, json) = send(&app, command("test", "newgame")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["lines"][0], "round 1: I chose black");
    assert_eq!(json["lines"][1], "White to move");

    let (_, json) = send(&app, command("test", "move e2e4")).await;
    assert!(json["lines"][0].as_str().unwrap().starts_with("my move: "));

    for uri in ["/chess/test/", "/chess/test"] {
        let (status, json) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["opponent"], "test");
        assert_eq!(json["moves"].as_array().unwrap().len(), 2);
        assert_eq!(json["moves"][0], "e2e4");
        assert_eq!(json["state"], "awaiting_human_move");
        assert_eq!(json["flipped"], false);
    }

    let (_, json) = send(&app, command("test", "board")).await;
    assert_eq!(json["lines"][0], "http://bot/chess/test/");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_health() {
    let (status, json) = send(&test_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
}
