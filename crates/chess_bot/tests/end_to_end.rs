//! Full games against the `random_uci` binary over real pipes.

use chess_session::{
    DifficultyPolicy, FixedCoin, GameStore, JsonFileStore, NewGamePolicy, Opponent, SessionEngine,
    SessionSettings, SessionState, UciLauncher,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn launcher() -> UciLauncher {
    UciLauncher {
        grace: Duration::from_secs(5),
        ..UciLauncher::new(env!("CARGO_BIN_EXE_random_uci"))
    }
}

fn engine(store: Arc<JsonFileStore>, engine_white: bool) -> SessionEngine {
    let settings = SessionSettings {
        engine_name: "chessbot".to_string(),
        think_time: Duration::from_millis(50),
        on_active_new_game: NewGamePolicy::Reject,
    };
    SessionEngine::new(store, Arc::new(launcher()), DifficultyPolicy::default(), settings)
        .with_coin(FixedCoin(engine_white))
}

#[test]
fn test_newgame_then_move() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let bot = engine(store.clone(), true);

    let started = bot.new_game("#test").unwrap();
    let session = &started.session;
    assert!(started.engine_move.is_some());
    assert_eq!(session.sides.white, "chessbot");
    assert_eq!(session.sides.black, "#test");
    assert_eq!(session.round, 1);
    assert_eq!(session.difficulty, 0);
    assert_eq!(session.moves().len(), 1);

    let reply = session.legal_moves()[0].clone();
    let outcome = bot.play_move("#test", &reply).unwrap();
    assert_eq!(outcome.human_move.as_deref(), Some(reply.as_str()));
    assert!(outcome.engine_move.is_some());
    assert_eq!(outcome.session.state(), SessionState::AwaitingHumanMove);

    // a fresh engine over the same directory sees the same game
    let reopened = JsonFileStore::open(dir.path()).unwrap();
    let stored = reopened
        .find_active(&Opponent::parse("#test").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(stored.moves(), outcome.session.moves());
}

#[test]
fn test_play_until_resign() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let bot = engine(store.clone(), false);
    bot.new_game("#test").unwrap();

    let mut session = bot.board("#test").unwrap();
    for _ in 0..5 {
        if !session.is_active() {
            break;
        }
        let token = session.legal_moves()[0].clone();
        session = bot.play_move("#test", &token).unwrap().session;
    }

    if session.is_active() {
        let resigned = bot.resign("#test").unwrap();
        assert_eq!(resigned.state(), SessionState::Terminal);
    }

    let next = bot.new_game("#test").unwrap();
    assert_eq!(next.session.round, 2);
}
