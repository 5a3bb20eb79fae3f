//! In-process engines for session tests.

use cozy_chess::Board;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::NewGamePolicy;
use crate::difficulty::DifficultyPolicy;
use crate::engine::{Engine, EngineError, EngineLauncher};
use crate::session::{FixedCoin, SessionEngine, SessionSettings};
use crate::store::MemoryStore;
use crate::uci::{legal_move_list, parse_uci_move};

/// Plays the alphabetically first legal move.
#[derive(Default)]
pub struct FirstLegalLauncher {
    pub launches: AtomicUsize,
    /// Difficulty of the most recent launch
    pub last_difficulty: Mutex<Option<u8>>,
}

impl EngineLauncher for FirstLegalLauncher {
    fn launch(&self, difficulty: u8) -> Result<Box<dyn Engine>, EngineError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        *self.last_difficulty.lock().unwrap() = Some(difficulty);
        Ok(Box::new(FirstLegal::default()))
    }
}

#[derive(Default)]
struct FirstLegal {
    board: Board,
}

impl Engine for FirstLegal {
    fn set_position(&mut self, moves: &[String]) -> Result<(), EngineError> {
        let mut board = Board::default();
        for token in moves {
            let mv = parse_uci_move(&board, token)
                .ok_or_else(|| EngineError::Protocol(format!("bad position move {token}")))?;
            board.play(mv);
        }
        self.board = board;
        Ok(())
    }

    fn best_move(&mut self, _think_time: Duration) -> Result<String, EngineError> {
        legal_move_list(&self.board)
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Protocol("no legal move".to_string()))
    }
}

/// Replies with queued tokens, verbatim.
#[derive(Default)]
pub struct ScriptedLauncher {
    replies: Arc<Mutex<VecDeque<String>>>,
}

impl ScriptedLauncher {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.iter().map(|s| s.to_string()).collect())),
        }
    }
}

impl EngineLauncher for ScriptedLauncher {
    fn launch(&self, _difficulty: u8) -> Result<Box<dyn Engine>, EngineError> {
        Ok(Box::new(Scripted {
            replies: Arc::clone(&self.replies),
        }))
    }
}

struct Scripted {
    replies: Arc<Mutex<VecDeque<String>>>,
}

impl Engine for Scripted {
    fn set_position(&mut self, _moves: &[String]) -> Result<(), EngineError> {
        Ok(())
    }

    fn best_move(&mut self, think_time: Duration) -> Result<String, EngineError> {
        self.replies.lock().unwrap().pop_front().ok_or(EngineError::Timeout {
            expected: "bestmove",
            waited: think_time,
        })
    }
}

/// Starts fine but never answers `go`.
pub struct FailingLauncher;

impl EngineLauncher for FailingLauncher {
    fn launch(&self, _difficulty: u8) -> Result<Box<dyn Engine>, EngineError> {
        ScriptedLauncher::default().launch(0)
    }
}

pub fn settings(policy: NewGamePolicy) -> SessionSettings {
    SessionSettings {
        engine_name: "chessbot".to_string(),
        think_time: Duration::from_millis(10),
        on_active_new_game: policy,
    }
}

/// Session engine over a fresh memory store. `engine_white` fixes the coin.
pub fn session_engine(
    launcher: Arc<dyn EngineLauncher>,
    engine_white: bool,
    policy: NewGamePolicy,
) -> (SessionEngine, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let engine = SessionEngine::new(
        store.clone(),
        launcher,
        DifficultyPolicy::default(),
        settings(policy),
    )
    .with_coin(FixedCoin(engine_white));
    (engine, store)
}
