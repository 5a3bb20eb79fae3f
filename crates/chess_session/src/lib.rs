//! Persistent chess sessions for chat opponents.
//!
//! Every opponent (an IRC channel or nick) owns at most one game in progress.
//! Moves typed by the opponent are validated against the board, answered by
//! an external UCI engine and persisted after every step, so a crash or an
//! engine failure never loses an accepted move. Engine strength follows the
//! opponent's results: win and the next round gets harder, lose and it eases off.
//!
//! # Usage
//!
//! ```no_run
//! use chess_session::{ChessConfig, SessionEngine};
//!
//! let config = ChessConfig::load(None)?;
//! let engine = SessionEngine::from_config(&config)?;
//! let started = engine.new_game("#chess")?;
//! println!("round {}", started.session.round);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command;
pub mod config;
pub mod difficulty;
pub mod engine;
pub mod error;
pub mod game;
pub mod opponent;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod transcript;
pub mod uci;

#[cfg(test)]
mod test_support;

pub use command::{dispatch, Command, Reply};
pub use config::{ChessConfig, ConfigError, NewGamePolicy};
pub use difficulty::{DifficultyPolicy, GameSummary, RoundStats};
pub use engine::{Engine, EngineError, EngineLauncher, UciLauncher};
pub use error::SessionError;
pub use game::{GameResult, Session, SessionState, Sides, Termination};
pub use opponent::Opponent;
pub use session::{
    CoinFlip, FixedCoin, MoveOutcome, NewGame, RandomCoin, SeededCoin, SessionEngine,
    SessionSettings,
};
pub use snapshot::BoardSnapshot;
pub use store::{GameId, GameStore, JsonFileStore, MemoryStore, StoreError};
pub use transcript::TranscriptError;
