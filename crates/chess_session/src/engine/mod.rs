//! External engine access.
//!
//! The session layer only sees the [`Engine`] and [`EngineLauncher`] traits;
//! [`UciLauncher`] is the production implementation that drives a UCI
//! executable over stdin/stdout.

mod process;

pub use process::{UciEngine, UciLauncher};

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("cannot start engine {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("engine protocol error: {0}")]
    Protocol(String),
    #[error("engine sent no `{expected}` within {waited:?}")]
    Timeout {
        expected: &'static str,
        waited: Duration,
    },
}

/// One running engine instance, owned by a single call.
pub trait Engine: Send {
    /// Set the position as the move list from the standard start.
    fn set_position(&mut self, moves: &[String]) -> Result<(), EngineError>;

    /// Search for `think_time` and return the chosen move in coordinate
    /// notation. The token is not checked against the board here.
    fn best_move(&mut self, think_time: Duration) -> Result<String, EngineError>;
}

/// Starts engines at a given strength.
pub trait EngineLauncher: Send + Sync {
    fn launch(&self, difficulty: u8) -> Result<Box<dyn Engine>, EngineError>;
}
