use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::opponent::Opponent;
use crate::store::StoreError;

/// Everything a session operation can fail with.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("`{0}` is not a valid opponent")]
    InvalidOpponent(String),
    #[error("`{token}` is not a valid move")]
    IllegalMove { token: String, legal: Vec<String> },
    #[error("{0} has no game")]
    NoActiveGame(Opponent),
    #[error("{opponent} already has a game in progress (round {round})")]
    ActiveGameExists { opponent: Opponent, round: u32 },
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// Failures caused by the bot's own machinery rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            SessionError::Engine(_) | SessionError::Store(_) | SessionError::Config(_)
        )
    }

    /// One line fit for the chat channel. Internal failures stay generic.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::InvalidOpponent(raw) => format!("cannot play against `{raw}`"),
            SessionError::IllegalMove { token, legal } => {
                format!("{token} is not a valid move. valid moves: {}", legal.join(", "))
            }
            SessionError::NoActiveGame(_) => {
                "no game in progress. start one with newgame".to_string()
            }
            SessionError::ActiveGameExists { round, .. } => {
                format!("round {round} is still in progress. finish it or resign first")
            }
            SessionError::Engine(_) => "the engine failed, try again later".to_string(),
            SessionError::Store(_) | SessionError::Config(_) => {
                "something went wrong, try again later".to_string()
            }
        }
    }
}
