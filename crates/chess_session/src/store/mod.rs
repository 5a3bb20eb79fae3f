//! Game persistence.
//!
//! Each opponent owns a list of stored games. The active game is found
//! through the stored `result` column, never by replaying transcripts.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::game::{GameResult, Session};
use crate::opponent::Opponent;
use crate::transcript::{self, TranscriptError};

/// Store-assigned identity of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed game file {}: {source}", path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("stored game {id} is unreadable: {source}")]
    Corrupt {
        id: GameId,
        #[source]
        source: TranscriptError,
    },
    #[error("{opponent} already has an active game ({existing})")]
    ActiveConflict { opponent: Opponent, existing: GameId },
    #[error("game {0} is finished and can no longer change")]
    Immutable(GameId),
    #[error("game {0} does not exist")]
    UnknownGame(GameId),
}

/// Persistence interface the session engine depends on.
///
/// Implementations must make `save` atomic per opponent: a reader never
/// observes a half-written record, and two saves for the same opponent
/// never interleave.
pub trait GameStore: Send + Sync {
    /// The single in-progress game of `opponent`, if any.
    fn find_active(&self, opponent: &Opponent) -> Result<Option<Session>, StoreError>;

    /// Every stored game of `opponent`, ordered by round ascending.
    fn find_history(&self, opponent: &Opponent) -> Result<Vec<Session>, StoreError>;

    /// Insert or overwrite `session` and return its identity.
    ///
    /// A session carrying an id overwrites that record in place; a session
    /// without one is inserted under a fresh id.
    fn save(&self, session: &Session) -> Result<GameId, StoreError>;
}

/// One persisted game: the transcript plus the indexed columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGame {
    pub id: GameId,
    pub opponent: Opponent,
    pub round: u32,
    pub difficulty: u8,
    pub result: GameResult,
    pub transcript: String,
}

impl StoredGame {
    fn new(id: GameId, session: &Session) -> Self {
        Self {
            id,
            opponent: session.opponent.clone(),
            round: session.round,
            difficulty: session.difficulty,
            result: session.result,
            transcript: transcript::serialize(session),
        }
    }

    pub fn to_session(&self) -> Result<Session, StoreError> {
        let mut session = transcript::parse(&self.transcript).map_err(|source| StoreError::Corrupt {
            id: self.id,
            source,
        })?;
        session.id = Some(self.id);
        Ok(session)
    }
}

/// The in-progress record among one opponent's games.
fn active_record(records: &[StoredGame]) -> Option<&StoredGame> {
    records.iter().find(|r| r.result == GameResult::InProgress)
}

fn active_session(records: &[StoredGame]) -> Result<Option<Session>, StoreError> {
    active_record(records).map(StoredGame::to_session).transpose()
}

fn history(records: &[StoredGame]) -> Result<Vec<Session>, StoreError> {
    let mut sorted: Vec<&StoredGame> = records.iter().collect();
    sorted.sort_by_key(|r| r.round);
    sorted.into_iter().map(StoredGame::to_session).collect()
}

/// Apply the upsert rules to one opponent's records.
fn upsert(records: &mut Vec<StoredGame>, session: &Session) -> Result<GameId, StoreError> {
    match session.id {
        Some(id) => {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::UnknownGame(id))?;
            if record.result.is_terminal() {
                return Err(StoreError::Immutable(id));
            }
            *record = StoredGame::new(id, session);
            Ok(id)
        }
        None => {
            if session.is_active() {
                if let Some(existing) = active_record(records) {
                    return Err(StoreError::ActiveConflict {
                        opponent: session.opponent.clone(),
                        existing: existing.id,
                    });
                }
            }
            let id = GameId::new();
            records.push(StoredGame::new(id, session));
            Ok(id)
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
