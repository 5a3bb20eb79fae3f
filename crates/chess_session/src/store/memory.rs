use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{active_session, history, upsert, GameId, GameStore, StoreError, StoredGame};
use crate::game::Session;
use crate::opponent::Opponent;

/// Process-local store. Games live as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    games: Mutex<HashMap<Opponent, Vec<StoredGame>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw records of `opponent`, in insertion order.
    pub fn records(&self, opponent: &Opponent) -> Vec<StoredGame> {
        self.lock().get(opponent).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Opponent, Vec<StoredGame>>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GameStore for MemoryStore {
    fn find_active(&self, opponent: &Opponent) -> Result<Option<Session>, StoreError> {
        match self.lock().get(opponent) {
            Some(records) => active_session(records),
            None => Ok(None),
        }
    }

    fn find_history(&self, opponent: &Opponent) -> Result<Vec<Session>, StoreError> {
        match self.lock().get(opponent) {
            Some(records) => history(records),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, session: &Session) -> Result<GameId, StoreError> {
        let mut games = self.lock();
        let records = games.entry(session.opponent.clone()).or_default();
        upsert(records, session)
    }
}
