//! The session engine: loads or creates a game, applies the opponent's move,
//! asks the engine for a reply and persists every step.
//!
//! Calls for one opponent are serialized by a per-opponent lock held for the
//! whole call; different opponents proceed in parallel. The human move is
//! saved before the engine is consulted, so an engine failure leaves a
//! session that still owes the engine reply rather than losing the move.

use chrono::{Local, NaiveDate};
use cozy_chess::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{ChessConfig, NewGamePolicy};
use crate::difficulty::{DifficultyPolicy, GameSummary};
use crate::engine::{EngineError, EngineLauncher, UciLauncher};
use crate::error::SessionError;
use crate::game::{Session, SessionState, Sides};
use crate::opponent::Opponent;
use crate::store::GameStore;

/// Decides which colour the engine plays in a new game.
pub trait CoinFlip: Send + Sync {
    fn engine_plays_white(&self) -> bool;
}

/// Fair coin seeded from OS entropy on every flip.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomCoin;

impl CoinFlip for RandomCoin {
    fn engine_plays_white(&self) -> bool {
        StdRng::from_entropy().gen_bool(0.5)
    }
}

/// Reproducible coin sequence.
#[derive(Debug)]
pub struct SeededCoin(Mutex<StdRng>);

impl SeededCoin {
    pub fn new(seed: u64) -> Self {
        Self(Mutex::new(StdRng::seed_from_u64(seed)))
    }
}

impl CoinFlip for SeededCoin {
    fn engine_plays_white(&self) -> bool {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_bool(0.5)
    }
}

/// Always the same side; `FixedCoin(true)` gives the engine White.
#[derive(Debug, Clone, Copy)]
pub struct FixedCoin(pub bool);

impl CoinFlip for FixedCoin {
    fn engine_plays_white(&self) -> bool {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Name written for the engine's side in transcripts
    pub engine_name: String,
    pub think_time: Duration,
    pub on_active_new_game: NewGamePolicy,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            engine_name: "chessbot".to_string(),
            think_time: Duration::from_secs(2),
            on_active_new_game: NewGamePolicy::Reject,
        }
    }
}

/// Result of `new_game`.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub session: Session,
    /// Opening move when the engine has White
    pub engine_move: Option<String>,
    /// The opponent already had a game and it was handed back
    pub resumed: bool,
}

/// Result of `play_move` and `resume`.
#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub session: Session,
    /// The opponent's move, `None` when the token was not applied
    pub human_move: Option<String>,
    pub engine_move: Option<String>,
    /// An engine reply owed from an earlier failure was produced first
    pub resumed: bool,
}

pub struct SessionEngine {
    store: Arc<dyn GameStore>,
    launcher: Arc<dyn EngineLauncher>,
    policy: DifficultyPolicy,
    settings: SessionSettings,
    coin: Box<dyn CoinFlip>,
    locks: LockMap,
}

impl SessionEngine {
    pub fn new(
        store: Arc<dyn GameStore>,
        launcher: Arc<dyn EngineLauncher>,
        policy: DifficultyPolicy,
        settings: SessionSettings,
    ) -> Self {
        Self {
            store,
            launcher,
            policy,
            settings,
            coin: Box::new(RandomCoin),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Wire up the configured store and UCI executable.
    pub fn from_config(config: &ChessConfig) -> Result<Self, SessionError> {
        let store = config.store.open()?;
        let launcher = Arc::new(UciLauncher::from_config(&config.engine));
        let settings = SessionSettings {
            engine_name: config.nick.clone(),
            think_time: config.engine.think_time(),
            on_active_new_game: config.on_active_newgame,
        };
        Ok(Self::new(store, launcher, config.difficulty, settings))
    }

    pub fn with_coin(mut self, coin: impl CoinFlip + 'static) -> Self {
        self.coin = Box::new(coin);
        self
    }

    pub fn store(&self) -> &Arc<dyn GameStore> {
        &self.store
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Start the next round against `raw_opponent`.
    pub fn new_game(&self, raw_opponent: &str) -> Result<NewGame, SessionError> {
        let opponent = parse_opponent(raw_opponent)?;
        let slot = self.lock_for(&opponent);
        let _guard = slot.acquire();

        if let Some(active) = self.store.find_active(&opponent)? {
            return match self.settings.on_active_new_game {
                NewGamePolicy::Reject => Err(SessionError::ActiveGameExists {
                    opponent,
                    round: active.round,
                }),
                NewGamePolicy::Resume => {
                    info!(%opponent, round = active.round, "handing back active game");
                    Ok(NewGame {
                        session: active,
                        engine_move: None,
                        resumed: true,
                    })
                }
            };
        }

        let history: Vec<GameSummary> = self
            .store
            .find_history(&opponent)?
            .iter()
            .map(Session::summary)
            .collect();
        let stats = self.policy.next_round_stats(&history);

        let engine_color = if self.coin.engine_plays_white() {
            Color::White
        } else {
            Color::Black
        };
        let sides = Sides::new(engine_color, &self.settings.engine_name, raw_opponent.trim());
        let mut session = Session::new(opponent, stats.round, stats.difficulty, sides, today());

        let engine_move = match session.state() {
            SessionState::AwaitingEngineMove => Some(self.engine_reply(&mut session)?),
            _ => None,
        };
        session.id = Some(self.store.save(&session)?);

        info!(
            opponent = %session.opponent,
            round = session.round,
            difficulty = session.difficulty,
            engine_color = ?engine_color,
            "new game"
        );
        Ok(NewGame {
            session,
            engine_move,
            resumed: false,
        })
    }

    /// Apply the opponent's `token` and answer it.
    ///
    /// An illegal token changes nothing. When the stored game still owes an
    /// engine reply, that reply is produced instead and the token is ignored.
    pub fn play_move(&self, raw_opponent: &str, token: &str) -> Result<MoveOutcome, SessionError> {
        let opponent = parse_opponent(raw_opponent)?;
        let slot = self.lock_for(&opponent);
        let _guard = slot.acquire();

        let mut session = self
            .store
            .find_active(&opponent)?
            .ok_or(SessionError::NoActiveGame(opponent))?;

        if session.state() == SessionState::AwaitingEngineMove {
            return self.finish_owed_reply(session);
        }

        let mv = session
            .resolve(token)
            .ok_or_else(|| SessionError::IllegalMove {
                token: token.trim().to_string(),
                legal: session.legal_moves(),
            })?;
        let human_move = session.apply(mv);
        self.store.save(&session)?;
        debug!(opponent = %session.opponent, human_move = %human_move, "checkpoint saved");

        let engine_move = if session.is_active() {
            let reply = self.engine_reply(&mut session)?;
            self.store.save(&session)?;
            Some(reply)
        } else {
            None
        };

        info!(
            opponent = %session.opponent,
            round = session.round,
            human_move = %human_move,
            engine_move = engine_move.as_deref().unwrap_or("-"),
            result = session.result.marker(),
            "move played"
        );
        Ok(MoveOutcome {
            session,
            human_move: Some(human_move),
            engine_move,
            resumed: false,
        })
    }

    /// Produce an engine reply owed from an earlier failure, if any.
    pub fn resume(&self, raw_opponent: &str) -> Result<MoveOutcome, SessionError> {
        let opponent = parse_opponent(raw_opponent)?;
        let slot = self.lock_for(&opponent);
        let _guard = slot.acquire();

        let session = self
            .store
            .find_active(&opponent)?
            .ok_or(SessionError::NoActiveGame(opponent))?;

        if session.state() == SessionState::AwaitingEngineMove {
            self.finish_owed_reply(session)
        } else {
            Ok(MoveOutcome {
                session,
                human_move: None,
                engine_move: None,
                resumed: false,
            })
        }
    }

    /// The opponent concedes the running game.
    pub fn resign(&self, raw_opponent: &str) -> Result<Session, SessionError> {
        let opponent = parse_opponent(raw_opponent)?;
        let slot = self.lock_for(&opponent);
        let _guard = slot.acquire();

        let mut session = self
            .store
            .find_active(&opponent)?
            .ok_or(SessionError::NoActiveGame(opponent))?;
        session.resign(session.sides.human());
        self.store.save(&session)?;

        info!(opponent = %session.opponent, round = session.round, "opponent resigned");
        Ok(session)
    }

    /// The active game, or the most recent one when none is active.
    pub fn board(&self, raw_opponent: &str) -> Result<Session, SessionError> {
        let opponent = parse_opponent(raw_opponent)?;
        if let Some(active) = self.store.find_active(&opponent)? {
            return Ok(active);
        }
        self.store
            .find_history(&opponent)?
            .pop()
            .ok_or(SessionError::NoActiveGame(opponent))
    }

    fn finish_owed_reply(&self, mut session: Session) -> Result<MoveOutcome, SessionError> {
        let reply = self.engine_reply(&mut session)?;
        self.store.save(&session)?;
        info!(
            opponent = %session.opponent,
            round = session.round,
            engine_move = %reply,
            "owed engine reply played"
        );
        Ok(MoveOutcome {
            session,
            human_move: None,
            engine_move: Some(reply),
            resumed: true,
        })
    }

    /// Launch an engine for this call, ask for a move and apply it.
    fn engine_reply(&self, session: &mut Session) -> Result<String, SessionError> {
        let mut engine = self.launcher.launch(session.difficulty)?;
        engine.set_position(session.moves())?;
        let token = engine.best_move(self.settings.think_time)?;
        let mv = session.resolve(&token).ok_or_else(|| {
            EngineError::Protocol(format!("engine played illegal move `{token}`"))
        })?;
        Ok(session.apply(mv))
    }

    fn lock_for(&self, opponent: &Opponent) -> LockSlot<'_> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        LockSlot {
            locks: &self.locks,
            opponent: opponent.clone(),
            lock: Arc::clone(locks.entry(opponent.clone()).or_default()),
        }
    }
}

type LockMap = Mutex<HashMap<Opponent, Arc<Mutex<()>>>>;

/// A claim on one opponent's lock. The map entry is removed when the last
/// claim goes away, so the map only holds opponents with calls in flight.
struct LockSlot<'a> {
    locks: &'a LockMap,
    opponent: Opponent,
    lock: Arc<Mutex<()>>,
}

impl LockSlot<'_> {
    fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LockSlot<'_> {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // the map's reference and ours
        if Arc::strong_count(&self.lock) == 2 {
            locks.remove(&self.opponent);
        }
    }
}

fn parse_opponent(raw: &str) -> Result<Opponent, SessionError> {
    Opponent::parse(raw).ok_or_else(|| SessionError::InvalidOpponent(raw.to_string()))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
