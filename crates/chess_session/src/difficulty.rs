//! Round numbering and adaptive engine strength.
//!
//! Strength is derived only from finished games, so the next round's level
//! can be recomputed from stored history alone.

use cozy_chess::Color;
use serde::{Deserialize, Serialize};

use crate::game::GameResult;

/// Level used for an opponent's first game
pub const DEFAULT_BASELINE: u8 = 0;

/// Highest `Skill Level` Stockfish accepts
pub const DEFAULT_MAX_LEVEL: u8 = 20;

/// What the policy needs to know about one stored game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    pub round: u32,
    pub difficulty: u8,
    pub result: GameResult,
    /// Colour the engine played
    pub engine: Color,
}

impl GameSummary {
    /// `Some(true)` if the engine won, `Some(false)` if it lost,
    /// `None` for draws and unfinished games.
    pub fn engine_won(&self) -> Option<bool> {
        self.result.winner().map(|winner| winner == self.engine)
    }
}

/// Round number and engine level for the next game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundStats {
    pub round: u32,
    pub difficulty: u8,
}

/// Step-up/step-down strength policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyPolicy {
    /// Level for the first round
    pub baseline: u8,
    /// Floor; an engine win never pushes the level below it
    pub min: u8,
    /// Ceiling; an engine loss never pushes the level above it
    pub max: u8,
    /// Change applied after a decisive game
    pub step: u8,
}

impl Default for DifficultyPolicy {
    fn default() -> Self {
        Self {
            baseline: DEFAULT_BASELINE,
            min: 0,
            max: DEFAULT_MAX_LEVEL,
            step: 1,
        }
    }
}

impl DifficultyPolicy {
    /// Compute the next round from an opponent's history.
    ///
    /// Unfinished games are ignored. With no finished games this is round 1
    /// at the baseline; otherwise the most recent finished game decides:
    /// the engine lost → one step harder, the engine won → one step easier,
    /// a draw keeps the level.
    pub fn next_round_stats(&self, history: &[GameSummary]) -> RoundStats {
        let last = history
            .iter()
            .filter(|g| g.result.is_terminal())
            .max_by_key(|g| g.round);

        let Some(last) = last else {
            return RoundStats {
                round: 1,
                difficulty: self.clamp(self.baseline),
            };
        };

        let difficulty = match last.engine_won() {
            Some(false) => last.difficulty.saturating_add(self.step),
            Some(true) => last.difficulty.saturating_sub(self.step),
            None => last.difficulty,
        };

        let previous_round = history.iter().map(|g| g.round).max().unwrap_or(last.round);

        RoundStats {
            round: previous_round + 1,
            difficulty: self.clamp(difficulty),
        }
    }

    fn clamp(&self, level: u8) -> u8 {
        level.clamp(self.min, self.max.max(self.min))
    }
}

#[cfg(test)]
#[path = "difficulty_tests.rs"]
mod difficulty_tests;
