use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefixes IRC puts in front of channel names and nick modes.
const MARKERS: &[char] = &['#', '&', '+', '!', '@', '%', '~'];

/// Normalized identity of the human side: a channel or a nick.
///
/// `#Chess`, `chess` and `@chess` all name the same opponent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Opponent(String);

impl Opponent {
    /// Normalize a raw channel or nick. Returns `None` when nothing but
    /// markers and whitespace is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let name = raw.trim().trim_start_matches(MARKERS).trim();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "opponent_tests.rs"]
mod opponent_tests;
