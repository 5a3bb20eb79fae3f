//! TOML configuration with defaults for every field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::difficulty::DifficultyPolicy;
use crate::store::{GameStore, JsonFileStore, MemoryStore, StoreError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// What `newgame` does when the opponent already has a game in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewGamePolicy {
    /// Refuse and point at the running game
    #[default]
    Reject,
    /// Hand back the running game untouched
    Resume,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChessConfig {
    /// Engine's display name in transcripts
    pub nick: String,
    /// Board link sent on `board`; `{opponent}` is substituted
    pub board_url: String,
    pub on_active_newgame: NewGamePolicy,
    pub engine: EngineConfig,
    pub difficulty: DifficultyPolicy,
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl Default for ChessConfig {
    fn default() -> Self {
        Self {
            nick: "chessbot".to_string(),
            board_url: "http://localhost:8080/chess/{opponent}/".to_string(),
            on_active_newgame: NewGamePolicy::default(),
            engine: EngineConfig::default(),
            difficulty: DifficultyPolicy::default(),
            store: StoreConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub args: Vec<String>,
    pub think_time_ms: u64,
    pub grace_ms: u64,
    pub handshake_timeout_ms: u64,
    /// UCI option set to the difficulty; empty disables it
    pub skill_option: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/usr/games/stockfish"),
            args: Vec::new(),
            think_time_ms: 2000,
            grace_ms: 5000,
            handshake_timeout_ms: 5000,
            skill_option: "Skill Level".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_time_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Memory,
    #[default]
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Directory of the JSON store
    pub dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            dir: PathBuf::from("chess-games"),
        }
    }
}

impl StoreConfig {
    pub fn open(&self) -> Result<Arc<dyn GameStore>, StoreError> {
        Ok(match self.kind {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Json => Arc::new(JsonFileStore::open(&self.dir)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ChessConfig {
    /// Load `path` (or the defaults when `None`), apply `CHESS_*`
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply `CHESS_ENGINE`, `CHESS_THINK_TIME` (milliseconds) and
    /// `CHESS_NICK` as returned by `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = lookup("CHESS_ENGINE") {
            self.engine.path = PathBuf::from(path);
        }
        if let Some(ms) = lookup("CHESS_THINK_TIME") {
            self.engine.think_time_ms = ms.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "CHESS_THINK_TIME `{ms}` is not a number of milliseconds"
                ))
            })?;
        }
        if let Some(nick) = lookup("CHESS_NICK") {
            self.nick = nick;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.difficulty;
        if d.min > d.max {
            return Err(ConfigError::Invalid(format!(
                "difficulty.min {} exceeds difficulty.max {}",
                d.min, d.max
            )));
        }
        if !(d.min..=d.max).contains(&d.baseline) {
            return Err(ConfigError::Invalid(format!(
                "difficulty.baseline {} outside {}..={}",
                d.baseline, d.min, d.max
            )));
        }
        if d.step == 0 {
            return Err(ConfigError::Invalid("difficulty.step must be positive".to_string()));
        }
        if self.engine.think_time_ms == 0 {
            return Err(ConfigError::Invalid("engine.think_time_ms must be positive".to_string()));
        }
        if self.nick.trim().is_empty() {
            return Err(ConfigError::Invalid("nick must not be empty".to_string()));
        }
        // the nick is written into transcript tag lines
        if self.nick.chars().any(char::is_control) {
            return Err(ConfigError::Invalid(format!(
                "nick {:?} contains control characters",
                self.nick
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
