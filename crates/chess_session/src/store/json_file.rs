//! One JSON file per opponent inside a directory.
//!
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-save leaves the previous file intact.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{active_session, history, upsert, GameId, GameStore, StoreError, StoredGame};
use crate::game::Session;
use crate::opponent::Opponent;

#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File holding `opponent`'s games. Characters outside `[a-z0-9_-]` are
    /// hex-escaped so any nick maps to a safe, unique file name.
    pub fn path_for(&self, opponent: &Opponent) -> PathBuf {
        let mut name = String::new();
        for b in opponent.as_str().bytes() {
            if b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_' {
                name.push(b as char);
            } else {
                name.push_str(&format!("%{b:02x}"));
            }
        }
        self.dir.join(format!("{name}.json"))
    }

    fn load(&self, opponent: &Opponent) -> Result<Vec<StoredGame>, StoreError> {
        let path = self.path_for(opponent);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents).map_err(|source| StoreError::Format { path, source })
    }

    fn write(&self, opponent: &Opponent, records: &[StoredGame]) -> Result<(), StoreError> {
        let path = self.path_for(opponent);
        let json = serde_json::to_string_pretty(records).map_err(|source| StoreError::Format {
            path: path.clone(),
            source,
        })?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io {
            path: tmp.clone(),
            source,
        };
        let mut file = File::create(&tmp).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }
}

impl GameStore for JsonFileStore {
    fn find_active(&self, opponent: &Opponent) -> Result<Option<Session>, StoreError> {
        active_session(&self.load(opponent)?)
    }

    fn find_history(&self, opponent: &Opponent) -> Result<Vec<Session>, StoreError> {
        history(&self.load(opponent)?)
    }

    fn save(&self, session: &Session) -> Result<GameId, StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load(&session.opponent)?;
        let id = upsert(&mut records, session)?;
        self.write(&session.opponent, &records)?;
        Ok(id)
    }
}
