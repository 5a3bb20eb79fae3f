use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::{Engine, EngineError, EngineLauncher};
use crate::config::EngineConfig;
use crate::uci::looks_like_move;

/// How long a process gets to honour `quit` before it is killed.
const QUIT_GRACE: Duration = Duration::from_millis(500);

/// Spawns a UCI executable per launch.
#[derive(Debug, Clone)]
pub struct UciLauncher {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Slack on top of the think time before `bestmove` is given up on
    pub grace: Duration,
    /// Bound on each handshake reply (`uciok`, `readyok`)
    pub handshake_timeout: Duration,
    /// Option receiving the difficulty level; `None` leaves the engine at
    /// its default strength
    pub skill_option: Option<String>,
}

impl UciLauncher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            grace: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            skill_option: Some("Skill Level".to_string()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            path: config.path.clone(),
            args: config.args.clone(),
            grace: Duration::from_millis(config.grace_ms),
            handshake_timeout: Duration::from_millis(config.handshake_timeout_ms),
            skill_option: Some(config.skill_option.clone()).filter(|s| !s.is_empty()),
        }
    }

    fn spawn(&self) -> Result<UciEngine, EngineError> {
        let spawn_err = |source| EngineError::Spawn {
            path: self.path.clone(),
            source,
        };
        let mut child = Command::new(&self.path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_err)?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::Protocol("engine pipes unavailable".to_string()));
        };

        // The reader owns stdout and ends on EOF; it is never joined so a
        // wedged engine cannot block teardown.
        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(UciEngine {
            child,
            stdin: BufWriter::new(stdin),
            lines,
            grace: self.grace,
        })
    }
}

impl EngineLauncher for UciLauncher {
    fn launch(&self, difficulty: u8) -> Result<Box<dyn Engine>, EngineError> {
        let mut engine = self.spawn()?;

        engine.send("uci")?;
        engine.wait_for("uciok", self.handshake_timeout)?;
        if let Some(option) = &self.skill_option {
            engine.send(&format!("setoption name {option} value {difficulty}"))?;
        }
        engine.send("ucinewgame")?;
        engine.send("isready")?;
        engine.wait_for("readyok", self.handshake_timeout)?;

        debug!(path = %self.path.display(), difficulty, "engine ready");
        Ok(Box::new(engine))
    }
}

/// A running UCI process. Dropping it shuts the process down.
pub struct UciEngine {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
    grace: Duration,
}

impl UciEngine {
    fn send(&mut self, command: &str) -> Result<(), EngineError> {
        trace!(command, "engine <");
        writeln!(self.stdin, "{command}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| EngineError::Protocol(format!("cannot write to engine: {e}")))
    }

    /// Read lines until one starts with `keyword`, within `timeout`.
    fn wait_for(
        &mut self,
        keyword: &'static str,
        timeout: Duration,
    ) -> Result<String, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    trace!(line = line.as_str(), "engine >");
                    if line.split_whitespace().next() == Some(keyword) {
                        return Ok(line);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(EngineError::Timeout {
                        expected: keyword,
                        waited: timeout,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Protocol(format!(
                        "engine exited while waiting for `{keyword}`"
                    )))
                }
            }
        }
    }
}

impl Engine for UciEngine {
    fn set_position(&mut self, moves: &[String]) -> Result<(), EngineError> {
        if moves.is_empty() {
            self.send("position startpos")
        } else {
            self.send(&format!("position startpos moves {}", moves.join(" ")))
        }
    }

    fn best_move(&mut self, think_time: Duration) -> Result<String, EngineError> {
        self.send(&format!("go movetime {}", think_time.as_millis()))?;
        let line = self.wait_for("bestmove", think_time + self.grace)?;
        parse_bestmove(&line)
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = self.send("quit");
        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }
        if let Err(e) = self.child.kill() {
            warn!(error = %e, "failed to kill engine");
        }
        let _ = self.child.wait();
    }
}

/// Extract the move from a `bestmove <move> [ponder <move>]` line.
fn parse_bestmove(line: &str) -> Result<String, EngineError> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return Err(EngineError::Protocol(format!("unexpected line `{line}`")));
    }
    match parts.next() {
        None => Err(EngineError::Protocol("empty bestmove".to_string())),
        Some("(none)") | Some("0000") => {
            Err(EngineError::Protocol("engine reported no move".to_string()))
        }
        Some(mv) if looks_like_move(mv) => Ok(mv.to_string()),
        Some(mv) => Err(EngineError::Protocol(format!("malformed bestmove `{mv}`"))),
    }
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod process_tests;
