//! Chat command front: turns `newgame`, `move e2e4`, ... into replies.
//!
//! Every failure ends up as a single reply line. Engine and store failures
//! are logged with the opponent and operation and reported generically.

use serde::Serialize;
use tracing::{debug, error};

use crate::error::SessionError;
use crate::game::{color_name, GameResult, Session, SessionState};
use crate::opponent::Opponent;
use crate::session::SessionEngine;

pub const USAGE: &str =
    "commands: newgame, move <from><to>[promotion], board, resign, resume, help";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewGame,
    /// Move with its token, if one was given
    Move(Option<String>),
    Board,
    Resign,
    Resume,
    Help,
}

impl Command {
    /// Parse the words after the bot's command prefix. `Err` carries the
    /// unrecognized subcommand.
    pub fn parse(args: &[&str]) -> Result<Self, String> {
        let Some(first) = args.first() else {
            return Ok(Command::Help);
        };
        match first.to_ascii_lowercase().as_str() {
            "newgame" => Ok(Command::NewGame),
            "move" => Ok(Command::Move(args.get(1).map(|t| t.to_string()))),
            "board" => Ok(Command::Board),
            "resign" => Ok(Command::Resign),
            "resume" => Ok(Command::Resume),
            "help" => Ok(Command::Help),
            other => Err(other.to_string()),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Command::NewGame => "newgame",
            Command::Move(_) => "move",
            Command::Board => "board",
            Command::Resign => "resign",
            Command::Resume => "resume",
            Command::Help => "help",
        }
    }
}

/// Lines to send back to the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub lines: Vec<String>,
}

impl Reply {
    fn line(text: impl Into<String>) -> Self {
        Self {
            lines: vec![text.into()],
        }
    }

    fn push(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }
}

/// Run one chat command for `opponent`.
///
/// `board_url` is returned for `board` with `{opponent}` replaced by the
/// normalized opponent name.
pub fn dispatch(
    engine: &SessionEngine,
    opponent: &str,
    args: &[&str],
    board_url: &str,
) -> Reply {
    let command = match Command::parse(args) {
        Ok(command) => command,
        Err(unknown) => return Reply::line(format!("unknown command `{unknown}`. {USAGE}")),
    };

    let result = match &command {
        Command::Help => Ok(Reply::line(USAGE)),
        Command::Board => board_link(opponent, board_url),
        Command::Move(None) => Ok(Reply::line("usage: move e2e4")),
        Command::Move(Some(token)) => engine.play_move(opponent, token).map(|outcome| {
            let mut reply = Reply::default();
            if outcome.resumed {
                reply.push("finishing my previous move first");
            }
            if let Some(mv) = outcome.engine_move {
                reply.push(format!("my move: {mv}"));
            }
            reply.lines.extend(status_lines(&outcome.session));
            reply
        }),
        Command::NewGame => engine.new_game(opponent).map(|started| {
            let session = &started.session;
            let mut reply = Reply::default();
            if started.resumed {
                reply.push(format!("round {} is still going", session.round));
            } else {
                reply.push(format!(
                    "round {}: I chose {}",
                    session.round,
                    color_name(session.sides.engine).to_ascii_lowercase()
                ));
            }
            if let Some(mv) = started.engine_move {
                reply.push(format!("my move: {mv}"));
            }
            reply.lines.extend(status_lines(session));
            reply
        }),
        Command::Resign => engine
            .resign(opponent)
            .map(|session| Reply { lines: status_lines(&session) }),
        Command::Resume => engine.resume(opponent).map(|outcome| {
            let mut reply = Reply::default();
            if let Some(mv) = outcome.engine_move {
                reply.push(format!("my move: {mv}"));
            }
            reply.lines.extend(status_lines(&outcome.session));
            reply
        }),
    };

    result.unwrap_or_else(|e| {
        if e.is_internal() {
            error!(opponent, op = command.name(), error = %e, "command failed");
        } else {
            debug!(opponent, op = command.name(), error = %e, "command refused");
        }
        let mut reply = Reply::line(e.user_message());
        // a move or resume leaves a stored checkpoint that resume picks up
        if matches!(e, SessionError::Engine(_))
            && matches!(command, Command::Move(_) | Command::Resume)
        {
            reply.push("say resume to retry my move");
        }
        reply
    })
}

fn board_link(opponent: &str, board_url: &str) -> Result<Reply, SessionError> {
    let opponent = Opponent::parse(opponent)
        .ok_or_else(|| SessionError::InvalidOpponent(opponent.to_string()))?;
    Ok(Reply::line(board_url.replace("{opponent}", opponent.as_str())))
}

/// Whose turn it is, or how the game ended.
pub fn status_lines(session: &Session) -> Vec<String> {
    match session.state() {
        SessionState::Terminal => {
            let outcome = match session.result {
                GameResult::WhiteWins => "White wins",
                GameResult::BlackWins => "Black wins",
                _ => "draw",
            };
            let reason = session
                .termination
                .map(|t| format!("{t}, "))
                .unwrap_or_default();
            vec![format!("game over: {reason}{outcome} ({})", session.result.marker())]
        }
        _ => vec![format!("{} to move", color_name(session.side_to_move()))],
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod command_tests;
