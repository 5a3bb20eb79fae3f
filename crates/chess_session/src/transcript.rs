//! PGN-like transcript: a tag-pair header block followed by coordinate
//! movetext and the result marker.
//!
//! ```text
//! [Event "Casual Game"]
//! [Site "?"]
//! [Date "2024.03.09"]
//! [Round "1"]
//! [White "chessbot"]
//! [Black "#test"]
//! [Result "*"]
//! [Opponent "test"]
//! [EngineColor "White"]
//! [Difficulty "0"]
//!
//! 1. e2e4 e7e5 2. g1f3 *
//! ```
//!
//! Only the tags this crate writes are understood; the movetext never
//! carries comments or variations.

use chrono::NaiveDate;
use cozy_chess::Color;
use std::fmt::Write as _;
use thiserror::Error;

use crate::game::{color_name, GameResult, Session, Sides, Termination};
use crate::opponent::Opponent;

const DATE_FORMAT: &str = "%Y.%m.%d";
const LINE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("missing [{0}] tag")]
    MissingTag(&'static str),
    #[error("malformed tag line: {0}")]
    BadTag(String),
    #[error("invalid [{tag}] value `{value}`")]
    InvalidValue { tag: &'static str, value: String },
    #[error("move {ply} `{token}` is not legal")]
    IllegalMove { ply: usize, token: String },
    #[error("result {recorded} does not match the board ({actual})")]
    ResultMismatch { recorded: String, actual: String },
}

/// Render a session as a transcript string.
pub fn serialize(session: &Session) -> String {
    let mut out = String::new();
    let tags: [(&str, String); 10] = [
        ("Event", "Casual Game".to_string()),
        ("Site", "?".to_string()),
        ("Date", session.date.format(DATE_FORMAT).to_string()),
        ("Round", session.round.to_string()),
        ("White", session.sides.white.clone()),
        ("Black", session.sides.black.clone()),
        ("Result", session.result.marker().to_string()),
        ("Opponent", session.opponent.to_string()),
        ("EngineColor", color_name(session.sides.engine).to_string()),
        ("Difficulty", session.difficulty.to_string()),
    ];
    for (name, value) in &tags {
        let _ = writeln!(out, "[{} \"{}\"]", name, escape(value));
    }
    if let Some(termination) = session.termination {
        let _ = writeln!(out, "[Termination \"{}\"]", termination.as_str());
    }
    out.push('\n');

    let mut line = String::new();
    for (ply, token) in session.moves().iter().enumerate() {
        if ply % 2 == 0 {
            push_token(&mut out, &mut line, &format!("{}.", ply / 2 + 1));
        }
        push_token(&mut out, &mut line, token);
    }
    push_token(&mut out, &mut line, session.result.marker());
    out.push_str(&line);
    out.push('\n');
    out
}

/// Rebuild a session from a transcript. The returned session has no store id.
pub fn parse(text: &str) -> Result<Session, TranscriptError> {
    let mut tags = Tags::default();
    let mut movetext = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            let (name, value) = parse_tag(line)?;
            tags.insert(name, value);
        } else {
            movetext.extend(line.split_whitespace().map(str::to_string));
        }
    }

    let result_tag = tags.require("Result")?;
    let recorded = GameResult::from_marker(&result_tag).ok_or(TranscriptError::InvalidValue {
        tag: "Result",
        value: result_tag.clone(),
    })?;

    let mut moves = Vec::new();
    for token in movetext {
        if is_move_number(&token) {
            continue;
        }
        if let Some(marker) = GameResult::from_marker(&token) {
            if marker != recorded {
                return Err(TranscriptError::ResultMismatch {
                    recorded: result_tag,
                    actual: token,
                });
            }
            break;
        }
        moves.push(token);
    }

    let opponent_tag = tags.require("Opponent")?;
    let opponent = Opponent::parse(&opponent_tag).ok_or(TranscriptError::InvalidValue {
        tag: "Opponent",
        value: opponent_tag,
    })?;
    let round: u32 = tags.parse_number("Round")?;
    let difficulty: u8 = tags.parse_number("Difficulty")?;

    let date_tag = tags.require("Date")?;
    let date = NaiveDate::parse_from_str(&date_tag, DATE_FORMAT)
        .map_err(|_| TranscriptError::InvalidValue {
            tag: "Date",
            value: date_tag.clone(),
        })?;

    let engine_tag = tags.require("EngineColor")?;
    let engine = match engine_tag.as_str() {
        "White" => Color::White,
        "Black" => Color::Black,
        _ => {
            return Err(TranscriptError::InvalidValue {
                tag: "EngineColor",
                value: engine_tag.clone(),
            })
        }
    };
    let sides = Sides {
        engine,
        white: tags.require("White")?,
        black: tags.require("Black")?,
    };

    let termination = match tags.get("Termination") {
        Some(value) => Some(Termination::parse(value).ok_or_else(|| {
            TranscriptError::InvalidValue {
                tag: "Termination",
                value: value.to_string(),
            }
        })?),
        None => None,
    };

    let mut session = Session::replay(opponent, round, difficulty, sides, date, &moves)
        .map_err(|e| TranscriptError::IllegalMove {
            ply: e.ply,
            token: e.token,
        })?;

    if session.is_active() {
        session.set_outcome(recorded, termination);
    } else if session.result != recorded {
        return Err(TranscriptError::ResultMismatch {
            recorded: recorded.marker().to_string(),
            actual: session.result.marker().to_string(),
        });
    }

    Ok(session)
}

/// Append a movetext token, wrapping lines at `LINE_WIDTH`.
fn push_token(out: &mut String, line: &mut String, token: &str) {
    if !line.is_empty() && line.len() + 1 + token.len() > LINE_WIDTH {
        out.push_str(line);
        out.push('\n');
        line.clear();
    }
    if !line.is_empty() {
        line.push(' ');
    }
    line.push_str(token);
}

#[derive(Default)]
struct Tags(Vec<(String, String)>);

impl Tags {
    fn insert(&mut self, name: String, value: String) {
        self.0.retain(|(n, _)| *n != name);
        self.0.push((name, value));
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn require(&self, name: &'static str) -> Result<String, TranscriptError> {
        self.get(name)
            .map(str::to_string)
            .ok_or(TranscriptError::MissingTag(name))
    }

    fn parse_number<T: std::str::FromStr>(&self, name: &'static str) -> Result<T, TranscriptError> {
        let value = self.require(name)?;
        value
            .parse()
            .map_err(|_| TranscriptError::InvalidValue { tag: name, value })
    }
}

fn parse_tag(line: &str) -> Result<(String, String), TranscriptError> {
    let bad = || TranscriptError::BadTag(line.to_string());
    let inner = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or_else(bad)?;
    let (name, rest) = inner.split_once(' ').ok_or_else(bad)?;
    let quoted = rest
        .trim()
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(bad)?;
    if name.is_empty() {
        return Err(bad());
    }
    Ok((name.to_string(), unescape(quoted)))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// `12.` or `12...`
fn is_move_number(token: &str) -> bool {
    let digits = token.trim_end_matches('.');
    digits.len() < token.len() && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod transcript_tests;
