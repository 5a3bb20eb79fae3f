//! Read-only view of a session for board renderers.

use cozy_chess::{Color, File, Piece, Rank, Square};
use serde::Serialize;

use crate::game::{color_name, Session, SessionState};
use crate::opponent::Opponent;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub opponent: Opponent,
    pub round: u32,
    pub difficulty: u8,
    pub fen: String,
    pub side_to_move: &'static str,
    /// Ranks 8 down to 1, files a to h. FEN letters, uppercase for White.
    pub board: Vec<Vec<Option<char>>>,
    pub last_move: Option<String>,
    pub moves: Vec<String>,
    pub result: &'static str,
    pub state: SessionState,
    pub engine_color: &'static str,
    pub white: String,
    pub black: String,
    /// Draw the board from Black's side
    pub flipped: bool,
}

impl BoardSnapshot {
    pub fn from_session(session: &Session) -> Self {
        let board = session.board();
        let grid = Rank::ALL
            .iter()
            .rev()
            .map(|&rank| {
                File::ALL
                    .iter()
                    .map(|&file| piece_char(session, Square::new(file, rank)))
                    .collect()
            })
            .collect();

        Self {
            opponent: session.opponent.clone(),
            round: session.round,
            difficulty: session.difficulty,
            fen: board.to_string(),
            side_to_move: color_name(session.side_to_move()),
            board: grid,
            last_move: session.last_move().map(str::to_string),
            moves: session.moves().to_vec(),
            result: session.result.marker(),
            state: session.state(),
            engine_color: color_name(session.sides.engine),
            white: session.sides.white.clone(),
            black: session.sides.black.clone(),
            flipped: session.side_to_move() == Color::Black,
        }
    }

    /// Plain-text diagram, oriented by `flipped`.
    pub fn to_ascii(&self) -> String {
        let mut rows: Vec<(usize, Vec<char>)> = self
            .board
            .iter()
            .enumerate()
            .map(|(i, row)| (8 - i, row.iter().map(|c| c.unwrap_or('.')).collect()))
            .collect();
        let mut files: Vec<char> = ('a'..='h').collect();
        if self.flipped {
            rows.reverse();
            for (_, row) in rows.iter_mut() {
                row.reverse();
            }
            files.reverse();
        }

        let mut out = String::new();
        for (rank, row) in rows {
            let squares: Vec<String> = row.iter().map(char::to_string).collect();
            out.push_str(&format!("{rank} {}\n", squares.join(" ")));
        }
        let files: Vec<String> = files.iter().map(char::to_string).collect();
        out.push_str(&format!("  {}\n", files.join(" ")));
        out
    }
}

fn piece_char(session: &Session, square: Square) -> Option<char> {
    let board = session.board();
    let piece = board.piece_on(square)?;
    let ch = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    Some(match board.color_on(square)? {
        Color::White => ch.to_ascii_uppercase(),
        Color::Black => ch,
    })
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod snapshot_tests;
