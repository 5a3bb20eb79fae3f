//! Game state of one session: board, move record, sides and result.

use chrono::NaiveDate;
use cozy_chess::{Board, Color, Move, Piece, Rank, Square};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::difficulty::GameSummary;
use crate::opponent::Opponent;
use crate::store::GameId;
use crate::uci::{legal_move_list, legal_moves, move_to_uci, parse_uci_move};

/// Game result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    InProgress,
    WhiteWins,
    BlackWins,
    Draw,
}

impl GameResult {
    pub fn won_by(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWins => Some(Color::White),
            GameResult::BlackWins => Some(Color::Black),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self != GameResult::InProgress
    }

    /// PGN result marker.
    pub fn marker(self) -> &'static str {
        match self {
            GameResult::InProgress => "*",
            GameResult::WhiteWins => "1-0",
            GameResult::BlackWins => "0-1",
            GameResult::Draw => "1/2-1/2",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "*" => Some(GameResult::InProgress),
            "1-0" => Some(GameResult::WhiteWins),
            "0-1" => Some(GameResult::BlackWins),
            "1/2-1/2" => Some(GameResult::Draw),
            _ => None,
        }
    }
}

/// Why a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
    InsufficientMaterial,
    Resignation,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::FiftyMoveRule => "fifty-move rule",
            Termination::ThreefoldRepetition => "threefold repetition",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::Resignation => "resignation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            Termination::Checkmate,
            Termination::Stalemate,
            Termination::FiftyMoveRule,
            Termination::ThreefoldRepetition,
            Termination::InsufficientMaterial,
            Termination::Resignation,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session stands in the move cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    AwaitingHumanMove,
    AwaitingEngineMove,
    Terminal,
}

/// Who plays which colour. Fixed when the session is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sides {
    /// Colour played by the engine; the opponent has the other one
    pub engine: Color,
    /// Display name of the White player
    pub white: String,
    /// Display name of the Black player
    pub black: String,
}

impl Sides {
    pub fn new(engine: Color, engine_name: &str, opponent_label: &str) -> Self {
        let (white, black) = match engine {
            Color::White => (engine_name, opponent_label),
            Color::Black => (opponent_label, engine_name),
        };
        Self {
            engine,
            white: white.to_string(),
            black: black.to_string(),
        }
    }

    pub fn human(&self) -> Color {
        !self.engine
    }

    pub fn name(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}

/// Replaying a move list failed at `ply` (0-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayError {
    pub ply: usize,
    pub token: String,
}

/// One game's full state.
///
/// The board and the repetition history are derived from the move list and
/// are rebuilt on replay; everything else is what the transcript stores.
#[derive(Debug, Clone)]
pub struct Session {
    /// Store-assigned identity, `None` until the first save
    pub id: Option<GameId>,
    pub opponent: Opponent,
    pub round: u32,
    pub difficulty: u8,
    pub date: NaiveDate,
    pub sides: Sides,
    pub result: GameResult,
    pub termination: Option<Termination>,
    moves: Vec<String>,
    board: Board,
    /// Repetition keys after every ply, starting position included
    positions: Vec<u64>,
}

impl Session {
    pub fn new(
        opponent: Opponent,
        round: u32,
        difficulty: u8,
        sides: Sides,
        date: NaiveDate,
    ) -> Self {
        let board = Board::default();
        let positions = vec![repetition_key(&board)];
        Self {
            id: None,
            opponent,
            round,
            difficulty,
            date,
            sides,
            result: GameResult::InProgress,
            termination: None,
            moves: Vec::new(),
            board,
            positions,
        }
    }

    /// Rebuild a session by replaying `moves` from the starting position.
    pub fn replay(
        opponent: Opponent,
        round: u32,
        difficulty: u8,
        sides: Sides,
        date: NaiveDate,
        moves: &[String],
    ) -> Result<Self, ReplayError> {
        let mut session = Self::new(opponent, round, difficulty, sides, date);
        for (ply, token) in moves.iter().enumerate() {
            let mv = session
                .resolve(token)
                .filter(|_| session.is_active())
                .ok_or_else(|| ReplayError {
                    ply,
                    token: token.clone(),
                })?;
            session.apply(mv);
        }
        Ok(session)
    }

    pub fn moves(&self) -> &[String] {
        &self.moves
    }

    pub fn last_move(&self) -> Option<&str> {
        self.moves.last().map(String::as_str)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn is_active(&self) -> bool {
        self.result == GameResult::InProgress
    }

    pub fn state(&self) -> SessionState {
        if !self.is_active() {
            SessionState::Terminal
        } else if self.side_to_move() == self.sides.engine {
            SessionState::AwaitingEngineMove
        } else {
            SessionState::AwaitingHumanMove
        }
    }

    /// Resolve a coordinate token against the current board.
    pub fn resolve(&self, token: &str) -> Option<Move> {
        parse_uci_move(&self.board, token)
    }

    /// Sorted coordinate list of the moves available right now.
    pub fn legal_moves(&self) -> Vec<String> {
        legal_move_list(&self.board)
    }

    /// Play a legal move and settle the result if it ends the game.
    /// Returns the move in coordinate notation.
    pub fn apply(&mut self, mv: Move) -> String {
        let token = move_to_uci(&self.board, mv);
        self.board.play(mv);
        self.moves.push(token.clone());
        self.positions.push(repetition_key(&self.board));

        if let Some((result, termination)) = self.detect_end() {
            self.result = result;
            self.termination = Some(termination);
        }
        token
    }

    /// The player of `color` concedes.
    pub fn resign(&mut self, color: Color) {
        self.result = GameResult::won_by(!color);
        self.termination = Some(Termination::Resignation);
    }

    /// Overwrite the outcome, e.g. with the result recorded in a transcript.
    pub(crate) fn set_outcome(&mut self, result: GameResult, termination: Option<Termination>) {
        self.result = result;
        self.termination = termination;
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            round: self.round,
            difficulty: self.difficulty,
            result: self.result,
            engine: self.sides.engine,
        }
    }

    fn repetitions(&self) -> usize {
        let current = repetition_key(&self.board);
        self.positions.iter().filter(|&&h| h == current).count()
    }

    fn detect_end(&self) -> Option<(GameResult, Termination)> {
        if legal_moves(&self.board).is_empty() {
            if !self.board.checkers().is_empty() {
                let winner = !self.board.side_to_move();
                return Some((GameResult::won_by(winner), Termination::Checkmate));
            }
            return Some((GameResult::Draw, Termination::Stalemate));
        }

        if self.board.halfmove_clock() >= 100 {
            return Some((GameResult::Draw, Termination::FiftyMoveRule));
        }

        if self.repetitions() >= 3 {
            return Some((GameResult::Draw, Termination::ThreefoldRepetition));
        }

        if insufficient_material(&self.board) {
            return Some((GameResult::Draw, Termination::InsufficientMaterial));
        }

        None
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.opponent == other.opponent
            && self.round == other.round
            && self.difficulty == other.difficulty
            && self.date == other.date
            && self.sides == other.sides
            && self.result == other.result
            && self.termination == other.termination
            && self.moves == other.moves
    }
}

/// Position identity for repetition counting. The en-passant file only
/// counts while an en-passant capture is actually legal.
fn repetition_key(board: &Board) -> u64 {
    let capturable = board.en_passant().is_some_and(|file| {
        let target = Square::new(file, Rank::Sixth.relative_to(board.side_to_move()));
        legal_moves(board)
            .iter()
            .any(|mv| mv.to == target && board.piece_on(mv.from) == Some(Piece::Pawn))
    });
    if capturable {
        board.hash()
    } else {
        board.hash_without_ep()
    }
}

/// Bare kings, or kings plus a single minor piece.
pub fn insufficient_material(board: &Board) -> bool {
    let occupied = board.occupied().len();
    let minors = (board.pieces(Piece::Knight) | board.pieces(Piece::Bishop)).len();
    occupied == 2 || (occupied == 3 && minors == 1)
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
