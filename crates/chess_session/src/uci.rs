//! Coordinate move notation (`e2e4`, `e7e8q`) on top of cozy-chess boards.
//!
//! cozy-chess encodes castling as "king takes own rook" (`e1h1`); chat users
//! and UCI engines write the king's two-square step (`e1g1`). Everything that
//! leaves or enters this crate as text goes through these helpers.

use cozy_chess::{Board, File, Move, Piece, Square};

/// All legal moves in the position.
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut out = Vec::with_capacity(64);
    board.generate_moves(|moves| {
        out.extend(moves);
        false
    });
    out
}

/// Legal moves as sorted coordinate strings, for user feedback.
pub fn legal_move_list(board: &Board) -> Vec<String> {
    let mut list: Vec<String> = legal_moves(board)
        .into_iter()
        .map(|mv| move_to_uci(board, mv))
        .collect();
    list.sort();
    list
}

/// Format a move of `board` in standard coordinate notation.
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    let mut to = mv.to;
    let castles = board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move());
    if castles {
        let file = if (mv.to.file() as usize) > (mv.from.file() as usize) {
            File::G
        } else {
            File::C
        };
        to = Square::new(file, mv.from.rank());
    }

    let mut s = format!("{}{}", mv.from, to);
    if let Some(p) = mv.promotion {
        let ch = match p {
            Piece::Queen => 'q',
            Piece::Rook => 'r',
            Piece::Bishop => 'b',
            Piece::Knight => 'n',
            _ => 'q',
        };
        s.push(ch);
    }
    s
}

/// Resolve a coordinate token to a legal move of `board`.
///
/// The token is matched against the legal move list so castling and
/// promotion come out in the board's own encoding. A promotion without a
/// piece suffix promotes to a queen.
pub fn parse_uci_move(board: &Board, txt: &str) -> Option<Move> {
    let txt = txt.trim().to_ascii_lowercase();
    if !(4..=5).contains(&txt.len()) {
        return None;
    }

    let legals = legal_moves(board);
    let find = |wanted: &str| {
        legals
            .iter()
            .copied()
            .find(|&mv| move_to_uci(board, mv) == wanted)
    };

    find(&txt).or_else(|| {
        if txt.len() == 4 {
            find(&format!("{txt}q"))
        } else {
            None
        }
    })
}

/// Cheap shape check for tokens read off an engine pipe.
pub fn looks_like_move(txt: &str) -> bool {
    let b = txt.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b"qrbn".contains(&b[4]),
        _ => false,
    }
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
