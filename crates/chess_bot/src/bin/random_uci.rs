//! Minimal UCI engine playing uniformly random legal moves.
//!
//! Accepts `Skill Level` but ignores it. Useful without Stockfish installed.

use chess_session::uci::{legal_moves, move_to_uci, parse_uci_move};
use cozy_chess::Board;
use rand::seq::SliceRandom;
use std::io::{self, BufRead, Write};

/// Apply `position [startpos | fen <fen>] [moves ...]`.
fn set_position(board: &mut Board, parts: &[&str]) {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let setup = &parts[..moves_at.unwrap_or(parts.len())];

    let mut next = match setup.first() {
        Some(&"fen") => match setup[1..].join(" ").parse::<Board>() {
            Ok(b) => b,
            Err(_) => return,
        },
        _ => Board::default(),
    };

    if let Some(idx) = moves_at {
        for token in &parts[idx + 1..] {
            match parse_uci_move(&next, token) {
                Some(mv) => next.play(mv),
                None => break,
            }
        }
    }
    *board = next;
}

fn main() {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut rng = rand::thread_rng();
    let mut board = Board::default();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            continue;
        };

        match command {
            "uci" => {
                writeln!(stdout, "id name random_uci {}", env!("CARGO_PKG_VERSION")).ok();
                writeln!(stdout, "id author chessbot").ok();
                writeln!(stdout, "option name Skill Level type spin default 20 min 0 max 20").ok();
                writeln!(stdout, "uciok").ok();
            }
            "isready" => {
                writeln!(stdout, "readyok").ok();
            }
            "ucinewgame" => board = Board::default(),
            "position" => set_position(&mut board, &parts[1..]),
            "go" => {
                let moves = legal_moves(&board);
                match moves.choose(&mut rng) {
                    Some(&mv) => writeln!(stdout, "bestmove {}", move_to_uci(&board, mv)).ok(),
                    None => writeln!(stdout, "bestmove 0000").ok(),
                };
            }
            "quit" => break,
            _ => {}
        }
        stdout.flush().ok();
    }
}
