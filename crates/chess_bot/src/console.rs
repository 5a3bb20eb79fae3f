use chess_session::{dispatch, BoardSnapshot, SessionEngine};
use std::io::{self, BufRead, Write};

/// Line-oriented play against `opponent`: each input line is one chat
/// command (`newgame`, `move e2e4`, ...). Replies are printed, followed by
/// the board whenever a game exists. `quit` or end of input stops.
pub fn run(
    engine: &SessionEngine,
    opponent: &str,
    board_url: &str,
    input: impl BufRead,
    mut out: impl Write,
) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let args: Vec<&str> = line.split_whitespace().collect();
        match args.first().copied() {
            None => continue,
            Some("quit") | Some("exit") => break,
            Some(_) => {}
        }

        let reply = dispatch(engine, opponent, &args, board_url);
        for text in &reply.lines {
            writeln!(out, "{text}")?;
        }
        if let Ok(session) = engine.board(opponent) {
            write!(out, "{}", BoardSnapshot::from_session(&session).to_ascii())?;
        }
        out.flush()?;
    }
    Ok(())
}
