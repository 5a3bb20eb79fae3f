use super::*;

fn new_session(engine: Color) -> Session {
    let sides = Sides::new(engine, "chessbot", "#test");
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    Session::new(Opponent::parse("#test").unwrap(), 1, 0, sides, date)
}

fn play_all(session: &mut Session, tokens: &[&str]) {
    for token in tokens {
        let mv = session
            .resolve(token)
            .unwrap_or_else(|| panic!("{token} should be legal"));
        session.apply(mv);
    }
}

#[test]
fn test_sides_assignment() {
    let sides = Sides::new(Color::White, "chessbot", "#test");
    assert_eq!(sides.white, "chessbot");
    assert_eq!(sides.black, "#test");
    assert_eq!(sides.human(), Color::Black);
    assert_eq!(sides.name(Color::Black), "#test");
}

#[test]
fn test_state_follows_side_to_move() {
    let mut session = new_session(Color::Black);
    assert_eq!(session.state(), SessionState::AwaitingHumanMove);

    play_all(&mut session, &["e2e4"]);
    assert_eq!(session.state(), SessionState::AwaitingEngineMove);
    assert_eq!(session.last_move(), Some("e2e4"));
    assert_eq!(session.moves().len(), 1);
}

#[test]
fn test_fools_mate_is_checkmate() {
    let mut session = new_session(Color::Black);
    play_all(&mut session, &["f2f3", "e7e5", "g2g4", "d8h4"]);

    assert_eq!(session.result, GameResult::BlackWins);
    assert_eq!(session.termination, Some(Termination::Checkmate));
    assert_eq!(session.state(), SessionState::Terminal);
    assert_eq!(session.summary().result.winner(), Some(Color::Black));
}

#[test]
fn test_ten_move_stalemate() {
    let mut session = new_session(Color::Black);
    play_all(
        &mut session,
        &[
            "e2e3", "a7a5", "d1h5", "a8a6", "h5a5", "h7h5", "h2h4", "a6h6", "a5c7", "f7f6",
            "c7d7", "e8f7", "d7b7", "d8d3", "b7b8", "d3h7", "b8c8", "f7g6", "c8e6",
        ],
    );

    assert_eq!(session.result, GameResult::Draw);
    assert_eq!(session.termination, Some(Termination::Stalemate));
}

#[test]
fn test_threefold_repetition() {
    let mut session = new_session(Color::White);
    play_all(&mut session, &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"]);
    assert!(session.is_active());

    play_all(&mut session, &["f6g8"]);
    assert_eq!(session.result, GameResult::Draw);
    assert_eq!(session.termination, Some(Termination::ThreefoldRepetition));
}

#[test]
fn test_repetition_after_double_push() {
    let mut session = new_session(Color::Black);
    // the position after 1.e4 returns twice; no en-passant capture was ever possible
    play_all(
        &mut session,
        &["e2e4", "g8f6", "g1f3", "f6g8", "f3g1", "g8f6", "g1f3", "f6g8"],
    );
    assert!(session.is_active());

    play_all(&mut session, &["f3g1"]);
    assert_eq!(session.result, GameResult::Draw);
    assert_eq!(session.termination, Some(Termination::ThreefoldRepetition));
}

#[test]
fn test_live_en_passant_breaks_repetition() {
    let mut session = new_session(Color::White);
    play_all(&mut session, &["e2e4", "a7a6", "e4e5", "d7d5"]);
    // e5xd6 is legal right now, so this position differs from its repeats
    play_all(
        &mut session,
        &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"],
    );
    assert!(session.is_active());

    play_all(&mut session, &["g1f3"]);
    assert_eq!(session.termination, Some(Termination::ThreefoldRepetition));
}

#[test]
fn test_fifty_move_rule() {
    let mut session = new_session(Color::White);
    session.board = "8/8/8/4k3/8/8/R7/4K3 w - - 99 80".parse().unwrap();
    session.positions = vec![repetition_key(&session.board)];
    assert!(session.is_active());

    play_all(&mut session, &["a2a3"]);
    assert_eq!(session.result, GameResult::Draw);
    assert_eq!(session.termination, Some(Termination::FiftyMoveRule));
}

#[test]
fn test_resignation() {
    let mut session = new_session(Color::White);
    session.resign(Color::Black);
    assert_eq!(session.result, GameResult::WhiteWins);
    assert_eq!(session.termination, Some(Termination::Resignation));
    assert!(!session.is_active());
}

#[test]
fn test_replay_rebuilds_board() {
    let mut session = new_session(Color::White);
    play_all(&mut session, &["e2e4", "c7c5", "g1f3"]);

    let moves: Vec<String> = session.moves().to_vec();
    let replayed = Session::replay(
        session.opponent.clone(),
        session.round,
        session.difficulty,
        session.sides.clone(),
        session.date,
        &moves,
    )
    .unwrap();

    assert_eq!(replayed, session);
    assert_eq!(replayed.board().hash(), session.board().hash());
}

#[test]
fn test_replay_reports_bad_ply() {
    let moves = vec!["e2e4".to_string(), "e7e5".to_string(), "e4e5".to_string()];
    let err = Session::replay(
        Opponent::parse("x").unwrap(),
        1,
        0,
        Sides::new(Color::White, "bot", "x"),
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        &moves,
    )
    .unwrap_err();

    assert_eq!(err.ply, 2);
    assert_eq!(err.token, "e4e5");
}

#[test]
fn test_insufficient_material() {
    let bare: Board = "8/8/8/4k3/8/4K3/8/8 w - - 0 1".parse().unwrap();
    assert!(insufficient_material(&bare));

    let bishop: Board = "8/8/8/4k3/8/4KB2/8/8 w - - 0 1".parse().unwrap();
    assert!(insufficient_material(&bishop));

    let rook: Board = "8/8/8/4k3/8/4KR2/8/8 w - - 0 1".parse().unwrap();
    assert!(!insufficient_material(&rook));
}

#[test]
fn test_result_markers() {
    for result in [
        GameResult::InProgress,
        GameResult::WhiteWins,
        GameResult::BlackWins,
        GameResult::Draw,
    ] {
        assert_eq!(GameResult::from_marker(result.marker()), Some(result));
    }
    assert_eq!(GameResult::from_marker("2-0"), None);
}
