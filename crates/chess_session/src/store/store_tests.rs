use super::*;
use chrono::NaiveDate;
use cozy_chess::Color;
use tempfile::TempDir;

use crate::game::Sides;

fn opponent() -> Opponent {
    Opponent::parse("#chess").unwrap()
}

fn session(round: u32, tokens: &[&str]) -> Session {
    let sides = Sides::new(Color::White, "chessbot", "#chess");
    let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let mut session = Session::new(opponent(), round, 3, sides, date);
    for token in tokens {
        let mv = session.resolve(token).unwrap();
        session.apply(mv);
    }
    session
}

/// Shared behaviour every store must have.
fn check_upsert_rules(store: &dyn GameStore) {
    let who = opponent();
    assert!(store.find_active(&who).unwrap().is_none());
    assert!(store.find_history(&who).unwrap().is_empty());

    let mut game = session(1, &["e2e4"]);
    let id = store.save(&game).unwrap();
    game.id = Some(id);

    let active = store.find_active(&who).unwrap().unwrap();
    assert_eq!(active.id, Some(id));
    assert_eq!(active.moves(), &["e2e4".to_string()]);

    // a second in-progress game without an id is refused
    let rival = session(2, &[]);
    match store.save(&rival) {
        Err(StoreError::ActiveConflict { existing, .. }) => assert_eq!(existing, id),
        other => panic!("expected conflict, got {other:?}"),
    }

    // overwrite in place
    let mv = game.resolve("e7e5").unwrap();
    game.apply(mv);
    assert_eq!(store.save(&game).unwrap(), id);
    let active = store.find_active(&who).unwrap().unwrap();
    assert_eq!(active.moves().len(), 2);
    assert_eq!(store.find_history(&who).unwrap().len(), 1);

    // finishing the game frees the active slot and freezes the record
    game.resign(Color::Black);
    store.save(&game).unwrap();
    assert!(store.find_active(&who).unwrap().is_none());
    assert!(matches!(store.save(&game), Err(StoreError::Immutable(i)) if i == id));

    let next = session(2, &[]);
    let next_id = store.save(&next).unwrap();
    assert_ne!(next_id, id);

    let history = store.find_history(&who).unwrap();
    assert_eq!(history.iter().map(|s| s.round).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(history[0].result, GameResult::WhiteWins);
    assert_eq!(history[1].id, Some(next_id));
}

#[test]
fn test_memory_store_rules() {
    check_upsert_rules(&MemoryStore::new());
}

#[test]
fn test_json_store_rules() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    check_upsert_rules(&store);
}

#[test]
fn test_unknown_id_rejected() {
    let store = MemoryStore::new();
    let mut game = session(1, &[]);
    let id = GameId::new();
    game.id = Some(id);
    assert!(matches!(store.save(&game), Err(StoreError::UnknownGame(i)) if i == id));
}

#[test]
fn test_history_sorted_by_round() {
    let store = MemoryStore::new();
    for round in [3, 1, 2] {
        let mut game = session(round, &[]);
        game.resign(Color::White);
        store.save(&game).unwrap();
    }
    let rounds: Vec<u32> = store
        .find_history(&opponent())
        .unwrap()
        .iter()
        .map(|s| s.round)
        .collect();
    assert_eq!(rounds, vec![1, 2, 3]);
    assert_eq!(store.records(&opponent()).len(), 3);
}

#[test]
fn test_opponents_are_isolated() {
    let store = MemoryStore::new();
    store.save(&session(1, &[])).unwrap();

    let other = Opponent::parse("someone").unwrap();
    assert!(store.find_active(&other).unwrap().is_none());

    let mut theirs = session(1, &[]);
    theirs.opponent = other.clone();
    store.save(&theirs).unwrap();
    assert!(store.find_active(&other).unwrap().is_some());
    assert!(store.find_active(&opponent()).unwrap().is_some());
}

#[test]
fn test_json_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let id = {
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.save(&session(1, &["d2d4", "d7d5"])).unwrap()
    };

    let store = JsonFileStore::open(dir.path()).unwrap();
    let active = store.find_active(&opponent()).unwrap().unwrap();
    assert_eq!(active.id, Some(id));
    assert_eq!(active.moves(), &["d2d4".to_string(), "d7d5".to_string()]);
    assert_eq!(active.difficulty, 3);
}

#[test]
fn test_json_store_file_names() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    assert_eq!(
        store.path_for(&Opponent::parse("#chess").unwrap()),
        dir.path().join("chess.json")
    );
    assert_eq!(
        store.path_for(&Opponent::parse("a.b/c").unwrap()),
        dir.path().join("a%2eb%2fc.json")
    );
}

#[test]
fn test_json_store_malformed_file() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    std::fs::write(store.path_for(&opponent()), "{ not json").unwrap();
    assert!(matches!(
        store.find_active(&opponent()),
        Err(StoreError::Format { .. })
    ));
}

#[test]
fn test_corrupt_transcript_reported() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::open(dir.path()).unwrap();
    let id = store.save(&session(1, &["e2e4"])).unwrap();

    let path = store.path_for(&opponent());
    let text = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, text.replace("1. e2e4", "1. e2e5")).unwrap();

    match store.find_active(&opponent()) {
        Err(StoreError::Corrupt { id: bad, .. }) => assert_eq!(bad, id),
        other => panic!("expected corrupt record, got {other:?}"),
    }
}
