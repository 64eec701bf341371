use notevault_core::db::open_db_in_memory;
use notevault_core::{
    NewNote, NoteService, RepoError, SqliteStore, SqliteVersionStore, VersionStore,
};
use rusqlite::params;
use uuid::Uuid;

fn seed_note(conn: &mut rusqlite::Connection) -> Uuid {
    NoteService::new(SqliteStore::new(conn))
        .create_note(Uuid::new_v4(), NewNote::new("Seed", "current"))
        .unwrap()
        .id
}

#[test]
fn snapshot_of_missing_note_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteVersionStore::new(&conn);
    let missing = Uuid::new_v4();

    let err = store.snapshot(missing, "orphan", None).unwrap_err();

    assert!(matches!(err, RepoError::DanglingNote(id) if id == missing));
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM note_versions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn snapshots_are_scoped_to_their_note() {
    let mut conn = open_db_in_memory().unwrap();
    let first = seed_note(&mut conn);
    let second = seed_note(&mut conn);
    let store = SqliteVersionStore::new(&conn);

    let version = store.snapshot(first, "old", None).unwrap();

    assert!(store.get_version(second, version).unwrap().is_none());
    assert!(store.list_versions(second).unwrap().is_empty());
    let found = store.get_version(first, version).unwrap().unwrap();
    assert_eq!(found.content, "old");
    assert_eq!(found.edited_by, None);
}

#[test]
fn same_millisecond_snapshots_keep_insertion_order() {
    let mut conn = open_db_in_memory().unwrap();
    let note_id = seed_note(&mut conn);
    let store = SqliteVersionStore::new(&conn);
    let editor = Uuid::new_v4();

    let ids: Vec<_> = ["one", "two", "three"]
        .into_iter()
        .map(|content| store.snapshot(note_id, content, Some(editor)).unwrap())
        .collect();

    let listed: Vec<_> = store
        .list_versions(note_id)
        .unwrap()
        .into_iter()
        .map(|version| version.id)
        .collect();
    assert_eq!(listed, ids.into_iter().rev().collect::<Vec<_>>());
}

#[test]
fn stored_versions_cannot_be_rewritten() {
    let mut conn = open_db_in_memory().unwrap();
    let note_id = seed_note(&mut conn);
    let version = SqliteVersionStore::new(&conn)
        .snapshot(note_id, "frozen", None)
        .unwrap();

    let result = conn.execute(
        "UPDATE note_versions SET content = 'tampered' WHERE id = ?1;",
        params![version.to_string()],
    );
    assert!(result.is_err());

    let content: String = conn
        .query_row(
            "SELECT content FROM note_versions WHERE id = ?1;",
            params![version.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(content, "frozen");
}
