use notevault_core::db::open_db_in_memory;
use notevault_core::{
    ErrorKind, NewNote, NoteService, NoteServiceError, NoteUpdate, SqliteStore,
};
use rusqlite::Connection;
use uuid::Uuid;

fn version_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM note_versions;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn content_change_snapshots_the_previous_content() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();

    let note = service
        .create_note(actor, NewNote::new("Draft", "A"))
        .unwrap();
    let updated = service.update_note_content(actor, note.id, "B").unwrap();

    assert_eq!(updated.note.content, "B");
    let snapshot = updated.snapshot.expect("content change should snapshot");

    let versions = service.list_versions(actor, note.id).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].id, snapshot);
    assert_eq!(versions[0].content, "A");
    assert_eq!(versions[0].note_id, note.id);
    assert_eq!(versions[0].edited_by, Some(actor));
}

#[test]
fn unchanged_content_does_not_snapshot() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();

    let note = service
        .create_note(actor, NewNote::new("Draft", "A"))
        .unwrap();
    service.update_note_content(actor, note.id, "B").unwrap();
    let repeat = service.update_note_content(actor, note.id, "B").unwrap();

    assert_eq!(repeat.snapshot, None);
    assert_eq!(service.list_versions(actor, note.id).unwrap().len(), 1);
}

#[test]
fn metadata_only_updates_never_snapshot() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    {
        let mut service = NoteService::new(SqliteStore::new(&mut conn));
        let note = service
            .create_note(actor, NewNote::new("Draft", "body"))
            .unwrap();

        let updated = service
            .update_note(
                actor,
                note.id,
                NoteUpdate {
                    title: Some("Renamed".to_string()),
                    favorite: Some(true),
                    tags: Some(vec!["Work".to_string()]),
                    ..NoteUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.snapshot, None);
        assert_eq!(updated.note.title, "Renamed");
        assert!(updated.note.favorite);
        assert_eq!(updated.note.tags, vec!["work".to_string()]);

        service
            .set_note_tags(actor, note.id, vec!["other".to_string()])
            .unwrap();
        service.soft_delete(actor, note.id).unwrap();
    }
    assert_eq!(version_rows(&conn), 0);
}

#[test]
fn update_with_same_content_and_new_title_does_not_snapshot() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let note = service
        .create_note(actor, NewNote::new("Draft", "same"))
        .unwrap();

    let updated = service
        .update_note(
            actor,
            note.id,
            NoteUpdate {
                title: Some("New title".to_string()),
                content: Some("same".to_string()),
                ..NoteUpdate::default()
            },
        )
        .unwrap();

    assert_eq!(updated.snapshot, None);
    assert!(service.list_versions(actor, note.id).unwrap().is_empty());
}

#[test]
fn mixed_update_snapshots_once_with_pre_image() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let note = service
        .create_note(actor, NewNote::new("Draft", "old body"))
        .unwrap();

    let updated = service
        .update_note(
            actor,
            note.id,
            NoteUpdate {
                title: Some("Final".to_string()),
                content: Some("new body".to_string()),
                favorite: Some(true),
                ..NoteUpdate::default()
            },
        )
        .unwrap();

    assert!(updated.snapshot.is_some());
    let versions = service.list_versions(actor, note.id).unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].content, "old body");
}

#[test]
fn versions_are_listed_newest_first() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let note = service
        .create_note(actor, NewNote::new("Draft", "v1"))
        .unwrap();
    for content in ["v2", "v3", "v4"] {
        service.update_note_content(actor, note.id, content).unwrap();
    }

    let contents: Vec<String> = service
        .list_versions(actor, note.id)
        .unwrap()
        .into_iter()
        .map(|version| version.content)
        .collect();
    assert_eq!(contents, vec!["v3", "v2", "v1"]);
}

#[test]
fn get_version_requires_matching_note() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let first = service
        .create_note(actor, NewNote::new("First", "a"))
        .unwrap();
    let second = service
        .create_note(actor, NewNote::new("Second", "x"))
        .unwrap();
    let snapshot = service
        .update_note_content(actor, first.id, "b")
        .unwrap()
        .snapshot
        .unwrap();

    let found = service.get_version(actor, first.id, snapshot).unwrap();
    assert_eq!(found.content, "a");

    let err = service.get_version(actor, second.id, snapshot).unwrap_err();
    assert!(matches!(err, NoteServiceError::VersionNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn restore_replaces_content_and_keeps_flags() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let note = service
        .create_note(actor, NewNote::new("Draft", "original"))
        .unwrap();
    let snapshot = service
        .update_note_content(actor, note.id, "rewritten")
        .unwrap()
        .snapshot
        .unwrap();
    service
        .update_note(
            actor,
            note.id,
            NoteUpdate {
                favorite: Some(true),
                ..NoteUpdate::default()
            },
        )
        .unwrap();
    service.soft_delete(actor, note.id).unwrap();

    let outcome = service.restore_version(actor, note.id, snapshot).unwrap();

    assert_eq!(outcome.status(), "restored");
    assert_eq!(outcome.note.content, "original");
    assert!(outcome.note.deleted, "restore must not untrash");
    assert!(outcome.note.favorite);
}

#[test]
fn restore_keeps_displaced_content_in_history() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let note = service
        .create_note(actor, NewNote::new("Draft", "A"))
        .unwrap();
    let first = service
        .update_note_content(actor, note.id, "B")
        .unwrap()
        .snapshot
        .unwrap();

    let outcome = service.restore_version(actor, note.id, first).unwrap();
    assert!(outcome.snapshot.is_some());

    let contents: Vec<String> = service
        .list_versions(actor, note.id)
        .unwrap()
        .into_iter()
        .map(|version| version.content)
        .collect();
    assert_eq!(contents, vec!["B", "A"]);

    // Restoring content equal to the current value records nothing.
    let again = service.restore_version(actor, note.id, first).unwrap();
    assert_eq!(again.snapshot, None);
    assert_eq!(service.list_versions(actor, note.id).unwrap().len(), 2);
}

#[test]
fn content_update_refreshes_preview() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = NoteService::new(SqliteStore::new(&mut conn));
    let actor = Uuid::new_v4();
    let note = service
        .create_note(actor, NewNote::new("Draft", "<p>first</p>"))
        .unwrap();
    assert_eq!(note.preview_text.as_deref(), Some("first"));

    let updated = service
        .update_note_content(actor, note.id, "<p>second <b>draft</b></p>")
        .unwrap();
    assert_eq!(updated.note.preview_text.as_deref(), Some("second draft"));
}
