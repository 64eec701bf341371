use notevault_core::db::open_db_in_memory;
use notevault_core::{
    ErrorKind, NewNote, NewSnippet, NoteService, SnippetListQuery, SnippetService,
    SnippetServiceError, SnippetUpdate, SqliteStore,
};
use rusqlite::Connection;
use uuid::Uuid;

fn snippet_request(title: &str, note_id: Option<Uuid>) -> NewSnippet {
    NewSnippet {
        title: title.to_string(),
        code: "println!(\"hi\");".to_string(),
        language: "Rust".to_string(),
        note_id,
        tags: vec!["Demo".to_string()],
    }
}

fn create_note(conn: &mut Connection, actor: Uuid) -> Uuid {
    NoteService::new(SqliteStore::new(conn))
        .create_note(actor, NewNote::new("Parent", "body"))
        .unwrap()
        .id
}

#[test]
fn create_normalizes_language_and_tags() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    let note_id = create_note(&mut conn, actor);
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));

    let snippet = service
        .create_snippet(actor, snippet_request("  hello  ", Some(note_id)))
        .unwrap();

    assert_eq!(snippet.title, "hello");
    assert_eq!(snippet.language, "rust");
    assert_eq!(snippet.tags, vec!["demo".to_string()]);
    assert_eq!(snippet.note_id, Some(note_id));
    assert_eq!(snippet.owner_id, actor);
    assert_eq!(service.get_snippet(actor, snippet.id).unwrap(), snippet);
}

#[test]
fn attaching_to_foreign_note_is_not_found() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let note_id = create_note(&mut conn, owner);
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));

    let err = service
        .create_snippet(intruder, snippet_request("sneaky", Some(note_id)))
        .unwrap_err();
    assert!(matches!(err, SnippetServiceError::NoteNotFound(id) if id == note_id));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .list_snippets(
            intruder,
            &SnippetListQuery {
                note_id: Some(note_id),
                ..SnippetListQuery::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, SnippetServiceError::NoteNotFound(_)));
}

#[test]
fn foreign_snippets_look_missing() {
    let mut conn = open_db_in_memory().unwrap();
    let owner = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));
    let snippet = service
        .create_snippet(owner, snippet_request("mine", None))
        .unwrap();

    assert!(matches!(
        service.get_snippet(intruder, snippet.id),
        Err(SnippetServiceError::SnippetNotFound(_))
    ));
    assert!(matches!(
        service.update_snippet(
            intruder,
            snippet.id,
            SnippetUpdate {
                code: Some("stolen".to_string()),
                ..SnippetUpdate::default()
            }
        ),
        Err(SnippetServiceError::SnippetNotFound(_))
    ));
    assert!(matches!(
        service.delete_snippet(intruder, snippet.id),
        Err(SnippetServiceError::SnippetNotFound(_))
    ));
    assert!(service
        .list_snippets(intruder, &SnippetListQuery::default())
        .unwrap()
        .is_empty());
    assert_eq!(service.get_snippet(owner, snippet.id).unwrap().code, snippet.code);
}

#[test]
fn update_changes_fields_and_can_detach() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    let note_id = create_note(&mut conn, actor);
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));
    let snippet = service
        .create_snippet(actor, snippet_request("before", Some(note_id)))
        .unwrap();

    let updated = service
        .update_snippet(
            actor,
            snippet.id,
            SnippetUpdate {
                title: Some("after".to_string()),
                language: Some("PYTHON".to_string()),
                tags: Some(vec!["b".to_string(), "a".to_string()]),
                ..SnippetUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.title, "after");
    assert_eq!(updated.language, "python");
    assert_eq!(updated.code, snippet.code);
    assert_eq!(updated.tags, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(updated.note_id, Some(note_id));

    let detached = service
        .update_snippet(
            actor,
            snippet.id,
            SnippetUpdate {
                note_id: Some(None),
                ..SnippetUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(detached.note_id, None);
    assert_eq!(detached.title, "after");
}

#[test]
fn reattaching_to_foreign_note_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    let other = Uuid::new_v4();
    let foreign_note = create_note(&mut conn, other);
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));
    let snippet = service
        .create_snippet(actor, snippet_request("mine", None))
        .unwrap();

    let err = service
        .update_snippet(
            actor,
            snippet.id,
            SnippetUpdate {
                note_id: Some(Some(foreign_note)),
                ..SnippetUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, SnippetServiceError::NoteNotFound(_)));
    assert_eq!(service.get_snippet(actor, snippet.id).unwrap().note_id, None);
}

#[test]
fn list_filters_by_note_and_tag() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    let note_id = create_note(&mut conn, actor);
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));
    let attached = service
        .create_snippet(actor, snippet_request("attached", Some(note_id)))
        .unwrap();
    let loose = service
        .create_snippet(
            actor,
            NewSnippet {
                tags: vec!["other".to_string()],
                ..snippet_request("loose", None)
            },
        )
        .unwrap();

    let by_note = service
        .list_snippets(
            actor,
            &SnippetListQuery {
                note_id: Some(note_id),
                ..SnippetListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(by_note.len(), 1);
    assert_eq!(by_note[0].id, attached.id);

    let by_tag = service
        .list_snippets(
            actor,
            &SnippetListQuery {
                tag: Some("OTHER".to_string()),
                ..SnippetListQuery::default()
            },
        )
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, loose.id);

    assert_eq!(
        service
            .list_snippets(actor, &SnippetListQuery::default())
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn delete_removes_snippet_but_not_note() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    let note_id = create_note(&mut conn, actor);
    {
        let mut service = SnippetService::new(SqliteStore::new(&mut conn));
        let snippet = service
            .create_snippet(actor, snippet_request("temp", Some(note_id)))
            .unwrap();
        service.delete_snippet(actor, snippet.id).unwrap();
        assert!(matches!(
            service.get_snippet(actor, snippet.id),
            Err(SnippetServiceError::SnippetNotFound(_))
        ));
    }

    let mut notes = NoteService::new(SqliteStore::new(&mut conn));
    let note = notes.get_note(actor, note_id).unwrap();
    assert!(!note.deleted);
    assert!(notes.list_versions(actor, note_id).unwrap().is_empty());
}

#[test]
fn invalid_snippet_input_is_rejected() {
    let mut conn = open_db_in_memory().unwrap();
    let actor = Uuid::new_v4();
    let mut service = SnippetService::new(SqliteStore::new(&mut conn));

    let err = service
        .create_snippet(actor, snippet_request("", None))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .create_snippet(
            actor,
            NewSnippet {
                language: "x".repeat(101),
                ..snippet_request("long language", None)
            },
        )
        .unwrap_err();
    assert!(matches!(err, SnippetServiceError::Validation(_)));
}
