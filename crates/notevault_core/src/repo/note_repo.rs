//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide note persistence APIs over the `notes` table.
//! - Apply the trash filter, tag filter and pagination in SQL.
//!
//! # Invariants
//! - Reads return notes regardless of owner; owner scoping is the
//!   ownership guard's decision, not a query side effect.
//! - Every write refreshes `updated_at`.
//! - `purge_note` only removes rows that are already in trash.

use crate::db::NOW_MS_SQL;
use crate::model::note::{Note, NoteId, UserId};
use crate::query::filter::{normalize_note_limit, NoteListQuery};
use crate::repo::row::{bool_to_int, parse_flag, parse_uuid};
use crate::repo::tag_repo::load_note_tags;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    title,
    content,
    preview_text,
    favorite,
    deleted,
    created_at,
    updated_at
FROM notes";

/// Insert payload for one new note row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteInsert<'a> {
    pub id: NoteId,
    pub owner_id: UserId,
    pub title: &'a str,
    pub content: &'a str,
    pub preview_text: Option<&'a str>,
    pub favorite: bool,
}

/// Repository interface for note rows.
pub trait NoteRepository {
    /// Inserts one active note and returns its id.
    fn insert_note(&self, note: &NoteInsert<'_>) -> RepoResult<NoteId>;
    /// Gets one note by id, trashed or not, for any owner.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists one owner's notes filtered by `query`.
    fn list_notes(&self, owner_id: UserId, query: &NoteListQuery) -> RepoResult<Vec<Note>>;
    /// Writes title/favorite/deleted in one statement.
    fn update_note_meta(
        &self,
        id: NoteId,
        title: &str,
        favorite: bool,
        deleted: bool,
    ) -> RepoResult<()>;
    /// Overwrites content and its derived preview. Does not snapshot.
    fn write_note_content(
        &self,
        id: NoteId,
        content: &str,
        preview_text: Option<&str>,
    ) -> RepoResult<()>;
    /// Flips the soft-delete flag.
    fn set_note_deleted(&self, id: NoteId, deleted: bool) -> RepoResult<()>;
    /// Refreshes `updated_at` after a change stored outside `notes`.
    fn touch_note(&self, id: NoteId) -> RepoResult<()>;
    /// Physically removes a trashed note; versions and tag links cascade.
    fn purge_note(&self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, note: &NoteInsert<'_>) -> RepoResult<NoteId> {
        self.conn.execute(
            &format!(
                "INSERT INTO notes (
                    id,
                    owner_id,
                    title,
                    content,
                    preview_text,
                    favorite,
                    deleted,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            params![
                note.id.to_string(),
                note.owner_id.to_string(),
                note.title,
                note.content,
                note.preview_text,
                bool_to_int(note.favorite),
            ],
        )?;

        Ok(note.id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_note_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_notes(&self, owner_id: UserId, query: &NoteListQuery) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner_id.to_string())];

        if let Some(predicate) = query.deleted.sql_predicate() {
            sql.push_str(predicate);
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM note_tags nt
                    INNER JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = notes.id
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.trim().to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC");
        match normalize_note_limit(query.limit) {
            Some(limit) => {
                sql.push_str(" LIMIT ?");
                bind_values.push(Value::Integer(i64::from(limit)));
            }
            // SQLite only accepts OFFSET after a LIMIT; -1 means no bound.
            None if query.offset > 0 => sql.push_str(" LIMIT -1"),
            None => {}
        }
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(self.conn, row)?);
        }

        Ok(notes)
    }

    fn update_note_meta(
        &self,
        id: NoteId,
        title: &str,
        favorite: bool,
        deleted: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE notes
                 SET
                    title = ?2,
                    favorite = ?3,
                    deleted = ?4,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id.to_string(),
                title,
                bool_to_int(favorite),
                bool_to_int(deleted),
            ],
        )?;
        ensure_changed(changed, id)
    }

    fn write_note_content(
        &self,
        id: NoteId,
        content: &str,
        preview_text: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE notes
                 SET
                    content = ?2,
                    preview_text = ?3,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id.to_string(), content, preview_text],
        )?;
        ensure_changed(changed, id)
    }

    fn set_note_deleted(&self, id: NoteId, deleted: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE notes
                 SET
                    deleted = ?2,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![id.to_string(), bool_to_int(deleted)],
        )?;
        ensure_changed(changed, id)
    }

    fn touch_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!("UPDATE notes SET updated_at = {NOW_MS_SQL} WHERE id = ?1;"),
            [id.to_string()],
        )?;
        ensure_changed(changed, id)
    }

    fn purge_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND deleted = 1;",
            [id.to_string()],
        )?;
        ensure_changed(changed, id)
    }
}

fn ensure_changed(changed: usize, id: NoteId) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NoteNotFound(id));
    }
    Ok(())
}

fn parse_note_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Note> {
    let id_text: String = row.get("id")?;
    let id = parse_uuid(&id_text, "notes.id")?;
    let owner_text: String = row.get("owner_id")?;
    let owner_id = parse_uuid(&owner_text, "notes.owner_id")?;

    Ok(Note {
        id,
        owner_id,
        title: row.get("title")?,
        content: row.get("content")?,
        preview_text: row.get("preview_text")?,
        tags: load_note_tags(conn, &id_text)?,
        favorite: parse_flag(row.get("favorite")?, "notes.favorite")?,
        deleted: parse_flag(row.get("deleted")?, "notes.deleted")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
