//! Version history store.
//!
//! # Responsibility
//! - Append immutable content snapshots keyed by note.
//! - Serve a note's history newest first.
//!
//! # Invariants
//! - Versions are never updated (enforced by a schema trigger) and only
//!   removed by the cascade of their note's purge.
//! - `get_version` only matches versions of the given note.
//! - Ordering is `created_at DESC`, ties broken by insertion order.

use crate::db::NOW_MS_SQL;
use crate::model::note::{NoteId, UserId};
use crate::model::version::{NoteVersion, VersionId};
use crate::repo::row::{parse_optional_uuid, parse_uuid};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const VERSION_SELECT_SQL: &str = "SELECT
    id,
    note_id,
    content,
    edited_by,
    created_at
FROM note_versions";

/// Append-only log of prior note content.
///
/// Authorization is the caller's job; this store trusts the note id.
pub trait VersionStore {
    /// Records `content_before` as a new version of `note_id`.
    fn snapshot(
        &self,
        note_id: NoteId,
        content_before: &str,
        edited_by: Option<UserId>,
    ) -> RepoResult<VersionId>;
    /// Lists versions of one note, newest first.
    fn list_versions(&self, note_id: NoteId) -> RepoResult<Vec<NoteVersion>>;
    /// Gets one version if it belongs to `note_id`.
    fn get_version(&self, note_id: NoteId, version_id: VersionId)
        -> RepoResult<Option<NoteVersion>>;
}

/// SQLite-backed version store.
pub struct SqliteVersionStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVersionStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VersionStore for SqliteVersionStore<'_> {
    fn snapshot(
        &self,
        note_id: NoteId,
        content_before: &str,
        edited_by: Option<UserId>,
    ) -> RepoResult<VersionId> {
        let note_id_text = note_id.to_string();
        if !note_exists(self.conn, &note_id_text)? {
            return Err(RepoError::DanglingNote(note_id));
        }

        let version_id = Uuid::new_v4();
        self.conn.execute(
            &format!(
                "INSERT INTO note_versions (id, note_id, content, edited_by, created_at)
                 VALUES (?1, ?2, ?3, ?4, {NOW_MS_SQL});"
            ),
            params![
                version_id.to_string(),
                note_id_text,
                content_before,
                edited_by.map(|user| user.to_string()),
            ],
        )?;

        Ok(version_id)
    }

    fn list_versions(&self, note_id: NoteId) -> RepoResult<Vec<NoteVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VERSION_SELECT_SQL}
             WHERE note_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([note_id.to_string()])?;
        let mut versions = Vec::new();
        while let Some(row) = rows.next()? {
            versions.push(parse_version_row(row)?);
        }
        Ok(versions)
    }

    fn get_version(
        &self,
        note_id: NoteId,
        version_id: VersionId,
    ) -> RepoResult<Option<NoteVersion>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VERSION_SELECT_SQL} WHERE id = ?1 AND note_id = ?2;"
        ))?;
        let mut rows = stmt.query([version_id.to_string(), note_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_version_row(row)?));
        }
        Ok(None)
    }
}

fn note_exists(conn: &Connection, note_id: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [note_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_version_row(row: &Row<'_>) -> RepoResult<NoteVersion> {
    let id_text: String = row.get("id")?;
    let note_text: String = row.get("note_id")?;
    Ok(NoteVersion {
        id: parse_uuid(&id_text, "note_versions.id")?,
        note_id: parse_uuid(&note_text, "note_versions.note_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
        edited_by: parse_optional_uuid(row.get("edited_by")?, "note_versions.edited_by")?,
    })
}
