//! Code snippet repository contracts and SQLite implementation.

use crate::db::NOW_MS_SQL;
use crate::model::note::{NoteId, UserId};
use crate::model::snippet::{CodeSnippet, SnippetId};
use crate::repo::row::{parse_optional_uuid, parse_uuid};
use crate::repo::tag_repo::load_snippet_tags;
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const SNIPPET_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    note_id,
    title,
    code,
    language,
    created_at,
    updated_at
FROM code_snippets";

/// Field values written on insert and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetWrite<'a> {
    pub note_id: Option<NoteId>,
    pub title: &'a str,
    pub code: &'a str,
    pub language: &'a str,
}

/// List options for one owner's snippets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetListQuery {
    /// Restrict to snippets attached to this note.
    pub note_id: Option<NoteId>,
    /// Optional single-tag exact match (case-insensitive).
    pub tag: Option<String>,
}

/// Repository interface for code snippets.
pub trait SnippetRepository {
    fn insert_snippet(
        &self,
        id: SnippetId,
        owner_id: UserId,
        fields: &SnippetWrite<'_>,
    ) -> RepoResult<SnippetId>;
    fn get_snippet(&self, id: SnippetId) -> RepoResult<Option<CodeSnippet>>;
    /// Lists one owner's snippets, most recently updated first.
    fn list_snippets(
        &self,
        owner_id: UserId,
        query: &SnippetListQuery,
    ) -> RepoResult<Vec<CodeSnippet>>;
    fn update_snippet(&self, id: SnippetId, fields: &SnippetWrite<'_>) -> RepoResult<()>;
    fn delete_snippet(&self, id: SnippetId) -> RepoResult<()>;
}

/// SQLite-backed snippet repository.
pub struct SqliteSnippetRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSnippetRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SnippetRepository for SqliteSnippetRepository<'_> {
    fn insert_snippet(
        &self,
        id: SnippetId,
        owner_id: UserId,
        fields: &SnippetWrite<'_>,
    ) -> RepoResult<SnippetId> {
        self.conn.execute(
            &format!(
                "INSERT INTO code_snippets (
                    id,
                    owner_id,
                    note_id,
                    title,
                    code,
                    language,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, {NOW_MS_SQL}, {NOW_MS_SQL});"
            ),
            params![
                id.to_string(),
                owner_id.to_string(),
                fields.note_id.map(|note| note.to_string()),
                fields.title,
                fields.code,
                fields.language,
            ],
        )?;
        Ok(id)
    }

    fn get_snippet(&self, id: SnippetId) -> RepoResult<Option<CodeSnippet>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SNIPPET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_snippet_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_snippets(
        &self,
        owner_id: UserId,
        query: &SnippetListQuery,
    ) -> RepoResult<Vec<CodeSnippet>> {
        let mut sql = format!("{SNIPPET_SELECT_SQL} WHERE owner_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(owner_id.to_string())];

        if let Some(note_id) = query.note_id {
            sql.push_str(" AND note_id = ?");
            bind_values.push(Value::Text(note_id.to_string()));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM snippet_tags st
                    INNER JOIN tags t ON t.id = st.tag_id
                    WHERE st.snippet_id = code_snippets.id
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.trim().to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut snippets = Vec::new();
        while let Some(row) = rows.next()? {
            snippets.push(parse_snippet_row(self.conn, row)?);
        }
        Ok(snippets)
    }

    fn update_snippet(&self, id: SnippetId, fields: &SnippetWrite<'_>) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE code_snippets
                 SET
                    note_id = ?2,
                    title = ?3,
                    code = ?4,
                    language = ?5,
                    updated_at = {NOW_MS_SQL}
                 WHERE id = ?1;"
            ),
            params![
                id.to_string(),
                fields.note_id.map(|note| note.to_string()),
                fields.title,
                fields.code,
                fields.language,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::SnippetNotFound(id));
        }
        Ok(())
    }

    fn delete_snippet(&self, id: SnippetId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM code_snippets WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::SnippetNotFound(id));
        }
        Ok(())
    }
}

fn parse_snippet_row(conn: &Connection, row: &Row<'_>) -> RepoResult<CodeSnippet> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("owner_id")?;
    Ok(CodeSnippet {
        id: parse_uuid(&id_text, "code_snippets.id")?,
        owner_id: parse_uuid(&owner_text, "code_snippets.owner_id")?,
        note_id: parse_optional_uuid(row.get("note_id")?, "code_snippets.note_id")?,
        title: row.get("title")?,
        code: row.get("code")?,
        language: row.get("language")?,
        tags: load_snippet_tags(conn, &id_text)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
