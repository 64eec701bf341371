//! Tag catalog and tag-link persistence.
//!
//! # Responsibility
//! - Maintain the shared, unique `tags` catalog: create, rename, delete.
//! - Replace the tag set of a note or snippet as a whole.
//!
//! # Invariants
//! - Tag names arrive already normalized (see `model::tag::normalize_tags`).
//! - Replacement runs inside the caller's transaction; a failure leaves the
//!   previous link set intact.
//! - Catalog names stay unique case-insensitively; deleting a tag drops its
//!   note and snippet links through the schema cascade.

use crate::model::note::NoteId;
use crate::model::snippet::SnippetId;
use crate::model::tag::Tag;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for tags and their links.
pub trait TagRepository {
    /// Replaces all tags linked to one note.
    fn replace_note_tags(&self, note_id: NoteId, tags: &[String]) -> RepoResult<()>;
    /// Replaces all tags linked to one snippet.
    fn replace_snippet_tags(&self, snippet_id: SnippetId, tags: &[String]) -> RepoResult<()>;
    /// Returns every known tag sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    /// Adds one catalog entry; the name must not be taken.
    fn create_tag(&self, name: &str) -> RepoResult<Tag>;
    /// Renames one catalog entry in place, keeping its links.
    fn rename_tag(&self, id: i64, name: &str) -> RepoResult<Tag>;
    /// Removes one catalog entry and every link to it.
    fn delete_tag(&self, id: i64) -> RepoResult<()>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn replace_note_tags(&self, note_id: NoteId, tags: &[String]) -> RepoResult<()> {
        replace_links(self.conn, LinkTable::Note, &note_id.to_string(), tags)
    }

    fn replace_snippet_tags(&self, snippet_id: SnippetId, tags: &[String]) -> RepoResult<()> {
        replace_links(self.conn, LinkTable::Snippet, &snippet_id.to_string(), tags)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            tags.push(Tag {
                id: row.get("id")?,
                name: name.to_lowercase(),
            });
        }
        Ok(tags)
    }

    fn create_tag(&self, name: &str) -> RepoResult<Tag> {
        if find_tag_id(self.conn, name)?.is_some() {
            return Err(RepoError::TagExists(name.to_string()));
        }
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1);", [name])?;
        Ok(Tag {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn rename_tag(&self, id: i64, name: &str) -> RepoResult<Tag> {
        match find_tag_id(self.conn, name)? {
            Some(existing) if existing != id => {
                return Err(RepoError::TagExists(name.to_string()));
            }
            _ => {}
        }
        let changed = self
            .conn
            .execute("UPDATE tags SET name = ?1 WHERE id = ?2;", params![name, id])?;
        if changed == 0 {
            return Err(RepoError::TagNotFound(id));
        }
        Ok(Tag {
            id,
            name: name.to_string(),
        })
    }

    fn delete_tag(&self, id: i64) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tags WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::TagNotFound(id));
        }
        Ok(())
    }
}

fn find_tag_id(conn: &Connection, name: &str) -> RepoResult<Option<i64>> {
    let id = conn
        .query_row(
            "SELECT id FROM tags WHERE name = ?1 COLLATE NOCASE;",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

#[derive(Debug, Clone, Copy)]
enum LinkTable {
    Note,
    Snippet,
}

impl LinkTable {
    fn table(self) -> &'static str {
        match self {
            Self::Note => "note_tags",
            Self::Snippet => "snippet_tags",
        }
    }

    fn owner_column(self) -> &'static str {
        match self {
            Self::Note => "note_id",
            Self::Snippet => "snippet_id",
        }
    }
}

fn replace_links(
    conn: &Connection,
    link: LinkTable,
    owner_id: &str,
    tags: &[String],
) -> RepoResult<()> {
    let table = link.table();
    let column = link.owner_column();

    conn.execute(
        &format!("DELETE FROM {table} WHERE {column} = ?1;"),
        [owner_id],
    )?;

    for tag in tags {
        conn.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [tag.as_str()])?;
        conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {table} ({column}, tag_id)
                 SELECT ?1, id
                 FROM tags
                 WHERE name = ?2 COLLATE NOCASE;"
            ),
            params![owner_id, tag.as_str()],
        )?;
    }

    Ok(())
}

pub(crate) fn load_note_tags(conn: &Connection, note_id: &str) -> RepoResult<Vec<String>> {
    load_links(conn, LinkTable::Note, note_id)
}

pub(crate) fn load_snippet_tags(conn: &Connection, snippet_id: &str) -> RepoResult<Vec<String>> {
    load_links(conn, LinkTable::Snippet, snippet_id)
}

fn load_links(conn: &Connection, link: LinkTable, owner_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT t.name
         FROM {table} l
         INNER JOIN tags t ON t.id = l.tag_id
         WHERE l.{column} = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
        table = link.table(),
        column = link.owner_column(),
    ))?;
    let mut rows = stmt.query([owner_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}
