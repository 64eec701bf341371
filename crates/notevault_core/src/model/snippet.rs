//! Code snippet model.
//!
//! Snippets belong to a user and may hang off one of that user's notes.
//! When the parent note is purged the link is cleared, the snippet stays.

use super::note::{NoteId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable snippet identifier.
pub type SnippetId = Uuid;

/// Persisted code snippet with its tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSnippet {
    pub id: SnippetId,
    pub owner_id: UserId,
    pub note_id: Option<NoteId>,
    pub title: String,
    pub code: String,
    /// Lowercase language label; empty when unknown.
    pub language: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create request for one snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSnippet {
    pub title: String,
    pub code: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub note_id: Option<NoteId>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update request; `None` leaves a field untouched.
///
/// `note_id: Some(None)` detaches the snippet from its note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetUpdate {
    pub title: Option<String>,
    pub code: Option<String>,
    pub language: Option<String>,
    pub note_id: Option<Option<NoteId>>,
    pub tags: Option<Vec<String>>,
}
