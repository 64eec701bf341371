//! Note version model.
//!
//! A version is an immutable snapshot of a note's content taken immediately
//! before that content was overwritten.

use super::note::{NoteId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable version identifier.
pub type VersionId = Uuid;

/// One immutable pre-image of a note's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteVersion {
    pub id: VersionId,
    pub note_id: NoteId,
    /// Content as it was before the write that created this version.
    pub content: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Actor whose write displaced this content.
    pub edited_by: Option<UserId>,
}
