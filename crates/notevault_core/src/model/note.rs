//! Note domain model and lifecycle state.
//!
//! # Responsibility
//! - Define the persisted note record and its write requests.
//! - Expose the lifecycle state derived from the soft-delete flag.
//!
//! # Invariants
//! - `deleted == true` means "in trash", never "physically removed".
//! - A purged note has no record at all, so `NoteState` has no purged variant.
//! - `preview_text` is derived from `content` on every content write.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable note identifier.
pub type NoteId = Uuid;

/// Authenticated user identifier supplied by the caller.
///
/// Core trusts this value and never re-validates it.
pub type UserId = Uuid;

/// Lifecycle state of a stored note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteState {
    /// Visible in the default workspace (`deleted = false`).
    Active,
    /// Moved to trash (`deleted = true`); eligible for purge.
    Trashed,
}

/// Persisted note with its tag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub owner_id: UserId,
    pub title: String,
    /// Editor body, stored verbatim (rich-text HTML or markdown).
    pub content: String,
    /// Plain-text summary derived from `content`.
    pub preview_text: Option<String>,
    /// Normalized tag names sorted ascending.
    pub tags: Vec<String>,
    pub favorite: bool,
    pub deleted: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Note {
    /// Returns the lifecycle state encoded by the soft-delete flag.
    pub fn state(&self) -> NoteState {
        if self.deleted {
            NoteState::Trashed
        } else {
            NoteState::Active
        }
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Create request for one note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub favorite: bool,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// Partial update request; `None` leaves a field untouched.
///
/// Setting `deleted` here is the only way back from trash to active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub favorite: Option<bool>,
    pub deleted: Option<bool>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.tags.is_none()
            && self.favorite.is_none()
            && self.deleted.is_none()
    }
}
