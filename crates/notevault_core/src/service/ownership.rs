//! Ownership guard.
//!
//! # Responsibility
//! - Decide, in one place, whether the actor may see a note or snippet.
//!
//! # Invariants
//! - The check distinguishes owned / not owned / missing internally.
//! - `into_visible` is the single policy point: "not owned" is reported
//!   exactly like "missing", for notes and snippets alike.

use crate::model::note::{Note, NoteId, UserId};
use crate::model::snippet::{CodeSnippet, SnippetId};
use crate::repo::note_repo::NoteRepository;
use crate::repo::snippet_repo::SnippetRepository;
use crate::repo::RepoResult;
use log::debug;

/// Outcome of an ownership check on one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access<T> {
    /// Record exists and belongs to the actor.
    Owned(T),
    /// Record exists but belongs to someone else.
    NotOwned,
    /// No such record.
    Missing,
}

impl<T> Access<T> {
    /// Returns the record only when owned.
    pub fn into_visible(self) -> Option<T> {
        match self {
            Self::Owned(value) => Some(value),
            Self::NotOwned | Self::Missing => None,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }
}

/// Per-request guard bound to the authenticated actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipGuard {
    actor: UserId,
}

impl OwnershipGuard {
    pub fn new(actor: UserId) -> Self {
        Self { actor }
    }

    /// Classifies the actor's access to one note, trashed or not.
    pub fn check_note<R: NoteRepository>(
        &self,
        repo: &R,
        note_id: NoteId,
    ) -> RepoResult<Access<Note>> {
        let access = match repo.get_note(note_id)? {
            Some(note) if note.is_owned_by(self.actor) => Access::Owned(note),
            Some(_) => Access::NotOwned,
            None => Access::Missing,
        };
        if matches!(access, Access::NotOwned) {
            debug!("event=ownership_check module=guard status=denied resource=note note_id={note_id}");
        }
        Ok(access)
    }

    /// Classifies the actor's access to one snippet.
    pub fn check_snippet<R: SnippetRepository>(
        &self,
        repo: &R,
        snippet_id: SnippetId,
    ) -> RepoResult<Access<CodeSnippet>> {
        let access = match repo.get_snippet(snippet_id)? {
            Some(snippet) if snippet.owner_id == self.actor => Access::Owned(snippet),
            Some(_) => Access::NotOwned,
            None => Access::Missing,
        };
        if matches!(access, Access::NotOwned) {
            debug!(
                "event=ownership_check module=guard status=denied resource=snippet snippet_id={snippet_id}"
            );
        }
        Ok(access)
    }
}
