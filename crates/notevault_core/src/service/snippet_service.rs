//! Code snippet use-case service.
//!
//! # Responsibility
//! - Provide snippet create/get/list/update/delete scoped to the actor.
//! - Check parent-note ownership whenever a snippet is attached to a note.
//!
//! # Invariants
//! - A snippet owned by someone else, or attached to a note owned by someone
//!   else, is reported as not found, the same signal notes use.
//! - Snippet writes never touch note content or version history.

use crate::model::note::{NoteId, UserId};
use crate::model::snippet::{CodeSnippet, NewSnippet, SnippetId, SnippetUpdate};
use crate::model::tag::normalize_tags;
use crate::model::validation::{normalize_language, normalize_title, ValidationError};
use crate::repo::snippet_repo::{SnippetListQuery, SnippetRepository, SnippetWrite};
use crate::repo::store::{Store, StoreTx};
use crate::repo::tag_repo::TagRepository;
use crate::repo::RepoError;
use crate::service::ownership::OwnershipGuard;
use crate::service::ErrorKind;
use log::info;
use thiserror::Error;
use uuid::Uuid;

/// Service error for snippet use-cases.
#[derive(Debug, Error)]
pub enum SnippetServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("snippet not found: {0}")]
    SnippetNotFound(SnippetId),
    /// Parent note absent or owned by another user.
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
    #[error(transparent)]
    Repo(RepoError),
    #[error("inconsistent snippet state: {0}")]
    InconsistentState(&'static str),
}

impl SnippetServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SnippetNotFound(_) | Self::NoteNotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InconsistentState(_) => ErrorKind::Reference,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }
}

impl From<RepoError> for SnippetServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::SnippetNotFound(id) => Self::SnippetNotFound(id),
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Snippet facade over a transactional store.
pub struct SnippetService<S: Store> {
    store: S,
}

impl<S: Store> SnippetService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates one snippet, optionally attached to one of the actor's notes.
    pub fn create_snippet(
        &mut self,
        actor: UserId,
        request: NewSnippet,
    ) -> Result<CodeSnippet, SnippetServiceError> {
        let title = normalize_title(&request.title)?;
        let language = normalize_language(&request.language)?;
        let tags = normalize_tags(&request.tags)?;

        let tx = self.store.begin()?;
        if let Some(note_id) = request.note_id {
            ensure_note_owned(&tx, actor, note_id)?;
        }

        let snippet_id = tx.snippets().insert_snippet(
            Uuid::new_v4(),
            actor,
            &SnippetWrite {
                note_id: request.note_id,
                title: &title,
                code: &request.code,
                language: &language,
            },
        )?;
        if !tags.is_empty() {
            tx.tags().replace_snippet_tags(snippet_id, &tags)?;
        }
        let created = read_back(&tx, snippet_id)?;
        tx.commit()?;

        info!("event=snippet_create module=snippet_service status=ok snippet_id={snippet_id}");
        Ok(created)
    }

    pub fn get_snippet(
        &mut self,
        actor: UserId,
        snippet_id: SnippetId,
    ) -> Result<CodeSnippet, SnippetServiceError> {
        let tx = self.store.begin()?;
        let snippet = owned_snippet(&tx, actor, snippet_id)?;
        tx.commit()?;
        Ok(snippet)
    }

    /// Lists the actor's snippets; a note filter must name one of their notes.
    pub fn list_snippets(
        &mut self,
        actor: UserId,
        query: &SnippetListQuery,
    ) -> Result<Vec<CodeSnippet>, SnippetServiceError> {
        let tx = self.store.begin()?;
        if let Some(note_id) = query.note_id {
            ensure_note_owned(&tx, actor, note_id)?;
        }
        let snippets = tx.snippets().list_snippets(actor, query)?;
        tx.commit()?;
        Ok(snippets)
    }

    /// Applies a partial update; re-attaching checks the new parent note.
    pub fn update_snippet(
        &mut self,
        actor: UserId,
        snippet_id: SnippetId,
        update: SnippetUpdate,
    ) -> Result<CodeSnippet, SnippetServiceError> {
        let title = update.title.as_deref().map(normalize_title).transpose()?;
        let language = update
            .language
            .as_deref()
            .map(normalize_language)
            .transpose()?;
        let tags = update.tags.as_deref().map(normalize_tags).transpose()?;

        let tx = self.store.begin()?;
        let current = owned_snippet(&tx, actor, snippet_id)?;
        let note_id = update.note_id.unwrap_or(current.note_id);
        if let Some(parent) = note_id {
            if Some(parent) != current.note_id {
                ensure_note_owned(&tx, actor, parent)?;
            }
        }

        tx.snippets().update_snippet(
            snippet_id,
            &SnippetWrite {
                note_id,
                title: title.as_deref().unwrap_or(current.title.as_str()),
                code: update.code.as_deref().unwrap_or(current.code.as_str()),
                language: language.as_deref().unwrap_or(current.language.as_str()),
            },
        )?;
        if let Some(tags) = tags.as_ref() {
            tx.tags().replace_snippet_tags(snippet_id, tags)?;
        }
        let updated = read_back(&tx, snippet_id)?;
        tx.commit()?;

        info!("event=snippet_update module=snippet_service status=ok snippet_id={snippet_id}");
        Ok(updated)
    }

    /// Permanently removes a snippet. Snippets have no trash stage.
    pub fn delete_snippet(
        &mut self,
        actor: UserId,
        snippet_id: SnippetId,
    ) -> Result<(), SnippetServiceError> {
        let tx = self.store.begin()?;
        owned_snippet(&tx, actor, snippet_id)?;
        tx.snippets().delete_snippet(snippet_id)?;
        tx.commit()?;

        info!("event=snippet_delete module=snippet_service status=ok snippet_id={snippet_id}");
        Ok(())
    }
}

fn owned_snippet<T: StoreTx>(
    tx: &T,
    actor: UserId,
    snippet_id: SnippetId,
) -> Result<CodeSnippet, SnippetServiceError> {
    OwnershipGuard::new(actor)
        .check_snippet(&tx.snippets(), snippet_id)?
        .into_visible()
        .ok_or(SnippetServiceError::SnippetNotFound(snippet_id))
}

fn ensure_note_owned<T: StoreTx>(
    tx: &T,
    actor: UserId,
    note_id: NoteId,
) -> Result<(), SnippetServiceError> {
    let access = OwnershipGuard::new(actor).check_note(&tx.notes(), note_id)?;
    if access.is_owned() {
        Ok(())
    } else {
        Err(SnippetServiceError::NoteNotFound(note_id))
    }
}

fn read_back<T: StoreTx>(tx: &T, snippet_id: SnippetId) -> Result<CodeSnippet, SnippetServiceError> {
    tx.snippets()
        .get_snippet(snippet_id)?
        .ok_or(SnippetServiceError::InconsistentState(
            "snippet not found in read-back",
        ))
}
