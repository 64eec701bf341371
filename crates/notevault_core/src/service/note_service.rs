//! Note lifecycle service.
//!
//! # Responsibility
//! - Own the note state machine: active, trashed, purged.
//! - Snapshot a note's previous content whenever a write changes it.
//! - Serve version history and restore from it.
//! - Derive the plain-text preview stored alongside content.
//! - Manage the shared tag catalog.
//!
//! # Invariants
//! - A content write that changes the value records exactly one version
//!   holding the pre-image, in the same transaction as the write.
//! - Title, tag, favorite and trash-flag writes never record a version.
//! - Force delete is only allowed from trash; from active it is rejected
//!   without mutation.
//! - Restoring a version is a content write like any other, so the
//!   displaced content is itself kept in history.
//! - Note list order is `updated_at DESC, id ASC`.

use crate::model::note::{NewNote, Note, NoteId, NoteUpdate, UserId};
use crate::model::tag::{normalize_tags, validate_tag_name, Tag};
use crate::model::validation::{normalize_title, ValidationError};
use crate::model::version::{NoteVersion, VersionId};
use crate::query::filter::NoteListQuery;
use crate::repo::note_repo::{NoteInsert, NoteRepository};
use crate::repo::store::{Store, StoreTx};
use crate::repo::tag_repo::TagRepository;
use crate::repo::version_repo::VersionStore;
use crate::repo::RepoError;
use crate::service::ownership::OwnershipGuard;
use crate::service::ErrorKind;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

const PREVIEW_MAX_CHARS: usize = 100;

static HTML_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid html tag regex"));
static HTML_ENTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(nbsp|amp|lt|gt|quot|#39);").expect("valid html entity regex"));
static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\(([^)]+)\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~]+").expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Service error for note use-cases.
#[derive(Debug, Error)]
pub enum NoteServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Absent, purged, or owned by another user.
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("version {version_id} not found for note {note_id}")]
    VersionNotFound {
        note_id: NoteId,
        version_id: VersionId,
    },
    #[error("tag not found: {0}")]
    TagNotFound(i64),
    /// Catalog names are unique regardless of case.
    #[error("tag already exists: {0}")]
    TagExists(String),
    /// Force delete requested while the note is still active.
    #[error("Note must be in trash before permanent deletion.")]
    NotInTrash(NoteId),
    /// Snapshot attempted against a note that vanished mid-write.
    #[error("cannot record version for missing note {0}")]
    Reference(NoteId),
    #[error(transparent)]
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    #[error("inconsistent note state: {0}")]
    InconsistentState(&'static str),
}

impl NoteServiceError {
    /// Category used to pick a transport status.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoteNotFound(_) | Self::VersionNotFound { .. } | Self::TagNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Validation(_) | Self::NotInTrash(_) | Self::TagExists(_) => {
                ErrorKind::Validation
            }
            Self::Reference(_) | Self::InconsistentState(_) => ErrorKind::Reference,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NoteNotFound(id) => Self::NoteNotFound(id),
            RepoError::DanglingNote(id) => Self::Reference(id),
            RepoError::TagNotFound(id) => Self::TagNotFound(id),
            RepoError::TagExists(name) => Self::TagExists(name),
            other => Self::Repo(other),
        }
    }
}

/// Result of a write that may have touched content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedNote {
    pub note: Note,
    /// Version holding the displaced content, when content changed.
    pub snapshot: Option<VersionId>,
}

/// Result of restoring a version onto its note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreOutcome {
    pub note: Note,
    /// Version holding the pre-restore content, when it differed.
    pub snapshot: Option<VersionId>,
}

impl RestoreOutcome {
    pub fn status(&self) -> &'static str {
        "restored"
    }
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "note", rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Active note moved to trash.
    MovedToTrash(Note),
    /// Note was already in trash; nothing changed.
    AlreadyInTrash(Note),
    /// Trashed note removed along with its history.
    Purged(NoteId),
}

impl DeleteOutcome {
    /// Client-facing status string.
    pub fn status(&self) -> &'static str {
        match self {
            Self::MovedToTrash(_) => "moved to trash",
            Self::AlreadyInTrash(_) => "already in trash",
            Self::Purged(_) => "deleted",
        }
    }
}

/// Note lifecycle facade over a transactional store.
pub struct NoteService<S: Store> {
    store: S,
}

impl<S: Store> NoteService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates one active note owned by `actor`.
    pub fn create_note(&mut self, actor: UserId, request: NewNote) -> Result<Note, NoteServiceError> {
        let title = normalize_title(&request.title)?;
        let tags = normalize_tags(&request.tags)?;
        let preview_text = derive_content_preview(&request.content);

        let tx = self.store.begin()?;
        let note_id = tx.notes().insert_note(&NoteInsert {
            id: Uuid::new_v4(),
            owner_id: actor,
            title: &title,
            content: &request.content,
            preview_text: preview_text.as_deref(),
            favorite: request.favorite,
        })?;
        if !tags.is_empty() {
            tx.tags().replace_note_tags(note_id, &tags)?;
        }
        let created = read_back(&tx, note_id, "created note not found in read-back")?;
        tx.commit()?;

        info!("event=note_create module=note_service status=ok note_id={note_id}");
        Ok(created)
    }

    /// Gets one of the actor's notes, trashed or not.
    pub fn get_note(&mut self, actor: UserId, note_id: NoteId) -> Result<Note, NoteServiceError> {
        let tx = self.store.begin()?;
        let note = owned_note(&tx, actor, note_id)?;
        tx.commit()?;
        Ok(note)
    }

    /// Lists the actor's notes through the trash filter.
    pub fn list_notes(
        &mut self,
        actor: UserId,
        query: &NoteListQuery,
    ) -> Result<Vec<Note>, NoteServiceError> {
        let tx = self.store.begin()?;
        let notes = tx.notes().list_notes(actor, query)?;
        tx.commit()?;
        Ok(notes)
    }

    /// Replaces content, snapshotting the old value when it differs.
    pub fn update_note_content(
        &mut self,
        actor: UserId,
        note_id: NoteId,
        content: impl Into<String>,
    ) -> Result<UpdatedNote, NoteServiceError> {
        let content = content.into();
        let tx = self.store.begin()?;
        let note = owned_note(&tx, actor, note_id)?;
        let snapshot = write_content(&tx, &note, &content, actor)?;
        let updated = read_back(&tx, note_id, "updated note not found in read-back")?;
        tx.commit()?;

        info!(
            "event=note_update_content module=note_service status=ok note_id={note_id} snapshot={}",
            snapshot.is_some()
        );
        Ok(UpdatedNote {
            note: updated,
            snapshot,
        })
    }

    /// Applies a partial update in one transaction.
    ///
    /// All inputs are validated before the first write. Content goes through
    /// the same compare-then-snapshot path as `update_note_content`; setting
    /// `deleted` moves the note in or out of trash without snapshotting.
    pub fn update_note(
        &mut self,
        actor: UserId,
        note_id: NoteId,
        update: NoteUpdate,
    ) -> Result<UpdatedNote, NoteServiceError> {
        let title = update.title.as_deref().map(normalize_title).transpose()?;
        let tags = update.tags.as_deref().map(normalize_tags).transpose()?;

        let tx = self.store.begin()?;
        let note = owned_note(&tx, actor, note_id)?;

        let title = title.unwrap_or_else(|| note.title.clone());
        let favorite = update.favorite.unwrap_or(note.favorite);
        let deleted = update.deleted.unwrap_or(note.deleted);
        if title != note.title || favorite != note.favorite || deleted != note.deleted {
            tx.notes()
                .update_note_meta(note_id, &title, favorite, deleted)?;
        }

        if let Some(tags) = tags.as_ref() {
            tx.tags().replace_note_tags(note_id, tags)?;
            tx.notes().touch_note(note_id)?;
        }

        let snapshot = match update.content.as_deref() {
            Some(content) => write_content(&tx, &note, content, actor)?,
            None => None,
        };

        let updated = read_back(&tx, note_id, "updated note not found in read-back")?;
        tx.commit()?;

        info!(
            "event=note_update module=note_service status=ok note_id={note_id} snapshot={} deleted={}",
            snapshot.is_some(),
            updated.deleted
        );
        Ok(UpdatedNote {
            note: updated,
            snapshot,
        })
    }

    /// Replaces the full tag set for one note. Never snapshots.
    pub fn set_note_tags(
        &mut self,
        actor: UserId,
        note_id: NoteId,
        tags: Vec<String>,
    ) -> Result<Note, NoteServiceError> {
        self.update_note(
            actor,
            note_id,
            NoteUpdate {
                tags: Some(tags),
                ..NoteUpdate::default()
            },
        )
        .map(|updated| updated.note)
    }

    /// Moves an active note to trash; a trashed note is left untouched.
    pub fn soft_delete(
        &mut self,
        actor: UserId,
        note_id: NoteId,
    ) -> Result<DeleteOutcome, NoteServiceError> {
        let tx = self.store.begin()?;
        let note = owned_note(&tx, actor, note_id)?;
        if note.deleted {
            tx.commit()?;
            info!("event=note_trash module=note_service status=noop note_id={note_id}");
            return Ok(DeleteOutcome::AlreadyInTrash(note));
        }

        tx.notes().set_note_deleted(note_id, true)?;
        let trashed = read_back(&tx, note_id, "trashed note not found in read-back")?;
        tx.commit()?;

        info!("event=note_trash module=note_service status=ok note_id={note_id}");
        Ok(DeleteOutcome::MovedToTrash(trashed))
    }

    /// Permanently removes a trashed note and its version history.
    pub fn force_delete(
        &mut self,
        actor: UserId,
        note_id: NoteId,
    ) -> Result<DeleteOutcome, NoteServiceError> {
        let tx = self.store.begin()?;
        let note = owned_note(&tx, actor, note_id)?;
        if !note.deleted {
            warn!("event=note_purge module=note_service status=rejected note_id={note_id} reason=not_in_trash");
            return Err(NoteServiceError::NotInTrash(note_id));
        }

        tx.notes().purge_note(note_id)?;
        tx.commit()?;

        info!("event=note_purge module=note_service status=ok note_id={note_id}");
        Ok(DeleteOutcome::Purged(note_id))
    }

    /// Dispatches a delete request on its `force` flag.
    pub fn delete(
        &mut self,
        actor: UserId,
        note_id: NoteId,
        force: bool,
    ) -> Result<DeleteOutcome, NoteServiceError> {
        if force {
            self.force_delete(actor, note_id)
        } else {
            self.soft_delete(actor, note_id)
        }
    }

    /// Lists one note's history, newest first.
    pub fn list_versions(
        &mut self,
        actor: UserId,
        note_id: NoteId,
    ) -> Result<Vec<NoteVersion>, NoteServiceError> {
        let tx = self.store.begin()?;
        owned_note(&tx, actor, note_id)?;
        let versions = tx.versions().list_versions(note_id)?;
        tx.commit()?;
        Ok(versions)
    }

    /// Gets one version of one of the actor's notes.
    pub fn get_version(
        &mut self,
        actor: UserId,
        note_id: NoteId,
        version_id: VersionId,
    ) -> Result<NoteVersion, NoteServiceError> {
        let tx = self.store.begin()?;
        owned_note(&tx, actor, note_id)?;
        let version = tx.versions().get_version(note_id, version_id)?.ok_or(
            NoteServiceError::VersionNotFound {
                note_id,
                version_id,
            },
        )?;
        tx.commit()?;
        Ok(version)
    }

    /// Copies a version's content back onto its note.
    ///
    /// History is never rewritten; the displaced content becomes a new
    /// version when it differs. Trash and favorite flags are untouched.
    pub fn restore_version(
        &mut self,
        actor: UserId,
        note_id: NoteId,
        version_id: VersionId,
    ) -> Result<RestoreOutcome, NoteServiceError> {
        let tx = self.store.begin()?;
        let note = owned_note(&tx, actor, note_id)?;
        let version = tx.versions().get_version(note_id, version_id)?.ok_or(
            NoteServiceError::VersionNotFound {
                note_id,
                version_id,
            },
        )?;
        let snapshot = write_content(&tx, &note, &version.content, actor)?;
        let restored = read_back(&tx, note_id, "restored note not found in read-back")?;
        tx.commit()?;

        info!(
            "event=note_restore module=note_service status=ok note_id={note_id} version_id={version_id} snapshot={}",
            snapshot.is_some()
        );
        Ok(RestoreOutcome {
            note: restored,
            snapshot,
        })
    }

    /// Lists every shared tag.
    pub fn list_tags(&mut self) -> Result<Vec<Tag>, NoteServiceError> {
        let tx = self.store.begin()?;
        let tags = tx.tags().list_tags()?;
        tx.commit()?;
        Ok(tags)
    }

    /// Adds a catalog tag without attaching it to anything.
    pub fn create_tag(&mut self, name: &str) -> Result<Tag, NoteServiceError> {
        let name = validate_tag_name(name)?;
        let tx = self.store.begin()?;
        let tag = tx.tags().create_tag(&name)?;
        tx.commit()?;

        info!("event=tag_create module=note_service status=ok tag_id={}", tag.id);
        Ok(tag)
    }

    /// Renames a catalog tag; every note and snippet carrying it follows.
    ///
    /// Tag changes never touch note content, so no version is recorded.
    pub fn rename_tag(&mut self, tag_id: i64, name: &str) -> Result<Tag, NoteServiceError> {
        let name = validate_tag_name(name)?;
        let tx = self.store.begin()?;
        let tag = tx.tags().rename_tag(tag_id, &name)?;
        tx.commit()?;

        info!("event=tag_rename module=note_service status=ok tag_id={tag_id}");
        Ok(tag)
    }

    /// Removes a catalog tag and detaches it from every note and snippet.
    pub fn delete_tag(&mut self, tag_id: i64) -> Result<(), NoteServiceError> {
        let tx = self.store.begin()?;
        tx.tags().delete_tag(tag_id)?;
        tx.commit()?;

        info!("event=tag_delete module=note_service status=ok tag_id={tag_id}");
        Ok(())
    }
}

fn owned_note<T: StoreTx>(tx: &T, actor: UserId, note_id: NoteId) -> Result<Note, NoteServiceError> {
    OwnershipGuard::new(actor)
        .check_note(&tx.notes(), note_id)?
        .into_visible()
        .ok_or(NoteServiceError::NoteNotFound(note_id))
}

fn read_back<T: StoreTx>(
    tx: &T,
    note_id: NoteId,
    details: &'static str,
) -> Result<Note, NoteServiceError> {
    tx.notes()
        .get_note(note_id)?
        .ok_or(NoteServiceError::InconsistentState(details))
}

/// Compare, snapshot the pre-image, then persist.
fn write_content<T: StoreTx>(
    tx: &T,
    current: &Note,
    new_content: &str,
    actor: UserId,
) -> Result<Option<VersionId>, NoteServiceError> {
    if current.content == new_content {
        return Ok(None);
    }

    let version_id = tx
        .versions()
        .snapshot(current.id, &current.content, Some(actor))?;
    let preview_text = derive_content_preview(new_content);
    tx.notes()
        .write_note_content(current.id, new_content, preview_text.as_deref())?;
    Ok(Some(version_id))
}

/// Derives a plain-text preview from editor content.
///
/// Rules:
/// - HTML tags are dropped and common entities decoded.
/// - Markdown images are dropped, links keep their label, emphasis and
///   heading symbols are removed.
/// - Whitespace is collapsed and the first 100 chars retained.
pub fn derive_content_preview(content: &str) -> Option<String> {
    let without_tags = HTML_TAG_RE.replace_all(content, " ");
    let decoded = HTML_ENTITY_RE.replace_all(&without_tags, |caps: &regex::Captures<'_>| {
        let replacement = match &caps[1] {
            "amp" => "&",
            "lt" => "<",
            "gt" => ">",
            "quot" => "\"",
            "#39" => "'",
            _ => " ",
        };
        replacement.to_string()
    });
    let without_images = MARKDOWN_IMAGE_RE.replace_all(&decoded, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_links, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.chars().take(PREVIEW_MAX_CHARS).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{derive_content_preview, DeleteOutcome, NoteServiceError};
    use crate::service::ErrorKind;
    use uuid::Uuid;

    #[test]
    fn preview_strips_html_markup() {
        let preview = derive_content_preview("<h1>Title</h1><p>Body &amp; more</p>");
        assert_eq!(preview.as_deref(), Some("Title Body & more"));
    }

    #[test]
    fn preview_strips_markdown_symbols_and_limits_length() {
        let source = format!("# title\n\n- [link](https://example.com)\n**bold** `code` {}", "x".repeat(200));
        let text = derive_content_preview(&source).expect("preview should exist");
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
        assert!(text.starts_with("title"));
        assert_eq!(text.chars().count(), 100);
    }

    #[test]
    fn preview_is_none_for_markup_only_content() {
        assert_eq!(derive_content_preview("<p><br></p>"), None);
        assert_eq!(derive_content_preview(""), None);
    }

    #[test]
    fn delete_outcome_status_strings_are_stable() {
        assert_eq!(DeleteOutcome::Purged(Uuid::nil()).status(), "deleted");
    }

    #[test]
    fn not_in_trash_is_a_validation_error() {
        let err = NoteServiceError::NotInTrash(Uuid::nil());
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "Note must be in trash before permanent deletion."
        );
    }
}
