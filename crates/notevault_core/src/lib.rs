//! Core domain logic for NoteVault.
//! This crate is the single source of truth for note lifecycle invariants:
//! content version history, trash, and permanent deletion.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{NewNote, Note, NoteId, NoteState, NoteUpdate, UserId};
pub use model::snippet::{CodeSnippet, NewSnippet, SnippetId, SnippetUpdate};
pub use model::tag::Tag;
pub use model::validation::ValidationError;
pub use model::version::{NoteVersion, VersionId};
pub use query::filter::{DeletedFilter, NoteListQuery};
pub use repo::snippet_repo::SnippetListQuery;
pub use repo::store::{SqliteStore, Store, StoreTx};
pub use repo::version_repo::{SqliteVersionStore, VersionStore};
pub use repo::{RepoError, RepoResult};
pub use service::note_service::{
    DeleteOutcome, NoteService, NoteServiceError, RestoreOutcome, UpdatedNote,
};
pub use service::ownership::{Access, OwnershipGuard};
pub use service::snippet_service::{SnippetService, SnippetServiceError};
pub use service::ErrorKind;
