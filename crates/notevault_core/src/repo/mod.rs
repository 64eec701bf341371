//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//! - Provide a transactional unit (`Store`/`StoreTx`) so multi-step
//!   lifecycle writes commit or roll back together.
//!
//! # Invariants
//! - Repositories never apply ownership rules; callers pass already
//!   authorized ids.
//! - Repository APIs return semantic errors (`NoteNotFound`, `DanglingNote`)
//!   in addition to DB transport errors.

use crate::db::DbError;
use crate::model::note::NoteId;
use crate::model::snippet::SnippetId;
use thiserror::Error;

mod row;
pub mod note_repo;
pub mod snippet_repo;
pub mod store;
pub mod tag_repo;
pub mod version_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("note not found: {0}")]
    NoteNotFound(NoteId),
    #[error("snippet not found: {0}")]
    SnippetNotFound(SnippetId),
    #[error("tag not found: {0}")]
    TagNotFound(i64),
    #[error("tag already exists: {0}")]
    TagExists(String),
    /// A version snapshot referenced a note that no longer exists.
    #[error("cannot record version for missing note {0}")]
    DanglingNote(NoteId),
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
