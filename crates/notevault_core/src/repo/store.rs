//! Transactional unit of work over all repositories.
//!
//! # Responsibility
//! - Hand services one transaction exposing every repository, so a
//!   compare-snapshot-write or a purge commits as one unit.
//!
//! # Invariants
//! - Dropping a `StoreTx` without `commit` rolls back every write made
//!   through it.
//! - SQLite transactions are opened `IMMEDIATE`, taking the write lock before
//!   the first read so the compared content cannot change underneath.

use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::snippet_repo::{SnippetRepository, SqliteSnippetRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::version_repo::{SqliteVersionStore, VersionStore};
use crate::repo::RepoResult;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Source of transactions for service-layer use-cases.
pub trait Store {
    type Tx<'a>: StoreTx
    where
        Self: 'a;

    /// Opens a new transaction.
    fn begin(&mut self) -> RepoResult<Self::Tx<'_>>;
}

/// One open transaction with access to every repository.
pub trait StoreTx {
    type Notes<'a>: NoteRepository
    where
        Self: 'a;
    type Versions<'a>: VersionStore
    where
        Self: 'a;
    type Tags<'a>: TagRepository
    where
        Self: 'a;
    type Snippets<'a>: SnippetRepository
    where
        Self: 'a;

    fn notes(&self) -> Self::Notes<'_>;
    fn versions(&self) -> Self::Versions<'_>;
    fn tags(&self) -> Self::Tags<'_>;
    fn snippets(&self) -> Self::Snippets<'_>;

    /// Makes every write in this transaction durable.
    fn commit(self) -> RepoResult<()>;
}

/// SQLite-backed store over one migrated connection.
pub struct SqliteStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteStore<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl Store for SqliteStore<'_> {
    type Tx<'a>
        = SqliteStoreTx<'a>
    where
        Self: 'a;

    fn begin(&mut self) -> RepoResult<Self::Tx<'_>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(SqliteStoreTx { tx })
    }
}

/// Open SQLite transaction.
pub struct SqliteStoreTx<'conn> {
    tx: Transaction<'conn>,
}

impl StoreTx for SqliteStoreTx<'_> {
    type Notes<'a>
        = SqliteNoteRepository<'a>
    where
        Self: 'a;
    type Versions<'a>
        = SqliteVersionStore<'a>
    where
        Self: 'a;
    type Tags<'a>
        = SqliteTagRepository<'a>
    where
        Self: 'a;
    type Snippets<'a>
        = SqliteSnippetRepository<'a>
    where
        Self: 'a;

    fn notes(&self) -> Self::Notes<'_> {
        SqliteNoteRepository::new(&self.tx)
    }

    fn versions(&self) -> Self::Versions<'_> {
        SqliteVersionStore::new(&self.tx)
    }

    fn tags(&self) -> Self::Tags<'_> {
        SqliteTagRepository::new(&self.tx)
    }

    fn snippets(&self) -> Self::Snippets<'_> {
        SqliteSnippetRepository::new(&self.tx)
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}
