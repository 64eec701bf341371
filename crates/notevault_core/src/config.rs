//! Runtime configuration for embedding the core.
//!
//! # Responsibility
//! - Describe where the database lives and how logging is set up.
//! - Turn that description into a ready connection and active logger.
//!
//! # Invariants
//! - A missing `db_path` means an in-memory database.
//! - A missing `log_dir` leaves logging uninitialized; `log` macros are no-ops.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, init_logging, LoggingError};
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;

/// Core runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: Option<PathBuf>,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Starts file logging when a directory is configured.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        let Some(dir) = self.log_dir.as_ref() else {
            return Ok(false);
        };
        init_logging(&self.log_level, &dir.to_string_lossy())?;
        Ok(true)
    }

    /// Opens and migrates the configured database.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match self.db_path.as_ref() {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}
