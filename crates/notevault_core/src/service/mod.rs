//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Take the acting user as an explicit parameter on every operation.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Every note/snippet operation passes the ownership guard before touching
//!   data.
//! - Multi-step writes run inside one `StoreTx`.

use serde::Serialize;

pub mod note_service;
pub mod ownership;
pub mod snippet_service;

/// Coarse error category used by transport layers to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Absent, purged, or owned by someone else.
    NotFound,
    /// Rejected input or a disallowed lifecycle transition.
    Validation,
    /// Internal reference inconsistency.
    Reference,
    /// Storage transport or corrupted persisted data.
    Storage,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation",
            Self::Reference => "reference",
            Self::Storage => "storage",
        }
    }
}
