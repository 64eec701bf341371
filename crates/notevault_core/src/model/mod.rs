//! Domain model for notes, their version history, tags and code snippets.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-level validation shared by repositories and services.
//!
//! # Invariants
//! - Every record is identified by a stable UUID (tags use integer ids).
//! - Note deletion is a soft-delete flag first; physical removal only happens
//!   from the trash.

pub mod note;
pub mod snippet;
pub mod tag;
pub mod validation;
pub mod version;
