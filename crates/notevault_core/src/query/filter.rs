//! Trash filter and list query options.
//!
//! # Invariants
//! - `DeletedFilter::Only` never yields an active note.
//! - `DeletedFilter::Exclude` never yields a trashed note.
//! - `DeletedFilter::Any` yields both; this is the contract when the client
//!   omits the parameter, not "hide trash".
//! - Lists are ordered by `updated_at DESC, id ASC`.
//! - A query without a limit returns every matching note; only an explicit
//!   page size is clamped.

use serde::{Deserialize, Serialize};

const NOTES_LIMIT_MAX: u32 = 200;

/// Tri-state filter over the soft-delete flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletedFilter {
    /// Parameter absent: active and trashed notes.
    #[default]
    Any,
    /// `deleted=true`: trashed notes only.
    Only,
    /// `deleted=false`: active notes only.
    Exclude,
}

impl DeletedFilter {
    /// Parses a raw query-string value.
    ///
    /// Only `true`/`false` (case-insensitive) narrow the result; anything else,
    /// including a missing value, falls back to `Any`.
    pub fn parse_param(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("true") => Self::Only,
            Some("false") => Self::Exclude,
            _ => Self::Any,
        }
    }

    /// SQL predicate fragment appended to a `WHERE` clause, if any.
    pub(crate) fn sql_predicate(self) -> Option<&'static str> {
        match self {
            Self::Any => None,
            Self::Only => Some(" AND deleted = 1"),
            Self::Exclude => Some(" AND deleted = 0"),
        }
    }
}

/// List options accepted from callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteListQuery {
    pub deleted: DeletedFilter,
    /// Optional single-tag exact match (case-insensitive).
    pub tag: Option<String>,
    /// Page size, clamped to 200. `None` (or `0`) lists everything.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

impl NoteListQuery {
    pub fn with_deleted(deleted: DeletedFilter) -> Self {
        Self {
            deleted,
            ..Self::default()
        }
    }
}

/// Resolves the effective page size; `None` means unbounded.
pub fn normalize_note_limit(limit: Option<u32>) -> Option<u32> {
    match limit {
        Some(0) | None => None,
        Some(value) => Some(value.min(NOTES_LIMIT_MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_param_accepts_case_insensitive_booleans() {
        assert_eq!(DeletedFilter::parse_param(Some("TRUE")), DeletedFilter::Only);
        assert_eq!(DeletedFilter::parse_param(Some(" false ")), DeletedFilter::Exclude);
    }

    #[test]
    fn parse_param_falls_back_to_any() {
        assert_eq!(DeletedFilter::parse_param(None), DeletedFilter::Any);
        assert_eq!(DeletedFilter::parse_param(Some("1")), DeletedFilter::Any);
        assert_eq!(DeletedFilter::parse_param(Some("")), DeletedFilter::Any);
    }

    #[test]
    fn sql_predicate_narrows_only_when_requested() {
        assert_eq!(DeletedFilter::Any.sql_predicate(), None);
        assert_eq!(DeletedFilter::Only.sql_predicate(), Some(" AND deleted = 1"));
        assert_eq!(DeletedFilter::Exclude.sql_predicate(), Some(" AND deleted = 0"));
    }

    #[test]
    fn missing_limit_is_unbounded_and_explicit_limit_clamps() {
        assert_eq!(normalize_note_limit(None), None);
        assert_eq!(normalize_note_limit(Some(0)), None);
        assert_eq!(normalize_note_limit(Some(7)), Some(7));
        assert_eq!(normalize_note_limit(Some(10_000)), Some(200));
    }
}
