//! Shared tag model.
//!
//! Tags are global: one row per unique (case-insensitive) name, linked
//! many-to-many to notes and snippets. No ownership is tracked.

use super::validation::{ValidationError, TAG_MAX_CHARS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One shared tag row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    /// Lowercase, trimmed, unique.
    pub name: String,
}

/// Normalizes one tag value, or `None` when blank.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Validates, normalizes and deduplicates a full tag set.
///
/// Output is sorted by name. Any blank or over-long entry rejects the whole
/// set, so a partial replacement never reaches storage.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        unique.insert(validate_tag_name(tag)?);
    }
    Ok(unique.into_iter().collect())
}

/// Normalizes one catalog name, rejecting blank and over-long values.
pub fn validate_tag_name(tag: &str) -> Result<String, ValidationError> {
    let Some(value) = normalize_tag(tag) else {
        return Err(ValidationError::EmptyTag(tag.to_string()));
    };
    if value.chars().count() > TAG_MAX_CHARS {
        return Err(ValidationError::TagTooLong {
            name: value,
            max: TAG_MAX_CHARS,
        });
    }
    Ok(value)
}
