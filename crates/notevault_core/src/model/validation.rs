//! Field validation rules shared by notes, tags and snippets.

use thiserror::Error;

/// Maximum note/snippet title length in characters.
pub const TITLE_MAX_CHARS: usize = 200;
/// Maximum tag name length in characters.
pub const TAG_MAX_CHARS: usize = 50;
/// Maximum snippet language label length in characters.
pub const LANGUAGE_MAX_CHARS: usize = 100;

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be blank")]
    EmptyTitle,
    #[error("title exceeds {max} characters (got {actual})")]
    TitleTooLong { max: usize, actual: usize },
    #[error("invalid tag: `{0}`")]
    EmptyTag(String),
    #[error("tag `{name}` exceeds {max} characters")]
    TagTooLong { name: String, max: usize },
    #[error("language exceeds {max} characters (got {actual})")]
    LanguageTooLong { max: usize, actual: usize },
}

/// Trims and validates a title.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let actual = trimmed.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(ValidationError::TitleTooLong {
            max: TITLE_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_string())
}

/// Trims and validates a snippet language label. Empty is allowed.
pub fn normalize_language(language: &str) -> Result<String, ValidationError> {
    let trimmed = language.trim();
    let actual = trimmed.chars().count();
    if actual > LANGUAGE_MAX_CHARS {
        return Err(ValidationError::LanguageTooLong {
            max: LANGUAGE_MAX_CHARS,
            actual,
        });
    }
    Ok(trimmed.to_ascii_lowercase())
}
