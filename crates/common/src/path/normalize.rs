// Name and path canonicalization: NFKC normalization, traversal rejection, length caps.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

use super::markdown::ensure_markdown_extension;

/// Maximum allowed relative path length in characters.
const MAX_PATH_CHARS: usize = 512;
/// Maximum allowed file name length in characters (after adding the extension).
const MAX_NAME_CHARS: usize = 255;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("name is empty")]
    Empty,

    #[error("name exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("path contains directory traversal component: {0}")]
    Traversal(String),

    #[error("name contains null byte")]
    NullByte,

    #[error("name contains a path separator; documents are created at the workspace root")]
    Separator,

    #[error("path contains invalid component: {0}")]
    InvalidComponent(String),
}

/// Normalize a user-supplied document name for creation at the workspace root.
///
/// Rules:
/// - Apply Unicode NFKC normalization and trim surrounding whitespace
/// - Reject empty names, null bytes, `.` and `..`
/// - Reject `/` and `\` (creation is flat)
/// - Append `.md` when the extension is missing
/// - Enforce the 255 character limit on the final name
pub fn normalize_document_name(input: &str) -> Result<String, PathError> {
    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let normalized: String = input.nfkc().collect();
    let trimmed = normalized.trim();

    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(PathError::Separator);
    }
    if trimmed == "." || trimmed == ".." {
        return Err(PathError::Traversal(trimmed.to_string()));
    }

    let name = ensure_markdown_extension(trimmed);
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(PathError::TooLong(MAX_NAME_CHARS));
    }

    Ok(name)
}

/// Normalize a workspace-relative document path typed by a user.
///
/// Separators are unified to `/`, empty segments collapse, and leading or
/// trailing slashes are stripped. No Unicode normalization is applied: the
/// result has to match ids derived from real directory entries.
pub fn normalize_relative_path(input: &str) -> Result<String, PathError> {
    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let unified = input.replace('\\', "/");
    let components: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();

    if components.is_empty() {
        return Err(PathError::Empty);
    }

    for component in &components {
        if *component == "." || *component == ".." {
            return Err(PathError::Traversal((*component).to_string()));
        }
        if component.trim().is_empty() {
            return Err(PathError::InvalidComponent(
                "(whitespace-only component)".to_string(),
            ));
        }
    }

    let result = components.join("/");
    if result.chars().count() > MAX_PATH_CHARS {
        return Err(PathError::TooLong(MAX_PATH_CHARS));
    }

    Ok(result)
}

/// Join a child entry name onto a relative parent path (`""` is the root).
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}
