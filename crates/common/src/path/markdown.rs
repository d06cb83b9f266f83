// Markdown file recognition.

/// Extension (without the dot) of every document a workspace tracks.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Returns true if `name` ends in `.md`, ignoring case.
pub fn is_markdown_name(name: &str) -> bool {
    let suffix_len = MARKDOWN_EXTENSION.len() + 1;
    if name.len() <= suffix_len || !name.is_char_boundary(name.len() - suffix_len) {
        return false;
    }
    let (stem, suffix) = name.split_at(name.len() - suffix_len);
    !stem.is_empty()
        && suffix.starts_with('.')
        && suffix[1..].eq_ignore_ascii_case(MARKDOWN_EXTENSION)
}

/// Append `.md` unless the name already carries it.
pub fn ensure_markdown_extension(name: &str) -> String {
    if is_markdown_name(name) {
        name.to_string()
    } else {
        format!("{name}.{MARKDOWN_EXTENSION}")
    }
}
