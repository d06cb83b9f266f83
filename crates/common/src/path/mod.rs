// Document naming and workspace-relative path helpers.

pub mod markdown;
pub mod normalize;

pub use markdown::{ensure_markdown_extension, is_markdown_name, MARKDOWN_EXTENSION};
pub use normalize::{join_relative, normalize_document_name, normalize_relative_path, PathError};
