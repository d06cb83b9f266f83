// The unit of work shared by both storage backends.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cowrite_common::types::{DocumentId, DocumentRef, DocumentSummary};

use crate::local::FileHandle;

/// One markdown document as the workspace currently knows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: DocumentId,
    /// File name including extension.
    pub name: String,
    /// Location relative to the workspace root; remote documents are flat.
    pub path: String,
    /// Full text. Eager for local documents, empty until fetched for remote ones.
    pub content: String,
    /// Last known write, as reported by the backend.
    pub last_modified: DateTime<Utc>,
    /// Local capability for later reads and writes. Never serialized.
    #[serde(skip)]
    pub handle: Option<FileHandle>,
}

impl Document {
    /// Build a content-less document from remote metadata.
    pub fn from_summary(summary: DocumentSummary) -> Self {
        Self {
            id: DocumentId::Remote(summary.id),
            path: summary.name.clone(),
            name: summary.name,
            content: String::new(),
            last_modified: summary.updated_at,
            handle: None,
        }
    }

    /// Plain-value pointer persisted for session restore.
    pub fn to_ref(&self) -> DocumentRef {
        DocumentRef { id: self.id.to_string(), name: self.name.clone(), path: self.path.clone() }
    }
}
