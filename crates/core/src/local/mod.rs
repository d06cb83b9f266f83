// Local filesystem adapter: a consented directory handle as a document collection.
//
// Reads are recursive; creation and deletion are restricted to the workspace
// root. There is no filesystem watch, so external changes only appear after
// a fresh `scan`.

pub mod handle;

use std::io;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

use cowrite_common::path::{is_markdown_name, join_relative, normalize_document_name, PathError};
use cowrite_common::types::DocumentId;

use crate::document::Document;
use crate::error::ErrorKind;

pub use handle::{DirHandle, FileHandle, FolderPicker, PathPicker, PermissionState, PersistedDirHandle};

#[derive(Debug, Error)]
pub enum LocalError {
    #[error("local folder access is not supported in this environment")]
    Unsupported,

    #[error("permission denied for `{}`; select the folder again", .0.display())]
    PermissionDenied(PathBuf),

    #[error("`{}` no longer exists", .0.display())]
    NotFound(PathBuf),

    #[error("`{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("`{0}` is inside a subfolder; only top-level documents can be deleted")]
    NestedEntry(String),

    #[error("document `{0}` has no file handle; rescan the workspace")]
    MissingHandle(String),

    #[error("invalid document name: {0}")]
    InvalidName(#[from] PathError),

    #[error("I/O error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LocalError {
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io { path: path.to_path_buf(), source: error },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unsupported => ErrorKind::Unsupported,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotADirectory(_) | Self::InvalidName(_) => ErrorKind::InvalidInput,
            Self::NestedEntry(_) => ErrorKind::UnsupportedOperation,
            Self::MissingHandle(_) => ErrorKind::InvalidState,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Document operations against one granted workspace root.
#[derive(Debug, Clone)]
pub struct LocalAdapter {
    root: DirHandle,
}

impl LocalAdapter {
    pub fn new(root: DirHandle) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &DirHandle {
        &self.root
    }

    /// Recursively collect every markdown document under the root.
    ///
    /// Ids are `/`-joined paths relative to the root. Emission order follows
    /// directory enumeration and is unspecified. Unreadable files and
    /// subfolders are skipped; an unreadable root fails the scan.
    pub async fn scan(&self) -> Result<Vec<Document>, LocalError> {
        let root = self.root.path();
        let mut documents = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];

        while let Some((dir, relative_dir)) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(error) if dir == root => return Err(LocalError::from_io(&dir, error)),
                Err(error) => {
                    warn!(path = %dir.display(), error = %error, "skipping unreadable folder");
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(error) => {
                        warn!(path = %dir.display(), error = %error, "folder listing interrupted");
                        break;
                    }
                };

                let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                    debug!(path = %entry.path().display(), "skipping non UTF-8 entry name");
                    continue;
                };
                let Ok(file_type) = entry.file_type().await else {
                    continue;
                };
                let relative = join_relative(&relative_dir, &name);

                if file_type.is_dir() {
                    pending.push((entry.path(), relative));
                } else if file_type.is_file() && is_markdown_name(&name) {
                    let handle = FileHandle::new(entry.path());
                    match handle.read().await {
                        Ok((content, last_modified)) => documents.push(Document {
                            id: DocumentId::Local(relative.clone()),
                            name,
                            path: relative,
                            content,
                            last_modified,
                            handle: Some(handle),
                        }),
                        Err(error) => {
                            warn!(path = %relative, error = %error, "skipping unreadable document");
                        }
                    }
                }
            }
        }

        debug!(root = %root.display(), count = documents.len(), "scanned local workspace");
        Ok(documents)
    }

    /// Create (or open and overwrite) a document directly under the root.
    pub async fn create(&self, name: &str, content: &str) -> Result<Document, LocalError> {
        let name = normalize_document_name(name)?;
        let path = self.root.path().join(&name);

        fs::write(&path, content).await.map_err(|e| LocalError::from_io(&path, e))?;

        Ok(Document {
            id: DocumentId::Local(name.clone()),
            path: name.clone(),
            name,
            content: content.to_string(),
            last_modified: Utc::now(),
            handle: Some(FileHandle::new(path)),
        })
    }

    /// Overwrite a document's full content through its handle.
    ///
    /// The returned document's `last_modified` is strictly later than the
    /// input's, even on clocks coarser than the write rate.
    pub async fn write(&self, document: &Document, content: &str) -> Result<Document, LocalError> {
        let handle = document
            .handle
            .as_ref()
            .ok_or_else(|| LocalError::MissingHandle(document.id.to_string()))?;

        handle.overwrite(content).await?;

        let now = Utc::now();
        let last_modified = if now > document.last_modified {
            now
        } else {
            document.last_modified + Duration::microseconds(1)
        };

        Ok(Document { content: content.to_string(), last_modified, ..document.clone() })
    }

    /// Remove a top-level document by name.
    pub async fn delete(&self, document: &Document) -> Result<(), LocalError> {
        if document.path.contains('/') {
            return Err(LocalError::NestedEntry(document.path.clone()));
        }

        let path = self.root.path().join(&document.name);
        fs::remove_file(&path).await.map_err(|e| LocalError::from_io(&path, e))
    }
}
