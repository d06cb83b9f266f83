// Directory and file capabilities for the local backend.
//
// A `DirHandle` is only produced through a `FolderPicker` (explicit consent)
// or rebuilt from its persisted surrogate, in which case permission must be
// re-queried before use.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;

use super::LocalError;

/// Live access state of a directory handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

/// Capability over one workspace root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirHandle {
    name: String,
    root: PathBuf,
}

impl DirHandle {
    /// Resolve a user-chosen directory into a handle.
    pub async fn open(path: &Path) -> Result<Self, LocalError> {
        let root = fs::canonicalize(path).await.map_err(|e| LocalError::from_io(path, e))?;
        let metadata = fs::metadata(&root).await.map_err(|e| LocalError::from_io(&root, e))?;
        if !metadata.is_dir() {
            return Err(LocalError::NotADirectory(root));
        }
        Ok(Self { name: display_name(&root), root })
    }

    /// Rebuild a handle from its durable surrogate without validating it.
    pub fn from_persisted(persisted: PersistedDirHandle) -> Self {
        Self { name: persisted.name, root: persisted.root }
    }

    pub fn to_persisted(&self) -> PersistedDirHandle {
        PersistedDirHandle { name: self.name.clone(), root: self.root.clone() }
    }

    /// Root folder name, shown as the workspace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Re-check that the directory is still present and readable.
    pub async fn query_permission(&self) -> PermissionState {
        match fs::metadata(&self.root).await {
            Ok(metadata) if metadata.is_dir() => {}
            _ => return PermissionState::Denied,
        }
        match fs::read_dir(&self.root).await {
            Ok(_) => PermissionState::Granted,
            Err(_) => PermissionState::Denied,
        }
    }
}

fn display_name(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// Durable stand-in for a `DirHandle`, safe to store across restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedDirHandle {
    pub name: String,
    pub root: PathBuf,
}

/// Capability over one document file, held without re-resolving its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full text and the filesystem modification time.
    pub async fn read(&self) -> Result<(String, DateTime<Utc>), LocalError> {
        let content =
            fs::read_to_string(&self.path).await.map_err(|e| LocalError::from_io(&self.path, e))?;
        let metadata = fs::metadata(&self.path).await.map_err(|e| LocalError::from_io(&self.path, e))?;
        let modified = metadata.modified().map(DateTime::<Utc>::from).unwrap_or_else(|_| Utc::now());
        Ok((content, modified))
    }

    /// Replace the file's content as a whole.
    ///
    /// The new bytes land in a sibling swap file that is renamed over the
    /// target, so readers never observe a half-written document. Fails with
    /// `NotFound` when the file was removed since the handle was issued.
    pub async fn overwrite(&self, content: &str) -> Result<(), LocalError> {
        let metadata =
            fs::metadata(&self.path).await.map_err(|e| LocalError::from_io(&self.path, e))?;
        if !metadata.is_file() {
            return Err(LocalError::NotFound(self.path.clone()));
        }

        let swap = self.swap_path();
        if let Err(error) = fs::write(&swap, content).await {
            let _ = fs::remove_file(&swap).await;
            return Err(LocalError::from_io(&self.path, error));
        }
        if let Err(error) = fs::rename(&swap, &self.path).await {
            let _ = fs::remove_file(&swap).await;
            return Err(LocalError::from_io(&self.path, error));
        }
        Ok(())
    }

    fn swap_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{file_name}.cowrite-swap"))
    }
}

/// Picker-style consent request for a workspace folder.
pub trait FolderPicker: Send + Sync {
    /// Whether this environment can grant directory access at all.
    fn is_supported(&self) -> bool;

    /// Ask the user for a folder. `Ok(None)` means the request was cancelled.
    fn pick(&self) -> impl Future<Output = Result<Option<DirHandle>, LocalError>> + Send;
}

/// Picker for a folder the user already named explicitly (e.g. on the command line).
#[derive(Debug, Clone)]
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FolderPicker for PathPicker {
    fn is_supported(&self) -> bool {
        true
    }

    async fn pick(&self) -> Result<Option<DirHandle>, LocalError> {
        DirHandle::open(&self.path).await.map(Some)
    }
}
