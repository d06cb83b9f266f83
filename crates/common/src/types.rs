// Core domain types shared across all CoWrite crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Which storage backend a workspace session is bound to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceKind {
    /// A directory on the local filesystem, reached through a consented handle.
    Local,
    /// The hosted document collection behind the cloud REST API.
    Cloud,
}

impl WorkspaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Cloud => "cloud",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "local" => Some(Self::Local),
            "cloud" => Some(Self::Cloud),
            _ => None,
        }
    }
}

impl fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a document, unique within one workspace.
///
/// Local documents are keyed by their `/`-joined path relative to the
/// workspace root; remote documents by the numeric id the store assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DocumentId {
    Local(String),
    Remote(i64),
}

impl DocumentId {
    pub fn as_remote(&self) -> Option<i64> {
        match self {
            Self::Remote(id) => Some(*id),
            Self::Local(_) => None,
        }
    }

    /// Parse the user-facing string form for a workspace of the given kind.
    pub fn parse(kind: WorkspaceKind, value: &str) -> Option<Self> {
        match kind {
            WorkspaceKind::Local if !value.is_empty() => Some(Self::Local(value.to_string())),
            WorkspaceKind::Local => None,
            WorkspaceKind::Cloud => value.trim().parse().ok().map(Self::Remote),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => f.write_str(path),
            Self::Remote(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Minimal plain-value pointer to the last-open document.
///
/// Persisted across reloads and matched by `id` against a freshly loaded
/// document list, never by object identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: String,
    pub name: String,
    pub path: String,
}

impl DocumentRef {
    pub fn matches(&self, id: &DocumentId) -> bool {
        self.id == id.to_string()
    }
}

/// Remote document metadata, without content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: i64,
    pub name: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
}
