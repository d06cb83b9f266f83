// Per-invocation workspace session: config, session database, and manager.

use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cowrite_common::path::{ensure_markdown_extension, normalize_relative_path};
use cowrite_common::types::{DocumentId, WorkspaceKind};
use cowrite_core::config::{global_config_path, GlobalConfig};
use cowrite_core::document::Document;
use cowrite_core::error::{ErrorKind, ReportedError};
use cowrite_core::remote::HttpRemoteStore;
use cowrite_core::session::SessionStore;
use cowrite_core::workspace::{WorkspaceManager, WorkspacePhase};

use crate::output::{self, OutputFormat};

pub type Manager = WorkspaceManager<HttpRemoteStore>;

pub struct Workspace {
    pub config: GlobalConfig,
    pub manager: Manager,
}

/// Read the global config. A missing file means defaults; a broken one is an error.
pub fn load_config() -> anyhow::Result<GlobalConfig> {
    GlobalConfig::load().with_context(|| {
        let path = global_config_path().map(|p| p.display().to_string()).unwrap_or_default();
        format!("failed to read config {path}")
    })
}

impl Workspace {
    /// Build an unselected workspace from `config`. Must run inside a runtime.
    pub fn from_config(config: GlobalConfig) -> anyhow::Result<Self> {
        let db_path = config
            .session_db_path()
            .context("could not determine a home directory for the session database")?;
        let session = SessionStore::open(&db_path)
            .with_context(|| format!("failed to open session database {}", db_path.display()))?;

        let remote = match &config.cloud.base_url {
            Some(base_url) => {
                let store = HttpRemoteStore::new(
                    base_url,
                    config.cloud.session_cookie.as_deref(),
                    config.cloud.timeout(),
                )
                .context("invalid cloud configuration")?;
                Some(Arc::new(store))
            }
            None => None,
        };

        let manager = WorkspaceManager::new(Arc::new(session), remote, config.autosave.delay());
        Ok(Self { config, manager })
    }

    /// Load the config and bring back the previous session.
    ///
    /// A failed restore is only a warning: the command itself reports
    /// whatever it cannot do without a ready workspace.
    pub async fn restored(format: OutputFormat) -> anyhow::Result<Self> {
        let workspace = Self::from_config(load_config()?)?;
        if let Err(error) = workspace.manager.restore().await {
            output::print_warning(format, "RESTORE_FAILED", &error.message);
        }
        Ok(workspace)
    }

    /// Kind of the ready workspace.
    pub async fn ready_kind(&self) -> anyhow::Result<WorkspaceKind> {
        match self.manager.phase().await {
            WorkspacePhase::Ready(kind) => Ok(kind),
            phase => {
                debug!(?phase, "workspace not ready");
                Err(ReportedError::new(ErrorKind::InvalidState, "no workspace is open").into())
            }
        }
    }

    /// Look a document up by id, relative path, or file name.
    pub async fn resolve(&self, query: &str) -> anyhow::Result<Document> {
        let kind = self.ready_kind().await?;
        let documents = self.manager.documents().await;
        find_document(&documents, kind, query).cloned().ok_or_else(|| {
            ReportedError::new(ErrorKind::NotFound, format!("unknown document: {query}")).into()
        })
    }

    pub async fn summary(&self) -> WorkspaceSummary {
        WorkspaceSummary {
            kind: self.manager.phase().await.kind(),
            name: self.manager.workspace_name().await,
            documents: self.manager.documents().await.len(),
        }
    }
}

/// Id match wins over path, path over name.
pub fn find_document<'a>(
    documents: &'a [Document],
    kind: WorkspaceKind,
    query: &str,
) -> Option<&'a Document> {
    if let Some(id) = DocumentId::parse(kind, query) {
        if let Some(document) = documents.iter().find(|d| d.id == id) {
            return Some(document);
        }
    }
    if let Ok(path) = normalize_relative_path(query) {
        if let Some(document) = documents.iter().find(|d| d.path == path) {
            return Some(document);
        }
    }
    let name = ensure_markdown_extension(query.trim());
    documents.iter().find(|d| d.name == query || d.name == name)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceSummary {
    pub kind: Option<WorkspaceKind>,
    pub name: Option<String>,
    pub documents: usize,
}

pub fn format_summary(summary: &WorkspaceSummary) -> String {
    let kind = summary.kind.map(|k| k.as_str()).unwrap_or("none");
    match &summary.name {
        Some(name) => format!("{kind} workspace {name}: {} document(s)", summary.documents),
        None => format!("{kind} workspace: {} document(s)", summary.documents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(id: DocumentId, path: &str) -> Document {
        Document {
            id,
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            content: String::new(),
            last_modified: Utc::now(),
            handle: None,
        }
    }

    #[test]
    fn finds_by_id_path_and_name() {
        let documents = vec![
            doc(DocumentId::Local("docs/guide.md".into()), "docs/guide.md"),
            doc(DocumentId::Local("todo.md".into()), "todo.md"),
        ];

        assert_eq!(find_document(&documents, WorkspaceKind::Local, "docs/guide.md").unwrap().path, "docs/guide.md");
        assert_eq!(find_document(&documents, WorkspaceKind::Local, "docs\\guide.md").unwrap().path, "docs/guide.md");
        assert_eq!(find_document(&documents, WorkspaceKind::Local, "guide.md").unwrap().path, "docs/guide.md");
        assert_eq!(find_document(&documents, WorkspaceKind::Local, "todo").unwrap().path, "todo.md");
        assert!(find_document(&documents, WorkspaceKind::Local, "missing").is_none());
    }

    #[test]
    fn remote_ids_match_before_names() {
        let documents = vec![
            doc(DocumentId::Remote(7), "8.md"),
            doc(DocumentId::Remote(8), "Notes.md"),
        ];
        assert_eq!(find_document(&documents, WorkspaceKind::Cloud, " 8").unwrap().id, DocumentId::Remote(8));
        assert_eq!(find_document(&documents, WorkspaceKind::Cloud, "Notes").unwrap().id, DocumentId::Remote(8));
    }

    #[test]
    fn summary_formats_with_and_without_name() {
        let local = WorkspaceSummary {
            kind: Some(WorkspaceKind::Local),
            name: Some("notes".into()),
            documents: 3,
        };
        assert_eq!(format_summary(&local), "local workspace notes: 3 document(s)");

        let cloud = WorkspaceSummary { kind: Some(WorkspaceKind::Cloud), name: None, documents: 0 };
        assert_eq!(format_summary(&cloud), "cloud workspace: 0 document(s)");
    }
}
