// The active storage backend behind the workspace façade.

use crate::document::Document;
use crate::error::WorkspaceError;
use crate::local::LocalAdapter;
use crate::remote::{CloudAdapter, RemoteStore};

/// One operation contract over both adapters, selected by workspace kind.
pub enum Backend<R> {
    Local(LocalAdapter),
    Cloud(CloudAdapter<R>),
}

impl<R> Clone for Backend<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Local(adapter) => Self::Local(adapter.clone()),
            Self::Cloud(adapter) => Self::Cloud(adapter.clone()),
        }
    }
}

impl<R: RemoteStore> Backend<R> {
    /// Scan (local) or list (cloud). Cloud documents come back without content.
    pub async fn load(&self) -> Result<Vec<Document>, WorkspaceError> {
        match self {
            Self::Local(adapter) => Ok(adapter.scan().await?),
            Self::Cloud(adapter) => Ok(adapter.list().await?),
        }
    }

    pub async fn create(&self, name: &str, content: &str) -> Result<Document, WorkspaceError> {
        match self {
            Self::Local(adapter) => Ok(adapter.create(name, content).await?),
            Self::Cloud(adapter) => Ok(adapter.create(name, content).await?),
        }
    }

    pub async fn write(&self, document: &Document, content: &str) -> Result<Document, WorkspaceError> {
        match self {
            Self::Local(adapter) => Ok(adapter.write(document, content).await?),
            Self::Cloud(adapter) => Ok(adapter.update(document, content).await?),
        }
    }

    pub async fn delete(&self, document: &Document) -> Result<(), WorkspaceError> {
        match self {
            Self::Local(adapter) => Ok(adapter.delete(document).await?),
            Self::Cloud(adapter) => Ok(adapter.delete(document).await?),
        }
    }

    /// Lazy content fetch. Local content is resident after a scan.
    pub async fn fetch_content(&self, document: &Document) -> Result<String, WorkspaceError> {
        match self {
            Self::Local(_) => Ok(document.content.clone()),
            Self::Cloud(adapter) => {
                let id = document
                    .id
                    .as_remote()
                    .ok_or_else(|| WorkspaceError::UnknownDocument(document.id.clone()))?;
                Ok(adapter.fetch_content(id).await?)
            }
        }
    }
}
