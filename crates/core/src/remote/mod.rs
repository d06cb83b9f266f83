// Remote store adapter: the cloud notes collection behind an HTTP API.
//
// Every call is an independent unit of failure. Content is never fetched
// eagerly for the whole list; callers ask for one document at a time.
// The HTTP transport lives in `http`; the trait keeps the workspace testable.

pub mod http;

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use cowrite_common::path::{normalize_document_name, PathError};
use cowrite_common::types::DocumentSummary;

use crate::document::Document;
use crate::error::ErrorKind;

pub use http::HttpRemoteStore;

/// Errors from the remote store (network or server side).
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("cloud document not found")]
    NotFound,

    #[error("cloud session rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("cloud store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("cloud store unreachable: {0}")]
    Network(String),

    #[error("unexpected cloud response: {0}")]
    Decode(String),

    #[error("invalid cloud base URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid document name: {0}")]
    InvalidName(#[from] PathError),
}

impl RemoteError {
    /// Auth expiry and network blips are deliberately reported alike.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::InvalidUrl { .. } | Self::InvalidName(_) => ErrorKind::InvalidInput,
            Self::Unauthorized { .. }
            | Self::Status { .. }
            | Self::Network(_)
            | Self::Decode(_) => ErrorKind::Io,
        }
    }
}

/// Abstraction over the cloud notes API. Trait-based for testability.
///
/// All methods return `Send` futures so saves can run in spawned tasks.
pub trait RemoteStore: Send + Sync + 'static {
    /// Metadata for every document owned by the current session.
    fn list(&self) -> impl Future<Output = Result<Vec<DocumentSummary>, RemoteError>> + Send;

    /// Full content of exactly one document.
    fn fetch_content(&self, id: i64) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Create a document; the server assigns the id.
    fn create(
        &self,
        name: &str,
        content: &str,
    ) -> impl Future<Output = Result<DocumentSummary, RemoteError>> + Send;

    /// Overwrite a document's full content.
    fn update(&self, id: i64, content: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Remove a document server-side.
    fn delete(&self, id: i64) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

/// Maps the remote contract onto workspace `Document`s.
pub struct CloudAdapter<R> {
    store: Arc<R>,
}

impl<R> Clone for CloudAdapter<R> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store) }
    }
}

impl<R: RemoteStore> CloudAdapter<R> {
    pub fn new(store: Arc<R>) -> Self {
        Self { store }
    }

    /// Summaries only; every returned document has empty content.
    pub async fn list(&self) -> Result<Vec<Document>, RemoteError> {
        let summaries = self.store.list().await?;
        Ok(summaries.into_iter().map(Document::from_summary).collect())
    }

    pub async fn fetch_content(&self, id: i64) -> Result<String, RemoteError> {
        self.store.fetch_content(id).await
    }

    /// Names get the same normalization as local documents before upload.
    pub async fn create(&self, name: &str, content: &str) -> Result<Document, RemoteError> {
        let name = normalize_document_name(name)?;
        let summary = self.store.create(&name, content).await?;
        let mut document = Document::from_summary(summary);
        document.content = content.to_string();
        Ok(document)
    }

    pub async fn update(&self, document: &Document, content: &str) -> Result<Document, RemoteError> {
        let id = remote_id(document)?;
        self.store.update(id, content).await?;
        let now = Utc::now();
        let last_modified = if now > document.last_modified { now } else { document.last_modified };
        Ok(Document { content: content.to_string(), last_modified, ..document.clone() })
    }

    pub async fn delete(&self, document: &Document) -> Result<(), RemoteError> {
        self.store.delete(remote_id(document)?).await
    }
}

fn remote_id(document: &Document) -> Result<i64, RemoteError> {
    document.id.as_remote().ok_or(RemoteError::NotFound)
}
