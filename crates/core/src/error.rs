// Error taxonomy for adapters and the uniform value reported to callers.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cowrite_common::path::PathError;
use cowrite_common::types::{DocumentId, WorkspaceKind};

use crate::local::LocalError;
use crate::remote::RemoteError;
use crate::session::SessionError;

/// Coarse failure categories surfaced to the UI layer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The local capability API is unavailable in this environment.
    Unsupported,
    /// A local handle exists but access was not (re-)granted; re-select the folder.
    PermissionDenied,
    /// The document was removed externally or server-side.
    NotFound,
    /// Read, write, delete, network, or auth failure.
    Io,
    /// A user-supplied name or id was rejected.
    InvalidInput,
    /// The backend cannot perform this operation on this entry.
    UnsupportedOperation,
    /// The workspace is not in a phase that allows the operation.
    InvalidState,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsupported => "unsupported",
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::Io => "io",
            Self::InvalidInput => "invalid_input",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::InvalidState => "invalid_state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform `{kind, message}` every workspace operation reports on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ReportedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

/// Errors raised inside the workspace manager before being reported.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Local(#[from] LocalError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("invalid document name: {0}")]
    InvalidName(#[from] PathError),

    #[error("no workspace is ready")]
    NotReady,

    #[error("operation requires a {expected} workspace")]
    WrongKind { expected: WorkspaceKind },

    #[error("cloud store is not configured")]
    CloudNotConfigured,

    #[error("no document is selected")]
    NoSelection,

    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),

    #[error("save queue stopped before the write completed")]
    WriterStopped,
}

impl WorkspaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Local(error) => error.kind(),
            Self::Remote(error) => error.kind(),
            Self::Session(_) | Self::WriterStopped => ErrorKind::Io,
            Self::InvalidName(_) => ErrorKind::InvalidInput,
            Self::NotReady | Self::WrongKind { .. } | Self::NoSelection => ErrorKind::InvalidState,
            Self::CloudNotConfigured => ErrorKind::Unsupported,
            Self::UnknownDocument(_) => ErrorKind::NotFound,
        }
    }
}

impl From<&WorkspaceError> for ReportedError {
    fn from(error: &WorkspaceError) -> Self {
        Self::new(error.kind(), error.to_string())
    }
}

impl From<WorkspaceError> for ReportedError {
    fn from(error: WorkspaceError) -> Self {
        Self::from(&error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reported_error_display_includes_kind() {
        let error = ReportedError::new(ErrorKind::NotFound, "gone");
        assert_eq!(error.to_string(), "not_found: gone");
    }

    #[test]
    fn workspace_error_kinds() {
        assert_eq!(WorkspaceError::NotReady.kind(), ErrorKind::InvalidState);
        assert_eq!(WorkspaceError::CloudNotConfigured.kind(), ErrorKind::Unsupported);
        assert_eq!(
            WorkspaceError::UnknownDocument(DocumentId::Remote(3)).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(WorkspaceError::from(PathError::Empty).kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn remote_auth_and_network_collapse_to_io() {
        let auth = WorkspaceError::from(RemoteError::Unauthorized { status: 401 });
        assert_eq!(auth.kind(), ErrorKind::Io);
        let missing = WorkspaceError::from(RemoteError::NotFound);
        assert_eq!(missing.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn local_errors_keep_their_kind() {
        let reported = ReportedError::from(WorkspaceError::from(LocalError::Unsupported));
        assert_eq!(reported.kind, ErrorKind::Unsupported);

        let nested = WorkspaceError::from(LocalError::NestedEntry("docs/a.md".into()));
        assert_eq!(nested.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::PermissionDenied).unwrap(),
            "\"permission_denied\""
        );
    }
}
