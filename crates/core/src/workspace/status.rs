// Observable workspace and save state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cowrite_common::types::WorkspaceKind;

use crate::error::ReportedError;

/// Lifecycle of one workspace session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "kind", rename_all = "snake_case")]
pub enum WorkspacePhase {
    /// No storage mode chosen yet.
    Unselected,
    /// A mode was chosen; Local still needs a granted folder, Cloud is listing.
    TypeChosen(WorkspaceKind),
    /// Documents can be listed, selected and written.
    Ready(WorkspaceKind),
}

impl WorkspacePhase {
    pub fn kind(self) -> Option<WorkspaceKind> {
        match self {
            Self::Unselected => None,
            Self::TypeChosen(kind) | Self::Ready(kind) => Some(kind),
        }
    }

    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Outcome of the most recent save-related operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    Idle,
    Unsaved,
    Saving,
    Saved { at: DateTime<Utc> },
    Error(ReportedError),
}
