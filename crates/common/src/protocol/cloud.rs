// Cloud notes REST API: paths, envelope, and payload types.
//
// Every response body is wrapped in `{ "data": T, "success": bool, "message"?: string }`.
// Field names on the wire are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::DocumentSummary;

/// Collection endpoint: `GET` lists, `POST` creates.
pub const NOTES_PATH: &str = "/api/cloud/notes";

/// Item endpoint: `GET` fetches content, `PATCH` overwrites content, `DELETE` removes.
pub fn note_path(id: i64) -> String {
    format!("{NOTES_PATH}/{id}")
}

/// Standard response envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self { data, success: true, message: None }
    }
}

/// Metadata row returned by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudNote {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    pub name: String,
    #[serde(default)]
    pub s3_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub tags: String,
}

impl From<CloudNote> for DocumentSummary {
    fn from(note: CloudNote) -> Self {
        Self { id: note.id, name: note.name, updated_at: note.updated_at, size: note.size }
    }
}

/// Body of the single-note content endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteContent {
    pub content: String,
}

/// `POST /api/cloud/notes` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateNoteRequest {
    pub name: String,
    pub content: String,
}

/// `POST /api/cloud/notes` response. Only the id is guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteResponse {
    pub note_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// `PATCH /api/cloud/notes/{id}` request: full-content overwrite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateNoteRequest {
    pub content: String,
}
