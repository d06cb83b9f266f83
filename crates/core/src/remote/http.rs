// reqwest transport for the cloud notes API.
//
// Credentials are ambient: the client keeps a cookie store, optionally seeded
// with a configured session cookie. No token is round-tripped here.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::cookie::Jar;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use cowrite_common::protocol::cloud::{
    note_path, ApiEnvelope, CloudNote, CreateNoteRequest, CreateNoteResponse, NoteContent,
    UpdateNoteRequest, NOTES_PATH,
};
use cowrite_common::types::DocumentSummary;

use super::{RemoteError, RemoteStore};

/// Longest server error body echoed into an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP client for one cloud store.
#[derive(Debug, Clone)]
pub struct HttpRemoteStore {
    client: Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Build a client for `base_url`.
    ///
    /// `session_cookie` (e.g. `"session=abc"`) is placed in the cookie jar for
    /// the base URL. `timeout` bounds each request; `None` leaves reqwest's default.
    pub fn new(
        base_url: &str,
        session_cookie: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, RemoteError> {
        let parsed = validate_base_url(base_url)?;

        let jar = Jar::default();
        if let Some(cookie) = session_cookie {
            jar.add_cookie_str(cookie, &parsed);
        }

        let mut builder = Client::builder().cookie_provider(Arc::new(jar));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self { client, base_url: parsed.as_str().trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteError> {
        let response = checked(request).await?;
        let status = response.status();
        // Unsuccessful envelopes usually carry `data: null`.
        let envelope: ApiEnvelope<Option<T>> =
            response.json().await.map_err(|e| RemoteError::Decode(e.to_string()))?;
        if !envelope.success {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| "request unsuccessful".to_string()),
            });
        }
        envelope.data.ok_or_else(|| RemoteError::Decode("response envelope has no data".into()))
    }
}

impl RemoteStore for HttpRemoteStore {
    async fn list(&self) -> Result<Vec<DocumentSummary>, RemoteError> {
        let notes: Vec<CloudNote> = self.send_json(self.client.get(self.url(NOTES_PATH))).await?;
        debug!(count = notes.len(), "listed cloud notes");
        Ok(notes.into_iter().map(DocumentSummary::from).collect())
    }

    async fn fetch_content(&self, id: i64) -> Result<String, RemoteError> {
        let body: NoteContent = self.send_json(self.client.get(self.url(&note_path(id)))).await?;
        debug!(note = id, bytes = body.content.len(), "fetched cloud note content");
        Ok(body.content)
    }

    async fn create(&self, name: &str, content: &str) -> Result<DocumentSummary, RemoteError> {
        let request = CreateNoteRequest { name: name.to_string(), content: content.to_string() };
        let created: CreateNoteResponse =
            self.send_json(self.client.post(self.url(NOTES_PATH)).json(&request)).await?;
        Ok(DocumentSummary {
            id: created.note_id,
            name: created.name.unwrap_or_else(|| name.to_string()),
            updated_at: created.updated_at.unwrap_or_else(Utc::now),
            size: content.len() as u64,
        })
    }

    async fn update(&self, id: i64, content: &str) -> Result<(), RemoteError> {
        let request = UpdateNoteRequest { content: content.to_string() };
        checked(self.client.patch(self.url(&note_path(id))).json(&request)).await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), RemoteError> {
        checked(self.client.delete(self.url(&note_path(id)))).await?;
        Ok(())
    }
}

/// Send the request and map non-success statuses onto `RemoteError`.
async fn checked(request: RequestBuilder) -> Result<Response, RemoteError> {
    let response = request.send().await.map_err(|e| RemoteError::Network(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::NOT_FOUND => Err(RemoteError::NotFound),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(RemoteError::Unauthorized { status: status.as_u16() })
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            Err(RemoteError::Status { status: status.as_u16(), message })
        }
    }
}

fn validate_base_url(value: &str) -> Result<Url, RemoteError> {
    let invalid = |reason: String| RemoteError::InvalidUrl { url: value.to_string(), reason };
    let parsed = Url::parse(value).map_err(|error| invalid(error.to_string()))?;
    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if is_loopback_host(parsed.host_str()) => Ok(parsed),
        _ => Err(invalid("must use https (http is allowed only for localhost testing)".into())),
    }
}

fn is_loopback_host(host: Option<&str>) -> bool {
    let Some(host) = host else {
        return false;
    };
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .is_ok_and(|addr| addr.is_loopback())
}
