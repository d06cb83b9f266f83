use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use cowrite_common::protocol::cloud::{
    ApiEnvelope, CloudNote, CreateNoteRequest, CreateNoteResponse, NoteContent,
    UpdateNoteRequest, NOTES_PATH,
};
use cowrite_common::types::{DocumentId, WorkspaceKind};
use cowrite_core::error::ErrorKind;
use cowrite_core::remote::{HttpRemoteStore, RemoteError, RemoteStore};
use cowrite_core::session::SessionStore;
use cowrite_core::workspace::{WorkspaceManager, WorkspacePhase};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const SESSION_COOKIE: &str = "session=test-session";

struct StoredNote {
    name: String,
    content: String,
    updated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Notes {
    next_id: i64,
    notes: BTreeMap<i64, StoredNote>,
}

type SharedNotes = Arc<Mutex<Notes>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.split(';').any(|cookie| cookie.trim() == SESSION_COOKIE))
}

async fn list_notes(State(notes): State<SharedNotes>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let notes = notes.lock().unwrap();
    let rows: Vec<CloudNote> = notes
        .notes
        .iter()
        .map(|(id, note)| CloudNote {
            id: *id,
            user_id: 1,
            name: note.name.clone(),
            s3_key: format!("u1/{id}"),
            created_at: note.updated_at,
            updated_at: note.updated_at,
            size: note.content.len() as u64,
            tags: String::new(),
        })
        .collect();
    Json(ApiEnvelope::ok(rows)).into_response()
}

async fn create_note(
    State(notes): State<SharedNotes>,
    headers: HeaderMap,
    Json(body): Json<CreateNoteRequest>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut notes = notes.lock().unwrap();
    notes.next_id += 1;
    let id = notes.next_id;
    notes.notes.insert(
        id,
        StoredNote { name: body.name, content: body.content, updated_at: Utc::now() },
    );
    Json(ApiEnvelope::ok(CreateNoteResponse { note_id: id, name: None, updated_at: None }))
        .into_response()
}

async fn fetch_note(
    State(notes): State<SharedNotes>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let notes = notes.lock().unwrap();
    match notes.notes.get(&id) {
        Some(note) => {
            Json(ApiEnvelope::ok(NoteContent { content: note.content.clone() })).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update_note(
    State(notes): State<SharedNotes>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateNoteRequest>,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let mut notes = notes.lock().unwrap();
    match notes.notes.get_mut(&id) {
        Some(note) => {
            note.content = body.content;
            note.updated_at = Utc::now();
            Json(ApiEnvelope::ok(serde_json::Value::Null)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn delete_note(
    State(notes): State<SharedNotes>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match notes.lock().unwrap().notes.remove(&id) {
        Some(_) => Json(ApiEnvelope::ok(serde_json::Value::Null)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn notes_router(notes: SharedNotes) -> Router {
    Router::new()
        .route(NOTES_PATH, get(list_notes).post(create_note))
        .route("/api/cloud/notes/{id}", get(fetch_note).patch(update_note).delete(delete_note))
        .with_state(notes)
}

async fn serve(router: Router) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("listener should bind");
    let addr = listener.local_addr().expect("listener should expose local address");
    let task = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock cloud server should run");
    });
    (format!("http://{addr}"), task)
}

fn seeded(entries: &[(&str, &str)]) -> SharedNotes {
    let mut notes = Notes::default();
    for (name, content) in entries {
        notes.next_id += 1;
        let id = notes.next_id;
        notes.notes.insert(
            id,
            StoredNote { name: name.to_string(), content: content.to_string(), updated_at: Utc::now() },
        );
    }
    Arc::new(Mutex::new(notes))
}

fn client(base: &str) -> HttpRemoteStore {
    HttpRemoteStore::new(base, Some(SESSION_COOKIE), Some(Duration::from_secs(5)))
        .expect("client should build")
}

#[tokio::test]
async fn crud_round_trip_over_http() {
    let notes = seeded(&[("Notes.md", "# Server copy")]);
    let (base, task) = serve(notes_router(notes.clone())).await;
    let store = client(&base);

    let listed = store.list().await.expect("list should succeed");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);
    assert_eq!(listed[0].name, "Notes.md");
    assert_eq!(listed[0].size, "# Server copy".len() as u64);

    assert_eq!(store.fetch_content(1).await.unwrap(), "# Server copy");

    let created = store.create("Todo.md", "- [ ] ship").await.expect("create should succeed");
    assert_eq!(created.id, 2);
    assert_eq!(created.name, "Todo.md");

    store.update(2, "- [x] ship").await.expect("update should succeed");
    assert_eq!(store.fetch_content(2).await.unwrap(), "- [x] ship");

    store.delete(1).await.expect("delete should succeed");
    let remaining: Vec<i64> = store.list().await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(remaining, vec![2]);

    task.abort();
    let _ = task.await;
}

#[tokio::test]
async fn missing_session_cookie_is_unauthorized_and_reports_io() {
    let (base, task) = serve(notes_router(seeded(&[]))).await;
    let store = HttpRemoteStore::new(&base, None, None).unwrap();

    let error = store.list().await.expect_err("list without a session should fail");
    assert!(matches!(error, RemoteError::Unauthorized { status: 401 }));
    assert_eq!(error.kind(), ErrorKind::Io);

    task.abort();
    let _ = task.await;
}

#[tokio::test]
async fn missing_note_is_not_found() {
    let (base, task) = serve(notes_router(seeded(&[]))).await;
    let store = client(&base);

    let error = store.fetch_content(99).await.unwrap_err();
    assert!(matches!(error, RemoteError::NotFound));
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert!(matches!(store.delete(99).await, Err(RemoteError::NotFound)));

    task.abort();
    let _ = task.await;
}

#[tokio::test]
async fn server_errors_and_bad_payloads_are_distinguished() {
    let router = Router::new()
        .route(
            NOTES_PATH,
            get(|| async { (StatusCode::OK, "definitely not json") })
                .post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable") }),
        )
        .route(
            "/api/cloud/notes/{id}",
            get(|| async {
                Json(serde_json::json!({ "data": null, "success": false, "message": "quota exceeded" }))
            }),
        );
    let (base, task) = serve(router).await;
    let store = client(&base);

    assert!(matches!(store.list().await, Err(RemoteError::Decode(_))));

    match store.create("a.md", "").await {
        Err(RemoteError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    match store.fetch_content(1).await {
        Err(RemoteError::Status { message, .. }) => assert_eq!(message, "quota exceeded"),
        other => panic!("expected unsuccessful envelope, got {other:?}"),
    }

    task.abort();
    let _ = task.await;
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let store = client(&format!("http://{addr}"));
    let error = store.list().await.unwrap_err();
    assert!(matches!(error, RemoteError::Network(_)));
    assert_eq!(error.kind(), ErrorKind::Io);
}

#[tokio::test]
async fn cloud_workspace_round_trip_over_http() {
    let notes = seeded(&[("Notes.md", "# Server copy")]);
    let (base, task) = serve(notes_router(notes.clone())).await;

    let session = Arc::new(SessionStore::in_memory().unwrap());
    let manager = WorkspaceManager::new(
        Arc::clone(&session),
        Some(Arc::new(client(&base))),
        Duration::from_millis(50),
    );

    manager.choose_workspace(WorkspaceKind::Cloud).await.expect("cloud workspace should open");
    assert_eq!(manager.phase().await, WorkspacePhase::Ready(WorkspaceKind::Cloud));
    let listed = manager.documents().await;
    assert_eq!(listed.len(), 1);
    assert!(listed[0].content.is_empty());

    let id = DocumentId::Remote(1);
    manager.select_document(Some(&id)).await.unwrap();
    manager.content_ready().await;
    assert_eq!(manager.current_document().await.unwrap().content, "# Server copy");

    manager.save_now("# Edited").await.expect("save should succeed");
    assert_eq!(notes.lock().unwrap().notes[&1].content, "# Edited");

    let created = manager.create_document_with_content("Todo", "- [ ] ship").await.unwrap();
    assert_eq!(created.name, "Todo.md");
    assert_eq!(created.id, DocumentId::Remote(2));
    assert_eq!(manager.current_document().await.unwrap().id, created.id);

    manager.delete_document(&created.id).await.unwrap();
    assert!(manager.current_document().await.is_none());
    assert!(!notes.lock().unwrap().notes.contains_key(&2));

    task.abort();
    let _ = task.await;
}
