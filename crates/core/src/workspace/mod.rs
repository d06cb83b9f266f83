// Workspace manager: the backend-agnostic façade the editor and navigation
// depend on.
//
// All mutable state sits behind one async mutex owned by the manager.
// Adapter calls run with the lock released; their results are applied by
// document id and dropped when the workspace was switched in the meantime
// (the session epoch changed). Writes go through a single FIFO queue so a
// manual save can never be overtaken by an older auto-save.

mod autosave;
mod backend;
mod status;

pub use autosave::{SaveScheduler, DEFAULT_AUTOSAVE_DELAY};
pub use backend::Backend;
pub use status::{SaveStatus, WorkspacePhase};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot, watch, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use cowrite_common::types::{DocumentId, WorkspaceKind};

use crate::document::Document;
use crate::error::{ReportedError, WorkspaceError};
use crate::local::{DirHandle, FolderPicker, LocalAdapter, LocalError, PermissionState};
use crate::remote::{CloudAdapter, RemoteStore};
use crate::session::{SessionError, SessionStore};

type OpResult<T> = Result<T, ReportedError>;

/// Shared handle to one workspace session. Clones refer to the same state.
pub struct WorkspaceManager<R> {
    inner: Arc<Inner<R>>,
}

impl<R> Clone for WorkspaceManager<R> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct Inner<R> {
    state: Mutex<State<R>>,
    status_tx: watch::Sender<SaveStatus>,
    writes: mpsc::UnboundedSender<WriteRequest<R>>,
    session: Arc<SessionStore>,
    remote: Option<Arc<R>>,
    autosave_delay: Duration,
}

struct State<R> {
    phase: WorkspacePhase,
    backend: Option<Backend<R>>,
    documents: Vec<Document>,
    current: Option<DocumentId>,
    loading: bool,
    /// Documents with edits not yet confirmed written.
    unsaved: HashSet<DocumentId>,
    last_saved: Option<DateTime<Utc>>,
    epoch: u64,
    /// Fetched cloud content by note id.
    content_cache: HashMap<i64, String>,
    /// In-flight lazy fetches; the sender side closes when the fetch is applied.
    fetches: HashMap<DocumentId, watch::Receiver<()>>,
    autosave: SaveScheduler<PendingWrite<R>>,
    write_seq: u64,
    latest_write: HashMap<DocumentId, u64>,
    /// Bumped whenever content is set in memory by an edit, save, or create.
    content_seq: u64,
    /// `content_seq` of the latest local content change per document.
    edited_at: HashMap<DocumentId, u64>,
}

impl<R> State<R> {
    fn new() -> Self {
        Self {
            phase: WorkspacePhase::Unselected,
            backend: None,
            documents: Vec::new(),
            current: None,
            loading: false,
            unsaved: HashSet::new(),
            last_saved: None,
            epoch: 0,
            content_cache: HashMap::new(),
            fetches: HashMap::new(),
            autosave: SaveScheduler::new(),
            write_seq: 0,
            latest_write: HashMap::new(),
            content_seq: 0,
            edited_at: HashMap::new(),
        }
    }

    fn ready(&self) -> Result<(WorkspaceKind, Backend<R>), WorkspaceError> {
        match (self.phase, &self.backend) {
            (WorkspacePhase::Ready(kind), Some(backend)) => Ok((kind, backend.clone())),
            _ => Err(WorkspaceError::NotReady),
        }
    }

    fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.iter().find(|document| &document.id == id)
    }

    fn document_mut(&mut self, id: &DocumentId) -> Option<&mut Document> {
        self.documents.iter_mut().find(|document| &document.id == id)
    }

    /// Insert, or replace the entry with the same id.
    fn upsert(&mut self, document: Document) {
        match self.document_mut(&document.id) {
            Some(existing) => *existing = document,
            None => self.documents.push(document),
        }
    }

    fn record_edit(&mut self, id: &DocumentId) {
        self.content_seq += 1;
        self.edited_at.insert(id.clone(), self.content_seq);
    }

    /// Whether content loaded by a scan, list, or fetch that started at
    /// `since` must yield to what is in memory for `id`.
    fn keeps_local_content(&self, id: &DocumentId, since: u64) -> bool {
        self.unsaved.contains(id)
            || self.latest_write.contains_key(id)
            || self.edited_at.get(id).is_some_and(|&at| at > since)
    }

    /// Swap in a list whose load started at content sequence `since`. Local
    /// edits made or queued after that point, and fetched cloud content,
    /// carry over. Returns true when the selected document no longer exists.
    fn replace_documents(&mut self, mut fresh: Vec<Document>, since: u64) -> bool {
        for document in &mut fresh {
            if self.keeps_local_content(&document.id, since) {
                if let Some(previous) = self.document(&document.id) {
                    document.content = previous.content.clone();
                }
            } else if let Some(content) =
                document.id.as_remote().and_then(|id| self.content_cache.get(&id))
            {
                document.content = content.clone();
            }
        }
        self.documents = fresh;

        match &self.current {
            Some(id) if self.document(id).is_none() => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

/// A write captured by value at schedule time.
struct PendingWrite<R> {
    backend: Backend<R>,
    document: Document,
    content: String,
    epoch: u64,
}

struct WriteRequest<R> {
    backend: Backend<R>,
    document: Document,
    content: String,
    reply: oneshot::Sender<Result<Document, WorkspaceError>>,
}

struct WriteTicket {
    id: DocumentId,
    seq: u64,
    epoch: u64,
    reply: oneshot::Receiver<Result<Document, WorkspaceError>>,
}

impl<R: RemoteStore> WorkspaceManager<R> {
    /// Create an unselected workspace. Must be called within a Tokio runtime.
    ///
    /// `remote` is `None` when no cloud store is configured; choosing the
    /// cloud workspace then fails with `Unsupported`.
    pub fn new(session: Arc<SessionStore>, remote: Option<Arc<R>>, autosave_delay: Duration) -> Self {
        let (writes, requests) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(requests));
        let (status_tx, _) = watch::channel(SaveStatus::Idle);

        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::new()),
                status_tx,
                writes,
                session,
                remote,
                autosave_delay,
            }),
        }
    }

    async fn lock(&self) -> MutexGuard<'_, State<R>> {
        self.inner.state.lock().await
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub async fn phase(&self) -> WorkspacePhase {
        self.lock().await.phase
    }

    /// Root folder name of a local workspace.
    pub async fn workspace_name(&self) -> Option<String> {
        match &self.lock().await.backend {
            Some(Backend::Local(adapter)) => Some(adapter.root().name().to_string()),
            _ => None,
        }
    }

    /// Documents ordered by path for display.
    pub async fn documents(&self) -> Vec<Document> {
        let mut documents = self.lock().await.documents.clone();
        documents.sort_by(|a, b| a.path.cmp(&b.path));
        documents
    }

    pub async fn current_document(&self) -> Option<Document> {
        let state = self.lock().await;
        state.current.as_ref().and_then(|id| state.document(id)).cloned()
    }

    pub async fn is_loading(&self) -> bool {
        let state = self.lock().await;
        state.loading || state.current.as_ref().is_some_and(|id| state.fetches.contains_key(id))
    }

    /// Whether the selected document has edits not yet written.
    pub async fn is_dirty(&self) -> bool {
        let state = self.lock().await;
        state.current.as_ref().is_some_and(|id| state.unsaved.contains(id))
    }

    pub async fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.lock().await.last_saved
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Wait until the selected document's lazy content fetch has been applied.
    pub async fn content_ready(&self) {
        let pending = {
            let state = self.lock().await;
            state.current.as_ref().and_then(|id| state.fetches.get(id).cloned())
        };
        if let Some(mut done) = pending {
            let _ = done.changed().await;
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Pick a storage mode. From any phase but `Unselected` this switches first.
    ///
    /// Local stops at `TypeChosen` until a folder is granted. Cloud lists
    /// immediately and reaches `Ready` whether or not the list succeeds.
    pub async fn choose_workspace(&self, kind: WorkspaceKind) -> OpResult<()> {
        if self.phase().await != WorkspacePhase::Unselected {
            self.switch_workspace().await;
        }

        match kind {
            WorkspaceKind::Local => {
                self.lock().await.phase = WorkspacePhase::TypeChosen(WorkspaceKind::Local);
                self.persist(|session| session.save_workspace_kind(kind));
                info!(kind = %kind, "workspace type chosen");
                Ok(())
            }
            WorkspaceKind::Cloud => {
                let Some(remote) = self.inner.remote.clone() else {
                    return Err(report(WorkspaceError::CloudNotConfigured));
                };
                let backend = Backend::Cloud(CloudAdapter::new(remote));
                let started = {
                    let mut state = self.lock().await;
                    state.phase = WorkspacePhase::TypeChosen(WorkspaceKind::Cloud);
                    state.backend = Some(backend.clone());
                    state.loading = true;
                    (state.epoch, state.content_seq)
                };
                self.persist(|session| session.save_workspace_kind(kind));
                info!(kind = %kind, "workspace type chosen");

                let result = backend.load().await;
                self.finish_initial_load(started, kind, result).await
            }
        }
    }

    /// Ask the user for the local workspace folder. `Ok(false)` when the
    /// request was cancelled. Granting again while ready re-opens the
    /// workspace on the new folder.
    pub async fn grant_local_folder<P: FolderPicker>(&self, picker: &P) -> OpResult<bool> {
        match self.phase().await {
            WorkspacePhase::TypeChosen(WorkspaceKind::Local)
            | WorkspacePhase::Ready(WorkspaceKind::Local) => {}
            WorkspacePhase::Unselected => return Err(report(WorkspaceError::NotReady)),
            _ => {
                return Err(report(WorkspaceError::WrongKind { expected: WorkspaceKind::Local }))
            }
        }
        if !picker.is_supported() {
            return Err(report(LocalError::Unsupported.into()));
        }

        let Some(root) = picker.pick().await.map_err(|error| report(error.into()))? else {
            debug!("folder selection cancelled");
            return Ok(false);
        };

        self.persist(|session| session.save_workspace_handle(&root.to_persisted()));
        self.open_local(root).await?;
        Ok(true)
    }

    /// Tear the session down to `Unselected`. Pending auto-saves are flushed
    /// against the backend they were scheduled for; restore data kept per
    /// backend is left alone.
    pub async fn switch_workspace(&self) {
        let mut state = self.lock().await;
        self.reset(&mut state);
        state.phase = WorkspacePhase::Unselected;
        state.backend = None;
        drop(state);

        self.persist(|session| session.clear_workspace_kind());
        self.publish(SaveStatus::Idle);
        info!("workspace switched");
    }

    /// Rebuild the previous session from persisted state.
    ///
    /// A local folder whose permission is no longer granted leaves the
    /// workspace at `TypeChosen(Local)` and reports `PermissionDenied`. A
    /// saved selection that no longer resolves is dropped silently.
    pub async fn restore(&self) -> OpResult<()> {
        if self.phase().await != WorkspacePhase::Unselected {
            return Ok(());
        }

        let session = &self.inner.session;
        let kind = session.load_workspace_kind().map_err(|error| report(error.into()))?;
        let handle = session.load_workspace_handle().map_err(|error| report(error.into()))?;

        match (kind, handle) {
            (Some(WorkspaceKind::Cloud), _) => {
                if self.inner.remote.is_none() {
                    debug!("cloud store not configured, nothing to restore");
                    return Ok(());
                }
                self.choose_workspace(WorkspaceKind::Cloud).await?;
                self.restore_selection(WorkspaceKind::Cloud).await
            }
            (Some(WorkspaceKind::Local) | None, Some(persisted)) => {
                let root = DirHandle::from_persisted(persisted);
                self.lock().await.phase = WorkspacePhase::TypeChosen(WorkspaceKind::Local);
                self.persist(|session| session.save_workspace_kind(WorkspaceKind::Local));

                if root.query_permission().await == PermissionState::Denied {
                    let reported =
                        report(LocalError::PermissionDenied(root.path().to_path_buf()).into());
                    self.publish(SaveStatus::Error(reported.clone()));
                    return Err(reported);
                }

                info!(root = %root.path().display(), "restoring local workspace");
                self.open_local(root).await?;
                self.restore_selection(WorkspaceKind::Local).await
            }
            (Some(WorkspaceKind::Local), None) => {
                self.lock().await.phase = WorkspacePhase::TypeChosen(WorkspaceKind::Local);
                Ok(())
            }
            (None, None) => Ok(()),
        }
    }

    // ── Document operations ─────────────────────────────────────────────

    /// Change the selection. Cloud content is fetched lazily on first select.
    pub async fn select_document(&self, id: Option<&DocumentId>) -> OpResult<()> {
        let mut state = self.lock().await;
        let (kind, backend) = state.ready().map_err(report)?;

        let Some(id) = id else {
            state.current = None;
            self.forget_selection(kind);
            return Ok(());
        };
        let Some(document) = state.document(id).cloned() else {
            return Err(report(WorkspaceError::UnknownDocument(id.clone())));
        };

        state.current = Some(id.clone());
        self.persist(|session| session.save_selected_document_ref(kind, &document.to_ref()));
        debug!(doc = %id, "document selected");

        if kind == WorkspaceKind::Cloud {
            self.ensure_content(&mut state, backend, document);
        }
        Ok(())
    }

    pub async fn create_document(&self, name: &str) -> OpResult<Document> {
        self.create_document_with_content(name, "").await
    }

    /// Create a document and make it the selection. Creating an existing
    /// local name overwrites it and replaces the list entry.
    pub async fn create_document_with_content(&self, name: &str, content: &str) -> OpResult<Document> {
        let (kind, backend, epoch) = {
            let state = self.lock().await;
            let (kind, backend) = state.ready().map_err(report)?;
            (kind, backend, state.epoch)
        };

        let document = backend.create(name, content).await.map_err(report)?;

        let mut state = self.lock().await;
        if state.epoch != epoch {
            return Ok(document);
        }
        state.autosave.cancel(&document.id);
        state.unsaved.remove(&document.id);
        if let Some(remote) = document.id.as_remote() {
            state.content_cache.insert(remote, document.content.clone());
        }
        state.upsert(document.clone());
        state.record_edit(&document.id);
        state.current = Some(document.id.clone());
        self.persist(|session| session.save_selected_document_ref(kind, &document.to_ref()));
        info!(doc = %document.id, name = %document.name, "document created");
        Ok(document)
    }

    /// Record an edit of the selected document and (re)arm its auto-save.
    /// The write is bound to this document and content.
    pub async fn update_content(&self, content: &str) -> OpResult<()> {
        let mut state = self.lock().await;
        let (_, backend) = state.ready().map_err(report)?;
        let id = state.current.clone().ok_or_else(|| report(WorkspaceError::NoSelection))?;

        let document = {
            let document = state
                .document_mut(&id)
                .ok_or_else(|| report(WorkspaceError::UnknownDocument(id.clone())))?;
            document.content = content.to_string();
            document.clone()
        };
        if let Some(remote) = id.as_remote() {
            state.content_cache.insert(remote, content.to_string());
        }
        state.unsaved.insert(id.clone());
        state.record_edit(&id);

        let write =
            PendingWrite { backend, document, content: content.to_string(), epoch: state.epoch };
        let manager = self.clone();
        let target = id.clone();
        state.autosave.schedule(id, write, self.inner.autosave_delay, move |generation| async move {
            manager.fire_autosave(target, generation).await;
        });
        drop(state);

        self.publish(SaveStatus::Unsaved);
        Ok(())
    }

    /// Write the selected document now, cancelling its pending auto-save.
    pub async fn save_now(&self, content: &str) -> OpResult<Document> {
        let ticket = {
            let mut state = self.lock().await;
            let (_, backend) = state.ready().map_err(report)?;
            let id = state.current.clone().ok_or_else(|| report(WorkspaceError::NoSelection))?;

            state.autosave.cancel(&id);
            let document = {
                let document = state
                    .document_mut(&id)
                    .ok_or_else(|| report(WorkspaceError::UnknownDocument(id.clone())))?;
                document.content = content.to_string();
                document.clone()
            };
            if let Some(remote) = id.as_remote() {
                state.content_cache.insert(remote, content.to_string());
            }
            state.record_edit(&id);
            state.unsaved.insert(id);

            let epoch = state.epoch;
            let write = PendingWrite { backend, document, content: content.to_string(), epoch };
            self.enqueue_write(&mut state, write)
        };

        self.finish_write(ticket).await
    }

    /// Delete a document. Clears the selection when it pointed at it.
    pub async fn delete_document(&self, id: &DocumentId) -> OpResult<()> {
        let (kind, backend, document, epoch) = {
            let state = self.lock().await;
            let (kind, backend) = state.ready().map_err(report)?;
            let document = state
                .document(id)
                .cloned()
                .ok_or_else(|| report(WorkspaceError::UnknownDocument(id.clone())))?;
            (kind, backend, document, state.epoch)
        };

        backend.delete(&document).await.map_err(report)?;

        let mut state = self.lock().await;
        if state.epoch != epoch {
            return Ok(());
        }
        state.autosave.cancel(id);
        state.documents.retain(|document| &document.id != id);
        state.unsaved.remove(id);
        state.latest_write.remove(id);
        state.edited_at.remove(id);
        state.fetches.remove(id);
        if let Some(remote) = id.as_remote() {
            state.content_cache.remove(&remote);
        }
        if state.current.as_ref() == Some(id) {
            state.current = None;
            self.forget_selection(kind);
        }
        info!(doc = %id, "document deleted");
        Ok(())
    }

    /// Reload the document list (local rescan or cloud re-list). The
    /// selection survives unless its document disappeared.
    pub async fn refresh(&self) -> OpResult<()> {
        let (kind, backend, epoch, since) = {
            let mut state = self.lock().await;
            let (kind, backend) = state.ready().map_err(report)?;
            state.loading = true;
            (kind, backend, state.epoch, state.content_seq)
        };

        let result = backend.load().await;

        let mut state = self.lock().await;
        if state.epoch != epoch {
            return Ok(());
        }
        state.loading = false;
        match result {
            Ok(documents) => {
                debug!(count = documents.len(), "document list refreshed");
                if state.replace_documents(documents, since) {
                    self.forget_selection(kind);
                }
                Ok(())
            }
            Err(error) => {
                let reported = report(error);
                self.publish(SaveStatus::Error(reported.clone()));
                Err(reported)
            }
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    async fn open_local(&self, root: DirHandle) -> OpResult<()> {
        let backend: Backend<R> = Backend::Local(LocalAdapter::new(root));
        let started = {
            let mut state = self.lock().await;
            if state.phase.is_ready() {
                self.reset(&mut state);
                self.publish(SaveStatus::Idle);
            }
            state.phase = WorkspacePhase::Ready(WorkspaceKind::Local);
            state.backend = Some(backend.clone());
            state.loading = true;
            (state.epoch, state.content_seq)
        };

        let result = backend.load().await;
        self.finish_initial_load(started, WorkspaceKind::Local, result).await
    }

    /// `started` is the (epoch, content sequence) pair taken when the load began.
    async fn finish_initial_load(
        &self,
        (epoch, since): (u64, u64),
        kind: WorkspaceKind,
        result: Result<Vec<Document>, WorkspaceError>,
    ) -> OpResult<()> {
        let mut state = self.lock().await;
        if state.epoch != epoch {
            return Ok(());
        }
        state.loading = false;
        state.phase = WorkspacePhase::Ready(kind);

        match result {
            Ok(documents) => {
                info!(kind = %kind, count = documents.len(), "workspace ready");
                state.replace_documents(documents, since);
                Ok(())
            }
            Err(error) => {
                state.documents.clear();
                let reported = report(error);
                self.publish(SaveStatus::Error(reported.clone()));
                Err(reported)
            }
        }
    }

    async fn restore_selection(&self, kind: WorkspaceKind) -> OpResult<()> {
        let saved = self
            .inner
            .session
            .load_selected_document_ref(kind)
            .map_err(|error| report(error.into()))?;
        let Some(saved) = saved else {
            return Ok(());
        };

        let matched = {
            let state = self.lock().await;
            state.documents.iter().find(|document| saved.matches(&document.id)).map(|d| d.id.clone())
        };
        match matched {
            Some(id) => self.select_document(Some(&id)).await,
            None => {
                debug!(doc = %saved.id, "saved selection no longer exists");
                self.forget_selection(kind);
                Ok(())
            }
        }
    }

    /// Serve cached cloud content or start a single lazy fetch for it.
    fn ensure_content(&self, state: &mut State<R>, backend: Backend<R>, document: Document) {
        let id = document.id.clone();
        if let Some(content) = id.as_remote().and_then(|remote| state.content_cache.get(&remote)) {
            let content = content.clone();
            if !state.unsaved.contains(&id) {
                if let Some(entry) = state.document_mut(&id) {
                    entry.content = content;
                }
            }
            return;
        }
        if state.fetches.contains_key(&id) {
            return;
        }

        let (done_tx, done_rx) = watch::channel(());
        state.fetches.insert(id.clone(), done_rx);
        let started = (state.epoch, state.content_seq);
        let manager = self.clone();
        tokio::spawn(async move {
            let result = backend.fetch_content(&document).await;
            manager.apply_fetch(id, started, result).await;
            drop(done_tx);
        });
    }

    /// A fetch result loses to any local edit, save, or create of the same
    /// document made after the fetch started.
    async fn apply_fetch(
        &self,
        id: DocumentId,
        (epoch, since): (u64, u64),
        result: Result<String, WorkspaceError>,
    ) {
        let mut state = self.lock().await;
        if state.epoch != epoch {
            return;
        }
        state.fetches.remove(&id);

        match result {
            Ok(content) => {
                debug!(doc = %id, bytes = content.len(), "content fetched");
                if state.keeps_local_content(&id, since) || state.document(&id).is_none() {
                    debug!(doc = %id, "fetched content superseded by a local change");
                    return;
                }
                if let Some(remote) = id.as_remote() {
                    state.content_cache.insert(remote, content.clone());
                }
                if let Some(document) = state.document_mut(&id) {
                    document.content = content;
                }
            }
            Err(error) => {
                let reported = report(error);
                self.publish(SaveStatus::Error(reported));
            }
        }
    }

    async fn fire_autosave(&self, id: DocumentId, generation: u64) {
        let ticket = {
            let mut state = self.lock().await;
            let Some(write) = state.autosave.take(&id, generation) else {
                return;
            };
            self.enqueue_write(&mut state, write)
        };
        let _ = self.finish_write(ticket).await;
    }

    /// Queue a write. Called with the state lock held so queue order matches
    /// the order in which saves were decided.
    fn enqueue_write(&self, state: &mut State<R>, write: PendingWrite<R>) -> WriteTicket {
        state.write_seq += 1;
        let seq = state.write_seq;
        let id = write.document.id.clone();
        state.latest_write.insert(id.clone(), seq);

        let (reply_tx, reply_rx) = oneshot::channel();
        let request = WriteRequest {
            backend: write.backend,
            document: write.document,
            content: write.content,
            reply: reply_tx,
        };
        if self.inner.writes.send(request).is_err() {
            warn!(doc = %id, "save queue closed");
        }
        self.publish(SaveStatus::Saving);

        WriteTicket { id, seq, epoch: write.epoch, reply: reply_rx }
    }

    async fn finish_write(&self, ticket: WriteTicket) -> OpResult<Document> {
        let result = ticket.reply.await.unwrap_or(Err(WorkspaceError::WriterStopped));

        let mut state = self.lock().await;
        let same_session = state.epoch == ticket.epoch;

        match result {
            Ok(saved) => {
                info!(doc = %ticket.id, "document saved");
                if !same_session {
                    return Ok(saved);
                }
                if let Some(document) = state.document_mut(&ticket.id) {
                    if saved.last_modified > document.last_modified {
                        document.last_modified = saved.last_modified;
                    }
                }
                let superseded = state.latest_write.get(&ticket.id) != Some(&ticket.seq)
                    || state.autosave.is_pending(&ticket.id);
                if state.latest_write.get(&ticket.id) == Some(&ticket.seq) {
                    state.latest_write.remove(&ticket.id);
                }

                let at = Utc::now();
                state.last_saved = Some(at);
                if superseded {
                    self.publish(SaveStatus::Unsaved);
                } else {
                    state.unsaved.remove(&ticket.id);
                    self.publish(SaveStatus::Saved { at });
                }
                Ok(saved)
            }
            Err(error) => {
                warn!(doc = %ticket.id, error = %error, "save failed");
                let reported = ReportedError::from(error);
                if same_session {
                    self.publish(SaveStatus::Error(reported.clone()));
                }
                Err(reported)
            }
        }
    }

    /// Flush pending auto-saves and clear all in-memory session state.
    fn reset(&self, state: &mut State<R>) {
        let pending = state.autosave.drain();
        if !pending.is_empty() {
            info!(count = pending.len(), "flushing pending saves");
        }
        for (_, write) in pending {
            // Results are logged by the writer; this session is going away.
            drop(self.enqueue_write(state, write));
        }

        state.epoch += 1;
        state.documents.clear();
        state.current = None;
        state.loading = false;
        state.unsaved.clear();
        state.content_cache.clear();
        state.fetches.clear();
        state.latest_write.clear();
        state.edited_at.clear();
    }

    fn publish(&self, status: SaveStatus) {
        self.inner.status_tx.send_replace(status);
    }

    fn forget_selection(&self, kind: WorkspaceKind) {
        self.persist(|session| session.clear_selected_document_ref(kind));
    }

    /// Session persistence is best effort; a failure never fails the operation.
    fn persist(&self, op: impl FnOnce(&SessionStore) -> Result<(), SessionError>) {
        if let Err(error) = op(&self.inner.session) {
            warn!(error = %error, "failed to persist session state");
        }
    }
}

async fn run_writer<R: RemoteStore>(mut requests: mpsc::UnboundedReceiver<WriteRequest<R>>) {
    while let Some(request) = requests.recv().await {
        let result = request.backend.write(&request.document, &request.content).await;
        if let Err(error) = &result {
            debug!(doc = %request.document.id, error = %error, "write request failed");
        }
        let _ = request.reply.send(result);
    }
    debug!("save queue drained");
}

fn report(error: WorkspaceError) -> ReportedError {
    warn!(kind = %error.kind(), error = %error, "workspace operation failed");
    ReportedError::from(error)
}
