// Persistent session store: what survives a restart.
//
// Two kinds of data live here. The local directory surrogate is a structured
// row in `workspace_handles`; everything else is plain string-keyed storage
// in `kv`. A missing or unreadable entry always means "nothing to restore".

mod db;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::warn;

use cowrite_common::types::{DocumentRef, WorkspaceKind};

use crate::local::PersistedDirHandle;

pub use db::SessionDb;

/// Slot under which the local workspace directory is recorded.
pub const WORKSPACE_HANDLE_SLOT: &str = "cowrite-workspace-handle";
/// Prefix of the per-backend selected document key.
pub const CURRENT_FILE_KEY: &str = "cowrite-current-file";
/// Key holding the most recently chosen workspace kind.
pub const WORKSPACE_KIND_KEY: &str = "cowrite-workspace-kind";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error("session store lock poisoned")]
    Poisoned,
}

type Result<T> = std::result::Result<T, SessionError>;

/// Durable per-user session state backed by SQLite.
#[derive(Debug)]
pub struct SessionStore {
    db: Mutex<SessionDb>,
}

impl SessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self { db: Mutex::new(SessionDb::open(path)?) })
    }

    /// Store that forgets everything on drop.
    pub fn in_memory() -> Result<Self> {
        Ok(Self { db: Mutex::new(SessionDb::open_in_memory()?) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionDb>> {
        self.db.lock().map_err(|_| SessionError::Poisoned)
    }

    // ── Workspace directory ─────────────────────────────────────────────

    pub fn save_workspace_handle(&self, handle: &PersistedDirHandle) -> Result<()> {
        let db = self.lock()?;
        db.connection()
            .execute(
                "INSERT INTO workspace_handles (slot, name, root_path, saved_at)
                 VALUES (?1, ?2, ?3, datetime('now'))
                 ON CONFLICT(slot) DO UPDATE SET
                    name = excluded.name,
                    root_path = excluded.root_path,
                    saved_at = excluded.saved_at",
                params![WORKSPACE_HANDLE_SLOT, handle.name, handle.root.to_string_lossy()],
            )
            .context("failed to save workspace handle")?;
        Ok(())
    }

    pub fn load_workspace_handle(&self) -> Result<Option<PersistedDirHandle>> {
        let db = self.lock()?;
        let row = db
            .connection()
            .query_row(
                "SELECT name, root_path FROM workspace_handles WHERE slot = ?1",
                [WORKSPACE_HANDLE_SLOT],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()
            .context("failed to load workspace handle")?;

        Ok(row.map(|(name, root)| PersistedDirHandle { name, root: PathBuf::from(root) }))
    }

    // ── Selected document ───────────────────────────────────────────────

    pub fn save_selected_document_ref(&self, kind: WorkspaceKind, reference: &DocumentRef) -> Result<()> {
        let value = serde_json::to_string(reference).context("failed to encode document ref")?;
        let db = self.lock()?;
        put(db.connection(), &current_file_key(kind), &value)
    }

    /// Last selected document for `kind`. A malformed entry is removed and
    /// treated as absent.
    pub fn load_selected_document_ref(&self, kind: WorkspaceKind) -> Result<Option<DocumentRef>> {
        let key = current_file_key(kind);
        let db = self.lock()?;
        let Some(raw) = get(db.connection(), &key)? else {
            return Ok(None);
        };

        match serde_json::from_str::<DocumentRef>(&raw) {
            Ok(reference) => Ok(Some(reference)),
            Err(error) => {
                warn!(key = %key, error = %error, "dropping malformed document ref");
                remove(db.connection(), &key)?;
                Ok(None)
            }
        }
    }

    pub fn clear_selected_document_ref(&self, kind: WorkspaceKind) -> Result<()> {
        let db = self.lock()?;
        remove(db.connection(), &current_file_key(kind))
    }

    // ── Workspace kind ──────────────────────────────────────────────────

    pub fn save_workspace_kind(&self, kind: WorkspaceKind) -> Result<()> {
        let db = self.lock()?;
        put(db.connection(), WORKSPACE_KIND_KEY, kind.as_str())
    }

    pub fn load_workspace_kind(&self) -> Result<Option<WorkspaceKind>> {
        let db = self.lock()?;
        let raw = get(db.connection(), WORKSPACE_KIND_KEY)?;
        Ok(raw.as_deref().and_then(WorkspaceKind::parse))
    }

    pub fn clear_workspace_kind(&self) -> Result<()> {
        let db = self.lock()?;
        remove(db.connection(), WORKSPACE_KIND_KEY)
    }
}

fn current_file_key(kind: WorkspaceKind) -> String {
    format!("{CURRENT_FILE_KEY}:{kind}")
}

fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .with_context(|| format!("failed to read `{key}`"))?;
    Ok(value)
}

fn put(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .with_context(|| format!("failed to write `{key}`"))?;
    Ok(())
}

fn remove(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM kv WHERE key = ?1", [key])
        .with_context(|| format!("failed to remove `{key}`"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc_ref(id: &str) -> DocumentRef {
        DocumentRef { id: id.into(), name: id.into(), path: id.into() }
    }

    #[test]
    fn workspace_handle_round_trips_and_is_replaced() {
        let store = SessionStore::in_memory().unwrap();
        assert!(store.load_workspace_handle().unwrap().is_none());

        let handle = PersistedDirHandle { name: "notes".into(), root: PathBuf::from("/tmp/notes") };
        store.save_workspace_handle(&handle).unwrap();
        assert_eq!(store.load_workspace_handle().unwrap(), Some(handle));

        let moved = PersistedDirHandle { name: "other".into(), root: PathBuf::from("/srv/other") };
        store.save_workspace_handle(&moved).unwrap();
        assert_eq!(store.load_workspace_handle().unwrap(), Some(moved));
    }

    #[test]
    fn selected_refs_are_scoped_per_kind() {
        let store = SessionStore::in_memory().unwrap();
        store.save_selected_document_ref(WorkspaceKind::Local, &doc_ref("a.md")).unwrap();
        store.save_selected_document_ref(WorkspaceKind::Cloud, &doc_ref("42")).unwrap();

        store.clear_selected_document_ref(WorkspaceKind::Cloud).unwrap();

        assert_eq!(
            store.load_selected_document_ref(WorkspaceKind::Local).unwrap(),
            Some(doc_ref("a.md"))
        );
        assert!(store.load_selected_document_ref(WorkspaceKind::Cloud).unwrap().is_none());
    }

    #[test]
    fn malformed_ref_is_dropped() {
        let store = SessionStore::in_memory().unwrap();
        {
            let db = store.lock().unwrap();
            put(db.connection(), "cowrite-current-file:local", "{not json").unwrap();
        }

        assert!(store.load_selected_document_ref(WorkspaceKind::Local).unwrap().is_none());
        let db = store.lock().unwrap();
        assert!(get(db.connection(), "cowrite-current-file:local").unwrap().is_none());
    }

    #[test]
    fn workspace_kind_round_trips() {
        let store = SessionStore::in_memory().unwrap();
        assert!(store.load_workspace_kind().unwrap().is_none());
        store.save_workspace_kind(WorkspaceKind::Cloud).unwrap();
        assert_eq!(store.load_workspace_kind().unwrap(), Some(WorkspaceKind::Cloud));
        store.clear_workspace_kind().unwrap();
        assert!(store.load_workspace_kind().unwrap().is_none());
    }

    #[test]
    fn state_survives_reopening_the_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.db");
        {
            let store = SessionStore::open(&path).unwrap();
            store.save_workspace_kind(WorkspaceKind::Local).unwrap();
            store.save_selected_document_ref(WorkspaceKind::Local, &doc_ref("docs/b.md")).unwrap();
        }

        let reopened = SessionStore::open(&path).unwrap();
        assert_eq!(reopened.load_workspace_kind().unwrap(), Some(WorkspaceKind::Local));
        assert_eq!(
            reopened.load_selected_document_ref(WorkspaceKind::Local).unwrap(),
            Some(doc_ref("docs/b.md"))
        );
    }
}
