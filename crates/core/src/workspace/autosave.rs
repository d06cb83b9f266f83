// Debounced auto-save scheduling.
//
// One pending slot per document. Scheduling again for the same document
// replaces the slot and cancels the previous timer, so only the most recent
// payload can ever be written. A fired timer must claim its slot with
// `take(id, generation)` before writing; a slot that was cancelled or
// superseded in the meantime yields nothing.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;

use cowrite_common::types::DocumentId;

/// Default quiet period after the last edit.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(1000);

struct PendingSave<T> {
    generation: u64,
    payload: T,
    /// Dropping the sender cancels the timer task.
    _cancel: oneshot::Sender<()>,
}

/// Pending auto-save writes keyed by document.
pub struct SaveScheduler<T> {
    pending: HashMap<DocumentId, PendingSave<T>>,
    next_generation: u64,
}

impl<T> Default for SaveScheduler<T> {
    fn default() -> Self {
        Self { pending: HashMap::new(), next_generation: 0 }
    }
}

impl<T> SaveScheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer for `id`.
    ///
    /// `on_fire` receives the slot generation and builds the future that runs
    /// once `delay` elapses without the slot being replaced or cancelled.
    pub fn schedule<F, Fut>(&mut self, id: DocumentId, payload: T, delay: Duration, on_fire: F) -> u64
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.next_generation += 1;
        let generation = self.next_generation;
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let job = on_fire(generation);

        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(delay) => job.await,
                _ = cancel_rx => {}
            }
        });

        self.pending.insert(id, PendingSave { generation, payload, _cancel: cancel_tx });
        generation
    }

    /// Claim the payload of a fired timer. `None` when the slot was
    /// superseded or cancelled after the timer fired.
    pub fn take(&mut self, id: &DocumentId, generation: u64) -> Option<T> {
        match self.pending.get(id) {
            Some(pending) if pending.generation == generation => {
                self.pending.remove(id).map(|pending| pending.payload)
            }
            _ => None,
        }
    }

    /// Cancel the pending write for `id`, returning its payload.
    pub fn cancel(&mut self, id: &DocumentId) -> Option<T> {
        self.pending.remove(id).map(|pending| pending.payload)
    }

    /// Cancel every timer and hand back all pending payloads.
    pub fn drain(&mut self) -> Vec<(DocumentId, T)> {
        self.pending.drain().map(|(id, pending)| (id, pending.payload)).collect()
    }

    pub fn is_pending(&self, id: &DocumentId) -> bool {
        self.pending.contains_key(id)
    }
}
