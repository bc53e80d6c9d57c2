//! Debounced Persistence Bridge.
//!
//! An `EditorSession` owns the live in-memory `Document` for one open editor
//! and coalesces rapid edits into throttled store writes. Trailing-debounce
//! contract: a write is issued at most once per quiescence window after the
//! last change; edits arriving inside the window reset it, and only the
//! latest snapshot is ever written; intermediate states are dropped.
//!
//! The single pending-write slot is the snapshot captured by the armed timer
//! task; re-arming aborts the previous task, so at most one timer exists per
//! session. A write failure surfaces `SaveState::Error` and is not retried;
//! the next state-changing edit re-arms the debounce. `close` (and `Drop`)
//! cancels a pending timer, but an in-flight write that was already
//! dispatched is left to complete.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::document::model::Document;
use crate::document::reducer::{self, Applied, Intent};
use crate::errors::AppError;
use crate::store::{Collection, DocumentStore};

/// The observed quiescence window of the editor.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Save indicator surfaced to the editor UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Saving,
    Saved,
    Error,
}

pub struct EditorSession {
    owner: Uuid,
    collection: Collection,
    store: Arc<dyn DocumentStore>,
    window: Duration,
    doc: Mutex<Document>,
    pending: Mutex<Option<JoinHandle<()>>>,
    save_state: watch::Sender<SaveState>,
}

impl EditorSession {
    pub fn with_window(
        owner: Uuid,
        collection: Collection,
        store: Arc<dyn DocumentStore>,
        doc: Document,
        window: Duration,
    ) -> Arc<Self> {
        let (save_state, _) = watch::channel(SaveState::Saved);
        Arc::new(EditorSession {
            owner,
            collection,
            store,
            window,
            doc: Mutex::new(doc),
            pending: Mutex::new(None),
            save_state,
        })
    }

    pub fn save_state(&self) -> SaveState {
        *self.save_state.borrow()
    }

    pub async fn snapshot(&self) -> Document {
        self.doc.lock().await.clone()
    }

    /// Aligns the live document with a publish or unpublish that went
    /// straight to the store. Does not arm the debounce; the store already
    /// holds this state, and a later debounced write must carry it forward.
    pub async fn set_published(&self, published: bool) {
        self.doc.lock().await.is_published = published;
    }

    /// Runs the reducer against the live document. On a state-changing edit
    /// the debounce is (re)armed with a snapshot of the new state; a no-op
    /// leaves any pending write untouched.
    pub async fn apply(self: &Arc<Self>, intent: &Intent) -> Result<Document, AppError> {
        let snapshot = {
            let mut doc = self.doc.lock().await;
            let applied = reducer::apply(&mut doc, intent, Utc::now().timestamp_millis())?;
            if applied == Applied::Noop {
                return Ok(doc.clone());
            }
            doc.updated_at = Utc::now();
            doc.clone()
        };
        self.arm(snapshot.clone()).await;
        Ok(snapshot)
    }

    /// Arms (or re-arms) the trailing debounce with the given snapshot.
    async fn arm(self: &Arc<Self>, snapshot: Document) {
        let mut pending = self.pending.lock().await;
        if let Some(task) = pending.take() {
            // The window resets: only the latest snapshot survives.
            task.abort();
        }
        self.save_state.send_replace(SaveState::Saving);

        let session = Arc::clone(self);
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(session.window).await;
            let result = session
                .store
                .write_merge(session.owner, session.collection, &snapshot)
                .await;
            match result {
                Ok(()) => {
                    debug!("document {} flushed", snapshot.id);
                    session.save_state.send_replace(SaveState::Saved);
                }
                Err(e) => {
                    // No automatic retry; the next edit re-arms the debounce.
                    warn!("debounced write for {} failed: {e}", snapshot.id);
                    session.save_state.send_replace(SaveState::Error);
                }
            }
        }));
    }

    /// Waits for the currently pending write, if any, to finish. Test and
    /// shutdown hook; user-facing paths never block on storage.
    pub async fn flush(&self) {
        let task = self.pending.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    /// Cancels any pending debounce timer. An already-dispatched write is
    /// not cancelled.
    pub async fn close(&self) {
        let task = self.pending.lock().await.take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        // Navigating away tears the session down; kill a still-armed timer.
        if let Ok(mut pending) = self.pending.try_lock() {
            if let Some(task) = pending.take() {
                task.abort();
            }
        }
    }
}

/// Lazy per-document session registry. A session is created on first touch
/// (loading the document from the store) and evicted on close.
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    window: Duration,
    sessions: Mutex<HashMap<(Uuid, Uuid), Arc<EditorSession>>>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_window(store, DEBOUNCE_WINDOW)
    }

    pub fn with_window(store: Arc<dyn DocumentStore>, window: Duration) -> Self {
        SessionManager {
            store,
            window,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Result<Arc<EditorSession>, AppError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&(owner, id)) {
            return Ok(Arc::clone(session));
        }
        let doc = self
            .store
            .read(owner, collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
        let session =
            EditorSession::with_window(owner, collection, Arc::clone(&self.store), doc, self.window);
        sessions.insert((owner, id), Arc::clone(&session));
        Ok(session)
    }

    /// Returns the open session for the document without creating one. A
    /// session opened under one collection never answers for the other.
    pub async fn peek(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Option<Arc<EditorSession>> {
        self.sessions
            .lock()
            .await
            .get(&(owner, id))
            .filter(|s| s.collection == collection)
            .map(Arc::clone)
    }

    pub async fn close(&self, owner: Uuid, id: Uuid) {
        let session = self.sessions.lock().await.remove(&(owner, id));
        if let Some(session) = session {
            session.close().await;
        }
    }
}
