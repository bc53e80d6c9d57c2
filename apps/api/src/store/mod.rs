//! Document Store boundary.
//!
//! Private copies are addressed by `(owner, collection, document id)`;
//! published mirrors by document id alone. Writes are whole-document upserts
//! (last-writer-wins at document granularity, the store never merges), and
//! every successful write is echoed on the document's broadcast channel.
//! Subscribers must treat the echo as authoritative.

pub mod memory;
pub mod postgres;

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::document::model::Document;
use crate::errors::AppError;

/// Private per-user collection a document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Resumes,
    Portfolios,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Resumes => "resumes",
            Collection::Portfolios => "portfolios",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Push-update echoed to subscribers after a successful write or delete.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// The document was written; the payload is the authoritative snapshot.
    Updated(Document),
    Deleted(Uuid),
}

/// A published mirror as seen by a public viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedDocument {
    pub document: Document,
    pub owner_id: Uuid,
    pub view_count: i64,
    pub published_at: DateTime<Utc>,
}

/// The remote document database boundary: point reads, whole-document
/// upserts, change subscription, and the published-mirror surface.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, AppError>;

    async fn list(&self, owner: Uuid, collection: Collection) -> Result<Vec<Document>, AppError>;

    /// Upserts the full document, bumping `updated_at`, then echoes the
    /// stored snapshot on the document's channel.
    async fn write_merge(
        &self,
        owner: Uuid,
        collection: Collection,
        doc: &Document,
    ) -> Result<(), AppError>;

    async fn delete(&self, owner: Uuid, collection: Collection, id: Uuid) -> Result<(), AppError>;

    /// Subscribes to push updates for one document id. Lagging receivers drop
    /// intermediate echoes, never the ordering of the ones they do see.
    fn subscribe(&self, id: Uuid) -> broadcast::Receiver<StoreEvent>;

    /// Copies the complete current document into the public collection with
    /// `is_published = true`, stamped with the owning user.
    async fn publish(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Result<PublishedDocument, AppError>;

    /// Deletes the public mirror entirely. A public read after unpublish is
    /// NotFound, never a stale flagged-off document.
    async fn unpublish(&self, owner: Uuid, id: Uuid) -> Result<(), AppError>;

    /// Public fetch; increments the best-effort view counter as a side
    /// effect of a successful read.
    async fn read_public(&self, id: Uuid) -> Result<PublishedDocument, AppError>;
}

const CHANNEL_CAPACITY: usize = 16;

/// Per-document broadcast channels shared by the store implementations.
/// Channels are created lazily on first subscribe or first echo.
#[derive(Default)]
pub struct ChangeFeed {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<StoreEvent>>>,
}

impl ChangeFeed {
    pub fn subscribe(&self, id: Uuid) -> broadcast::Receiver<StoreEvent> {
        self.sender(id).subscribe()
    }

    /// Pushes an event to current subscribers. A send with no receiver is
    /// not an error; the feed is push-only.
    pub fn echo(&self, id: Uuid, event: StoreEvent) {
        let _ = self.sender(id).send(event);
    }

    fn sender(&self, id: Uuid) -> broadcast::Sender<StoreEvent> {
        self.channels
            .lock()
            .expect("change feed map poisoned")
            .entry(id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}
