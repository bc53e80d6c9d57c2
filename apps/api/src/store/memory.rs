//! In-memory `DocumentStore` with the same semantics as the Postgres
//! implementation. Backs the session and publish tests, and doubles as a
//! zero-infrastructure store for local experiments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::document::model::Document;
use crate::errors::AppError;
use crate::store::{ChangeFeed, Collection, DocumentStore, PublishedDocument, StoreEvent};

type PrivateKey = (Uuid, &'static str, Uuid);

#[derive(Default)]
pub struct MemoryDocumentStore {
    private: Mutex<HashMap<PrivateKey, Document>>,
    public: Mutex<HashMap<Uuid, PublishedDocument>>,
    feed: ChangeFeed,
    write_count: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `write_merge` calls observed. The debounce property tests
    /// assert on this.
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, AppError> {
        let map = self.private.lock().expect("store map poisoned");
        Ok(map.get(&(owner, collection.as_str(), id)).cloned())
    }

    async fn list(&self, owner: Uuid, collection: Collection) -> Result<Vec<Document>, AppError> {
        let map = self.private.lock().expect("store map poisoned");
        let mut docs: Vec<Document> = map
            .iter()
            .filter(|((o, c, _), _)| *o == owner && *c == collection.as_str())
            .map(|(_, d)| d.clone())
            .collect();
        docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(docs)
    }

    async fn write_merge(
        &self,
        owner: Uuid,
        collection: Collection,
        doc: &Document,
    ) -> Result<(), AppError> {
        let mut stored = doc.clone();
        stored.updated_at = Utc::now();
        {
            let mut map = self.private.lock().expect("store map poisoned");
            map.insert((owner, collection.as_str(), doc.id), stored.clone());
        }
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.feed.echo(doc.id, StoreEvent::Updated(stored));
        Ok(())
    }

    async fn delete(&self, owner: Uuid, collection: Collection, id: Uuid) -> Result<(), AppError> {
        let mut map = self.private.lock().expect("store map poisoned");
        map.remove(&(owner, collection.as_str(), id));
        drop(map);
        self.feed.echo(id, StoreEvent::Deleted(id));
        Ok(())
    }

    fn subscribe(&self, id: Uuid) -> broadcast::Receiver<StoreEvent> {
        self.feed.subscribe(id)
    }

    async fn publish(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Result<PublishedDocument, AppError> {
        let doc = self
            .read(owner, collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;

        let mut snapshot = doc;
        snapshot.is_published = true;

        let published = PublishedDocument {
            document: snapshot.clone(),
            owner_id: owner,
            view_count: 0,
            published_at: Utc::now(),
        };
        self.public
            .lock()
            .expect("public map poisoned")
            .insert(id, published.clone());

        // Flip the private copy's flag so the editor can show "published".
        self.write_merge(owner, collection, &snapshot).await?;
        Ok(published)
    }

    async fn unpublish(&self, owner: Uuid, id: Uuid) -> Result<(), AppError> {
        {
            let mut map = self.public.lock().expect("public map poisoned");
            match map.get(&id) {
                Some(p) if p.owner_id == owner => {
                    map.remove(&id);
                }
                Some(_) => return Err(AppError::Forbidden),
                None => {
                    return Err(AppError::NotFound(format!(
                        "Published document {id} not found"
                    )))
                }
            }
        }

        // The mirror does not record the collection; find the private copy.
        let collection = {
            let map = self.private.lock().expect("store map poisoned");
            [Collection::Resumes, Collection::Portfolios]
                .into_iter()
                .find(|c| map.contains_key(&(owner, c.as_str(), id)))
        };
        if let Some(collection) = collection {
            if let Some(mut doc) = self.read(owner, collection, id).await? {
                doc.is_published = false;
                self.write_merge(owner, collection, &doc).await?;
            }
        }
        Ok(())
    }

    async fn read_public(&self, id: Uuid) -> Result<PublishedDocument, AppError> {
        let mut map = self.public.lock().expect("public map poisoned");
        let published = map
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Published document {id} not found")))?;
        published.view_count += 1;
        Ok(published.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::{SectionContent, SectionKind};
    use crate::document::reducer::{self, Intent};

    fn make_store() -> MemoryDocumentStore {
        MemoryDocumentStore::new()
    }

    fn make_doc() -> Document {
        Document::default_resume("My Resume", 1_000)
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        let read = store
            .read(owner, Collection::Resumes, doc.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.sections, doc.sections);
        // Another owner cannot see it.
        let other = store
            .read(Uuid::new_v4(), Collection::Resumes, doc.id)
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_write_echoes_to_subscriber() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        let mut rx = store.subscribe(doc.id);
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        match rx.recv().await.unwrap() {
            StoreEvent::Updated(echoed) => assert_eq!(echoed.id, doc.id),
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_snapshot_is_isolated_from_later_edits() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let mut doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        store.publish(owner, Collection::Resumes, doc.id).await.unwrap();

        // Keep editing the draft after publishing.
        let summary = doc.sections[1].id.clone();
        reducer::apply(
            &mut doc,
            &Intent::EditSectionField {
                id: summary.clone(),
                field: "body".to_string(),
                value: "draft only".to_string(),
            },
            0,
        )
        .unwrap();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();

        let public = store.read_public(doc.id).await.unwrap();
        assert!(public.document.is_published);
        match public.document.content.get(&summary).unwrap() {
            SectionContent::Summary(t) => assert_eq!(t.body, ""),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_delete_removes_document_and_echoes() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        let mut rx = store.subscribe(doc.id);
        store.delete(owner, Collection::Resumes, doc.id).await.unwrap();
        assert!(store
            .read(owner, Collection::Resumes, doc.id)
            .await
            .unwrap()
            .is_none());
        match rx.recv().await.unwrap() {
            StoreEvent::Deleted(deleted) => assert_eq!(deleted, doc.id),
            other => panic!("expected Deleted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_publish_and_unpublish_flip_private_flag() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();

        store.publish(owner, Collection::Resumes, doc.id).await.unwrap();
        let private = store
            .read(owner, Collection::Resumes, doc.id)
            .await
            .unwrap()
            .unwrap();
        assert!(private.is_published);

        store.unpublish(owner, doc.id).await.unwrap();
        let private = store
            .read(owner, Collection::Resumes, doc.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!private.is_published);
    }

    #[tokio::test]
    async fn test_unpublish_makes_public_read_not_found() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        store.publish(owner, Collection::Resumes, doc.id).await.unwrap();
        store.unpublish(owner, doc.id).await.unwrap();
        let err = store.read_public(doc.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_view_counter_increments_per_fetch() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        store.publish(owner, Collection::Resumes, doc.id).await.unwrap();
        assert_eq!(store.read_public(doc.id).await.unwrap().view_count, 1);
        assert_eq!(store.read_public(doc.id).await.unwrap().view_count, 2);
    }

    #[tokio::test]
    async fn test_unpublish_by_non_owner_is_forbidden() {
        let store = make_store();
        let owner = Uuid::new_v4();
        let doc = make_doc();
        store
            .write_merge(owner, Collection::Resumes, &doc)
            .await
            .unwrap();
        store.publish(owner, Collection::Resumes, doc.id).await.unwrap();
        let err = store.unpublish(Uuid::new_v4(), doc.id).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        // Still published for everyone else.
        assert!(store.read_public(doc.id).await.is_ok());
    }

    #[test]
    fn test_default_resume_skeleton_kinds() {
        let doc = make_doc();
        let kinds: Vec<SectionKind> = doc.sections.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SectionKind::Header,
                SectionKind::Summary,
                SectionKind::Experience,
                SectionKind::Projects,
                SectionKind::Skills,
            ]
        );
    }
}
