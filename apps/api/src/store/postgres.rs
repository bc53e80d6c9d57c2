//! Postgres-backed `DocumentStore`. Documents are stored whole as JSONB
//! rows; writes are `ON CONFLICT` upserts, so the last writer wins at
//! document granularity. Schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

use crate::document::model::Document;
use crate::errors::AppError;
use crate::store::{ChangeFeed, Collection, DocumentStore, PublishedDocument, StoreEvent};

pub struct PgDocumentStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::default(),
        }
    }
}

fn decode_doc(value: serde_json::Value) -> Result<Document, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("corrupt stored document: {e}")))
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn read(
        &self,
        owner: Uuid,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<Document>, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            "SELECT doc FROM documents WHERE owner_id = $1 AND collection = $2 AND id = $3",
        )
        .bind(owner)
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(doc,)| decode_doc(doc)).transpose()
    }

    async fn list(&self, owner: Uuid, collection: Collection) -> Result<Vec<Document>, AppError> {
        let rows: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT doc FROM documents WHERE owner_id = $1 AND collection = $2 \
             ORDER BY updated_at DESC",
        )
        .bind(owner)
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|(doc,)| decode_doc(doc)).collect()
    }

    async fn write_merge(
        &self,
        owner: Uuid,
        collection: Collection,
        doc: &Document,
    ) -> Result<(), AppError> {
        let mut stored = doc.clone();
        stored.updated_at = Utc::now();
        let value = serde_json::to_value(&stored)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("encode document: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO documents (owner_id, collection, id, doc, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (owner_id, collection, id)
            DO UPDATE SET doc = EXCLUDED.doc, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(owner)
        .bind(collection.as_str())
        .bind(doc.id)
        .bind(&value)
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await?;

        debug!("document {} written to {}/{}", doc.id, owner, collection);
        self.feed.echo(doc.id, StoreEvent::Updated(stored));
        Ok(())
    }

    async fn delete(&self, owner: Uuid, collection: Collection, id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM documents WHERE owner_id = $1 AND collection = $2 AND id = $3")
            .bind(owner)
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
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
        let mut doc = self
            .read(owner, collection, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
        doc.is_published = true;

        let value = serde_json::to_value(&doc)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("encode document: {e}")))?;
        let published_at: (DateTime<Utc>,) = sqlx::query_as(
            r#"
            INSERT INTO published_documents (id, owner_id, collection, doc, view_count, published_at)
            VALUES ($1, $2, $3, $4, 0, NOW())
            ON CONFLICT (id)
            DO UPDATE SET doc = EXCLUDED.doc, published_at = EXCLUDED.published_at
            RETURNING published_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(collection.as_str())
        .bind(&value)
        .fetch_one(&self.pool)
        .await?;

        // Flip the private copy's flag so the editor can show "published".
        doc.updated_at = Utc::now();
        self.write_merge(owner, collection, &doc).await?;

        Ok(PublishedDocument {
            document: doc,
            owner_id: owner,
            view_count: 0,
            published_at: published_at.0,
        })
    }

    async fn unpublish(&self, owner: Uuid, id: Uuid) -> Result<(), AppError> {
        let owner_row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT owner_id, collection FROM published_documents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let (mirror_owner, collection) = owner_row
            .ok_or_else(|| AppError::NotFound(format!("Published document {id} not found")))?;
        if mirror_owner != owner {
            return Err(AppError::Forbidden);
        }

        // Hard delete: a public read after this must be NotFound.
        sqlx::query("DELETE FROM published_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let collection = match collection.as_str() {
            "portfolios" => Collection::Portfolios,
            _ => Collection::Resumes,
        };
        if let Some(mut doc) = self.read(owner, collection, id).await? {
            doc.is_published = false;
            self.write_merge(owner, collection, &doc).await?;
        }
        Ok(())
    }

    async fn read_public(&self, id: Uuid) -> Result<PublishedDocument, AppError> {
        // The view counter is best-effort and has no viewer dedup.
        let row: Option<(serde_json::Value, Uuid, i64, DateTime<Utc>)> = sqlx::query_as(
            r#"
            UPDATE published_documents
            SET view_count = view_count + 1
            WHERE id = $1
            RETURNING doc, owner_id, view_count, published_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (doc, owner_id, view_count, published_at) =
            row.ok_or_else(|| AppError::NotFound(format!("Published document {id} not found")))?;

        Ok(PublishedDocument {
            document: decode_doc(doc)?,
            owner_id,
            view_count,
            published_at,
        })
    }
}
