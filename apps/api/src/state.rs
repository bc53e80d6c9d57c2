use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::llm::LlmClient;
use crate::session::SessionManager;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. Built once in `main`; explicit context instead of ambient
/// singletons, torn down with the process.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    pub llm: LlmClient,
    pub config: Config,
    /// The document database boundary. Postgres-backed in production;
    /// swapped for the in-memory store in tests.
    pub store: Arc<dyn DocumentStore>,
    /// Per-document editor sessions carrying the debounced persistence
    /// bridge.
    pub sessions: Arc<SessionManager>,
}
