//! HTTP handlers for the document surface: CRUD, editor intents through the
//! persistence bridge, publish/unpublish, public share views, and export.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::document::model::Document;
use crate::document::reducer::Intent;
use crate::errors::AppError;
use crate::export::export_pdf;
use crate::render::{render_document, RenderMode};
use crate::session::SaveState;
use crate::state::AppState;
use crate::store::{Collection, PublishedDocument};

#[derive(Deserialize)]
pub struct CollectionQuery {
    #[serde(default = "default_collection")]
    pub collection: Collection,
}

fn default_collection() -> Collection {
    Collection::Resumes
}

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default = "default_collection")]
    pub collection: Collection,
    pub name: Option<String>,
}

/// POST /api/v1/documents
///
/// Creates a document from the built-in skeleton for its collection and
/// writes it immediately (skeletons are not debounced).
pub async fn handle_create_document(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<Document>, AppError> {
    let now_ms = Utc::now().timestamp_millis();
    let doc = match req.collection {
        Collection::Resumes => {
            Document::default_resume(req.name.unwrap_or_else(|| "My Resume".to_string()), now_ms)
        }
        Collection::Portfolios => Document::default_portfolio(
            req.name.unwrap_or_else(|| "My Portfolio".to_string()),
            now_ms,
        ),
    };
    state.store.write_merge(user.id, req.collection, &doc).await?;
    Ok(Json(doc))
}

/// GET /api/v1/documents?collection=resumes
pub async fn handle_list_documents(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<CollectionQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    Ok(Json(state.store.list(user.id, params.collection).await?))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Json<Document>, AppError> {
    // Prefer the live session state over the possibly-stale store copy.
    if let Some(session) = state.sessions.peek(user.id, params.collection, id).await {
        return Ok(Json(session.snapshot().await));
    }
    let doc = state
        .store
        .read(user.id, params.collection, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))?;
    Ok(Json(doc))
}

#[derive(Deserialize)]
pub struct IntentRequest {
    #[serde(default = "default_collection")]
    pub collection: Collection,
    pub intent: Intent,
}

#[derive(Serialize)]
pub struct IntentResponse {
    pub document: Document,
    pub save_state: SaveState,
}

/// POST /api/v1/documents/:id/intents
///
/// Applies one editor intent through the session. The reducer runs
/// synchronously; persistence is debounced and never blocks this call.
pub async fn handle_apply_intent(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<IntentRequest>,
) -> Result<Json<IntentResponse>, AppError> {
    let session = state.sessions.open(user.id, req.collection, id).await?;
    let document = session.apply(&req.intent).await?;
    Ok(Json(IntentResponse {
        document,
        save_state: session.save_state(),
    }))
}

#[derive(Serialize)]
pub struct SaveStateResponse {
    pub save_state: SaveState,
}

/// GET /api/v1/documents/:id/save-state
pub async fn handle_save_state(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Json<SaveStateResponse>, AppError> {
    let save_state = match state.sessions.peek(user.id, params.collection, id).await {
        Some(session) => session.save_state(),
        // No open session means nothing is pending.
        None => SaveState::Saved,
    };
    Ok(Json(SaveStateResponse { save_state }))
}

/// DELETE /api/v1/documents/:id
///
/// Deletes the private copy. Closes any open session first so a pending
/// debounced write cannot resurrect the document.
pub async fn handle_delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.sessions.close(user.id, id).await;
    state.store.delete(user.id, params.collection, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// DELETE /api/v1/documents/:id/session
///
/// Editor teardown: cancels a pending debounce timer and evicts the
/// session. An already-dispatched write completes on its own.
pub async fn handle_close_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.sessions.close(user.id, id).await;
    Ok(Json(serde_json::json!({ "closed": true })))
}

/// GET /api/v1/documents/:id/html, the owner's editable rendering.
pub async fn handle_render_editable(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Html<String>, AppError> {
    let doc = owned_document(&state, &user, params.collection, id).await?;
    Ok(Html(render_document(&doc, RenderMode::Editable)))
}

/// GET /api/v1/documents/:id/export.pdf
pub async fn handle_export_pdf(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Response, AppError> {
    let doc = owned_document(&state, &user, params.collection, id).await?;
    let bytes = export_pdf(&doc)?;
    let filename = format!("{}.pdf", doc.name.replace(|c: char| !c.is_alphanumeric(), "_"));
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/v1/documents/:id/publish
pub async fn handle_publish(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Json<PublishedDocument>, AppError> {
    let session = state.sessions.peek(user.id, params.collection, id).await;
    // Flush any pending edit first so the mirror is the state the owner sees.
    if let Some(session) = &session {
        session.flush().await;
    }
    let published = state.store.publish(user.id, params.collection, id).await?;
    // Keep the live session's flag in step, or the next debounced write
    // would clobber the store's published state.
    if let Some(session) = &session {
        session.set_published(true).await;
    }
    Ok(Json(published))
}

/// DELETE /api/v1/documents/:id/publish
pub async fn handle_unpublish(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(params): Query<CollectionQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.unpublish(user.id, id).await?;
    if let Some(session) = state.sessions.peek(user.id, params.collection, id).await {
        session.set_published(false).await;
    }
    Ok(Json(serde_json::json!({ "published": false })))
}

#[derive(Serialize)]
pub struct PublicViewResponse {
    pub document: Document,
    pub view_count: i64,
}

/// GET /api/v1/shared/:id, public snapshot, no auth. A successful fetch
/// bumps the best-effort view counter.
pub async fn handle_shared(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicViewResponse>, AppError> {
    let published = state.store.read_public(id).await?;
    Ok(Json(PublicViewResponse {
        document: published.document,
        view_count: published.view_count,
    }))
}

/// GET /api/v1/shared/:id/html, read-only rendering of the public snapshot.
pub async fn handle_shared_html(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let published = state.store.read_public(id).await?;
    Ok(Html(render_document(
        &published.document,
        RenderMode::ReadOnly,
    )))
}

async fn owned_document(
    state: &AppState,
    user: &AuthUser,
    collection: Collection,
    id: Uuid,
) -> Result<Document, AppError> {
    if let Some(session) = state.sessions.peek(user.id, collection, id).await {
        return Ok(session.snapshot().await);
    }
    state
        .store
        .read(user.id, collection, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document {id} not found")))
}
