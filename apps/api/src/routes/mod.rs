pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::auth::handlers as auth_handlers;
use crate::document::handlers as doc_handlers;
use crate::state::AppState;
use crate::suggest::handlers as suggest_handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/signup", post(auth_handlers::handle_signup))
        .route("/api/v1/auth/login", post(auth_handlers::handle_login))
        .route(
            "/api/v1/auth/password",
            post(auth_handlers::handle_change_password),
        )
        .route("/api/v1/auth/photo", post(auth_handlers::handle_photo_upload))
        // Documents (owner-scoped)
        .route(
            "/api/v1/documents",
            post(doc_handlers::handle_create_document).get(doc_handlers::handle_list_documents),
        )
        .route(
            "/api/v1/documents/:id",
            get(doc_handlers::handle_get_document).delete(doc_handlers::handle_delete_document),
        )
        .route(
            "/api/v1/documents/:id/intents",
            post(doc_handlers::handle_apply_intent),
        )
        .route(
            "/api/v1/documents/:id/save-state",
            get(doc_handlers::handle_save_state),
        )
        .route(
            "/api/v1/documents/:id/session",
            delete(doc_handlers::handle_close_session),
        )
        .route(
            "/api/v1/documents/:id/html",
            get(doc_handlers::handle_render_editable),
        )
        .route(
            "/api/v1/documents/:id/export.pdf",
            get(doc_handlers::handle_export_pdf),
        )
        .route(
            "/api/v1/documents/:id/publish",
            post(doc_handlers::handle_publish).delete(doc_handlers::handle_unpublish),
        )
        // Public share views (no auth)
        .route("/api/v1/shared/:id", get(doc_handlers::handle_shared))
        .route("/api/v1/shared/:id/html", get(doc_handlers::handle_shared_html))
        // Suggestions
        .route(
            "/api/v1/suggest/bullets",
            post(suggest_handlers::handle_suggest_bullets),
        )
        .route(
            "/api/v1/suggest/project",
            post(suggest_handlers::handle_suggest_project),
        )
        .with_state(state)
}
