use axum::{
    extract::{Multipart, State},
    Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{issue_token, AuthUser};
use crate::document::model::Document;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::state::AppState;
use crate::store::Collection;

const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Compares a presented password against the stored bcrypt hash. The same
/// rejection covers a wrong password and an unreadable hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AppError> {
    if verify(password, stored_hash).unwrap_or(false) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
}

/// POST /api/v1/auth/signup
///
/// Creates the account and the user's default resume in one step, so the
/// editor has something to open on first visit.
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("email is already registered".to_string()));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hash failed: {e}")))?;

    let (user_id,): (Uuid,) = sqlx::query_as(
        "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING id",
    )
    .bind(&email)
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await?;

    let resume = Document::default_resume("My Resume", Utc::now().timestamp_millis());
    state
        .store
        .write_merge(user_id, Collection::Resumes, &resume)
        .await?;

    info!("new account {email} with default resume {}", resume.id);

    let token = issue_token(user_id, &email, &state.config.jwt_secret)?;
    Ok(Json(SessionResponse {
        token,
        user_id,
        email,
    }))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let email = req.email.trim().to_lowercase();
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    // Same rejection for unknown email and bad password.
    let user = user.ok_or(AppError::Unauthorized)?;
    verify_password(&req.password, &user.password_hash)?;

    let token = issue_token(user.id, &user.email, &state.config.jwt_secret)?;
    Ok(Json(SessionResponse {
        token,
        user_id: user.id,
        email: user.email,
    }))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/v1/auth/password
///
/// Changing the password requires re-proof of the current one, even with a
/// valid session token.
pub async fn handle_change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if req.new_password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_optional(&state.db)
        .await?;
    let row = row.ok_or(AppError::Unauthorized)?;

    // Re-proof of the current password, even with a valid session token.
    verify_password(&req.current_password, &row.password_hash)?;

    let new_hash = hash(&req.new_password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hash failed: {e}")))?;
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(&new_hash)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    Ok(Json(serde_json::json!({ "changed": true })))
}

#[derive(Serialize)]
pub struct PhotoResponse {
    pub photo_url: String,
}

/// POST /api/v1/auth/photo
///
/// Multipart upload of a profile photo to blob storage; responds with the
/// retrievable URL and stores it on the user row.
pub async fn handle_photo_upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>, AppError> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
        .ok_or_else(|| AppError::Validation("missing photo field".to_string()))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let extension = match content_type.as_str() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        other => {
            return Err(AppError::Validation(format!(
                "unsupported photo content type: {other}"
            )))
        }
    };

    let data: bytes::Bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read photo: {e}")))?;
    if data.is_empty() {
        return Err(AppError::Validation("photo is empty".to_string()));
    }
    if data.len() > MAX_PHOTO_BYTES {
        return Err(AppError::Validation("photo exceeds 5 MiB".to_string()));
    }

    let key = format!("profile-photos/{}.{extension}", user.id);
    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .content_type(&content_type)
        .body(aws_sdk_s3::primitives::ByteStream::from(data))
        .send()
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let photo_url = format!(
        "{}/{}/{key}",
        state.config.s3_endpoint.trim_end_matches('/'),
        state.config.s3_bucket
    );
    sqlx::query("UPDATE users SET photo_url = $1 WHERE id = $2")
        .bind(&photo_url)
        .bind(user.id)
        .execute(&state.db)
        .await?;

    Ok(Json(PhotoResponse { photo_url }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the hash fast under test.
    const TEST_COST: u32 = 4;

    #[test]
    fn test_password_change_requires_reproof_of_current() {
        let stored = hash("original-password", TEST_COST).unwrap();
        assert!(verify_password("original-password", &stored).is_ok());
        let err = verify_password("guessed-password", &stored).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn test_unreadable_stored_hash_rejects() {
        assert!(matches!(
            verify_password("anything", "not-a-bcrypt-hash"),
            Err(AppError::Unauthorized)
        ));
    }
}
