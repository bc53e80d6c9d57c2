use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;
use crate::suggest::{self, ProjectSummary};

#[derive(Deserialize)]
pub struct BulletsRequest {
    pub job_title: String,
    #[serde(default)]
    pub industry: String,
}

#[derive(Serialize)]
pub struct BulletsResponse {
    pub bullets: Vec<String>,
}

/// POST /api/v1/suggest/bullets
pub async fn handle_suggest_bullets(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<BulletsRequest>,
) -> Result<Json<BulletsResponse>, AppError> {
    let bullets = suggest::suggest_bullets(&state.llm, &req.job_title, &req.industry).await?;
    Ok(Json(BulletsResponse { bullets }))
}

#[derive(Deserialize)]
pub struct ProjectRequest {
    pub readme: String,
}

/// POST /api/v1/suggest/project
pub async fn handle_suggest_project(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<ProjectRequest>,
) -> Result<Json<ProjectSummary>, AppError> {
    let summary = suggest::summarize_readme(&state.llm, &req.readme).await?;
    Ok(Json(summary))
}
