//! Handlers for version history and the live buffer (PRD-83, PRD-88).
//!
//! All version mutations go through the engine facade so the chain policy
//! and per-project serialization cannot be bypassed from the HTTP layer.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use mxvault_core::types::{DbId, ProjectId, Timestamp};
use mxvault_core::version::DocumentVersion;
use mxvault_engine::SaveVersionOptions;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::projects::find_project;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Request body for `POST /projects/{id}/versions`.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveVersionInput {
    /// Complete serialized document to snapshot.
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub semantic_version: Option<String>,
    pub page_count: Option<i32>,
    pub page_names: Option<Vec<String>>,
}

/// Request body for `PUT /projects/{id}/wip`.
#[derive(Debug, Deserialize)]
pub struct AutosaveInput {
    pub content: String,
}

/// Version row without its content payload; what listings return.
#[derive(Debug, Serialize)]
pub struct VersionSummary {
    pub id: DbId,
    pub project_id: ProjectId,
    pub semantic_version: String,
    pub is_keyframe: bool,
    pub source_version_id: Option<DbId>,
    pub diff_chain_depth: i32,
    pub page_count: i32,
    pub page_names: Vec<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl From<DocumentVersion> for VersionSummary {
    fn from(version: DocumentVersion) -> Self {
        Self {
            id: version.id,
            project_id: version.project_id,
            semantic_version: version.semantic_version,
            is_keyframe: version.is_keyframe,
            source_version_id: version.source_version_id,
            diff_chain_depth: version.diff_chain_depth,
            page_count: version.page_count,
            page_names: version.page_names,
            name: version.name,
            description: version.description,
            created_at: version.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/versions
///
/// List all versions of a project, newest first, WIP row included.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> AppResult<impl IntoResponse> {
    find_project(&state.pool, project_id).await?;

    let versions = state.manager.list_versions(project_id).await?;
    let summaries: Vec<VersionSummary> = versions.into_iter().map(Into::into).collect();

    Ok(Json(DataResponse { data: summaries }))
}

/// POST /api/v1/projects/{id}/versions
///
/// Snapshot the supplied document as a new historical version.
pub async fn save_version(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(input): Json<SaveVersionInput>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    find_project(&state.pool, project_id).await?;

    let version = state
        .manager
        .save_version(
            project_id,
            &input.content,
            SaveVersionOptions {
                name: input.name,
                description: input.description,
                semantic_version: input.semantic_version,
                page_count: input.page_count,
                page_names: input.page_names,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: VersionSummary::from(version),
        }),
    ))
}

/// GET /api/v1/versions/{id}
pub async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let version = state.manager.get_version(version_id).await?;
    Ok(Json(DataResponse {
        data: VersionSummary::from(version),
    }))
}

/// GET /api/v1/versions/{id}/export
///
/// Materialize a version and return the full document, without touching the
/// project's live buffer.
pub async fn export_version(
    State(state): State<AppState>,
    Path(version_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let document = state
        .manager
        .export_version(version_id, &CancellationToken::new())
        .await?;

    Ok((
        [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
        document,
    ))
}

/// POST /api/v1/projects/{id}/versions/{vid}/restore
///
/// Materialize a version and make it the project's live buffer.
pub async fn restore_version(
    State(state): State<AppState>,
    Path((project_id, version_id)): Path<(ProjectId, DbId)>,
) -> AppResult<impl IntoResponse> {
    find_project(&state.pool, project_id).await?;

    state
        .manager
        .restore_version(project_id, version_id, &CancellationToken::new())
        .await?;

    let wip = state
        .manager
        .get_wip(project_id)
        .await?
        .map(VersionSummary::from);

    Ok(Json(DataResponse { data: wip }))
}

/// DELETE /api/v1/projects/{id}/versions/{vid}
pub async fn delete_version(
    State(state): State<AppState>,
    Path((project_id, version_id)): Path<(ProjectId, DbId)>,
) -> AppResult<impl IntoResponse> {
    find_project(&state.pool, project_id).await?;
    state.manager.delete_version(project_id, version_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Live buffer
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{id}/wip
///
/// Fetch the live buffer, content included (the editor reloads from here).
pub async fn get_wip(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> AppResult<impl IntoResponse> {
    find_project(&state.pool, project_id).await?;

    let wip = state
        .manager
        .get_wip(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} has no live buffer")))?;

    Ok(Json(DataResponse { data: wip }))
}

/// PUT /api/v1/projects/{id}/wip
///
/// Autosave: overwrite the live buffer in place.
pub async fn autosave(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(input): Json<AutosaveInput>,
) -> AppResult<impl IntoResponse> {
    find_project(&state.pool, project_id).await?;

    let wip = state.manager.autosave(project_id, &input.content).await?;

    Ok(Json(DataResponse {
        data: VersionSummary::from(wip),
    }))
}
