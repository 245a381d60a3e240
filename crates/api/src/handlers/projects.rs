//! Handlers for project CRUD (PRD-82).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use mxvault_core::types::ProjectId;
use mxvault_db::models::project::Project;
use mxvault_db::repositories::ProjectRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /projects` and `PATCH /projects/{id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct ProjectNameInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
}

/// Look up a project or fail with 404.
pub async fn find_project(
    pool: &mxvault_db::DbPool,
    project_id: ProjectId,
) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, project_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))
}

/// POST /api/v1/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(input): Json<ProjectNameInput>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let project = ProjectRepo::create(&state.pool, &input.name).await?;

    tracing::info!(project_id = %project.id, name = %project.name, "Project created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list_projects(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> AppResult<impl IntoResponse> {
    let project = find_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PATCH /api/v1/projects/{id}
pub async fn rename_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(input): Json<ProjectNameInput>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let project = ProjectRepo::rename(&state.pool, project_id, &input.name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {project_id} not found")))?;

    Ok(Json(DataResponse { data: project }))
}

/// DELETE /api/v1/projects/{id}
///
/// Cascades to the project's version rows, WIP included.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> AppResult<impl IntoResponse> {
    let deleted = ProjectRepo::delete(&state.pool, project_id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("Project {project_id} not found")));
    }

    tracing::info!(project_id = %project_id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
