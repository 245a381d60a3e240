//! Route tables.

pub mod health;

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::{projects, versions};
use crate::state::AppState;

/// All `/api/v1` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Projects
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/{id}",
            get(projects::get_project)
                .patch(projects::rename_project)
                .delete(projects::delete_project),
        )
        // Version history
        .route(
            "/projects/{id}/versions",
            get(versions::list_versions).post(versions::save_version),
        )
        .route(
            "/projects/{id}/versions/{vid}",
            delete(versions::delete_version),
        )
        .route(
            "/projects/{id}/versions/{vid}/restore",
            post(versions::restore_version),
        )
        .route("/versions/{id}", get(versions::get_version))
        .route("/versions/{id}/export", get(versions::export_version))
        // Live buffer
        .route(
            "/projects/{id}/wip",
            get(versions::get_wip).put(versions::autosave),
        )
}
