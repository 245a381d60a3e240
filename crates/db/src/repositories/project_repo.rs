//! Repository for the `projects` table (PRD-82).

use mxvault_core::types::ProjectId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::project::Project;

/// Column list for projects queries.
const COLUMNS: &str = "id, name, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Create a new project with a freshly generated id.
    pub async fn create(pool: &PgPool, name: &str) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (id, name)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(Uuid::now_v7())
            .bind(name)
            .fetch_one(pool)
            .await
    }

    /// Fetch a project by id.
    pub async fn find_by_id(
        pool: &PgPool,
        project_id: ProjectId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// List all projects, most recently updated first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects ORDER BY updated_at DESC");
        sqlx::query_as::<_, Project>(&query).fetch_all(pool).await
    }

    /// Rename a project. Returns the updated row, or `None` if absent.
    pub async fn rename(
        pool: &PgPool,
        project_id: ProjectId,
        name: &str,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET name = $2, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(project_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project. Its version rows go with it (ON DELETE CASCADE).
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, project_id: ProjectId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
