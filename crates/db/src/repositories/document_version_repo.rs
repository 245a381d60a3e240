//! Repository for the `document_versions` table (PRD-83).
//!
//! Historical rows are immutable after creation (labels aside); the WIP row
//! is the exception and is replaced in place through
//! [`DocumentVersionRepo::upsert_wip`].

use mxvault_core::types::{DbId, ProjectId};
use mxvault_core::version::WIP_VERSION;
use mxvault_engine::NewVersion;
use sqlx::PgPool;

use crate::models::document_version::VersionRow;

/// Column list for document_versions queries.
const COLUMNS: &str = "id, project_id, semantic_version, is_keyframe, content, \
                       source_version_id, diff_chain_depth, page_count, page_names, \
                       name, description, created_at";

/// Provides create/read/delete operations for document versions.
pub struct DocumentVersionRepo;

impl DocumentVersionRepo {
    /// Persist a new version row (keyframe or diff).
    pub async fn create(pool: &PgPool, input: &NewVersion) -> Result<VersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_versions
               (project_id, semantic_version, is_keyframe, content,
                source_version_id, diff_chain_depth, page_count, page_names,
                name, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(input.project_id)
            .bind(&input.semantic_version)
            .bind(input.is_keyframe)
            .bind(&input.content)
            .bind(input.source_version_id)
            .bind(input.diff_chain_depth)
            .bind(input.page_count)
            .bind(&input.page_names)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// Fetch a version row by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VersionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM document_versions WHERE id = $1");
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all version rows of a project, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: ProjectId,
    ) -> Result<Vec<VersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_versions
             WHERE project_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a version row by id. Deleting a missing row is a no-op.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM document_versions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Fetch the project's WIP row, if any.
    pub async fn find_wip(
        pool: &PgPool,
        project_id: ProjectId,
    ) -> Result<Option<VersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM document_versions
             WHERE project_id = $1 AND semantic_version = $2"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(project_id)
            .bind(WIP_VERSION)
            .fetch_optional(pool)
            .await
    }

    /// Upsert the project's WIP row against the partial unique index
    /// `uq_document_versions_wip`: the row id stays stable across
    /// overwrites and `created_at` is refreshed to the overwrite time.
    pub async fn upsert_wip(
        pool: &PgPool,
        input: &NewVersion,
    ) -> Result<VersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_versions
               (project_id, semantic_version, is_keyframe, content,
                source_version_id, diff_chain_depth, page_count, page_names,
                name, description)
             VALUES ($1, $2, TRUE, $3, NULL, 0, $4, $5, NULL, NULL)
             ON CONFLICT (project_id) WHERE semantic_version = '0.0.0' DO UPDATE
             SET content = EXCLUDED.content,
                 page_count = EXCLUDED.page_count,
                 page_names = EXCLUDED.page_names,
                 created_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VersionRow>(&query)
            .bind(input.project_id)
            .bind(WIP_VERSION)
            .bind(&input.content)
            .bind(input.page_count)
            .bind(&input.page_names)
            .fetch_one(pool)
            .await
    }
}
