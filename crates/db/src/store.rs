//! PostgreSQL implementation of the engine's version store (PRD-89).
//!
//! A thin adapter over [`DocumentVersionRepo`]: every trait method is one
//! SQL statement, so create and WIP-overwrite visibility is atomic.

use async_trait::async_trait;
use mxvault_core::types::{DbId, ProjectId};
use mxvault_core::version::DocumentVersion;
use mxvault_engine::{NewVersion, StoreError, VersionStore};
use sqlx::PgPool;

use crate::repositories::DocumentVersionRepo;

/// Version store backed by the `document_versions` table.
#[derive(Clone)]
pub struct PgVersionStore {
    pool: PgPool,
}

impl PgVersionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for PgVersionStore {
    async fn create(&self, input: NewVersion) -> Result<DocumentVersion, StoreError> {
        let row = DocumentVersionRepo::create(&self.pool, &input)
            .await
            .map_err(StoreError::backend)?;
        tracing::debug!(
            version_id = row.id,
            project_id = %row.project_id,
            is_keyframe = row.is_keyframe,
            "Version row persisted",
        );
        Ok(row.into())
    }

    async fn get(&self, id: DbId) -> Result<Option<DocumentVersion>, StoreError> {
        DocumentVersionRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Into::into))
            .map_err(StoreError::backend)
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<DocumentVersion>, StoreError> {
        DocumentVersionRepo::list_by_project(&self.pool, project_id)
            .await
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(StoreError::backend)
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        DocumentVersionRepo::delete(&self.pool, id)
            .await
            .map_err(StoreError::backend)
    }

    async fn get_wip(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<DocumentVersion>, StoreError> {
        DocumentVersionRepo::find_wip(&self.pool, project_id)
            .await
            .map(|row| row.map(Into::into))
            .map_err(StoreError::backend)
    }

    async fn upsert_wip(&self, input: NewVersion) -> Result<DocumentVersion, StoreError> {
        DocumentVersionRepo::upsert_wip(&self.pool, &input)
            .await
            .map(Into::into)
            .map_err(StoreError::backend)
    }
}
