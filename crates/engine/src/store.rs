//! Version store abstraction (PRD-89).
//!
//! The engine consumes persistence through this trait only. Two
//! implementations ship in this workspace: [`crate::memory::InMemoryVersionStore`]
//! (embedded use and the engine test-suite) and `mxvault_db::PgVersionStore`
//! (sqlx/PostgreSQL). The backend is injected once at construction; the
//! engine never selects a backend per call.

use async_trait::async_trait;
use mxvault_core::types::{DbId, ProjectId};
use mxvault_core::version::DocumentVersion;

/// A persistence failure inside a store implementation.
///
/// Store backends are opaque to the engine; whatever failed underneath is
/// carried as a message rather than a backend-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Version store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Wrap any backend error into the opaque variant.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Input for creating a version row (historical or WIP).
///
/// `diff_chain_depth` is computed by the chain policy before the store is
/// reached; stores persist it verbatim.
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub project_id: ProjectId,
    pub semantic_version: String,
    pub is_keyframe: bool,
    pub content: String,
    pub source_version_id: Option<DbId>,
    pub diff_chain_depth: i32,
    pub page_count: i32,
    pub page_names: Vec<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Persistence interface for version rows.
///
/// Implementations must make `create` and `upsert_wip` atomically visible:
/// a concurrent reader sees either no row or the whole row, never a partial
/// one. Ordering contract: [`list_by_project`](VersionStore::list_by_project)
/// returns rows by `created_at` descending with `id` descending as the
/// tiebreak.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Persist a new version row and return it with its assigned id.
    async fn create(&self, input: NewVersion) -> Result<DocumentVersion, StoreError>;

    /// Fetch a version row by id.
    async fn get(&self, id: DbId) -> Result<Option<DocumentVersion>, StoreError>;

    /// List all version rows of a project, newest first.
    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<DocumentVersion>, StoreError>;

    /// Delete a version row by id. Deleting a missing row is a no-op.
    async fn delete(&self, id: DbId) -> Result<(), StoreError>;

    /// Fetch the work-in-progress row of a project, if any.
    async fn get_wip(&self, project_id: ProjectId)
        -> Result<Option<DocumentVersion>, StoreError>;

    /// Replace the project's WIP row in place, or insert it if absent.
    ///
    /// The row id is stable across overwrites for the life of the project;
    /// `created_at` is refreshed to the overwrite time.
    async fn upsert_wip(&self, input: NewVersion) -> Result<DocumentVersion, StoreError>;
}
