//! Document version row model (PRD-83).
//!
//! `VersionRow` mirrors the `document_versions` table; the engine works with
//! the domain entity from `mxvault-core`, so the row converts into it via
//! `From`.

use mxvault_core::types::{DbId, ProjectId, Timestamp};
use mxvault_core::version::DocumentVersion;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `document_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VersionRow {
    pub id: DbId,
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
    pub created_at: Timestamp,
}

impl From<VersionRow> for DocumentVersion {
    fn from(row: VersionRow) -> Self {
        DocumentVersion {
            id: row.id,
            project_id: row.project_id,
            semantic_version: row.semantic_version,
            is_keyframe: row.is_keyframe,
            content: row.content,
            source_version_id: row.source_version_id,
            diff_chain_depth: row.diff_chain_depth,
            page_count: row.page_count,
            page_names: row.page_names,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}
