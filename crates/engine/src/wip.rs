//! Work-in-progress controller (PRD-88).
//!
//! The WIP row is the live editing buffer: one row per project, semantic
//! version `"0.0.0"`, always stored whole (it changes far too often for
//! chain bookkeeping to pay off), overwritten in place on every autosave.
//! Promoting WIP into history is a normal historical save performed by the
//! facade; nothing here touches the chain.

use mxvault_core::pages::PageMetadata;
use mxvault_core::types::ProjectId;
use mxvault_core::version::{DocumentVersion, WIP_VERSION};

use crate::error::EngineError;
use crate::store::{NewVersion, VersionStore};

/// Fetch the project's WIP row, if the project has ever autosaved.
pub async fn get_wip(
    store: &dyn VersionStore,
    project_id: ProjectId,
) -> Result<Option<DocumentVersion>, EngineError> {
    Ok(store.get_wip(project_id).await?)
}

/// Destructively replace the project's WIP row with new content.
///
/// The replacement is a single atomic store operation; the row id stays
/// stable across overwrites and `created_at` is refreshed to now.
pub async fn overwrite_wip(
    store: &dyn VersionStore,
    project_id: ProjectId,
    content: &str,
    page_meta: &PageMetadata,
) -> Result<DocumentVersion, EngineError> {
    let input = NewVersion {
        project_id,
        semantic_version: WIP_VERSION.to_string(),
        is_keyframe: true,
        content: content.to_string(),
        source_version_id: None,
        diff_chain_depth: 0,
        page_count: page_meta.page_count,
        page_names: page_meta.page_names.clone(),
        name: None,
        description: None,
    };
    Ok(store.upsert_wip(input).await?)
}
