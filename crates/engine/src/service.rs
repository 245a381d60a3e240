//! Save/restore facade over the version store (PRD-88).
//!
//! [`VersionManager`] is what the HTTP layer (and any future CLI or IPC
//! surface) talks to. It owns the injected store, the event bus, and the
//! per-project write locks; every historical save is routed through the
//! chain policy, and every mutation publishes a domain event.

use std::sync::Arc;

use mxvault_core::chain;
use mxvault_core::pages::{build_page_metadata, resolve_page_metadata};
use mxvault_core::types::{DbId, ProjectId};
use mxvault_core::version::{
    next_semantic_version, validate_semantic_version, DocumentVersion,
};
use mxvault_core::CoreError;
use mxvault_events::{topics, DomainEvent, EventBus};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::locks::ProjectLocks;
use crate::materializer::materialize;
use crate::store::{NewVersion, VersionStore};
use crate::wip;

/// Caller-facing options for a historical save.
///
/// All fields are optional: the engine derives the semantic version from the
/// parent and the page metadata from the document when absent.
#[derive(Debug, Clone, Default)]
pub struct SaveVersionOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub semantic_version: Option<String>,
    pub page_count: Option<i32>,
    pub page_names: Option<Vec<String>>,
}

/// Orchestrates versioned-document storage for all projects.
pub struct VersionManager {
    store: Arc<dyn VersionStore>,
    events: Arc<EventBus>,
    locks: ProjectLocks,
}

impl VersionManager {
    pub fn new(store: Arc<dyn VersionStore>, events: Arc<EventBus>) -> Self {
        Self {
            store,
            events,
            locks: ProjectLocks::new(),
        }
    }

    /// The store this manager was constructed with.
    pub fn store(&self) -> &Arc<dyn VersionStore> {
        &self.store
    }

    /// Save the given document as a new historical version.
    ///
    /// The parent is the project's latest historical (non-WIP) version; the
    /// chain policy decides keyframe-vs-diff and no caller can override it.
    /// Holds the project write lock for the whole save so concurrent saves
    /// cannot fork the chain.
    pub async fn save_version(
        &self,
        project_id: ProjectId,
        content: &str,
        options: SaveVersionOptions,
    ) -> Result<DocumentVersion, EngineError> {
        if let Some(label) = &options.semantic_version {
            validate_semantic_version(label)?;
        }
        let page_meta = resolve_page_metadata(
            content,
            options.page_count,
            options.page_names.as_deref(),
        )?;

        let _guard = self.locks.acquire(project_id).await;

        let versions = self.store.list_by_project(project_id).await?;
        let parent = versions.iter().find(|v| !v.is_wip());

        let decision = chain::decide(parent);
        let semantic_version = options.semantic_version.clone().unwrap_or_else(|| {
            next_semantic_version(parent.map(|p| p.semantic_version.as_str()))
        });

        let (stored_content, source_version_id) = match (decision.is_keyframe, parent) {
            (true, _) => (content.to_string(), parent.map(|p| p.id)),
            (false, Some(parent)) => {
                let base =
                    materialize(self.store.as_ref(), parent.id, &CancellationToken::new())
                        .await?;
                let patch = mxvault_core::diff::compute_patch(&base, content);
                (patch.encode(), Some(parent.id))
            }
            (false, None) => {
                // The policy never asks for a diff without a parent.
                return Err(EngineError::Core(CoreError::Internal(
                    "chain policy produced a diff decision without a parent".to_string(),
                )));
            }
        };

        let row = self
            .store
            .create(NewVersion {
                project_id,
                semantic_version,
                is_keyframe: decision.is_keyframe,
                content: stored_content,
                source_version_id,
                diff_chain_depth: decision.depth,
                page_count: page_meta.page_count,
                page_names: page_meta.page_names,
                name: options.name,
                description: options.description,
            })
            .await?;

        tracing::info!(
            project_id = %project_id,
            version_id = row.id,
            semantic_version = %row.semantic_version,
            is_keyframe = row.is_keyframe,
            diff_chain_depth = row.diff_chain_depth,
            "Version saved",
        );

        self.events.publish(
            DomainEvent::new(topics::VERSION_CREATED)
                .with_project(project_id)
                .with_version(row.id)
                .with_payload(serde_json::json!({
                    "semantic_version": row.semantic_version,
                    "is_keyframe": row.is_keyframe,
                })),
        );

        Ok(row)
    }

    /// Materialize a version and make it the project's live buffer.
    ///
    /// All-or-nothing: a failed materialization returns before the WIP row
    /// is touched.
    pub async fn restore_version(
        &self,
        project_id: ProjectId,
        version_id: DbId,
        cancel: &CancellationToken,
    ) -> Result<String, EngineError> {
        let document = materialize(self.store.as_ref(), version_id, cancel).await?;

        let page_meta = build_page_metadata(&document);
        let _guard = self.locks.acquire(project_id).await;
        let row = wip::overwrite_wip(self.store.as_ref(), project_id, &document, &page_meta)
            .await?;

        tracing::info!(
            project_id = %project_id,
            restored_version_id = version_id,
            wip_id = row.id,
            "Version restored into the live buffer",
        );

        self.events.publish(
            DomainEvent::new(topics::WIP_UPDATED)
                .with_project(project_id)
                .with_version(row.id)
                .with_payload(serde_json::json!({"restored_from": version_id})),
        );

        Ok(document)
    }

    /// Materialize a version without touching the live buffer.
    pub async fn export_version(
        &self,
        version_id: DbId,
        cancel: &CancellationToken,
    ) -> Result<String, EngineError> {
        materialize(self.store.as_ref(), version_id, cancel).await
    }

    /// Overwrite the project's live buffer with autosaved content.
    pub async fn autosave(
        &self,
        project_id: ProjectId,
        content: &str,
    ) -> Result<DocumentVersion, EngineError> {
        let page_meta = build_page_metadata(content);

        let _guard = self.locks.acquire(project_id).await;
        let row =
            wip::overwrite_wip(self.store.as_ref(), project_id, content, &page_meta).await?;

        self.events.publish(
            DomainEvent::new(topics::WIP_UPDATED)
                .with_project(project_id)
                .with_version(row.id),
        );

        Ok(row)
    }

    /// List all of a project's version rows, newest first (WIP included).
    pub async fn list_versions(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<DocumentVersion>, EngineError> {
        Ok(self.store.list_by_project(project_id).await?)
    }

    /// Fetch a single version row.
    pub async fn get_version(&self, version_id: DbId) -> Result<DocumentVersion, EngineError> {
        self.store
            .get(version_id)
            .await?
            .ok_or(EngineError::VersionNotFound { version_id })
    }

    /// Fetch the project's WIP row, if any.
    pub async fn get_wip(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<DocumentVersion>, EngineError> {
        wip::get_wip(self.store.as_ref(), project_id).await
    }

    /// Delete a historical version row.
    ///
    /// The WIP row is refused: the live buffer only disappears with its
    /// project. Deleting a keyframe that later diffs depend on is allowed;
    /// dependents surface `ChainBroken` when materialized.
    pub async fn delete_version(
        &self,
        project_id: ProjectId,
        version_id: DbId,
    ) -> Result<(), EngineError> {
        let row = self.get_version(version_id).await?;
        if row.project_id != project_id {
            return Err(EngineError::VersionNotFound { version_id });
        }
        if row.is_wip() {
            return Err(EngineError::Core(CoreError::Validation(
                "The live buffer cannot be deleted; delete the project instead".to_string(),
            )));
        }

        let _guard = self.locks.acquire(project_id).await;
        self.store.delete(version_id).await?;

        tracing::info!(project_id = %project_id, version_id, "Version deleted");

        self.events.publish(
            DomainEvent::new(topics::VERSION_DELETED)
                .with_project(project_id)
                .with_version(version_id),
        );

        Ok(())
    }
}
