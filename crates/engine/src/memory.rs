//! In-memory version store (PRD-89).
//!
//! Backs the engine test-suite and embedded deployments that have no
//! database at hand. Ids are assigned from a monotonically increasing
//! counter, matching the BIGSERIAL behavior of the SQL adapter.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use mxvault_core::types::{DbId, ProjectId};
use mxvault_core::version::DocumentVersion;

use crate::store::{NewVersion, StoreError, VersionStore};

#[derive(Debug, Default)]
struct Inner {
    next_id: DbId,
    rows: BTreeMap<DbId, DocumentVersion>,
}

/// A version store held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryVersionStore {
    inner: Mutex<Inner>,
}

impl InMemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_row(inner: &mut Inner, input: NewVersion) -> DocumentVersion {
        inner.next_id += 1;
        DocumentVersion {
            id: inner.next_id,
            project_id: input.project_id,
            semantic_version: input.semantic_version,
            is_keyframe: input.is_keyframe,
            content: input.content,
            source_version_id: input.source_version_id,
            diff_chain_depth: input.diff_chain_depth,
            page_count: input.page_count,
            page_names: input.page_names,
            name: input.name,
            description: input.description,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl VersionStore for InMemoryVersionStore {
    async fn create(&self, input: NewVersion) -> Result<DocumentVersion, StoreError> {
        let mut inner = self.inner.lock().expect("version store lock poisoned");
        let row = Self::build_row(&mut inner, input);
        inner.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: DbId) -> Result<Option<DocumentVersion>, StoreError> {
        let inner = self.inner.lock().expect("version store lock poisoned");
        Ok(inner.rows.get(&id).cloned())
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<DocumentVersion>, StoreError> {
        let inner = self.inner.lock().expect("version store lock poisoned");
        let mut rows: Vec<DocumentVersion> = inner
            .rows
            .values()
            .filter(|row| row.project_id == project_id)
            .cloned()
            .collect();
        // Newest first; id breaks ties between rows created in the same instant.
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn delete(&self, id: DbId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("version store lock poisoned");
        inner.rows.remove(&id);
        Ok(())
    }

    async fn get_wip(
        &self,
        project_id: ProjectId,
    ) -> Result<Option<DocumentVersion>, StoreError> {
        let inner = self.inner.lock().expect("version store lock poisoned");
        Ok(inner
            .rows
            .values()
            .find(|row| row.project_id == project_id && row.is_wip())
            .cloned())
    }

    async fn upsert_wip(&self, input: NewVersion) -> Result<DocumentVersion, StoreError> {
        let mut inner = self.inner.lock().expect("version store lock poisoned");

        let existing_id = inner
            .rows
            .values()
            .find(|row| row.project_id == input.project_id && row.is_wip())
            .map(|row| row.id);

        let row = match existing_id {
            Some(id) => {
                // Overwrite in place: the id stays stable for the project's life.
                let row = DocumentVersion {
                    id,
                    project_id: input.project_id,
                    semantic_version: input.semantic_version,
                    is_keyframe: input.is_keyframe,
                    content: input.content,
                    source_version_id: input.source_version_id,
                    diff_chain_depth: input.diff_chain_depth,
                    page_count: input.page_count,
                    page_names: input.page_names,
                    name: input.name,
                    description: input.description,
                    created_at: Utc::now(),
                };
                inner.rows.insert(id, row.clone());
                row
            }
            None => {
                let row = Self::build_row(&mut inner, input);
                inner.rows.insert(row.id, row.clone());
                row
            }
        };
        Ok(row)
    }
}
