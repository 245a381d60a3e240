//! Per-project write serialization (PRD-88).
//!
//! Mutating operations for the same project must run strictly one at a time
//! to preserve the WIP-singleton and chain-integrity invariants when an
//! autosave fires while a manual save is in flight. Reads never lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mxvault_core::types::ProjectId;
use tokio::sync::OwnedMutexGuard;

/// Registry of one async mutex per project.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    inner: Mutex<HashMap<ProjectId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the write lock for a project, waiting behind any in-flight
    /// mutation of the same project. Locks for distinct projects are
    /// independent.
    pub async fn acquire(&self, project_id: ProjectId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().expect("project lock registry poisoned");
            Arc::clone(
                map.entry(project_id)
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        lock.lock_owned().await
    }
}
