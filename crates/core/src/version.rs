//! Document version entity and semantic-version helpers (PRD-83).
//!
//! A [`DocumentVersion`] is one row of a project's version history: either a
//! keyframe carrying the complete serialized document, or a diff carrying an
//! opaque patch blob against the version named by `source_version_id`. The
//! reserved semantic version `"0.0.0"` marks the work-in-progress row, which
//! is overwritten in place and never participates in the diff chain.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, ProjectId, Timestamp};

/// Reserved semantic version of the work-in-progress row.
pub const WIP_VERSION: &str = "0.0.0";

/// Semantic version assigned to a project's first historical save.
pub const FIRST_VERSION: &str = "1.0.0";

/// A persisted snapshot descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub id: DbId,
    pub project_id: ProjectId,
    pub semantic_version: String,
    pub is_keyframe: bool,
    /// Complete document for keyframes; opaque patch blob for diffs.
    pub content: String,
    pub source_version_id: Option<DbId>,
    pub diff_chain_depth: i32,
    pub page_count: i32,
    pub page_names: Vec<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
}

impl DocumentVersion {
    /// `true` for the live-editing buffer row (`"0.0.0"`).
    pub fn is_wip(&self) -> bool {
        self.semantic_version == WIP_VERSION
    }
}

/// Compute the default semantic version for a new historical save.
///
/// Bumps the minor component of the parent's `maj.min.patch` label and resets
/// patch to 0. A missing or unparsable parent label yields [`FIRST_VERSION`].
pub fn next_semantic_version(parent: Option<&str>) -> String {
    let Some(parent) = parent else {
        return FIRST_VERSION.to_string();
    };

    let mut parts = parent.split('.');
    let major = parts.next().and_then(|p| p.parse::<u64>().ok());
    let minor = parts.next().and_then(|p| p.parse::<u64>().ok());
    match (major, minor) {
        (Some(major), Some(minor)) => format!("{major}.{}.0", minor + 1),
        _ => FIRST_VERSION.to_string(),
    }
}

/// Validate a caller-supplied semantic version label.
///
/// The label is a display string, not a strict semver: anything non-blank is
/// accepted except the reserved WIP marker.
pub fn validate_semantic_version(label: &str) -> Result<(), CoreError> {
    if label.trim().is_empty() {
        return Err(CoreError::Validation(
            "Semantic version must not be blank".to_string(),
        ));
    }
    if label == WIP_VERSION {
        return Err(CoreError::Validation(format!(
            "Semantic version {WIP_VERSION} is reserved for the work-in-progress row"
        )));
    }
    Ok(())
}
