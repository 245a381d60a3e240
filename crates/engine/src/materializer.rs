//! Chain materialization (PRD-88).
//!
//! Reconstructs the full document for any version by walking
//! `source_version_id` links back to the nearest keyframe ancestor and
//! replaying the collected patches oldest-first. Materialization is
//! read-only and memoizes nothing across calls; callers may cache results
//! externally keyed by version id.

use mxvault_core::chain::CHAIN_SAFETY_LIMIT;
use mxvault_core::diff::{apply_patch, Patch};
use mxvault_core::types::DbId;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::store::VersionStore;

/// Reconstruct the full document for `version_id`.
///
/// The cancellation token is checked between chain-walk steps and between
/// patch applications; a cancelled call returns [`EngineError::Cancelled`]
/// promptly without partial effects (reads never write).
pub async fn materialize(
    store: &dyn VersionStore,
    version_id: DbId,
    cancel: &CancellationToken,
) -> Result<String, EngineError> {
    let Some(head) = store.get(version_id).await? else {
        return Err(EngineError::VersionNotFound { version_id });
    };

    // Base case: a keyframe carries the complete document.
    if head.is_keyframe {
        return Ok(head.content);
    }

    // Walk ancestors, collecting patch blobs newest-first.
    let mut patches: Vec<(DbId, String)> = vec![(head.id, head.content)];
    let mut walked: Vec<DbId> = vec![head.id];
    let mut next = head.source_version_id;

    let keyframe = loop {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if walked.len() > CHAIN_SAFETY_LIMIT {
            return Err(EngineError::ChainTooLong {
                version_id,
                limit: CHAIN_SAFETY_LIMIT,
            });
        }

        // A diff version with no source at all is as broken as a missing row.
        let Some(parent_id) = next else {
            return Err(EngineError::ChainBroken { version_id, walked });
        };
        let Some(row) = store.get(parent_id).await? else {
            return Err(EngineError::ChainBroken { version_id, walked });
        };

        walked.push(row.id);
        if row.is_keyframe {
            break row;
        }
        next = row.source_version_id;
        patches.push((row.id, row.content));
    };

    tracing::debug!(
        version_id,
        keyframe_id = keyframe.id,
        patch_count = patches.len(),
        "Materializing version from chain",
    );

    // Replay patches in creation order, oldest first.
    let mut document = keyframe.content;
    for (position, (patch_version_id, blob)) in patches.iter().rev().enumerate() {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let patch = Patch::decode(blob).map_err(|source| EngineError::PatchMismatch {
            version_id: *patch_version_id,
            position,
            source,
        })?;
        document =
            apply_patch(&document, &patch).map_err(|source| EngineError::PatchMismatch {
                version_id: *patch_version_id,
                position,
                source,
            })?;
    }

    Ok(document)
}
