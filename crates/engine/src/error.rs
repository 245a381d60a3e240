//! Engine error type (PRD-88).
//!
//! Chain failures carry the failing version id, and chain walks carry the
//! partial chain visited so far: these surface in logs and API responses
//! verbatim, so a broken store is diagnosable from the error alone.

use mxvault_core::diff::PatchError;
use mxvault_core::types::DbId;
use mxvault_core::CoreError;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Version {version_id} not found")]
    VersionNotFound { version_id: DbId },

    /// An ancestor row referenced by the chain could not be loaded, or a
    /// diff version has no source at all. `walked` is the partial chain
    /// visited before the break, newest first.
    #[error("Diff chain for version {version_id} is broken after walking {walked:?}")]
    ChainBroken { version_id: DbId, walked: Vec<DbId> },

    /// A stored patch does not apply to its reconstructed base. `position`
    /// is the 0-based index of the failing patch in creation order.
    #[error("Patch for version {version_id} at chain position {position} does not apply: {source}")]
    PatchMismatch {
        version_id: DbId,
        position: usize,
        #[source]
        source: PatchError,
    },

    /// The chain walk exceeded the safety bound. The policy can never
    /// produce such a chain; this indicates store corruption or a cycle.
    #[error("Diff chain for version {version_id} exceeds the safety bound of {limit} links")]
    ChainTooLong { version_id: DbId, limit: usize },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
