//! Keyframe/diff chain policy (PRD-86).
//!
//! Every historical save goes through [`decide`]: it is the single point of
//! control for the storage-size vs. read-latency trade-off, and no caller may
//! bypass it to force a diff when the policy mandates a keyframe.

use crate::version::DocumentVersion;

/// Maximum number of diff links between a version and its nearest keyframe
/// ancestor. Reaching it forces the next save to be a keyframe, which bounds
/// materialization to at most this many patch applications.
pub const MAX_CHAIN_DEPTH: i32 = 20;

/// Hard ceiling on chain walks during materialization, well above the policy
/// bound. Exceeding it means the store handed back a cycle or an unbounded
/// chain, which the policy can never produce.
pub const CHAIN_SAFETY_LIMIT: usize = MAX_CHAIN_DEPTH as usize * 2;

/// Outcome of the keyframe-vs-diff decision for one save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainDecision {
    pub is_keyframe: bool,
    pub depth: i32,
}

/// Decide whether the next save of a project is stored whole or as a diff.
///
/// - No parent (first version of a project): always a keyframe, depth 0.
/// - Parent chain already `MAX_CHAIN_DEPTH - 1` deep: forced keyframe,
///   depth resets to 0.
/// - Otherwise: a diff at `parent.diff_chain_depth + 1`.
pub fn decide(parent: Option<&DocumentVersion>) -> ChainDecision {
    let Some(parent) = parent else {
        return ChainDecision {
            is_keyframe: true,
            depth: 0,
        };
    };

    let next_depth = parent.diff_chain_depth.saturating_add(1);
    if next_depth >= MAX_CHAIN_DEPTH {
        ChainDecision {
            is_keyframe: true,
            depth: 0,
        }
    } else {
        ChainDecision {
            is_keyframe: false,
            depth: next_depth,
        }
    }
}
