//! Diff codec for serialized diagram documents (PRD-85).
//!
//! Computes a line-based patch between two document snapshots and re-applies
//! it during materialization. The patch layout is private to this module:
//! every other component treats the encoded blob as an opaque payload to be
//! stored and later replayed.
//!
//! Two properties the rest of the engine relies on:
//! - **Determinism**: identical inputs produce byte-identical encoded
//!   patches (Myers diff, fixed context radius, no clocks, no randomness).
//! - **Explicit failure**: a patch that does not apply cleanly to the
//!   supplied base is rejected, never merged best-effort. The base content
//!   is fingerprinted with SHA-256 at compute time and verified before any
//!   hunk is applied.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use similar::{ChangeTag, TextDiff};

/// Version tag carried in every encoded patch blob. Bump when the hunk
/// layout changes so stale blobs are rejected instead of misapplied.
pub const PATCH_FORMAT_VERSION: u32 = 1;

/// Context radius (in lines) around each change group.
const CONTEXT_RADIUS: usize = 3;

/// A failure while decoding or applying a patch.
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("patch format {0} is not supported")]
    UnsupportedFormat(u32),

    #[error("base content does not match the patch's expected starting state")]
    BaseMismatch,

    #[error("hunk at base line {0} does not match the base content")]
    HunkMismatch(usize),

    #[error("patch blob is malformed: {0}")]
    Malformed(String),
}

/// One line-level operation inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "text", rename_all = "snake_case")]
enum PatchOp {
    /// Line present in both base and target; verified on apply.
    Context(String),
    /// Line removed from the base; verified on apply.
    Delete(String),
    /// Line inserted into the target.
    Insert(String),
}

/// A contiguous run of operations against the base document.
///
/// `old_start` is the 0-based line index in the base where the hunk begins.
/// Line values keep their terminators, so applying is pure concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Hunk {
    old_start: usize,
    old_lines: usize,
    new_start: usize,
    new_lines: usize,
    ops: Vec<PatchOp>,
}

/// A patch between two document snapshots.
///
/// An empty hunk list is valid and means the two snapshots were identical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    format: u32,
    base_digest: String,
    hunks: Vec<Hunk>,
}

impl Patch {
    /// Serialize to the opaque blob stored as a diff version's `content`.
    pub fn encode(&self) -> String {
        // Serialization of this struct cannot fail: no maps, no non-string keys.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Decode a stored patch blob.
    pub fn decode(blob: &str) -> Result<Self, PatchError> {
        let patch: Patch =
            serde_json::from_str(blob).map_err(|e| PatchError::Malformed(e.to_string()))?;
        if patch.format != PATCH_FORMAT_VERSION {
            return Err(PatchError::UnsupportedFormat(patch.format));
        }
        Ok(patch)
    }

    /// `true` when base and target were identical at compute time.
    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }
}

/// SHA-256 hex fingerprint of a document snapshot.
pub fn content_digest(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    format!("{hash:x}")
}

/// Split a document into lines, keeping terminators, matching the diff
/// tokenization. The empty document has zero lines.
fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

/// Compute the patch transforming `base` into `target`.
pub fn compute_patch(base: &str, target: &str) -> Patch {
    let base_digest = content_digest(base);

    if base == target {
        return Patch {
            format: PATCH_FORMAT_VERSION,
            base_digest,
            hunks: Vec::new(),
        };
    }

    // Degenerate endpoints bypass the diff: a whole-document insert or
    // delete, expressed as a single hunk.
    if base.is_empty() || target.is_empty() {
        let ops = if base.is_empty() {
            split_lines(target)
                .into_iter()
                .map(|line| PatchOp::Insert(line.to_string()))
                .collect::<Vec<_>>()
        } else {
            split_lines(base)
                .into_iter()
                .map(|line| PatchOp::Delete(line.to_string()))
                .collect::<Vec<_>>()
        };
        let hunk = Hunk {
            old_start: 0,
            old_lines: split_lines(base).len(),
            new_start: 0,
            new_lines: split_lines(target).len(),
            ops,
        };
        return Patch {
            format: PATCH_FORMAT_VERSION,
            base_digest,
            hunks: vec![hunk],
        };
    }

    let diff = TextDiff::from_lines(base, target);
    let mut hunks = Vec::new();

    for group in diff.grouped_ops(CONTEXT_RADIUS) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_start = first.old_range().start;
        let new_start = first.new_range().start;
        let old_lines = last.old_range().end - old_start;
        let new_lines = last.new_range().end - new_start;

        let mut ops = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let text = change.value().to_string();
                ops.push(match change.tag() {
                    ChangeTag::Equal => PatchOp::Context(text),
                    ChangeTag::Delete => PatchOp::Delete(text),
                    ChangeTag::Insert => PatchOp::Insert(text),
                });
            }
        }

        hunks.push(Hunk {
            old_start,
            old_lines,
            new_start,
            new_lines,
            ops,
        });
    }

    Patch {
        format: PATCH_FORMAT_VERSION,
        base_digest,
        hunks,
    }
}

/// Apply a patch to a base document, reconstructing the target.
///
/// Fails with [`PatchError::BaseMismatch`] when the base fingerprint differs
/// from the one recorded at compute time, and with
/// [`PatchError::HunkMismatch`] when any context or deleted line disagrees
/// with the base (overlapping or out-of-order hunks included). The base is
/// never partially consumed: the error surfaces before a corrupted document
/// can escape.
pub fn apply_patch(base: &str, patch: &Patch) -> Result<String, PatchError> {
    if patch.format != PATCH_FORMAT_VERSION {
        return Err(PatchError::UnsupportedFormat(patch.format));
    }
    if content_digest(base) != patch.base_digest {
        return Err(PatchError::BaseMismatch);
    }

    let old = split_lines(base);
    let mut out = String::with_capacity(base.len());
    let mut cursor = 0usize;

    for hunk in &patch.hunks {
        if hunk.old_start < cursor || hunk.old_start > old.len() {
            return Err(PatchError::HunkMismatch(hunk.old_start));
        }

        // Copy the unchanged span before this hunk.
        for line in &old[cursor..hunk.old_start] {
            out.push_str(line);
        }
        cursor = hunk.old_start;

        for op in &hunk.ops {
            match op {
                PatchOp::Context(expected) => {
                    if old.get(cursor).copied() != Some(expected.as_str()) {
                        return Err(PatchError::HunkMismatch(cursor));
                    }
                    out.push_str(expected);
                    cursor += 1;
                }
                PatchOp::Delete(expected) => {
                    if old.get(cursor).copied() != Some(expected.as_str()) {
                        return Err(PatchError::HunkMismatch(cursor));
                    }
                    cursor += 1;
                }
                PatchOp::Insert(line) => {
                    out.push_str(line);
                }
            }
        }
    }

    // Copy the unchanged tail.
    for line in &old[cursor..] {
        out.push_str(line);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const BASE: &str = "<mxfile>\n  <diagram id=\"a\" name=\"A\">\n    <mxCell id=\"1\"/>\n  </diagram>\n</mxfile>\n";
    const TARGET: &str = "<mxfile>\n  <diagram id=\"a\" name=\"A\">\n    <mxCell id=\"1\"/>\n    <mxCell id=\"2\"/>\n  </diagram>\n</mxfile>\n";

    #[test]
    fn roundtrip_reconstructs_target() {
        let patch = compute_patch(BASE, TARGET);
        assert_eq!(apply_patch(BASE, &patch).unwrap(), TARGET);
    }

    #[test]
    fn roundtrip_through_encoded_blob() {
        let blob = compute_patch(BASE, TARGET).encode();
        let patch = Patch::decode(&blob).unwrap();
        assert_eq!(apply_patch(BASE, &patch).unwrap(), TARGET);
    }

    #[test]
    fn identical_inputs_produce_empty_patch() {
        let patch = compute_patch(BASE, BASE);
        assert!(patch.is_empty());
        assert_eq!(apply_patch(BASE, &patch).unwrap(), BASE);
    }

    #[test]
    fn compute_is_deterministic() {
        let a = compute_patch(BASE, TARGET).encode();
        let b = compute_patch(BASE, TARGET).encode();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_base_is_rejected() {
        let patch = compute_patch(BASE, TARGET);
        let sibling = BASE.replace("name=\"A\"", "name=\"B\"");
        assert_matches!(apply_patch(&sibling, &patch), Err(PatchError::BaseMismatch));
    }

    #[test]
    fn empty_base_roundtrips() {
        let patch = compute_patch("", TARGET);
        assert_eq!(apply_patch("", &patch).unwrap(), TARGET);
    }

    #[test]
    fn empty_target_roundtrips() {
        let patch = compute_patch(BASE, "");
        assert_eq!(apply_patch(BASE, &patch).unwrap(), "");
    }

    #[test]
    fn missing_trailing_newline_roundtrips() {
        let base = "a\nb\nc";
        let target = "a\nB\nc";
        let patch = compute_patch(base, target);
        assert_eq!(apply_patch(base, &patch).unwrap(), target);
    }

    #[test]
    fn deletion_in_the_middle_roundtrips() {
        let base = "one\ntwo\nthree\nfour\n";
        let target = "one\nfour\n";
        let patch = compute_patch(base, target);
        assert_eq!(apply_patch(base, &patch).unwrap(), target);
    }

    #[test]
    fn distant_edits_produce_multiple_hunks() {
        let base: String = (0..40).map(|i| format!("line {i}\n")).collect();
        let target = base.replace("line 2\n", "line 2 edited\n").replace(
            "line 37\n",
            "line 37 edited\n",
        );
        let patch = compute_patch(&base, &target);
        assert!(patch.hunks.len() >= 2);
        assert_eq!(apply_patch(&base, &patch).unwrap(), target);
    }

    #[test]
    fn malformed_blob_is_rejected() {
        assert_matches!(Patch::decode("not json"), Err(PatchError::Malformed(_)));
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let mut patch = compute_patch(BASE, TARGET);
        patch.format = 99;
        let blob = patch.encode();
        assert_matches!(Patch::decode(&blob), Err(PatchError::UnsupportedFormat(99)));
    }

    #[test]
    fn digest_is_stable() {
        assert_eq!(content_digest("x"), content_digest("x"));
        assert_ne!(content_digest("x"), content_digest("y"));
        assert_eq!(content_digest("").len(), 64);
    }
}
