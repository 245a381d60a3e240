//! Pure domain logic for the mxvault versioned-document engine.
//!
//! This crate has no I/O and no internal dependencies: page metadata
//! extraction, the diff codec, the keyframe/diff chain policy, and the
//! shared entity + error types. Persistence and orchestration live in
//! `mxvault-db` and `mxvault-engine`.

pub mod chain;
pub mod diff;
pub mod error;
pub mod pages;
pub mod types;
pub mod version;

pub use error::CoreError;
