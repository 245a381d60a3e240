//! Versioned-document engine: store abstraction, materialization, and the
//! save/restore facade.
//!
//! The engine is backend-agnostic by construction: all persistence goes
//! through the [`store::VersionStore`] trait, with an in-memory
//! implementation in [`memory`] and a PostgreSQL adapter in `mxvault-db`.

pub mod error;
pub mod locks;
pub mod materializer;
pub mod memory;
pub mod service;
pub mod store;
pub mod wip;

pub use error::EngineError;
pub use service::{SaveVersionOptions, VersionManager};
pub use store::{NewVersion, StoreError, VersionStore};
