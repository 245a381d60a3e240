//! Database row structs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row. Version create input comes from the engine's
//! `NewVersion` DTO rather than a parallel type here.

pub mod document_version;
pub mod project;
