//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod document_version_repo;
pub mod project_repo;

pub use document_version_repo::DocumentVersionRepo;
pub use project_repo::ProjectRepo;
