//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&DbPool` as the first argument.

pub mod annotation_repo;
pub mod document_repo;

pub use annotation_repo::AnnotationRepo;
pub use document_repo::DocumentRepo;
