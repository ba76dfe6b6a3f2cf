//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod annotation_repo;
pub mod annotator_repo;
pub mod fullview_validation_log_repo;
pub mod photo_repo;

pub use annotation_repo::AnnotationRepo;
pub use annotator_repo::AnnotatorRepo;
pub use fullview_validation_log_repo::FullviewValidationLogRepo;
pub use photo_repo::PhotoRepo;
