//! Services for legacy media migration

pub mod image_fetcher;
pub mod image_normalizer;
pub mod migration_orchestrator;
pub mod object_store;
pub mod photo_removal;
pub mod status_reporter;

pub use image_fetcher::{FetchError, HttpImageFetcher, ImageFetcher};
pub use image_normalizer::{
    normalize, normalize_or_passthrough, NormalizationError, NormalizeProfile, NormalizedImage,
};
pub use migration_orchestrator::MigrationOrchestrator;
pub use object_store::{
    FilesystemObjectStore, GcsObjectStore, ObjectStore, StoreError, StoreHealth,
};
pub use photo_removal::{PhotoRemoval, PhotoRemovalError};
pub use status_reporter::{MigrationStatusReport, StatusReporter, ValidationReport};
