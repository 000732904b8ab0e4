//! Data models for the legacy media migration

pub mod entity;
pub mod migration_result;
pub mod options;
pub mod owner_kind;
pub mod photo;

pub use entity::MigratableEntity;
pub use migration_result::{MigrationOutcome, MigrationStats, MigrationStatus};
pub use options::{MigrationOptions, DRY_RUN_URL};
pub use owner_kind::{OwnerKind, OwnerScope};
pub use photo::{CanonicalPhoto, PhotoOwner, PhotoOwnerError, MAIN_PHOTO_POSITION};

/// Serialize catalog identifiers as strings
///
/// Catalog ids are 64-bit; JSON consumers that parse numbers as doubles
/// lose precision above 2^53.
pub(crate) mod id_string {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }
}
