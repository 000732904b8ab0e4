//! Catalog entities that still reference an externally hosted main photo

use serde::Serialize;

use super::{id_string, OwnerKind};

/// Owner of a legacy image reference
///
/// Single items and bundles share this shape; the owner kind tag decides
/// which catalog table the record came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigratableEntity {
    pub owner_kind: OwnerKind,
    #[serde(with = "id_string")]
    pub id: i64,
    pub display_name: String,
    pub legacy_image_url: Option<String>,
}

impl MigratableEntity {
    /// Legacy URL, if present and not blank
    pub fn legacy_image_url(&self) -> Option<&str> {
        self.legacy_image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Alt text recorded on the migrated main photo
    pub fn main_photo_alt_text(&self) -> String {
        format!("{} - Main Photo", self.display_name)
    }
}
