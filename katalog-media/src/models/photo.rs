//! Canonical photo records stored in the catalog

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::OwnerKind;

/// Position reserved for the migrated legacy main photo.
/// Gallery slots uploaded by users start at 1.
pub const MAIN_PHOTO_POSITION: i32 = 0;

/// Rejected owner combination for a photo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhotoOwnerError {
    #[error("Photo cannot belong to both a single item and a bundle")]
    BothOwners,

    #[error("Photo must belong to a single item or a bundle")]
    NoOwner,
}

/// The entity a photo belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoOwner {
    Single(i64),
    Bundle(i64),
}

impl PhotoOwner {
    /// Build from the two nullable owner columns
    pub fn from_columns(single: Option<i64>, bundle: Option<i64>) -> Result<Self, PhotoOwnerError> {
        match (single, bundle) {
            (Some(id), None) => Ok(PhotoOwner::Single(id)),
            (None, Some(id)) => Ok(PhotoOwner::Bundle(id)),
            (Some(_), Some(_)) => Err(PhotoOwnerError::BothOwners),
            (None, None) => Err(PhotoOwnerError::NoOwner),
        }
    }

    pub fn new(kind: OwnerKind, id: i64) -> Self {
        match kind {
            OwnerKind::Single => PhotoOwner::Single(id),
            OwnerKind::Bundle => PhotoOwner::Bundle(id),
        }
    }

    pub fn kind(&self) -> OwnerKind {
        match self {
            PhotoOwner::Single(_) => OwnerKind::Single,
            PhotoOwner::Bundle(_) => OwnerKind::Bundle,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            PhotoOwner::Single(id) | PhotoOwner::Bundle(id) => *id,
        }
    }
}

/// Catalog-visible photo record
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalPhoto {
    pub id: i64,
    owner: PhotoOwner,
    pub url: String,
    pub alt_text: String,
    pub position: i32,
}

impl CanonicalPhoto {
    /// Construct a photo from raw owner references
    ///
    /// Exactly one of `single_owner_id` / `bundle_owner_id` must be set.
    pub fn new(
        id: i64,
        single_owner_id: Option<i64>,
        bundle_owner_id: Option<i64>,
        url: String,
        alt_text: String,
        position: i32,
    ) -> Result<Self, PhotoOwnerError> {
        let owner = PhotoOwner::from_columns(single_owner_id, bundle_owner_id)?;
        Ok(Self::with_owner(id, owner, url, alt_text, position))
    }

    pub fn with_owner(id: i64, owner: PhotoOwner, url: String, alt_text: String, position: i32) -> Self {
        Self {
            id,
            owner,
            url,
            alt_text,
            position,
        }
    }

    pub fn owner(&self) -> PhotoOwner {
        self.owner
    }

    pub fn single_owner_id(&self) -> Option<i64> {
        match self.owner {
            PhotoOwner::Single(id) => Some(id),
            PhotoOwner::Bundle(_) => None,
        }
    }

    pub fn bundle_owner_id(&self) -> Option<i64> {
        match self.owner {
            PhotoOwner::Bundle(id) => Some(id),
            PhotoOwner::Single(_) => None,
        }
    }

    /// True for the migrated legacy main photo
    pub fn is_main_photo(&self) -> bool {
        self.position == MAIN_PHOTO_POSITION
    }
}

impl Serialize for CanonicalPhoto {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("CanonicalPhoto", 6)?;
        state.serialize_field("id", &self.id.to_string())?;
        state.serialize_field("singleOwnerId", &self.single_owner_id().map(|id| id.to_string()))?;
        state.serialize_field("bundleOwnerId", &self.bundle_owner_id().map(|id| id.to_string()))?;
        state.serialize_field("url", &self.url)?;
        state.serialize_field("altText", &self.alt_text)?;
        state.serialize_field("position", &self.position)?;
        state.end()
    }
}
