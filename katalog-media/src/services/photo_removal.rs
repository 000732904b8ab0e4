//! Photo deletion
//!
//! The stored object is removed best-effort: a missing object or an
//! unreachable store is logged and the catalog row is deleted anyway.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::CanonicalPhoto;
use crate::services::object_store::{ObjectStore, StoreError};

#[derive(Debug, Error)]
pub enum PhotoRemovalError {
    #[error("Photo {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct PhotoRemoval {
    catalog: Arc<dyn CatalogRepository>,
    store: Arc<dyn ObjectStore>,
}

impl PhotoRemoval {
    pub fn new(catalog: Arc<dyn CatalogRepository>, store: Arc<dyn ObjectStore>) -> Self {
        Self { catalog, store }
    }

    /// Delete a photo record and, when possible, its stored object
    pub async fn remove(&self, photo_id: i64) -> Result<CanonicalPhoto, PhotoRemovalError> {
        let photo = self
            .catalog
            .find_photo(photo_id)
            .await?
            .ok_or(PhotoRemovalError::NotFound(photo_id))?;

        match self.store.key_for_url(&photo.url) {
            Some(key) => match self.store.delete(&key).await {
                Ok(()) => info!(photo_id, key = %key, "Deleted stored object"),
                Err(StoreError::NotFound(_)) => {
                    warn!(photo_id, key = %key, "Stored object already missing")
                }
                Err(e) => warn!(photo_id, key = %key, error = %e, "Failed to delete stored object"),
            },
            None => warn!(
                photo_id,
                url = %photo.url,
                "Photo URL is not served by this store, leaving object untouched"
            ),
        }

        if !self.catalog.delete_photo(photo_id).await? {
            return Err(PhotoRemovalError::NotFound(photo_id));
        }

        info!(photo_id, "Deleted photo record");
        Ok(photo)
    }
}
