//! Object storage for migrated photos
//!
//! Backends:
//! - `GcsObjectStore`: Google Cloud Storage over its XML API
//! - `FilesystemObjectStore`: local directory served under a public base URL

mod filesystem;
mod gcs;

pub use filesystem::FilesystemObjectStore;
pub use gcs::GcsObjectStore;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::OwnerKind;

/// Cache header applied to every uploaded object
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

/// Object storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Object storage unavailable: {0}")]
    Unavailable(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

/// Result of a storage connectivity check
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub reachable: bool,
    pub container_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Object storage operations used by the migration and photo deletion
///
/// Implementations must be safe to call concurrently with different keys.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return its public URL
    async fn upload(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String, StoreError>;

    /// Remove `key`; `StoreError::NotFound` when it does not exist
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Verify the backend and its target container are reachable
    async fn check_connection(&self) -> StoreHealth;

    /// Recover the object key from a public URL this store produced
    fn key_for_url(&self, url: &str) -> Option<String>;
}

/// File extension for a normalized content type
pub fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Key for a migrated photo:
/// `{ownerKindPlural}/{entityId}/migrated-{position}-{uuid}.{ext}`
///
/// The random suffix keeps keys distinct across runs and entities.
pub fn migration_key(owner_kind: OwnerKind, entity_id: i64, position: i32, content_type: &str) -> String {
    format!(
        "{}/{}/migrated-{}-{}.{}",
        owner_kind.key_prefix(),
        entity_id,
        position,
        Uuid::new_v4(),
        extension_for(content_type)
    )
}

/// Reject keys that are empty, absolute or escape the container
pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let escapes = key.split('/').any(|segment| segment == ".." || segment == ".");
    if key.is_empty() || key.starts_with('/') || key.contains('\\') || escapes {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Strip `base` (with or without trailing slash) from `url`
pub(crate) fn strip_base_url(base: &str, url: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    let rest = url.strip_prefix(base)?.strip_prefix('/')?;
    let key = rest.split(['?', '#']).next().unwrap_or_default();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
