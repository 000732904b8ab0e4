//! Local directory backend
//!
//! Layout: `{root}/{key}`. The root directory is the container; it must
//! already exist; subdirectories are created on demand. Writes go to a
//! temporary sibling file and are renamed into place.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{strip_base_url, validate_key, ObjectStore, StoreError, StoreHealth};

pub struct FilesystemObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn ensure_root(&self) -> Result<(), StoreError> {
        match fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(StoreError::Unavailable(format!(
                "storage root {} is not accessible: {}",
                self.root.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn upload(&self, bytes: Vec<u8>, key: &str, _content_type: &str) -> Result<String, StoreError> {
        validate_key(key)?;
        self.ensure_root().await?;

        let path = self.full_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        }

        let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        let write_result = async {
            let mut file = fs::File::create(&tmp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            fs::rename(&tmp_path, &path).await
        }
        .await;

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(StoreError::Unavailable(e.to_string()));
        }

        let public_url = format!("{}/{}", self.public_base_url, key);
        tracing::debug!(key = %key, bytes = bytes.len(), "Stored object on filesystem");
        Ok(public_url)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;

        match fs::remove_file(self.full_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.to_string())),
            Err(e) => Err(StoreError::Unavailable(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;

        fs::try_exists(self.full_path(key))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn check_connection(&self) -> StoreHealth {
        match self.ensure_root().await {
            Ok(()) => StoreHealth {
                reachable: true,
                container_exists: true,
                error: None,
            },
            Err(e) => StoreHealth {
                reachable: true,
                container_exists: false,
                error: Some(e.to_string()),
            },
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        strip_base_url(&self.public_base_url, url)
    }
}
