//! Bootstrap configuration for katalog-media
//!
//! Priority: command-line → `KATALOG_*` environment → TOML file → defaults.
//! Command-line overrides are applied by `main` after `MediaConfig::load`.

use katalog_common::config::{default_data_dir, env_override, load_toml_config, LoggingConfig};
use katalog_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file searched for in the user/system config directories
pub const CONFIG_FILE_NAME: &str = "katalog-media.toml";

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "KATALOG_MEDIA_CONFIG";

pub const DEFAULT_PORT: u16 = 5740;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Gcs,
    Filesystem,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcs" => Ok(StorageBackend::Gcs),
            "filesystem" | "fs" => Ok(StorageBackend::Filesystem),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// GCS bucket name
    pub bucket: Option<String>,
    /// GCS OAuth2 access token
    pub access_token: Option<String>,
    /// GCS API endpoint override (emulators)
    pub endpoint: Option<String>,
    /// Prefix of public object URLs
    pub public_base_url: Option<String>,
    /// Filesystem backend directory
    pub root: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            bucket: None,
            access_token: None,
            endpoint: None,
            public_base_url: None,
            root: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Minimum spacing between outbound fetches; 0 disables spacing
    pub min_interval_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            min_interval_ms: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}

/// katalog-media.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub bind_address: String,
    pub port: u16,
    pub database_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub fetch: FetchConfig,
    pub upload: UploadConfig,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            database_path: None,
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            fetch: FetchConfig::default(),
            upload: UploadConfig::default(),
        }
    }
}

impl MediaConfig {
    /// Load TOML (or defaults) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config: MediaConfig = load_toml_config(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(addr) = env_override("KATALOG_BIND_ADDRESS") {
            self.bind_address = addr;
        }
        if let Some(port) = env_override("KATALOG_PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("KATALOG_PORT is not a valid port: {}", port)))?;
        }
        if let Some(path) = env_override("KATALOG_DATABASE") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(level) = env_override("KATALOG_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(backend) = env_override("KATALOG_STORAGE_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(bucket) = env_override("KATALOG_GCS_BUCKET") {
            self.storage.bucket = Some(bucket);
        }
        if let Some(token) = env_override("KATALOG_GCS_ACCESS_TOKEN") {
            self.storage.access_token = Some(token);
        }
        if let Some(url) = env_override("KATALOG_PUBLIC_BASE_URL") {
            self.storage.public_base_url = Some(url);
        }
        if let Some(root) = env_override("KATALOG_STORAGE_ROOT") {
            self.storage.root = Some(PathBuf::from(root));
        }
        Ok(())
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::Gcs
            && self.storage.bucket.as_deref().map_or(true, |b| b.trim().is_empty())
        {
            return Err(Error::Config(
                "storage.bucket (or KATALOG_GCS_BUCKET) is required for the gcs backend".to_string(),
            ));
        }
        if self.fetch.timeout_secs == 0 || self.upload.timeout_secs == 0 {
            return Err(Error::Config("timeouts must be at least 1 second".to_string()));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("katalog.db"))
    }

    pub fn storage_root(&self) -> PathBuf {
        self.storage
            .root
            .clone()
            .unwrap_or_else(|| default_data_dir().join("media"))
    }

    /// Public URL prefix for the filesystem backend, served under `/media`
    pub fn filesystem_base_url(&self) -> String {
        self.storage
            .public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}/media", self.bind_address, self.port))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.upload.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "KATALOG_BIND_ADDRESS",
        "KATALOG_PORT",
        "KATALOG_DATABASE",
        "KATALOG_LOG_LEVEL",
        "KATALOG_STORAGE_BACKEND",
        "KATALOG_GCS_BUCKET",
        "KATALOG_GCS_ACCESS_TOKEN",
        "KATALOG_PUBLIC_BASE_URL",
        "KATALOG_STORAGE_ROOT",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let config = MediaConfig::default();
        assert_eq!(config.port, 5740);
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.upload.timeout_secs, 60);
        assert_eq!(config.filesystem_base_url(), "http://127.0.0.1:5740/media");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: MediaConfig = toml::from_str(
            r#"
            port = 6000

            [storage]
            backend = "gcs"
            bucket = "katalog-photos"

            [fetch]
            min_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.storage.backend, StorageBackend::Gcs);
        assert_eq!(config.storage.bucket.as_deref(), Some("katalog-photos"));
        assert_eq!(config.fetch.timeout_secs, 30);
        assert_eq!(config.fetch.min_interval_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gcs_requires_bucket() {
        let mut config = MediaConfig::default();
        config.storage.backend = StorageBackend::Gcs;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_env_overrides_toml() {
        clear_env();
        std::env::set_var("KATALOG_PORT", "6100");
        std::env::set_var("KATALOG_STORAGE_BACKEND", "gcs");
        std::env::set_var("KATALOG_GCS_BUCKET", "from-env");
        std::env::set_var("KATALOG_GCS_ACCESS_TOKEN", "secret");

        let mut config = MediaConfig::default();
        config.storage.bucket = Some("from-toml".to_string());
        config.apply_env_overrides().unwrap();
        clear_env();

        assert_eq!(config.port, 6100);
        assert_eq!(config.storage.backend, StorageBackend::Gcs);
        assert_eq!(config.storage.bucket.as_deref(), Some("from-env"));
        assert_eq!(config.storage.access_token.as_deref(), Some("secret"));
    }

    #[test]
    #[serial]
    fn test_invalid_env_port() {
        clear_env();
        std::env::set_var("KATALOG_PORT", "not-a-port");

        let result = MediaConfig::default().apply_env_overrides();
        clear_env();

        assert!(matches!(result, Err(Error::Config(_))));
    }
}
