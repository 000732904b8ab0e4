//! Google Cloud Storage backend (XML API)
//!
//! Objects are written with uniform bucket-level access: no per-object ACL
//! is set, so the bucket itself must grant public read.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL as CACHE_CONTROL_HEADER, CONTENT_TYPE};
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::{strip_base_url, validate_key, ObjectStore, StoreError, StoreHealth, CACHE_CONTROL};

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// GCS bucket client
pub struct GcsObjectStore {
    http_client: reqwest::Client,
    endpoint: String,
    bucket: String,
    access_token: Option<String>,
    public_base_url: String,
    /// Bound on the bucket HEAD made by `check_connection`
    health_timeout: Duration,
    bucket_verified: AtomicBool,
}

impl GcsObjectStore {
    /// Create a client for `bucket`
    ///
    /// `endpoint` overrides the API host (emulators, tests); `public_base_url`
    /// overrides the URL prefix returned from uploads.
    pub fn new(
        bucket: impl Into<String>,
        access_token: Option<String>,
        endpoint: Option<String>,
        public_base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let bucket = bucket.into();
        if bucket.trim().is_empty() {
            return Err(StoreError::Unavailable("bucket name is not configured".to_string()));
        }

        let endpoint = endpoint
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();
        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("{}/{}", DEFAULT_ENDPOINT, bucket))
            .trim_end_matches('/')
            .to_string();

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            bucket,
            access_token,
            public_base_url,
            health_timeout: HEALTH_CHECK_TIMEOUT,
            bucket_verified: AtomicBool::new(false),
        })
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    fn bucket_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.bucket)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// HEAD the bucket; `timeout` overrides the client-wide request timeout
    async fn bucket_exists(&self, timeout: Option<Duration>) -> Result<bool, StoreError> {
        let mut request = self.authorized(self.http_client.head(self.bucket_url()));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Unavailable(format!(
                "bucket check returned HTTP {}",
                status.as_u16()
            ))),
        }
    }

    /// Confirm the bucket exists once; later uploads skip the check
    async fn ensure_bucket(&self) -> Result<(), StoreError> {
        if self.bucket_verified.load(Ordering::Acquire) {
            return Ok(());
        }

        if !self.bucket_exists(None).await? {
            return Err(StoreError::Unavailable(format!(
                "bucket '{}' does not exist or is not accessible",
                self.bucket
            )));
        }

        self.bucket_verified.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn upload(&self, bytes: Vec<u8>, key: &str, content_type: &str) -> Result<String, StoreError> {
        validate_key(key)?;
        self.ensure_bucket().await?;

        let size = bytes.len();
        let response = self
            .authorized(self.http_client.put(self.object_url(key)))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL_HEADER, CACHE_CONTROL)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!(
                "upload of {} returned HTTP {}: {}",
                key,
                status.as_u16(),
                body.trim()
            )));
        }

        let public_url = format!("{}/{}", self.public_base_url, key);
        tracing::info!(key = %key, bytes = size, url = %public_url, "Uploaded object to GCS");
        Ok(public_url)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;

        let response = self
            .authorized(self.http_client.delete(self.object_url(key)))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                tracing::info!(key = %key, "Deleted object from GCS");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(key.to_string())),
            status => Err(StoreError::Unavailable(format!(
                "delete of {} returned HTTP {}",
                key,
                status.as_u16()
            ))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;

        let response = self
            .authorized(self.http_client.head(self.object_url(key)))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(StoreError::Unavailable(format!(
                "existence check of {} returned HTTP {}",
                key,
                status.as_u16()
            ))),
        }
    }

    async fn check_connection(&self) -> StoreHealth {
        match self.bucket_exists(Some(self.health_timeout)).await {
            Ok(container_exists) => StoreHealth {
                reachable: true,
                container_exists,
                error: (!container_exists).then(|| format!("bucket '{}' not found", self.bucket)),
            },
            Err(e) => StoreHealth {
                reachable: false,
                container_exists: false,
                error: Some(e.to_string()),
            },
        }
    }

    fn key_for_url(&self, url: &str) -> Option<String> {
        strip_base_url(&self.public_base_url, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GcsObjectStore {
        GcsObjectStore::new("katalog-photos", None, None, None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_default_public_url_prefix() {
        let store = store();
        assert_eq!(
            store.key_for_url("https://storage.googleapis.com/katalog-photos/produks/1/migrated-0-a.jpg"),
            Some("produks/1/migrated-0-a.jpg".to_string())
        );
        assert_eq!(store.key_for_url("https://legacy.example.com/a.jpg"), None);
    }

    #[test]
    fn test_object_url() {
        assert_eq!(
            store().object_url("pakets/2/x.jpg"),
            "https://storage.googleapis.com/katalog-photos/pakets/2/x.jpg"
        );
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let result = GcsObjectStore::new("  ", None, None, None, Duration::from_secs(5));
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_unavailable() {
        let store = GcsObjectStore::new(
            "katalog-photos",
            None,
            Some("http://127.0.0.1:9".to_string()),
            None,
            Duration::from_secs(2),
        )
        .unwrap();

        let result = store.upload(vec![1, 2, 3], "produks/1/a.jpg", "image/jpeg").await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));

        let health = store.check_connection().await;
        assert!(!health.reachable);
        assert!(health.error.is_some());
    }

    #[tokio::test]
    async fn test_slow_bucket_check_times_out() {
        let app = axum::Router::new().route(
            "/katalog-photos",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                "ok"
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let store = GcsObjectStore::new(
            "katalog-photos",
            None,
            Some(format!("http://{}", addr)),
            None,
            Duration::from_secs(60),
        )
        .unwrap()
        .with_health_timeout(Duration::from_millis(200));

        let start = std::time::Instant::now();
        let health = store.check_connection().await;

        assert!(!health.reachable);
        assert!(!health.container_exists);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
