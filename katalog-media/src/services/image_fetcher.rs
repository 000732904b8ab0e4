//! Remote image retrieval for legacy main-photo URLs
//!
//! Legacy hosts frequently reject non-browser clients, so requests carry a
//! browser User-Agent. Content-type is never trusted here: the normalizer
//! decides whether the bytes are an image.

use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/*,*/*;q=0.8";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Image fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    NetworkFailure(String),

    #[error("Failed to fetch image: HTTP {0}")]
    BadStatus(u16),
}

/// Source of raw image bytes
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download the body at `url`
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// HEAD `url`; true only for a success status with an `image/*` content-type
    async fn probe_accessible(&self, url: &str) -> bool;
}

/// Direct (unkeyed) limiter shared by every request of one fetcher
type RequestLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// reqwest-backed fetcher with a per-request timeout
pub struct HttpImageFetcher {
    http_client: reqwest::Client,
    /// `None` when requests are not spaced
    rate_limiter: Option<RequestLimiter>,
}

impl HttpImageFetcher {
    pub fn new(timeout: Duration, min_interval_ms: u64) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Quota::with_period(Duration::from_millis(min_interval_ms))
                .map(RateLimiter::direct),
        })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS), 0)
    }

    /// Wait for the next request slot, if spacing is configured
    async fn pace(&self) {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.pace().await;

        tracing::debug!(url = %url, "Downloading legacy image");

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, IMAGE_ACCEPT)
            .send()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::NetworkFailure(e.to_string()))?;

        tracing::debug!(url = %url, bytes = bytes.len(), "Downloaded legacy image");

        Ok(bytes.to_vec())
    }

    async fn probe_accessible(&self, url: &str) -> bool {
        self.pace().await;

        let response = match self.http_client.head(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "HEAD probe failed");
                return false;
            }
        };

        let is_image = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);

        response.status().is_success() && is_image
    }
}
