//! HTTP transport with rate limiting for catalog sites
//!
//! This module provides the cross-origin GET primitive the fetcher is built
//! on: a [`Transport`] trait and a reqwest-backed implementation that spaces
//! requests out so rapid hovering does not hammer the catalog servers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::debug;

use crate::error::{FetchFailure, Result};
use crate::types::RemoteResponse;

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default Accept-Language header; the catalogs serve Japanese and English pages
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9,ja;q=0.8";

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8";

/// A GET primitive able to reach any catalog origin.
///
/// Implementations return every HTTP answer, whatever its status; status
/// interpretation is left to [`RemoteFetcher`](crate::fetcher::RemoteFetcher).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one GET request.
    async fn get(&self, url: &str) -> std::result::Result<RemoteResponse, FetchFailure>;
}

/// Rate limiter to control request frequency
///
/// Ensures that requests are spaced at least `min_interval` apart.
pub struct RateLimiter {
    /// Minimum interval between requests
    min_interval: Duration,
    /// Timestamp of the last request
    last_request: Arc<Mutex<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the specified requests per second
    ///
    /// A rate that is not a positive number disables limiting.
    ///
    /// # Example
    /// ```
    /// use nyaa_preview_core::client::RateLimiter;
    ///
    /// let limiter = RateLimiter::new(2.0); // 2 requests per second
    /// ```
    pub fn new(requests_per_second: f64) -> Self {
        let min_interval = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            Duration::try_from_secs_f64(1.0 / requests_per_second).unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };
        let now = Instant::now();
        Self {
            min_interval,
            last_request: Arc::new(Mutex::new(now.checked_sub(min_interval).unwrap_or(now))),
        }
    }

    /// Acquire permission to make a request
    ///
    /// Waits if necessary so the minimum interval between requests is respected.
    pub async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();

        if elapsed < self.min_interval {
            let wait_time = self.min_interval - elapsed;
            debug!(wait_ms = wait_time.as_millis() as u64, "rate limiting request");
            sleep(wait_time).await;
        }

        *last = Instant::now();
    }

    /// Get the minimum interval between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

/// Configuration for the catalog HTTP transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum requests per second (default: 4.0)
    pub requests_per_second: f64,
    /// Request timeout in seconds (default: 15)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 4.0,
            timeout_secs: 15,
        }
    }
}

/// reqwest-backed [`Transport`] with rate limiting
///
/// Redirects are followed; the final URL is reported in the response so
/// relative links in the page resolve correctly.
pub struct HttpTransport {
    /// Underlying HTTP client
    client: reqwest::Client,
    /// Rate limiter for request throttling
    rate_limiter: RateLimiter,
}

impl HttpTransport {
    /// Create a new transport with default configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn new() -> Result<Self> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new transport with custom configuration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created
    pub fn with_config(config: &ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(DEFAULT_ACCEPT));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
        );

        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.requests_per_second),
        })
    }

    /// Get a reference to the rate limiter (for testing)
    #[cfg(test)]
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> std::result::Result<RemoteResponse, FetchFailure> {
        self.rate_limiter.acquire().await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::from_reqwest(&e))?;

        Ok(RemoteResponse {
            status,
            url: final_url,
            body: body.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(2.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_rate_limiter_different_rates() {
        let limiter = RateLimiter::new(1.0);
        assert_eq!(limiter.min_interval(), Duration::from_secs(1));

        let limiter = RateLimiter::new(4.0);
        assert_eq!(limiter.min_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_rate_limiter_disabled_for_non_positive_rate() {
        assert_eq!(RateLimiter::new(0.0).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(-1.0).min_interval(), Duration::ZERO);
        assert_eq!(RateLimiter::new(f64::NAN).min_interval(), Duration::ZERO);
    }

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.requests_per_second, 4.0);
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn test_client_config_partial_json() {
        let config: ClientConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.requests_per_second, 4.0);
    }

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new().is_ok());
    }

    #[test]
    fn test_transport_with_custom_config() {
        let config = ClientConfig {
            requests_per_second: 1.0,
            timeout_secs: 60,
        };
        let transport = HttpTransport::with_config(&config).unwrap();
        assert_eq!(transport.rate_limiter().min_interval(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_rate_limiter_acquire() {
        let limiter = RateLimiter::new(10.0); // 100ms interval

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        // Second acquire should wait at least 100ms
        assert!(elapsed >= Duration::from_millis(100));
    }
}
