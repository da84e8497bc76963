///! Bounded HTTP fetcher
///!
///! One GET with a hard per-attempt timeout, retried a small number of
///! times with a growing delay. Everything the harvest pipeline downloads
///! goes through the `PageFetcher` trait so tests can substitute scripted
///! page sets and count calls.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::error::HarvestError;

const REQUEST_TIMEOUT_SECONDS: u64 = 15;
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_MS: u64 = 500;
const USER_AGENT: &str = concat!("skylore/", env!("CARGO_PKG_VERSION"));

/// Fetches one page body by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String, HarvestError>;
}

/// Production fetcher backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_config(REQUEST_TIMEOUT_SECONDS, MAX_RETRIES, RETRY_DELAY_MS)
    }

    /// Build with explicit timeout/retry settings (driven by server config).
    pub fn with_config(timeout_secs: u64, max_retries: u32, retry_delay_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            max_retries: max_retries.max(1),
            retry_delay: Duration::from_millis(retry_delay_ms),
        })
    }

    async fn fetch_attempt(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error {} for {}", response.status(), url);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, HarvestError> {
        for attempt in 1..=self.max_retries {
            if attempt > 1 {
                let delay = self.retry_delay * attempt;
                tracing::debug!(
                    "Retrying {} after {:?} (attempt {}/{})",
                    url,
                    delay,
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(delay).await;
            }

            match self.fetch_attempt(url).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        self.max_retries,
                        url,
                        e
                    );
                }
            }
        }

        Err(HarvestError::Unavailable {
            url: url.to_string(),
            attempts: self.max_retries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires network connection
    async fn test_fetch_live_page() {
        let fetcher = HttpFetcher::new().unwrap();
        let result = fetcher.fetch_page("https://www.example.com/").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_exhausts_retries() {
        // Non-routable port on localhost fails fast without real backoff cost.
        let fetcher = HttpFetcher::with_config(1, 2, 1).unwrap();
        let result = fetcher.fetch_page("http://127.0.0.1:9/none").await;
        match result {
            Err(HarvestError::Unavailable { attempts, .. }) => assert_eq!(attempts, 2),
            Ok(_) => panic!("expected failure"),
        }
    }
}
