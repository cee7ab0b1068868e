use crate::parser;
use crate::types::{RawEntry, ReaderError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "rss-reader/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 1,
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

/// The feed-fetching seam: anything that can turn a feed URL into raw
/// entries. Sessions only see this trait, so tests can substitute canned
/// feeds for the network.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>>;
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Self {
        let redirects = if config.follow_redirects {
            reqwest::redirect::Policy::limited(config.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(redirects)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    async fn fetch_content(&self, url: &str) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            multiplier: 2.0,
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.try_fetch(url).await {
                Ok(content) => {
                    debug!("fetched {} ({} bytes)", url, content.len());
                    return Ok(content);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "attempt {} failed for {}, retrying in {:?}",
                                attempt + 1,
                                url,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ReaderError::Parse(format!("no fetch attempts made for {}", url))))
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl FetchFeed for Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<RawEntry>> {
        debug!("fetching feed: {}", url);
        let content = self.fetch_content(url).await?;
        parser::parse_feed(&content)
    }
}
