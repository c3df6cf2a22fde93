//! Blocking HTTP fetcher. One GET per call, status must be 200; no retries and no delay.
//!
//! The request timeout is off unless configured: a hung request holds its worker slot.

use crate::scraper::error::ScraperError;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; novelscraper/",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const MAX_REDIRECTS: usize = 10;

/// Single blocking content retrieval. Shared by reference across pool workers, hence `Sync`.
pub trait Fetch: Sync {
    /// GET `url` and return the raw body. Non-200 responses are [ScraperError::HttpStatus].
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError>;

    /// GET `url` and decode the body as UTF-8, replacing invalid sequences.
    fn fetch_text(&self, url: &str) -> Result<String, ScraperError> {
        let bytes = self.fetch_bytes(url)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// reqwest-backed [Fetch] implementation.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::blocking::Client,
}

impl HttpClient {
    /// Client with the default User-Agent and no timeout.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }
}

impl Fetch for HttpClient {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        debug!(%url, "Sending GET request");
        let response = self
            .inner
            .get(url)
            .send()
            .map_err(|e| ScraperError::Network {
                url: url.to_string(),
                source: e,
            })?;
        let status = response.status();
        if status != StatusCode::OK {
            debug!(%url, status = status.as_u16(), "Request failed");
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ScraperError::BodyRead {
                url: url.to_string(),
                source: e,
            })
    }
}

/// Builder for [HttpClient] with optional User-Agent and timeout.
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

impl HttpClientBuilder {
    /// Set a custom User-Agent. If not set, a default identifying the tool is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set a per-request timeout in seconds. Unset means requests may block indefinitely.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(self.timeout_secs.map(Duration::from_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(HttpClient { inner })
    }
}
