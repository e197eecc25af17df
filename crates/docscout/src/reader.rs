//! Reader-service content fetcher
//!
//! Converts a web page to readable text by prefixing its URL with the
//! reader endpoint (`https://r.jina.ai/<url>`). The conversion itself
//! happens remotely; this module only builds the request and surfaces
//! the response or the transport error.

use crate::error::{DocScoutError, Result};
use crate::{DEFAULT_READER_BASE, DEFAULT_USER_AGENT};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Total request timeout for reader calls
const READER_TIMEOUT: Duration = Duration::from_secs(60);

/// Reader fetcher options
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Reader endpoint the target URL is appended to
    pub reader_base: String,
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Total request timeout
    pub timeout: Duration,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            reader_base: DEFAULT_READER_BASE.to_string(),
            user_agent: None,
            timeout: READER_TIMEOUT,
        }
    }
}

impl ReaderOptions {
    /// Set the reader endpoint
    pub fn reader_base(mut self, base: impl Into<String>) -> Self {
        self.reader_base = base.into();
        self
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Fetches page text through the reader service
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    reader_base: String,
}

impl ContentFetcher {
    /// Create a fetcher with default options
    pub fn new() -> Result<Self> {
        Self::with_options(ReaderOptions::default())
    }

    /// Create a fetcher with custom options
    pub fn with_options(options: ReaderOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let user_agent = options.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/plain, text/markdown, */*;q=0.8"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .map_err(DocScoutError::ClientBuild)?;

        let mut reader_base = options.reader_base;
        if !reader_base.ends_with('/') {
            reader_base.push('/');
        }

        Ok(Self {
            client,
            reader_base,
        })
    }

    /// Build the reader URL for a target page
    pub fn reader_url(&self, url: &str) -> Result<String> {
        let target = validate_url(url)?;
        Ok(format!("{}{}", self.reader_base, target))
    }

    /// Fetch a page and return its readable text
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let reader_url = self.reader_url(url)?;
        debug!(url = %url, reader_url = %reader_url, "Fetching through reader");

        let response = self
            .client
            .get(&reader_url)
            .send()
            .await
            .map_err(DocScoutError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocScoutError::HttpStatus {
                status: status.as_u16(),
                url: reader_url,
            });
        }

        let body = response.text().await.map_err(DocScoutError::from_reqwest)?;
        Ok(filter_excessive_newlines(&body))
    }

    /// Count case-insensitive occurrences of `word` in a page
    pub async fn count_word(&self, url: &str, word: &str) -> Result<usize> {
        if word.is_empty() {
            return Err(DocScoutError::EmptyWord);
        }
        let content = self.fetch(url).await?;
        Ok(count_occurrences(&content, word))
    }
}

/// Check that `url` is an absolute http(s) URL
fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(DocScoutError::MissingUrl);
    }
    let parsed = Url::parse(url).map_err(|e| DocScoutError::InvalidUrl(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DocScoutError::InvalidUrl(format!(
            "{url}: unsupported scheme {other}, must be http or https"
        ))),
    }
}

/// Count non-overlapping, case-insensitive occurrences of `needle`
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    haystack
        .to_lowercase()
        .matches(needle.to_lowercase().as_str())
        .count()
}

/// Collapse runs of more than two newlines
fn filter_excessive_newlines(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push(c);
            }
        } else {
            newline_count = 0;
            result.push(c);
        }
    }

    result
}
