//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Single GET requests for pages and images
//! - Bounded redirect following
//! - Content-type checks and charset-aware decoding of pages
//! - Error classification
//!
//! The fetcher never retries. Retries are layered on top by
//! [`crate::crawler::RetryingFetcher`].

use crate::config::FetcherConfig;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// What a fetched resource is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Page,
    Image,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Image => "image",
        }
    }
}

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Response body: UTF-8 text for pages, raw bytes for images
    pub bytes: Vec<u8>,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Final URL after redirects
    pub final_url: String,
}

/// Failure of a single fetch
///
/// Page-level and image-level fetch failures are absorbed by the coordinator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("too many redirects")]
    TooManyRedirects,

    #[error("not an HTML document: {0}")]
    NotHtml(String),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl FetchError {
    /// Returns true for failures that may succeed on a later attempt
    ///
    /// | Condition | Transient |
    /// |-----------|-----------|
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | HTTP 5xx | yes |
    /// | HTTP 4xx | no |
    /// | Redirect overflow | no |
    /// | Non-HTML page | no |
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) => true,
            Self::Status(code) => *code >= 500,
            _ => false,
        }
    }

    fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_redirect() {
            Self::TooManyRedirects
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            Self::Body(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// Returns true if a page response with this Content-Type should be parsed
///
/// A missing header is treated as HTML.
pub fn is_html(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime == "text/html" || mime == "application/xhtml+xml"
}

/// Retrieves a single resource
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Issues one GET request for `url`
    ///
    /// For [`ResourceKind::Page`] a non-HTML response is a
    /// [`FetchError::NotHtml`] and the body is returned decoded to UTF-8.
    async fn fetch(&self, url: &Url, kind: ResourceKind) -> Result<Fetched, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use site_harvester::config::FetcherConfig;
/// use site_harvester::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(config.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Builds a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url, kind: ResourceKind) -> Result<Fetched, FetchError> {
        tracing::trace!("GET {} ({})", url, kind.as_str());

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = match kind {
            ResourceKind::Page => {
                if !is_html(content_type.as_deref()) {
                    return Err(FetchError::NotHtml(content_type.unwrap_or_default()));
                }
                // Transcodes using the charset of the Content-Type header
                let text = response.text().await.map_err(FetchError::from_reqwest)?;
                text.into_bytes()
            }
            ResourceKind::Image => response
                .bytes()
                .await
                .map_err(FetchError::from_reqwest)?
                .to_vec(),
        };

        Ok(Fetched {
            bytes,
            content_type,
            final_url,
        })
    }
}
