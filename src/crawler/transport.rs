//! HTTP transport
//!
//! The engine talks to the network only through [`Transport`], so tests can
//! script responses without a server. [`HttpTransport`] is the reqwest-backed
//! implementation used in production.

use crate::config::{HttpConfig, DEFAULT_USER_AGENT};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

/// A response body together with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures below the HTTP status level
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("redirect failed: {0}")]
    Redirect(String),

    #[error("undecodable body: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// True for failures worth another attempt
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            Self::InvalidRequest(_) | Self::Redirect(_) | Self::Decode(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else if e.is_redirect() {
            Self::Redirect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// Issues a single GET request
///
/// Non-2xx statuses are returned as pages, not errors; retry decisions are
/// made by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedPage, TransportError>;
}

/// reqwest-backed transport with a rotating user-agent pool
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    user_agents: Vec<String>,
    next_agent: AtomicUsize,
}

impl HttpTransport {
    /// Builds the HTTP client from configuration
    ///
    /// No cookie store is enabled; every request is independent.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        let user_agents = if config.user_agents.is_empty() {
            vec![DEFAULT_USER_AGENT.to_string()]
        } else {
            config.user_agents.clone()
        };

        Ok(Self {
            client,
            user_agents,
            next_agent: AtomicUsize::new(0),
        })
    }

    /// Next user agent in round-robin order
    fn user_agent(&self) -> &str {
        let index = self.next_agent.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        &self.user_agents[index]
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<FetchedPage, TransportError> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent())
            .send()
            .await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(FetchedPage {
            final_url,
            status,
            body,
        })
    }
}
