//! Scripted transport for unit tests

use crate::config::{PolitenessConfig, RetryConfig};
use crate::crawler::fetcher::{PageFetcher, RetryPolicy};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::transport::{FetchedPage, Transport, TransportError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum Scripted {
    Page(u16, String),
    Fail(TransportError),
}

/// Answers requests from per-URL queues
///
/// Each URL's responses are served in order and the last one repeats.
/// Unknown URLs get a 404.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        self.push(url, Scripted::Page(status, body.to_string()))
    }

    pub fn fail(&self, url: &str, error: TransportError) -> &Self {
        self.push(url, Scripted::Fail(error))
    }

    fn push(&self, url: &str, response: Scripted) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// Every requested URL, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<FetchedPage, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());

        let scripted = {
            let mut routes = self.routes.lock().unwrap();
            match routes.get_mut(url) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match scripted {
            Some(Scripted::Page(status, body)) => Ok(FetchedPage {
                final_url: url.to_string(),
                status,
                body,
            }),
            Some(Scripted::Fail(error)) => Err(error),
            None => Ok(FetchedPage {
                final_url: url.to_string(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

/// Politeness and backoff small enough for tests
pub fn fast_politeness() -> PolitenessConfig {
    PolitenessConfig {
        min_request_spacing_ms: 0,
        max_in_flight_per_host: 8,
    }
}

pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_backoff_ms: 1,
        backoff_multiplier: 2,
    }
}

pub fn test_fetcher(transport: Arc<ScriptedTransport>) -> PageFetcher {
    PageFetcher::new(
        transport,
        Arc::new(RateLimiter::new(fast_politeness())),
        RetryPolicy::from_config(&fast_retry()),
    )
}
