//! Per-host politeness
//!
//! Every outbound request, listing page or article, acquires a [`HostPermit`]
//! first. Acquisition enforces two limits per host:
//! - a minimum spacing between request starts
//! - a ceiling on requests in flight at once
//!
//! The host table lock is only held to read or update counters; waiting for
//! an in-flight permit and sleeping out the spacing happen outside it.

use crate::config::PolitenessConfig;
use crate::state::HostState;
use crate::url::host_key;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::OwnedSemaphorePermit;

/// Held for the duration of one request; dropping it frees the in-flight slot
#[derive(Debug)]
pub struct HostPermit {
    host: String,
    _permit: Option<OwnedSemaphorePermit>,
}

impl HostPermit {
    pub fn host(&self) -> &str {
        &self.host
    }
}

/// Shared per-host rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    config: PolitenessConfig,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl RateLimiter {
    pub fn new(config: PolitenessConfig) -> Self {
        Self {
            config,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    fn hosts(&self) -> std::sync::MutexGuard<'_, HashMap<String, HostState>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until a request to `url`'s host may start
    ///
    /// URLs without a host are not limited; the request will fail on its own.
    /// Cancelling the returned future at any point leaks nothing: the
    /// in-flight permit is released on drop and an unused spacing reservation
    /// only delays the next caller.
    pub async fn acquire(&self, url: &str) -> HostPermit {
        let Some(host) = host_key(url) else {
            return HostPermit {
                host: String::new(),
                _permit: None,
            };
        };

        let semaphore = {
            let mut hosts = self.hosts();
            let state = hosts
                .entry(host.clone())
                .or_insert_with(|| HostState::new(&self.config));
            state.in_flight.clone()
        };

        // The semaphore is never closed
        let permit = semaphore.acquire_owned().await.ok();

        let wait = {
            let mut hosts = self.hosts();
            let state = hosts
                .entry(host.clone())
                .or_insert_with(|| HostState::new(&self.config));
            state.reserve_slot(self.config.min_request_spacing(), Instant::now())
        };

        if !wait.is_zero() {
            tracing::trace!(host = %host, wait_ms = wait.as_millis() as u64, "Spacing request");
            tokio::time::sleep(wait).await;
        }

        HostPermit {
            host,
            _permit: permit,
        }
    }

    /// Notes an HTTP 429 from the host
    pub fn record_throttled(&self, url: &str) {
        let Some(host) = host_key(url) else {
            return;
        };
        if let Some(state) = self.hosts().get_mut(&host) {
            state.record_throttled();
            tracing::warn!(host = %host, count = state.throttled_count, "Host is throttling requests");
        }
    }

    /// Requests started against a host so far
    pub fn request_count(&self, host: &str) -> u64 {
        self.hosts().get(host).map_or(0, |s| s.request_count)
    }

    pub fn throttled_count(&self, host: &str) -> u32 {
        self.hosts().get(host).map_or(0, |s| s.throttled_count)
    }

    /// Requests to a host currently holding a permit
    pub fn in_flight(&self, host: &str) -> usize {
        self.hosts()
            .get(host)
            .map_or(0, |s| s.in_flight_count(&self.config))
    }
}
