use crate::config::PolitenessConfig;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// Tracks the politeness state of one host during crawling
///
/// This structure maintains per-host information needed for request spacing
/// and the in-flight ceiling. It is only ever touched inside the rate
/// limiter's critical section; the semaphore is awaited outside of it.
#[derive(Debug, Clone)]
pub struct HostState {
    /// Number of requests started against this host in the current session
    pub request_count: u64,

    /// Earliest instant the next request may start
    pub next_slot: Option<Instant>,

    /// Number of HTTP 429 responses seen from this host
    pub throttled_count: u32,

    /// Permits for concurrently open requests to this host
    pub in_flight: Arc<Semaphore>,
}

impl HostState {
    /// Creates a new HostState sized by the politeness configuration
    pub fn new(config: &PolitenessConfig) -> Self {
        Self {
            request_count: 0,
            next_slot: None,
            throttled_count: 0,
            in_flight: Arc::new(Semaphore::new(config.max_in_flight_per_host.max(1) as usize)),
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// Reservations are handed out in call order, each at least `spacing`
    /// after the previous one, so concurrent callers never start together.
    pub fn reserve_slot(&mut self, spacing: Duration, now: Instant) -> Duration {
        let start = match self.next_slot {
            Some(slot) if slot > now => slot,
            _ => now,
        };

        self.next_slot = Some(start + spacing);
        self.request_count += 1;

        start.duration_since(now)
    }

    /// Records an HTTP 429 from this host
    pub fn record_throttled(&mut self) {
        self.throttled_count += 1;
    }

    /// Number of requests currently holding an in-flight permit
    pub fn in_flight_count(&self, config: &PolitenessConfig) -> usize {
        (config.max_in_flight_per_host.max(1) as usize)
            .saturating_sub(self.in_flight.available_permits())
    }
}
