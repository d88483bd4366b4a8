//! Consecutive-failure circuit breaker
//!
//! Trips once `threshold` article fetches in a row end in an error record.
//! Any success resets the count. A threshold of 0 disables the breaker.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

#[derive(Debug)]
pub struct FailureBreaker {
    threshold: u32,
    consecutive: AtomicU32,
    tripped: AtomicBool,
}

impl FailureBreaker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: AtomicU32::new(0),
            tripped: AtomicBool::new(false),
        }
    }

    /// Records one outcome; returns true only for the call that trips the breaker
    pub fn record(&self, success: bool) -> bool {
        if success {
            self.consecutive.store(0, Ordering::SeqCst);
            return false;
        }

        let failures = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        if self.threshold == 0 || failures < self.threshold {
            return false;
        }

        !self.tripped.swap(true, Ordering::SeqCst)
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }
}
