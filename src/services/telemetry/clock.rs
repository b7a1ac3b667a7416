//! Time Source
//!
//! Time abstraction so cooldown windows, fallback density and build
//! timings can be driven deterministically in tests. Timestamps are wall
//! clock; build durations come from a monotonic source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Source of the current time.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Whole milliseconds since the Unix epoch, used for sample and event timestamps.
    fn now_ms(&self) -> u64;

    /// Fractional milliseconds from an arbitrary origin, used only to time
    /// governed builds. Must not go backwards.
    fn now_precise_ms(&self) -> f64 {
        self.now_ms() as f64
    }
}

/// Wall clock for timestamps, monotonic `Instant` for build durations.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }

    fn now_precise_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
