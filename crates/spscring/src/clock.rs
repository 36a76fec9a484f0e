//! Clock sources for latency measurement.
//!
//! The harness takes its clock as a parameter rather than reaching for a
//! global, so tests can substitute a deterministic [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A monotonic nanosecond clock shared by the producer and consumer threads.
pub trait Clock: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin. Never decreases.
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> u64 {
        (**self).now()
    }
}

/// Wall-independent clock backed by [`Instant`].
///
/// Readings are nanoseconds since the clock was created, so both threads of a
/// benchmark see the same origin.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Deterministic clock that advances by a fixed step on every read.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
    step: u64,
}

impl ManualClock {
    /// Starts at `start` and advances `step` nanoseconds per [`Clock::now`].
    pub fn new(start: u64, step: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
            step,
        }
    }

    /// Moves the clock forward without taking a reading.
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::SeqCst);
    }

    /// Current value without advancing.
    pub fn peek(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.fetch_add(self.step, Ordering::SeqCst)
    }
}
