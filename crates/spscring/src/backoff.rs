use std::hint;
use std::thread;

/// Adaptive backoff for the blocking `put`/`get` paths (Crossbeam-style).
///
/// Progressively increases wait time: spin with PAUSE → yield to OS. Unlike a
/// try-lock backoff it never gives up; the ring waits until the other side
/// makes progress or the ring is closed.
#[derive(Debug)]
pub struct Backoff {
    step: u32,
    spin_limit: u32,
}

impl Backoff {
    /// Default spin limit: 2^6 = 64 spins max before yielding.
    pub const DEFAULT_SPIN_LIMIT: u32 = 6;
    /// Spin exponent is capped here regardless of configuration.
    pub const MAX_SPIN_LIMIT: u32 = 16;

    /// Creates a new backoff instance with the default spin limit.
    #[inline]
    pub fn new() -> Self {
        Self::with_spin_limit(Self::DEFAULT_SPIN_LIMIT)
    }

    /// Creates a backoff that spins up to `2^spin_limit` PAUSE hints per
    /// round before falling back to `thread::yield_now`.
    #[inline]
    pub fn with_spin_limit(spin_limit: u32) -> Self {
        Self {
            step: 0,
            spin_limit: spin_limit.min(Self::MAX_SPIN_LIMIT),
        }
    }

    /// Light spin with PAUSE hints.
    #[inline]
    pub fn spin(&mut self) {
        let spins = 1u32 << self.step.min(self.spin_limit);
        for _ in 0..spins {
            hint::spin_loop();
        }
        if self.step <= self.spin_limit {
            self.step += 1;
        }
    }

    /// Heavier backoff: spin until the limit, then yield every round.
    #[inline]
    pub fn snooze(&mut self) {
        if self.step <= self.spin_limit {
            self.spin();
        } else {
            thread::yield_now();
        }
    }

    /// True once spinning is exhausted and every `snooze` yields.
    #[inline]
    pub fn is_yielding(&self) -> bool {
        self.step > self.spin_limit
    }

    /// Reset for next wait cycle.
    #[inline]
    pub fn reset(&mut self) {
        self.step = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
