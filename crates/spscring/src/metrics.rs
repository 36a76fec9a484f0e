use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Optional counters for monitoring a ring.
///
/// Each counter has a single writer (the producer or the consumer), so
/// `Relaxed` increments are enough; snapshots are approximate while the ring
/// is in use and exact once both sides have stopped.
#[derive(Debug, Default)]
pub struct Metrics {
    items_put: AtomicU64,
    items_got: AtomicU64,
    put_waits: AtomicU64,
    get_waits: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_items_put(&self, n: u64) {
        self.items_put.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_items_got(&self, n: u64) {
        self.items_got.fetch_add(n, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_put_wait(&self) {
        self.put_waits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_get_wait(&self) {
        self.get_waits.fetch_add(1, Ordering::Relaxed);
    }

    /// Copies the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            items_put: self.items_put.load(Ordering::Relaxed),
            items_got: self.items_got.load(Ordering::Relaxed),
            put_waits: self.put_waits.load(Ordering::Relaxed),
            get_waits: self.get_waits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`Metrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Values successfully enqueued.
    pub items_put: u64,
    /// Values successfully dequeued.
    pub items_got: u64,
    /// Times a blocking `put` found the ring full and had to wait.
    pub put_waits: u64,
    /// Times a blocking `get` found the ring empty and had to wait.
    pub get_waits: u64,
}

impl MetricsSnapshot {
    /// Values enqueued but not yet dequeued at snapshot time.
    pub fn in_flight(&self) -> u64 {
        self.items_put.saturating_sub(self.items_got)
    }
}
