//! spscring - Lock-Free Bounded Single-Producer Single-Consumer Ring
//!
//! A fixed power-of-two ring buffer handed between exactly two threads, plus a
//! small harness that measures put-to-get handoff latency into an HDR
//! histogram.
//!
//! # Key Features
//!
//! - Release/acquire index publication, no locks, no count field
//! - Cache-padded indices and locally cached opposite index
//! - Blocking `put`/`get` with adaptive backoff (spin → yield)
//! - Explicit, idempotent `close` with drain-then-end-of-stream semantics
//! - Single-producer/single-consumer discipline enforced by the type system
//!
//! # Example
//!
//! ```
//! use spscring_rs::Ring;
//! use std::thread;
//!
//! let (mut producer, consumer) = Ring::<u64>::new(1024).unwrap();
//!
//! let handle = thread::spawn(move || {
//!     for i in 0..10_000 {
//!         producer.put(i).unwrap();
//!     }
//!     producer.close();
//! });
//!
//! // Iteration ends once the ring is closed and drained.
//! let received: Vec<u64> = consumer.collect();
//! handle.join().unwrap();
//!
//! assert_eq!(received.len(), 10_000);
//! assert!(received.windows(2).all(|w| w[0] + 1 == w[1]));
//! ```

mod backoff;
mod clock;
mod config;
mod error;
pub mod harness;
mod invariants;
mod latency;
mod metrics;
mod ring;

pub use backoff::Backoff;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{Capacity, Config, LOW_LATENCY_CONFIG, SHARED_HOST_CONFIG};
pub use error::{PutError, RingError, TryGetError, TryPutError};
pub use harness::{BenchConfig, HarnessError, LatencyReport};
pub use latency::{
    LatencyError, LatencyHistogram, LatencySink, LatencySummary, HIGHEST_TRACKABLE_NANOS,
    LOWEST_DISCERNIBLE_NANOS, SIGNIFICANT_FIGURES,
};
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::{Consumer, Producer, Ring};
