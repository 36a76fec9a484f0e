//! Two-thread latency harness for the ring.
//!
//! A producer thread stamps each value with the injected [`Clock`] right
//! before `put`; the consumer reads the clock right after `get` returns and
//! records the difference. The producer closes the ring after its last put and
//! the consumer runs to end-of-stream, checking that sequence numbers arrive
//! contiguous and complete.

use crate::{
    Backoff, Clock, Config, LatencyError, LatencyHistogram, LatencySink, LatencySummary,
    MetricsSnapshot, Ring, RingError,
};
use serde::Serialize;
use std::env;
use std::io;
use std::str::FromStr;
use std::thread;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from a harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Ring(#[from] RingError),

    #[error(transparent)]
    Latency(#[from] LatencyError),

    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    /// The consumer saw values out of order or with a gap.
    #[error("sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    /// End-of-stream arrived before every value was received.
    #[error("consumer received {received} of {expected} values")]
    CountMismatch { expected: u64, received: u64 },

    /// The ring closed under the producer before it finished.
    #[error("ring closed after the producer sent {sent} values")]
    ProducerStopped { sent: u64 },

    #[error("failed to spawn {role} thread: {source}")]
    Spawn {
        role: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{0} thread panicked")]
    WorkerPanicked(&'static str),
}

/// Harness parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BenchConfig {
    /// Values to send through the ring (default: 1,000,000)
    pub samples: u64,
    /// Ring capacity (default: 8192)
    pub capacity: usize,
    /// Backoff spin exponent for both sides (default: 6)
    pub spin_limit: u32,
    /// CPU to pin the producer thread to, if any
    pub producer_cpu: Option<usize>,
    /// CPU to pin the consumer thread to, if any
    pub consumer_cpu: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            samples: 1_000_000,
            capacity: 8192,
            spin_limit: Backoff::DEFAULT_SPIN_LIMIT,
            producer_cpu: None,
            consumer_cpu: None,
        }
    }
}

impl BenchConfig {
    /// Reads overrides from `SAMPLES`, `CAPACITY`, `SPIN_LIMIT`,
    /// `PRODUCER_CPU` and `CONSUMER_CPU`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, HarnessError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HarnessError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(samples) = parse_var(&lookup, "SAMPLES")? {
            config.samples = samples;
        }
        if let Some(capacity) = parse_var(&lookup, "CAPACITY")? {
            config.capacity = capacity;
        }
        if let Some(spin_limit) = parse_var(&lookup, "SPIN_LIMIT")? {
            config.spin_limit = spin_limit;
        }
        config.producer_cpu = parse_var(&lookup, "PRODUCER_CPU")?;
        config.consumer_cpu = parse_var(&lookup, "CONSUMER_CPU")?;
        Ok(config)
    }

    /// Ring configuration for a run. Metrics are always on so the report can
    /// show how often each side waited.
    pub fn ring_config(&self) -> Config {
        Config::with_capacity(self.capacity)
            .with_spin_limit(self.spin_limit)
            .with_metrics(true)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, HarnessError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HarnessError::InvalidEnv { var, value }),
    }
}

/// Result of one harness run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyReport {
    pub name: String,
    pub samples: u64,
    /// Wall time of the whole run according to the injected clock
    pub elapsed_nanos: u64,
    pub throughput_per_sec: f64,
    pub latency: LatencySummary,
    /// Ring counters (all zero for runs that do not use a ring)
    pub ring: MetricsSnapshot,
}

impl LatencyReport {
    fn new(
        name: &str,
        samples: u64,
        elapsed_nanos: u64,
        latency: LatencySummary,
        ring: MetricsSnapshot,
    ) -> Self {
        let throughput_per_sec = if elapsed_nanos == 0 {
            0.0
        } else {
            samples as f64 * 1e9 / elapsed_nanos as f64
        };
        Self {
            name: name.to_string(),
            samples,
            elapsed_nanos,
            throughput_per_sec,
            latency,
            ring,
        }
    }
}

/// Value carried through the ring.
#[derive(Debug, Clone, Copy)]
struct Stamped {
    seq: u64,
    sent_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    /// Producer stamp before `put` to consumer reading after `get`
    Handoff,
    /// Duration of each `get` call on the consumer side
    GetLap,
}

/// Measures put-to-get handoff latency for `config.samples` values.
pub fn run_ring_latency<C: Clock>(
    config: &BenchConfig,
    clock: &C,
) -> Result<LatencyReport, HarnessError> {
    run_pair("ring-handoff", config, clock, Measure::Handoff)
}

/// Measures how long each consumer `get` call takes, including any wait for
/// the producer.
pub fn run_ring_get_laps<C: Clock>(
    config: &BenchConfig,
    clock: &C,
) -> Result<LatencyReport, HarnessError> {
    run_pair("ring-get-lap", config, clock, Measure::GetLap)
}

/// Measures the cost of two back-to-back clock reads.
///
/// Readings are buffered and recorded after the loop so histogram updates
/// stay out of the measured window.
pub fn run_clock_overhead<C: Clock>(
    samples: u64,
    clock: &C,
) -> Result<LatencyReport, HarnessError> {
    let mut histogram = LatencyHistogram::new()?;
    let mut starts = Vec::with_capacity(samples as usize);
    let mut ends = Vec::with_capacity(samples as usize);

    let started = clock.now();
    for _ in 0..samples {
        starts.push(clock.now());
        ends.push(clock.now());
    }
    let elapsed = clock.now().saturating_sub(started);

    histogram.record_intervals(&starts, &ends)?;

    Ok(LatencyReport::new(
        "clock-overhead",
        samples,
        elapsed,
        histogram.summary(),
        MetricsSnapshot::default(),
    ))
}

fn run_pair<C: Clock>(
    name: &str,
    config: &BenchConfig,
    clock: &C,
    measure: Measure,
) -> Result<LatencyReport, HarnessError> {
    let (mut producer, mut consumer) = Ring::<Stamped>::with_config(config.ring_config())?;
    let mut histogram = LatencyHistogram::new()?;
    let samples = config.samples;
    let (producer_cpu, consumer_cpu) = (config.producer_cpu, config.consumer_cpu);

    info!(
        run = name,
        samples,
        capacity = config.capacity,
        spin_limit = config.spin_limit,
        "starting run"
    );

    let started = clock.now();

    let (consumed, produced) = thread::scope(|s| {
        let histogram = &mut histogram;

        let consumer_handle = thread::Builder::new()
            .name("spsc-consumer".into())
            .spawn_scoped(s, move || -> Result<(u64, MetricsSnapshot), HarnessError> {
                pin_current_thread("consumer", consumer_cpu);

                let mut expected = 0u64;
                let mut lap_start = clock.now();
                while let Some(item) = consumer.get() {
                    let now = clock.now();
                    let start = match measure {
                        Measure::Handoff => item.sent_at,
                        Measure::GetLap => lap_start,
                    };
                    histogram.record_interval(start, now);

                    if item.seq != expected {
                        return Err(HarnessError::SequenceGap {
                            expected,
                            got: item.seq,
                        });
                    }
                    expected += 1;

                    if measure == Measure::GetLap {
                        lap_start = clock.now();
                    }
                }
                Ok((expected, consumer.metrics()))
            })
            .map_err(|source| HarnessError::Spawn {
                role: "consumer",
                source,
            })?;

        let producer_handle = thread::Builder::new()
            .name("spsc-producer".into())
            .spawn_scoped(s, move || -> Result<u64, HarnessError> {
                pin_current_thread("producer", producer_cpu);

                for seq in 0..samples {
                    let item = Stamped {
                        seq,
                        sent_at: clock.now(),
                    };
                    if producer.put(item).is_err() {
                        return Err(HarnessError::ProducerStopped { sent: seq });
                    }
                }
                producer.close();
                Ok(samples)
            })
            .map_err(|source| HarnessError::Spawn {
                role: "producer",
                source,
            })?;

        let consumed = consumer_handle
            .join()
            .map_err(|_| HarnessError::WorkerPanicked("consumer"))?;
        let produced = producer_handle
            .join()
            .map_err(|_| HarnessError::WorkerPanicked("producer"))?;
        Ok::<_, HarnessError>((consumed, produced))
    })?;

    let elapsed = clock.now().saturating_sub(started);

    // A consumer failure closes the ring under the producer, so report it first.
    let (received, ring_metrics) = consumed?;
    produced?;

    if received != samples {
        return Err(HarnessError::CountMismatch {
            expected: samples,
            received,
        });
    }

    let report = LatencyReport::new(name, samples, elapsed, histogram.summary(), ring_metrics);
    info!(
        run = name,
        elapsed_nanos = report.elapsed_nanos,
        p50 = report.latency.p50,
        p99 = report.latency.p99,
        put_waits = report.ring.put_waits,
        get_waits = report.ring.get_waits,
        "run finished"
    );
    Ok(report)
}

/// Best-effort pinning; failure only costs measurement stability.
fn pin_current_thread(role: &'static str, cpu: Option<usize>) {
    let Some(id) = cpu else {
        return;
    };
    if core_affinity::set_for_current(core_affinity::CoreId { id }) {
        debug!(role, cpu = id, "pinned thread");
    } else {
        warn!(role, cpu = id, "could not pin thread, continuing unpinned");
    }
}
