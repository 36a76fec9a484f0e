//! Latency recording into an HDR histogram.
//!
//! The recorder only aggregates samples and summarizes them; it never writes
//! histogram files.

use hdrhistogram::{CreationError, Histogram};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Smallest latency the default histogram distinguishes (1 ns).
pub const LOWEST_DISCERNIBLE_NANOS: u64 = 1;
/// Largest latency the default histogram tracks (1 ms); larger samples clamp.
pub const HIGHEST_TRACKABLE_NANOS: u64 = 1_000_000;
/// Value precision of the default histogram.
pub const SIGNIFICANT_FIGURES: u8 = 5;

/// Errors from latency recording.
#[derive(Debug, Clone, Error)]
pub enum LatencyError {
    /// The histogram bounds or precision were rejected.
    #[error("cannot create histogram: {0:?}")]
    Histogram(CreationError),

    /// Start and end timestamp arrays differ in length.
    #[error("interval arrays differ in length: {starts} starts, {ends} ends")]
    MismatchedIntervals {
        /// Number of start timestamps.
        starts: usize,
        /// Number of end timestamps.
        ends: usize,
    },
}

/// Anything that accepts per-item latency samples in nanoseconds.
pub trait LatencySink {
    fn record(&mut self, nanos: u64);

    /// Records the elapsed time between two clock readings.
    ///
    /// An `end` earlier than `start` records zero.
    #[inline]
    fn record_interval(&mut self, start: u64, end: u64) {
        self.record(end.saturating_sub(start));
    }
}

/// HDR histogram of latencies in nanoseconds.
#[derive(Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
    clamped: u64,
}

impl LatencyHistogram {
    /// Histogram covering 1 ns ..= 1 ms at 5 significant figures.
    pub fn new() -> Result<Self, LatencyError> {
        Self::with_bounds(
            LOWEST_DISCERNIBLE_NANOS,
            HIGHEST_TRACKABLE_NANOS,
            SIGNIFICANT_FIGURES,
        )
    }

    /// Histogram with custom bounds and precision.
    pub fn with_bounds(low: u64, high: u64, sigfig: u8) -> Result<Self, LatencyError> {
        let histogram =
            Histogram::new_with_bounds(low, high, sigfig).map_err(LatencyError::Histogram)?;
        Ok(Self {
            histogram,
            clamped: 0,
        })
    }

    /// Records `ends[i] - starts[i]` for every index.
    pub fn record_intervals(&mut self, starts: &[u64], ends: &[u64]) -> Result<(), LatencyError> {
        if starts.len() != ends.len() {
            return Err(LatencyError::MismatchedIntervals {
                starts: starts.len(),
                ends: ends.len(),
            });
        }
        for (&start, &end) in starts.iter().zip(ends) {
            self.record_interval(start, end);
        }
        Ok(())
    }

    /// Number of recorded samples.
    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    /// Samples that exceeded the trackable maximum and were clamped to it.
    pub fn clamped(&self) -> u64 {
        self.clamped
    }

    /// Summarizes the distribution.
    pub fn summary(&self) -> LatencySummary {
        let h = &self.histogram;
        if h.is_empty() {
            return LatencySummary::default();
        }
        LatencySummary {
            count: h.len(),
            min: h.min(),
            max: h.max(),
            mean: h.mean(),
            p50: h.value_at_quantile(0.50),
            p90: h.value_at_quantile(0.90),
            p99: h.value_at_quantile(0.99),
            p99_9: h.value_at_quantile(0.999),
            p99_99: h.value_at_quantile(0.9999),
            clamped: self.clamped,
        }
    }
}

impl fmt::Debug for LatencyHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatencyHistogram")
            .field("len", &self.histogram.len())
            .field("high", &self.histogram.high())
            .field("clamped", &self.clamped)
            .finish()
    }
}

impl LatencySink for LatencyHistogram {
    #[inline]
    fn record(&mut self, nanos: u64) {
        let high = self.histogram.high();
        if nanos > high {
            self.clamped += 1;
        }
        self.histogram.saturating_record(nanos.min(high));
    }
}

/// Distribution summary in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p99_9: u64,
    pub p99_99: u64,
    /// Samples above the trackable maximum
    pub clamped: u64,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  count:   {:>12}", self.count)?;
        writeln!(f, "  min:     {:>12} ns", self.min)?;
        writeln!(f, "  mean:    {:>12.1} ns", self.mean)?;
        writeln!(f, "  p50:     {:>12} ns", self.p50)?;
        writeln!(f, "  p90:     {:>12} ns", self.p90)?;
        writeln!(f, "  p99:     {:>12} ns", self.p99)?;
        writeln!(f, "  p99.9:   {:>12} ns", self.p99_9)?;
        writeln!(f, "  p99.99:  {:>12} ns", self.p99_99)?;
        writeln!(f, "  max:     {:>12} ns", self.max)?;
        write!(f, "  clamped: {:>12}", self.clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_uniform_samples() {
        let mut hist = LatencyHistogram::new().unwrap();
        for v in 1..=1_000u64 {
            hist.record(v);
        }

        let s = hist.summary();
        assert_eq!(s.count, 1_000);
        assert_eq!(s.min, 1);
        assert_eq!(s.max, 1_000);
        assert!((499..=501).contains(&s.p50), "p50 = {}", s.p50);
        assert!((989..=991).contains(&s.p99), "p99 = {}", s.p99);
        assert!((s.mean - 500.5).abs() < 0.01);
        assert_eq!(s.clamped, 0);
    }

    #[test]
    fn test_empty_summary_is_zeroed() {
        let hist = LatencyHistogram::new().unwrap();
        assert!(hist.is_empty());
        assert_eq!(hist.summary(), LatencySummary::default());
    }

    #[test]
    fn test_values_above_max_are_clamped() {
        let mut hist = LatencyHistogram::new().unwrap();
        hist.record(10);
        hist.record(5_000_000);

        assert_eq!(hist.len(), 2);
        assert_eq!(hist.clamped(), 1);
        let s = hist.summary();
        assert_eq!(
            s.max,
            hist.histogram.highest_equivalent(HIGHEST_TRACKABLE_NANOS)
        );
        assert_eq!(s.clamped, 1);
    }

    #[test]
    fn test_value_just_above_max_is_clamped() {
        // Still inside hdrhistogram's top bucket range, so it must be capped
        // explicitly rather than stored at its real size.
        let mut hist = LatencyHistogram::new().unwrap();
        hist.record(1_000_500);

        assert_eq!(hist.clamped(), 1);
        let capped = hist.histogram.highest_equivalent(HIGHEST_TRACKABLE_NANOS);
        assert!(capped < 1_000_500);
        let s = hist.summary();
        assert_eq!(s.max, capped);
        assert_eq!(s.p50, capped);
    }

    #[test]
    fn test_value_at_max_is_not_clamped() {
        let mut hist = LatencyHistogram::new().unwrap();
        hist.record(HIGHEST_TRACKABLE_NANOS);
        assert_eq!(hist.clamped(), 0);
        assert_eq!(hist.len(), 1);
    }

    #[test]
    fn test_record_intervals() {
        let mut hist = LatencyHistogram::new().unwrap();
        hist.record_intervals(&[100, 200, 300], &[150, 260, 290]).unwrap();

        let s = hist.summary();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 0); // 290 < 300 saturates to zero
        assert_eq!(s.max, 60);
    }

    #[test]
    fn test_record_intervals_length_mismatch() {
        let mut hist = LatencyHistogram::new().unwrap();
        let err = hist.record_intervals(&[1, 2], &[3]).unwrap_err();
        assert!(matches!(
            err,
            LatencyError::MismatchedIntervals { starts: 2, ends: 1 }
        ));
        assert!(hist.is_empty());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(matches!(
            LatencyHistogram::with_bounds(0, 100, 3),
            Err(LatencyError::Histogram(_))
        ));
    }
}
