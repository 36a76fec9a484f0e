//! SPSC ring handoff latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin latency_bench
//!
//! Environment variables:
//!     SAMPLES=1000000  Values sent through the ring
//!     CAPACITY=8192    Ring capacity (power of two)
//!     SPIN_LIMIT=6     Backoff spin exponent before yielding
//!     PRODUCER_CPU=0   Pin producer to CPU 0 (default: unpinned)
//!     CONSUMER_CPU=2   Pin consumer to CPU 2 (default: unpinned)
//!     OUTPUT=json      Print reports as JSON instead of a table
//!     RUST_LOG=...     Log filter (default: spscring_rs=info)

use anyhow::Context;
use spscring_rs::harness::{run_clock_overhead, run_ring_get_laps, run_ring_latency};
use spscring_rs::{BenchConfig, LatencyReport, MonotonicClock};
use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spscring_rs=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn print_table(config: &BenchConfig, reports: &[LatencyReport]) {
    println!("=== SPSC Ring Latency ===");
    println!("Samples:  {:>10}", config.samples);
    println!("Capacity: {:>10}", config.capacity);
    println!("Spin:     {:>10}", config.spin_limit);
    println!(
        "Pinning:  producer={:?} consumer={:?}",
        config.producer_cpu, config.consumer_cpu
    );

    for report in reports {
        println!();
        println!("--- {} ---", report.name);
        println!("{}", report.latency);
        println!(
            "  elapsed: {:>12.3} ms ({:.2} M/s)",
            report.elapsed_nanos as f64 / 1e6,
            report.throughput_per_sec / 1e6
        );
        if report.ring.items_put > 0 {
            println!(
                "  waits:   put={} get={}",
                report.ring.put_waits, report.ring.get_waits
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = BenchConfig::from_env().context("reading benchmark configuration")?;
    let clock = MonotonicClock::new();

    let reports = vec![
        run_ring_latency(&config, &clock).context("ring handoff run")?,
        run_ring_get_laps(&config, &clock).context("ring get-lap run")?,
        run_clock_overhead(config.samples, &clock).context("clock overhead run")?,
    ];

    match env::var("OUTPUT").as_deref() {
        Ok("json") => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => print_table(&config, &reports),
    }

    Ok(())
}
