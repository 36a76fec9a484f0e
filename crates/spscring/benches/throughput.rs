use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use spscring_rs::{Config, Ring, TryGetError};
use std::thread;

const MESSAGES: u64 = 1_000_000;

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc");
    group.throughput(Throughput::Elements(MESSAGES));

    group.bench_function("put_get", |b| {
        b.iter(|| {
            let (mut producer, mut consumer) = Ring::<u64>::new(8192).unwrap();

            let producer_handle = thread::spawn(move || {
                for i in 0..MESSAGES {
                    producer.put(i).unwrap();
                }
            });

            let mut count = 0u64;
            while let Some(value) = consumer.get() {
                black_box(value);
                count += 1;
            }

            producer_handle.join().unwrap();
            assert_eq!(count, MESSAGES);
        });
    });

    group.bench_function("put_drain", |b| {
        b.iter(|| {
            let (mut producer, mut consumer) = Ring::<u64>::new(8192).unwrap();

            let producer_handle = thread::spawn(move || {
                for i in 0..MESSAGES {
                    producer.put(i).unwrap();
                }
            });

            let mut count = 0u64;
            loop {
                let drained = consumer.drain(|value| {
                    black_box(value);
                });
                count += drained as u64;
                if drained == 0 {
                    match consumer.try_get() {
                        Ok(value) => {
                            black_box(value);
                            count += 1;
                        }
                        Err(TryGetError::Empty) => std::hint::spin_loop(),
                        Err(TryGetError::Closed) => break,
                    }
                }
            }

            producer_handle.join().unwrap();
            assert_eq!(count, MESSAGES);
        });
    });

    group.finish();
}

fn bench_capacities(c: &mut Criterion) {
    let mut group = c.benchmark_group("capacity");
    group.throughput(Throughput::Elements(MESSAGES));

    for capacity in [64usize, 1024, 8192, 65536] {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            &capacity,
            |b, &cap| {
                b.iter(|| {
                    let (mut producer, consumer) = Ring::<u64>::new(cap).unwrap();

                    let producer_handle = thread::spawn(move || {
                        for i in 0..MESSAGES {
                            producer.put(i).unwrap();
                        }
                    });

                    let count = consumer.map(black_box).count();
                    producer_handle.join().unwrap();
                    assert_eq!(count as u64, MESSAGES);
                });
            },
        );
    }

    group.finish();
}

fn bench_spin_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("spin_limit");
    group.throughput(Throughput::Elements(MESSAGES));

    for spin_limit in [1u32, 6, 10] {
        group.bench_with_input(
            BenchmarkId::from_parameter(spin_limit),
            &spin_limit,
            |b, &spin| {
                b.iter(|| {
                    let config = Config::with_capacity(1024).with_spin_limit(spin);
                    let (mut producer, consumer) = Ring::<u64>::with_config(config).unwrap();

                    let producer_handle = thread::spawn(move || {
                        for i in 0..MESSAGES {
                            producer.put(i).unwrap();
                        }
                    });

                    let count = consumer.map(black_box).count();
                    producer_handle.join().unwrap();
                    assert_eq!(count as u64, MESSAGES);
                });
            },
        );
    }

    group.finish();
}

/// Single value ping through an otherwise idle ring.
fn bench_single_handoff(c: &mut Criterion) {
    c.bench_function("single_thread_put_get", |b| {
        let (mut producer, mut consumer) = Ring::<u64>::new(1024).unwrap();
        let mut i = 0u64;
        b.iter(|| {
            producer.try_put(black_box(i)).unwrap();
            i = i.wrapping_add(1);
            black_box(consumer.try_get().unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_spsc,
    bench_capacities,
    bench_spin_limits,
    bench_single_handoff
);
criterion_main!(benches);
