use crate::invariants::{
    debug_assert_bounded_count, debug_assert_initialized_read, debug_assert_monotonic,
    debug_assert_read_not_past_write,
};
use crate::{
    Backoff, Capacity, Config, Metrics, MetricsSnapshot, PutError, RingError, TryGetError,
    TryPutError,
};
use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// ## Indices
//
// `write_index` and `read_index` are unbounded u64 counters. The slot for an
// index is `index & mask`; fullness and emptiness are derived from the two
// counters alone, there is no separate count.
//
// ## Memory Ordering Protocol
//
// **Producer (put):**
// 1. Use the local copy of `write_index` (only the producer writes it)
// 2. Check space against the locally cached `read_index`
// 3. If the cache says full: load `read_index` with Acquire (synchronizes
//    with the consumer's Release, so its slot read happened-before our write)
// 4. Write the value into the slot (plain write, protected by the protocol)
// 5. Store `write_index + 1` with Release (publishes the slot to the consumer)
//
// **Consumer (get):**
// 1. Use the local copy of `read_index` (only the consumer writes it)
// 2. Check availability against the locally cached `write_index`
// 3. If the cache says empty: load `write_index` with Acquire (synchronizes
//    with the producer's Release, so the slot write is visible)
// 4. Move the value out of the slot
// 5. Store `read_index + 1` with Release (hands the slot back to the producer)
//
// ## Close
//
// `closed` is stored with Release after the producer's last `write_index`
// Release store. A consumer that observes `closed == true` with Acquire also
// observes the final `write_index`, so it re-reads the index once before
// reporting end-of-stream and never loses a value published just before close.
//
// ## Single-Writer Invariants
//
// The discipline is enforced by the type system: one `Producer` and one
// `Consumer` per ring, neither `Clone`, both mutating through `&mut self`.
// Cached indices live inside the handles, so no `UnsafeCell` is needed for
// them; only the slots are shared through `UnsafeCell`.
//
// =============================================================================

type Slot<T> = UnsafeCell<MaybeUninit<T>>;

/// Bounded lock-free SPSC ring buffer.
///
/// A ring is only reachable through its [`Producer`] and [`Consumer`]
/// handles, created together by [`Ring::new`] or [`Ring::with_config`].
///
/// Optimized with:
/// - cache-line padding on both indices and the closed flag
/// - locally cached opposite index to minimize cross-core traffic
/// - batch consumption with a single index publication
pub struct Ring<T> {
    // === PRODUCER HOT ===
    /// Next index to write (written by producer, read by consumer)
    write_index: CachePadded<AtomicU64>,

    // === CONSUMER HOT ===
    /// Next index to read (written by consumer, read by producer)
    read_index: CachePadded<AtomicU64>,

    // === COLD STATE ===
    /// End-of-stream flag (set by close or when either handle drops)
    closed: CachePadded<AtomicBool>,
    metrics: Metrics,
    config: Config,
    capacity: Capacity,

    // === DATA ===
    /// Fixed-size slot storage; `[read_index, write_index)` is initialized.
    slots: Box<[Slot<T>]>,
}

// Safety: values of T move from the producer thread to the consumer thread,
// and every shared access to a slot is ordered by the index protocol above.
unsafe impl<T: Send> Send for Ring<T> {}
unsafe impl<T: Send> Sync for Ring<T> {}

impl<T> Ring<T> {
    /// Creates a ring with `capacity` slots and default settings.
    ///
    /// Fails with [`RingError::InvalidCapacity`] unless `capacity` is a
    /// positive power of two.
    ///
    /// # Example
    ///
    /// ```
    /// use spscring_rs::Ring;
    ///
    /// let (mut producer, mut consumer) = Ring::<u64>::new(8).unwrap();
    /// producer.put(42).unwrap();
    /// producer.close();
    ///
    /// assert_eq!(consumer.get(), Some(42));
    /// assert_eq!(consumer.get(), None);
    /// ```
    pub fn new(capacity: usize) -> Result<(Producer<T>, Consumer<T>), RingError> {
        Self::with_config(Config::with_capacity(capacity))
    }

    /// Creates a ring from an already validated [`Capacity`].
    ///
    /// ```
    /// use spscring_rs::{Capacity, Ring, RingError};
    ///
    /// let err = Capacity::try_from(-1i64).map(Ring::<u64>::with_capacity);
    /// assert_eq!(err.unwrap_err(), RingError::InvalidCapacity { requested: -1 });
    /// ```
    pub fn with_capacity(capacity: Capacity) -> (Producer<T>, Consumer<T>) {
        Self::build(Config::with_capacity(capacity.get()), capacity)
    }

    /// Creates a ring with the given configuration.
    pub fn with_config(config: Config) -> Result<(Producer<T>, Consumer<T>), RingError> {
        let capacity = config.validate()?;
        Ok(Self::build(config, capacity))
    }

    fn build(config: Config, capacity: Capacity) -> (Producer<T>, Consumer<T>) {
        let slots = (0..capacity.get())
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Box<[Slot<T>]>>();

        let ring = Arc::new(Self {
            write_index: CachePadded::new(AtomicU64::new(0)),
            read_index: CachePadded::new(AtomicU64::new(0)),
            closed: CachePadded::new(AtomicBool::new(false)),
            metrics: Metrics::new(),
            config,
            capacity,
            slots,
        });

        let producer = Producer {
            ring: Arc::clone(&ring),
            write_index: 0,
            cached_read: 0,
        };
        let consumer = Consumer {
            ring,
            read_index: 0,
            cached_write: 0,
        };
        (producer, consumer)
    }

    // ---------------------------------------------------------------------
    // STATUS
    // ---------------------------------------------------------------------

    #[inline]
    fn capacity(&self) -> usize {
        self.capacity.get()
    }

    #[inline]
    fn len(&self) -> usize {
        let read = self.read_index.load(Ordering::Acquire);
        let write = self.write_index.load(Ordering::Acquire);
        write.saturating_sub(read) as usize
    }

    #[inline]
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    #[inline]
    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn metrics(&self) -> MetricsSnapshot {
        if self.config.enable_metrics {
            self.metrics.snapshot()
        } else {
            MetricsSnapshot::default()
        }
    }

    // ---------------------------------------------------------------------
    // SLOT ACCESS
    // ---------------------------------------------------------------------

    /// # Safety
    ///
    /// Caller must be the producer and the slot for `index` must be free
    /// (`index - read_index < capacity` as observed through an Acquire load).
    #[inline]
    unsafe fn write_slot(&self, index: u64, value: T) {
        let idx = (index as usize) & self.capacity.mask();
        (*self.slots[idx].get()).write(value);
    }

    /// # Safety
    ///
    /// Caller must be the consumer and `index` must lie in the published
    /// range `[read_index, write_index)` as observed through an Acquire load.
    /// The slot is logically uninitialized afterwards.
    #[inline]
    unsafe fn read_slot(&self, index: u64) -> T {
        let idx = (index as usize) & self.capacity.mask();
        (*self.slots[idx].get()).assume_init_read()
    }
}

impl<T> Drop for Ring<T> {
    fn drop(&mut self) {
        // Drop all values that were put but never taken
        let read = *self.read_index.get_mut();
        let write = *self.write_index.get_mut();
        let mask = self.capacity.mask();

        for index in read..write {
            let idx = (index as usize) & mask;
            // SAFETY: [read, write) is exactly the initialized range, and we
            // have exclusive access through `&mut self`.
            unsafe {
                ptr::drop_in_place(self.slots[idx].get_mut().as_mut_ptr());
            }
        }
    }
}

// =============================================================================
// PRODUCER
// =============================================================================

/// The writing half of a [`Ring`]. Exactly one exists per ring.
///
/// Dropping the producer closes the ring.
pub struct Producer<T> {
    ring: Arc<Ring<T>>,
    /// Local copy of the shared write index (this handle is its only writer)
    write_index: u64,
    /// Last observed read index (refreshed only when the ring looks full)
    cached_read: u64,
}

impl<T> Producer<T> {
    /// Enqueues `value` without waiting.
    ///
    /// Fast path checks space against the cached read index; the shared index
    /// is only re-read when the cache says the ring is full.
    pub fn try_put(&mut self, value: T) -> Result<(), TryPutError<T>> {
        if self.ring.closed.load(Ordering::Relaxed) {
            return Err(TryPutError::Closed(value));
        }

        let capacity = self.ring.capacity() as u64;
        let write = self.write_index;

        if write.wrapping_sub(self.cached_read) >= capacity {
            // Slow path: refresh cache
            self.cached_read = self.ring.read_index.load(Ordering::Acquire);
            if write.wrapping_sub(self.cached_read) >= capacity {
                return Err(TryPutError::Full(value));
            }
        }

        // SAFETY: Slot access is safe because:
        // 1. `write - read < capacity`, so the slot holds no unread value
        // 2. The Acquire load of `read_index` ordered the consumer's read of
        //    this slot (previous lap) before this write
        // 3. Only the producer writes slots, and only at `write_index`
        unsafe { self.ring.write_slot(write, value) };

        let new_write = write.wrapping_add(1);
        debug_assert_monotonic!("write index", write, new_write);
        debug_assert_bounded_count!(new_write.wrapping_sub(self.cached_read), capacity);

        // Publish the slot
        self.ring.write_index.store(new_write, Ordering::Release);
        self.write_index = new_write;

        if self.ring.config.enable_metrics {
            self.ring.metrics.add_items_put(1);
        }
        Ok(())
    }

    /// Enqueues `value`, waiting with backoff while the ring is full.
    ///
    /// Returns the value in a [`PutError`] if the ring is closed, either by
    /// [`close`](Self::close) or because the consumer was dropped.
    pub fn put(&mut self, value: T) -> Result<(), PutError<T>> {
        let mut value = match self.try_put(value) {
            Ok(()) => return Ok(()),
            Err(TryPutError::Full(value)) => value,
            Err(TryPutError::Closed(value)) => return Err(PutError(value)),
        };

        if self.ring.config.enable_metrics {
            self.ring.metrics.add_put_wait();
        }

        let mut backoff = Backoff::with_spin_limit(self.ring.config.spin_limit);
        loop {
            backoff.snooze();
            match self.try_put(value) {
                Ok(()) => return Ok(()),
                Err(TryPutError::Full(v)) => value = v,
                Err(TryPutError::Closed(v)) => return Err(PutError(v)),
            }
        }
    }

    /// Signals end-of-stream. Idempotent.
    ///
    /// Values already put remain readable; the consumer sees end-of-stream
    /// once it has drained them.
    #[inline]
    pub fn close(&self) {
        self.ring.close();
    }

    /// Returns the ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the number of unread values.
    #[inline]
    pub fn len(&self) -> usize {
        let read = self.ring.read_index.load(Ordering::Acquire);
        self.write_index.saturating_sub(read) as usize
    }

    /// Returns true if the consumer has taken every value put so far.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if a `try_put` would currently fail with `Full`.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity()
    }

    /// Returns true if the ring is closed.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.ring.is_closed()
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        self.ring.close();
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("capacity", &self.capacity())
            .field("write_index", &self.write_index)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CONSUMER
// =============================================================================

/// The reading half of a [`Ring`]. Exactly one exists per ring.
///
/// Iterating a consumer yields values until end-of-stream. Dropping the
/// consumer closes the ring so a producer blocked in `put` returns.
pub struct Consumer<T> {
    ring: Arc<Ring<T>>,
    /// Local copy of the read index. May run ahead of the shared index during
    /// [`drain`](Self::drain) and is re-published on drop.
    read_index: u64,
    /// Last observed write index (refreshed only when the ring looks empty)
    cached_write: u64,
}

impl<T> Consumer<T> {
    /// Dequeues the oldest value without waiting.
    ///
    /// Returns [`TryGetError::Empty`] if nothing is published yet, and
    /// [`TryGetError::Closed`] once the ring is closed and drained.
    pub fn try_get(&mut self) -> Result<T, TryGetError> {
        let read = self.read_index;

        if read == self.cached_write {
            // Slow path: refresh cache
            self.cached_write = self.ring.write_index.load(Ordering::Acquire);
            if read == self.cached_write {
                if !self.ring.closed.load(Ordering::Acquire) {
                    return Err(TryGetError::Empty);
                }
                // Close is published after the final put; look once more.
                self.cached_write = self.ring.write_index.load(Ordering::Acquire);
                if read == self.cached_write {
                    return Err(TryGetError::Closed);
                }
            }
        }

        debug_assert_initialized_read!(read, read, self.cached_write);

        // SAFETY: Slot access is safe because:
        // 1. `read < cached_write`, and cached_write came from an Acquire load
        //    that synchronizes with the producer's Release store
        // 2. The producer will not overwrite this slot until `read_index`
        //    moves past it
        // 3. Only the consumer reads slots
        let value = unsafe { self.ring.read_slot(read) };

        let new_read = read + 1;
        debug_assert_monotonic!("read index", read, new_read);
        debug_assert_read_not_past_write!(new_read, self.cached_write);

        self.read_index = new_read;
        self.ring.read_index.store(new_read, Ordering::Release);

        if self.ring.config.enable_metrics {
            self.ring.metrics.add_items_got(1);
        }
        Ok(value)
    }

    /// Dequeues the oldest value, waiting with backoff while the ring is empty.
    ///
    /// Returns `None` once the ring is closed and every value has been taken;
    /// from then on it returns `None` immediately.
    pub fn get(&mut self) -> Option<T> {
        match self.try_get() {
            Ok(value) => return Some(value),
            Err(TryGetError::Closed) => return None,
            Err(TryGetError::Empty) => {}
        }

        if self.ring.config.enable_metrics {
            self.ring.metrics.add_get_wait();
        }

        let mut backoff = Backoff::with_spin_limit(self.ring.config.spin_limit);
        loop {
            backoff.snooze();
            match self.try_get() {
                Ok(value) => return Some(value),
                Err(TryGetError::Closed) => return None,
                Err(TryGetError::Empty) => {}
            }
        }
    }

    /// Takes ALL currently published values with a single read-index update.
    ///
    /// The handler receives ownership of each value in FIFO order. Returns the
    /// number of values consumed (0 if empty, whether or not closed).
    pub fn drain<F>(&mut self, mut handler: F) -> usize
    where
        F: FnMut(T),
    {
        let start = self.read_index;
        let write = self.ring.write_index.load(Ordering::Acquire);
        self.cached_write = write;

        if write == start {
            return 0;
        }

        // Process all available values (no atomics in loop!)
        while self.read_index != write {
            let pos = self.read_index;
            debug_assert_initialized_read!(pos, start, write);

            // SAFETY: [start, write) was published by the producer's Release
            // store, observed by the Acquire load above.
            let value = unsafe { self.ring.read_slot(pos) };
            // Advance and count before the handler runs so a panicking handler
            // never leaves a moved-out slot inside the initialized range or
            // uncounted in the metrics.
            self.read_index = pos + 1;
            if self.ring.config.enable_metrics {
                self.ring.metrics.add_items_got(1);
            }
            handler(value);
        }

        debug_assert_read_not_past_write!(self.read_index, write);

        // Single atomic update for entire batch
        self.ring.read_index.store(write, Ordering::Release);

        write.wrapping_sub(start) as usize
    }

    /// Returns the ring capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Returns the number of published values not yet taken.
    #[inline]
    pub fn len(&self) -> usize {
        let write = self.ring.write_index.load(Ordering::Acquire);
        write.saturating_sub(self.read_index) as usize
    }

    /// Returns true if no published value is waiting.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the ring is closed. Values may still be waiting.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.ring.is_closed()
    }

    /// Get a snapshot of metrics if enabled.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.ring.metrics()
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.get()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len(), None)
    }
}

impl<T> Drop for Consumer<T> {
    fn drop(&mut self) {
        // Publish the local index so Ring::drop skips values already moved out.
        self.ring.read_index.store(self.read_index, Ordering::Release);
        self.ring.close();
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("capacity", &self.capacity())
            .field("read_index", &self.read_index)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_ring_basic_put_get() {
        let (mut producer, mut consumer) = Ring::<u64>::new(16).unwrap();

        producer.put(100).unwrap();
        producer.put(200).unwrap();
        producer.put(300).unwrap();
        producer.put(400).unwrap();

        assert_eq!(producer.len(), 4);
        assert_eq!(consumer.len(), 4);

        assert_eq!(consumer.try_get(), Ok(100));
        assert_eq!(consumer.try_get(), Ok(200));
        assert_eq!(consumer.try_get(), Ok(300));
        assert_eq!(consumer.try_get(), Ok(400));

        assert!(consumer.is_empty());
        assert_eq!(consumer.try_get(), Err(TryGetError::Empty));
    }

    #[test]
    fn test_ring_full() {
        let (mut producer, _consumer) = Ring::<u64>::new(16).unwrap();

        for i in 0..16 {
            producer.try_put(i).unwrap();
        }

        assert!(producer.is_full());
        assert_eq!(producer.try_put(16), Err(TryPutError::Full(16)));
    }

    #[test]
    fn test_ring_wraps_many_laps() {
        let (mut producer, mut consumer) = Ring::<u32>::new(4).unwrap();

        for lap in 0..100u32 {
            for i in 0..3 {
                producer.try_put(lap * 10 + i).unwrap();
            }
            for i in 0..3 {
                assert_eq!(consumer.try_get(), Ok(lap * 10 + i));
            }
        }
        assert_eq!(consumer.read_index, 300);
    }

    #[test]
    fn test_capacity_one() {
        let (mut producer, mut consumer) = Ring::<u8>::new(1).unwrap();

        producer.try_put(1).unwrap();
        assert!(producer.try_put(2).is_err());
        assert_eq!(consumer.try_get(), Ok(1));
        producer.try_put(2).unwrap();
        assert_eq!(consumer.try_get(), Ok(2));
    }

    #[test]
    fn test_close_then_drain() {
        let (mut producer, mut consumer) = Ring::<u64>::new(8).unwrap();

        producer.put(1).unwrap();
        producer.put(2).unwrap();
        producer.close();

        assert!(consumer.is_closed());
        assert_eq!(consumer.get(), Some(1));
        assert_eq!(consumer.get(), Some(2));
        assert_eq!(consumer.get(), None);
        assert_eq!(consumer.try_get(), Err(TryGetError::Closed));
    }

    #[test]
    fn test_put_after_close_hands_value_back() {
        let (mut producer, _consumer) = Ring::<String>::new(8).unwrap();
        producer.close();

        let err = producer.put("late".to_string()).unwrap_err();
        assert_eq!(err.into_inner(), "late");
        assert_eq!(
            producer.try_put("later".to_string()),
            Err(TryPutError::Closed("later".to_string()))
        );
    }

    #[test]
    fn test_drain_takes_all_published() {
        let (mut producer, mut consumer) = Ring::<u64>::new(16).unwrap();

        for i in 0..10 {
            producer.put(i * 10).unwrap();
        }

        let mut seen = Vec::new();
        let consumed = consumer.drain(|v| seen.push(v));

        assert_eq!(consumed, 10);
        assert_eq!(seen, (0..10).map(|i| i * 10).collect::<Vec<_>>());
        assert!(producer.is_empty());
        assert_eq!(consumer.drain(|_| {}), 0);
    }

    #[test]
    fn test_metrics_counts_when_enabled() {
        let config = Config::with_capacity(4).with_metrics(true);
        let (mut producer, mut consumer) = Ring::<u64>::with_config(config).unwrap();

        for i in 0..4 {
            producer.put(i).unwrap();
        }
        consumer.get();
        consumer.drain(|_| {});

        let snapshot = producer.metrics();
        assert_eq!(snapshot.items_put, 4);
        assert_eq!(snapshot.items_got, 4);
        assert_eq!(snapshot.in_flight(), 0);
    }

    #[test]
    fn test_metrics_disabled_by_default() {
        let (mut producer, consumer) = Ring::<u64>::new(4).unwrap();
        producer.put(1).unwrap();
        assert_eq!(consumer.metrics(), MetricsSnapshot::default());
    }

    #[test]
    fn test_ring_drop_releases_unread_values() {
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct DropTracker {
            _id: u64,
        }

        impl Drop for DropTracker {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);

        {
            let (mut producer, mut consumer) = Ring::<DropTracker>::new(8).unwrap();
            for i in 0..5 {
                assert!(producer.put(DropTracker { _id: i }).is_ok());
            }

            // Take two, leave three in the ring
            drop(consumer.get());
            drop(consumer.get());
            assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 2);
        }

        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_drain_panic_does_not_double_drop() {
        static DROP_COUNT: AtomicUsize = AtomicUsize::new(0);

        struct DropTracker;

        impl Drop for DropTracker {
            fn drop(&mut self) {
                DROP_COUNT.fetch_add(1, Ordering::SeqCst);
            }
        }

        DROP_COUNT.store(0, Ordering::SeqCst);

        let (mut producer, mut consumer) = Ring::<DropTracker>::new(8).unwrap();
        for _ in 0..4 {
            assert!(producer.put(DropTracker).is_ok());
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut calls = 0;
            consumer.drain(|_item| {
                calls += 1;
                assert!(calls < 2, "handler failure");
            });
        }));
        assert!(result.is_err());

        drop(producer);
        assert_eq!(DROP_COUNT.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_drain_panic_keeps_metrics_consistent() {
        let config = Config::with_capacity(8).with_metrics(true);
        let (mut producer, mut consumer) = Ring::<u64>::with_config(config).unwrap();
        for i in 0..4 {
            producer.put(i).unwrap();
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            consumer.drain(|item| assert!(item < 1, "handler failure"));
        }));
        assert!(result.is_err());

        // Two values reached the handler; two are still queued.
        let snapshot = consumer.metrics();
        assert_eq!(snapshot.items_put, 4);
        assert_eq!(snapshot.items_got, 2);
        assert_eq!(snapshot.in_flight(), 2);
        assert_eq!(consumer.len(), 2);

        assert_eq!(consumer.try_get(), Ok(2));
        assert_eq!(consumer.try_get(), Ok(3));
        assert_eq!(consumer.metrics().in_flight(), 0);
    }
}
