//! Debug assertion macros for ring buffer invariants.
//!
//! Only active in debug builds (`debug_assert!`), so there is zero overhead in
//! release builds.

// =============================================================================
// Bounded count: `0 ≤ (write_index - read_index) ≤ capacity`
// =============================================================================

/// Assert that the number of unread values does not exceed capacity.
///
/// Used in: `Producer::try_put()` after publishing the new write index
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "bounded count violated: {} unread values exceed capacity {}",
            $count,
            $capacity
        )
    };
}

/// Assert that the read index does not advance past the write index.
///
/// Used in: `Consumer::try_get()` and `Consumer::drain()` before publishing
macro_rules! debug_assert_read_not_past_write {
    ($new_read:expr, $write:expr) => {
        debug_assert!(
            $new_read <= $write,
            "advancing read index {} beyond write index {}",
            $new_read,
            $write
        )
    };
}

// =============================================================================
// Monotonic progress: indices only increase
// =============================================================================

/// Assert that an index only increases.
///
/// Used in: `try_put()` for the write index, `try_get()` for the read index
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new > $old,
            "{} did not advance: {} -> {}",
            $name,
            $old,
            $new
        )
    };
}

// =============================================================================
// Initialized range: `slot(i) is initialized ⟺ read_index ≤ i < write_index`
// =============================================================================

/// Assert that we're reading from an initialized slot.
///
/// Used in: `Consumer` before `assume_init_read()`
macro_rules! debug_assert_initialized_read {
    ($pos:expr, $read:expr, $write:expr) => {
        debug_assert!(
            $pos >= $read && $pos < $write,
            "reading slot at index {} outside initialized range [{}, {})",
            $pos,
            $read,
            $write
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_initialized_read;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_read_not_past_write;
