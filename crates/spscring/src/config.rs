use crate::{Backoff, RingError};

/// A validated ring capacity: a positive power of two.
///
/// Validation happens once here so the hot path can index with
/// `index & mask` instead of a modulo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capacity(usize);

impl Capacity {
    /// Validates `capacity`, failing with [`RingError::InvalidCapacity`] if it is
    /// zero or not a power of two.
    pub const fn new(capacity: usize) -> Result<Self, RingError> {
        if capacity.is_power_of_two() {
            Ok(Self(capacity))
        } else {
            Err(RingError::InvalidCapacity {
                requested: capacity as i128,
            })
        }
    }

    /// Returns the number of slots.
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns the mask for index wrapping.
    #[inline]
    pub const fn mask(self) -> usize {
        self.0 - 1
    }
}

impl TryFrom<usize> for Capacity {
    type Error = RingError;

    fn try_from(capacity: usize) -> Result<Self, Self::Error> {
        Self::new(capacity)
    }
}

impl TryFrom<i64> for Capacity {
    type Error = RingError;

    fn try_from(capacity: i64) -> Result<Self, Self::Error> {
        let capacity = usize::try_from(capacity).map_err(|_| RingError::InvalidCapacity {
            requested: capacity as i128,
        })?;
        Self::new(capacity)
    }
}

impl From<Capacity> for usize {
    fn from(capacity: Capacity) -> Self {
        capacity.0
    }
}

/// Configuration for a [`Ring`](crate::Ring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of slots; must be a positive power of two (default: 8192)
    pub capacity: usize,
    /// Backoff spin exponent before yielding on a full/empty ring (default: 6)
    pub spin_limit: u32,
    /// Enable metrics collection (slight overhead)
    pub enable_metrics: bool,
}

impl Config {
    /// Creates a new configuration with custom settings.
    pub const fn new(capacity: usize, spin_limit: u32, enable_metrics: bool) -> Self {
        Self {
            capacity,
            spin_limit,
            enable_metrics,
        }
    }

    /// Default configuration with the given capacity.
    pub const fn with_capacity(capacity: usize) -> Self {
        Self::new(capacity, Backoff::DEFAULT_SPIN_LIMIT, false)
    }

    /// Returns a copy with metrics collection switched on or off.
    pub const fn with_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }

    /// Returns a copy with a different backoff spin limit.
    pub const fn with_spin_limit(mut self, spin_limit: u32) -> Self {
        self.spin_limit = spin_limit;
        self
    }

    /// Validates the capacity.
    pub const fn validate(&self) -> Result<Capacity, RingError> {
        Capacity::new(self.capacity)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_capacity(8192)
    }
}

/// Low latency configuration (8K slots, long spin phase before yielding)
pub const LOW_LATENCY_CONFIG: Config = Config::new(8192, 10, false);

/// Shared host configuration (8K slots, yields almost immediately)
pub const SHARED_HOST_CONFIG: Config = Config::new(8192, 1, false);
