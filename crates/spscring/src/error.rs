//! Error types for ring operations.
//!
//! Only construction can fail with a reportable error. The put/get error types
//! describe why a non-blocking call could not complete and always hand an
//! undelivered value back to the caller.

use thiserror::Error;

/// Errors that can occur when constructing a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingError {
    /// Capacity is zero, negative, or not a power of two.
    #[error("invalid capacity {requested}: must be a positive power of two")]
    InvalidCapacity {
        /// The rejected capacity request.
        requested: i128,
    },
}

/// Returned by [`Producer::try_put`](crate::Producer::try_put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryPutError<T> {
    /// Every slot holds an unread value.
    #[error("ring is full")]
    Full(T),
    /// The ring was closed; no further values are accepted.
    #[error("ring is closed")]
    Closed(T),
}

impl<T> TryPutError<T> {
    /// Recovers the value that was not enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            Self::Full(value) | Self::Closed(value) => value,
        }
    }

    /// Returns `true` if retrying later can succeed.
    #[inline]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Returned by [`Producer::put`](crate::Producer::put) when the ring is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("put on a closed ring")]
pub struct PutError<T>(pub T);

impl<T> PutError<T> {
    /// Recovers the value that was not enqueued.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Returned by [`Consumer::try_get`](crate::Consumer::try_get).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryGetError {
    /// Nothing published yet and the ring is still open.
    #[error("ring is empty")]
    Empty,
    /// The ring is closed and every value has been consumed.
    #[error("ring is closed and drained")]
    Closed,
}

impl TryGetError {
    /// Returns `true` if this is the end-of-stream indication.
    #[inline]
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
