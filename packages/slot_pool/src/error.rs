use std::collections::TryReserveError;

use thiserror::Error;

use crate::Handle;

/// Errors that can occur when operating on an [`IndexedPool`][crate::IndexedPool].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The backing storage could not grow to accommodate more slots.
    ///
    /// The pool is left in the state it was in before the failed operation. Any storage that was
    /// successfully allocated before the failure is retained as spare capacity.
    #[error("failed to grow pool storage to {requested_slots} slots")]
    AllocationFailed {
        /// The total number of slots the storage was asked to provide.
        requested_slots: usize,

        /// The underlying allocation error.
        #[source]
        source: TryReserveError,
    },

    /// The caller provided a handle that is not associated with a live slot, either because it
    /// was never issued by the pool or because it has already been released.
    #[error("handle {handle} is not live in a pool with high-water mark {high_water_mark}")]
    InvalidHandle {
        /// The handle that was rejected.
        handle: Handle,

        /// The number of slots ever allocated by the pool at the time of the failure.
        high_water_mark: usize,
    },
}

/// A specialized `Result` type for pool operations, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
