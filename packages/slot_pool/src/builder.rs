use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;

use crate::{DEFAULT_CHUNK_CAPACITY, DropPolicy, IndexedPool};

/// Builder for creating an instance of [`IndexedPool`].
///
/// You only need to use this builder if you want to customize the pool configuration.
/// The default configuration used by [`IndexedPool::new()`][1] is sufficient for most use cases.
///
/// # Examples
///
/// ```
/// use slot_pool::{DropPolicy, IndexedPool};
///
/// let pool = IndexedPool::<u32>::builder()
///     .chunk_capacity(64)
///     .drop_policy(DropPolicy::MayDropLiveSlots)
///     .build();
///
/// assert_eq!(pool.chunk_capacity(), 64);
/// ```
///
/// [1]: IndexedPool::new
#[must_use]
pub struct IndexedPoolBuilder<T> {
    chunk_capacity: usize,
    drop_policy: DropPolicy,

    _item: PhantomData<T>,
}

impl<T> fmt::Debug for IndexedPoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedPoolBuilder")
            .field("item_type", &format_args!("{}", type_name::<T>()))
            .field("chunk_capacity", &self.chunk_capacity)
            .field("drop_policy", &self.drop_policy)
            .finish()
    }
}

impl<T> IndexedPoolBuilder<T> {
    pub(crate) fn new() -> Self {
        Self {
            chunk_capacity: DEFAULT_CHUNK_CAPACITY,
            drop_policy: DropPolicy::default(),
            _item: PhantomData,
        }
    }

    /// Sets the number of slots allocated together whenever the pool needs more storage.
    ///
    /// Larger chunks mean fewer allocations but more unused memory in a sparsely used pool.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn chunk_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "chunk capacity must be non-zero");

        self.chunk_capacity = capacity;
        self
    }

    /// Sets the [drop policy][DropPolicy] for the pool. This governs how to treat slots that are
    /// still live when the pool is dropped.
    pub fn drop_policy(mut self, policy: DropPolicy) -> Self {
        self.drop_policy = policy;
        self
    }

    /// Builds the pool with the specified configuration.
    #[must_use]
    pub fn build(self) -> IndexedPool<T> {
        IndexedPool::new_inner(self.chunk_capacity, self.drop_policy)
    }
}
