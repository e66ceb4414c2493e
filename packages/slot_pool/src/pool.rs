use std::any::type_name;
use std::iter::FusedIterator;
use std::ops::{Index, IndexMut};
use std::thread;

use crate::{DropPolicy, Error, ExtensibleTable, Handle, IndexedPoolBuilder, Lease, Result};

/// An object pool of unbounded size that hands out slots addressed by small integer handles.
///
/// Slots are obtained via [`acquire()`][1] (or [`insert()`][2], which also writes a value) and
/// returned via [`release()`][3]. Both are O(1): released slots are remembered in a free list and
/// handed out again, most recently released first, before any new slot is created.
///
/// # Slot reuse
///
/// The pool never resets a slot when it is released or reused. A freshly created slot holds
/// `T::default()`, while a reused slot holds whatever value was last written to it. Callers that
/// care should assign a value right after acquiring, which is what [`insert()`][2] does.
///
/// # Releasing the trailing slot
///
/// The pool tracks a high-water mark: the number of slots ever handed out. Releasing the slot
/// right below the high-water mark lowers the mark instead of pushing the handle to the free
/// list. Only the released handle is compared with the mark, so releasing handles in descending
/// order collapses the pool back to empty while any other order goes through the free list.
///
/// # Stable storage
///
/// Storage is allocated in fixed-size chunks that never move once allocated, so growing the pool
/// never moves existing items. References are still bound by the usual borrow rules.
///
/// # Misuse
///
/// Handles are checked. Releasing a handle that is not live returns [`Error::InvalidHandle`],
/// [`get()`][4] returns `None` and indexing panics.
///
/// [1]: Self::acquire
/// [2]: Self::insert
/// [3]: Self::release
/// [4]: Self::get
#[derive(Debug)]
pub struct IndexedPool<T> {
    table: ExtensibleTable<T>,

    /// Released handles below the high-water mark, waiting to be reused. The last entry is the
    /// next one to be handed out.
    free_list: Vec<Handle>,

    /// Number of slots ever handed out, minus those reclaimed by releasing the trailing slot.
    high_water_mark: usize,

    drop_policy: DropPolicy,
}

/// The pool is assembled from chunks, each containing a fixed number of slots, unless the caller
/// asks for something else via the builder.
#[cfg(not(miri))]
pub(crate) const DEFAULT_CHUNK_CAPACITY: usize = 128;

// Under Miri, we use a smaller chunk capacity because Miri test runtime scales by memory usage.
#[cfg(miri)]
pub(crate) const DEFAULT_CHUNK_CAPACITY: usize = 4;

impl<T> IndexedPool<T> {
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    #[must_use]
    pub(crate) fn new_inner(chunk_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            table: ExtensibleTable::new(chunk_capacity),
            free_list: Vec::new(),
            high_water_mark: 0,
            drop_policy,
        }
    }

    /// Creates a new [`IndexedPool`] with the default configuration.
    ///
    /// The pool starts empty and grows as needed when slots are acquired.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<String>::new();
    /// assert!(pool.is_empty());
    ///
    /// let handle = pool.insert("Hello".to_string()).unwrap();
    /// assert_eq!(pool.len(), 1);
    /// assert_eq!(pool[handle], "Hello");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts building a new [`IndexedPool`].
    ///
    /// Use this when you want to customize the pool configuration beyond the defaults.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::{DropPolicy, IndexedPool};
    ///
    /// let pool = IndexedPool::<u32>::builder()
    ///     .chunk_capacity(16)
    ///     .drop_policy(DropPolicy::MustNotDropLiveSlots)
    ///     .build();
    ///
    /// assert!(pool.is_empty());
    /// ```
    pub fn builder() -> IndexedPoolBuilder<T> {
        IndexedPoolBuilder::new()
    }

    /// The number of live slots in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.high_water_mark
            .checked_sub(self.free_list.len())
            .expect("the free list only holds handles below the high-water mark, without duplicates")
    }

    /// Whether the pool has no live slots.
    ///
    /// An empty pool may still be holding storage, see [`shrink_to_fit()`][1].
    ///
    /// [1]: Self::shrink_to_fit
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of slots handed out so far that have not been reclaimed by releasing the
    /// trailing slot. Every live handle is below this value.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<u32>::new();
    ///
    /// let a = pool.acquire().unwrap();
    /// let b = pool.acquire().unwrap();
    /// assert_eq!(pool.high_water_mark(), 2);
    ///
    /// // Releasing an interior slot does not lower the mark.
    /// pool.release(a).unwrap();
    /// assert_eq!(pool.high_water_mark(), 2);
    ///
    /// // Releasing the trailing slot does.
    /// pool.release(b).unwrap();
    /// assert_eq!(pool.high_water_mark(), 1);
    /// ```
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// The number of released handles waiting in the free list to be reused.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free_list.len()
    }

    /// The number of slots the pool can address without allocating more storage.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.extent()
    }

    /// The number of slots in each storage chunk.
    #[must_use]
    pub fn chunk_capacity(&self) -> usize {
        self.table.chunk_capacity()
    }

    /// Whether `handle` refers to a slot that is currently handed out.
    #[must_use]
    pub fn is_live(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Gets a reference to the value in a live slot, or `None` if the handle is not live.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        if handle.index() >= self.high_water_mark {
            return None;
        }

        self.table
            .slot(handle.index())
            .filter(|slot| slot.live)
            .map(|slot| &slot.value)
    }

    /// Gets an exclusive reference to the value in a live slot, or `None` if the handle is not
    /// live.
    #[must_use]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        if handle.index() >= self.high_water_mark {
            return None;
        }

        self.table
            .slot_mut(handle.index())
            .filter(|slot| slot.live)
            .map(|slot| &mut slot.value)
    }

    /// Returns a slot to the pool.
    ///
    /// If the slot is the trailing one (right below the high-water mark), the mark is lowered.
    /// Otherwise the handle goes to the free list and will be the next one handed out. The value
    /// in the slot is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] if the handle is not live, for example because it was
    /// already released. The pool is not modified in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<u32>::new();
    /// let handle = pool.insert(42).unwrap();
    ///
    /// pool.release(handle).unwrap();
    /// assert!(pool.is_empty());
    ///
    /// // A second release of the same handle is rejected.
    /// assert!(pool.release(handle).is_err());
    /// ```
    pub fn release(&mut self, handle: Handle) -> Result<()> {
        if !self.is_live(handle) {
            return Err(Error::InvalidHandle {
                handle,
                high_water_mark: self.high_water_mark,
            });
        }

        self.table
            .slot_mut(handle.index())
            .expect("live handles always have storage")
            .live = false;

        let trailing_index = self
            .high_water_mark
            .checked_sub(1)
            .expect("there is a live handle, so the high-water mark cannot be zero");

        if handle.index() == trailing_index {
            self.high_water_mark = trailing_index;
        } else {
            self.free_list.push(handle);
        }

        Ok(())
    }

    /// Drops storage chunks that lie entirely at or above the high-water mark.
    ///
    /// Live slots and slots waiting in the free list are never affected, so all handles remain
    /// valid and keep their values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<u32>::builder().chunk_capacity(4).build();
    ///
    /// let handles = (0..10)
    ///     .map(|i| pool.insert(i).unwrap())
    ///     .collect::<Vec<_>>();
    /// assert_eq!(pool.capacity(), 12);
    ///
    /// for handle in handles.into_iter().rev() {
    ///     pool.release(handle).unwrap();
    /// }
    ///
    /// pool.shrink_to_fit();
    /// assert_eq!(pool.capacity(), 0);
    /// ```
    pub fn shrink_to_fit(&mut self) {
        self.table.truncate_to(self.high_water_mark);
        self.free_list.shrink_to_fit();
    }

    /// Iterates over the live slots in ascending handle order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            pool: self,
            next_index: 0,
        }
    }

    #[cfg(test)]
    #[cfg_attr(test, mutants::skip)] // This is essentially test logic, mutation is meaningless.
    pub(crate) fn integrity_check(&self) {
        assert!(
            self.table.extent() >= self.high_water_mark,
            "high-water mark {} is beyond the storage extent {} in pool of {}",
            self.high_water_mark,
            self.table.extent(),
            type_name::<T>()
        );

        let mut in_free_list = vec![false; self.high_water_mark];

        for handle in &self.free_list {
            let seen = in_free_list.get_mut(handle.index()).unwrap_or_else(|| {
                panic!(
                    "free list entry {handle} is not below the high-water mark {} in pool of {}",
                    self.high_water_mark,
                    type_name::<T>()
                )
            });

            assert!(
                !*seen,
                "free list contains {handle} twice in pool of {}",
                type_name::<T>()
            );
            *seen = true;
        }

        for (index, in_free_list) in in_free_list.into_iter().enumerate() {
            let live = self.table.slot(index).is_some_and(|slot| slot.live);

            assert!(
                live != in_free_list,
                "slot {index} below the high-water mark must be either live or in the free list in pool of {}",
                type_name::<T>()
            );
        }

        for index in self.high_water_mark..self.table.extent() {
            assert!(
                !self.table.slot(index).is_some_and(|slot| slot.live),
                "slot {index} above the high-water mark is live in pool of {}",
                type_name::<T>()
            );
        }
    }
}

impl<T: Default> IndexedPool<T> {
    /// Hands out a slot and returns its handle.
    ///
    /// The most recently released handle in the free list is reused if there is one. Otherwise a
    /// new slot is created right at the high-water mark, growing the storage if needed.
    ///
    /// The slot keeps whatever value was last written to it, or `T::default()` if it has never
    /// been written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the storage could not grow. The pool is not
    /// modified in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<u32>::new();
    ///
    /// let a = pool.acquire().unwrap();
    /// let b = pool.acquire().unwrap();
    /// pool[a] = 1;
    /// pool[b] = 2;
    ///
    /// pool.release(a).unwrap();
    ///
    /// // The released handle is reused, with its old value still in place.
    /// let c = pool.acquire().unwrap();
    /// assert_eq!(c, a);
    /// assert_eq!(pool[c], 1);
    /// ```
    pub fn acquire(&mut self) -> Result<Handle> {
        let handle = if let Some(handle) = self.free_list.pop() {
            handle
        } else {
            let new_high_water_mark = self
                .high_water_mark
                .checked_add(1)
                .expect("a pool cannot have more slots than virtual memory can fit");

            // Storage must exist before we commit to the new slot.
            self.table.ensure_extent(new_high_water_mark)?;

            let handle = Handle::from_index(self.high_water_mark);
            self.high_water_mark = new_high_water_mark;
            handle
        };

        self.table
            .slot_mut(handle.index())
            .expect("handles below the high-water mark always have storage")
            .live = true;

        Ok(handle)
    }

    /// Hands out a slot, stores `value` in it and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the storage could not grow. The pool is not
    /// modified in that case and `value` is dropped.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<String>::new();
    ///
    /// let handle = pool.insert("Hello".to_string()).unwrap();
    /// pool[handle].push_str(", World!");
    ///
    /// assert_eq!(pool.get(handle).map(String::as_str), Some("Hello, World!"));
    /// ```
    pub fn insert(&mut self, value: T) -> Result<Handle> {
        let handle = self.acquire()?;

        *self
            .get_mut(handle)
            .expect("we just acquired this handle, so it must be live") = value;

        Ok(handle)
    }

    /// Hands out a slot wrapped in a [`Lease`] that releases the slot when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the storage could not grow.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<u32>::new();
    ///
    /// {
    ///     let mut lease = pool.lease().unwrap();
    ///     *lease = 42;
    /// }
    ///
    /// assert!(pool.is_empty());
    /// ```
    pub fn lease(&mut self) -> Result<Lease<'_, T>> {
        let handle = self.acquire()?;

        Ok(Lease::new(self, handle))
    }

    /// Ensures that `additional` more slots can be created beyond the high-water mark without
    /// allocating more storage.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AllocationFailed`] if the storage could not grow. Existing slots are not
    /// affected in that case.
    ///
    /// # Panics
    ///
    /// Panics if the requested capacity overflows `usize`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use slot_pool::IndexedPool;
    ///
    /// let mut pool = IndexedPool::<u32>::new();
    ///
    /// pool.reserve(10).unwrap();
    /// assert!(pool.capacity() >= 10);
    /// ```
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let required = self
            .high_water_mark
            .checked_add(additional)
            .expect("capacity overflow: requested capacity exceeds maximum possible value");

        self.table.ensure_extent(required)
    }
}

impl<T> Default for IndexedPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for IndexedPool<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if the handle is not live.
    fn index(&self, handle: Handle) -> &Self::Output {
        self.get(handle).unwrap_or_else(|| {
            panic!(
                "handle {handle} is not live in pool of {}",
                type_name::<T>()
            )
        })
    }
}

impl<T> IndexMut<Handle> for IndexedPool<T> {
    /// # Panics
    ///
    /// Panics if the handle is not live.
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        self.get_mut(handle).unwrap_or_else(|| {
            panic!(
                "handle {handle} is not live in pool of {}",
                type_name::<T>()
            )
        })
    }
}

impl<T> Drop for IndexedPool<T> {
    fn drop(&mut self) {
        // If we are already panicking, we do not want to panic again because that will
        // simply obscure whatever the original panic was, leading to debug difficulties.
        if self.drop_policy == DropPolicy::MustNotDropLiveSlots && !thread::panicking() {
            assert!(
                self.is_empty(),
                "dropped a pool of {} with {} live slots with a policy that says it must be empty when dropped",
                type_name::<T>(),
                self.len()
            );
        }
    }
}

impl<'p, T> IntoIterator for &'p IndexedPool<T> {
    type Item = (Handle, &'p T);
    type IntoIter = Iter<'p, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the live slots of an [`IndexedPool`], created by [`IndexedPool::iter()`].
#[derive(Debug)]
pub struct Iter<'p, T> {
    pool: &'p IndexedPool<T>,
    next_index: usize,
}

impl<'p, T> Iterator for Iter<'p, T> {
    type Item = (Handle, &'p T);

    fn next(&mut self) -> Option<Self::Item> {
        while self.next_index < self.pool.high_water_mark {
            let handle = Handle::from_index(self.next_index);

            self.next_index = self
                .next_index
                .checked_add(1)
                .expect("bounded by the high-water mark, so cannot overflow");

            if let Some(value) = self.pool.get(handle) {
                return Some((handle, value));
            }
        }

        None
    }
}

impl<T> FusedIterator for Iter<'_, T> {}
