use std::fmt;

/// Identifies one slot in an [`IndexedPool`][crate::IndexedPool].
///
/// Handles are small integers handed out by [`IndexedPool::acquire()`][1] and related methods.
/// A handle is only meaningful between the acquire that returned it and the release of that
/// same handle.
///
/// # Handle reuse
///
/// The pool reuses handles after they are released, most recently released first. Using a handle
/// after it was released may therefore refer to a slot that now belongs to someone else.
///
/// # Example
///
/// ```rust
/// use slot_pool::IndexedPool;
///
/// let mut pool = IndexedPool::<u32>::new();
///
/// let first = pool.acquire().unwrap();
/// let second = pool.acquire().unwrap();
///
/// assert_eq!(first.index(), 0);
/// assert_eq!(second.index(), 1);
/// ```
///
/// [1]: crate::IndexedPool::acquire
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Handle {
    index: usize,
}

impl Handle {
    /// Reconstructs a handle from an index previously obtained via [`index()`][Self::index].
    ///
    /// Whether the resulting handle refers to a live slot is up to the pool to decide.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self { index }
    }

    /// The position of the slot in the pool.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}
