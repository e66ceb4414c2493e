use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use crate::{Handle, IndexedPool};

/// Exclusive ownership of one live slot, released back to the pool when the lease is dropped.
///
/// Created by [`IndexedPool::lease()`]. The lease borrows the pool exclusively for its lifetime,
/// so nothing else can touch the pool while it exists. A lease cannot be cloned; it can be moved
/// or turned into a plain [`Handle`] via [`into_handle()`][Self::into_handle], after which the
/// caller is responsible for releasing the slot.
///
/// # Example
///
/// ```rust
/// use slot_pool::IndexedPool;
///
/// let mut pool = IndexedPool::<Vec<u8>>::new();
///
/// let handle = {
///     let mut lease = pool.lease().unwrap();
///     lease.extend_from_slice(b"kept");
///     lease.into_handle()
/// };
///
/// assert_eq!(pool[handle], b"kept");
/// pool.release(handle).unwrap();
/// ```
pub struct Lease<'p, T> {
    pool: &'p mut IndexedPool<T>,
    handle: Handle,
}

impl<'p, T> Lease<'p, T> {
    pub(crate) fn new(pool: &'p mut IndexedPool<T>, handle: Handle) -> Self {
        debug_assert!(pool.is_live(handle));

        Self { pool, handle }
    }

    /// The handle of the leased slot.
    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Gives up the lease without releasing the slot, returning its handle.
    #[must_use]
    pub fn into_handle(self) -> Handle {
        let handle = self.handle;

        // Skipping our Drop impl is all that is needed, the only other field is a reference.
        mem::forget(self);

        handle
    }
}

impl<T> Deref for Lease<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.pool[self.handle]
    }
}

impl<T> DerefMut for Lease<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pool[self.handle]
    }
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        self.pool
            .release(self.handle)
            .expect("a lease holds the pool exclusively, so its handle is always live");
    }
}

impl<T: fmt::Debug> fmt::Debug for Lease<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease")
            .field("handle", &self.handle)
            .field("value", &**self)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::DropPolicy;

    assert_not_impl_any!(Lease<'static, u32>: Clone, Copy);

    #[test]
    fn drop_releases_slot() {
        let mut pool = IndexedPool::<u32>::new();

        {
            let mut lease = pool.lease().unwrap();
            *lease = 5;
            assert_eq!(lease.handle().index(), 0);
        }

        assert!(pool.is_empty());
        assert_eq!(pool.high_water_mark(), 0);
    }

    #[test]
    fn interior_lease_goes_to_free_list() {
        let mut pool = IndexedPool::<u32>::new();

        let lease = pool.lease().unwrap();
        let handle = lease.into_handle();
        let other = pool.acquire().unwrap();

        pool.release(handle).unwrap();

        {
            let mut lease = pool.lease().unwrap();
            assert_eq!(lease.handle(), handle);
            *lease = 3;
        }

        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.len(), 1);
        assert!(pool.is_live(other));
    }

    #[test]
    fn into_handle_keeps_slot_live() {
        let mut pool = IndexedPool::<u32>::builder()
            .drop_policy(DropPolicy::MustNotDropLiveSlots)
            .build();

        let handle = {
            let mut lease = pool.lease().unwrap();
            *lease = 11;
            lease.into_handle()
        };

        assert!(pool.is_live(handle));
        assert_eq!(pool[handle], 11);

        pool.release(handle).unwrap();
    }

    #[test]
    fn lease_sees_stale_value() {
        let mut pool = IndexedPool::<u32>::new();

        let handle = pool.insert(77).unwrap();
        pool.release(handle).unwrap();

        let lease = pool.lease().unwrap();

        assert_eq!(*lease, 77);
    }

    #[test]
    fn debug_shows_value() {
        let mut pool = IndexedPool::<u32>::new();

        let mut lease = pool.lease().unwrap();
        *lease = 1234;

        assert!(format!("{lease:?}").contains("1234"));
    }
}
