use std::any::type_name;
use std::collections::TryReserveError;

use num_integer::Integer;
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// This is the backing storage of an `IndexedPool`. It is an implementation detail.
///
/// A growable index-addressed sequence of slots, assembled from fixed-capacity chunks. Each chunk
/// is a separate heap allocation that is never reallocated, so growing the table never moves an
/// existing slot: only the small vector of chunk pointers is ever reallocated.
///
/// New slots are filled with `T::default()` when their chunk is allocated. After that the table
/// never resets a slot; whatever was last written to it remains there.
#[derive(Debug)]
pub(crate) struct ExtensibleTable<T> {
    chunks: Vec<Box<[Slot<T>]>>,

    /// Number of slots in every chunk. Always non-zero.
    chunk_capacity: usize,
}

/// One storage position in the table.
#[derive(Debug, Default)]
pub(crate) struct Slot<T> {
    pub(crate) value: T,

    /// Whether the slot is currently handed out to a caller. The table itself does not interpret
    /// this, it is bookkeeping for the owner of the table.
    pub(crate) live: bool,
}

impl<T> ExtensibleTable<T> {
    /// # Panics
    ///
    /// Panics if `chunk_capacity` is zero.
    #[must_use]
    pub(crate) fn new(chunk_capacity: usize) -> Self {
        assert!(
            chunk_capacity > 0,
            "ExtensibleTable must have non-zero chunk capacity"
        );

        Self {
            chunks: Vec::new(),
            chunk_capacity,
        }
    }

    /// The number of slots the table can address without growing.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Can be mutated to infinitely growing memory use.
    pub(crate) fn extent(&self) -> usize {
        self.chunks
            .len()
            .checked_mul(self.chunk_capacity)
            .expect("overflow here would mean the table holds more slots than virtual memory can fit, which makes no sense")
    }

    #[must_use]
    pub(crate) fn chunk_capacity(&self) -> usize {
        self.chunk_capacity
    }

    #[cfg(test)]
    #[must_use]
    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub(crate) fn slot(&self, index: usize) -> Option<&Slot<T>> {
        let (chunk_index, index_in_chunk) = index.div_rem(&self.chunk_capacity);

        self.chunks
            .get(chunk_index)
            .and_then(|chunk| chunk.get(index_in_chunk))
    }

    #[must_use]
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot<T>> {
        let (chunk_index, index_in_chunk) = index.div_rem(&self.chunk_capacity);

        self.chunks
            .get_mut(chunk_index)
            .and_then(|chunk| chunk.get_mut(index_in_chunk))
    }

    /// Drops trailing chunks that are not needed to hold `min_extent` slots.
    ///
    /// Returns the number of chunks that were dropped.
    #[cfg_attr(test, mutants::skip)] // Only affects memory use, which is not observable in tests.
    pub(crate) fn truncate_to(&mut self, min_extent: usize) -> usize {
        let required_chunks = min_extent.div_ceil(self.chunk_capacity);
        let dropped_chunks = self.chunks.len().saturating_sub(required_chunks);

        if dropped_chunks > 0 {
            self.chunks.truncate(required_chunks);
            self.chunks.shrink_to_fit();

            debug!(
                "dropped {dropped_chunks} unused chunks of {}, {} chunks remain",
                type_name::<T>(),
                self.chunks.len()
            );
        }

        dropped_chunks
    }
}

impl<T: Default> ExtensibleTable<T> {
    /// Grows the table until it can address at least `required` slots.
    ///
    /// Chunks allocated before a failure are kept, so a failed call may still increase the
    /// extent. Existing slots are never moved or modified.
    pub(crate) fn ensure_extent(&mut self, required: usize) -> Result<()> {
        let required_chunks = required.div_ceil(self.chunk_capacity);
        let additional_chunks = required_chunks.saturating_sub(self.chunks.len());

        if additional_chunks == 0 {
            return Ok(());
        }

        self.chunks
            .try_reserve(additional_chunks)
            .map_err(|source| allocation_failed::<T>(required, source))?;

        for _ in 0..additional_chunks {
            let chunk = self.allocate_chunk(required)?;
            self.chunks.push(chunk);
        }

        trace!(
            "grew table of {} by {additional_chunks} chunks to {} slots",
            type_name::<T>(),
            self.extent()
        );

        Ok(())
    }

    fn allocate_chunk(&self, requested_slots: usize) -> Result<Box<[Slot<T>]>> {
        let mut chunk = Vec::new();

        chunk
            .try_reserve_exact(self.chunk_capacity)
            .map_err(|source| allocation_failed::<T>(requested_slots, source))?;

        chunk.resize_with(self.chunk_capacity, Slot::default);

        Ok(chunk.into_boxed_slice())
    }
}

fn allocation_failed<T>(requested_slots: usize, source: TryReserveError) -> Error {
    warn!(
        "failed to grow table of {} to {requested_slots} slots: {source}",
        type_name::<T>()
    );

    Error::AllocationFailed {
        requested_slots,
        source,
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::ptr;

    use super::*;

    #[test]
    fn starts_empty() {
        let table = ExtensibleTable::<u32>::new(4);

        assert_eq!(table.extent(), 0);
        assert_eq!(table.chunk_count(), 0);
        assert!(table.slot(0).is_none());
    }

    #[test]
    fn grows_by_whole_chunks() {
        let mut table = ExtensibleTable::<u32>::new(4);

        table.ensure_extent(1).unwrap();
        assert_eq!(table.extent(), 4);
        assert_eq!(table.chunk_count(), 1);

        table.ensure_extent(4).unwrap();
        assert_eq!(table.chunk_count(), 1);

        table.ensure_extent(5).unwrap();
        assert_eq!(table.extent(), 8);
        assert_eq!(table.chunk_count(), 2);

        table.ensure_extent(17).unwrap();
        assert_eq!(table.extent(), 20);
    }

    #[test]
    fn ensure_smaller_extent_is_noop() {
        let mut table = ExtensibleTable::<u32>::new(4);

        table.ensure_extent(8).unwrap();
        table.ensure_extent(3).unwrap();
        table.ensure_extent(0).unwrap();

        assert_eq!(table.extent(), 8);
    }

    #[test]
    fn new_slots_are_default_and_not_live() {
        let mut table = ExtensibleTable::<u32>::new(4);
        table.ensure_extent(4).unwrap();

        for index in 0..4 {
            let slot = table.slot(index).unwrap();
            assert_eq!(slot.value, 0);
            assert!(!slot.live);
        }

        assert!(table.slot(4).is_none());
    }

    #[test]
    fn values_persist_across_growth() {
        let mut table = ExtensibleTable::<u32>::new(2);
        table.ensure_extent(2).unwrap();

        table.slot_mut(0).unwrap().value = 10;
        table.slot_mut(1).unwrap().value = 11;

        table.ensure_extent(64).unwrap();

        assert_eq!(table.slot(0).unwrap().value, 10);
        assert_eq!(table.slot(1).unwrap().value, 11);
        assert_eq!(table.slot(63).unwrap().value, 0);
    }

    #[test]
    fn growth_does_not_move_slots() {
        let mut table = ExtensibleTable::<u64>::new(2);
        table.ensure_extent(3).unwrap();

        let first = ptr::from_ref(&table.slot(0).unwrap().value);
        let third = ptr::from_ref(&table.slot(2).unwrap().value);

        // Enough chunks to force the chunk pointer vector to reallocate several times.
        table.ensure_extent(1000).unwrap();

        assert!(ptr::eq(first, &table.slot(0).unwrap().value));
        assert!(ptr::eq(third, &table.slot(2).unwrap().value));
    }

    #[test]
    fn truncate_keeps_required_chunks() {
        let mut table = ExtensibleTable::<u32>::new(4);
        table.ensure_extent(16).unwrap();
        table.slot_mut(4).unwrap().value = 99;

        assert_eq!(table.truncate_to(5), 2);
        assert_eq!(table.extent(), 8);
        assert_eq!(table.slot(4).unwrap().value, 99);

        assert_eq!(table.truncate_to(5), 0);

        assert_eq!(table.truncate_to(0), 2);
        assert_eq!(table.extent(), 0);
    }

    #[test]
    fn impossible_growth_is_reported() {
        let mut table = ExtensibleTable::<u64>::new(4);
        table.ensure_extent(4).unwrap();

        let result = table.ensure_extent(usize::MAX - 1);

        assert!(matches!(
            result,
            Err(Error::AllocationFailed {
                requested_slots,
                ..
            }) if requested_slots == usize::MAX - 1
        ));

        // The existing chunk is still there and usable.
        assert_eq!(table.extent(), 4);
        assert!(table.slot(3).is_some());
    }

    #[test]
    #[should_panic]
    fn zero_chunk_capacity_is_panic() {
        drop(ExtensibleTable::<u32>::new(0));
    }
}
