//! Drives pools through long randomized acquire/release sequences and compares every step with a
//! simple reference model of the handle allocation rules.

#![allow(
    clippy::arithmetic_side_effects,
    reason = "we do not need to worry about these things when writing test code"
)]

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use slot_pool::{Handle, IndexedPool};

/// Plain model of the allocation rules: LIFO free list, trailing release lowers the mark.
#[derive(Debug, Default)]
struct Model {
    free_list: Vec<usize>,
    high_water_mark: usize,
}

impl Model {
    fn acquire(&mut self) -> usize {
        self.free_list.pop().unwrap_or_else(|| {
            self.high_water_mark += 1;
            self.high_water_mark - 1
        })
    }

    fn release(&mut self, index: usize) {
        if index + 1 == self.high_water_mark {
            self.high_water_mark -= 1;
        } else {
            self.free_list.push(index);
        }
    }
}

fn run_sequence(seed: u64, steps: usize, chunk_capacity: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pool = IndexedPool::<u64>::builder()
        .chunk_capacity(chunk_capacity)
        .build();
    let mut model = Model::default();

    // Every live handle together with the value we last wrote to it.
    let mut live: Vec<(Handle, u64)> = Vec::new();

    for step in 0..steps {
        let step_value = u64::try_from(step).unwrap();

        if live.is_empty() || rng.random_bool(0.55) {
            let handle = pool.acquire().unwrap();

            assert_eq!(handle.index(), model.acquire(), "step {step}");
            assert!(handle.index() < pool.high_water_mark());
            assert!(live.iter().all(|(other, _)| *other != handle));

            pool[handle] = step_value;
            live.push((handle, step_value));
        } else {
            let (handle, value) = live.swap_remove(rng.random_range(0..live.len()));

            assert_eq!(pool[handle], value);
            pool.release(handle).unwrap();
            model.release(handle.index());

            assert!(!pool.is_live(handle));
        }

        assert_eq!(pool.len(), live.len());
        assert_eq!(pool.high_water_mark(), model.high_water_mark);
        assert_eq!(pool.free_count(), model.free_list.len());
    }

    let unique = live
        .iter()
        .map(|(handle, _)| *handle)
        .collect::<HashSet<_>>();
    assert_eq!(unique.len(), live.len());

    for (handle, value) in &live {
        assert_eq!(pool[*handle], *value);
    }

    assert_eq!(pool.iter().count(), live.len());
}

#[test]
fn random_sequences_match_model() {
    for seed in 0..8 {
        run_sequence(seed, 2_000, 16);
    }
}

#[test]
fn random_sequences_with_tiny_chunks() {
    run_sequence(0xC0FFEE, 5_000, 1);
}

#[test]
fn random_sequences_with_default_chunks() {
    run_sequence(42, 5_000, 128);
}

#[test]
fn release_everything_in_descending_order_resets_pool() {
    let mut pool = IndexedPool::<u64>::new();

    let handles = (0..300)
        .map(|i| pool.insert(i).unwrap())
        .collect::<Vec<_>>();

    for handle in handles.into_iter().rev() {
        pool.release(handle).unwrap();
        assert_eq!(pool.free_count(), 0);
    }

    assert_eq!(pool.high_water_mark(), 0);
    assert_eq!(pool.acquire().unwrap().index(), 0);
}
