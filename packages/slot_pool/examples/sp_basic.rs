//! Basic usage of the `slot_pool` crate:
//!
//! * Creating a pool.
//! * Acquiring slots and writing to them.
//! * Releasing slots and seeing them reused.
//! * Scoped slot ownership via leases.

use slot_pool::IndexedPool;

fn main() -> Result<(), slot_pool::Error> {
    let mut pool = IndexedPool::<String>::new();

    // Inserting an item gives you a handle that you can later use to look up the item again.
    let alice = pool.insert("Alice".to_string())?;
    let bob = pool.insert("Bob".to_string())?;
    let charlie = pool.insert("Charlie".to_string())?;

    println!(
        "Pool has {} live slots, handles {alice}, {bob} and {charlie}, capacity {}",
        pool.len(),
        pool.capacity()
    );

    // Slots are accessed by indexing, similar to `Vec[index]`.
    pool[alice].push_str(" Smith");
    println!("Modified item: {}", pool[alice]);

    // Bob is in the middle, so his handle goes to the free list and is handed out next.
    pool.release(bob)?;
    let dave = pool.acquire()?;
    println!(
        "Reused handle {dave} still holds the stale value {:?}",
        pool[dave]
    );
    pool[dave] = "Dave".to_string();

    // Charlie is the trailing slot, so releasing him just lowers the high-water mark.
    pool.release(charlie)?;
    println!(
        "After releasing the trailing slot: high-water mark {}, free list {}",
        pool.high_water_mark(),
        pool.free_count()
    );

    // A lease gives the slot back automatically when it goes out of scope.
    {
        let mut scratch = pool.lease()?;
        scratch.clear();
        scratch.push_str("temporary");
        println!("Leased slot {} holds {:?}", scratch.handle(), *scratch);
    }

    for (handle, name) in &pool {
        println!("{handle}: {name}");
    }

    Ok(())
}
