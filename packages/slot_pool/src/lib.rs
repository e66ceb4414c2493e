#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! An indexed object pool that hands out slots addressed by small integer handles.
//!
//! This crate provides [`IndexedPool`], a pool of unbounded size where acquiring and releasing a
//! slot are both O(1). Released slots are reused before new ones are created, most recently
//! released first, so the handles stay small and dense.
//!
//! # Key Features
//!
//! - **Integer handles**: slots are addressed by [`Handle`], a copyable index that is cheap to
//!   store in other data structures
//! - **LIFO slot reuse**: the most recently released handle is the next one handed out
//! - **Trailing-slot reclamation**: releasing the most recently created slot lowers the pool's
//!   high-water mark without any free-list bookkeeping
//! - **Stable storage**: items live in fixed-size chunks that never move as the pool grows
//! - **Checked handles**: releasing or accessing a slot that is not live is detected
//! - **Scoped ownership**: [`Lease`] releases its slot automatically when dropped
//! - **Fallible growth**: running out of memory is reported as [`Error::AllocationFailed`]
//!   instead of aborting
//!
//! # Slot contents
//!
//! The pool never resets a slot. A newly created slot holds `T::default()` and a reused slot holds
//! whatever was last written to it.
//!
//! # Example
//!
//! ```rust
//! use slot_pool::IndexedPool;
//!
//! let mut pool = IndexedPool::<String>::new();
//!
//! let alice = pool.insert("Alice".to_string())?;
//! let bob = pool.insert("Bob".to_string())?;
//! assert_eq!((alice.index(), bob.index()), (0, 1));
//!
//! pool[bob].push_str(" Smith");
//! assert_eq!(pool[bob], "Bob Smith");
//!
//! // Releasing an interior slot makes it the next one to be handed out.
//! pool.release(alice)?;
//! let carol = pool.acquire()?;
//! assert_eq!(carol, alice);
//!
//! // The old value is still there until overwritten.
//! assert_eq!(pool[carol], "Alice");
//! # Ok::<(), slot_pool::Error>(())
//! ```
//!
//! # Thread safety
//!
//! The pool is `Send` and `Sync` if `T` is. All mutating operations take `&mut self`, so sharing a
//! pool between threads requires external synchronization such as a `Mutex`.

mod builder;
mod drop_policy;
mod error;
mod handle;
mod lease;
mod pool;
mod table;

pub use builder::*;
pub use drop_policy::*;
pub use error::*;
pub use handle::*;
pub use lease::*;
pub use pool::{IndexedPool, Iter};
pub(crate) use pool::DEFAULT_CHUNK_CAPACITY;
pub(crate) use table::*;
