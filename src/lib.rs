#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

//! A family of hash sets sharing one contract (`add`, `remove`, `contains`,
//! `len`) under different concurrency-control strategies.
//!
//! All sets store unique elements of a hashable, equality-comparable type in
//! an array of buckets, growing the array when the [resize policy][policy]
//! fires. They differ only in how concurrent mutation is made safe:
//!
//! - [`unsync::HashSet`]: no synchronization at all; the single-threaded
//!   baseline the other variants are measured against.
//! - [`sync::CoarseHashSet`]: one mutex guards the whole table. Simple and
//!   linearizable, but every operation is serialized.
//! - [`sync::StripedHashSet`]: a fixed array of locks, each guarding a
//!   disjoint group of buckets. The table grows; the lock array does not.
//! - [`sync::RefinableHashSet`]: lock striping where the lock array is
//!   resized in step with the table, so lock granularity keeps tracking the
//!   bucket count.
//!
//! [policy]: crate::policy::ResizePolicy
//!
//! # Examples
//!
//! ```rust
//! use lockset::sync::StripedHashSet;
//!
//! use std::thread;
//!
//! const NUM_THREADS: u64 = 4;
//! const KEYS_PER_THREAD: u64 = 100;
//!
//! let set = StripedHashSet::new(16);
//!
//! // To share the same set across threads, clone it. This is a cheap
//! // operation; clones operate on the same underlying set.
//! let threads: Vec<_> = (0..NUM_THREADS)
//!     .map(|i| {
//!         let my_set = set.clone();
//!         thread::spawn(move || {
//!             for key in (i * KEYS_PER_THREAD)..((i + 1) * KEYS_PER_THREAD) {
//!                 assert!(my_set.add(key));
//!             }
//!         })
//!     })
//!     .collect();
//!
//! threads.into_iter().for_each(|t| t.join().expect("Failed"));
//!
//! assert_eq!(set.len(), (NUM_THREADS * KEYS_PER_THREAD) as usize);
//! assert!(set.contains(&0));
//! ```

pub(crate) mod common;
pub mod policy;
pub mod sync;
pub mod unsync;

pub use policy::ResizePolicy;

/// The operations every hash set in this crate supports.
///
/// Mutating methods take `&mut self` so that [`unsync::HashSet`] can
/// implement the trait without interior mutability. The `sync` sets also
/// expose the same operations as inherent methods on `&self`; multi-threaded
/// callers use those, while this trait is what generic single-threaded code
/// (such as the contract tests) is written against.
pub trait Set<T> {
    /// Adds `elem` to the set. Returns `true` if it was absent, and `false`
    /// otherwise.
    fn add(&mut self, elem: T) -> bool;

    /// Removes `elem` from the set. Returns `true` if it was present, and
    /// `false` otherwise.
    fn remove(&mut self, elem: &T) -> bool;

    /// Returns `true` if `elem` is present in the set.
    fn contains(&self, elem: &T) -> bool;

    /// Returns the number of elements in the set.
    fn len(&self) -> usize;

    /// Returns `true` if the set holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
