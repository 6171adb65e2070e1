use super::HashSetBuilder;
use crate::{
    common::{self, table::Table},
    policy::ResizePolicy,
    Set,
};

use parking_lot::Mutex;
use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    sync::Arc,
};

/// A thread-safe hash set guarded by a single mutex.
///
/// Every operation, including any resize it triggers, runs with the one lock
/// held end to end, so all operations are linearizable and `len` is always
/// exact. The price is that nothing ever runs in parallel; for write-heavy
/// workloads on many threads, prefer [`StripedHashSet`][striped-struct] or
/// [`RefinableHashSet`][refinable-struct].
///
/// [striped-struct]: ./struct.StripedHashSet.html
/// [refinable-struct]: ./struct.RefinableHashSet.html
///
/// # Examples
///
/// ```rust
/// use lockset::sync::CoarseHashSet;
///
/// use std::thread;
///
/// let set = CoarseHashSet::new(16);
///
/// let threads: Vec<_> = (0..4)
///     .map(|_| {
///         // Clones share the same underlying set.
///         let my_set = set.clone();
///         thread::spawn(move || my_set.add("once"))
///     })
///     .collect();
///
/// let inserted = threads
///     .into_iter()
///     .map(|t| t.join().expect("Failed"))
///     .filter(|inserted| *inserted)
///     .count();
///
/// // Exactly one thread observed the insert.
/// assert_eq!(inserted, 1);
/// assert_eq!(set.len(), 1);
/// ```
pub struct CoarseHashSet<T, S = RandomState> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for CoarseHashSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T, S> {
    state: Mutex<State<T>>,
    policy: ResizePolicy,
    build_hasher: S,
}

struct State<T> {
    table: Table<T>,
    len: usize,
}

impl<T> CoarseHashSet<T, RandomState>
where
    T: Hash + Eq,
{
    /// Constructs a new `CoarseHashSet` with `initial_capacity` buckets.
    ///
    /// # Panics
    ///
    /// Panics if `initial_capacity` is zero.
    pub fn new(initial_capacity: usize) -> Self {
        Self::with_everything(
            initial_capacity,
            ResizePolicy::default(),
            RandomState::default(),
        )
    }

    /// Returns a [`HashSetBuilder`][builder-struct], which can build a
    /// `CoarseHashSet` with a custom resize policy or hasher.
    ///
    /// [builder-struct]: ./struct.HashSetBuilder.html
    pub fn builder(initial_capacity: usize) -> HashSetBuilder<CoarseHashSet<T, RandomState>> {
        HashSetBuilder::new(initial_capacity)
    }
}

impl<T, S> CoarseHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    pub(crate) fn with_everything(
        initial_capacity: usize,
        policy: ResizePolicy,
        build_hasher: S,
    ) -> Self {
        assert!(initial_capacity > 0, "initial_capacity must not be zero");
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    table: Table::with_capacity(initial_capacity),
                    len: 0,
                }),
                policy,
                build_hasher,
            }),
        }
    }

    /// Adds `elem` to the set. Returns `true` if it was absent, and `false`
    /// otherwise.
    pub fn add(&self, elem: T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, &elem);

        let mut state = inner.state.lock();
        if state.table.contains(hash, &elem) {
            return false;
        }

        state.table.push(hash, elem);
        state.len += 1;

        if inner.policy.should_resize(state.table.bucket_lens()) {
            // Still under the one lock; a coarse-grained resize excludes
            // every other operation for its whole duration.
            #[cfg(feature = "logging")]
            let old_capacity = state.table.capacity();

            let build_hasher = &inner.build_hasher;
            state.table.grow(|elem| common::hash(build_hasher, elem));

            #[cfg(feature = "logging")]
            log::trace!(
                "resized coarse-grained hash set table: {} -> {} buckets",
                old_capacity,
                state.table.capacity()
            );
        }
        true
    }

    /// Removes `elem` from the set. Returns `true` if it was present, and
    /// `false` otherwise.
    pub fn remove(&self, elem: &T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, elem);

        let mut state = inner.state.lock();
        if state.table.remove(hash, elem) {
            state.len -= 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` if `elem` is present in the set.
    pub fn contains(&self, elem: &T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, elem);
        inner.state.lock().table.contains(hash, elem)
    }

    /// Returns the number of elements in the set.
    ///
    /// Unlike the striped variants, this read takes the set's lock and is
    /// linearizable with every mutation.
    pub fn len(&self) -> usize {
        self.inner.state.lock().len
    }

    /// Returns `true` if the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.inner.state.lock().table.capacity()
    }
}

impl<T, S> Set<T> for CoarseHashSet<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    fn add(&mut self, elem: T) -> bool {
        Self::add(self, elem)
    }

    fn remove(&mut self, elem: &T) -> bool {
        Self::remove(self, elem)
    }

    fn contains(&self, elem: &T) -> bool {
        Self::contains(self, elem)
    }

    fn len(&self) -> usize {
        Self::len(self)
    }
}
