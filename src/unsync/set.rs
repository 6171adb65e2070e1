use super::HashSetBuilder;
use crate::{
    common::{self, table::Table},
    policy::ResizePolicy,
    Set,
};

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
};

/// An in-memory hash set that is _not_ thread-safe.
///
/// `HashSet` defines the reference semantics for this crate: the `sync` sets
/// behave, under any single-threaded sequence of operations, exactly like
/// this one. It is also the cheapest variant when no sharing is needed, as
/// every operation runs without any synchronization.
///
/// # Examples
///
/// ```rust
/// use lockset::unsync::HashSet;
///
/// let mut set = HashSet::new(16);
///
/// assert!(set.add(1));
/// assert!(!set.add(1));
/// assert!(set.contains(&1));
/// assert_eq!(set.len(), 1);
///
/// assert!(set.remove(&1));
/// assert!(!set.remove(&1));
/// assert!(set.is_empty());
/// ```
pub struct HashSet<T, S = RandomState> {
    table: Table<T>,
    len: usize,
    policy: ResizePolicy,
    build_hasher: S,
}

impl<T> HashSet<T, RandomState>
where
    T: Hash + Eq,
{
    /// Constructs a new `HashSet` with `initial_capacity` buckets.
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
    /// `HashSet` with a custom resize policy or hasher.
    ///
    /// [builder-struct]: ./struct.HashSetBuilder.html
    pub fn builder(initial_capacity: usize) -> HashSetBuilder<HashSet<T, RandomState>> {
        HashSetBuilder::new(initial_capacity)
    }
}

impl<T, S> HashSet<T, S>
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
            table: Table::with_capacity(initial_capacity),
            len: 0,
            policy,
            build_hasher,
        }
    }

    /// Adds `elem` to the set. Returns `true` if it was absent, and `false`
    /// otherwise.
    pub fn add(&mut self, elem: T) -> bool {
        let hash = common::hash(&self.build_hasher, &elem);
        if self.table.contains(hash, &elem) {
            return false;
        }

        self.table.push(hash, elem);
        self.len += 1;

        if self.policy.should_resize(self.table.bucket_lens()) {
            self.grow();
        }
        true
    }

    /// Removes `elem` from the set. Returns `true` if it was present, and
    /// `false` otherwise.
    pub fn remove(&mut self, elem: &T) -> bool {
        let hash = common::hash(&self.build_hasher, elem);
        if self.table.remove(hash, elem) {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Returns `true` if `elem` is present in the set.
    pub fn contains(&self, elem: &T) -> bool {
        let hash = common::hash(&self.build_hasher, elem);
        self.table.contains(hash, elem)
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    fn grow(&mut self) {
        #[cfg(feature = "logging")]
        let old_capacity = self.table.capacity();

        let build_hasher = &self.build_hasher;
        self.table.grow(|elem| common::hash(build_hasher, elem));

        #[cfg(feature = "logging")]
        log::trace!(
            "resized hash set table: {} -> {} buckets",
            old_capacity,
            self.table.capacity()
        );
    }
}

impl<T, S> Set<T> for HashSet<T, S>
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

#[cfg(test)]
mod tests {
    use super::HashSet;
    use crate::{common::test_utils::PassThroughBuildHasher, ResizePolicy};

    #[test]
    fn basic_single_thread() {
        let mut set = HashSet::new(8);

        assert!(set.is_empty());
        assert!(set.add("alice"));
        assert!(set.add("bob"));
        assert!(!set.add("alice"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(&"alice"));
        assert!(set.contains(&"bob"));
        assert!(!set.contains(&"cindy"));

        assert!(set.remove(&"alice"));
        assert!(!set.contains(&"alice"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_of_absent_element_is_a_noop() {
        let mut set = HashSet::new(4);
        set.add(7u64);

        assert!(!set.remove(&8));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn add_then_remove_restores_prior_state() {
        let mut set = HashSet::new(4);
        for n in 0u64..3 {
            set.add(n);
        }

        assert!(set.add(42));
        assert!(set.remove(&42));
        assert_eq!(set.len(), 3);
        assert!(!set.contains(&42));
    }

    #[test]
    fn five_inserts_into_four_buckets_trigger_one_resize() {
        // The fifth insert makes buckets 0 and 1 crowded, which is more than
        // a quarter of the four buckets.
        let mut set = HashSet::builder(4)
            .resize_policy(ResizePolicy::new(4, 2))
            .build_with_hasher(PassThroughBuildHasher);

        for n in [0u64, 1, 2, 4] {
            assert!(set.add(n));
            assert_eq!(set.capacity(), 4);
        }
        assert!(set.add(5));

        assert_eq!(set.capacity(), 8);
        assert_eq!(set.len(), 5);
        for n in [0u64, 1, 2, 4, 5] {
            assert!(set.contains(&n));
        }
    }

    #[test]
    fn overloaded_bucket_triggers_resize() {
        // Elements all land in bucket 0 of a 4-bucket table; the fourth one
        // reaches the max threshold.
        let mut set = HashSet::builder(4)
            .resize_policy(ResizePolicy::new(4, 2))
            .build_with_hasher(PassThroughBuildHasher);

        for n in [0u64, 4, 8] {
            set.add(n);
            assert_eq!(set.capacity(), 4);
        }
        set.add(12);

        assert_eq!(set.capacity(), 8);
        assert_eq!(set.len(), 4);
        for n in [0u64, 4, 8, 12] {
            assert!(set.contains(&n));
        }
    }

    #[test]
    fn resize_is_transparent_to_contains() {
        let mut set = HashSet::builder(4)
            .resize_policy(ResizePolicy::new(4, 2))
            .build();

        for n in 0u64..512 {
            assert!(set.add(n));
        }

        assert!(set.capacity() > 4);
        assert_eq!(set.len(), 512);
        for n in 0u64..512 {
            assert!(set.contains(&n));
        }
    }
}
