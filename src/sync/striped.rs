use super::{distribute, local_bucket_index, stripe_index, HashSetBuilder};
use crate::{
    common::{
        self,
        table::{bucket_contains, bucket_remove, Bucket},
    },
    policy::ResizePolicy,
    Set,
};

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// A thread-safe hash set with a fixed array of stripe locks.
///
/// The set starts with one lock per bucket and never changes the number of
/// locks, while the table keeps doubling; each lock therefore guards a
/// growing group of buckets. Operations on elements under different stripes
/// proceed in parallel, except while a resize holds every stripe lock at
/// once.
///
/// # Approximate `len`
///
/// [`len`](Self::len) reads a relaxed atomic counter without taking any
/// lock. Under concurrent mutation the value is a best-effort approximation;
/// it is exact once the set is quiescent. Use
/// [`CoarseHashSet`][coarse-struct] if every read must be linearizable.
///
/// [coarse-struct]: ./struct.CoarseHashSet.html
///
/// # Examples
///
/// ```rust
/// use lockset::sync::StripedHashSet;
///
/// use std::thread;
///
/// let set = StripedHashSet::new(16);
///
/// let threads: Vec<_> = (0..4)
///     .map(|i| {
///         // Clones share the same underlying set.
///         let my_set = set.clone();
///         thread::spawn(move || {
///             for key in (i * 100)..((i + 1) * 100) {
///                 my_set.add(key);
///             }
///         })
///     })
///     .collect();
///
/// threads.into_iter().for_each(|t| t.join().expect("Failed"));
///
/// assert_eq!(set.len(), 400);
/// ```
pub struct StripedHashSet<T, S = RandomState> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for StripedHashSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T, S> {
    // Stripe `s` owns every bucket `b` with `b % stripes.len() == s`; see
    // the layout notes in the module root. The boxed slice never changes
    // length, only the sub-tables inside the mutexes do.
    stripes: Box<[CachePadded<Mutex<Vec<Bucket<T>>>>]>,
    len: AtomicUsize,
    policy: ResizePolicy,
    build_hasher: S,
}

impl<T> StripedHashSet<T, RandomState>
where
    T: Hash + Eq,
{
    /// Constructs a new `StripedHashSet` with `initial_capacity` buckets and
    /// as many stripe locks.
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
    /// `StripedHashSet` with a custom resize policy or hasher.
    ///
    /// [builder-struct]: ./struct.HashSetBuilder.html
    pub fn builder(initial_capacity: usize) -> HashSetBuilder<StripedHashSet<T, RandomState>> {
        HashSetBuilder::new(initial_capacity)
    }
}

impl<T, S> StripedHashSet<T, S>
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
        let stripes = (0..initial_capacity)
            .map(|_| CachePadded::new(Mutex::new(vec![Vec::new()])))
            .collect();
        Self {
            inner: Arc::new(Inner {
                stripes,
                len: AtomicUsize::new(0),
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
        let stripe_count = inner.stripes.len();

        let mut sub = inner.stripes[stripe_index(hash, stripe_count)].lock();
        // The capacity cannot change while any stripe lock is held, because
        // a resize needs all of them.
        let capacity = sub.len() * stripe_count;
        let local = local_bucket_index(hash, stripe_count, capacity);
        if bucket_contains(&sub[local], &elem) {
            return false;
        }

        sub[local].push(elem);
        inner.len.fetch_add(1, Ordering::Relaxed);

        // A per-stripe sample of the resize policy; the real decision is
        // re-taken on the whole table once every stripe lock is held.
        let resize_hint = inner.policy.should_resize(sub.iter().map(Vec::len));
        drop(sub);

        if resize_hint {
            self.resize();
        }
        true
    }

    /// Removes `elem` from the set. Returns `true` if it was present, and
    /// `false` otherwise. Removals never shrink the table.
    pub fn remove(&self, elem: &T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, elem);
        let stripe_count = inner.stripes.len();

        let mut sub = inner.stripes[stripe_index(hash, stripe_count)].lock();
        let capacity = sub.len() * stripe_count;
        let local = local_bucket_index(hash, stripe_count, capacity);
        if bucket_remove(&mut sub[local], elem) {
            inner.len.fetch_sub(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Returns `true` if `elem` is present in the set.
    pub fn contains(&self, elem: &T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, elem);
        let stripe_count = inner.stripes.len();

        let sub = inner.stripes[stripe_index(hash, stripe_count)].lock();
        let capacity = sub.len() * stripe_count;
        bucket_contains(&sub[local_bucket_index(hash, stripe_count, capacity)], elem)
    }

    /// Returns the number of elements in the set.
    ///
    /// This is a relaxed, lock-free read; see the [type-level
    /// documentation](Self#approximate-len) for what that means under
    /// concurrent mutation.
    pub fn len(&self) -> usize {
        self.inner.len.load(Ordering::Relaxed)
    }

    /// Returns `true` if the set holds no elements, with the same caveat as
    /// [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.inner.stripes[0].lock().len() * self.inner.stripes.len()
    }

    /// Doubles the table capacity if the resize policy still calls for it.
    fn resize(&self) {
        let inner = &*self.inner;
        let stripe_count = inner.stripes.len();

        // Every stripe lock, in increasing index order. Two threads racing
        // to resize therefore queue up rather than deadlock, and the loser
        // sees the already-grown table when re-checking the policy below.
        let mut guards: Vec<_> = inner.stripes.iter().map(|stripe| stripe.lock()).collect();

        let capacity = guards[0].len() * stripe_count;
        let should_resize = inner
            .policy
            .should_resize(guards.iter().flat_map(|sub| sub.iter().map(Vec::len)));
        if !should_resize {
            return;
        }

        let new_capacity = capacity * 2;
        let mut elements = Vec::with_capacity(inner.len.load(Ordering::Relaxed));
        for sub in guards.iter_mut() {
            for bucket in sub.iter_mut() {
                elements.append(bucket);
            }
        }

        let build_hasher = &inner.build_hasher;
        let new_stripes = distribute(elements, stripe_count, new_capacity, |elem| {
            common::hash(build_hasher, elem)
        });
        for (guard, sub) in guards.iter_mut().zip(new_stripes) {
            **guard = sub;
        }

        #[cfg(feature = "logging")]
        log::trace!(
            "resized striped hash set table: {} -> {} buckets ({} stripes)",
            capacity,
            new_capacity,
            stripe_count
        );
    }
}

impl<T, S> Set<T> for StripedHashSet<T, S>
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
    use super::StripedHashSet;
    use crate::{common::test_utils::PassThroughBuildHasher, ResizePolicy};

    use std::thread;

    #[test]
    fn basic_single_thread() {
        let set = StripedHashSet::new(8);

        assert!(set.add("alice"));
        assert!(!set.add("alice"));
        assert!(set.add("bob"));
        assert!(set.contains(&"alice"));
        assert_eq!(set.len(), 2);

        assert!(set.remove(&"bob"));
        assert!(!set.remove(&"bob"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn stripe_count_stays_fixed_across_resizes() {
        let set = StripedHashSet::builder(4)
            .resize_policy(ResizePolicy::new(4, 2))
            .build_with_hasher(PassThroughBuildHasher);

        for n in 0u64..64 {
            assert!(set.add(n));
        }

        assert_eq!(set.inner.stripes.len(), 4);
        assert!(set.capacity() >= 32);
        assert_eq!(set.len(), 64);
        for n in 0u64..64 {
            assert!(set.contains(&n));
        }
    }

    #[test]
    fn resize_is_transparent_to_contains() {
        let set = StripedHashSet::builder(4)
            .resize_policy(ResizePolicy::new(4, 2))
            .build();

        for n in 0u64..512 {
            assert!(set.add(n));
        }

        assert!(set.capacity() > 4);
        for n in 0u64..512 {
            assert!(set.contains(&n));
        }
        assert_eq!(set.len(), 512);
    }

    #[test]
    fn concurrent_disjoint_inserts() {
        const NUM_THREADS: u64 = 8;
        const KEYS_PER_THREAD: u64 = 1_000;

        let set = StripedHashSet::builder(8)
            .resize_policy(ResizePolicy::new(8, 4))
            .build();

        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let my_set = set.clone();
                thread::spawn(move || {
                    for key in (i * KEYS_PER_THREAD)..((i + 1) * KEYS_PER_THREAD) {
                        assert!(my_set.add(key));
                    }
                })
            })
            .collect();

        threads.into_iter().for_each(|t| t.join().expect("Failed"));

        assert_eq!(set.len(), (NUM_THREADS * KEYS_PER_THREAD) as usize);
        for key in 0..(NUM_THREADS * KEYS_PER_THREAD) {
            assert!(set.contains(&key));
        }
    }

    #[test]
    fn concurrent_adds_and_removes() {
        const NUM_THREADS: u64 = 4;
        const KEYS_PER_THREAD: u64 = 500;

        let set = StripedHashSet::builder(4)
            .resize_policy(ResizePolicy::new(8, 4))
            .build();
        for key in 0..(NUM_THREADS * KEYS_PER_THREAD) {
            set.add(key);
        }

        // Each thread removes its own range and re-inserts half of it.
        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|i| {
                let my_set = set.clone();
                thread::spawn(move || {
                    for key in (i * KEYS_PER_THREAD)..((i + 1) * KEYS_PER_THREAD) {
                        assert!(my_set.remove(&key));
                        if key % 2 == 0 {
                            assert!(my_set.add(key));
                        }
                    }
                })
            })
            .collect();

        threads.into_iter().for_each(|t| t.join().expect("Failed"));

        assert_eq!(set.len(), (NUM_THREADS * KEYS_PER_THREAD / 2) as usize);
        for key in 0..(NUM_THREADS * KEYS_PER_THREAD) {
            assert_eq!(set.contains(&key), key % 2 == 0);
        }
    }

    #[test]
    fn concurrent_adds_of_the_same_range() {
        const NUM_THREADS: u64 = 8;
        const KEYS: u64 = 200;

        let set = StripedHashSet::builder(4)
            .resize_policy(ResizePolicy::new(8, 4))
            .build();

        // All threads insert the same keys; each key must be reported as
        // newly inserted exactly once across all threads.
        let threads: Vec<_> = (0..NUM_THREADS)
            .map(|_| {
                let my_set = set.clone();
                thread::spawn(move || (0..KEYS).filter(|key| my_set.add(*key)).count())
            })
            .collect();

        let inserted: usize = threads.into_iter().map(|t| t.join().expect("Failed")).sum();

        assert_eq!(inserted, KEYS as usize);
        assert_eq!(set.len(), KEYS as usize);
    }
}
