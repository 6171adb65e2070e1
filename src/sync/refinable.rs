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
use parking_lot::{Mutex, RwLock};
use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    hint,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

/// The stripe array: replaced wholesale on every resize, so a lock is only
/// valid while the array it came from is still the current one.
type Stripes<T> = Arc<[CachePadded<Mutex<Vec<Bucket<T>>>>]>;

/// A thread-safe hash set whose lock array grows with its table.
///
/// Like [`StripedHashSet`][striped-struct], elements are guarded by stripe
/// locks; unlike it, a resize also doubles the number of stripes, so lock
/// granularity keeps tracking the bucket count instead of degrading as the
/// table grows.
///
/// The price is a more involved lock acquisition: because a concurrent
/// resize can swap the whole stripe array between the moment a thread picks
/// its stripe and the moment it acquires the lock, every acquisition is
/// re-validated against the current array and retried if it went stale.
///
/// # Approximate `len`
///
/// [`len`](Self::len) reads a relaxed atomic counter without taking any
/// lock. Under concurrent mutation the value is a best-effort approximation;
/// it is exact once the set is quiescent. Use
/// [`CoarseHashSet`][coarse-struct] if every read must be linearizable.
///
/// [striped-struct]: ./struct.StripedHashSet.html
/// [coarse-struct]: ./struct.CoarseHashSet.html
///
/// # Examples
///
/// ```rust
/// use lockset::sync::RefinableHashSet;
///
/// use std::thread;
///
/// let set = RefinableHashSet::new(4);
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
pub struct RefinableHashSet<T, S = RandomState> {
    inner: Arc<Inner<T, S>>,
}

impl<T, S> Clone for RefinableHashSet<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T, S> {
    stripes: RwLock<Stripes<T>>,
    // Raised for the whole duration of a resize. Acquisitions spin on it
    // before touching the stripe array; correctness does not depend on the
    // flag (the identity check below does that), it keeps late-coming
    // threads from piling onto locks that are about to go stale.
    resizing: AtomicBool,
    len: AtomicUsize,
    policy: ResizePolicy,
    build_hasher: S,
}

impl<T> RefinableHashSet<T, RandomState>
where
    T: Hash + Eq,
{
    /// Constructs a new `RefinableHashSet` with `initial_capacity` buckets
    /// and as many stripe locks.
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
    /// `RefinableHashSet` with a custom resize policy or hasher.
    ///
    /// [builder-struct]: ./struct.HashSetBuilder.html
    pub fn builder(initial_capacity: usize) -> HashSetBuilder<RefinableHashSet<T, RandomState>> {
        HashSetBuilder::new(initial_capacity)
    }
}

impl<T, S> RefinableHashSet<T, S>
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
        let stripes: Vec<_> = (0..initial_capacity)
            .map(|_| CachePadded::new(Mutex::new(vec![Vec::new()])))
            .collect();
        Self {
            inner: Arc::new(Inner {
                stripes: RwLock::new(stripes.into()),
                resizing: AtomicBool::new(false),
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

        let resize_hint = inner.with_stripe(hash, |sub, stripe_count| {
            let capacity = sub.len() * stripe_count;
            let local = local_bucket_index(hash, stripe_count, capacity);
            if bucket_contains(&sub[local], &elem) {
                return None;
            }

            sub[local].push(elem);
            inner.len.fetch_add(1, Ordering::Relaxed);

            // A per-stripe sample of the resize policy; the real decision is
            // re-taken on the whole table once every stripe lock is held.
            Some(inner.policy.should_resize(sub.iter().map(Vec::len)))
        });

        match resize_hint {
            None => false,
            Some(resize_hint) => {
                if resize_hint {
                    inner.resize();
                }
                true
            }
        }
    }

    /// Removes `elem` from the set. Returns `true` if it was present, and
    /// `false` otherwise. Removals never shrink the table or the lock array.
    pub fn remove(&self, elem: &T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, elem);

        inner.with_stripe(hash, |sub, stripe_count| {
            let capacity = sub.len() * stripe_count;
            let local = local_bucket_index(hash, stripe_count, capacity);
            if bucket_remove(&mut sub[local], elem) {
                inner.len.fetch_sub(1, Ordering::Relaxed);
                true
            } else {
                false
            }
        })
    }

    /// Returns `true` if `elem` is present in the set.
    pub fn contains(&self, elem: &T) -> bool {
        let inner = &*self.inner;
        let hash = common::hash(&inner.build_hasher, elem);

        inner.with_stripe(hash, |sub, stripe_count| {
            let capacity = sub.len() * stripe_count;
            bucket_contains(&sub[local_bucket_index(hash, stripe_count, capacity)], elem)
        })
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
        let inner = &*self.inner;
        inner.with_stripe(0, |sub, stripe_count| sub.len() * stripe_count)
    }

    /// Returns the current number of stripe locks.
    pub fn stripe_count(&self) -> usize {
        self.inner.stripes.read().len()
    }
}

impl<T, S> Inner<T, S>
where
    T: Hash + Eq,
    S: BuildHasher,
{
    /// Runs `f` on the sub-table of the stripe covering `hash`, holding a
    /// validated stripe lock.
    ///
    /// This is the optimistic acquisition protocol: pick a lock from the
    /// current stripe array, acquire it, then confirm the array has not been
    /// swapped in the meantime. A lock from a superseded array guards
    /// nothing, so the acquisition is retried from the start.
    fn with_stripe<R>(&self, hash: u64, f: impl FnOnce(&mut Vec<Bucket<T>>, usize) -> R) -> R {
        loop {
            // Keep off the locks while a resize is installing a new array.
            while self.resizing.load(Ordering::Acquire) {
                hint::spin_loop();
            }

            let stripes = Arc::clone(&self.stripes.read());
            let mut sub = stripes[stripe_index(hash, stripes.len())].lock();
            if Arc::ptr_eq(&stripes, &self.stripes.read()) {
                // Still the current array. A resize cannot swap it before we
                // release `sub`, because it must first acquire every lock in
                // the array `sub` belongs to.
                return f(&mut sub, stripes.len());
            }
        }
    }

    /// Doubles the table capacity and the stripe count if the resize policy
    /// still calls for it.
    fn resize(&self) {
        self.resizing.store(true, Ordering::Release);

        let stripes = Arc::clone(&self.stripes.read());
        // Every lock of the current array, in increasing index order, to
        // drain the operations that validated against it.
        let mut guards: Vec<_> = stripes.iter().map(|stripe| stripe.lock()).collect();

        // A racing resize may have swapped the array while we were blocked
        // on its locks; in that case the table has just grown and this
        // attempt is abandoned.
        if !Arc::ptr_eq(&stripes, &self.stripes.read()) {
            drop(guards);
            self.resizing.store(false, Ordering::Release);
            return;
        }

        let stripe_count = stripes.len();
        let capacity = guards[0].len() * stripe_count;
        let should_resize = self
            .policy
            .should_resize(guards.iter().flat_map(|sub| sub.iter().map(Vec::len)));
        if !should_resize {
            drop(guards);
            self.resizing.store(false, Ordering::Release);
            return;
        }

        // Both the table and the lock array double, keeping one lock per
        // `capacity / stripe_count` buckets.
        let new_capacity = capacity * 2;
        let new_stripe_count = stripe_count * 2;

        let mut elements = Vec::with_capacity(self.len.load(Ordering::Relaxed));
        for sub in guards.iter_mut() {
            for bucket in sub.iter_mut() {
                elements.append(bucket);
            }
        }

        let build_hasher = &self.build_hasher;
        let new_stripes: Stripes<T> =
            distribute(elements, new_stripe_count, new_capacity, |elem| {
                common::hash(build_hasher, elem)
            })
            .into_iter()
            .map(|sub| CachePadded::new(Mutex::new(sub)))
            .collect::<Vec<_>>()
            .into();

        *self.stripes.write() = new_stripes;

        // The old locks are released only after the new array is installed,
        // so every waiter re-validates against the new array and retries.
        drop(guards);
        self.resizing.store(false, Ordering::Release);

        #[cfg(feature = "logging")]
        log::trace!(
            "resized refinable hash set table: {} -> {} buckets ({} -> {} stripes)",
            capacity,
            new_capacity,
            stripe_count,
            new_stripe_count
        );
    }
}

impl<T, S> Set<T> for RefinableHashSet<T, S>
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
