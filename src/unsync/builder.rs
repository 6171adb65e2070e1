use super::HashSet;
use crate::policy::ResizePolicy;

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
};

/// Builds an [`unsync::HashSet`][set-struct] with the given configuration.
///
/// [set-struct]: ./struct.HashSet.html
///
/// # Examples
///
/// ```rust
/// use lockset::{unsync::HashSet, ResizePolicy};
///
/// let mut set = HashSet::builder(4)
///     // Grow once a bucket holds 8 elements, or more than a quarter of
///     // the buckets hold 4.
///     .resize_policy(ResizePolicy::new(8, 4))
///     .build();
///
/// assert!(set.add("a"));
/// ```
pub struct HashSetBuilder<C> {
    initial_capacity: usize,
    policy: ResizePolicy,
    set_type: PhantomData<C>,
}

impl<T> HashSetBuilder<HashSet<T, RandomState>>
where
    T: Hash + Eq,
{
    /// Constructs a new `HashSetBuilder` for a set starting with
    /// `initial_capacity` buckets.
    pub fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            policy: ResizePolicy::default(),
            set_type: PhantomData,
        }
    }

    /// Builds a `HashSet<T>`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build(self) -> HashSet<T, RandomState> {
        HashSet::with_everything(self.initial_capacity, self.policy, RandomState::default())
    }

    /// Builds a `HashSet<T, S>` with the given `hasher`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build_with_hasher<S>(self, hasher: S) -> HashSet<T, S>
    where
        S: BuildHasher,
    {
        HashSet::with_everything(self.initial_capacity, self.policy, hasher)
    }
}

impl<C> HashSetBuilder<C> {
    /// Sets the resize policy of the set.
    pub fn resize_policy(self, policy: ResizePolicy) -> Self {
        Self { policy, ..self }
    }
}
