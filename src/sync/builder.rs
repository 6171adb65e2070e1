use super::{CoarseHashSet, RefinableHashSet, StripedHashSet};
use crate::policy::ResizePolicy;

use std::{
    collections::hash_map::RandomState,
    hash::{BuildHasher, Hash},
    marker::PhantomData,
};

/// Builds a [`CoarseHashSet`][coarse-struct], [`StripedHashSet`][striped-struct]
/// or [`RefinableHashSet`][refinable-struct] with the given configuration.
///
/// [coarse-struct]: ./struct.CoarseHashSet.html
/// [striped-struct]: ./struct.StripedHashSet.html
/// [refinable-struct]: ./struct.RefinableHashSet.html
///
/// # Examples
///
/// ```rust
/// use lockset::{sync::RefinableHashSet, ResizePolicy};
///
/// let set = RefinableHashSet::builder(4)
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

impl<C> HashSetBuilder<C> {
    pub(crate) fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            policy: ResizePolicy::default(),
            set_type: PhantomData,
        }
    }

    /// Sets the resize policy of the set.
    pub fn resize_policy(self, policy: ResizePolicy) -> Self {
        Self { policy, ..self }
    }
}

impl<T> HashSetBuilder<CoarseHashSet<T, RandomState>>
where
    T: Hash + Eq,
{
    /// Builds a `CoarseHashSet<T>`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build(self) -> CoarseHashSet<T, RandomState> {
        CoarseHashSet::with_everything(self.initial_capacity, self.policy, RandomState::default())
    }

    /// Builds a `CoarseHashSet<T, S>` with the given `hasher`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build_with_hasher<S>(self, hasher: S) -> CoarseHashSet<T, S>
    where
        S: BuildHasher,
    {
        CoarseHashSet::with_everything(self.initial_capacity, self.policy, hasher)
    }
}

impl<T> HashSetBuilder<StripedHashSet<T, RandomState>>
where
    T: Hash + Eq,
{
    /// Builds a `StripedHashSet<T>`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build(self) -> StripedHashSet<T, RandomState> {
        StripedHashSet::with_everything(self.initial_capacity, self.policy, RandomState::default())
    }

    /// Builds a `StripedHashSet<T, S>` with the given `hasher`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build_with_hasher<S>(self, hasher: S) -> StripedHashSet<T, S>
    where
        S: BuildHasher,
    {
        StripedHashSet::with_everything(self.initial_capacity, self.policy, hasher)
    }
}

impl<T> HashSetBuilder<RefinableHashSet<T, RandomState>>
where
    T: Hash + Eq,
{
    /// Builds a `RefinableHashSet<T>`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build(self) -> RefinableHashSet<T, RandomState> {
        RefinableHashSet::with_everything(self.initial_capacity, self.policy, RandomState::default())
    }

    /// Builds a `RefinableHashSet<T, S>` with the given `hasher`.
    ///
    /// # Panics
    ///
    /// Panics if the configured initial capacity is zero.
    pub fn build_with_hasher<S>(self, hasher: S) -> RefinableHashSet<T, S>
    where
        S: BuildHasher,
    {
        RefinableHashSet::with_everything(self.initial_capacity, self.policy, hasher)
    }
}
