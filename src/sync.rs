//! Thread-safe, blocking hash set implementations.
//!
//! All three sets here are cheap to [`clone`](Clone::clone); clones are
//! handles onto the same underlying set. They differ in lock granularity:
//! [`CoarseHashSet`] serializes everything behind one mutex,
//! [`StripedHashSet`] spreads buckets over a fixed array of locks, and
//! [`RefinableHashSet`] grows its lock array together with its table.

pub(crate) mod builder;
mod coarse;
mod refinable;
mod striped;

pub use builder::HashSetBuilder;
pub use coarse::CoarseHashSet;
pub use refinable::RefinableHashSet;
pub use striped::StripedHashSet;

use crate::common::table::Bucket;

// Stripe layout, shared by the striped and refinable sets.
//
// Each stripe lock owns the sub-table of buckets `b` with
// `b % stripe_count == s`, storing bucket `b` at local index
// `b / stripe_count`. The capacity is always a multiple of the stripe count
// (the stripe count starts out equal to the initial capacity, and both only
// ever double), so the stripe of an element's bucket is just
// `hash % stripe_count` and can be selected without knowing the capacity.

#[inline]
pub(crate) fn stripe_index(hash: u64, stripe_count: usize) -> usize {
    (hash % stripe_count as u64) as usize
}

#[inline]
pub(crate) fn local_bucket_index(hash: u64, stripe_count: usize, capacity: usize) -> usize {
    ((hash % capacity as u64) as usize) / stripe_count
}

/// Distributes `elements` into fresh per-stripe sub-tables for a table of
/// `capacity` buckets over `stripe_count` stripes.
pub(crate) fn distribute<T: Eq>(
    elements: Vec<T>,
    stripe_count: usize,
    capacity: usize,
    mut hash: impl FnMut(&T) -> u64,
) -> Vec<Vec<Bucket<T>>> {
    let per_stripe = capacity / stripe_count;
    let mut stripes: Vec<Vec<Bucket<T>>> = (0..stripe_count)
        .map(|_| (0..per_stripe).map(|_| Vec::new()).collect())
        .collect();
    for elem in elements {
        let bucket = (hash(&elem) % capacity as u64) as usize;
        stripes[bucket % stripe_count][bucket / stripe_count].push(elem);
    }
    stripes
}

#[cfg(test)]
mod tests {
    use super::{distribute, local_bucket_index, stripe_index};

    #[test]
    fn stripe_layout_math() {
        // 8 buckets over 4 stripes: bucket 6 belongs to stripe 2 and is the
        // second bucket that stripe owns.
        assert_eq!(stripe_index(6, 4), 2);
        assert_eq!(local_bucket_index(6, 4, 8), 1);

        // Same element once the table has doubled again.
        assert_eq!(stripe_index(6, 4), stripe_index(6 + 16, 4));
        assert_eq!(local_bucket_index(6, 4, 16), 1);
        assert_eq!(local_bucket_index(14, 4, 16), 3);
    }

    #[test]
    fn distribute_places_every_element() {
        let stripes = distribute((0u64..32).collect(), 4, 16, |n| *n);

        assert_eq!(stripes.len(), 4);
        for (s, sub) in stripes.iter().enumerate() {
            assert_eq!(sub.len(), 4);
            for (local, bucket) in sub.iter().enumerate() {
                let global = local * 4 + s;
                assert_eq!(bucket, &vec![global as u64, (global + 16) as u64]);
            }
        }
    }
}
