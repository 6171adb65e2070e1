//! The bucket model shared by every set variant.
//!
//! A table is an array of buckets; a bucket is an unordered run of distinct
//! elements. An element always lives in the bucket at `hash % capacity`.
//! Nothing in this module synchronizes: every caller is responsible for
//! establishing a safe window (a lock, or exclusive ownership) before
//! touching a bucket.

pub(crate) type Bucket<T> = Vec<T>;

/// Returns `true` if `bucket` holds an element equal to `elem`.
#[inline]
pub(crate) fn bucket_contains<T: Eq>(bucket: &[T], elem: &T) -> bool {
    bucket.iter().any(|e| e == elem)
}

/// Removes the element equal to `elem` from `bucket`, if present.
///
/// Bucket order is unspecified, so the cheaper swap removal is used.
pub(crate) fn bucket_remove<T: Eq>(bucket: &mut Bucket<T>, elem: &T) -> bool {
    match bucket.iter().position(|e| e == elem) {
        Some(index) => {
            bucket.swap_remove(index);
            true
        }
        None => false,
    }
}

/// A whole hash table: the storage behind the sequential and coarse-grained
/// sets. The striped sets partition their buckets across stripes instead and
/// use the bucket helpers above directly.
pub(crate) struct Table<T> {
    buckets: Box<[Bucket<T>]>,
}

impl<T: Eq> Table<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            buckets: (0..capacity).map(|_| Vec::new()).collect(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    pub(crate) fn contains(&self, hash: u64, elem: &T) -> bool {
        bucket_contains(&self.buckets[self.bucket_index(hash)], elem)
    }

    /// Appends `elem` to its bucket. The caller has already checked that it
    /// is absent.
    pub(crate) fn push(&mut self, hash: u64, elem: T) {
        let index = self.bucket_index(hash);
        self.buckets[index].push(elem);
    }

    pub(crate) fn remove(&mut self, hash: u64, elem: &T) -> bool {
        let index = self.bucket_index(hash);
        bucket_remove(&mut self.buckets[index], elem)
    }

    pub(crate) fn bucket_lens(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().map(Vec::len)
    }

    /// Replaces the table with one of double the capacity, rehashing every
    /// element under the new capacity.
    pub(crate) fn grow(&mut self, mut hash: impl FnMut(&T) -> u64) {
        let mut new_table = Self::with_capacity(self.buckets.len() * 2);
        for bucket in self.buckets.iter_mut() {
            for elem in bucket.drain(..) {
                let index = new_table.bucket_index(hash(&elem));
                new_table.buckets[index].push(elem);
            }
        }
        *self = new_table;
    }
}

#[cfg(test)]
mod tests {
    use super::{bucket_contains, bucket_remove, Bucket, Table};

    #[test]
    fn bucket_scan() {
        let mut bucket: Bucket<u32> = vec![3, 1, 4, 1];
        assert!(bucket_contains(&bucket, &4));
        assert!(!bucket_contains(&bucket, &2));

        assert!(bucket_remove(&mut bucket, &3));
        assert!(!bucket_contains(&bucket, &3));
        assert_eq!(bucket.len(), 3);

        assert!(!bucket_remove(&mut bucket, &9));
        assert_eq!(bucket.len(), 3);
    }

    #[test]
    fn element_lives_in_its_hash_bucket() {
        let mut table = Table::with_capacity(4);
        // The table takes precomputed hashes, so tests can address buckets
        // directly: hash n puts the element in bucket n % 4.
        table.push(6, "six");
        table.push(2, "two");

        assert!(table.contains(6, &"six"));
        assert!(table.contains(2, &"two"));
        assert_eq!(table.bucket_lens().nth(2), Some(2));

        assert!(table.remove(6, &"six"));
        assert!(!table.contains(6, &"six"));
        assert!(!table.remove(6, &"six"));
    }

    #[test]
    fn grow_rehashes_every_element() {
        let mut table = Table::with_capacity(2);
        for n in 0u64..10 {
            table.push(n, n);
        }
        assert_eq!(table.bucket_lens().max(), Some(5));

        table.grow(|n| *n);

        assert_eq!(table.capacity(), 4);
        assert_eq!(table.bucket_lens().sum::<usize>(), 10);
        for n in 0u64..10 {
            // Same hash, new modulus.
            assert!(table.contains(n, &n));
        }
        // Elements moved to their new buckets rather than staying put.
        assert_eq!(table.bucket_lens().collect::<Vec<_>>(), vec![3, 3, 2, 2]);
    }
}
