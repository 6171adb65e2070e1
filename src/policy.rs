//! The policy deciding when a set's hash table must grow.

const DEFAULT_MAX_BUCKET_LEN: usize = 100;
const DEFAULT_CROWDED_BUCKET_LEN: usize = 50;

/// A pure predicate over a snapshot of bucket lengths, evaluated after a
/// successful insert.
///
/// The policy fires when either
///
/// - at least one bucket has reached `max_bucket_len`, or
/// - more than a quarter of all buckets have reached `crowded_bucket_len`.
///
/// When it fires, the owning set doubles its table capacity and rehashes
/// every element. The snapshot must be consistent: the caller evaluates the
/// policy while holding whatever locks protect the buckets in question.
///
/// The defaults are 100 and 50. Neither threshold is derived from the other,
/// so a crowded-bucket threshold above the max-bucket threshold is accepted;
/// it simply disables the second condition in practice.
///
/// # Examples
///
/// ```rust
/// use lockset::ResizePolicy;
///
/// let policy = ResizePolicy::new(4, 2);
///
/// // One bucket hit the max threshold.
/// assert!(policy.should_resize([0, 4, 0, 0]));
///
/// // Two of four buckets are crowded.
/// assert!(policy.should_resize([2, 0, 3, 0]));
///
/// // One crowded bucket out of four is within bounds.
/// assert!(!policy.should_resize([2, 1, 0, 1]));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizePolicy {
    max_bucket_len: usize,
    crowded_bucket_len: usize,
}

impl ResizePolicy {
    /// Creates a policy with the given thresholds.
    ///
    /// # Panics
    ///
    /// Panics if either threshold is zero. A zero crowded-bucket threshold
    /// would count every bucket, including empty ones, as crowded and grow
    /// the table on every insert.
    pub fn new(max_bucket_len: usize, crowded_bucket_len: usize) -> Self {
        assert!(max_bucket_len > 0, "max_bucket_len must not be zero");
        assert!(crowded_bucket_len > 0, "crowded_bucket_len must not be zero");
        Self {
            max_bucket_len,
            crowded_bucket_len,
        }
    }

    /// The bucket length at which a single bucket forces a resize.
    pub fn max_bucket_len(&self) -> usize {
        self.max_bucket_len
    }

    /// The bucket length at which a bucket counts as crowded.
    pub fn crowded_bucket_len(&self) -> usize {
        self.crowded_bucket_len
    }

    /// Decides whether a table with the given bucket lengths must grow.
    pub fn should_resize<I>(&self, bucket_lens: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        let mut buckets = 0usize;
        let mut crowded = 0usize;
        for len in bucket_lens {
            if len >= self.max_bucket_len {
                return true;
            }
            buckets += 1;
            if len >= self.crowded_bucket_len {
                crowded += 1;
            }
        }
        crowded > buckets / 4
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUCKET_LEN, DEFAULT_CROWDED_BUCKET_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::ResizePolicy;

    #[test]
    fn default_thresholds() {
        let policy = ResizePolicy::default();
        assert_eq!(policy.max_bucket_len(), 100);
        assert_eq!(policy.crowded_bucket_len(), 50);
    }

    #[test]
    fn empty_and_light_tables_do_not_fire() {
        let policy = ResizePolicy::default();
        assert!(!policy.should_resize([]));
        assert!(!policy.should_resize([0, 0, 0, 0]));
        assert!(!policy.should_resize(vec![49; 1024]));
    }

    #[test]
    fn one_overloaded_bucket_fires() {
        let policy = ResizePolicy::default();
        assert!(policy.should_resize([0, 0, 100, 0]));
        // Even when it is the only bucket over the smaller threshold.
        assert!(policy.should_resize(vec![0; 1023].into_iter().chain([250])));
    }

    #[test]
    fn crowded_quarter_fires_strictly_above() {
        let policy = ResizePolicy::new(100, 50);
        // 8 buckets: quarter is 2, so 2 crowded buckets are tolerated.
        assert!(!policy.should_resize([50, 99, 0, 0, 0, 0, 0, 0]));
        assert!(policy.should_resize([50, 99, 50, 0, 0, 0, 0, 0]));
    }

    #[test]
    #[should_panic(expected = "crowded_bucket_len must not be zero")]
    fn zero_threshold_is_rejected() {
        let _ = ResizePolicy::new(100, 0);
    }
}

// Verify that some properties hold such as no panic occurs on any possible inputs.
#[cfg(kani)]
mod kani {
    use super::ResizePolicy;

    #[kani::proof]
    fn verify_should_resize() {
        let max_bucket_len: usize = kani::any();
        let crowded_bucket_len: usize = kani::any();
        kani::assume(max_bucket_len > 0);
        kani::assume(crowded_bucket_len > 0);
        let policy = ResizePolicy::new(max_bucket_len, crowded_bucket_len);

        // Check for arbitrary lengths over a small table.
        let lens: [usize; 4] = kani::any();
        let fired = policy.should_resize(lens);
        if lens.iter().any(|len| *len >= max_bucket_len) {
            assert!(fired);
        }
    }
}
