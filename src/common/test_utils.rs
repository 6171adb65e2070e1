use std::hash::{BuildHasher, Hasher};

/// A build hasher whose hash is the value of the last integer written.
///
/// Tests use it to pin elements to known buckets: with a table of capacity
/// `c`, element `n` lands in bucket `n % c`.
#[derive(Clone, Default)]
pub(crate) struct PassThroughBuildHasher;

impl BuildHasher for PassThroughBuildHasher {
    type Hasher = PassThroughHasher;

    fn build_hasher(&self) -> Self::Hasher {
        PassThroughHasher(0)
    }
}

pub(crate) struct PassThroughHasher(u64);

impl Hasher for PassThroughHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut buf = [0u8; 8];
        for (dst, src) in buf.iter_mut().zip(bytes) {
            *dst = *src;
        }
        self.0 = u64::from_le_bytes(buf);
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    fn write_usize(&mut self, n: usize) {
        self.0 = n as u64;
    }
}
