use std::hash::{BuildHasher, Hash, Hasher};

pub(crate) mod table;

#[cfg(test)]
pub(crate) mod test_utils;

#[inline]
pub(crate) fn hash<T, S>(build_hasher: &S, elem: &T) -> u64
where
    T: Hash + ?Sized,
    S: BuildHasher,
{
    let mut hasher = build_hasher.build_hasher();
    elem.hash(&mut hasher);
    hasher.finish()
}
