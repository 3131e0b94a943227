//! Hashing helpers shared between the attribute dictionaries and the
//! `__hash__` special method boundary.

pub type PyHash = i64;

/// CPython reserves `-1` as the "hash computation raised an exception"
/// sentinel; a real hash that lands on `-1` is remapped to `-2` so the two
/// cases stay distinguishable.
pub const fn fix_sentinel(hash: PyHash) -> PyHash {
    if hash == -1 { -2 } else { hash }
}

pub type IdentityHashBuilder = ahash::RandomState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_only_remaps_minus_one() {
        assert_eq!(fix_sentinel(-1), -2);
        assert_eq!(fix_sentinel(-2), -2);
        assert_eq!(fix_sentinel(0), 0);
        assert_eq!(fix_sentinel(42), 42);
    }
}
