//! Generic rehash: rebuild a backend at a new bucket count by enumerating
//! the old instance and reinserting every live pair.
//!
//! Used by backends without an in-place redistribution path. It costs a
//! full second copy of the contents while both instances are alive.
//! When to rehash is decided by callers (see `Dictionary`), never here.

use crate::backend::Backend;
use crate::enumerator::{Enumerator, EnumeratorKind};
use crate::error::TableError;
use crate::policy::KeyPolicy;

/// Build a new instance of `B` with `bucket_count` buckets holding the
/// same key/value mapping as `old`. Reserved slots without a value stay
/// reserved without a value.
pub fn rebuild<B: Backend>(
    old: &B,
    policy: &KeyPolicy,
    bucket_count: usize,
) -> Result<B, TableError> {
    let mut fresh = B::create(policy.key_size(), policy.value_size(), bucket_count)?;

    let mut keys = Enumerator::new(old, EnumeratorKind::Key);
    let mut values = Enumerator::new(old, EnumeratorKind::Value);
    let mut key = keys.current();
    while let Some(k) = key {
        let initialized = keys.slot().is_some_and(|slot| old.is_initialized(slot));
        match values.current() {
            Some(v) if initialized => fresh.set_value(policy, k, v)?,
            _ => {
                fresh.reserve_slot(policy, k)?;
            }
        }
        key = keys.move_next();
        values.move_next();
    }

    debug_assert_eq!(fresh.count(), old.count());
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fully_separated::FullySeparated;
    use crate::interleaved::Interleaved;
    use crate::policy::{KeyComparator, KeyHasher};

    fn k(n: u32) -> [u8; 4] {
        n.to_le_bytes()
    }

    fn check_rebuild<B: Backend>() {
        let p = KeyPolicy::new(4, 4, KeyHasher::Structural, KeyComparator::Bytewise);
        let mut old = B::create(4, 4, 2).unwrap();
        for n in 0..20 {
            old.set_value(&p, &k(n), &k(n + 1)).unwrap();
        }
        for n in (0..20).step_by(3) {
            old.remove_value(&p, &k(n));
        }
        old.reserve_slot(&p, &k(99)).unwrap();

        let fresh: B = rebuild(&old, &p, 13).unwrap();
        assert_eq!(fresh.bucket_count(), 13);
        assert_eq!(fresh.count(), old.count());
        for n in 0..20 {
            assert_eq!(fresh.get_value(&p, &k(n)), old.get_value(&p, &k(n)));
        }
        let reserved = fresh.find_slot(&p, &k(99)).unwrap();
        assert!(!fresh.is_initialized(reserved));
    }

    #[test]
    fn rebuild_preserves_mapping() {
        check_rebuild::<Interleaved>();
        check_rebuild::<FullySeparated>();
    }

    #[test]
    fn rebuild_rejects_zero_buckets() {
        let p = KeyPolicy::new(4, 4, KeyHasher::Structural, KeyComparator::Bytewise);
        let old = Interleaved::create(4, 4, 2).unwrap();
        let err = rebuild::<Interleaved>(&old, &p, 0).unwrap_err();
        assert_eq!(err, TableError::InvalidBucketCount(0));
    }
}
