//! Fully-separated layout: per bucket, three parallel arrays of hashes,
//! keys and values.
//!
//! Enumerating only keys or only values walks one dense array, which
//! suits enumeration-heavy workloads.

use crate::array::ElementArray;
use crate::chained::{BucketStore, Chained};
use crate::entry::SlotIndex;
use crate::error::TableError;
use crate::slot_hash::SlotHash;

/// Backend keeping hashes, keys and values in separate arrays.
pub type FullySeparated = Chained<FullySeparatedStore>;

#[derive(Debug)]
pub struct FullySeparatedStore {
    key_size: usize,
    value_size: usize,
    hashes: Vec<Option<Vec<SlotHash>>>,
    keys: Vec<Option<ElementArray>>,
    values: Vec<Option<ElementArray>>,
}

fn bucket_array<T>(bucket_count: usize) -> Result<Vec<Option<T>>, TableError> {
    let mut v = Vec::new();
    v.try_reserve_exact(bucket_count)?;
    v.resize_with(bucket_count, || None);
    Ok(v)
}

fn element(chains: &[Option<ElementArray>], slot: SlotIndex) -> &[u8] {
    chains[slot.bucket]
        .as_ref()
        .and_then(|c| c.element_at(slot.item))
        .expect("slot in bounds")
}

fn element_mut(chains: &mut [Option<ElementArray>], slot: SlotIndex) -> &mut [u8] {
    chains[slot.bucket]
        .as_mut()
        .and_then(|c| c.element_at_mut(slot.item))
        .expect("slot in bounds")
}

fn chain_for(
    chains: &mut [Option<ElementArray>],
    bucket: usize,
    element_size: usize,
) -> Result<&mut ElementArray, TableError> {
    Ok(match &mut chains[bucket] {
        Some(chain) => chain,
        empty => empty.insert(ElementArray::new(element_size, 1)?),
    })
}

impl BucketStore for FullySeparatedStore {
    fn with_buckets(
        key_size: usize,
        value_size: usize,
        bucket_count: usize,
    ) -> Result<Self, TableError> {
        Ok(Self {
            key_size,
            value_size,
            hashes: bucket_array(bucket_count)?,
            keys: bucket_array(bucket_count)?,
            values: bucket_array(bucket_count)?,
        })
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.hashes.len()
    }

    #[inline]
    fn bucket_len(&self, bucket: usize) -> usize {
        self.hashes[bucket].as_ref().map_or(0, Vec::len)
    }

    #[inline]
    fn hash_at(&self, slot: SlotIndex) -> SlotHash {
        self.hashes[slot.bucket].as_ref().expect("slot in bounds")[slot.item]
    }

    fn set_hash_at(&mut self, slot: SlotIndex, hash: SlotHash) {
        self.hashes[slot.bucket].as_mut().expect("slot in bounds")[slot.item] = hash;
    }

    fn key_at(&self, slot: SlotIndex) -> &[u8] {
        element(&self.keys, slot)
    }

    fn value_at(&self, slot: SlotIndex) -> &[u8] {
        element(&self.values, slot)
    }

    fn write_value(&mut self, slot: SlotIndex, value: &[u8]) {
        element_mut(&mut self.values, slot).copy_from_slice(value);
    }

    fn overwrite(&mut self, slot: SlotIndex, hash: SlotHash, key: &[u8]) {
        self.set_hash_at(slot, hash);
        element_mut(&mut self.keys, slot).copy_from_slice(key);
        element_mut(&mut self.values, slot).fill(0);
    }

    fn append(&mut self, bucket: usize, hash: SlotHash, key: &[u8]) -> Result<usize, TableError> {
        let hashes = self.hashes[bucket].get_or_insert_with(Vec::new);
        hashes.try_reserve(1)?;
        let keys = chain_for(&mut self.keys, bucket, self.key_size)?;
        keys.reserve(1)?;
        let values = chain_for(&mut self.values, bucket, self.value_size)?;
        values.reserve(1)?;

        // All three arrays have room now; nothing below allocates.
        let item = keys.append(Some(key))?;
        values.append(None)?;
        hashes.push(hash);
        debug_assert!(keys.count() == values.count() && values.count() == hashes.len());
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::policy::{KeyComparator, KeyHasher, KeyPolicy};

    fn k(n: u32) -> [u8; 4] {
        n.to_le_bytes()
    }

    /// Invariant: the direct `values` walk skips tombstones and matches the
    /// enumeration order of `keys`.
    #[test]
    fn keys_and_values_walk_in_the_same_order() {
        let p = KeyPolicy::new(4, 4, KeyHasher::Structural, KeyComparator::Bytewise);
        let mut b = FullySeparated::create(4, 4, 3).unwrap();
        for n in 0..9 {
            b.set_value(&p, &k(n), &k(n + 100)).unwrap();
        }
        b.remove_value(&p, &k(4));
        let keys = b.keys();
        let values = b.values();
        assert_eq!(keys.len(), 8);
        for (key, value) in keys.iter().zip(values.iter()) {
            let n = u32::from_le_bytes((*key).try_into().unwrap());
            assert_eq!(*value, &k(n + 100)[..]);
        }
        assert!(!keys.contains(&&k(4)[..]));
    }

    fn assert_in_step(store: &FullySeparatedStore) {
        for bucket in 0..store.bucket_count() {
            let h = store.hashes[bucket].as_ref().map_or(0, Vec::len);
            let k = store.keys[bucket].as_ref().map_or(0, ElementArray::count);
            let v = store.values[bucket].as_ref().map_or(0, ElementArray::count);
            assert_eq!((h, k), (v, v), "bucket {} out of step", bucket);
        }
    }

    /// Invariant: hash, key and value arrays of a bucket always have the
    /// same length, across appends and tombstone reuse.
    #[test]
    fn parallel_arrays_stay_in_step() {
        let p = KeyPolicy::new(4, 4, KeyHasher::Structural, KeyComparator::Bytewise);
        let mut b = FullySeparated::create(4, 4, 3).unwrap();
        for n in 0..20 {
            b.set_value(&p, &k(n), &k(n)).unwrap();
            assert_in_step(b.store());
        }
        for n in (0..20).step_by(2) {
            b.remove_value(&p, &k(n));
        }
        for n in 20..35 {
            b.reserve_slot(&p, &k(n)).unwrap();
            assert_in_step(b.store());
        }
        assert_eq!(b.count(), 25);
    }

    /// A value array that cannot grow fails the append before any array
    /// of the bucket is touched, and the store stays usable.
    #[test]
    fn failed_append_leaves_bucket_untouched() {
        let mut s = FullySeparatedStore::with_buckets(4, usize::MAX, 2).unwrap();
        let err = s.append(0, SlotHash::live(2), &k(2)).unwrap_err();
        assert!(matches!(err, TableError::Allocation(_)));
        assert_eq!(s.bucket_len(0), 0);
        assert_in_step(&s);

        let err = s.append(0, SlotHash::live(4), &k(4)).unwrap_err();
        assert!(matches!(err, TableError::Allocation(_)));
        assert_eq!(s.bucket_len(0), 0);
        assert_in_step(&s);
    }

    /// Zero-sized values still get slots.
    #[test]
    fn zero_sized_values_act_as_a_set() {
        let p = KeyPolicy::new(4, 0, KeyHasher::Structural, KeyComparator::Bytewise);
        let mut b = FullySeparated::create(4, 0, 2).unwrap();
        b.set_value(&p, &k(1), &[]).unwrap();
        b.set_value(&p, &k(2), &[]).unwrap();
        assert_eq!(b.count(), 2);
        assert_eq!(b.get_value(&p, &k(2)), Some(&[][..]));
        assert_eq!(b.get_value(&p, &k(3)), None);
    }
}
