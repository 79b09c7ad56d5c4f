//! Interleaved layout: one record array per bucket, `[hash][key][value]`.
//!
//! Best for lookup- and insert-heavy workloads: a probe touches one
//! contiguous record per slot. Supports in-place redistribution on
//! rehash, moving whole records and dropping tombstones.

use crate::array::ElementArray;
use crate::chained::{BucketStore, Chained};
use crate::entry::SlotIndex;
use crate::error::TableError;
use crate::policy::KeyPolicy;
use crate::slot_hash::SlotHash;

const HASH_BYTES: usize = core::mem::size_of::<u64>();

/// Backend storing hash, key and value side by side.
pub type Interleaved = Chained<InterleavedStore>;

#[derive(Debug)]
pub struct InterleavedStore {
    key_size: usize,
    value_size: usize,
    buckets: Vec<Option<ElementArray>>,
}

impl InterleavedStore {
    #[inline]
    fn record_size(&self) -> usize {
        HASH_BYTES + self.key_size + self.value_size
    }

    #[inline]
    fn record(&self, slot: SlotIndex) -> &[u8] {
        self.buckets[slot.bucket]
            .as_ref()
            .and_then(|b| b.element_at(slot.item))
            .expect("slot in bounds")
    }

    #[inline]
    fn record_mut(&mut self, slot: SlotIndex) -> &mut [u8] {
        self.buckets[slot.bucket]
            .as_mut()
            .and_then(|b| b.element_at_mut(slot.item))
            .expect("slot in bounds")
    }

    fn empty_buckets(bucket_count: usize) -> Result<Vec<Option<ElementArray>>, TableError> {
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(bucket_count)?;
        buckets.resize_with(bucket_count, || None);
        Ok(buckets)
    }
}

fn read_hash(record: &[u8]) -> SlotHash {
    let mut word = [0u8; HASH_BYTES];
    word.copy_from_slice(&record[..HASH_BYTES]);
    SlotHash::from_bits(u64::from_ne_bytes(word))
}

impl BucketStore for InterleavedStore {
    fn with_buckets(
        key_size: usize,
        value_size: usize,
        bucket_count: usize,
    ) -> Result<Self, TableError> {
        Ok(Self {
            key_size,
            value_size,
            buckets: Self::empty_buckets(bucket_count)?,
        })
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn bucket_len(&self, bucket: usize) -> usize {
        self.buckets[bucket].as_ref().map_or(0, ElementArray::count)
    }

    #[inline]
    fn hash_at(&self, slot: SlotIndex) -> SlotHash {
        read_hash(self.record(slot))
    }

    fn set_hash_at(&mut self, slot: SlotIndex, hash: SlotHash) {
        self.record_mut(slot)[..HASH_BYTES].copy_from_slice(&hash.to_bits().to_ne_bytes());
    }

    fn key_at(&self, slot: SlotIndex) -> &[u8] {
        &self.record(slot)[HASH_BYTES..HASH_BYTES + self.key_size]
    }

    fn value_at(&self, slot: SlotIndex) -> &[u8] {
        &self.record(slot)[HASH_BYTES + self.key_size..]
    }

    fn write_value(&mut self, slot: SlotIndex, value: &[u8]) {
        let offset = HASH_BYTES + self.key_size;
        self.record_mut(slot)[offset..].copy_from_slice(value);
    }

    fn overwrite(&mut self, slot: SlotIndex, hash: SlotHash, key: &[u8]) {
        let key_size = self.key_size;
        let record = self.record_mut(slot);
        record[..HASH_BYTES].copy_from_slice(&hash.to_bits().to_ne_bytes());
        record[HASH_BYTES..HASH_BYTES + key_size].copy_from_slice(key);
        record[HASH_BYTES + key_size..].fill(0);
    }

    fn append(&mut self, bucket: usize, hash: SlotHash, key: &[u8]) -> Result<usize, TableError> {
        let record_size = self.record_size();
        let chain = match &mut self.buckets[bucket] {
            Some(chain) => chain,
            empty => empty.insert(ElementArray::new(record_size, 1)?),
        };
        let item = chain.append(None)?;
        self.overwrite(SlotIndex::new(bucket, item), hash, key);
        Ok(item)
    }

    fn redistribute(
        &mut self,
        policy: &KeyPolicy,
        bucket_count: usize,
    ) -> Option<Result<(), TableError>> {
        Some(self.move_records(policy, bucket_count))
    }
}

impl InterleavedStore {
    /// Build the new bucket array completely before swapping it in, so a
    /// failed allocation leaves the table untouched.
    fn move_records(&mut self, policy: &KeyPolicy, bucket_count: usize) -> Result<(), TableError> {
        let record_size = self.record_size();
        let key_size = self.key_size;
        let mut moved = Self::empty_buckets(bucket_count)?;
        for chain in self.buckets.iter().flatten() {
            for record in chain.iter() {
                if read_hash(record).is_tombstoned() {
                    continue;
                }
                let key = &record[HASH_BYTES..HASH_BYTES + key_size];
                let bucket = (policy.hash(key) % bucket_count as u64) as usize;
                let target = match &mut moved[bucket] {
                    Some(target) => target,
                    empty => empty.insert(ElementArray::new(record_size, 1)?),
                };
                target.append(Some(record))?;
            }
        }
        self.buckets = moved;
        Ok(())
    }
}
