//! Hash-separated layout: per bucket, a dense hash array plus a key/value
//! record array.
//!
//! Probing only touches the hash array until a truncated hash matches,
//! which helps when keys are large or hashes collide often.

use crate::array::ElementArray;
use crate::chained::{BucketStore, Chained};
use crate::entry::SlotIndex;
use crate::error::TableError;
use crate::slot_hash::SlotHash;

/// Backend keeping hashes apart from key/value records.
pub type HashSeparated = Chained<HashSeparatedStore>;

#[derive(Debug)]
pub struct HashSeparatedStore {
    key_size: usize,
    value_size: usize,
    hashes: Vec<Option<Vec<SlotHash>>>,
    records: Vec<Option<ElementArray>>,
}

impl HashSeparatedStore {
    #[inline]
    fn record(&self, slot: SlotIndex) -> &[u8] {
        self.records[slot.bucket]
            .as_ref()
            .and_then(|b| b.element_at(slot.item))
            .expect("slot in bounds")
    }

    #[inline]
    fn record_mut(&mut self, slot: SlotIndex) -> &mut [u8] {
        self.records[slot.bucket]
            .as_mut()
            .and_then(|b| b.element_at_mut(slot.item))
            .expect("slot in bounds")
    }
}

impl BucketStore for HashSeparatedStore {
    fn with_buckets(
        key_size: usize,
        value_size: usize,
        bucket_count: usize,
    ) -> Result<Self, TableError> {
        let mut hashes = Vec::new();
        hashes.try_reserve_exact(bucket_count)?;
        hashes.resize_with(bucket_count, || None);
        let mut records = Vec::new();
        records.try_reserve_exact(bucket_count)?;
        records.resize_with(bucket_count, || None);
        Ok(Self {
            key_size,
            value_size,
            hashes,
            records,
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
        &self.record(slot)[..self.key_size]
    }

    fn value_at(&self, slot: SlotIndex) -> &[u8] {
        &self.record(slot)[self.key_size..]
    }

    fn write_value(&mut self, slot: SlotIndex, value: &[u8]) {
        let key_size = self.key_size;
        self.record_mut(slot)[key_size..].copy_from_slice(value);
    }

    fn overwrite(&mut self, slot: SlotIndex, hash: SlotHash, key: &[u8]) {
        self.set_hash_at(slot, hash);
        let key_size = self.key_size;
        let record = self.record_mut(slot);
        record[..key_size].copy_from_slice(key);
        record[key_size..].fill(0);
    }

    fn append(&mut self, bucket: usize, hash: SlotHash, key: &[u8]) -> Result<usize, TableError> {
        let record_size = self.key_size + self.value_size;
        let chain = match &mut self.records[bucket] {
            Some(chain) => chain,
            empty => empty.insert(ElementArray::new(record_size, 1)?),
        };
        let hashes = self.hashes[bucket].get_or_insert_with(Vec::new);
        hashes.try_reserve(1)?;

        let item = chain.append(None)?;
        hashes.push(hash);
        debug_assert_eq!(hashes.len(), chain.count());

        let key_size = self.key_size;
        if let Some(record) = chain.element_at_mut(item) {
            record[..key_size].copy_from_slice(key);
        }
        Ok(item)
    }
}
