//! Chained: separate chaining over per-bucket arrays.
//!
//! The chaining algorithm (probe, reserve, tombstone, walk) is written
//! once here; a [`BucketStore`] decides how hashes, keys and values are
//! physically laid out inside a bucket.
//!
//! Slots are never shifted or freed: removal sets the tombstone bit and
//! a later insert into the same bucket reuses the first tombstone. Slot
//! coordinates therefore stay stable until a rehash, at the price of
//! buckets that only grow under churn.

use crate::backend::{Backend, Cursor, Direction, Reservation};
use crate::entry::SlotIndex;
use crate::error::TableError;
use crate::policy::KeyPolicy;
use crate::slot_hash::SlotHash;
use log::{debug, warn};

/// Physical layout of the buckets of one table.
///
/// Callers guarantee that `slot` arguments are in bounds (see
/// [`BucketStore::bucket_len`]); stores may panic otherwise.
pub trait BucketStore: Sized {
    /// Dimension the top-level arrays; no bucket sub-arrays yet.
    fn with_buckets(
        key_size: usize,
        value_size: usize,
        bucket_count: usize,
    ) -> Result<Self, TableError>;

    fn bucket_count(&self) -> usize;

    /// Number of slots ever allocated in `bucket` (0 if it was never used).
    fn bucket_len(&self, bucket: usize) -> usize;

    fn hash_at(&self, slot: SlotIndex) -> SlotHash;

    fn set_hash_at(&mut self, slot: SlotIndex, hash: SlotHash);

    fn key_at(&self, slot: SlotIndex) -> &[u8];

    fn value_at(&self, slot: SlotIndex) -> &[u8];

    fn write_value(&mut self, slot: SlotIndex, value: &[u8]);

    /// Fully reinitialize an existing slot for a new key: fresh hash,
    /// key bytes, zeroed value.
    fn overwrite(&mut self, slot: SlotIndex, hash: SlotHash, key: &[u8]);

    /// Append a slot to `bucket`, creating the bucket arrays on first use.
    fn append(&mut self, bucket: usize, hash: SlotHash, key: &[u8]) -> Result<usize, TableError>;

    /// Optional in-place redistribution into `bucket_count` buckets.
    /// `None` means the layout has no such path.
    fn redistribute(
        &mut self,
        _policy: &KeyPolicy,
        _bucket_count: usize,
    ) -> Option<Result<(), TableError>> {
        None
    }
}

#[derive(Debug)]
pub struct Chained<L> {
    store: L,
    count: usize,
}

impl<L: BucketStore> Chained<L> {
    pub fn store(&self) -> &L {
        &self.store
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.store.bucket_count() as u64) as usize
    }

    #[inline]
    fn contains(&self, slot: SlotIndex) -> bool {
        slot.bucket < self.store.bucket_count() && slot.item < self.store.bucket_len(slot.bucket)
    }

    /// Hash of an existing live slot.
    #[inline]
    fn live_hash(&self, slot: SlotIndex) -> Option<SlotHash> {
        if !self.contains(slot) {
            return None;
        }
        let h = self.store.hash_at(slot);
        (!h.is_tombstoned()).then_some(h)
    }

    /// Linear scan of `bucket`: truncated hash first, then key equality.
    fn probe(&self, policy: &KeyPolicy, bucket: usize, hash: u64, key: &[u8]) -> Option<usize> {
        (0..self.store.bucket_len(bucket)).find(|&item| {
            let slot = SlotIndex::new(bucket, item);
            self.store.hash_at(slot).matches(hash)
                && policy.keys_equal(key, self.store.key_at(slot))
        })
    }

    /// Claim a slot in `bucket` for a key known to be absent.
    fn place(&mut self, bucket: usize, hash: u64, key: &[u8]) -> Result<usize, TableError> {
        let fresh = SlotHash::live(hash);
        let reusable = (0..self.store.bucket_len(bucket))
            .find(|&item| self.store.hash_at(SlotIndex::new(bucket, item)).is_tombstoned());
        let item = match reusable {
            Some(item) => {
                self.store.overwrite(SlotIndex::new(bucket, item), fresh, key);
                item
            }
            None => self.store.append(bucket, fresh, key)?,
        };
        self.count += 1;
        Ok(item)
    }

    fn scan_forward(&self, mut bucket: usize, mut item: usize) -> Cursor {
        while bucket < self.store.bucket_count() {
            let len = self.store.bucket_len(bucket);
            while item < len {
                let slot = SlotIndex::new(bucket, item);
                if !self.store.hash_at(slot).is_tombstoned() {
                    return Cursor::At(slot);
                }
                item += 1;
            }
            bucket += 1;
            item = 0;
        }
        Cursor::Exhausted
    }

    /// Walk backwards over items `< end` of `bucket`, then earlier buckets.
    fn scan_backward(&self, mut bucket: usize, mut end: usize) -> Cursor {
        loop {
            for item in (0..end).rev() {
                let slot = SlotIndex::new(bucket, item);
                if !self.store.hash_at(slot).is_tombstoned() {
                    return Cursor::At(slot);
                }
            }
            if bucket == 0 {
                return Cursor::Exhausted;
            }
            bucket -= 1;
            end = self.store.bucket_len(bucket);
        }
    }

    fn live_slots(&self) -> impl Iterator<Item = SlotIndex> + '_ {
        (0..self.store.bucket_count()).flat_map(move |bucket| {
            (0..self.store.bucket_len(bucket))
                .map(move |item| SlotIndex::new(bucket, item))
                .filter(move |&slot| !self.store.hash_at(slot).is_tombstoned())
        })
    }
}

impl<L: BucketStore> Backend for Chained<L> {
    fn create(key_size: usize, value_size: usize, bucket_count: usize) -> Result<Self, TableError> {
        if bucket_count < 1 {
            return Err(TableError::InvalidBucketCount(bucket_count));
        }
        Ok(Self {
            store: L::with_buckets(key_size, value_size, bucket_count)?,
            count: 0,
        })
    }

    #[inline]
    fn count(&self) -> usize {
        self.count
    }

    #[inline]
    fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    fn is_initialized(&self, slot: SlotIndex) -> bool {
        self.live_hash(slot).is_some_and(SlotHash::is_initialized)
    }

    fn find_slot(&self, policy: &KeyPolicy, key: &[u8]) -> Option<SlotIndex> {
        let hash = policy.hash(key);
        let bucket = self.bucket_of(hash);
        self.probe(policy, bucket, hash, key)
            .map(|item| SlotIndex::new(bucket, item))
    }

    fn reserve_slot(&mut self, policy: &KeyPolicy, key: &[u8]) -> Result<Reservation, TableError> {
        let hash = policy.hash(key);
        let bucket = self.bucket_of(hash);
        if let Some(item) = self.probe(policy, bucket, hash, key) {
            return Ok(Reservation {
                slot: SlotIndex::new(bucket, item),
                created: false,
            });
        }
        let item = self.place(bucket, hash, key)?;
        Ok(Reservation {
            slot: SlotIndex::new(bucket, item),
            created: true,
        })
    }

    fn key_at(&self, slot: SlotIndex) -> Option<&[u8]> {
        self.live_hash(slot).map(|_| self.store.key_at(slot))
    }

    fn value_at(&self, slot: SlotIndex) -> Option<&[u8]> {
        self.live_hash(slot).map(|_| self.store.value_at(slot))
    }

    fn set_value_at(&mut self, slot: SlotIndex, value: &[u8]) {
        match self.live_hash(slot) {
            Some(h) => {
                self.store.set_hash_at(slot, h.mark_initialized());
                self.store.write_value(slot, value);
            }
            None => warn!("set_value_at: no live slot at {:?}", slot),
        }
    }

    fn remove_at(&mut self, slot: SlotIndex) {
        match self.live_hash(slot) {
            Some(h) => {
                self.store.set_hash_at(slot, h.tombstoned());
                self.count -= 1;
            }
            None => warn!("remove_at: no live slot at {:?}", slot),
        }
    }

    fn step(&self, cursor: Cursor, direction: Direction) -> Cursor {
        match (cursor, direction) {
            (Cursor::Head, Direction::Next) => self.scan_forward(0, 0),
            (Cursor::Tail, Direction::Previous) => {
                let last = self.store.bucket_count() - 1;
                self.scan_backward(last, self.store.bucket_len(last))
            }
            (Cursor::At(s), Direction::Next) => self.scan_forward(s.bucket, s.item + 1),
            (Cursor::At(s), Direction::Previous) => self.scan_backward(s.bucket, s.item),
            _ => Cursor::Exhausted,
        }
    }

    fn get_value(&self, policy: &KeyPolicy, key: &[u8]) -> Option<&[u8]> {
        let hash = policy.hash(key);
        let bucket = self.bucket_of(hash);
        let slot = SlotIndex::new(bucket, self.probe(policy, bucket, hash, key)?);
        self.store
            .hash_at(slot)
            .is_initialized()
            .then(|| self.store.value_at(slot))
    }

    fn set_value(
        &mut self,
        policy: &KeyPolicy,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), TableError> {
        let hash = policy.hash(key);
        let bucket = self.bucket_of(hash);
        let item = match self.probe(policy, bucket, hash, key) {
            Some(item) => item,
            None => self.place(bucket, hash, key)?,
        };
        let slot = SlotIndex::new(bucket, item);
        let h = self.store.hash_at(slot);
        self.store.set_hash_at(slot, h.mark_initialized());
        self.store.write_value(slot, value);
        Ok(())
    }

    fn remove_value(&mut self, policy: &KeyPolicy, key: &[u8]) {
        let hash = policy.hash(key);
        let bucket = self.bucket_of(hash);
        if let Some(item) = self.probe(policy, bucket, hash, key) {
            let slot = SlotIndex::new(bucket, item);
            let h = self.store.hash_at(slot);
            self.store.set_hash_at(slot, h.tombstoned());
            self.count -= 1;
        }
    }

    fn keys(&self) -> Vec<&[u8]> {
        let mut out = Vec::with_capacity(self.count);
        out.extend(self.live_slots().map(|slot| self.store.key_at(slot)));
        out
    }

    fn values(&self) -> Vec<&[u8]> {
        let mut out = Vec::with_capacity(self.count);
        out.extend(self.live_slots().map(|slot| self.store.value_at(slot)));
        out
    }

    fn rehash(&mut self, policy: &KeyPolicy, bucket_count: usize) -> Result<(), TableError> {
        if bucket_count < 1 {
            return Err(TableError::InvalidBucketCount(bucket_count));
        }
        match self.store.redistribute(policy, bucket_count) {
            Some(result) => {
                debug!("rehash: records moved in place into {} buckets", bucket_count);
                result
            }
            None => {
                debug!("rehash: rebuilding into {} buckets from enumeration", bucket_count);
                *self = crate::rehash::rebuild(self, policy, bucket_count)?;
                Ok(())
            }
        }
    }
}
