//! HashTable: the façade over a pluggable [`Backend`].
//!
//! Keys and values are fixed-size byte strings copied into the table.
//! The façade owns the sizing metadata and the hash/compare policy and
//! turns backend slot coordinates into [`Entry`] handles.

use crate::backend::{Backend, Cursor, Direction};
use crate::entry::{self, Entry};
use crate::enumerator::{Enumerator, EnumeratorKind};
use crate::error::TableError;
use crate::interleaved::Interleaved;
use crate::policy::{KeyComparator, KeyHasher, KeyPolicy};
use core::marker::PhantomData;
use log::{debug, error};

/// Bucket count used when a builder is not given one.
pub const DEFAULT_BUCKET_COUNT: usize = 3;

pub struct HashTable<B = Interleaved> {
    policy: KeyPolicy,
    bucket_count: usize,
    backend: B,
}

/// Configuration for a [`HashTable`].
pub struct HashTableBuilder<B> {
    key_size: usize,
    value_size: usize,
    bucket_count: usize,
    hasher: KeyHasher,
    comparator: KeyComparator,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend> HashTableBuilder<B> {
    pub fn bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn hasher(mut self, hasher: KeyHasher) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn comparator(mut self, comparator: KeyComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn build(self) -> Result<HashTable<B>, TableError> {
        let policy = KeyPolicy::new(self.key_size, self.value_size, self.hasher, self.comparator);
        HashTable::with_policy(policy, self.bucket_count)
    }
}

impl HashTable<Interleaved> {
    /// Table with the interleaved backend and the structural hasher and
    /// bytewise comparator.
    pub fn new(
        key_size: usize,
        value_size: usize,
        bucket_count: usize,
    ) -> Result<Self, TableError> {
        Self::with_policy(
            KeyPolicy::new(key_size, value_size, KeyHasher::Structural, KeyComparator::Bytewise),
            bucket_count,
        )
    }
}

impl<B: Backend> HashTable<B> {
    pub fn builder(key_size: usize, value_size: usize) -> HashTableBuilder<B> {
        HashTableBuilder {
            key_size,
            value_size,
            bucket_count: DEFAULT_BUCKET_COUNT,
            hasher: KeyHasher::default(),
            comparator: KeyComparator::default(),
            _backend: PhantomData,
        }
    }

    pub fn with_policy(policy: KeyPolicy, bucket_count: usize) -> Result<Self, TableError> {
        if bucket_count < 1 {
            error!("failed to create hash table: bucket count {} < 1", bucket_count);
            return Err(TableError::InvalidBucketCount(bucket_count));
        }
        let backend = B::create(policy.key_size(), policy.value_size(), bucket_count)
            .inspect_err(|e| error!("failed to create hash table backend: {}", e))?;
        Ok(Self {
            policy,
            bucket_count,
            backend,
        })
    }

    #[inline]
    fn check_key(&self, key: &[u8]) {
        debug_assert_eq!(key.len(), self.policy.key_size(), "key size mismatch");
    }

    #[inline]
    fn check_value(&self, value: &[u8]) {
        debug_assert_eq!(value.len(), self.policy.value_size(), "value size mismatch");
    }

    pub fn policy(&self) -> &KeyPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn key_size(&self) -> usize {
        self.policy.key_size()
    }

    #[inline]
    pub fn value_size(&self) -> usize {
        self.policy.value_size()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    /// Number of live keys, including reserved keys without a value.
    #[inline]
    pub fn count(&self) -> usize {
        self.backend.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn load_factor(&self) -> f32 {
        self.count() as f32 / self.bucket_count as f32
    }

    pub fn key_hash(&self, key: &[u8]) -> u64 {
        self.policy.hash(key)
    }

    pub fn find_key(&self, key: &[u8]) -> Option<Entry> {
        self.check_key(key);
        let slot = self.backend.find_slot(&self.policy, key)?;
        entry::encode(self.bucket_count, slot)
    }

    /// Entry for `key`, reserving a slot when absent. A freshly reserved
    /// entry holds no value: write it with [`HashTable::set_entry`] or check
    /// [`HashTable::entry_is_initialized`] before reading.
    ///
    /// The entry is `None` when the slot cannot be addressed by an entry
    /// handle; the key is still reserved and counted.
    pub fn entry_for_key(&mut self, key: &[u8]) -> Result<(Option<Entry>, bool), TableError> {
        self.check_key(key);
        let r = self.backend.reserve_slot(&self.policy, key)?;
        Ok((entry::encode(self.bucket_count, r.slot), r.created))
    }

    pub fn entry_is_initialized(&self, entry: Entry) -> bool {
        self.backend
            .is_initialized(entry::decode(self.bucket_count, entry))
    }

    pub fn get_key(&self, entry: Entry) -> Option<&[u8]> {
        self.backend.key_at(entry::decode(self.bucket_count, entry))
    }

    /// Value of an entry; `None` until a value has been written.
    pub fn get_entry(&self, entry: Entry) -> Option<&[u8]> {
        let slot = entry::decode(self.bucket_count, entry);
        if self.backend.is_initialized(slot) {
            self.backend.value_at(slot)
        } else {
            None
        }
    }

    pub fn set_entry(&mut self, entry: Entry, value: &[u8]) {
        self.check_value(value);
        let slot = entry::decode(self.bucket_count, entry);
        self.backend.set_value_at(slot, value);
    }

    pub fn remove_entry(&mut self, entry: Entry) {
        let slot = entry::decode(self.bucket_count, entry);
        self.backend.remove_at(slot);
    }

    pub fn get_value(&self, key: &[u8]) -> Option<&[u8]> {
        self.check_key(key);
        self.backend.get_value(&self.policy, key)
    }

    pub fn set_value(&mut self, key: &[u8], value: &[u8]) -> Result<(), TableError> {
        self.check_key(key);
        self.check_value(value);
        self.backend.set_value(&self.policy, key, value)
    }

    /// Remove `key`. Removing an absent key does nothing.
    pub fn remove_value(&mut self, key: &[u8]) {
        self.check_key(key);
        self.backend.remove_value(&self.policy, key);
    }

    /// Redistribute into `bucket_count` buckets. Invalidates every
    /// outstanding entry.
    pub fn rehash(&mut self, bucket_count: usize) -> Result<(), TableError> {
        if bucket_count < 1 {
            return Err(TableError::InvalidBucketCount(bucket_count));
        }
        debug!(
            "rehash: {} -> {} buckets, {} live",
            self.bucket_count,
            bucket_count,
            self.count()
        );
        self.backend.rehash(&self.policy, bucket_count)?;
        self.bucket_count = bucket_count;
        debug_assert_eq!(self.backend.bucket_count(), bucket_count);
        Ok(())
    }

    /// Snapshot of the keys, in enumeration order.
    pub fn keys(&self) -> Vec<&[u8]> {
        self.backend.keys()
    }

    /// Snapshot of the values, in enumeration order.
    pub fn values(&self) -> Vec<&[u8]> {
        self.backend.values()
    }

    pub fn key_enumerator(&self) -> Enumerator<'_, B> {
        Enumerator::new(&self.backend, EnumeratorKind::Key)
    }

    pub fn value_enumerator(&self) -> Enumerator<'_, B> {
        Enumerator::new(&self.backend, EnumeratorKind::Value)
    }

    /// Key/value pairs of every slot holding a value.
    pub fn iter(&self) -> Iter<'_, B> {
        Iter {
            backend: &self.backend,
            cursor: Cursor::Head,
        }
    }
}

impl<B> core::fmt::Debug for HashTable<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("policy", &self.policy)
            .field("bucket_count", &self.bucket_count)
            .finish_non_exhaustive()
    }
}

/// Iterator over initialized key/value pairs of a [`HashTable`].
pub struct Iter<'a, B> {
    backend: &'a B,
    cursor: Cursor,
}

impl<'a, B: Backend> Iterator for Iter<'a, B> {
    type Item = (&'a [u8], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.cursor = self.backend.step(self.cursor, Direction::Next);
            let Cursor::At(slot) = self.cursor else {
                return None;
            };
            if !self.backend.is_initialized(slot) {
                continue;
            }
            if let (Some(k), Some(v)) = (self.backend.key_at(slot), self.backend.value_at(slot)) {
                return Some((k, v));
            }
        }
    }
}

impl<'a, B: Backend> IntoIterator for &'a HashTable<B> {
    type Item = (&'a [u8], &'a [u8]);
    type IntoIter = Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
