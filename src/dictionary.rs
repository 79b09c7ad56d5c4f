//! Dictionary: a [`HashTable`] that sizes itself.
//!
//! The engine only knows *how* to rehash. This layer decides *when*:
//! before an insertion, once the load factor reaches
//! [`REHASH_LOAD_FACTOR`], the table grows to the next entry of
//! [`BUCKET_SIZES`].

use crate::backend::Backend;
use crate::entry::Entry;
use crate::enumerator::Enumerator;
use crate::error::TableError;
use crate::hash_table::HashTable;
use crate::interleaved::Interleaved;
use crate::policy::KeyPolicy;
use log::trace;

/// Load factor at which an insertion first grows the table.
pub const REHASH_LOAD_FACTOR: f32 = 0.75;

/// Bucket counts the dictionary steps through as it grows.
#[rustfmt::skip]
pub const BUCKET_SIZES: [usize; 40] = [
    3, 6, 11, 19, 32, 52, 85, 118,
    155, 237, 390, 672, 1065, 1732, 2795, 4543,
    7391, 12019, 19302, 31324, 50629, 81956, 132580, 214215,
    346784, 561026, 907847, 1468567, 2376414, 3844982, 6221390, 10066379,
    16287773, 26354132, 42641916, 68996399, 111638327, 180634415, 292272755, 472907503,
];

/// Expected number of entries, used to pick the initial bucket count.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SizeHint {
    #[default]
    Small,
    Medium,
    Large,
}

impl SizeHint {
    pub fn bucket_count(self) -> usize {
        match self {
            SizeHint::Small => BUCKET_SIZES[0],
            SizeHint::Medium => BUCKET_SIZES[7],
            SizeHint::Large => BUCKET_SIZES[12],
        }
    }
}

/// First size strictly larger than `current`, or `current` itself past
/// the end of the table.
pub fn next_bucket_count(current: usize) -> usize {
    BUCKET_SIZES
        .iter()
        .copied()
        .find(|&n| n > current)
        .unwrap_or(current)
}

#[derive(Debug)]
pub struct Dictionary<B = Interleaved> {
    table: HashTable<B>,
}

impl Dictionary<Interleaved> {
    pub fn new(key_size: usize, value_size: usize, hint: SizeHint) -> Result<Self, TableError> {
        Ok(Self {
            table: HashTable::new(key_size, value_size, hint.bucket_count())?,
        })
    }
}

impl<B: Backend> Dictionary<B> {
    pub fn with_policy(policy: KeyPolicy, hint: SizeHint) -> Result<Self, TableError> {
        Ok(Self {
            table: HashTable::with_policy(policy, hint.bucket_count())?,
        })
    }

    pub fn table(&self) -> &HashTable<B> {
        &self.table
    }

    pub fn into_table(self) -> HashTable<B> {
        self.table
    }

    fn grow_if_needed(&mut self) -> Result<(), TableError> {
        if self.table.load_factor() < REHASH_LOAD_FACTOR {
            return Ok(());
        }
        let current = self.table.bucket_count();
        let next = next_bucket_count(current);
        if next == current {
            trace!("dictionary at {} buckets has no larger size to grow into", current);
            return Ok(());
        }
        trace!(
            "dictionary load factor {:.2}, growing {} -> {} buckets",
            self.table.load_factor(),
            current,
            next
        );
        self.table.rehash(next)
    }

    pub fn count(&self) -> usize {
        self.table.count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn find_key(&self, key: &[u8]) -> Option<Entry> {
        self.table.find_key(key)
    }

    /// Grows first if needed, so previously obtained entries are invalid
    /// after this call.
    pub fn entry_for_key(&mut self, key: &[u8]) -> Result<(Option<Entry>, bool), TableError> {
        self.grow_if_needed()?;
        self.table.entry_for_key(key)
    }

    pub fn entry_is_initialized(&self, entry: Entry) -> bool {
        self.table.entry_is_initialized(entry)
    }

    pub fn get_key(&self, entry: Entry) -> Option<&[u8]> {
        self.table.get_key(entry)
    }

    pub fn get_entry(&self, entry: Entry) -> Option<&[u8]> {
        self.table.get_entry(entry)
    }

    pub fn set_entry(&mut self, entry: Entry, value: &[u8]) {
        self.table.set_entry(entry, value);
    }

    pub fn remove_entry(&mut self, entry: Entry) {
        self.table.remove_entry(entry);
    }

    pub fn get_value(&self, key: &[u8]) -> Option<&[u8]> {
        self.table.get_value(key)
    }

    pub fn set_value(&mut self, key: &[u8], value: &[u8]) -> Result<(), TableError> {
        self.grow_if_needed()?;
        self.table.set_value(key, value)
    }

    pub fn remove_value(&mut self, key: &[u8]) {
        self.table.remove_value(key);
    }

    pub fn keys(&self) -> Vec<&[u8]> {
        self.table.keys()
    }

    pub fn values(&self) -> Vec<&[u8]> {
        self.table.values()
    }

    pub fn key_enumerator(&self) -> Enumerator<'_, B> {
        self.table.key_enumerator()
    }

    pub fn value_enumerator(&self) -> Enumerator<'_, B> {
        self.table.value_enumerator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_map_to_table_positions() {
        assert_eq!(SizeHint::Small.bucket_count(), 3);
        assert_eq!(SizeHint::Medium.bucket_count(), 118);
        assert_eq!(SizeHint::Large.bucket_count(), 1065);
        assert_eq!(SizeHint::default(), SizeHint::Small);
    }

    #[test]
    fn next_bucket_count_steps_through_the_table() {
        assert_eq!(next_bucket_count(0), 3);
        assert_eq!(next_bucket_count(3), 6);
        assert_eq!(next_bucket_count(7), 11);
        assert_eq!(next_bucket_count(472907503), 472907503);
        assert!(BUCKET_SIZES.windows(2).all(|w| w[0] < w[1]));
    }

    /// Invariant: growth happens before the insertion that would find the
    /// load factor at or above the threshold.
    #[test]
    fn grows_at_threshold() {
        let mut d = Dictionary::new(4, 4, SizeHint::Small).unwrap();
        for n in 0u32..3 {
            d.set_value(&n.to_le_bytes(), &n.to_le_bytes()).unwrap();
        }
        // 3 / 3 buckets: still 3 until the next insertion checks.
        assert_eq!(d.table().bucket_count(), 3);
        d.set_value(&3u32.to_le_bytes(), &3u32.to_le_bytes()).unwrap();
        assert_eq!(d.table().bucket_count(), 6);
        assert_eq!(d.count(), 4);
    }
}
