//! Key hashing and comparison policy shared by the façade and its backend.

use core::fmt;
use core::hash::BuildHasher;
use hashbrown::hash_map::DefaultHashBuilder;

/// How keys are turned into hashes.
#[derive(Default)]
pub enum KeyHasher {
    /// Promote the key bytes into a `u64` (little-endian, zero padded,
    /// truncated to the first 8 bytes).
    #[default]
    Structural,
    Custom(Box<dyn Fn(&[u8]) -> u64>),
}

impl KeyHasher {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[u8]) -> u64 + 'static,
    {
        KeyHasher::Custom(Box::new(f))
    }

    /// Hash keys through a standard `BuildHasher`.
    pub fn from_build_hasher<S>(builder: S) -> Self
    where
        S: BuildHasher + 'static,
    {
        KeyHasher::Custom(Box::new(move |key: &[u8]| builder.hash_one(key)))
    }

    /// A well distributed hasher (hashbrown's default, fixed keys) for keys
    /// whose raw bytes make a poor hash, such as common prefixes or aligned
    /// pointers.
    pub fn seeded() -> Self {
        Self::from_build_hasher(DefaultHashBuilder::default())
    }

    #[inline]
    pub fn hash(&self, key: &[u8]) -> u64 {
        match self {
            KeyHasher::Structural => structural_hash(key),
            KeyHasher::Custom(f) => f(key),
        }
    }
}

impl fmt::Debug for KeyHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyHasher::Structural => f.write_str("Structural"),
            KeyHasher::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// How keys are compared for equality.
#[derive(Default)]
pub enum KeyComparator {
    #[default]
    Bytewise,
    Custom(Box<dyn Fn(&[u8], &[u8]) -> bool>),
}

impl KeyComparator {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> bool + 'static,
    {
        KeyComparator::Custom(Box::new(f))
    }

    #[inline]
    pub fn equal(&self, a: &[u8], b: &[u8]) -> bool {
        match self {
            KeyComparator::Bytewise => a == b,
            KeyComparator::Custom(f) => f(a, b),
        }
    }
}

impl fmt::Debug for KeyComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyComparator::Bytewise => f.write_str("Bytewise"),
            KeyComparator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Default hash: the key bytes read as a little-endian machine word.
pub fn structural_hash(key: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    let n = key.len().min(8);
    word[..n].copy_from_slice(&key[..n]);
    u64::from_le_bytes(word)
}

/// Element sizes plus hash/compare policy of one table.
#[derive(Debug)]
pub struct KeyPolicy {
    key_size: usize,
    value_size: usize,
    hasher: KeyHasher,
    comparator: KeyComparator,
}

impl KeyPolicy {
    pub fn new(
        key_size: usize,
        value_size: usize,
        hasher: KeyHasher,
        comparator: KeyComparator,
    ) -> Self {
        Self {
            key_size,
            value_size,
            hasher,
            comparator,
        }
    }

    #[inline]
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    #[inline]
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    #[inline]
    pub fn hash(&self, key: &[u8]) -> u64 {
        self.hasher.hash(key)
    }

    #[inline]
    pub fn keys_equal(&self, a: &[u8], b: &[u8]) -> bool {
        self.comparator.equal(a, b)
    }

    pub fn hasher(&self) -> &KeyHasher {
        &self.hasher
    }

    pub fn comparator(&self) -> &KeyComparator {
        &self.comparator
    }
}
