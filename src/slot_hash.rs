//! Stored slot hashes with two reserved state bits.
//!
//! The top bit marks a tombstone (logically removed slot), the next one
//! marks a slot whose value has been written. The remaining 62 bits hold
//! the truncated key hash used as a cheap pre-check before key equality.

const TOMBSTONE: u64 = 1 << 63;
const INITIALIZED: u64 = 1 << 62;
const HASH_MASK: u64 = u64::MAX >> 2;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SlotHash(u64);

impl SlotHash {
    /// A live, not yet initialized slot for a key with hash `hash`.
    #[inline]
    pub const fn live(hash: u64) -> Self {
        SlotHash(hash & HASH_MASK)
    }

    #[inline]
    pub const fn mark_initialized(self) -> Self {
        SlotHash(self.0 | INITIALIZED)
    }

    /// The tombstoned form of this slot; the initialized flag is cleared.
    #[inline]
    pub const fn tombstoned(self) -> Self {
        SlotHash((self.0 | TOMBSTONE) & !INITIALIZED)
    }

    #[inline]
    pub const fn is_tombstoned(self) -> bool {
        self.0 & TOMBSTONE != 0
    }

    #[inline]
    pub const fn is_initialized(self) -> bool {
        self.0 & INITIALIZED != 0
    }

    /// True when this live slot carries the truncated form of `hash`.
    /// Tombstones never match.
    #[inline]
    pub const fn matches(self, hash: u64) -> bool {
        self.0 & !INITIALIZED == hash & HASH_MASK
    }

    #[inline]
    pub const fn truncated(self) -> u64 {
        self.0 & HASH_MASK
    }

    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u64) -> Self {
        SlotHash(bits)
    }
}

impl core::fmt::Debug for SlotHash {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlotHash")
            .field("hash", &format_args!("{:#x}", self.truncated()))
            .field("initialized", &self.is_initialized())
            .field("tombstoned", &self.is_tombstoned())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_slot_drops_reserved_bits() {
        let h = SlotHash::live(u64::MAX);
        assert_eq!(h.truncated(), HASH_MASK);
        assert!(!h.is_tombstoned());
        assert!(!h.is_initialized());
        assert!(h.matches(u64::MAX));
        assert!(h.matches(HASH_MASK));
    }

    #[test]
    fn initialized_still_matches() {
        let h = SlotHash::live(42).mark_initialized();
        assert!(h.is_initialized());
        assert!(h.matches(42));
        assert!(!h.matches(43));
    }

    /// Invariant: tombstoning clears "initialized" and never matches again.
    #[test]
    fn tombstone_never_matches() {
        let h = SlotHash::live(7).mark_initialized().tombstoned();
        assert!(h.is_tombstoned());
        assert!(!h.is_initialized());
        assert!(!h.matches(7));
        assert_eq!(SlotHash::from_bits(h.to_bits()), h);
    }
}
