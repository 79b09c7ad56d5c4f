//! Entry references: (bucket, item) coordinates bit-packed into one handle.
//!
//! Layout of a raw entry, for a table with `bucket_count` buckets:
//!
//! ```text
//!   | item index ............ | bucket index + 1 |
//!                             ^ shift = popcount(mask_for_value(bucket_count + 1))
//! ```
//!
//! The low field is wide enough to hold `bucket_count + 1` positions so
//! that `bucket + 1` is never zero; the raw value 0 therefore means "no
//! entry". The field width is recomputed from the *current* bucket count
//! on every call. An entry decoded against another bucket count (for
//! instance after a rehash) yields unrelated coordinates without any
//! error, so entries must not outlive a rehash.

use core::num::NonZeroU64;
use log::warn;

/// Coordinates of a slot inside the bucket structure.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotIndex {
    pub bucket: usize,
    pub item: usize,
}

impl SlotIndex {
    #[inline]
    pub const fn new(bucket: usize, item: usize) -> Self {
        Self { bucket, item }
    }
}

/// Opaque, non-zero handle to a live slot.
///
/// Valid until the next structural mutation of its bucket or any rehash.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entry(NonZeroU64);

impl Entry {
    /// Reinterpret a raw handle; 0 is "no entry".
    #[inline]
    pub fn from_raw(raw: u64) -> Option<Entry> {
        NonZeroU64::new(raw).map(Entry)
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0.get()
    }
}

/// Mask covering every bit up to the highest set bit of `x`.
#[inline]
pub(crate) fn mask_for_value(x: u64) -> u64 {
    if x == 0 {
        0
    } else {
        u64::MAX >> x.leading_zeros()
    }
}

#[inline]
fn bucket_field(bucket_count: usize) -> (u64, u32) {
    let mask = mask_for_value(bucket_count as u64 + 1);
    (mask, mask.count_ones())
}

/// Pack `slot` into an entry for a table of `bucket_count` buckets.
///
/// Returns `None` (and logs a warning) when the item index does not fit
/// in the bits left above the bucket field.
pub fn encode(bucket_count: usize, slot: SlotIndex) -> Option<Entry> {
    let (_, shift) = bucket_field(bucket_count);
    let item = slot.item as u64;
    let item_limit = u64::MAX.checked_shr(shift).unwrap_or(0);
    if item & item_limit != item {
        warn!(
            "bucket {} of {} holds item {}, beyond what an entry reference can address",
            slot.bucket, bucket_count, slot.item
        );
        return None;
    }
    let low = slot.bucket as u64 + 1;
    let high = item.checked_shl(shift).unwrap_or(0);
    Entry::from_raw(high | low)
}

/// Split an entry back into coordinates, using the current bucket count.
pub fn decode(bucket_count: usize, entry: Entry) -> SlotIndex {
    let (mask, shift) = bucket_field(bucket_count);
    let raw = entry.raw();
    let bucket = ((raw & mask) as usize).wrapping_sub(1);
    let item = (raw & !mask).checked_shr(shift).unwrap_or(0) as usize;
    SlotIndex { bucket, item }
}

/// Decode a raw handle; `None` for the zero sentinel.
pub fn decode_raw(bucket_count: usize, raw: u64) -> Option<SlotIndex> {
    Entry::from_raw(raw).map(|e| decode(bucket_count, e))
}
