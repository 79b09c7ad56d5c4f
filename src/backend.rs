//! Backend: the storage interface every bucket layout implements.
//!
//! The façade owns sizing and hash/compare policy and dispatches every
//! operation through this trait. Backends address slots by raw
//! [`SlotIndex`] coordinates; entry handle encoding happens above them.
//!
//! Required methods cover lookup, reservation, per-slot access and the
//! enumeration primitive. The "optional" operations (`get_value`,
//! `set_value`, `remove_value`, `keys`, `values`, `rehash`) come with
//! default compositions of the required ones; a backend overrides them
//! when it has a faster path.

use crate::entry::SlotIndex;
use crate::enumerator::{Enumerator, EnumeratorKind};
use crate::error::TableError;
use crate::policy::KeyPolicy;
use crate::rehash;

/// Position of an enumeration cursor.
///
/// `Head` and `Tail` are anchors before the first and after the last
/// slot; stepping away from them lands on the first/last live slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Cursor {
    Head,
    Tail,
    At(SlotIndex),
    Exhausted,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// Outcome of reserving a slot for a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub slot: SlotIndex,
    /// False when the key was already present.
    pub created: bool,
}

pub trait Backend: Sized {
    /// Allocate empty storage for `bucket_count` buckets.
    fn create(key_size: usize, value_size: usize, bucket_count: usize) -> Result<Self, TableError>;

    /// Number of live (non-tombstoned) slots.
    fn count(&self) -> usize;

    fn bucket_count(&self) -> usize;

    /// Whether the live slot at `slot` has had a value written.
    fn is_initialized(&self, slot: SlotIndex) -> bool;

    fn find_slot(&self, policy: &KeyPolicy, key: &[u8]) -> Option<SlotIndex>;

    /// Find `key`, or claim a slot for it (reusing the first tombstone of
    /// its bucket, else appending). A claimed slot is live but holds no
    /// value yet.
    fn reserve_slot(&mut self, policy: &KeyPolicy, key: &[u8]) -> Result<Reservation, TableError>;

    /// Key bytes of a live slot.
    fn key_at(&self, slot: SlotIndex) -> Option<&[u8]>;

    /// Value bytes of a live slot, initialized or not.
    fn value_at(&self, slot: SlotIndex) -> Option<&[u8]>;

    /// Write the value of a live slot and mark it initialized.
    fn set_value_at(&mut self, slot: SlotIndex, value: &[u8]);

    /// Tombstone a live slot. Later slots are never shifted.
    fn remove_at(&mut self, slot: SlotIndex);

    /// Enumeration primitive: the next live slot from `cursor` in
    /// `direction`, skipping tombstones.
    fn step(&self, cursor: Cursor, direction: Direction) -> Cursor;

    fn get_value(&self, policy: &KeyPolicy, key: &[u8]) -> Option<&[u8]> {
        let slot = self.find_slot(policy, key)?;
        if self.is_initialized(slot) {
            self.value_at(slot)
        } else {
            None
        }
    }

    fn set_value(
        &mut self,
        policy: &KeyPolicy,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), TableError> {
        let reservation = self.reserve_slot(policy, key)?;
        self.set_value_at(reservation.slot, value);
        Ok(())
    }

    fn remove_value(&mut self, policy: &KeyPolicy, key: &[u8]) {
        if let Some(slot) = self.find_slot(policy, key) {
            self.remove_at(slot);
        }
    }

    /// Keys of every live slot, in enumeration order.
    fn keys(&self) -> Vec<&[u8]> {
        Enumerator::new(self, EnumeratorKind::Key).collect_forward()
    }

    /// Values of every live slot, in enumeration order.
    fn values(&self) -> Vec<&[u8]> {
        Enumerator::new(self, EnumeratorKind::Value).collect_forward()
    }

    /// Redistribute into `bucket_count` buckets. The default rebuilds a
    /// fresh instance and reinserts every live pair.
    fn rehash(&mut self, policy: &KeyPolicy, bucket_count: usize) -> Result<(), TableError> {
        *self = rehash::rebuild(self, policy, bucket_count)?;
        Ok(())
    }
}
