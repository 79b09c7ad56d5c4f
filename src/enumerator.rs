//! Enumerator: a bidirectional cursor over the live keys or values of a
//! backend.
//!
//! The cursor holds raw (bucket, item) coordinates. It borrows the table
//! immutably, so no insertion, removal or rehash can happen while it is
//! alive.

use crate::backend::{Backend, Cursor, Direction};
use crate::entry::{self, Entry, SlotIndex};

/// Which element of each slot the enumerator yields.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnumeratorKind {
    Key,
    Value,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EnumeratorAction {
    Head,
    Tail,
    Next,
    Previous,
    Current,
}

pub struct Enumerator<'a, B> {
    backend: &'a B,
    kind: EnumeratorKind,
    cursor: Cursor,
}

impl<'a, B: Backend> Enumerator<'a, B> {
    /// A new enumerator positioned on the first live slot.
    pub fn new(backend: &'a B, kind: EnumeratorKind) -> Self {
        Self {
            backend,
            kind,
            cursor: backend.step(Cursor::Head, Direction::Next),
        }
    }

    #[inline]
    pub fn kind(&self) -> EnumeratorKind {
        self.kind
    }

    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Slot under the cursor, if positioned on one.
    #[inline]
    pub fn slot(&self) -> Option<SlotIndex> {
        match self.cursor {
            Cursor::At(slot) => Some(slot),
            _ => None,
        }
    }

    /// Entry handle for the slot under the cursor.
    pub fn entry(&self) -> Option<Entry> {
        entry::encode(self.backend.bucket_count(), self.slot()?)
    }

    pub fn perform(&mut self, action: EnumeratorAction) -> Option<&'a [u8]> {
        self.cursor = match action {
            EnumeratorAction::Head => self.backend.step(Cursor::Head, Direction::Next),
            EnumeratorAction::Tail => self.backend.step(Cursor::Tail, Direction::Previous),
            EnumeratorAction::Next => self.backend.step(self.cursor, Direction::Next),
            EnumeratorAction::Previous => self.backend.step(self.cursor, Direction::Previous),
            EnumeratorAction::Current => self.cursor,
        };
        self.current()
    }

    /// Element under the cursor without moving; `None` once exhausted.
    pub fn current(&self) -> Option<&'a [u8]> {
        let slot = self.slot()?;
        match self.kind {
            EnumeratorKind::Key => self.backend.key_at(slot),
            EnumeratorKind::Value => self.backend.value_at(slot),
        }
    }

    pub fn to_head(&mut self) -> Option<&'a [u8]> {
        self.perform(EnumeratorAction::Head)
    }

    pub fn to_tail(&mut self) -> Option<&'a [u8]> {
        self.perform(EnumeratorAction::Tail)
    }

    /// Step forward. Stepping an exhausted cursor keeps it exhausted
    /// until it is moved back to the head or tail.
    pub fn move_next(&mut self) -> Option<&'a [u8]> {
        self.perform(EnumeratorAction::Next)
    }

    pub fn move_previous(&mut self) -> Option<&'a [u8]> {
        self.perform(EnumeratorAction::Previous)
    }

    /// Every element from the current position to the tail.
    pub(crate) fn collect_forward(mut self) -> Vec<&'a [u8]> {
        let mut out = Vec::with_capacity(self.backend.count());
        let mut current = self.current();
        while let Some(e) = current {
            out.push(e);
            current = self.move_next();
        }
        out
    }
}

impl<'a, B: Backend> core::fmt::Debug for Enumerator<'a, B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Enumerator")
            .field("kind", &self.kind)
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interleaved::Interleaved;
    use crate::policy::{KeyComparator, KeyHasher, KeyPolicy};

    fn k(n: u32) -> [u8; 4] {
        n.to_le_bytes()
    }

    fn filled(keys: &[u32], buckets: usize) -> (KeyPolicy, Interleaved) {
        let p = KeyPolicy::new(4, 4, KeyHasher::Structural, KeyComparator::Bytewise);
        let mut b = Interleaved::create(4, 4, buckets).unwrap();
        for &n in keys {
            b.set_value(&p, &k(n), &k(n * 10)).unwrap();
        }
        (p, b)
    }

    #[test]
    fn empty_backend_is_immediately_exhausted() {
        let (_p, b) = filled(&[], 4);
        let mut e = Enumerator::new(&b, EnumeratorKind::Key);
        assert_eq!(e.cursor(), Cursor::Exhausted);
        assert_eq!(e.current(), None);
        assert_eq!(e.to_tail(), None);
        assert_eq!(e.entry(), None);
    }

    /// Invariant: forward and backward walks visit the same slots in
    /// mirrored order and skip tombstones.
    #[test]
    fn walks_are_symmetric_and_skip_tombstones() {
        let (p, mut b) = filled(&[0, 1, 2, 3, 4, 5, 6, 7], 3);
        b.remove_value(&p, &k(3));
        b.remove_value(&p, &k(0));

        let mut forward = Vec::new();
        let mut e = Enumerator::new(&b, EnumeratorKind::Key);
        let mut cur = e.current();
        while let Some(key) = cur {
            forward.push(key.to_vec());
            cur = e.move_next();
        }

        let mut backward = Vec::new();
        let mut cur = e.to_tail();
        while let Some(key) = cur {
            backward.push(key.to_vec());
            cur = e.move_previous();
        }
        backward.reverse();

        assert_eq!(forward.len(), 6);
        assert_eq!(forward, backward);
        assert!(!forward.contains(&k(3).to_vec()));
    }

    #[test]
    fn value_enumerator_pairs_with_key_enumerator() {
        let (_p, b) = filled(&[5, 9, 13], 4);
        let mut keys = Enumerator::new(&b, EnumeratorKind::Key);
        let mut values = Enumerator::new(&b, EnumeratorKind::Value);
        assert_eq!(values.kind(), EnumeratorKind::Value);
        let mut key = keys.current();
        while let Some(kb) = key {
            let n = u32::from_le_bytes(kb.try_into().unwrap());
            assert_eq!(values.current(), Some(&k(n * 10)[..]));
            assert_eq!(keys.entry(), values.entry());
            key = keys.move_next();
            values.move_next();
        }
        assert_eq!(values.current(), None);
    }

    /// Exhaustion is sticky until the cursor is repositioned.
    #[test]
    fn exhausted_cursor_stays_exhausted() {
        let (_p, b) = filled(&[1], 2);
        let mut e = Enumerator::new(&b, EnumeratorKind::Key);
        assert_eq!(e.current(), Some(&k(1)[..]));
        assert_eq!(e.move_next(), None);
        assert_eq!(e.move_previous(), None);
        assert_eq!(e.perform(EnumeratorAction::Current), None);
        assert_eq!(e.to_head(), Some(&k(1)[..]));
        assert_eq!(e.move_previous(), None);
    }
}
