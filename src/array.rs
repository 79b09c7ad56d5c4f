//! ElementArray: contiguous store of same-sized byte elements.
//!
//! Bucket chains are kept in these arrays. Appends are amortized O(1),
//! indexed access is O(1), range removal shifts the tail and is O(n).
//! The chaining backends never remove with shift; they tombstone.

use crate::error::TableError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementArray {
    element_size: usize,
    len: usize,
    bytes: Vec<u8>,
}

impl ElementArray {
    /// Create an empty array, reserving room for `chunk_hint` elements.
    pub fn new(element_size: usize, chunk_hint: usize) -> Result<Self, TableError> {
        let mut bytes = Vec::new();
        bytes.try_reserve(element_size.saturating_mul(chunk_hint))?;
        Ok(Self {
            element_size,
            len: 0,
            bytes,
        })
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reserve room for `additional` more elements, so that many appends
    /// cannot fail.
    pub fn reserve(&mut self, additional: usize) -> Result<(), TableError> {
        self.bytes.try_reserve(self.element_size.saturating_mul(additional))?;
        Ok(())
    }

    /// Append one element and return its index. `None` appends a
    /// zero-filled element.
    pub fn append(&mut self, element: Option<&[u8]>) -> Result<usize, TableError> {
        self.bytes.try_reserve(self.element_size)?;
        match element {
            Some(e) => {
                assert_eq!(e.len(), self.element_size, "element size mismatch");
                self.bytes.extend_from_slice(e);
            }
            None => self.bytes.resize(self.bytes.len() + self.element_size, 0),
        }
        let index = self.len;
        self.len += 1;
        Ok(index)
    }

    /// Overwrite the element at `index`. Out of range indices are ignored.
    pub fn replace_at(&mut self, index: usize, element: &[u8]) {
        if let Some(slot) = self.element_at_mut(index) {
            slot.copy_from_slice(element);
        }
    }

    /// Remove `count` elements starting at `index`, shifting later elements down.
    pub fn remove_range(&mut self, index: usize, count: usize) {
        let end = index.saturating_add(count).min(self.len);
        if index >= end {
            return;
        }
        let size = self.element_size;
        self.bytes.drain(index * size..end * size);
        self.len -= end - index;
    }

    #[inline]
    pub fn element_at(&self, index: usize) -> Option<&[u8]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.element_size;
        Some(&self.bytes[start..start + self.element_size])
    }

    #[inline]
    pub fn element_at_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.len {
            return None;
        }
        let start = index * self.element_size;
        Some(&mut self.bytes[start..start + self.element_size])
    }

    /// Iterate over elements in index order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len).map(move |i| {
            let start = i * self.element_size;
            &self.bytes[start..start + self.element_size]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_returns_consecutive_indices() {
        let mut a = ElementArray::new(4, 1).unwrap();
        assert_eq!(a.append(Some(&[1, 2, 3, 4])).unwrap(), 0);
        assert_eq!(a.append(None).unwrap(), 1);
        assert_eq!(a.append(Some(&[9, 9, 9, 9])).unwrap(), 2);
        assert_eq!(a.count(), 3);
        assert_eq!(a.element_at(0), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(a.element_at(1), Some(&[0u8, 0, 0, 0][..]));
        assert_eq!(a.element_at(3), None);
    }

    #[test]
    fn replace_and_remove_range() {
        let mut a = ElementArray::new(2, 4).unwrap();
        for i in 0..5u8 {
            a.append(Some(&[i, i])).unwrap();
        }
        a.replace_at(1, &[7, 7]);
        a.replace_at(10, &[8, 8]);
        a.remove_range(2, 2);
        let seen: Vec<_> = a.iter().map(|e| e[0]).collect();
        assert_eq!(seen, vec![0, 7, 4]);

        // Overlong ranges clamp to the end.
        a.remove_range(1, 100);
        assert_eq!(a.count(), 1);
        a.remove_range(5, 1);
        assert_eq!(a.count(), 1);
    }

    #[test]
    fn reserve_reports_overflow_without_growing() {
        let mut a = ElementArray::new(usize::MAX, 0).unwrap();
        assert!(matches!(a.reserve(1), Err(TableError::Allocation(_))));
        assert!(a.is_empty());

        let mut b = ElementArray::new(4, 0).unwrap();
        b.reserve(3).unwrap();
        for _ in 0..3 {
            b.append(None).unwrap();
        }
        assert_eq!(b.count(), 3);
    }

    /// Invariant: zero-sized elements still count and index.
    #[test]
    fn zero_sized_elements() {
        let mut a = ElementArray::new(0, 8).unwrap();
        assert!(a.is_empty());
        a.append(None).unwrap();
        a.append(Some(&[])).unwrap();
        assert_eq!(a.count(), 2);
        assert_eq!(a.element_at(1), Some(&[][..]));
        assert_eq!(a.iter().count(), 2);
    }
}
