// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Au-Zone Technologies

/// Destination that coded data can be written into.
///
/// `fill_at` is bounds-checked: it writes as much of `src` as fits at
/// `offset` and returns the number of bytes actually written, which is
/// smaller than `src.len()` when the destination runs out of room.
///
/// # Example
///
/// ```
/// use vabuffer::fill::Fill;
///
/// let mut dest = [0u8; 4];
/// assert_eq!(dest.fill_limit(), 4);
/// assert_eq!(dest.fill_at(2, b"abc"), 2);
/// assert_eq!(&dest, b"\0\0ab");
/// ```
pub trait Fill {
    /// Total number of bytes the destination can hold.
    fn fill_limit(&self) -> usize;

    /// Writes `src` at `offset`, returning the number of bytes written.
    fn fill_at(&mut self, offset: usize, src: &[u8]) -> usize;
}

impl Fill for [u8] {
    fn fill_limit(&self) -> usize {
        self.len()
    }

    fn fill_at(&mut self, offset: usize, src: &[u8]) -> usize {
        if offset >= self.len() {
            return 0;
        }
        let count = src.len().min(self.len() - offset);
        self[offset..offset + count].copy_from_slice(&src[..count]);
        count
    }
}

/// Bounded by the vector's current length; the vector never grows.
impl Fill for Vec<u8> {
    fn fill_limit(&self) -> usize {
        self.len()
    }

    fn fill_at(&mut self, offset: usize, src: &[u8]) -> usize {
        self.as_mut_slice().fill_at(offset, src)
    }
}

impl<const N: usize> Fill for [u8; N] {
    fn fill_limit(&self) -> usize {
        N
    }

    fn fill_at(&mut self, offset: usize, src: &[u8]) -> usize {
        self.as_mut_slice().fill_at(offset, src)
    }
}
