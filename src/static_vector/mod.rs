//! Fixed-capacity vector with inline storage
//!
//! Holds at most `N` elements in an array, so it can live on the stack.
//! Overflowing `push_back` drops the value, `pop_back` on an empty vector
//! does nothing, and `erase` shifts the tail down by one.

use std::ops::{Deref, DerefMut};

/// Vector with compile-time capacity `N`
#[derive(Debug, Clone, Copy)]
pub struct StaticVector<T, const N: usize> {
    data: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> StaticVector<T, N> {
    /// Create an empty vector
    pub fn new() -> Self {
        Self {
            data: [T::default(); N],
            len: 0,
        }
    }

    /// Append `value`; silently ignored once the vector is full
    pub fn push_back(&mut self, value: T) {
        if self.len < N {
            self.data[self.len] = value;
            self.len += 1;
        }
    }

    /// Remove the last element, if any
    pub fn pop_back(&mut self) {
        if self.len > 0 {
            self.len -= 1;
        }
    }

    /// Remove the element at `index`, shifting later elements left.
    ///
    /// `index == len()` is the end position and removes nothing. Returns
    /// `index`, which now refers to the element after the removed one.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn erase(&mut self, index: usize) -> usize {
        if index == self.len {
            return index;
        }

        assert!(index < self.len, "erase index {} out of bounds (len {})", index, self.len);
        self.data.copy_within(index + 1..self.len, index);
        self.len -= 1;
        index
    }
}

impl<T, const N: usize> StaticVector<T, N> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == N
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data[..self.len]
    }
}

impl<T: Copy + Default, const N: usize> Default for StaticVector<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for StaticVector<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, const N: usize> DerefMut for StaticVector<T, N> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: PartialEq, const N: usize> PartialEq for StaticVector<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<'a, T, const N: usize> IntoIterator for &'a StaticVector<T, N> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}
