//! A vector-like data structure that uses an index type to access elements.
//!
//! It is inspired by the `IndexVec` type from the `rustc` compiler.

use crate::idx::Idx;
use crate::index_slice::IdxSlice;
use std::{
    marker::PhantomData,
    ops::{Deref, DerefMut, Index, IndexMut},
    slice, vec,
};

/// An owned contiguous collection of `T`s, indexed by `I` rather than by `usize`.
///
/// An `IdxVec` allows element access only via a specific associated index type,
/// meaning that trying to use the wrong index type (possibly accessing an
/// invalid element) will fail at compile time.
///
/// While it's possible to use `u32` or `usize` directly for `I`, you almost
/// certainly want to use a newtype for the index type (see `newtype_index!`).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IdxVec<I: Idx, T> {
    _marker: PhantomData<I>,
    pub raw: Vec<T>,
}

impl<I: Idx, T> IdxVec<I, T> {
    /// Constructs a new, empty `IdxVec<I, T>`.
    #[inline]
    pub const fn new() -> Self {
        IdxVec::from_raw(Vec::new())
    }

    /// Constructs a new `IdxVec<I, T>` from a `Vec<T>`.
    #[inline]
    pub const fn from_raw(raw: Vec<T>) -> Self {
        IdxVec {
            raw,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        IdxVec::from_raw(Vec::with_capacity(capacity))
    }

    /// Creates a new `IdxVec` with `n` copies of `elem`.
    #[inline]
    pub fn from_elem_n(elem: T, n: usize) -> Self
    where
        T: Clone,
    {
        IdxVec::from_raw(vec![elem; n])
    }

    /// Create an `IdxVec` with `n` elements, where the value of each
    /// element is the result of `func(i)`.
    #[inline]
    pub fn from_fn_n(func: impl FnMut(I) -> T, n: usize) -> Self {
        IdxVec::from_raw((0..n).map(I::new).map(func).collect())
    }

    #[inline]
    pub fn as_slice(&self) -> &IdxSlice<I, T> {
        IdxSlice::from_raw(&self.raw)
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut IdxSlice<I, T> {
        IdxSlice::from_raw_mut(&mut self.raw)
    }

    /// Pushes an element to the vector returning the index where it was pushed to.
    #[inline]
    pub fn push(&mut self, d: T) -> I {
        let idx = self.next_index();
        self.raw.push(d);
        idx
    }

    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.raw.pop()
    }

    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.raw.truncate(len)
    }

    #[inline]
    pub fn into_iter_enumerated(
        self,
    ) -> impl DoubleEndedIterator<Item = (I, T)> + ExactSizeIterator {
        self.raw
            .into_iter()
            .enumerate()
            .map(|(n, t)| (I::new(n), t))
    }
}

////////// Trait implementations  //////////

impl<I: Idx, T> Default for IdxVec<I, T> {
    fn default() -> Self {
        IdxVec::new()
    }
}

impl<I: Idx, T: std::fmt::Debug> std::fmt::Debug for IdxVec<I, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&self.raw, f)
    }
}

impl<I: Idx, T> Index<I> for IdxVec<I, T> {
    type Output = T;

    #[inline]
    fn index(&self, index: I) -> &T {
        &self.raw[index.idx()]
    }
}

impl<I: Idx, T> IndexMut<I> for IdxVec<I, T> {
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut T {
        &mut self.raw[index.idx()]
    }
}

impl<I: Idx, T> Deref for IdxVec<I, T> {
    type Target = IdxSlice<I, T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<I: Idx, T> DerefMut for IdxVec<I, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<I: Idx, T> FromIterator<T> for IdxVec<I, T> {
    #[inline]
    fn from_iter<J>(iter: J) -> Self
    where
        J: IntoIterator<Item = T>,
    {
        IdxVec::from_raw(Vec::from_iter(iter))
    }
}

impl<I: Idx, T> IntoIterator for IdxVec<I, T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    #[inline]
    fn into_iter(self) -> vec::IntoIter<T> {
        self.raw.into_iter()
    }
}

impl<'a, I: Idx, T> IntoIterator for &'a IdxVec<I, T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> slice::Iter<'a, T> {
        self.iter()
    }
}

impl<'a, I: Idx, T> IntoIterator for &'a mut IdxVec<I, T> {
    type Item = &'a mut T;
    type IntoIter = slice::IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> slice::IterMut<'a, T> {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::newtype_index!(pub struct TestIdx);

    #[test]
    fn push_returns_index() {
        let mut v: IdxVec<TestIdx, &str> = IdxVec::new();
        assert_eq!(v.push("a"), TestIdx::from_u32(0));
        assert_eq!(v.push("b"), TestIdx::from_u32(1));
        assert_eq!(v[TestIdx::from_u32(1)], "b");
    }

    #[test]
    fn enumerated_iteration() {
        let v: IdxVec<TestIdx, u32> = IdxVec::from_fn_n(|i: TestIdx| i.as_u32() * 10, 3);
        let pairs: Vec<_> = v.iter_enumerated().map(|(i, &t)| (i.as_u32(), t)).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 10), (2, 20)]);
    }
}
