//! The `Idx` trait and the `newtype_index!` macro.
//!
//! Every dense identifier in the compiler (types, basic blocks, value slots,
//! functions, global objects, ...) is a `u32`-backed newtype implementing
//! `Idx`, so that an `IdxVec<TypeIdx, _>` cannot be indexed with a
//! `BlockRef` by accident.

use std::fmt::Debug;
use std::hash::Hash;

pub trait Idx: 'static + Copy + Eq + Hash + Debug {
    fn new(idx: usize) -> Self;
    fn idx(&self) -> usize;

    #[inline]
    fn incr(&mut self) {
        *self = Self::new(self.idx() + 1);
    }
}

/// Defines a `u32`-backed index newtype implementing [`Idx`].
///
/// ```
/// orec_utils::newtype_index!(
///     /// A handle to an interned type.
///     pub struct TypeIdx
/// );
/// assert_eq!(TypeIdx::from_u32(3).as_u32(), 3);
/// ```
#[macro_export]
macro_rules! newtype_index {
    ($(#[$attr:meta])* $vis:vis struct $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis struct $name(u32);

        impl $name {
            pub const fn from_u32(idx: u32) -> Self {
                $name(idx)
            }

            pub const fn as_u32(self) -> u32 {
                self.0
            }

            pub const fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl $crate::idx::Idx for $name {
            #[inline]
            fn new(idx: usize) -> Self {
                debug_assert!(idx <= u32::MAX as usize);
                $name(idx as u32)
            }

            #[inline]
            fn idx(&self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::Idx;

    crate::newtype_index!(
        /// Test-only index.
        pub struct TestIdx
    );

    #[test]
    fn roundtrip() {
        let idx = TestIdx::new(42);
        assert_eq!(idx.idx(), 42);
        assert_eq!(idx.as_u32(), 42);
        assert_eq!(TestIdx::from_u32(42), idx);
    }

    #[test]
    fn incr() {
        let mut idx = TestIdx::new(0);
        idx.incr();
        assert_eq!(idx, TestIdx::new(1));
    }
}
