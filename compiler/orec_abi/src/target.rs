use tracing::{debug, instrument};

use crate::size_and_align::{Align, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The byte order of the evaluation target.
///
/// Compile-time evaluation is byte-exact: the codegen serializer and the
/// executor's load/store routines both dispatch on this value, never on the
/// host's byte order.
pub enum Endianness {
    /// Little-endian.
    Little,

    /// Big-endian.
    Big,
}

impl Endianness {
    /// Whether this is the byte order of the host running the compiler.
    #[inline]
    pub const fn is_native(self) -> bool {
        match self {
            Endianness::Little => cfg!(target_endian = "little"),
            Endianness::Big => cfg!(target_endian = "big"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The pointer width of the evaluation target.
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    #[inline]
    pub const fn bytes(self) -> u64 {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Describes the machine model used during compile-time evaluation.
///
/// This is fixed per compilation: type layout, the address-space split and
/// every load/store in the abstract machine are derived from it.
pub struct TargetLayout {
    /// The byte order of the target.
    pub endianness: Endianness,

    /// The pointer width of the target.
    pub pointer_width: PointerWidth,
}

impl TargetLayout {
    #[instrument]
    pub fn new(pointer_width: PointerWidth, endianness: Endianness) -> Self {
        let layout = TargetLayout {
            endianness,
            pointer_width,
        };
        debug!("TargetLayout created: {:?}", layout);
        layout
    }

    /// The host-shaped default: 64-bit little-endian.
    pub fn host_default() -> Self {
        TargetLayout::new(PointerWidth::Bits64, Endianness::Little)
    }

    #[inline]
    pub const fn is_64_bit(&self) -> bool {
        matches!(self.pointer_width, PointerWidth::Bits64)
    }

    #[inline]
    pub const fn is_little_endian(&self) -> bool {
        matches!(self.endianness, Endianness::Little)
    }

    /// The size of pointers, in bytes.
    #[inline]
    pub const fn pointer_size(&self) -> Size {
        Size::from_bytes(self.pointer_width.bytes())
    }

    /// The alignment of pointers.
    #[inline]
    pub fn pointer_align(&self) -> Align {
        Align::from_bytes(self.pointer_width.bytes()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_size() {
        let layout = TargetLayout::new(PointerWidth::Bits32, Endianness::Big);
        assert_eq!(layout.pointer_size(), Size::from_bytes(4));
        assert!(!layout.is_64_bit());
        assert!(!layout.is_little_endian());

        let layout = TargetLayout::host_default();
        assert_eq!(layout.pointer_size(), Size::from_bytes(8));
        assert_eq!(layout.pointer_align().bytes(), 8);
    }
}
