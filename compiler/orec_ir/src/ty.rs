//! The content-addressed store of object-layout descriptors.
//!
//! Every type handle is a dense [`TypeIdx`] into one [`TypeSet`]; interning
//! guarantees that structural equality coincides with index equality, so
//! type comparison anywhere else in the compiler is a `u32` compare. Sizes,
//! alignments and aggregate member offsets are computed once, at interning.

use orec_abi::size_and_align::{Align, Size};
use orec_abi::target::TargetLayout;
use orec_utils::newtype_index;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::value::ValueType;

newtype_index!(
    /// A handle to an interned type. Stable for the whole compilation.
    pub struct TypeIdx
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinKind {
    /// A 1-bit boolean, stored in 1 byte.
    I1,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Void,
}

impl BuiltinKind {
    pub const ALL: [BuiltinKind; 8] = [
        BuiltinKind::I1,
        BuiltinKind::I8,
        BuiltinKind::I16,
        BuiltinKind::I32,
        BuiltinKind::I64,
        BuiltinKind::F32,
        BuiltinKind::F64,
        BuiltinKind::Void,
    ];

    pub const fn size(self) -> Size {
        Size::from_bytes(match self {
            BuiltinKind::I1 | BuiltinKind::I8 => 1,
            BuiltinKind::I16 => 2,
            BuiltinKind::I32 | BuiltinKind::F32 => 4,
            BuiltinKind::I64 | BuiltinKind::F64 => 8,
            BuiltinKind::Void => 0,
        })
    }

    pub fn align(self) -> Align {
        let bytes = self.size().bytes().max(1);
        Align::from_bytes(bytes).unwrap()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Builtin(BuiltinKind),
    /// The single machine pointer type; its width comes from the target.
    Pointer,
    Array {
        elem: TypeIdx,
        len: u64,
    },
    Aggregate {
        members: Vec<TypeIdx>,
        /// Byte offset of each member, padded to its alignment.
        offsets: Vec<u64>,
    },
}

/// An interned type with its precomputed layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeData {
    pub kind: TypeKind,
    pub size: Size,
    pub align: Align,
}

/// Hash-consing key; `Aggregate` offsets are derived, so they are not part
/// of the identity.
#[derive(PartialEq, Eq, Hash)]
enum TypeKey {
    Array(TypeIdx, u64),
    Aggregate(Vec<TypeIdx>),
}

/// Interns object-layout descriptors (builtin scalars, the pointer type,
/// arrays and aggregates) and owns their layout.
pub struct TypeSet {
    target: TargetLayout,
    types: Vec<TypeData>,
    builtins: [TypeIdx; 8],
    pointer: TypeIdx,
    pointer_pair: TypeIdx,
    null: TypeIdx,
    interned: FxHashMap<TypeKey, TypeIdx>,
}

impl TypeSet {
    pub fn new(target: TargetLayout) -> Self {
        let mut set = TypeSet {
            target,
            types: Vec::new(),
            builtins: [TypeIdx::from_u32(0); 8],
            pointer: TypeIdx::from_u32(0),
            pointer_pair: TypeIdx::from_u32(0),
            null: TypeIdx::from_u32(0),
            interned: FxHashMap::default(),
        };

        for (i, kind) in BuiltinKind::ALL.into_iter().enumerate() {
            set.builtins[i] = set.push(TypeData {
                kind: TypeKind::Builtin(kind),
                size: kind.size(),
                align: kind.align(),
            });
        }
        set.pointer = set.push(TypeData {
            kind: TypeKind::Pointer,
            size: target.pointer_size(),
            align: target.pointer_align(),
        });
        let pointer = set.pointer;
        set.pointer_pair = set.aggregate_type(&[pointer, pointer]);
        set.null = set.aggregate_type(&[]);
        set
    }

    fn push(&mut self, data: TypeData) -> TypeIdx {
        let idx = TypeIdx::from_u32(self.types.len() as u32);
        trace!(?idx, ?data.kind, "interned type");
        self.types.push(data);
        idx
    }

    pub fn target(&self) -> &TargetLayout {
        &self.target
    }

    pub fn builtin_type(&self, kind: BuiltinKind) -> TypeIdx {
        self.builtins[kind as usize]
    }

    pub fn pointer_type(&self) -> TypeIdx {
        self.pointer
    }

    /// `str` and slices are a (begin, one-past-end) pointer pair.
    pub fn str_type(&self) -> TypeIdx {
        self.pointer_pair
    }

    pub fn slice_type(&self) -> TypeIdx {
        self.pointer_pair
    }

    /// The empty aggregate, the object type of `null` and of unit values.
    pub fn null_type(&self) -> TypeIdx {
        self.null
    }

    pub fn array_type(&mut self, elem: TypeIdx, len: u64) -> TypeIdx {
        if let Some(&idx) = self.interned.get(&TypeKey::Array(elem, len)) {
            return idx;
        }
        let elem_data = &self.types[elem.as_usize()];
        // An array of more than 2^63 bytes cannot exist; this is validated
        // during semantic analysis, so overflow here is a compiler bug.
        let size = elem_data
            .size
            .checked_mul(len)
            .expect("array byte size overflows the address space");
        let align = elem_data.align;
        let idx = self.push(TypeData {
            kind: TypeKind::Array { elem, len },
            size,
            align,
        });
        self.interned.insert(TypeKey::Array(elem, len), idx);
        idx
    }

    /// Interns an aggregate with naturally aligned, padded member layout.
    pub fn aggregate_type(&mut self, members: &[TypeIdx]) -> TypeIdx {
        if let Some(&idx) = self.interned.get(&TypeKey::Aggregate(members.to_vec())) {
            return idx;
        }

        let mut offsets = Vec::with_capacity(members.len());
        let mut offset = 0u64;
        let mut align = Align::ONE;
        for &member in members {
            let member_data = &self.types[member.as_usize()];
            offset = member_data.align.align_up(offset);
            offsets.push(offset);
            offset += member_data.size.bytes();
            align = align.max(member_data.align);
        }
        let size = Size::from_bytes(align.align_up(offset));

        let idx = self.push(TypeData {
            kind: TypeKind::Aggregate {
                members: members.to_vec(),
                offsets,
            },
            size,
            align,
        });
        self.interned.insert(TypeKey::Aggregate(members.to_vec()), idx);
        idx
    }

    /// `optional<T>` is an aggregate of the value and an `i1` flag.
    /// Pointer-like optionals are bare pointers and never reach this.
    pub fn optional_type(&mut self, value_type: TypeIdx) -> TypeIdx {
        let flag = self.builtin_type(BuiltinKind::I1);
        self.aggregate_type(&[value_type, flag])
    }

    pub fn type_data(&self, idx: TypeIdx) -> &TypeData {
        &self.types[idx.as_usize()]
    }

    pub fn kind(&self, idx: TypeIdx) -> &TypeKind {
        &self.types[idx.as_usize()].kind
    }

    pub fn size_of(&self, idx: TypeIdx) -> Size {
        self.types[idx.as_usize()].size
    }

    pub fn align_of(&self, idx: TypeIdx) -> Align {
        self.types[idx.as_usize()].align
    }

    pub fn is_builtin(&self, idx: TypeIdx, kind: BuiltinKind) -> bool {
        matches!(self.kind(idx), TypeKind::Builtin(k) if *k == kind)
    }

    pub fn is_pointer(&self, idx: TypeIdx) -> bool {
        matches!(self.kind(idx), TypeKind::Pointer)
    }

    /// The value type of loads from and stores to an object of this type.
    /// Arrays and aggregates are memory-only and have no value type.
    pub fn value_type_of(&self, idx: TypeIdx) -> ValueType {
        match self.kind(idx) {
            TypeKind::Builtin(BuiltinKind::I1) => ValueType::I1,
            TypeKind::Builtin(BuiltinKind::I8) => ValueType::I8,
            TypeKind::Builtin(BuiltinKind::I16) => ValueType::I16,
            TypeKind::Builtin(BuiltinKind::I32) => ValueType::I32,
            TypeKind::Builtin(BuiltinKind::I64) => ValueType::I64,
            TypeKind::Builtin(BuiltinKind::F32) => ValueType::F32,
            TypeKind::Builtin(BuiltinKind::F64) => ValueType::F64,
            TypeKind::Builtin(BuiltinKind::Void) => ValueType::None,
            TypeKind::Pointer => ValueType::Ptr,
            TypeKind::Array { .. } | TypeKind::Aggregate { .. } => ValueType::None,
        }
    }

    /// Whether values of this type travel through instruction value slots
    /// (scalars and pointers) rather than through memory.
    pub fn is_simple_value_type(&self, idx: TypeIdx) -> bool {
        !matches!(self.value_type_of(idx), ValueType::None)
    }

    pub fn aggregate_members(&self, idx: TypeIdx) -> (&[TypeIdx], &[u64]) {
        match self.kind(idx) {
            TypeKind::Aggregate { members, offsets } => (members, offsets),
            _ => panic!("aggregate_members on non-aggregate type {:?}", idx),
        }
    }

    pub fn array_parts(&self, idx: TypeIdx) -> (TypeIdx, u64) {
        match self.kind(idx) {
            TypeKind::Array { elem, len } => (*elem, *len),
            _ => panic!("array_parts on non-array type {:?}", idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::{Endianness, PointerWidth};

    fn set_64() -> TypeSet {
        TypeSet::new(TargetLayout::new(PointerWidth::Bits64, Endianness::Little))
    }

    #[test]
    fn interning_is_identity() {
        let mut set = set_64();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let a = set.array_type(i32_t, 4);
        let b = set.array_type(i32_t, 4);
        assert_eq!(a, b);
        let c = set.array_type(i32_t, 5);
        assert_ne!(a, c);

        let agg_a = set.aggregate_type(&[i32_t, i32_t]);
        let agg_b = set.aggregate_type(&[i32_t, i32_t]);
        assert_eq!(agg_a, agg_b);
    }

    #[test]
    fn aggregate_layout_pads_members() {
        let mut set = set_64();
        let i8_t = set.builtin_type(BuiltinKind::I8);
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let i64_t = set.builtin_type(BuiltinKind::I64);

        // { i8, i32, i8, i64 } -> offsets 0, 4, 8, 16; size 24; align 8
        let agg = set.aggregate_type(&[i8_t, i32_t, i8_t, i64_t]);
        let (_, offsets) = set.aggregate_members(agg);
        assert_eq!(offsets, &[0, 4, 8, 16]);
        assert_eq!(set.size_of(agg).bytes(), 24);
        assert_eq!(set.align_of(agg).bytes(), 8);
    }

    #[test]
    fn empty_aggregate_is_null_type() {
        let mut set = set_64();
        let null = set.null_type();
        assert_eq!(set.size_of(null).bytes(), 0);
        assert_eq!(set.aggregate_type(&[]), null);
    }

    #[test]
    fn pointer_pair_matches_target_width() {
        let set = set_64();
        assert_eq!(set.size_of(set.str_type()).bytes(), 16);

        let set32 = TypeSet::new(TargetLayout::new(PointerWidth::Bits32, Endianness::Big));
        assert_eq!(set32.size_of(set32.str_type()).bytes(), 8);
    }

    #[test]
    fn optional_layout() {
        let mut set = set_64();
        let i64_t = set.builtin_type(BuiltinKind::I64);
        let opt = set.optional_type(i64_t);
        let (members, offsets) = set.aggregate_members(opt);
        assert_eq!(members.len(), 2);
        assert_eq!(offsets, &[0, 8]);
        assert_eq!(set.size_of(opt).bytes(), 16);
    }

    #[test]
    fn array_size() {
        let mut set = set_64();
        let i16_t = set.builtin_type(BuiltinKind::I16);
        let arr = set.array_type(i16_t, 7);
        assert_eq!(set.size_of(arr).bytes(), 14);
        assert_eq!(set.align_of(arr).bytes(), 2);
    }
}
