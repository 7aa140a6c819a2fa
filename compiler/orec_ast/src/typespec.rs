//! Source-level types, fully resolved.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntKind {
    pub const fn is_signed(self) -> bool {
        matches!(self, IntKind::I8 | IntKind::I16 | IntKind::I32 | IntKind::I64)
    }

    pub const fn bit_width(self) -> u32 {
        match self {
            IntKind::I8 | IntKind::U8 => 8,
            IntKind::I16 | IntKind::U16 => 16,
            IntKind::I32 | IntKind::U32 => 32,
            IntKind::I64 | IntKind::U64 => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

/// A resolved type as the front-end sees it. Codegen maps these onto the
/// IR's object-layout descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    /// The unit type; an empty aggregate in the IR.
    Unit,
    Bool,
    Int(IntKind),
    Float(FloatKind),
    /// A Unicode code point, stored as `i32`.
    Char,
    /// A UTF-8 string view: a (begin, one-past-end) pointer pair.
    Str,
    Pointer(Box<TypeSpec>),
    /// `optional<T>`; pointer payloads are represented as a nullable
    /// pointer, everything else as the payload plus an `i1` flag.
    Optional(Box<TypeSpec>),
    Array(u64, Box<TypeSpec>),
    Slice(Box<TypeSpec>),
    Tuple(Vec<TypeSpec>),
    /// An enum with the given underlying integer type.
    Enum { underlying: IntKind },
}

impl TypeSpec {
    pub fn pointer(pointee: TypeSpec) -> TypeSpec {
        TypeSpec::Pointer(Box::new(pointee))
    }

    pub fn optional(payload: TypeSpec) -> TypeSpec {
        TypeSpec::Optional(Box::new(payload))
    }

    pub fn array(len: u64, elem: TypeSpec) -> TypeSpec {
        TypeSpec::Array(len, Box::new(elem))
    }

    pub fn slice(elem: TypeSpec) -> TypeSpec {
        TypeSpec::Slice(Box::new(elem))
    }

    pub fn is_signed_int(&self) -> bool {
        matches!(self, TypeSpec::Int(kind) if kind.is_signed())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, TypeSpec::Int(_) | TypeSpec::Enum { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, TypeSpec::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeSpec::Pointer(_))
    }

    /// The integer kind of ints, chars and enums.
    pub fn int_kind(&self) -> Option<IntKind> {
        match self {
            TypeSpec::Int(kind) => Some(*kind),
            TypeSpec::Enum { underlying } => Some(*underlying),
            TypeSpec::Char => Some(IntKind::U32),
            _ => None,
        }
    }
}
