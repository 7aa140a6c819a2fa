//! Object-shape queries shared by the global, stack and heap managers.

use orec_ir::ty::{TypeIdx, TypeKind, TypeSet};

/// Whether an access of type `access` at byte `offset` into an object of
/// type `object` reads or writes exactly one subobject of that type.
///
/// This is the layout-compatibility rule for loads and stores: the access
/// must coincide with a scalar, pointer, array or aggregate member reachable
/// by recursive decomposition, never straddle two of them.
pub fn is_valid_access(type_set: &TypeSet, object: TypeIdx, offset: u64, access: TypeIdx) -> bool {
    if offset == 0 && object == access {
        return true;
    }
    if offset >= type_set.size_of(object).bytes().max(1) {
        return false;
    }

    match type_set.kind(object) {
        TypeKind::Builtin(_) | TypeKind::Pointer => false,
        TypeKind::Array { elem, .. } => {
            let stride = type_set.size_of(*elem).bytes();
            if stride == 0 {
                return false;
            }
            is_valid_access(type_set, *elem, offset % stride, access)
        }
        TypeKind::Aggregate { members, offsets } => {
            // Padding bytes belong to no member. Zero-sized members may
            // share their offset with the next member, so keep looking on a
            // failed candidate.
            for (member, member_offset) in members.iter().zip(offsets) {
                let size = type_set.size_of(*member).bytes();
                if offset >= *member_offset
                    && offset < member_offset + size.max(1)
                    && is_valid_access(type_set, *member, offset - member_offset, access)
                {
                    return true;
                }
            }
            false
        }
    }
}

/// Whether `[begin_offset, end_offset)` inside an object of type `object`
/// is a contiguous run of `elem`-typed subobjects. Used by slice
/// construction checks.
pub fn is_valid_elem_range(
    type_set: &TypeSet,
    object: TypeIdx,
    begin_offset: u64,
    end_offset: u64,
    elem: TypeIdx,
) -> bool {
    let stride = type_set.size_of(elem).bytes();
    if begin_offset == end_offset {
        return true;
    }
    if stride == 0 || (end_offset - begin_offset) % stride != 0 {
        return false;
    }
    let mut offset = begin_offset;
    while offset < end_offset {
        if !is_valid_access(type_set, object, offset, elem) {
            return false;
        }
        offset += stride;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use orec_abi::target::TargetLayout;
    use orec_ir::ty::BuiltinKind;

    fn set() -> TypeSet {
        TypeSet::new(TargetLayout::host_default())
    }

    #[test]
    fn scalar_access() {
        let set = set();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let i8_t = set.builtin_type(BuiltinKind::I8);
        assert!(is_valid_access(&set, i32_t, 0, i32_t));
        assert!(!is_valid_access(&set, i32_t, 0, i8_t));
        assert!(!is_valid_access(&set, i32_t, 1, i32_t));
    }

    #[test]
    fn array_access() {
        let mut set = set();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let arr = set.array_type(i32_t, 3);
        assert!(is_valid_access(&set, arr, 0, i32_t));
        assert!(is_valid_access(&set, arr, 8, i32_t));
        assert!(!is_valid_access(&set, arr, 12, i32_t));
        assert!(!is_valid_access(&set, arr, 2, i32_t));
    }

    #[test]
    fn aggregate_access_respects_padding() {
        let mut set = set();
        let i8_t = set.builtin_type(BuiltinKind::I8);
        let i32_t = set.builtin_type(BuiltinKind::I32);
        // { i8, i32 } -> offsets 0, 4; bytes 1..4 are padding
        let agg = set.aggregate_type(&[i8_t, i32_t]);
        assert!(is_valid_access(&set, agg, 0, i8_t));
        assert!(is_valid_access(&set, agg, 4, i32_t));
        assert!(!is_valid_access(&set, agg, 2, i8_t));
        assert!(!is_valid_access(&set, agg, 4, i8_t));
    }

    #[test]
    fn nested_access() {
        let mut set = set();
        let i16_t = set.builtin_type(BuiltinKind::I16);
        let inner = set.aggregate_type(&[i16_t, i16_t]);
        let arr = set.array_type(inner, 2);
        assert!(is_valid_access(&set, arr, 6, i16_t));
        assert!(is_valid_access(&set, arr, 4, inner));
        assert!(!is_valid_access(&set, arr, 3, i16_t));
    }

    #[test]
    fn elem_ranges() {
        let mut set = set();
        let i32_t = set.builtin_type(BuiltinKind::I32);
        let arr = set.array_type(i32_t, 4);
        assert!(is_valid_elem_range(&set, arr, 0, 16, i32_t));
        assert!(is_valid_elem_range(&set, arr, 4, 12, i32_t));
        assert!(is_valid_elem_range(&set, arr, 8, 8, i32_t));
        assert!(!is_valid_elem_range(&set, arr, 2, 10, i32_t));
    }
}
