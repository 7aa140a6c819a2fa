//! The warning taxonomy of the compile-time checks.
//!
//! Every `create_*_check` builder in `orec_codegen` is gated on one of these
//! kinds: when the kind is disabled in the [`WarningConfig`], the builder
//! emits no instruction at all and the evaluation runs unchecked.

/// A runtime-diagnosable condition the front-end can switch on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningKind {
    IntOverflow,
    IntDivideByZero,
    FloatOverflow,
    FloatDivideByZero,
    NanCompare,
    MathDomainError,
    NullPointerDereference,
    OutOfBoundsIndex,
    PointerArithmetic,
    BadSliceConstruction,
    UnusedValue,
}

pub struct WarningInfo {
    pub kind: WarningKind,
    pub name: &'static str,
    pub description: &'static str,
}

/// All known warnings, ordered by kind.
pub const WARNING_INFOS: &[WarningInfo] = &[
    WarningInfo {
        kind: WarningKind::IntOverflow,
        name: "int-overflow",
        description: "Integer overflow in constant expression",
    },
    WarningInfo {
        kind: WarningKind::IntDivideByZero,
        name: "int-divide-by-zero",
        description: "Integer division by zero in constant expression",
    },
    WarningInfo {
        kind: WarningKind::FloatOverflow,
        name: "float-overflow",
        description: "Floating-point inf or NaN result in constant expression",
    },
    WarningInfo {
        kind: WarningKind::FloatDivideByZero,
        name: "float-divide-by-zero",
        description: "Floating-point division by zero in constant expression",
    },
    WarningInfo {
        kind: WarningKind::NanCompare,
        name: "nan-compare",
        description: "Floating-point comparison with a NaN operand",
    },
    WarningInfo {
        kind: WarningKind::MathDomainError,
        name: "math-domain-error",
        description: "Math intrinsic evaluated outside its domain",
    },
    WarningInfo {
        kind: WarningKind::NullPointerDereference,
        name: "null-pointer-dereference",
        description: "The dereferenced pointer is null",
    },
    WarningInfo {
        kind: WarningKind::OutOfBoundsIndex,
        name: "out-of-bounds-index",
        description: "Array subscript outside the array bounds",
    },
    WarningInfo {
        kind: WarningKind::PointerArithmetic,
        name: "pointer-arithmetic",
        description: "Pointer arithmetic leaving the underlying object",
    },
    WarningInfo {
        kind: WarningKind::BadSliceConstruction,
        name: "bad-slice-construction",
        description: "Slice constructed from pointers that do not delimit one object",
    },
    WarningInfo {
        kind: WarningKind::UnusedValue,
        name: "unused-value",
        description: "Value of expression is never used and expression has no side-effects",
    },
];

impl WarningKind {
    pub fn name(self) -> &'static str {
        WARNING_INFOS[self as usize].name
    }

    pub fn from_name(name: &str) -> Option<WarningKind> {
        WARNING_INFOS
            .iter()
            .find(|info| info.name == name)
            .map(|info| info.kind)
    }
}

/// The set of enabled warnings, consulted by the check builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningConfig {
    enabled: u32,
}

impl WarningConfig {
    /// Every warning enabled. The default for compile-time evaluation.
    pub const fn all() -> Self {
        WarningConfig {
            enabled: (1 << WARNING_INFOS.len()) - 1,
        }
    }

    pub const fn none() -> Self {
        WarningConfig { enabled: 0 }
    }

    #[must_use]
    pub const fn with(self, kind: WarningKind) -> Self {
        WarningConfig {
            enabled: self.enabled | (1 << kind as u32),
        }
    }

    #[must_use]
    pub const fn without(self, kind: WarningKind) -> Self {
        WarningConfig {
            enabled: self.enabled & !(1 << kind as u32),
        }
    }

    #[inline]
    pub const fn is_enabled(&self, kind: WarningKind) -> bool {
        self.enabled & (1 << kind as u32) != 0
    }
}

impl Default for WarningConfig {
    fn default() -> Self {
        WarningConfig::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infos_are_ordered_by_kind() {
        for (i, info) in WARNING_INFOS.iter().enumerate() {
            assert_eq!(info.kind as usize, i);
        }
    }

    #[test]
    fn name_lookup() {
        assert_eq!(
            WarningKind::from_name("int-overflow"),
            Some(WarningKind::IntOverflow)
        );
        assert_eq!(WarningKind::OutOfBoundsIndex.name(), "out-of-bounds-index");
        assert_eq!(WarningKind::from_name("no-such-warning"), None);
    }

    #[test]
    fn config_toggles() {
        let config = WarningConfig::all().without(WarningKind::NanCompare);
        assert!(config.is_enabled(WarningKind::IntOverflow));
        assert!(!config.is_enabled(WarningKind::NanCompare));
        assert!(config.with(WarningKind::NanCompare).is_enabled(WarningKind::NanCompare));
    }
}
