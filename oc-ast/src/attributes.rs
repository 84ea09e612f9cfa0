//! The attribute bitset: the vocabulary of the type system (spec.md §3).
//!
//! Grounded on `typecheck.cpp`'s `attr_names` table and the `PRIMITIVE` /
//! `REFERENCE` / `ANY` / `BASE` macros, re-expressed with the `bitflags`
//! crate (the idiom the llvm-bitcode-rs example in the retrieval pack uses
//! for its own bit-per-flag header fields; the teacher itself hand-rolls
//! no equivalent bitset, so this crate is adopted from the wider pack
//! rather than from meftunca-vex -- see DESIGN.md).

use bitflags::bitflags;
use std::fmt;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attributes: u32 {
        const VOID     = 1 << 0;
        const BOOL     = 1 << 1;
        const CHAR     = 1 << 2;
        const INT      = 1 << 3;
        const NULL     = 1 << 4;
        const STRING   = 1 << 5;
        const STRUCT   = 1 << 6;
        const ARRAY    = 1 << 7;
        const FUNCTION = 1 << 8;
        const VARIABLE = 1 << 9;
        const FIELD    = 1 << 10;
        const TYPEID   = 1 << 11;
        const PARAM    = 1 << 12;
        const LVAL     = 1 << 13;
        const CONST    = 1 << 14;
        const VREG     = 1 << 15;
        const VADDR    = 1 << 16;
    }
}

/// Names in attribute-table order, used for dump formatting (spec.md §6:
/// "Attributes are printed in fixed order from the attribute enum").
pub const ATTR_NAMES: [(Attributes, &str); 17] = [
    (Attributes::VOID, "void"),
    (Attributes::BOOL, "bool"),
    (Attributes::CHAR, "char"),
    (Attributes::INT, "int"),
    (Attributes::NULL, "null"),
    (Attributes::STRING, "string"),
    (Attributes::STRUCT, "struct"),
    (Attributes::ARRAY, "array"),
    (Attributes::FUNCTION, "function"),
    (Attributes::VARIABLE, "variable"),
    (Attributes::FIELD, "field"),
    (Attributes::TYPEID, "typeid"),
    (Attributes::PARAM, "param"),
    (Attributes::LVAL, "lval"),
    (Attributes::CONST, "const"),
    (Attributes::VREG, "vreg"),
    (Attributes::VADDR, "vaddr"),
];

impl Attributes {
    pub const PRIMITIVE: Attributes =
        Attributes::INT.union(Attributes::CHAR).union(Attributes::BOOL);

    pub const REFERENCE: Attributes = Attributes::STRING
        .union(Attributes::ARRAY)
        .union(Attributes::STRUCT)
        .union(Attributes::NULL);

    pub const ANY: Attributes = Attributes::PRIMITIVE.union(Attributes::REFERENCE);

    pub const BASE: Attributes =
        Attributes::PRIMITIVE.union(Attributes::STRUCT).union(Attributes::STRING);

    /// Two attribute sets are compatible iff their `ANY`-masked
    /// projections are equal, or one side has some `REFERENCE` bit and
    /// the other is exactly `null` (spec.md §4.2's compatibility
    /// relation).
    pub fn compatible(self, other: Attributes) -> bool {
        if (self & Attributes::ANY) == (other & Attributes::ANY) {
            return true;
        }
        let self_is_reference = self.intersects(Attributes::REFERENCE);
        let other_is_reference = other.intersects(Attributes::REFERENCE);
        (self_is_reference && other.contains(Attributes::NULL))
            || (other_is_reference && self.contains(Attributes::NULL))
    }

    /// The base-type bit set on this attribute set, if exactly one is
    /// present (spec.md's "attribute exclusivity" invariant).
    pub fn base_kind(self) -> Option<Attributes> {
        const BASE_BITS: [Attributes; 7] = [
            Attributes::VOID,
            Attributes::BOOL,
            Attributes::CHAR,
            Attributes::INT,
            Attributes::NULL,
            Attributes::STRING,
            Attributes::STRUCT,
        ];
        let mut found = None;
        for bit in BASE_BITS {
            if self.contains(bit) {
                if found.is_some() {
                    return None;
                }
                found = Some(bit);
            }
        }
        found
    }
}

/// Renders attributes in fixed table order, space-separated, matching
/// `typecheck.cpp`'s `attrs_string`. A `struct` bit additionally carries
/// its type name quoted after the keyword (`__typeid_attrs_string`),
/// which callers append themselves since the type name lives on the AST
/// node, not the bitset.
impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (bit, name) in ATTR_NAMES {
            if self.contains(bit) {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{name}")?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_is_compatible_with_reference() {
        assert!(Attributes::NULL.compatible(Attributes::STRUCT));
        assert!(Attributes::STRING.compatible(Attributes::NULL));
    }

    #[test]
    fn primitives_are_not_cross_compatible() {
        assert!(!Attributes::INT.compatible(Attributes::CHAR));
        assert!(Attributes::INT.compatible(Attributes::INT));
    }

    #[test]
    fn display_is_fixed_order() {
        let attrs = Attributes::LVAL | Attributes::INT | Attributes::VARIABLE;
        assert_eq!(attrs.to_string(), "int variable lval");
    }

    #[test]
    fn base_kind_requires_exclusivity() {
        assert_eq!(Attributes::INT.base_kind(), Some(Attributes::INT));
        assert_eq!((Attributes::INT | Attributes::CHAR).base_kind(), None);
        assert_eq!(Attributes::LVAL.base_kind(), None);
    }
}
