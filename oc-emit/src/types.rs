//! OIL type-string synthesis and register-category selection (spec.md
//! §4.3, grounded on `emit.cpp`'s `get_result_type_name` and
//! `get_reg_category`).

use oc_ast::{Ast, Attributes, NodeId, NodeKind};

/// The C type text a node's value occupies in the emitted OIL, given the
/// node's already-synthesized attributes (spec.md §4.2 runs before §4.3,
/// so every node reaching the emitter carries a resolved base-type bit).
///
/// `bool` collapses to `char` (the source language has no boolean C
/// type); `string` becomes `char*`; a user struct becomes a pointer to an
/// OIL-side `struct s_T`; an `array` bit appends one more `*`; and a
/// field-select (`.`) node appends a second, independent `*` because its
/// value is always an address, never loaded.
pub fn result_type_name(ast: &Ast, node: NodeId) -> String {
    let attrs = ast.effective_attributes(node);
    let mut text = if attrs.contains(Attributes::BOOL) {
        "char".to_string()
    } else if attrs.contains(Attributes::CHAR) {
        "char".to_string()
    } else if attrs.contains(Attributes::INT) {
        "int".to_string()
    } else if attrs.contains(Attributes::STRING) {
        "char*".to_string()
    } else if attrs.contains(Attributes::STRUCT) {
        let type_name = ast
            .effective_type_name(node)
            .expect("a struct-typed node always carries its struct's name by the time it reaches emission");
        format!("struct s_{type_name}*")
    } else if attrs.contains(Attributes::VOID) {
        "void".to_string()
    } else {
        unreachable!("result_type_name called on a node with no base-type bit: {:?}", ast.node(node).kind)
    };
    if attrs.contains(Attributes::ARRAY) {
        text.push('*');
    }
    if ast.node(node).kind == NodeKind::FieldSelect {
        text.push('*');
    }
    text
}

/// The one-letter prefix a fresh temporary's name is built from: `i` for
/// int-typed results, `b` for bool, `c` for char, `p` for anything
/// pointer-shaped (string/struct/array-valued calls, `new`). Indexing and
/// field-select use a distinct, fixed `a` (address) prefix regardless of
/// the element type, handled by their own lowering functions rather than
/// through this table.
pub fn register_category(attrs: Attributes) -> &'static str {
    if attrs.contains(Attributes::BOOL) {
        "b"
    } else if attrs.contains(Attributes::CHAR) {
        "c"
    } else if attrs.contains(Attributes::INT) {
        "i"
    } else {
        "p"
    }
}
