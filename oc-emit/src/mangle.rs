//! OIL name mangling (spec.md §4.3, grounded on `emit.cpp`'s `mangle_name`).
//!
//! Globals keep their source name prefixed `__`; locals are disambiguated
//! by the block they were declared in (`_{block}_{name}`), since two
//! different blocks may declare the same identifier; fields are qualified
//! by their owning struct (`f_{Struct}_{field}`) because OIL lowers struct
//! types to a flat `struct s_T` with C field names of its own.
//!
//! `emit.cpp` builds the callee name at a call site via ad hoc
//! `"__" + lexinfo` string concatenation instead of going through
//! `mangle_name`, which silently breaks the moment a called function is
//! not at global scope (impossible in this language, but only by
//! accident: nothing in the grammar enforces it). Every mangled name in
//! this crate -- declarator, field, and call callee alike -- goes through
//! `mangle_symbol` (see DESIGN.md).

use oc_ast::{Ast, SymbolId, SCOPE_GLOBAL};

pub fn mangle_symbol(ast: &Ast, sym: SymbolId) -> String {
    let symbol = ast.symbol(sym);
    if symbol.is_field() {
        let owner = symbol
            .owning_struct
            .expect("a field symbol always carries its owning struct (set by oc-sema's declare_field)");
        format!("f_{}_{}", ast.symbol(owner).name, symbol.name)
    } else if symbol.block == SCOPE_GLOBAL {
        format!("__{}", symbol.name)
    } else {
        format!("_{}_{}", symbol.block, symbol.name)
    }
}

/// The declarator leaf of a type-spine node: `children[1]` for `Array`
/// (`BaseType, DeclId`), `children[0]` otherwise (`BaseType -> DeclId` or
/// `BaseType -> Field`). Duplicated in `oc-parser` and `oc-sema` rather
/// than shared, matching how `emit.cpp` itself repeats this same
/// three-line shape ad hoc at each of its call sites instead of factoring
/// out a helper.
pub fn declarator_of(ast: &Ast, type_spine: oc_ast::NodeId) -> oc_ast::NodeId {
    let node = ast.node(type_spine);
    if node.kind == oc_ast::NodeKind::Array {
        node.children[1]
    } else {
        node.children[0]
    }
}
