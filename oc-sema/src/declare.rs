//! Declaration processing (spec.md §4.1): type-spine attribute synthesis,
//! the `declare` operation, struct/field handling, function/prototype
//! handling, and `.` field resolution. Grounded on `symbol.cpp`'s
//! `symbolize_declaration`/`node_generate_attributes` and `semantics.cpp`'s
//! `handle_structure`/`handle_function`.

use oc_ast::{Ast, Attributes, NodeId, NodeKind, Symbol, SymbolId, SymbolTable, SCOPE_GLOBAL};
use oc_diagnostics::{Diagnostic, DiagnosticEngine};

use crate::context::{attrs_with_type_name, AnalysisContext};

/// The declarator leaf at the bottom of a type-spine subtree: child 1 for
/// `Array`, child 0 otherwise (spec.md §4.1's "declaration shape").
pub fn decl_node_of(ast: &Ast, type_spine: NodeId) -> NodeId {
    let node = ast.node(type_spine);
    if node.kind == NodeKind::Array {
        node.children[1]
    } else {
        node.children[0]
    }
}

fn finalize_attrs(attrs: Attributes) -> Attributes {
    if attrs.intersects(Attributes::FUNCTION | Attributes::FIELD) {
        attrs
    } else {
        attrs | Attributes::VARIABLE
    }
}

/// Walks a type-spine subtree synthesizing its attribute set plus any
/// struct type name found along the way, `symbol.cpp`'s
/// `node_generate_attributes`. `seed` carries the context bits the caller
/// already knows (`FUNCTION` for a return type, `FIELD` for a struct
/// member, `PARAM` for a parameter, empty otherwise) so the void/variable
/// rules below can tell one declaration kind from another. Returns `None`
/// (having already reported a diagnostic) on a `void` array element or a
/// non-function `void` declaration.
pub fn synthesize_type_attributes(
    ast: &Ast,
    diags: &mut DiagnosticEngine,
    type_node: NodeId,
    seed: Attributes,
) -> Option<(Attributes, Option<String>)> {
    let node = ast.node(type_node);
    match node.kind {
        NodeKind::Array => {
            let attrs = seed | Attributes::ARRAY;
            let base = node.children[0];
            if ast.node(base).kind == NodeKind::TypeVoid {
                diags.error(node.loc, "cannot have void arrays");
                return None;
            }
            synthesize_type_attributes(ast, diags, base, attrs)
        }
        NodeKind::TypeId => Some((finalize_attrs(seed | Attributes::STRUCT), Some(node.lexeme.clone()))),
        NodeKind::TypeVoid => {
            if !seed.contains(Attributes::FUNCTION) {
                diags.error(node.loc, "cannot have void declarations");
                return None;
            }
            Some((finalize_attrs(seed | Attributes::VOID), None))
        }
        NodeKind::TypeInt => Some((finalize_attrs(seed | Attributes::INT), None)),
        NodeKind::TypeChar => Some((finalize_attrs(seed | Attributes::CHAR), None)),
        NodeKind::TypeBool => Some((finalize_attrs(seed | Attributes::BOOL), None)),
        NodeKind::TypeString => Some((finalize_attrs(seed | Attributes::STRING), None)),
        other => unreachable!("synthesize_type_attributes called on non-type node {other:?}"),
    }
}

/// `declare` for a plain variable/global/parameter declaration (spec.md
/// §4.1). Structs and functions have their own entry points below since
/// they target a different table and carry extra bookkeeping; this is the
/// generic case used both for a bare top-level/local declaration and,
/// with `seed = PARAM`, for each formal parameter.
pub fn declare_in_scope(
    ctx: &mut AnalysisContext,
    ast: &mut Ast,
    diags: &mut DiagnosticEngine,
    type_node: NodeId,
    seed: Attributes,
) -> Option<SymbolId> {
    let (attrs, type_name) = synthesize_type_attributes(ast, diags, type_node, seed)?;
    let attrs = attrs | Attributes::LVAL;
    let decl = decl_node_of(ast, type_node);
    let name = ast.node(decl).lexeme.clone();
    let loc = ast.node(decl).loc;
    let block = ctx.scopes.current_block();

    let existing = if block == SCOPE_GLOBAL {
        ctx.scopes.global_table().get(&name)
    } else {
        ctx.scopes.top_table().and_then(|t| t.get(&name))
    };
    if let Some(prev_id) = existing {
        let prev_loc = ast.symbol(prev_id).loc;
        diags.emit(
            Diagnostic::error(loc, format!("duplicate declaration of identifier '{name}'"))
                .with_note(format!("Previous declaration at {prev_loc}")),
        );
        return None;
    }

    let mut symbol = Symbol::new(name.clone(), loc, decl, attrs, block);
    symbol.type_name = type_name.clone();
    let id = ast.alloc_symbol(symbol);

    let table = if block == SCOPE_GLOBAL { ctx.scopes.global_table_mut() } else { ctx.scopes.top_table_mut() };
    table.insert(name.clone(), id);

    let decl_node = ast.node_mut(decl);
    decl_node.symbol = Some(id);
    decl_node.type_name = type_name.clone();
    decl_node.block = Some(block);

    let line = format!("{}{} ({}) {{{}}} {}", ctx.indent(), name, loc, block, attrs_with_type_name(attrs, type_name.as_deref()));
    ctx.push_symbol_line(&line);
    Some(id)
}

/// **Struct**: requires global scope and an unused typeid; creates the
/// typeid entry and field table, then declares each field into it with
/// seed `field` (spec.md §4.1's Struct traversal rule).
pub fn handle_struct(ctx: &mut AnalysisContext, ast: &mut Ast, diags: &mut DiagnosticEngine, struct_node: NodeId) {
    if ctx.scopes.current_block() != SCOPE_GLOBAL {
        diags.error(ast.node(struct_node).loc, "structure not in global scope");
        return;
    }
    let children = ast.node(struct_node).children.clone();
    let name_node = children[0];
    let name = ast.node(name_node).lexeme.clone();
    let loc = ast.node(name_node).loc;

    if let Some(prev_id) = ast.typeid_table.get(&name) {
        let prev_loc = ast.symbol(prev_id).loc;
        diags.emit(
            Diagnostic::error(loc, format!("typeid '{name}' is already defined"))
                .with_note(format!("Previous declaration at {prev_loc}")),
        );
        return;
    }

    let attrs = Attributes::STRUCT | Attributes::TYPEID;
    let mut symbol = Symbol::new(name.clone(), loc, struct_node, attrs, SCOPE_GLOBAL);
    symbol.type_name = Some(name.clone());
    symbol.fields = Some(SymbolTable::new());
    let struct_id = ast.alloc_symbol(symbol);
    ast.typeid_table.insert(name.clone(), struct_id);

    ast.node_mut(name_node).symbol = Some(struct_id);
    ast.node_mut(name_node).type_name = Some(name.clone());
    ast.node_mut(name_node).block = Some(SCOPE_GLOBAL);
    ast.node_mut(struct_node).block = Some(SCOPE_GLOBAL);

    let line = format!("{}{} ({}) {{{}}} {}", ctx.indent(), name, loc, SCOPE_GLOBAL, attrs_with_type_name(attrs, Some(&name)));
    ctx.push_symbol_line(&line);

    for &field_spine in &children[1..] {
        declare_field(ctx, ast, diags, field_spine, struct_id);
    }
    ctx.push_blank_line();
}

fn declare_field(ctx: &mut AnalysisContext, ast: &mut Ast, diags: &mut DiagnosticEngine, type_node: NodeId, struct_id: SymbolId) {
    let Some((attrs, type_name)) = synthesize_type_attributes(ast, diags, type_node, Attributes::FIELD) else {
        return;
    };
    let decl = decl_node_of(ast, type_node);
    let name = ast.node(decl).lexeme.clone();
    let loc = ast.node(decl).loc;

    let existing = ast.symbol(struct_id).fields.as_ref().and_then(|t| t.get(&name));
    if let Some(prev_id) = existing {
        let prev_loc = ast.symbol(prev_id).loc;
        diags.emit(
            Diagnostic::error(loc, format!("duplicate declaration of field '{name}'"))
                .with_note(format!("Previous declaration at {prev_loc}")),
        );
        return;
    }

    let mut symbol = Symbol::new(name.clone(), loc, decl, attrs, SCOPE_GLOBAL);
    symbol.type_name = type_name.clone();
    symbol.owning_struct = Some(struct_id);
    let field_id = ast.alloc_symbol(symbol);
    ast.symbol_mut(struct_id)
        .fields
        .as_mut()
        .expect("struct symbol always carries a field table")
        .insert(name.clone(), field_id);

    let decl_node = ast.node_mut(decl);
    decl_node.symbol = Some(field_id);
    decl_node.type_name = type_name.clone();

    let owner_name = ast.symbol(struct_id).name.clone();
    let attrs_str = attrs_with_type_name(attrs & !Attributes::FIELD, type_name.as_deref());
    let line = format!("{}   {} ({}) field {{{}}} {}", ctx.indent(), name, loc, owner_name, attrs_str);
    ctx.push_symbol_line(&line);
}

/// The outcome of successfully declaring a function or prototype header:
/// the symbol it resolved to (new, or the prototype it defines) and the
/// block number entered for its parameters. `oc-sema::traverse` recurses
/// into the body (if any) under this block, then leaves it.
pub struct FunctionHeader {
    pub func_id: SymbolId,
    pub block: u32,
}

/// **Function / Prototype**: requires global scope; reconciles against a
/// prior prototype if one exists (checked *before* the generic duplicate
/// path, fixing the source's ordering bug where that reconciliation was
/// otherwise unreachable -- see DESIGN.md); declares the parameter list
/// into a freshly entered block.
pub fn handle_function_header(
    ctx: &mut AnalysisContext,
    ast: &mut Ast,
    diags: &mut DiagnosticEngine,
    func_node: NodeId,
) -> Option<FunctionHeader> {
    if ctx.scopes.current_block() != SCOPE_GLOBAL {
        diags.error(ast.node(func_node).loc, "function not in global scope");
        return None;
    }
    let children = ast.node(func_node).children.clone();
    let type_spine = children[0];
    let params_node = children[1];

    let (ret_attrs, ret_type_name) = synthesize_type_attributes(ast, diags, type_spine, Attributes::FUNCTION)?;
    let decl = decl_node_of(ast, type_spine);
    let name = ast.node(decl).lexeme.clone();
    let loc = ast.node(decl).loc;
    let has_body = ast.node(func_node).kind == NodeKind::Function;

    let existing = ctx.scopes.global_table().get(&name);
    let prototype_match = match existing {
        Some(prev_id) if ast.symbol(prev_id).is_function() && ast.symbol(prev_id).fn_block.is_none() => Some(prev_id),
        _ => None,
    };
    let func_id = match existing {
        Some(prev_id) if prototype_match.is_some() => prev_id,
        Some(prev_id) => {
            let prev_loc = ast.symbol(prev_id).loc;
            diags.emit(
                Diagnostic::error(loc, format!("duplicate declaration of identifier '{name}'"))
                    .with_note(format!("Previous declaration at {prev_loc}")),
            );
            return None;
        }
        None => {
            let mut symbol = Symbol::new(name.clone(), loc, decl, ret_attrs, SCOPE_GLOBAL);
            symbol.type_name = ret_type_name.clone();
            let id = ast.alloc_symbol(symbol);
            ctx.scopes.global_table_mut().insert(name.clone(), id);
            id
        }
    };

    let indent = ctx.indent();
    let line = format!(
        "{indent}{} ({}) {{{}}} {}",
        name,
        loc,
        SCOPE_GLOBAL,
        attrs_with_type_name(ret_attrs, ret_type_name.as_deref())
    );
    ctx.push_symbol_line(&line);

    ast.node_mut(decl).symbol = Some(func_id);
    ast.node_mut(decl).type_name = ret_type_name.clone();
    ast.node_mut(decl).block = Some(SCOPE_GLOBAL);
    ast.node_mut(func_node).attributes = ret_attrs;
    ast.node_mut(func_node).type_name = ret_type_name;
    ast.node_mut(func_node).block = Some(SCOPE_GLOBAL);

    let block = ctx.scopes.enter_block();
    let param_children = ast.node(params_node).children.clone();
    let mut param_ids = Vec::with_capacity(param_children.len());
    for &param_spine in &param_children {
        if let Some(pid) = declare_in_scope(ctx, ast, diags, param_spine, Attributes::PARAM) {
            param_ids.push(pid);
        }
    }

    if let Some(prev_id) = prototype_match {
        if !signatures_match(ast, prev_id, ret_attrs, &ret_type_name, &param_ids) {
            diags.error(loc, format!("mismatched prototype for function '{name}'"));
            ctx.scopes.leave_block();
            return None;
        }
    }

    ast.symbol_mut(func_id).params = param_ids;
    ast.node_mut(params_node).block = Some(block);
    if has_body {
        ast.symbol_mut(func_id).fn_block = Some(children[2]);
    }

    // `handle_function`'s first trailing `fprintf(symfile, "\n")`: one
    // blank line after the parameter list, for both a prototype and a
    // defined function (spec.md §6's symbol-dump format).
    ctx.push_blank_line();

    Some(FunctionHeader { func_id, block })
}

/// spec.md §4.1 step 3's "compare signatures (return type and each
/// parameter's top-level type token; array-ness must agree)". Compares the
/// prior prototype's return type and stored parameter symbols against the
/// freshly declared header, masking each parameter's attributes down to
/// its top-level type token (`BASE | ARRAY`) so role bits like `param`/
/// `lval` never cause a spurious mismatch.
fn signatures_match(ast: &Ast, prev_id: SymbolId, ret_attrs: Attributes, ret_type_name: &Option<String>, new_params: &[SymbolId]) -> bool {
    let prev = ast.symbol(prev_id);
    if prev.attributes != ret_attrs || &prev.type_name != ret_type_name {
        return false;
    }
    if prev.params.len() != new_params.len() {
        return false;
    }
    let mask = Attributes::BASE | Attributes::ARRAY;
    prev.params.iter().zip(new_params.iter()).all(|(&old_pid, &new_pid)| {
        let old = ast.symbol(old_pid);
        let new = ast.symbol(new_pid);
        (old.attributes & mask) == (new.attributes & mask) && old.type_name == new.type_name
    })
}

/// `.` resolution (spec.md §4.1's `field_select`): the left child must
/// already carry a struct type-name; look it up in the typeid table, then
/// look the field name up in that struct's field table, binding both the
/// `.` use and the right child to the field's symbol. Leaves the node
/// unresolved (no panic) on any failure so `typecheck::handle_field_select`
/// can still report a precise diagnostic from the missing attributes.
pub fn resolve_field_select(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) {
    let children = ast.node(node).children.clone();
    let (obj, field) = (children[0], children[1]);
    let obj_attrs = ast.effective_attributes(obj);
    if !obj_attrs.contains(Attributes::STRUCT) {
        return;
    }
    let Some(type_name) = ast.effective_type_name(obj) else { return };
    let Some(struct_id) = ast.typeid_table.get(&type_name) else {
        diags.error(ast.node(obj).loc, format!("typeid '{type_name}' is not defined"));
        return;
    };
    let field_name = ast.node(field).lexeme.clone();
    let field_id = ast.symbol(struct_id).fields.as_ref().and_then(|t| t.get(&field_name));
    let Some(field_id) = field_id else {
        diags.error(ast.node(field).loc, format!("struct '{type_name}' has no field '{field_name}'"));
        return;
    };
    ast.node_mut(field).symbol = Some(field_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_diagnostics::SourceLoc;

    fn loc() -> SourceLoc {
        SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1)
    }

    fn int_decl(ast: &mut Ast, name: &str) -> NodeId {
        let ty = ast.alloc_node(NodeKind::TypeInt, loc(), "int");
        let decl = ast.alloc_node(NodeKind::DeclId, loc(), name);
        ast.adopt(ty, decl);
        ty
    }

    fn make_header(ast: &mut Ast, kind: NodeKind, name: &str, param_names: &[&str]) -> NodeId {
        let ret_ty = ast.alloc_node(NodeKind::TypeInt, loc(), "int");
        let fname = ast.alloc_node(NodeKind::DeclId, loc(), name);
        ast.adopt(ret_ty, fname);

        let params = ast.alloc_node(NodeKind::Params, loc(), "");
        for pname in param_names {
            let pty = ast.alloc_node(NodeKind::TypeInt, loc(), "int");
            let pdecl = ast.alloc_node(NodeKind::DeclId, loc(), *pname);
            ast.adopt(pty, pdecl);
            ast.adopt(params, pty);
        }

        let node = ast.alloc_node(kind, loc(), "");
        ast.adopt(node, ret_ty);
        ast.adopt(node, params);
        node
    }

    #[test]
    fn declares_global_variable_with_lval() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();
        let spine = int_decl(&mut ast, "x");

        let id = declare_in_scope(&mut ctx, &mut ast, &mut diags, spine, Attributes::empty()).expect("declares");
        assert!(!diags.has_errors());
        assert_eq!(ast.symbol(id).attributes, Attributes::INT | Attributes::VARIABLE | Attributes::LVAL);
    }

    #[test]
    fn duplicate_declaration_in_same_block_errors() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();
        let a = int_decl(&mut ast, "x");
        let b = int_decl(&mut ast, "x");

        assert!(declare_in_scope(&mut ctx, &mut ast, &mut diags, a, Attributes::empty()).is_some());
        assert!(declare_in_scope(&mut ctx, &mut ast, &mut diags, b, Attributes::empty()).is_none());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn void_variable_is_rejected() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();
        let ty = ast.alloc_node(NodeKind::TypeVoid, loc(), "void");
        let decl = ast.alloc_node(NodeKind::DeclId, loc(), "v");
        ast.adopt(ty, decl);

        assert!(declare_in_scope(&mut ctx, &mut ast, &mut diags, ty, Attributes::empty()).is_none());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn void_array_is_rejected() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();
        let base = ast.alloc_node(NodeKind::TypeVoid, loc(), "void");
        let array = ast.alloc_node(NodeKind::Array, loc(), "[]");
        let decl = ast.alloc_node(NodeKind::DeclId, loc(), "v");
        ast.adopt(array, base);
        ast.adopt(array, decl);

        assert!(declare_in_scope(&mut ctx, &mut ast, &mut diags, array, Attributes::empty()).is_none());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn struct_declares_typeid_and_fields() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();

        let name = ast.alloc_node(NodeKind::TypeId, loc(), "S");
        let strukt = ast.alloc_node(NodeKind::Struct, loc(), "struct");
        ast.adopt(strukt, name);
        let field_ty = ast.alloc_node(NodeKind::TypeInt, loc(), "int");
        let field_decl = ast.alloc_node(NodeKind::Field, loc(), "x");
        ast.adopt(field_ty, field_decl);
        ast.adopt(strukt, field_ty);

        handle_struct(&mut ctx, &mut ast, &mut diags, strukt);
        assert!(!diags.has_errors());
        let struct_id = ast.typeid_table.get("S").expect("typeid registered");
        assert!(ast.symbol(struct_id).attributes.contains(Attributes::STRUCT));
        let field_id = ast.symbol(struct_id).fields.as_ref().and_then(|t| t.get("x")).expect("field registered");
        assert_eq!(ast.symbol(field_id).owning_struct, Some(struct_id));
        assert!(!ast.symbol(field_id).attributes.contains(Attributes::LVAL));
    }

    #[test]
    fn prototype_then_definition_with_matching_signature_is_accepted() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();

        let proto = make_header(&mut ast, NodeKind::Prototype, "f", &["a"]);
        let header1 = handle_function_header(&mut ctx, &mut ast, &mut diags, proto).expect("prototype declares");
        ctx.scopes.leave_block();

        let def = make_header(&mut ast, NodeKind::Function, "f", &["a"]);
        let body = ast.alloc_node(NodeKind::Block, loc(), "");
        ast.adopt(def, body);
        let header2 = handle_function_header(&mut ctx, &mut ast, &mut diags, def).expect("definition reconciles");
        ctx.scopes.leave_block();

        assert!(!diags.has_errors());
        assert_eq!(header1.func_id, header2.func_id);
    }

    #[test]
    fn prototype_then_definition_with_mismatched_param_count_is_rejected() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();

        let proto = make_header(&mut ast, NodeKind::Prototype, "f", &["a"]);
        handle_function_header(&mut ctx, &mut ast, &mut diags, proto).expect("prototype declares");
        ctx.scopes.leave_block();

        let def = make_header(&mut ast, NodeKind::Function, "f", &["a", "b"]);
        let body = ast.alloc_node(NodeKind::Block, loc(), "");
        ast.adopt(def, body);
        assert!(handle_function_header(&mut ctx, &mut ast, &mut diags, def).is_none());
        assert!(diags.diagnostics().iter().any(|d| d.message.contains("mismatched prototype")));
    }
}
