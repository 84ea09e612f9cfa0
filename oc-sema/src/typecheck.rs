//! The type/attribute checker (spec.md §4.2): per-node attribute-bitset
//! synthesis plus the context-sensitive compatibility rules. Grounded on
//! `typecheck.cpp`'s `attr_handle_*`/`attr_check_*` family, re-expressed as
//! exhaustive `match`es over `NodeKind` (spec.md §9's "dynamic dispatch"
//! redesign note) instead of a `switch` over a raw grammar-symbol integer.

use oc_ast::{ArithOp, Ast, Attributes, CmpOp, NodeId, NodeKind, UnOp};
use oc_diagnostics::DiagnosticEngine;

fn child(ast: &Ast, node: NodeId, idx: usize) -> NodeId {
    ast.node(node).children[idx]
}

fn attrs_braced(attrs: Attributes) -> String {
    format!("{{{attrs}}}")
}

/// `attr_check_required`: every bit in `required` must be set on `node`'s
/// effective attributes.
pub fn check_required(ast: &Ast, diags: &mut DiagnosticEngine, node: NodeId, required: Attributes) -> bool {
    let got = ast.effective_attributes(node);
    if got.contains(required) {
        return true;
    }
    diags.error(
        ast.node(node).loc,
        format!("node only has {}, and {} is required", attrs_braced(got), attrs_braced(required)),
    );
    false
}

/// `attr_check_notallowed`: none of `forbidden`'s bits may be set.
pub fn check_notallowed(ast: &Ast, diags: &mut DiagnosticEngine, node: NodeId, forbidden: Attributes) -> bool {
    let got = ast.effective_attributes(node);
    if !got.intersects(forbidden) {
        return true;
    }
    diags.error(
        ast.node(node).loc,
        format!("node has {}, but none of {} are allowed", attrs_braced(got), attrs_braced(forbidden)),
    );
    false
}

/// `attr_check_any`: at least one bit of `candidates` must be set.
pub fn check_any(ast: &Ast, diags: &mut DiagnosticEngine, node: NodeId, candidates: Attributes) -> bool {
    let got = ast.effective_attributes(node);
    if got.intersects(candidates) {
        return true;
    }
    diags.error(
        ast.node(node).loc,
        format!("node has {}, but at least one of {} is required", attrs_braced(got), attrs_braced(candidates)),
    );
    false
}

/// `attr_check_compatible`: spec.md §4.2's compatibility relation, with a
/// diagnostic at `loc_node` when both sides carry some base type but
/// disagree (mirrors the original only printing when `a.any() && b.any()`).
pub fn check_compatible(ast: &Ast, diags: &mut DiagnosticEngine, loc_node: NodeId, a: Attributes, b: Attributes) -> bool {
    if a.compatible(b) {
        return true;
    }
    if a.intersects(Attributes::ANY) && b.intersects(Attributes::ANY) {
        diags.error(
            ast.node(loc_node).loc,
            format!("nodes are not compatible: have {} and {}", attrs_braced(a), attrs_braced(b)),
        );
    }
    false
}

pub fn handle_binop(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    ast.node_mut(node).attributes = Attributes::INT | Attributes::VREG;
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let mut ok = check_required(ast, diags, c0, Attributes::INT);
    ok &= check_required(ast, diags, c1, Attributes::INT);
    ok &= check_notallowed(ast, diags, c0, Attributes::ARRAY);
    ok &= check_notallowed(ast, diags, c1, Attributes::ARRAY);
    ok
}

pub fn handle_unop(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId, op: UnOp) -> bool {
    let (child_type, result_type) = match op {
        UnOp::Pos | UnOp::Neg => (Attributes::INT, Attributes::INT),
        UnOp::Not => (Attributes::BOOL, Attributes::BOOL),
        UnOp::Ord => (Attributes::CHAR, Attributes::INT),
        UnOp::Chr => (Attributes::INT, Attributes::CHAR),
    };
    ast.node_mut(node).attributes = result_type | Attributes::VREG;
    let c0 = child(ast, node, 0);
    let mut ok = check_required(ast, diags, c0, child_type);
    ok &= check_notallowed(ast, diags, c0, Attributes::ARRAY);
    ok
}

pub fn handle_comparison(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId, op: CmpOp) -> bool {
    ast.node_mut(node).attributes = Attributes::BOOL | Attributes::VREG;
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let (a0, a1) = (ast.effective_attributes(c0), ast.effective_attributes(c1));
    let mut ok = check_compatible(ast, diags, node, a0, a1);
    if op.is_equality() {
        ok &= check_any(ast, diags, c0, Attributes::ANY);
        ok &= check_any(ast, diags, c1, Attributes::ANY);
    } else {
        ok &= check_any(ast, diags, c0, Attributes::PRIMITIVE);
        ok &= check_any(ast, diags, c1, Attributes::PRIMITIVE);
        ok &= check_notallowed(ast, diags, c0, Attributes::ARRAY);
        ok &= check_notallowed(ast, diags, c1, Attributes::ARRAY);
    }
    ok
}

pub fn handle_new(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let c0 = child(ast, node, 0);
    let attrs = ast.effective_attributes(c0) | Attributes::VREG;
    let type_name = ast.effective_type_name(c0);
    ast.node_mut(node).attributes = attrs;
    ast.node_mut(node).type_name = type_name;
    true
}

pub fn handle_newarray(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let attrs = (ast.effective_attributes(c0) & Attributes::BASE) | Attributes::ARRAY | Attributes::VREG;
    let type_name = ast.effective_type_name(c0);
    ast.node_mut(node).attributes = attrs;
    ast.node_mut(node).type_name = type_name;
    let mut ok = check_required(ast, diags, c1, Attributes::INT);
    ok &= check_notallowed(ast, diags, c1, Attributes::ARRAY);
    ok
}

pub fn handle_newstring(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    ast.node_mut(node).attributes = Attributes::STRING | Attributes::VREG;
    let c0 = child(ast, node, 0);
    let mut ok = check_required(ast, diags, c0, Attributes::INT);
    ok &= check_notallowed(ast, diags, c0, Attributes::ARRAY);
    ok
}

pub fn handle_constant(ast: &mut Ast, node: NodeId, kind: NodeKind) {
    let base = match kind {
        NodeKind::IntCon => Attributes::INT,
        NodeKind::CharCon => Attributes::CHAR,
        NodeKind::StringCon => Attributes::STRING,
        NodeKind::True | NodeKind::False => Attributes::BOOL,
        NodeKind::Null => Attributes::NULL,
        _ => unreachable!("handle_constant called on non-constant node"),
    };
    ast.node_mut(node).attributes = base | Attributes::CONST;
}

/// Indexing `a[i]` (spec.md §4.2). The index expression is required to be
/// `int`, non-array in every branch -- a generalization of
/// `typecheck.cpp`'s `attr_handle_index`, which only validated `i` on the
/// array path; spec.md states the constraint unconditionally, so a string
/// index is checked too (see DESIGN.md).
pub fn handle_index(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let a0 = ast.effective_attributes(c0);
    let mut ok;
    if a0.contains(Attributes::ARRAY) {
        ast.node_mut(node).attributes = Attributes::LVAL | Attributes::VADDR | (a0 & Attributes::BASE);
        ast.node_mut(node).type_name = ast.effective_type_name(c0);
        ok = check_any(ast, diags, c0, Attributes::BASE);
    } else if a0.contains(Attributes::STRING) {
        ast.node_mut(node).attributes = Attributes::CHAR | Attributes::VADDR | Attributes::LVAL;
        ok = true;
    } else {
        if a0.intersects(Attributes::ANY) {
            diags.error(ast.node(c0).loc, "cannot index into non-array non-string value");
        }
        ast.node_mut(node).attributes = Attributes::VADDR | Attributes::LVAL;
        ok = false;
    }
    ok &= check_required(ast, diags, c1, Attributes::INT);
    ok &= check_notallowed(ast, diags, c1, Attributes::ARRAY);
    ok
}

/// `a.b` (spec.md §4.2). Assumes the right child has already been bound to
/// its field symbol by the scope engine's `field_select` (oc-sema's
/// `declare::resolve_field_select`); this function only synthesizes
/// attributes and validates the left/right shape.
pub fn handle_field_select(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let attrs = Attributes::VADDR | Attributes::LVAL | (ast.effective_attributes(c1) & Attributes::ANY);
    ast.node_mut(node).attributes = attrs;
    ast.node_mut(node).type_name = ast.effective_type_name(c1);
    let mut ok = check_required(ast, diags, c0, Attributes::STRUCT);
    ok &= check_required(ast, diags, c1, Attributes::FIELD);
    ok
}

pub fn handle_assign(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let (a0, a1) = (ast.effective_attributes(c0), ast.effective_attributes(c1));
    ast.node_mut(node).attributes = (a1 & Attributes::ANY) | Attributes::VREG;
    ast.node_mut(node).type_name = ast.effective_type_name(c1);
    let mut ok = check_required(ast, diags, c0, Attributes::LVAL);
    ok &= check_compatible(ast, diags, node, a0, a1);
    ok &= check_any(ast, diags, c0, Attributes::ANY);
    ok &= check_any(ast, diags, c1, Attributes::ANY);
    ok
}

pub fn handle_conditional(ast: &Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let c0 = child(ast, node, 0);
    let mut ok = check_required(ast, diags, c0, Attributes::BOOL);
    ok &= check_notallowed(ast, diags, c0, Attributes::ARRAY);
    ok
}

pub fn handle_call(ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let callee = child(ast, node, 0);
    let Some(func_id) = ast.node(callee).symbol else { return false };
    if !ast.symbol(func_id).is_function() {
        diags.error(ast.node(callee).loc, format!("'{}' is not a function", ast.node(callee).lexeme));
        return false;
    }
    let params = ast.symbol(func_id).params.clone();
    let args: Vec<NodeId> = ast.node(node).children[1..].to_vec();
    let mut ok = true;
    if args.len() != params.len() {
        diags.error(
            ast.node(node).loc,
            format!(
                "invalid number of parameters to function '{}' (needed {}, have {})",
                ast.node(callee).lexeme,
                params.len(),
                args.len()
            ),
        );
        ok = false;
    } else {
        for (arg, param) in args.iter().zip(params.iter()) {
            let arg_attrs = ast.effective_attributes(*arg);
            let param_attrs = ast.symbol(*param).attributes;
            ok &= check_compatible(ast, diags, *arg, arg_attrs, param_attrs);
            ok &= check_any(ast, diags, *arg, Attributes::ANY);
        }
    }
    let func_attrs = ast.symbol(func_id).attributes;
    ast.node_mut(node).attributes = (func_attrs | Attributes::VREG) & !Attributes::FUNCTION;
    ast.node_mut(node).type_name = ast.symbol(func_id).type_name.clone();
    ok
}

pub fn handle_return(
    ast: &Ast,
    diags: &mut DiagnosticEngine,
    node: NodeId,
    current_function: Option<oc_ast::SymbolId>,
) -> bool {
    let Some(func_sym) = current_function else {
        // `return`/`return e` at global scope is unreachable in a
        // well-formed program (only function bodies contain it), but if
        // it occurs, treat it as a void context per spec.md's intent.
        return ast.node(node).kind == NodeKind::ReturnVoid;
    };
    let func_attrs = ast.symbol(func_sym).attributes;
    if ast.node(node).kind == NodeKind::ReturnVoid {
        if !func_attrs.contains(Attributes::VOID) {
            diags.error(ast.node(node).loc, "cannot return void in a non-void function");
            return false;
        }
        return true;
    }
    let value = child(ast, node, 0);
    let value_attrs = ast.effective_attributes(value);
    let mut ok = check_compatible(ast, diags, node, value_attrs, func_attrs);
    ok &= check_any(ast, diags, value, Attributes::ANY);
    ok
}

pub fn handle_vardecl(ast: &Ast, diags: &mut DiagnosticEngine, node: NodeId) -> bool {
    let (c0, c1) = (child(ast, node, 0), child(ast, node, 1));
    let (a0, a1) = (ast.effective_attributes(c0), ast.effective_attributes(c1));
    let mut ok = check_compatible(ast, diags, node, a0, a1);
    ok &= check_any(ast, diags, c0, Attributes::ANY);
    ok &= check_any(ast, diags, c1, Attributes::ANY);
    ok &= check_required(ast, diags, c0, Attributes::LVAL);
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_diagnostics::SourceLoc;

    fn loc() -> SourceLoc {
        SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1)
    }

    #[test]
    fn binop_requires_int_operands() {
        let mut ast = Ast::new();
        let lhs = ast.alloc_node(NodeKind::CharCon, loc(), "'a'");
        ast.node_mut(lhs).attributes = Attributes::CHAR | Attributes::CONST;
        let rhs = ast.alloc_node(NodeKind::IntCon, loc(), "1");
        ast.node_mut(rhs).attributes = Attributes::INT | Attributes::CONST;
        let plus = ast.alloc_node(NodeKind::Arith(ArithOp::Add), loc(), "+");
        ast.adopt(plus, lhs);
        ast.adopt(plus, rhs);

        let mut diags = DiagnosticEngine::new();
        assert!(!handle_binop(&mut ast, &mut diags, plus));
        assert!(diags.has_errors());
        assert_eq!(ast.node(plus).attributes, Attributes::INT | Attributes::VREG);
    }

    #[test]
    fn index_into_int_is_rejected() {
        let mut ast = Ast::new();
        let base = ast.alloc_node(NodeKind::Ident, loc(), "x");
        ast.node_mut(base).attributes = Attributes::INT | Attributes::LVAL | Attributes::VARIABLE;
        let idx = ast.alloc_node(NodeKind::IntCon, loc(), "0");
        ast.node_mut(idx).attributes = Attributes::INT | Attributes::CONST;
        let index = ast.alloc_node(NodeKind::Index, loc(), "");
        ast.adopt(index, base);
        ast.adopt(index, idx);

        let mut diags = DiagnosticEngine::new();
        assert!(!handle_index(&mut ast, &mut diags, index));
        assert!(diags.diagnostics()[0].message.contains("cannot index into non-array non-string value"));
    }

    #[test]
    fn null_is_compatible_with_struct_assignment() {
        let mut ast = Ast::new();
        let lhs = ast.alloc_node(NodeKind::Ident, loc(), "s");
        ast.node_mut(lhs).attributes = Attributes::STRUCT | Attributes::LVAL | Attributes::VARIABLE;
        ast.node_mut(lhs).type_name = Some("S".into());
        let rhs = ast.alloc_node(NodeKind::Null, loc(), "null");
        ast.node_mut(rhs).attributes = Attributes::NULL | Attributes::CONST;
        let assign = ast.alloc_node(NodeKind::Assign, loc(), "=");
        ast.adopt(assign, lhs);
        ast.adopt(assign, rhs);

        let mut diags = DiagnosticEngine::new();
        assert!(handle_assign(&mut ast, &mut diags, assign));
        assert!(!diags.has_errors());
    }
}
