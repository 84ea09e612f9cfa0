//! The unified depth-first walk (spec.md §4.1's "Traversal order"):
//! dispatches on `NodeKind`, driving both scope/symbol bookkeeping and the
//! §4.2 attribute checker in one post-order pass. Grounded on
//! `semantics.cpp`'s `dfs_traverse`, re-expressed as an exhaustive `match`
//! per spec.md §9's dynamic-dispatch redesign note.

use oc_ast::{Ast, Attributes, NodeId, NodeKind};
use oc_diagnostics::{Diagnostic, DiagnosticEngine};

use crate::context::AnalysisContext;
use crate::declare;
use crate::typecheck;

fn children_of(ast: &Ast, node: NodeId) -> Vec<NodeId> {
    ast.node(node).children.clone()
}

fn stamp_block(ctx: &AnalysisContext, ast: &mut Ast, node: NodeId) {
    ast.node_mut(node).block = Some(ctx.scopes.current_block());
}

/// A pure type token reached with no declarator (the base-type child of a
/// `new`/`newarray`/`newstring`), `typecheck.cpp`'s `attr_handle_type` on a
/// childless node.
fn visit_type_leaf(ast: &mut Ast, diags: &mut DiagnosticEngine, type_node: NodeId) {
    if let Some((attrs, type_name)) = declare::synthesize_type_attributes(ast, diags, type_node, Attributes::empty()) {
        ast.node_mut(type_node).attributes = attrs;
        ast.node_mut(type_node).type_name = type_name;
    }
}

fn visit_ident(ctx: &mut AnalysisContext, ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) {
    let name = ast.node(node).lexeme.clone();
    match ctx.scopes.lookup(&name) {
        Some(sym_id) => ast.node_mut(node).symbol = Some(sym_id),
        None => {
            let known = ctx.scopes.visible_names();
            let hits = oc_diagnostics::fuzzy::find_similar(&name, known.iter().map(String::as_str));
            let mut diagnostic = Diagnostic::error(ast.node(node).loc, format!("identifier '{name}' is undefined"));
            if let Some(hit) = hits.first() {
                diagnostic = diagnostic.with_note(format!("did you mean '{hit}'?"));
            }
            diags.emit(diagnostic);
        }
    }
    stamp_block(ctx, ast, node);
}

fn visit_binary(ctx: &mut AnalysisContext, ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) {
    for child in children_of(ast, node) {
        visit(ctx, ast, diags, child);
    }
}

/// Recurses into `node`'s children, then runs `typecheck`, then stamps the
/// node's block number -- spec.md §4.1's generic "Otherwise" traversal
/// rule, shared by every expression/statement kind with no bespoke
/// scope-management needs of its own.
fn visit_generic(
    ctx: &mut AnalysisContext,
    ast: &mut Ast,
    diags: &mut DiagnosticEngine,
    node: NodeId,
    typecheck: impl FnOnce(&mut Ast, &mut DiagnosticEngine, NodeId) -> bool,
) {
    visit_binary(ctx, ast, diags, node);
    let _ = typecheck(ast, diags, node);
    stamp_block(ctx, ast, node);
}

pub fn visit(ctx: &mut AnalysisContext, ast: &mut Ast, diags: &mut DiagnosticEngine, node: NodeId) {
    match ast.node(node).kind {
        NodeKind::Struct => declare::handle_struct(ctx, ast, diags, node),

        NodeKind::Function | NodeKind::Prototype => {
            let Some(header) = declare::handle_function_header(ctx, ast, diags, node) else { return };
            let prev_function = ctx.current_function;
            ctx.current_function = Some(header.func_id);

            if ast.node(node).kind == NodeKind::Function {
                let children = children_of(ast, node);
                let block_node = children[2];
                ast.node_mut(block_node).block = Some(header.block);
                for stmt in children_of(ast, block_node) {
                    visit(ctx, ast, diags, stmt);
                }
                // `handle_function`'s second trailing `fprintf(symfile,
                // "\n")`: one more blank line after the body block, only
                // for a defined function (a bare prototype has no body to
                // close).
                ctx.push_blank_line();
            }

            ctx.scopes.leave_block();
            ctx.current_function = prev_function;
        }

        NodeKind::Block => {
            let block = ctx.scopes.enter_block();
            ast.node_mut(node).block = Some(block);
            for stmt in children_of(ast, node) {
                visit(ctx, ast, diags, stmt);
            }
            ctx.scopes.leave_block();
        }

        NodeKind::VarDecl => {
            let children = children_of(ast, node);
            declare::declare_in_scope(ctx, ast, diags, children[0], Attributes::empty());
            visit(ctx, ast, diags, children[1]);
            typecheck::handle_vardecl(ast, diags, node);
            stamp_block(ctx, ast, node);
        }

        // A bare declaration reached as a statement in its own right (no
        // `VarDecl` wrapper, no initializer).
        NodeKind::TypeVoid | NodeKind::TypeInt | NodeKind::TypeChar | NodeKind::TypeBool | NodeKind::TypeString | NodeKind::TypeId | NodeKind::Array => {
            declare::declare_in_scope(ctx, ast, diags, node, Attributes::empty());
            stamp_block(ctx, ast, node);
        }

        NodeKind::New => {
            let base = children_of(ast, node)[0];
            visit_type_leaf(ast, diags, base);
            typecheck::handle_new(ast, diags, node);
            if let Some(type_name) = ast.node(base).type_name.clone() {
                if ast.typeid_table.get(&type_name).is_none() {
                    diags.error(ast.node(base).loc, format!("typeid '{type_name}' is not defined"));
                }
            }
            stamp_block(ctx, ast, node);
        }

        NodeKind::NewArray => {
            let children = children_of(ast, node);
            visit_type_leaf(ast, diags, children[0]);
            visit(ctx, ast, diags, children[1]);
            typecheck::handle_newarray(ast, diags, node);
            stamp_block(ctx, ast, node);
        }

        NodeKind::NewString => {
            let child = children_of(ast, node)[0];
            visit(ctx, ast, diags, child);
            typecheck::handle_newstring(ast, diags, node);
            stamp_block(ctx, ast, node);
        }

        NodeKind::FieldSelect => {
            let children = children_of(ast, node);
            visit(ctx, ast, diags, children[0]);
            declare::resolve_field_select(ast, diags, node);
            typecheck::handle_field_select(ast, diags, node);
            stamp_block(ctx, ast, node);
        }

        NodeKind::Ident => visit_ident(ctx, ast, diags, node),

        NodeKind::Call => visit_generic(ctx, ast, diags, node, typecheck::handle_call),
        NodeKind::Index => visit_generic(ctx, ast, diags, node, typecheck::handle_index),
        NodeKind::Assign => visit_generic(ctx, ast, diags, node, typecheck::handle_assign),
        NodeKind::Arith(_) => visit_generic(ctx, ast, diags, node, typecheck::handle_binop),

        NodeKind::Compare(op) => {
            visit_binary(ctx, ast, diags, node);
            typecheck::handle_comparison(ast, diags, node, op);
            stamp_block(ctx, ast, node);
        }
        NodeKind::Unary(op) => {
            visit_binary(ctx, ast, diags, node);
            typecheck::handle_unop(ast, diags, node, op);
            stamp_block(ctx, ast, node);
        }

        NodeKind::If | NodeKind::IfElse | NodeKind::While => {
            visit_binary(ctx, ast, diags, node);
            typecheck::handle_conditional(ast, diags, node);
            stamp_block(ctx, ast, node);
        }

        NodeKind::Return | NodeKind::ReturnVoid => {
            visit_binary(ctx, ast, diags, node);
            typecheck::handle_return(ast, diags, node, ctx.current_function);
            stamp_block(ctx, ast, node);
        }

        NodeKind::IntCon | NodeKind::CharCon | NodeKind::StringCon | NodeKind::True | NodeKind::False | NodeKind::Null => {
            let kind = ast.node(node).kind;
            typecheck::handle_constant(ast, node, kind);
            stamp_block(ctx, ast, node);
        }

        NodeKind::Root | NodeKind::Params | NodeKind::DeclId | NodeKind::Field => {
            unreachable!("{:?} is only ever reached through a dedicated declare path, never the generic traversal", ast.node(node).kind)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_diagnostics::SourceLoc;

    fn loc() -> SourceLoc {
        SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1)
    }

    #[test]
    fn undefined_identifier_is_reported() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();
        let ident = ast.alloc_node(NodeKind::Ident, loc(), "x");

        visit(&mut ctx, &mut ast, &mut diags, ident);
        assert!(diags.has_errors());
        assert!(diags.diagnostics()[0].message.contains("identifier 'x' is undefined"));
    }

    #[test]
    fn block_enters_and_leaves_balanced() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();
        let block = ast.alloc_node(NodeKind::Block, loc(), "");

        visit(&mut ctx, &mut ast, &mut diags, block);
        assert!(ctx.scopes.is_balanced());
        assert_eq!(ast.node(block).block, Some(1));
    }

    #[test]
    fn function_with_body_resolves_parameter_in_return() {
        let mut ast = Ast::new();
        let mut ctx = AnalysisContext::new();
        let mut diags = DiagnosticEngine::new();

        let ret_ty = ast.alloc_node(NodeKind::TypeInt, loc(), "int");
        let fname = ast.alloc_node(NodeKind::DeclId, loc(), "f");
        ast.adopt(ret_ty, fname);

        let params = ast.alloc_node(NodeKind::Params, loc(), "");
        let param_ty = ast.alloc_node(NodeKind::TypeInt, loc(), "int");
        let param_decl = ast.alloc_node(NodeKind::DeclId, loc(), "a");
        ast.adopt(param_ty, param_decl);
        ast.adopt(params, param_ty);

        let body = ast.alloc_node(NodeKind::Block, loc(), "");
        let a_use = ast.alloc_node(NodeKind::Ident, loc(), "a");
        let ret = ast.alloc_node(NodeKind::Return, loc(), "");
        ast.adopt(ret, a_use);
        ast.adopt(body, ret);

        let func = ast.alloc_node(NodeKind::Function, loc(), "");
        ast.adopt(func, ret_ty);
        ast.adopt(func, params);
        ast.adopt(func, body);

        visit(&mut ctx, &mut ast, &mut diags, func);
        assert!(!diags.has_errors());
        assert!(ctx.scopes.is_balanced());
        assert!(ast.node(a_use).symbol.is_some());
        // A defined function's symbol dump closes with a blank line after
        // the parameter list and another after the body block.
        assert!(ctx.into_symbol_dump().ends_with("\n\n\n"));
    }
}
