//! Semantic analysis: scope/symbol resolution, attribute synthesis and
//! checking, and the AST/symbol dump renderers (spec.md §4.1, §4.2, §6).
//! Grounded on `semantics.cpp` and `astree.cpp`, re-expressed as an
//! explicit [`AnalysisContext`] rather than module-level statics (spec.md
//! §9's "Global mutable state" redesign note).

pub mod context;
pub mod declare;
pub mod dump;
pub mod traverse;
pub mod typecheck;

pub use context::AnalysisContext;

use oc_ast::Ast;
use oc_diagnostics::DiagnosticEngine;

/// The two reports this crate produces for a fully-analyzed translation
/// unit (spec.md §6's AST-dump and symbol-dump outputs).
pub struct AnalysisOutput {
    pub ast_dump: String,
    pub symbol_dump: String,
}

/// Runs the full semantic pass over every top-level declaration of `ast`,
/// in source order, and renders both dumps. Mirrors the original's
/// `oc_run_semantics` driver.
pub fn analyze(ast: &mut Ast, diags: &mut DiagnosticEngine) -> AnalysisOutput {
    let mut ctx = AnalysisContext::new();

    let items = ast.node(ast.root()).children.clone();
    for item in items {
        traverse::visit(&mut ctx, ast, diags, item);
    }

    debug_assert!(ctx.scopes.is_balanced(), "scope stack must unwind back to global after a full pass");

    let ast_dump = dump::dump_ast(ast);
    AnalysisOutput { ast_dump, symbol_dump: ctx.into_symbol_dump() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_ast::NodeKind;
    use oc_diagnostics::SourceLoc;

    #[test]
    fn analyze_reports_an_undefined_global_reference() {
        let mut ast = Ast::new();
        let mut diags = DiagnosticEngine::new();
        let loc = SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1);

        let ty = ast.alloc_node(NodeKind::TypeInt, loc, "int");
        let name = ast.alloc_node(NodeKind::DeclId, loc, "x");
        ast.adopt(ty, name);
        let undefined = ast.alloc_node(NodeKind::Ident, loc, "y");
        let decl = ast.alloc_node(NodeKind::VarDecl, loc, "");
        ast.adopt(decl, ty);
        ast.adopt(decl, undefined);
        ast.adopt_root(decl);

        let output = analyze(&mut ast, &mut diags);
        assert!(diags.has_errors());
        assert!(output.symbol_dump.contains('x'));
        assert!(output.ast_dump.contains("DECLID \"x\""));
    }
}
