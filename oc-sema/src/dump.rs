//! The AST-dump renderer (spec.md §6): one line per node, tree-indented,
//! annotated with the attributes and block number the rest of this crate
//! attached during the traversal. Grounded on `astree.cpp`'s
//! `dump_astree_rec`.

use std::fmt::Write as _;

use oc_ast::{Ast, NodeId};

use crate::context::attrs_with_type_name;

const INDENT: &str = "|  ";

/// Renders every top-level declaration's subtree, in source order.
pub fn dump_ast(ast: &Ast) -> String {
    let mut out = String::new();
    for &item in &ast.node(ast.root()).children {
        dump_node(ast, item, 0, &mut out);
    }
    out
}

fn dump_node(ast: &Ast, id: NodeId, depth: usize, out: &mut String) {
    let node = ast.node(id);
    let attrs = ast.effective_attributes(id);
    let type_name = ast.effective_type_name(id);
    let block = node.block.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string());

    let _ = write!(
        out,
        "{}{} \"{}\" {} {{{}}} {}",
        INDENT.repeat(depth),
        node.kind.dump_name(),
        node.lexeme,
        node.loc,
        block,
        attrs_with_type_name(attrs, type_name.as_deref())
    );

    // A node that resolves to a symbol whose declaration site differs from
    // its own position is a *use* of a declaration made elsewhere (spec.md
    // §6); a declarator node's own symbol shares its location and is
    // exempt, since it IS the declaration.
    if let Some(sym_id) = node.symbol {
        let sym_loc = ast.symbol(sym_id).loc;
        if sym_loc != node.loc {
            let _ = write!(out, " ({sym_loc})");
        }
    }
    out.push('\n');

    for &child in &node.children {
        dump_node(ast, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_ast::NodeKind;
    use oc_diagnostics::SourceLoc;

    #[test]
    fn dumps_one_line_per_node_with_tree_indent() {
        let mut ast = Ast::new();
        let loc = SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1);
        let inner = ast.alloc_node(NodeKind::IntCon, loc, "1");
        let outer = ast.alloc_node(NodeKind::Return, loc, "");
        ast.adopt(outer, inner);
        ast.adopt_root(outer);

        let dump = dump_ast(&ast);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("RETURN"));
        assert!(lines[1].starts_with("|  INTCON"));
    }
}
