//! The AST arena: owns every node and every symbol for one compilation
//! unit (spec.md §5's ownership model -- "the AST owns its children...
//! symbol entries are owned by the symbol table they were inserted
//! into"). Using plain `Vec` indices instead of `vex-ast::arena`'s
//! `typed_arena`-backed `&'ast T` references means nodes can be mutated
//! in place by later passes without any `Cell`/`RefCell` wrapping: a pass
//! just takes `&mut Ast`.

use oc_diagnostics::SourceLoc;

use crate::attributes::Attributes;
use crate::node::{Node, NodeId, NodeKind, SymbolId};
use crate::symbol::{Symbol, SymbolTable};

#[derive(Debug)]
pub struct Ast {
    nodes: Vec<Node>,
    symbols: Vec<Symbol>,
    root: NodeId,
    /// Struct types live in their own global-only namespace (spec.md §3's
    /// typeid table), distinct from the variable/function scope stack.
    pub typeid_table: SymbolTable,
    /// String literal nodes in source-encounter order, populated by the
    /// parser as it constructs each `StringCon` node -- spec.md §4.3's
    /// mangling rule numbers string globals `s1, s2, ...` in that order,
    /// not emission-visit order, matching `emit.cpp`'s parse-time
    /// `emitter_register_string` calls.
    string_literals: Vec<NodeId>,
}

impl Ast {
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        let root = Node::new(NodeKind::Root, SourceLoc::new(oc_diagnostics::MAIN_FILE, 0, 0), "");
        nodes.push(root);
        Ast { nodes, symbols: Vec::new(), root: NodeId(0), typeid_table: SymbolTable::new(), string_literals: Vec::new() }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn alloc_node(&mut self, kind: NodeKind, loc: SourceLoc, lexeme: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind, loc, lexeme));
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// Adopts `child` under `parent`, matching `astree.cpp`'s `adopt1`:
    /// appends to the parent's child list and sets the child's parent
    /// back-pointer.
    pub fn adopt(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0 as usize].children.push(child);
        self.nodes[child.0 as usize].parent = Some(parent);
    }

    pub fn adopt_root(&mut self, child: NodeId) {
        let root = self.root;
        self.adopt(root, child);
    }

    pub fn register_string_literal(&mut self, node: NodeId) {
        self.string_literals.push(node);
    }

    pub fn string_literals(&self) -> &[NodeId] {
        &self.string_literals
    }

    pub fn alloc_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The attributes that should be used to typecheck/dump `id`: for a
    /// node that is itself a *use* of a declaration (`Ident`, `Field`,
    /// `DeclId`, `TypeId`), the bound symbol's attributes take
    /// precedence over the node's own (generally empty) `attributes`
    /// field, matching `typecheck.cpp`'s `get_node_attributes` special
    /// case. Every other node kind reports its own synthesized
    /// attributes.
    pub fn effective_attributes(&self, id: NodeId) -> Attributes {
        let node = self.node(id);
        match node.kind {
            NodeKind::Ident | NodeKind::Field | NodeKind::DeclId | NodeKind::TypeId => {
                if let Some(sym) = node.symbol {
                    return self.symbol(sym).attributes;
                }
                node.attributes
            }
            _ => node.attributes,
        }
    }

    /// The type name that should be used for `id`: prefers the node's
    /// own `type_name` (set during attribute synthesis), falling back to
    /// the bound symbol's type name for bare uses that never had their
    /// own `type_name` populated.
    pub fn effective_type_name(&self, id: NodeId) -> Option<String> {
        let node = self.node(id);
        if node.type_name.is_some() {
            return node.type_name.clone();
        }
        node.symbol.and_then(|sym| self.symbol(sym).type_name.clone())
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLoc {
        SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1)
    }

    #[test]
    fn adopt_links_parent_and_child() {
        let mut ast = Ast::new();
        let child = ast.alloc_node(NodeKind::Ident, loc(), "x");
        ast.adopt_root(child);
        assert_eq!(ast.node(ast.root()).children, vec![child]);
        assert_eq!(ast.node(child).parent, Some(ast.root()));
    }

    #[test]
    fn string_literals_preserve_encounter_order() {
        let mut ast = Ast::new();
        let a = ast.alloc_node(NodeKind::StringCon, loc(), "\"a\"");
        let b = ast.alloc_node(NodeKind::StringCon, loc(), "\"b\"");
        ast.register_string_literal(a);
        ast.register_string_literal(b);
        assert_eq!(ast.string_literals(), &[a, b]);
    }
}
