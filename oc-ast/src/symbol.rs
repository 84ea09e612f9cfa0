//! Symbol entries, symbol tables, and the scope stack (spec.md §3, §4.1).

use std::collections::HashMap;

use oc_diagnostics::SourceLoc;

use crate::attributes::Attributes;
use crate::node::{NodeId, SymbolId};

/// One per declaration. Owned by whichever `SymbolTable` it was inserted
/// into (a scope table, a struct's field table, or the global typeid
/// table); AST nodes hold only a non-owning `SymbolId` back-reference
/// (spec.md §5's ownership model).
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub loc: SourceLoc,
    pub definition: NodeId,
    pub attributes: Attributes,
    pub block: u32,
    /// The struct typeid name, for struct-typed symbols and for fields
    /// (the name of the struct the field belongs to).
    pub type_name: Option<String>,
    /// Present only on struct typeid symbols.
    pub fields: Option<SymbolTable>,
    /// Present only on function symbols, in declaration order.
    pub params: Vec<SymbolId>,
    /// Set once a function symbol has been matched to a body block,
    /// distinguishing a defined function from a pure prototype (spec.md
    /// §3's "optional function body block marker").
    pub fn_block: Option<NodeId>,
    /// Explicit back-pointer from a field symbol to its owning struct's
    /// symbol, replacing the original's `field.definition.parent.parent
    /// .children[0]` traversal (spec.md §9's redesign note).
    pub owning_struct: Option<SymbolId>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, loc: SourceLoc, definition: NodeId, attributes: Attributes, block: u32) -> Self {
        Symbol {
            name: name.into(),
            loc,
            definition,
            attributes,
            block,
            type_name: None,
            fields: None,
            params: Vec::new(),
            fn_block: None,
            owning_struct: None,
        }
    }

    pub fn is_function(&self) -> bool {
        self.attributes.contains(Attributes::FUNCTION)
    }

    pub fn is_field(&self) -> bool {
        self.attributes.contains(Attributes::FIELD)
    }
}

/// A mapping from name to symbol; keys unique within one table, insertion
/// order not semantically significant (spec.md §3).
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.entries.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, id: SymbolId) {
        self.entries.insert(name.into(), id);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Reserved block number of the global scope (spec.md §3).
pub const SCOPE_GLOBAL: u32 = 0;

/// Nested lexical scopes plus the parallel block-number stack, exactly
/// spec.md §3's "scope stack" / §4.1's `enter_block`/`leave_block`/
/// `current_block` operations. Tables are created lazily on first
/// insertion, matching the original's `scope_get_top_table`.
#[derive(Debug)]
pub struct ScopeStack {
    tables: Vec<Option<SymbolTable>>,
    blocks: Vec<u32>,
    next_block: u32,
}

impl ScopeStack {
    /// A fresh stack with just the empty global scope (block 0).
    pub fn new() -> Self {
        ScopeStack { tables: vec![Some(SymbolTable::new())], blocks: vec![SCOPE_GLOBAL], next_block: 1 }
    }

    pub fn depth(&self) -> usize {
        self.blocks.len() - 1
    }

    pub fn current_block(&self) -> u32 {
        *self.blocks.last().expect("scope stack is never empty")
    }

    pub fn enter_block(&mut self) -> u32 {
        let block = self.next_block;
        self.next_block += 1;
        self.tables.push(None);
        self.blocks.push(block);
        block
    }

    pub fn leave_block(&mut self) {
        self.tables.pop();
        self.blocks.pop();
        debug_assert!(!self.tables.is_empty(), "leave_block must not pop the global scope");
    }

    pub fn global_table(&self) -> &SymbolTable {
        self.tables[0].as_ref().expect("global scope table always exists")
    }

    pub fn global_table_mut(&mut self) -> &mut SymbolTable {
        self.tables[0].get_or_insert_with(SymbolTable::new)
    }

    /// The innermost table, creating it if this block has no declarations
    /// yet.
    pub fn top_table_mut(&mut self) -> &mut SymbolTable {
        self.tables.last_mut().expect("scope stack is never empty").get_or_insert_with(SymbolTable::new)
    }

    pub fn top_table(&self) -> Option<&SymbolTable> {
        self.tables.last().and_then(|t| t.as_ref())
    }

    /// Walk the scope stack most-nested first, returning the first hit
    /// (spec.md §4.1's `lookup`, a.k.a. the original's `find_symbol`).
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        for table in self.tables.iter().rev() {
            if let Some(table) = table {
                if let Some(id) = table.get(name) {
                    return Some(id);
                }
            }
        }
        None
    }

    /// True once balanced back down to just the global frame (spec.md
    /// §8's "scope balance" invariant).
    pub fn is_balanced(&self) -> bool {
        self.tables.len() == 1 && self.blocks == [SCOPE_GLOBAL]
    }

    /// Every name visible from the current scope, innermost first --
    /// feeds `oc_diagnostics::fuzzy` "did you mean" suggestions for
    /// undefined-identifier errors.
    pub fn visible_names(&self) -> Vec<String> {
        self.tables
            .iter()
            .rev()
            .flatten()
            .flat_map(|table| table.names())
            .map(str::to_string)
            .collect()
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_leave_is_balanced_and_monotonic() {
        let mut scopes = ScopeStack::new();
        assert!(scopes.is_balanced());
        let b1 = scopes.enter_block();
        let b2 = scopes.enter_block();
        assert!(b2 > b1);
        scopes.leave_block();
        scopes.leave_block();
        assert!(scopes.is_balanced());
    }

    #[test]
    fn lookup_prefers_innermost_scope() {
        let mut scopes = ScopeStack::new();
        scopes.global_table_mut().insert("x", SymbolId(1));
        scopes.enter_block();
        scopes.top_table_mut().insert("x", SymbolId(2));
        assert_eq!(scopes.lookup("x"), Some(SymbolId(2)));
        scopes.leave_block();
        assert_eq!(scopes.lookup("x"), Some(SymbolId(1)));
    }
}
