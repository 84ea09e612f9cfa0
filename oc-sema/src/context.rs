//! The explicit analysis context that replaces the original's module-level
//! statics (spec.md §9's "Global mutable state" design note): one instance
//! lives for the duration of a single compilation unit's semantic pass.

use std::fmt::Write as _;

use oc_ast::{ScopeStack, SymbolId};

/// Threaded through every scope/typecheck function instead of the
/// original's `symbol_stack`/`block_num_stack`/`current_function` globals.
pub struct AnalysisContext {
    pub scopes: ScopeStack,
    /// The symbol of the function currently being checked, used by
    /// `return` validation (spec.md §4.2). `None` at global scope.
    pub current_function: Option<SymbolId>,
    /// Accumulates the symbol-dump text as declarations are processed,
    /// matching `handle_structure`/`handle_function`'s direct
    /// `fprintf(symfile, ...)` calls interleaved with traversal.
    symbol_dump: String,
}

impl AnalysisContext {
    pub fn new() -> Self {
        AnalysisContext { scopes: ScopeStack::new(), current_function: None, symbol_dump: String::new() }
    }

    /// 3 spaces per scope depth, per spec.md §6's symbol-dump format.
    pub fn indent(&self) -> String {
        "   ".repeat(self.scopes.depth())
    }

    pub fn push_symbol_line(&mut self, line: &str) {
        self.symbol_dump.push_str(line);
        self.symbol_dump.push('\n');
    }

    pub fn push_blank_line(&mut self) {
        self.symbol_dump.push('\n');
    }

    pub fn into_symbol_dump(self) -> String {
        self.symbol_dump
    }
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders `attrs`, quoting `type_name` after the `struct` keyword when
/// present -- `typecheck.cpp`'s `__typeid_attrs_string`.
pub fn attrs_with_type_name(attrs: oc_ast::Attributes, type_name: Option<&str>) -> String {
    use oc_ast::attributes::ATTR_NAMES;

    let mut out = String::new();
    let mut first = true;
    for (bit, name) in ATTR_NAMES {
        if attrs.contains(bit) {
            if !first {
                out.push(' ');
            }
            let _ = write!(out, "{name}");
            first = false;
            if bit == oc_ast::Attributes::STRUCT {
                if let Some(type_name) = type_name {
                    let _ = write!(out, " \"{type_name}\"");
                }
            }
        }
    }
    out
}
