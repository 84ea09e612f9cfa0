//! Post-order OIL lowering (spec.md §4.3, grounded on `emit.cpp`'s
//! `emit_recursive`).
//!
//! Every node kind but `if`/`if-else`/`while` is lowered in pure post
//! order: children first (so their `oil_name` is available), then the
//! node itself. The three control-flow kinds break that pattern on
//! purpose -- a `while`'s condition is re-lowered *inside* the loop body
//! on every iteration, so its code has to sit after the loop's label, not
//! before it -- and so they're dispatched separately in [`Emitter::lower`]
//! rather than falling through the generic per-kind table.
//!
//! `emit.cpp`'s node-kind switch has a silent `default: fprintf(stderr,
//! "!!! unknown")` fallback for anything it doesn't recognize. `lower_self`
//! below is an exhaustive match instead: node kinds that are genuine
//! no-ops (`Root`, `Block`, `Params` -- their children already carried all
//! the work) get an explicit empty arm, and kinds that can never reach
//! this function by construction (declare-only nodes, and the three
//! control-flow kinds intercepted in `lower`) get `unreachable!()` rather
//! than silently doing nothing (see DESIGN.md).

use oc_ast::{Ast, Attributes, NodeId, NodeKind};
use oc_diagnostics::SourceLoc;

use crate::mangle::{self, declarator_of};
use crate::types::{register_category, result_type_name};

/// 8 spaces, matching `emit.cpp`'s `INDENT` macro (distinct from the AST
/// dump's 3-character `"|  "` indent unit).
const INDENT: &str = "        ";

pub struct Emitter<'a> {
    ast: &'a mut Ast,
    out: String,
    reg_counter: u32,
}

impl<'a> Emitter<'a> {
    pub fn new(ast: &'a mut Ast) -> Self {
        Emitter { ast, out: String::new(), reg_counter: 1 }
    }

    fn alloc_temp(&mut self, category: &str) -> String {
        let name = format!("{category}{}", self.reg_counter);
        self.reg_counter += 1;
        name
    }

    fn emit_line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(INDENT);
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn oil_name(&self, node: NodeId) -> String {
        self.ast
            .node(node)
            .oil_name
            .clone()
            .expect("node read before its oil_name was set (post-order invariant broken)")
    }

    fn set_oil_name(&mut self, node: NodeId, name: String) {
        self.ast.node_mut(node).oil_name = Some(name);
    }

    fn label(prefix: &str, loc: SourceLoc) -> String {
        format!("{prefix}_{}_{}_{}", loc.file, loc.line, loc.column)
    }

    pub fn out(self) -> String {
        self.out
    }

    pub fn ast(&self) -> &Ast {
        self.ast
    }

    pub(crate) fn ast_mut(&mut self) -> &mut Ast {
        self.ast
    }

    pub(crate) fn out_mut(&mut self) -> &mut String {
        &mut self.out
    }

    /// Lowers `node`, recursing into children first unless `node` is one
    /// of the kinds that either needs no recursion here (already handled
    /// by a dedicated top-level pass) or needs its children interleaved
    /// with label emission.
    pub fn lower(&mut self, node: NodeId) {
        let kind = self.ast.node(node).kind;
        match kind {
            NodeKind::Struct | NodeKind::Function | NodeKind::Prototype | NodeKind::StringCon => {
                // Already (or about to be, respectively) handled by a
                // dedicated top-level pass; recursing here would
                // re-lower a function body into the wrong place.
            }
            NodeKind::While => self.lower_while(node),
            NodeKind::If => self.lower_if(node),
            NodeKind::IfElse => self.lower_ifelse(node),
            _ => {
                let children = self.ast.node(node).children.clone();
                for child in children {
                    self.lower(child);
                }
                self.lower_self(node, kind);
            }
        }
    }

    fn lower_while(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (cond, body) = (children[0], children[1]);
        let loc = self.ast.node(node).loc;
        let while_label = Self::label("while", loc);
        let break_label = Self::label("break", loc);
        self.out.push_str(&format!("{while_label}:;\n"));
        self.lower(cond);
        let cond_oil = self.oil_name(cond);
        self.emit_line(format!("if (!{cond_oil}) goto {break_label};"));
        self.lower(body);
        self.emit_line(format!("goto {while_label};"));
        self.out.push_str(&format!("{break_label}:;\n"));
    }

    fn lower_if(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (cond, then_branch) = (children[0], children[1]);
        let loc = self.ast.node(node).loc;
        let fi_label = Self::label("fi", loc);
        self.lower(cond);
        let cond_oil = self.oil_name(cond);
        self.emit_line(format!("if (!{cond_oil}) goto {fi_label};"));
        self.lower(then_branch);
        self.out.push_str(&format!("{fi_label}:;\n"));
    }

    fn lower_ifelse(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (cond, then_branch, else_branch) = (children[0], children[1], children[2]);
        let loc = self.ast.node(node).loc;
        let else_label = Self::label("else", loc);
        let fi_label = Self::label("fi", loc);
        self.lower(cond);
        let cond_oil = self.oil_name(cond);
        self.emit_line(format!("if (!{cond_oil}) goto {else_label};"));
        self.lower(then_branch);
        self.emit_line(format!("goto {fi_label};"));
        self.out.push_str(&format!("{else_label}:;\n"));
        self.lower(else_branch);
        self.out.push_str(&format!("{fi_label}:;\n"));
    }

    fn lower_self(&mut self, node: NodeId, kind: NodeKind) {
        match kind {
            NodeKind::Root | NodeKind::Block | NodeKind::Params => {}

            NodeKind::Arith(op) => self.lower_binop(node, op.lexeme()),
            NodeKind::Compare(op) => self.lower_binop(node, op.lexeme()),
            NodeKind::Unary(op) => self.lower_unary(node, op),

            NodeKind::Assign => self.lower_assign(node),
            NodeKind::VarDecl => self.lower_vardecl(node),
            NodeKind::Call => self.lower_call(node),
            NodeKind::Index => self.lower_index(node),
            NodeKind::FieldSelect => self.lower_field_select(node),

            NodeKind::New => self.lower_new(node),
            NodeKind::NewArray => self.lower_newarray(node),
            NodeKind::NewString => self.lower_newstring(node),

            NodeKind::Return => {
                let value = self.ast.node(node).children[0];
                let value_oil = self.oil_name(value);
                self.emit_line(format!("return {value_oil};"));
            }
            NodeKind::ReturnVoid => self.emit_line("return;"),

            NodeKind::Ident | NodeKind::DeclId | NodeKind::Field => {
                let sym = self.ast.node(node).symbol.expect("a bound use/declarator always carries its symbol by emission time");
                let name = mangle::mangle_symbol(self.ast, sym);
                self.set_oil_name(node, name);
            }

            NodeKind::Array => self.lower_array_spine(node),
            NodeKind::TypeVoid | NodeKind::TypeInt | NodeKind::TypeChar | NodeKind::TypeBool | NodeKind::TypeString | NodeKind::TypeId => {
                self.lower_type_leaf(node)
            }

            NodeKind::IntCon => {
                let lexeme = self.ast.node(node).lexeme.clone();
                self.set_oil_name(node, strip_leading_zeros(&lexeme));
            }
            NodeKind::CharCon => {
                let lexeme = self.ast.node(node).lexeme.clone();
                self.set_oil_name(node, lexeme);
            }
            NodeKind::True => self.set_oil_name(node, "1".to_string()),
            NodeKind::False | NodeKind::Null => self.set_oil_name(node, "0".to_string()),

            NodeKind::Struct | NodeKind::Function | NodeKind::Prototype | NodeKind::StringCon => {
                unreachable!("{kind:?} is intercepted in Emitter::lower and never reaches lower_self")
            }
            NodeKind::While | NodeKind::If | NodeKind::IfElse => {
                unreachable!("{kind:?} is intercepted in Emitter::lower and never reaches lower_self")
            }
        }
    }

    fn lower_binop(&mut self, node: NodeId, op_lexeme: &str) {
        let attrs = self.ast.node(node).attributes;
        let reg = self.alloc_temp(register_category(attrs));
        let ty = result_type_name(self.ast, node);
        let children = self.ast.node(node).children.clone();
        let (lhs, rhs) = (self.oil_name(children[0]), self.oil_name(children[1]));
        self.emit_line(format!("{ty} {reg} = {lhs} {op_lexeme} {rhs};"));
        self.set_oil_name(node, reg);
    }

    fn lower_unary(&mut self, node: NodeId, op: oc_ast::UnOp) {
        let attrs = self.ast.node(node).attributes;
        let reg = self.alloc_temp(register_category(attrs));
        let ty = result_type_name(self.ast, node);
        let child = self.ast.node(node).children[0];
        let operand = self.oil_name(child);
        let prefix = match op {
            oc_ast::UnOp::Pos => "+",
            oc_ast::UnOp::Neg => "-",
            oc_ast::UnOp::Not => "!",
            oc_ast::UnOp::Ord => "(int)",
            oc_ast::UnOp::Chr => "(char)",
        };
        self.emit_line(format!("{ty} {reg} = {prefix}{operand};"));
        self.set_oil_name(node, reg);
    }

    fn lower_assign(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (lhs, rhs) = (self.oil_name(children[0]), self.oil_name(children[1]));
        self.emit_line(format!("{lhs} = {rhs};"));
        self.set_oil_name(node, lhs);
    }

    /// A bare, direct child of the root is a *global* -- already declared
    /// with its type by [`crate::Emitter::emit_global_vars`], so here only
    /// the bare mangled name (no type text) is assigned. Anywhere else, a
    /// `VarDecl` both declares and initializes in the one statement, so
    /// the full type-spine text (itself already "`Type Name`", built by
    /// [`Self::lower_type_leaf`]/[`Self::lower_array_spine`]) is used.
    fn lower_vardecl(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (type_spine, init) = (children[0], children[1]);
        let is_global = self.ast.node(node).parent == Some(self.ast.root());
        let lhs = if is_global {
            let decl = declarator_of(self.ast, type_spine);
            self.oil_name(decl)
        } else {
            self.oil_name(type_spine)
        };
        let rhs = self.oil_name(init);
        self.emit_line(format!("{lhs} = {rhs};"));
    }

    fn lower_call(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let callee = children[0];
        let func_sym = self
            .ast
            .node(callee)
            .symbol
            .expect("a call's callee is always resolved to a function symbol before emission");
        let callee_name = mangle::mangle_symbol(self.ast, func_sym);
        let arg_oils: Vec<String> = children[1..].iter().map(|&a| self.oil_name(a)).collect();
        let attrs = self.ast.node(node).attributes;
        let mut line = String::new();
        if attrs.contains(Attributes::VOID) {
            self.set_oil_name(node, String::new());
        } else {
            let reg = self.alloc_temp(register_category(attrs));
            let ty = result_type_name(self.ast, node);
            line.push_str(&format!("{ty} {reg} = "));
            self.set_oil_name(node, reg);
        }
        line.push_str(&format!("{callee_name} ({});", arg_oils.join(", ")));
        self.emit_line(line);
    }

    /// Indexing's register is given an explicit extra `*` in the emitted
    /// declaration text (`result_type_name` doesn't add one for `Index`
    /// nodes -- only `FieldSelect` gets that automatically), matching
    /// `emit.cpp`'s literal `"%s* %s = &%s[%s];"` format string.
    fn lower_index(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (base, index) = (children[0], children[1]);
        let reg = self.alloc_temp("a");
        let ty = result_type_name(self.ast, node);
        let (base_oil, index_oil) = (self.oil_name(base), self.oil_name(index));
        self.emit_line(format!("{ty}* {reg} = &{base_oil}[{index_oil}];"));
        self.set_oil_name(node, format!("(*{reg})"));
    }

    fn lower_field_select(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (base, field) = (children[0], children[1]);
        let reg = self.alloc_temp("a");
        let ty = result_type_name(self.ast, node);
        let (base_oil, field_oil) = (self.oil_name(base), self.oil_name(field));
        self.emit_line(format!("{ty} {reg} = &{base_oil}->{field_oil};"));
        self.set_oil_name(node, format!("(*{reg})"));
    }

    fn lower_new(&mut self, node: NodeId) {
        let type_name = self
            .ast
            .node(node)
            .type_name
            .clone()
            .expect("`new T()` always carries its struct's type name (checked by oc-sema's handle_new)");
        let reg = self.alloc_temp("p");
        self.emit_line(format!("struct s_{type_name}* {reg} = xcalloc (1, sizeof (struct s_{type_name}));"));
        self.set_oil_name(node, reg);
    }

    fn lower_newarray(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (elem_type, size) = (children[0], children[1]);
        let elem_ty = result_type_name(self.ast, elem_type);
        let size_oil = self.oil_name(size);
        let reg = self.alloc_temp("p");
        self.emit_line(format!("{elem_ty}* {reg} = xcalloc ({size_oil}, sizeof ({elem_ty}));"));
        self.set_oil_name(node, reg);
    }

    fn lower_newstring(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let size_oil = self.oil_name(children[0]);
        let reg = self.alloc_temp("p");
        self.emit_line(format!("char* {reg} = xcalloc ({size_oil}, sizeof (char));"));
        self.set_oil_name(node, reg);
    }

    /// `Array -> [BaseType, DeclId]`: the declaration text is the base
    /// type's bare keyword plus one more `*`, then the declarator's name.
    fn lower_array_spine(&mut self, node: NodeId) {
        let children = self.ast.node(node).children.clone();
        let (base, decl) = (children[0], children[1]);
        let (base_oil, decl_oil) = (self.oil_name(base), self.oil_name(decl));
        self.set_oil_name(node, format!("{base_oil}* {decl_oil}"));
    }

    /// `TypeVoid`/`TypeInt`/`TypeChar`/`TypeBool`/`TypeString`/`TypeId`: a
    /// fixed keyword for the base type, optionally followed by its single
    /// declarator child's own name, producing the full "`Type Name`"
    /// declaration text a `VarDecl`/parameter/function header reads back
    /// via this node's `oil_name`.
    fn lower_type_leaf(&mut self, node: NodeId) {
        let kind = self.ast.node(node).kind;
        let base = match kind {
            NodeKind::TypeVoid => "void".to_string(),
            NodeKind::TypeInt => "int".to_string(),
            NodeKind::TypeChar => "char".to_string(),
            NodeKind::TypeBool => "char".to_string(),
            NodeKind::TypeString => "char*".to_string(),
            NodeKind::TypeId => format!("struct s_{}*", self.ast.node(node).lexeme),
            _ => unreachable!("lower_type_leaf called on {kind:?}"),
        };
        let children = self.ast.node(node).children.clone();
        let text = match children.first() {
            Some(&decl) => format!("{base} {}", self.oil_name(decl)),
            None => base,
        };
        self.set_oil_name(node, text);
    }
}

/// `emit.cpp` strips leading zeros from an int literal's lexeme before
/// printing it (octal-looking source like `007` becomes plain `7` in
/// OIL, since OIL has no octal literals of its own); an all-zero literal
/// collapses to `"0"`, not the empty string.
fn strip_leading_zeros(lexeme: &str) -> String {
    let trimmed = lexeme.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oc_ast::{ArithOp, Attributes, NodeKind};
    use oc_diagnostics::SourceLoc;

    fn loc() -> SourceLoc {
        SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1)
    }

    #[test]
    fn strip_leading_zeros_keeps_a_single_zero() {
        assert_eq!(strip_leading_zeros("007"), "7");
        assert_eq!(strip_leading_zeros("000"), "0");
        assert_eq!(strip_leading_zeros("42"), "42");
    }

    #[test]
    fn binop_allocates_an_int_register() {
        let mut ast = Ast::new();
        let lhs = ast.alloc_node(NodeKind::IntCon, loc(), "1");
        ast.node_mut(lhs).attributes = Attributes::INT | Attributes::CONST;
        let rhs = ast.alloc_node(NodeKind::IntCon, loc(), "2");
        ast.node_mut(rhs).attributes = Attributes::INT | Attributes::CONST;
        let plus = ast.alloc_node(NodeKind::Arith(ArithOp::Add), loc(), "+");
        ast.adopt(plus, lhs);
        ast.adopt(plus, rhs);
        ast.node_mut(plus).attributes = Attributes::INT | Attributes::VREG;

        let mut emitter = Emitter::new(&mut ast);
        emitter.lower(plus);
        let out = emitter.out();
        assert!(out.contains("int i1 = 1 + 2;"));
    }

    #[test]
    fn while_loop_re_lowers_its_condition_inside_the_label_block() {
        let mut ast = Ast::new();
        let cond = ast.alloc_node(NodeKind::True, loc(), "true");
        let body = ast.alloc_node(NodeKind::Block, loc(), "");
        let while_node = ast.alloc_node(NodeKind::While, loc(), "");
        ast.adopt(while_node, cond);
        ast.adopt(while_node, body);

        let mut emitter = Emitter::new(&mut ast);
        emitter.lower(while_node);
        let out = emitter.out();
        let while_label = Emitter::label("while", loc());
        let break_label = Emitter::label("break", loc());
        assert!(out.starts_with(&format!("{while_label}:;\n")));
        assert!(out.contains(&format!("goto {while_label};")));
        assert!(out.trim_end().ends_with(&format!("{break_label}:;")));
    }
}
