//! AST node shapes (spec.md §3, §9's "AST annotation" design note).
//!
//! The original mutates a single node struct in place across three passes.
//! Rather than `typed_arena`'s one-shot `&'ast mut T` allocation (which
//! `vex-ast::arena` uses and which does not compose with later-pass
//! re-mutation without wrapping every field in `Cell`), nodes here live in
//! a flat `Vec<Node>` indexed by `NodeId`: every pass holds `&mut Ast` and
//! mutates fields on the node it is visiting directly. This is option (a)
//! from spec.md §9 ("keep the node as a sum type with optional annotation
//! slots populated across phases"), generalized to an index-based arena so
//! the borrow checker doesn't need interior mutability to support it.

use serde::{Deserialize, Serialize};

use oc_diagnostics::SourceLoc;

use crate::attributes::Attributes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub fn lexeme(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CmpOp {
    pub fn lexeme(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
        }
    }

    /// `==`/`!=` only require a base-type bit in common (spec.md §4.2);
    /// the four relational operators additionally require primitiveness.
    pub fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnOp {
    Pos,
    Neg,
    Not,
    Ord,
    Chr,
}

/// Every distinct grammar shape the checker and emitter dispatch on.
/// Re-encoded as a tagged variant per spec.md §9's "dynamic dispatch"
/// note: `process_attributes`/`emit_recursive`'s integer-symbol switches
/// become exhaustive `match`es over this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Top-level program node; block 0, never pushed via `enter_block`.
    Root,
    /// A `{ ... }` statement block; pushes/pops a scope.
    Block,
    /// `struct Name { fields... }`; children are `[TypeIdDecl, Field...]`.
    Struct,
    /// A function with a body; children `[TypeSpine, Params, Block]`.
    Function,
    /// A function prototype (no body); children `[TypeSpine, Params]`.
    Prototype,
    /// `Params` node; each child is itself a type-spine declaration with
    /// seed attribute `param`.
    Params,
    /// An initialized local/global declaration; children `[TypeSpine,
    /// InitExpr]`.
    VarDecl,

    // --- type-spine nodes: a base type, optionally with one child that
    // is the declarator (`DeclId`/`Field`) or, for `Array`, two children
    // `[BaseType, DeclId]` per spec.md §4.1's declaration shapes.
    TypeVoid,
    TypeInt,
    TypeChar,
    TypeBool,
    TypeString,
    /// A reference to a user-defined struct type, by name. Used both as a
    /// declaration's base type and as a bare type reference (`new T`).
    TypeId,
    /// `Array -> BaseType, DeclId`.
    Array,

    /// The declarator leaf of a var/param declaration.
    DeclId,
    /// The declarator leaf of a struct field declaration (seed `field`,
    /// distinct from `DeclId` because its symbol lives in a field table,
    /// not a scope table).
    Field,
    /// A use of a previously declared name (resolved via scope lookup).
    Ident,

    New,
    NewArray,
    NewString,

    Call,
    Index,
    /// `a.b`
    FieldSelect,
    Assign,

    Arith(ArithOp),
    Compare(CmpOp),
    Unary(UnOp),

    If,
    IfElse,
    While,
    Return,
    ReturnVoid,

    IntCon,
    CharCon,
    StringCon,
    True,
    False,
    Null,
}

impl NodeKind {
    /// Display name for AST dumps, with any internal `TOK_`-equivalent
    /// prefix already absent (spec.md §6: "Token names have their
    /// `TOK_` prefix stripped"; our variants never carried one).
    pub fn dump_name(self) -> &'static str {
        match self {
            NodeKind::Root => "ROOT",
            NodeKind::Block => "BLOCK",
            NodeKind::Struct => "STRUCT",
            NodeKind::Function => "FUNCTION",
            NodeKind::Prototype => "PROTOTYPE",
            NodeKind::Params => "PARAMS",
            NodeKind::VarDecl => "VARDECL",
            NodeKind::TypeVoid => "VOID",
            NodeKind::TypeInt => "INT",
            NodeKind::TypeChar => "CHAR",
            NodeKind::TypeBool => "BOOL",
            NodeKind::TypeString => "STRING",
            NodeKind::TypeId => "TYPEID",
            NodeKind::Array => "ARRAY",
            NodeKind::DeclId => "DECLID",
            NodeKind::Field => "FIELD",
            NodeKind::Ident => "IDENT",
            NodeKind::New => "NEW",
            NodeKind::NewArray => "NEWARRAY",
            NodeKind::NewString => "NEWSTRING",
            NodeKind::Call => "CALL",
            NodeKind::Index => "INDEX",
            NodeKind::FieldSelect => "FIELDSELECT",
            NodeKind::Assign => "ASSIGN",
            NodeKind::Arith(_) => "ARITH",
            NodeKind::Compare(_) => "COMPARE",
            NodeKind::Unary(_) => "UNARY",
            NodeKind::If => "IF",
            NodeKind::IfElse => "IFELSE",
            NodeKind::While => "WHILE",
            NodeKind::Return => "RETURN",
            NodeKind::ReturnVoid => "RETURNVOID",
            NodeKind::IntCon => "INTCON",
            NodeKind::CharCon => "CHARCON",
            NodeKind::StringCon => "STRINGCON",
            NodeKind::True => "TRUE",
            NodeKind::False => "FALSE",
            NodeKind::Null => "NULL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub loc: SourceLoc,
    /// The token's source text: an identifier, an operator lexeme, or a
    /// literal's textual form. Unused (empty) for purely structural nodes
    /// (`Root`, `Block`, `Params`).
    pub lexeme: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,

    // --- annotated in place across passes, per spec.md §3/§9 ---
    /// Set by `enter_block`/`leave_block` bookkeeping during the scope
    /// traversal (§4.1's final "stamp the node's block number" step).
    pub block: Option<u32>,
    /// Set by the attribute checker (§4.2).
    pub attributes: Attributes,
    /// The user-defined struct type name this node's value carries, when
    /// its base-type bit is `struct`.
    pub type_name: Option<String>,
    /// The declaration this node resolves to, once resolved.
    pub symbol: Option<SymbolId>,
    /// Set by the emitter (§4.3): the OIL identifier or temporary name
    /// that stands for this node's value.
    pub oil_name: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind, loc: SourceLoc, lexeme: impl Into<String>) -> Self {
        Node {
            kind,
            loc,
            lexeme: lexeme.into(),
            children: Vec::new(),
            parent: None,
            block: None,
            attributes: Attributes::empty(),
            type_name: None,
            symbol: None,
            oil_name: None,
        }
    }
}
