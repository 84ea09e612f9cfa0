//! Hand-written recursive-descent parser producing an `oc_ast::Ast`.
//!
//! Module split mirrors `vex-parser`'s `parser/{items,statements,
//! expressions,types}` layout: [`item`] covers top-level and struct/
//! function declarations, [`stmt`] covers statements, [`expr`] covers the
//! expression-precedence ladder; this file holds the shared token-cursor
//! plumbing all three build on.

mod error;
mod expr;
mod item;
mod stmt;

pub use error::ParseError;

use oc_ast::{Ast, NodeId, NodeKind};
use oc_diagnostics::{FileTable, SourceLoc};
use oc_lexer::{Lexer, Spanned, Token};

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    pub(crate) ast: Ast,
}

/// Lexes and parses `source` (already preprocessed) in one call,
/// returning the built `Ast` plus the file table the lexer populated
/// from any `# line "file"` markers it saw.
pub fn parse(source: &str, main_file_name: &str) -> Result<(Ast, FileTable), ParseError> {
    let mut lexer = Lexer::new(source, main_file_name, FileTable::new());
    let mut tokens = Vec::new();
    for tok in lexer.by_ref() {
        match tok {
            Ok(spanned) => tokens.push(spanned),
            Err(e) => {
                return Err(ParseError::Lex(match e {
                    oc_lexer::LexError::UnrecognizedToken(loc) => loc,
                }))
            }
        }
    }
    let files = lexer.into_file_table();
    let mut parser = Parser { tokens, pos: 0, ast: Ast::new() };
    parser.parse_program()?;
    Ok((parser.ast, files))
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n).map(|s| &s.token)
    }

    fn peek_loc(&self) -> SourceLoc {
        self.tokens.get(self.pos).map(|s| s.loc).unwrap_or_else(|| {
            self.tokens.last().map(|s| s.loc).unwrap_or(SourceLoc::new(oc_diagnostics::MAIN_FILE, 1, 1))
        })
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at(&self, tok: &Token) -> bool {
        self.peek() == Some(tok)
    }

    fn eat(&mut self, tok: &Token) -> bool {
        if self.at(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Token, what: &str) -> Result<Spanned, ParseError> {
        if self.at(&tok) {
            Ok(self.advance().expect("peeked Some"))
        } else {
            Err(self.unexpected(what))
        }
    }

    fn unexpected(&self, what: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(_) => ParseError::Unexpected(self.peek_loc(), what.to_string()),
            None => ParseError::UnexpectedEof(what.to_string()),
        }
    }

    fn ident(&mut self) -> Result<(String, SourceLoc), ParseError> {
        let loc = self.peek_loc();
        match self.peek() {
            Some(Token::Ident(_)) => {
                let spanned = self.advance().expect("peeked Some");
                match spanned.token {
                    Token::Ident(name) => Ok((name, loc)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// True when the current token is one of the primitive/typeid type
    /// keywords (the lead token of a `TypeTok`, spec.md's declaration
    /// shape).
    fn at_type_tok(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Void | Token::Int | Token::Char | Token::Bool | Token::StringKw | Token::Ident(_))
        )
    }

    fn base_type_kind(tok: &Token) -> Option<NodeKind> {
        match tok {
            Token::Void => Some(NodeKind::TypeVoid),
            Token::Int => Some(NodeKind::TypeInt),
            Token::Char => Some(NodeKind::TypeChar),
            Token::Bool => Some(NodeKind::TypeBool),
            Token::StringKw => Some(NodeKind::TypeString),
            Token::Ident(_) => Some(NodeKind::TypeId),
            _ => None,
        }
    }

    /// Parses a `TypeTok Array?` prefix and the trailing declarator
    /// identifier, building the type-spine shape from spec.md §4.1:
    /// `BaseType -> DeclId` (or `Field`), or `Array -> BaseType, DeclId`.
    /// `declarator_kind` selects `DeclId` (vars/params) vs. `Field`
    /// (struct members).
    fn parse_type_spine(&mut self, declarator_kind: NodeKind) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        let spanned = self.advance().ok_or_else(|| self.unexpected("a type"))?;
        let kind = Self::base_type_kind(&spanned.token).ok_or_else(|| self.unexpected("a type"))?;
        let lexeme = match &spanned.token {
            Token::Ident(name) => name.clone(),
            _ => String::new(),
        };
        let base = self.ast.alloc_node(kind, loc, lexeme);

        if self.at(&Token::LBracket) {
            self.advance();
            self.expect(Token::RBracket, "]")?;
            let array_loc = loc;
            let array = self.ast.alloc_node(NodeKind::Array, array_loc, "[]");
            self.ast.adopt(array, base);
            let (name, decl_loc) = self.ident()?;
            let declarator = self.ast.alloc_node(declarator_kind, decl_loc, name);
            self.ast.adopt(array, declarator);
            Ok(array)
        } else {
            let (name, decl_loc) = self.ident()?;
            let declarator = self.ast.alloc_node(declarator_kind, decl_loc, name);
            self.ast.adopt(base, declarator);
            Ok(base)
        }
    }

    /// The declarator identifier at the bottom of a type-spine subtree
    /// (child 1 for `Array`, child 0 otherwise) -- used wherever later
    /// passes need the declared name, mirroring `handle_function`'s own
    /// `TOK_ARRAY ? children[1] : children[0]` pattern.
    pub fn declarator_of(ast: &Ast, type_spine: NodeId) -> NodeId {
        let node = ast.node(type_spine);
        if node.kind == NodeKind::Array {
            node.children[1]
        } else {
            node.children[0]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_empty_program() {
        let (ast, _files) = parse("", "main.oc").expect("empty program parses");
        assert!(ast.node(ast.root()).children.is_empty());
    }

    #[test]
    fn parses_prototype_then_definition() {
        let src = "int f(int a);\nint f(int a) { return a; }\n";
        let (ast, _files) = parse(src, "main.oc").expect("parses");
        let root = ast.node(ast.root());
        assert_eq!(root.children.len(), 2);
        assert_eq!(ast.node(root.children[0]).kind, NodeKind::Prototype);
        assert_eq!(ast.node(root.children[1]).kind, NodeKind::Function);
    }

    #[test]
    fn parses_struct_and_field_select() {
        let src = "struct S { int x; }\nvoid main() { S s; s = new S(); s.x = 5; }\n";
        let (ast, _files) = parse(src, "main.oc").expect("parses");
        let root = ast.node(ast.root());
        assert_eq!(ast.node(root.children[0]).kind, NodeKind::Struct);
        assert_eq!(ast.node(root.children[1]).kind, NodeKind::Function);
    }

    #[test]
    fn parses_while_loop() {
        let src = "void main() { int i; i = 0; while (i < 10) { i = i + 1; } }\n";
        let (_ast, _files) = parse(src, "main.oc").expect("parses");
    }

    #[test]
    fn rejects_garbage() {
        let src = "int 5 5;";
        assert!(parse(src, "main.oc").is_err());
    }

    #[test]
    fn rejects_new_of_a_primitive_type() {
        let src = "void main() { int x; x = new int(); }\n";
        assert!(parse(src, "main.oc").is_err());
    }

    #[test]
    fn parses_new_array_of_a_primitive_type() {
        let src = "void main() { int a; a = new int[5]; }\n";
        assert!(parse(src, "main.oc").is_ok());
    }
}
