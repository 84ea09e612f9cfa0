//! Top-level items: struct declarations, function declarations/
//! definitions/prototypes, and bare top-level declarations.

use oc_ast::{NodeId, NodeKind};
use oc_lexer::Token;

use crate::error::ParseError;
use crate::Parser;

impl Parser {
    pub(crate) fn parse_program(&mut self) -> Result<(), ParseError> {
        while self.peek().is_some() {
            let item = self.parse_top_decl()?;
            self.ast.adopt_root(item);
        }
        Ok(())
    }

    fn parse_top_decl(&mut self) -> Result<NodeId, ParseError> {
        if self.at(&Token::Struct) {
            return self.parse_struct();
        }
        let type_spine = self.parse_type_spine(NodeKind::DeclId)?;
        if self.at(&Token::LParen) {
            self.parse_function_tail(type_spine)
        } else {
            self.parse_decl_tail(type_spine)
        }
    }

    fn parse_struct(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        self.advance(); // 'struct'
        let (name, name_loc) = self.ident()?;
        let decl = self.ast.alloc_node(NodeKind::TypeId, name_loc, name);
        let strukt = self.ast.alloc_node(NodeKind::Struct, loc, "struct");
        self.ast.adopt(strukt, decl);

        self.expect(Token::LBrace, "{")?;
        while !self.at(&Token::RBrace) {
            let field = self.parse_type_spine(NodeKind::Field)?;
            self.expect(Token::Semi, ";")?;
            self.ast.adopt(strukt, field);
        }
        self.expect(Token::RBrace, "}")?;
        Ok(strukt)
    }

    /// `type_spine`'s declarator (the function name) is already parsed;
    /// the current token is `(`.
    fn parse_function_tail(&mut self, type_spine: NodeId) -> Result<NodeId, ParseError> {
        let loc = self.ast.node(type_spine).loc;
        self.advance(); // '('
        let params = self.ast.alloc_node(NodeKind::Params, loc, "");
        if !self.at(&Token::RParen) {
            loop {
                let param = self.parse_type_spine(NodeKind::DeclId)?;
                self.ast.adopt(params, param);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen, ")")?;

        if self.eat(&Token::Semi) {
            let prototype = self.ast.alloc_node(NodeKind::Prototype, loc, "");
            self.ast.adopt(prototype, type_spine);
            self.ast.adopt(prototype, params);
            Ok(prototype)
        } else {
            let block = self.parse_block()?;
            let function = self.ast.alloc_node(NodeKind::Function, loc, "");
            self.ast.adopt(function, type_spine);
            self.ast.adopt(function, params);
            self.ast.adopt(function, block);
            Ok(function)
        }
    }

    /// A bare top-level declaration: either `TypeTok ... IDENT;` or
    /// `TypeTok ... IDENT = Expr;`. The latter wraps the type-spine in a
    /// `VarDecl` node per spec.md §4.1's "Bare declaration" vs. the
    /// initializer case.
    fn parse_decl_tail(&mut self, type_spine: NodeId) -> Result<NodeId, ParseError> {
        if self.eat(&Token::Assign) {
            let loc = self.ast.node(type_spine).loc;
            let init = self.parse_expr()?;
            self.expect(Token::Semi, ";")?;
            let vardecl = self.ast.alloc_node(NodeKind::VarDecl, loc, "");
            self.ast.adopt(vardecl, type_spine);
            self.ast.adopt(vardecl, init);
            Ok(vardecl)
        } else {
            self.expect(Token::Semi, ";")?;
            Ok(type_spine)
        }
    }

    pub(crate) fn parse_block(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        self.expect(Token::LBrace, "{")?;
        let block = self.ast.alloc_node(NodeKind::Block, loc, "");
        while !self.at(&Token::RBrace) {
            let stmt = self.parse_stmt()?;
            self.ast.adopt(block, stmt);
        }
        self.expect(Token::RBrace, "}")?;
        Ok(block)
    }
}
