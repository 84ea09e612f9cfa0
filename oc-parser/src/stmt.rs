//! Statement grammar.

use oc_ast::{NodeId, NodeKind};
use oc_lexer::Token;

use crate::error::ParseError;
use crate::Parser;

impl Parser {
    pub(crate) fn parse_stmt(&mut self) -> Result<NodeId, ParseError> {
        match self.peek() {
            Some(Token::LBrace) => self.parse_block(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Return) => self.parse_return(),
            Some(Token::Int | Token::Char | Token::Bool | Token::StringKw | Token::Void) => self.parse_decl_stmt(),
            Some(Token::Ident(_)) if self.looks_like_decl() => self.parse_decl_stmt(),
            _ => {
                let expr = self.parse_expr()?;
                self.expect(Token::Semi, ";")?;
                Ok(expr)
            }
        }
    }

    /// Resolves the struct-typed-local ambiguity (SPEC_FULL.md §0): an
    /// identifier statement is a declaration when it is immediately
    /// followed by another identifier (`S s;`) or by an array suffix and
    /// then an identifier (`S[] s;`); anything else is an expression.
    fn looks_like_decl(&self) -> bool {
        match self.peek_nth(1) {
            Some(Token::Ident(_)) => true,
            Some(Token::LBracket) => matches!(self.peek_nth(2), Some(Token::RBracket)) && matches!(self.peek_nth(3), Some(Token::Ident(_))),
            _ => false,
        }
    }

    fn parse_decl_stmt(&mut self) -> Result<NodeId, ParseError> {
        let type_spine = self.parse_type_spine(NodeKind::DeclId)?;
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

    fn parse_if(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        self.advance(); // 'if'
        self.expect(Token::LParen, "(")?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen, ")")?;
        let then_branch = self.parse_stmt()?;
        if self.eat(&Token::Else) {
            let else_branch = self.parse_stmt()?;
            let node = self.ast.alloc_node(NodeKind::IfElse, loc, "");
            self.ast.adopt(node, cond);
            self.ast.adopt(node, then_branch);
            self.ast.adopt(node, else_branch);
            Ok(node)
        } else {
            let node = self.ast.alloc_node(NodeKind::If, loc, "");
            self.ast.adopt(node, cond);
            self.ast.adopt(node, then_branch);
            Ok(node)
        }
    }

    fn parse_while(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        self.advance(); // 'while'
        self.expect(Token::LParen, "(")?;
        let cond = self.parse_expr()?;
        self.expect(Token::RParen, ")")?;
        let body = self.parse_stmt()?;
        let node = self.ast.alloc_node(NodeKind::While, loc, "");
        self.ast.adopt(node, cond);
        self.ast.adopt(node, body);
        Ok(node)
    }

    fn parse_return(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        self.advance(); // 'return'
        if self.eat(&Token::Semi) {
            Ok(self.ast.alloc_node(NodeKind::ReturnVoid, loc, ""))
        } else {
            let value = self.parse_expr()?;
            self.expect(Token::Semi, ";")?;
            let node = self.ast.alloc_node(NodeKind::Return, loc, "");
            self.ast.adopt(node, value);
            Ok(node)
        }
    }
}
