//! Expression grammar: a standard precedence ladder (assignment lowest,
//! postfix highest) over `NodeKind::{Arith,Compare,Assign,...}` nodes.

use oc_ast::{ArithOp, CmpOp, NodeId, NodeKind, UnOp};
use oc_lexer::Token;

use crate::error::ParseError;
use crate::Parser;

impl Parser {
    pub(crate) fn parse_expr(&mut self) -> Result<NodeId, ParseError> {
        self.parse_assign()
    }

    fn parse_assign(&mut self) -> Result<NodeId, ParseError> {
        let lhs = self.parse_eq()?;
        if self.at(&Token::Assign) {
            let loc = self.ast.node(lhs).loc;
            self.advance();
            let rhs = self.parse_assign()?;
            let node = self.ast.alloc_node(NodeKind::Assign, loc, "=");
            self.ast.adopt(node, lhs);
            self.ast.adopt(node, rhs);
            Ok(node)
        } else {
            Ok(lhs)
        }
    }

    fn parse_eq(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_rel()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => CmpOp::Eq,
                Some(Token::NotEq) => CmpOp::Ne,
                _ => break,
            };
            let loc = self.peek_loc();
            self.advance();
            let rhs = self.parse_rel()?;
            let node = self.ast.alloc_node(NodeKind::Compare(op), loc, op.lexeme());
            self.ast.adopt(node, lhs);
            self.ast.adopt(node, rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn parse_rel(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_add()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => CmpOp::Lt,
                Some(Token::Gt) => CmpOp::Gt,
                Some(Token::Le) => CmpOp::Le,
                Some(Token::Ge) => CmpOp::Ge,
                _ => break,
            };
            let loc = self.peek_loc();
            self.advance();
            let rhs = self.parse_add()?;
            let node = self.ast.alloc_node(NodeKind::Compare(op), loc, op.lexeme());
            self.ast.adopt(node, lhs);
            self.ast.adopt(node, rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => break,
            };
            let loc = self.peek_loc();
            self.advance();
            let rhs = self.parse_mul()?;
            let node = self.ast.alloc_node(NodeKind::Arith(op), loc, op.lexeme());
            self.ast.adopt(node, lhs);
            self.ast.adopt(node, rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<NodeId, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                Some(Token::Percent) => ArithOp::Mod,
                _ => break,
            };
            let loc = self.peek_loc();
            self.advance();
            let rhs = self.parse_unary()?;
            let node = self.ast.alloc_node(NodeKind::Arith(op), loc, op.lexeme());
            self.ast.adopt(node, lhs);
            self.ast.adopt(node, rhs);
            lhs = node;
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.wrap_unary(UnOp::Pos, loc)
            }
            Some(Token::Minus) => {
                self.advance();
                self.wrap_unary(UnOp::Neg, loc)
            }
            Some(Token::Bang) => {
                self.advance();
                self.wrap_unary(UnOp::Not, loc)
            }
            Some(Token::Ord) => {
                self.advance();
                self.expect(Token::LParen, "(")?;
                let e = self.parse_expr()?;
                self.expect(Token::RParen, ")")?;
                let node = self.ast.alloc_node(NodeKind::Unary(UnOp::Ord), loc, "ord");
                self.ast.adopt(node, e);
                Ok(node)
            }
            Some(Token::Chr) => {
                self.advance();
                self.expect(Token::LParen, "(")?;
                let e = self.parse_expr()?;
                self.expect(Token::RParen, ")")?;
                let node = self.ast.alloc_node(NodeKind::Unary(UnOp::Chr), loc, "chr");
                self.ast.adopt(node, e);
                Ok(node)
            }
            _ => self.parse_postfix(),
        }
    }

    fn wrap_unary(&mut self, op: UnOp, loc: oc_diagnostics::SourceLoc) -> Result<NodeId, ParseError> {
        let operand = self.parse_unary()?;
        let lexeme = match op {
            UnOp::Pos => "+",
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::Ord => "ord",
            UnOp::Chr => "chr",
        };
        let node = self.ast.alloc_node(NodeKind::Unary(op), loc, lexeme);
        self.ast.adopt(node, operand);
        Ok(node)
    }

    fn parse_postfix(&mut self) -> Result<NodeId, ParseError> {
        let mut base = self.parse_primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    let loc = self.peek_loc();
                    self.advance();
                    let (name, name_loc) = self.ident()?;
                    let field = self.ast.alloc_node(NodeKind::Field, name_loc, name);
                    let node = self.ast.alloc_node(NodeKind::FieldSelect, loc, ".");
                    self.ast.adopt(node, base);
                    self.ast.adopt(node, field);
                    base = node;
                }
                Some(Token::LBracket) => {
                    let loc = self.peek_loc();
                    self.advance();
                    let idx = self.parse_expr()?;
                    self.expect(Token::RBracket, "]")?;
                    let node = self.ast.alloc_node(NodeKind::Index, loc, "");
                    self.ast.adopt(node, base);
                    self.ast.adopt(node, idx);
                    base = node;
                }
                Some(Token::LParen) => {
                    let loc = self.peek_loc();
                    self.advance();
                    let node = self.ast.alloc_node(NodeKind::Call, loc, "");
                    self.ast.adopt(node, base);
                    if !self.at(&Token::RParen) {
                        loop {
                            let arg = self.parse_expr()?;
                            self.ast.adopt(node, arg);
                            if !self.eat(&Token::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen, ")")?;
                    base = node;
                }
                _ => break,
            }
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        match self.peek().cloned() {
            Some(Token::IntCon(s)) => {
                self.advance();
                Ok(self.ast.alloc_node(NodeKind::IntCon, loc, s))
            }
            Some(Token::CharCon(s)) => {
                self.advance();
                Ok(self.ast.alloc_node(NodeKind::CharCon, loc, s))
            }
            Some(Token::StringCon(s)) => {
                self.advance();
                let node = self.ast.alloc_node(NodeKind::StringCon, loc, s);
                self.ast.register_string_literal(node);
                Ok(node)
            }
            Some(Token::True) => {
                self.advance();
                Ok(self.ast.alloc_node(NodeKind::True, loc, "true"))
            }
            Some(Token::False) => {
                self.advance();
                Ok(self.ast.alloc_node(NodeKind::False, loc, "false"))
            }
            Some(Token::Null) => {
                self.advance();
                Ok(self.ast.alloc_node(NodeKind::Null, loc, "null"))
            }
            Some(Token::Ident(name)) => {
                self.advance();
                Ok(self.ast.alloc_node(NodeKind::Ident, loc, name))
            }
            Some(Token::LParen) => {
                self.advance();
                let e = self.parse_expr()?;
                self.expect(Token::RParen, ")")?;
                Ok(e)
            }
            Some(Token::New) => self.parse_new(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_new(&mut self) -> Result<NodeId, ParseError> {
        let loc = self.peek_loc();
        self.advance(); // 'new'

        if self.at(&Token::StringKw) && matches!(self.peek_nth(1), Some(Token::LParen)) {
            self.advance();
            self.expect(Token::LParen, "(")?;
            let size = self.parse_expr()?;
            self.expect(Token::RParen, ")")?;
            let node = self.ast.alloc_node(NodeKind::NewString, loc, "");
            self.ast.adopt(node, size);
            return Ok(node);
        }

        let type_loc = self.peek_loc();
        let spanned = self.advance().ok_or_else(|| self.unexpected("a type"))?;
        let kind = Self::base_type_kind(&spanned.token).ok_or_else(|| ParseError::Unexpected(type_loc, "a type".to_string()))?;
        let lexeme = match &spanned.token {
            Token::Ident(name) => name.clone(),
            _ => String::new(),
        };
        let type_node = self.ast.alloc_node(kind, type_loc, lexeme);

        if self.eat(&Token::LBracket) {
            let size = self.parse_expr()?;
            self.expect(Token::RBracket, "]")?;
            let node = self.ast.alloc_node(NodeKind::NewArray, loc, "");
            self.ast.adopt(node, type_node);
            self.ast.adopt(node, size);
            Ok(node)
        } else {
            if !matches!(spanned.token, Token::Ident(_)) {
                return Err(ParseError::Unexpected(type_loc, "a type name".to_string()));
            }
            self.expect(Token::LParen, "(")?;
            self.expect(Token::RParen, ")")?;
            let node = self.ast.alloc_node(NodeKind::New, loc, "");
            self.ast.adopt(node, type_node);
            Ok(node)
        }
    }
}
