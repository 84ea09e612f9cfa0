//! The two dump writers spec.md §6 assigns to the lexer's own interface
//! (string interning, token stream) rather than to the symbol/type/emit
//! core: `foo.str` (interned-lexeme dump) and `foo.tok` (token dump).
//! Grounded on `original_source/astree.cpp`'s `intern_stringset` call on
//! every token's lexeme and `cppstrtok.cpp`'s per-line tokenization.

use std::fmt::Write as _;

use oc_diagnostics::FileTable;
use oc_lexer::{Lexer, Token};

/// Re-lexes `source` and renders one line per token: its dump name, its
/// lexeme, and its source position -- the token-stream analogue of
/// `oc-sema::dump::dump_ast`'s one-line-per-node format. Also returns the
/// list of distinct lexemes in first-encounter order for [`dump_strings`].
pub fn dump_tokens(source: &str, main_file_name: &str) -> (String, Vec<String>) {
    let lexer = Lexer::new(source, main_file_name, FileTable::new());
    let mut out = String::new();
    let mut seen = std::collections::HashSet::new();
    let mut interned = Vec::new();

    for spanned in lexer.filter_map(Result::ok) {
        let name = token_dump_name(&spanned.token);
        let lexeme = token_lexeme(&spanned.token);
        let _ = writeln!(out, "{name} \"{lexeme}\" {}", spanned.loc);
        if seen.insert(lexeme.clone()) {
            interned.push(lexeme);
        }
    }
    (out, interned)
}

/// One line per interned lexeme, 1-indexed in first-encounter order,
/// matching the shape of `dump_stringset`'s numbered entries.
pub fn dump_strings(interned: &[String]) -> String {
    let mut out = String::new();
    for (i, lexeme) in interned.iter().enumerate() {
        let _ = writeln!(out, "{}: \"{}\"", i + 1, lexeme);
    }
    out
}

fn token_dump_name(token: &Token) -> &'static str {
    match token {
        Token::Struct => "STRUCT",
        Token::Void => "VOID",
        Token::Int => "INT",
        Token::Char => "CHAR",
        Token::Bool => "BOOL",
        Token::StringKw => "STRING",
        Token::If => "IF",
        Token::Else => "ELSE",
        Token::While => "WHILE",
        Token::Return => "RETURN",
        Token::New => "NEW",
        Token::True => "TRUE",
        Token::False => "FALSE",
        Token::Null => "NULL",
        Token::Ord => "ORD",
        Token::Chr => "CHR",
        Token::LBrace => "LBRACE",
        Token::RBrace => "RBRACE",
        Token::LParen => "LPAREN",
        Token::RParen => "RPAREN",
        Token::LBracket => "LBRACKET",
        Token::RBracket => "RBRACKET",
        Token::Comma => "COMMA",
        Token::Semi => "SEMI",
        Token::Dot => "DOT",
        Token::EqEq => "EQ",
        Token::NotEq => "NE",
        Token::Assign => "ASSIGN",
        Token::Le => "LE",
        Token::Ge => "GE",
        Token::Lt => "LT",
        Token::Gt => "GT",
        Token::Plus => "PLUS",
        Token::Minus => "MINUS",
        Token::Star => "STAR",
        Token::Slash => "SLASH",
        Token::Percent => "PERCENT",
        Token::Bang => "BANG",
        Token::Ident(_) => "IDENT",
        Token::IntCon(_) => "INTCON",
        Token::CharCon(_) => "CHARCON",
        Token::StringCon(_) => "STRINGCON",
        Token::LineMarker => "LINEMARKER",
    }
}

fn token_lexeme(token: &Token) -> String {
    match token {
        Token::Ident(s) | Token::IntCon(s) | Token::CharCon(s) | Token::StringCon(s) => s.clone(),
        Token::Struct => "struct".to_string(),
        Token::Void => "void".to_string(),
        Token::Int => "int".to_string(),
        Token::Char => "char".to_string(),
        Token::Bool => "bool".to_string(),
        Token::StringKw => "string".to_string(),
        Token::If => "if".to_string(),
        Token::Else => "else".to_string(),
        Token::While => "while".to_string(),
        Token::Return => "return".to_string(),
        Token::New => "new".to_string(),
        Token::True => "true".to_string(),
        Token::False => "false".to_string(),
        Token::Null => "null".to_string(),
        Token::Ord => "ord".to_string(),
        Token::Chr => "chr".to_string(),
        Token::LBrace => "{".to_string(),
        Token::RBrace => "}".to_string(),
        Token::LParen => "(".to_string(),
        Token::RParen => ")".to_string(),
        Token::LBracket => "[".to_string(),
        Token::RBracket => "]".to_string(),
        Token::Comma => ",".to_string(),
        Token::Semi => ";".to_string(),
        Token::Dot => ".".to_string(),
        Token::EqEq => "==".to_string(),
        Token::NotEq => "!=".to_string(),
        Token::Assign => "=".to_string(),
        Token::Le => "<=".to_string(),
        Token::Ge => ">=".to_string(),
        Token::Lt => "<".to_string(),
        Token::Gt => ">".to_string(),
        Token::Plus => "+".to_string(),
        Token::Minus => "-".to_string(),
        Token::Star => "*".to_string(),
        Token::Slash => "/".to_string(),
        Token::Percent => "%".to_string(),
        Token::Bang => "!".to_string(),
        Token::LineMarker => String::new(),
    }
}
