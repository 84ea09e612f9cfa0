//! Tokenizer over preprocessed source (spec.md's "Lex/Parse (external)"
//! stage). Grounded on `vex-lexer`'s `logos`-derived `Token` enum and
//! `Iterator`-based `Lexer` wrapper, extended with `# <line> "<file>"`
//! marker handling (`line_map`) and file/line/column tracking, neither of
//! which `vex-lexer` needed (it never tracked positions at all -- see
//! DESIGN.md).

mod line_map;

use logos::Logos;
use thiserror::Error;

use oc_diagnostics::{FileTable, SourceLoc};

use line_map::LineMap;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    #[token("struct")]
    Struct,
    #[token("void")]
    Void,
    #[token("int")]
    Int,
    #[token("char")]
    Char,
    #[token("bool")]
    Bool,
    #[token("string")]
    StringKw,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("return")]
    Return,
    #[token("new")]
    New,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("ord")]
    Ord,
    #[token("chr")]
    Chr,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("=")]
    Assign,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntCon(String),
    #[regex(r"'(\\.|[^'\\])'", |lex| lex.slice().to_string())]
    CharCon(String),
    #[regex(r#""(\\.|[^"\\])*""#, |lex| lex.slice().to_string())]
    StringCon(String),

    /// A GNU cpp line marker; consumed internally by `Lexer`, never
    /// surfaced to the parser.
    #[regex(r"#[^\n]*")]
    LineMarker,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("{0}: unrecognized token")]
    UnrecognizedToken(SourceLoc),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub loc: SourceLoc,
}

/// Computes 1-based physical (line, column) for a byte offset into
/// `source`, independent of the lexer's own whitespace skipping.
struct PhysicalIndex {
    newline_offsets: Vec<usize>,
}

impl PhysicalIndex {
    fn new(source: &str) -> Self {
        let newline_offsets = source.bytes().enumerate().filter(|(_, b)| *b == b'\n').map(|(i, _)| i).collect();
        PhysicalIndex { newline_offsets }
    }

    fn line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = self.newline_offsets.partition_point(|&nl| nl < offset);
        let line = line_idx as u32 + 1;
        let line_start = if line_idx == 0 { 0 } else { self.newline_offsets[line_idx - 1] + 1 };
        let col = (offset - line_start) as u32 + 1;
        (line, col)
    }
}

pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    index: PhysicalIndex,
    line_map: LineMap,
    files: FileTable,
    trace: bool,
}

impl<'source> Lexer<'source> {
    /// Takes ownership of `files` (typically freshly constructed) and
    /// hands it back via [`Lexer::into_file_table`] once lexing is done,
    /// since every filename a `# line "file"` marker mentions gets
    /// interned as tokens are produced.
    pub fn new(source: &'source str, main_file_name: &str, mut files: FileTable) -> Self {
        let line_map = LineMap::new(main_file_name, &mut files);
        Lexer { inner: Token::lexer(source), index: PhysicalIndex::new(source), line_map, files, trace: false }
    }

    /// Enables per-token `log::trace!` output (the `-l` CLI flag).
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn file_table(&self) -> &FileTable {
        &self.files
    }

    pub fn into_file_table(self) -> FileTable {
        self.files
    }

    fn loc(&self, offset: usize) -> SourceLoc {
        let (physical_line, col) = self.index.line_col(offset);
        let (file, logical_line) = self.line_map.resolve(physical_line);
        SourceLoc::new(file, logical_line, col)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Spanned, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let result = self.inner.next()?;
            let span = self.inner.span();
            match result {
                Ok(Token::LineMarker) => {
                    let (physical_line, _) = self.index.line_col(span.start);
                    let text = self.inner.slice().to_string();
                    self.line_map.record_marker(&text, physical_line, &mut self.files);
                    continue;
                }
                Ok(token) => {
                    let loc = self.loc(span.start);
                    if self.trace {
                        log::trace!("token {:?} at {}", token, loc);
                    }
                    return Some(Ok(Spanned { token, loc }));
                }
                Err(()) => {
                    let loc = self.loc(span.start);
                    return Some(Err(LexError::UnrecognizedToken(loc)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<Token> {
        Lexer::new(source, "main.oc", FileTable::new()).filter_map(|r| r.ok()).map(|s| s.token).collect()
    }

    #[test]
    fn test_keywords() {
        let tokens = lex_all("struct void int char bool string if else while return new true false null ord chr");
        assert_eq!(
            tokens,
            vec![
                Token::Struct,
                Token::Void,
                Token::Int,
                Token::Char,
                Token::Bool,
                Token::StringKw,
                Token::If,
                Token::Else,
                Token::While,
                Token::Return,
                Token::New,
                Token::True,
                Token::False,
                Token::Null,
                Token::Ord,
                Token::Chr,
            ]
        );
    }

    #[test]
    fn test_identifiers_and_literals() {
        let tokens = lex_all(r#"foo 007 'a' "hi""#);
        assert_eq!(
            tokens,
            vec![
                Token::Ident("foo".into()),
                Token::IntCon("007".into()),
                Token::CharCon("'a'".into()),
                Token::StringCon("\"hi\"".into()),
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tokens = lex_all("== != <= >= < > = + - * / % !");
        assert_eq!(
            tokens,
            vec![
                Token::EqEq,
                Token::NotEq,
                Token::Le,
                Token::Ge,
                Token::Lt,
                Token::Gt,
                Token::Assign,
                Token::Plus,
                Token::Minus,
                Token::Star,
                Token::Slash,
                Token::Percent,
                Token::Bang,
            ]
        );
    }

    #[test]
    fn test_function_declaration() {
        let tokens = lex_all("int f(int a);");
        assert_eq!(
            tokens,
            vec![
                Token::Int,
                Token::Ident("f".into()),
                Token::LParen,
                Token::Int,
                Token::Ident("a".into()),
                Token::RParen,
                Token::Semi,
            ]
        );
    }

    #[test]
    fn test_line_marker_is_not_surfaced() {
        let tokens = lex_all("# 1 \"included.oc\"\nint x;");
        assert_eq!(tokens, vec![Token::Int, Token::Ident("x".into()), Token::Semi]);
    }
}
