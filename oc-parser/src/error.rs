use oc_diagnostics::SourceLoc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}: unrecognized token")]
    Lex(SourceLoc),
    #[error("{0}: unexpected token, expected {1}")]
    Unexpected(SourceLoc, String),
    #[error("{0}: unexpected end of input, expected {1}")]
    UnexpectedEof(String),
}

impl ParseError {
    pub fn loc(&self) -> Option<SourceLoc> {
        match self {
            ParseError::Lex(loc) | ParseError::Unexpected(loc, _) => Some(*loc),
            ParseError::UnexpectedEof(_) => None,
        }
    }
}
