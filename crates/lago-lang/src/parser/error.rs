use thiserror::Error;

use crate::{
    parser::{ast::Program, lexer::Token},
    source::Diagnostic,
};

pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorKind {
    #[error("Expected {expected}, found {found}")]
    Expected {
        expected: &'static str,
        found: Token,
    },
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("'%' cannot be chained")]
    ChainedModulo,
}

/// A parse failure. `partial` holds the top-level statements that parsed
/// successfully before the error; `token_len` is the source length of the
/// offending token.
#[derive(Debug, Error, PartialEq)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: u32,
    pub column: u32,
    pub token_len: usize,
    pub partial: Program,
}

impl Diagnostic for ParseError {
    fn message(&self) -> String {
        self.kind.to_string()
    }

    fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    fn len(&self) -> usize {
        self.token_len
    }
}
