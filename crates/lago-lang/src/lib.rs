//! The lago language front end: lexer, parser, and AST.
//!
//! Source text goes in, a [`Program`](ast::Program) comes out:
//!
//! ```
//! use lago_lang::{Lexer, Parser};
//!
//! let lexed = Lexer::new("println \"hello world\"").lex();
//! assert!(lexed.error.is_none());
//! let program = Parser::new(&lexed.tokens).parse().unwrap();
//! assert_eq!(1, program.body.len());
//! ```

pub mod parser;
mod source;

pub use parser::{
    ast,
    lexer::{LexError, LexErrorKind, Lexed, Lexer, Token, TokenKind},
    ParseError, ParseErrorKind, ParseResult, Parser,
};
pub use source::{Diagnostic, Source};
