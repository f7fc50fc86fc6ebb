//! WebAssembly code generation for the lago language.
//!
//! [`compile`] turns a parsed [`Program`](lago_lang::ast::Program) into a
//! self-contained WebAssembly 1.0 module. The module imports exactly two
//! host functions, `env.print` and `env.println` (each taking an i32 boxed
//! pointer), and exports `main` and `memory`:
//!
//! ```
//! use lago_lang::{Lexer, Parser};
//!
//! let lexed = Lexer::new("println \"hello world\"").lex();
//! let program = Parser::new(&lexed.tokens).parse().unwrap();
//! let out = lago_codegen::compile(&program).unwrap();
//! assert_eq!(b"\0asm", &out.bytes[..4]);
//! assert_eq!(b"hello world\0", out.strings.as_slice());
//! ```

mod compiler;
mod error;
mod func;
mod leb128;
mod module;
mod opcode;
mod runtime;

pub use compiler::{compile, Compilation, Compiler};
pub use error::{CompileError, CompileErrorKind, CompileResult};
