//! Lexer, parser, and AST for the scripting language: everything up to (but
//! not including) elaboration. See `stapc_compile` for symbol resolution,
//! probe-point matching, and type inference.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod session;
pub mod token;

pub use lexer::Lexer;
pub use parser::Parser;
pub use session::Session;
