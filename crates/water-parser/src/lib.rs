//! Water parser crate.
//!
//! This crate provides the front end of the Water compiler:
//! - Lexical analysis (tokenization)
//! - Abstract Syntax Tree (AST) definitions, arena-allocated
//! - A Pratt/recursive-descent parser producing a [`ast::Program`]
//! - A pretty-printer for `--prettyprint`
//!
//! # Example
//!
//! ```
//! use water_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let program = Parser::parse("function main() { println(\"hi\"); }", &arena).unwrap();
//! assert_eq!(program.decls.len(), 1);
//! ```

pub mod ast;
pub mod lexer;
mod printer;

pub use ast::{Parser, Program};
pub use lexer::{Lexer, Token, TokenKind};
pub use printer::pretty_print;
