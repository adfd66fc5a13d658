//! Lexical analysis for Water.

mod cursor;
#[allow(clippy::module_inception)]
mod lexer;
mod token;

pub use lexer::{Lexer, unescape};
pub use token::{Token, TokenKind, lookup_keyword};
