//! Shared foundation types for the Water compiler.
//!
//! - [`Span`]: source locations carried by tokens and diagnostics
//! - [`error`]: the error hierarchy used by the lexer, parser and compiler

pub mod error;
mod span;

pub use error::{LexError, ParseError, ParseErrorKind, SemanticError, SemanticErrorKind, WaterError};
pub use span::Span;

/// Compiler version reported by `water --version`.
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));
