//! Abstract Syntax Tree (AST) for Water.
//!
//! All nodes are allocated in a [`bumpalo::Bump`] arena and borrow from it
//! for the `'ast` lifetime.
//!
//! # Example
//!
//! ```
//! use water_parser::Parser;
//! use bumpalo::Bump;
//!
//! let arena = Bump::new();
//! let source = r#"
//!     class Player {
//!         var health = 100;
//!
//!         function takeDamage(amount: int) {
//!             health -= amount;
//!         }
//!     }
//! "#;
//!
//! match Parser::parse(source, &arena) {
//!     Ok(program) => println!("Parsed {} declarations", program.decls.len()),
//!     Err(error) => eprintln!("{}", error.report("player.wtr")),
//! }
//! ```

use std::fmt;

use water_core::Span;

use crate::lexer::{Token, TokenKind};

pub mod ops;

mod parser;
mod type_parser;
pub mod types;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub mod decl;
mod decl_parser;

pub use water_core::{ParseError, ParseErrorKind};

pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;
pub use types::*;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }

    /// Rebuild the identifier token for diagnostics.
    pub fn token(&self) -> Token<'ast> {
        Token::new(TokenKind::Identifier, self.name, self.span)
    }
}

impl fmt::Display for Ident<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A dotted name such as `java.util.List`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualifiedName<'ast> {
    pub parts: &'ast [Ident<'ast>],
    pub span: Span,
}

impl<'ast> QualifiedName<'ast> {
    /// The last segment, e.g. `List` for `java.util.List`.
    pub fn simple_name(&self) -> &'ast str {
        self.parts.last().map(|p| p.name).unwrap_or("")
    }

    /// Slash-separated internal form, e.g. `java/util/List`.
    pub fn internal_name(&self) -> String {
        self.join("/")
    }

    pub fn join(&self, sep: &str) -> String {
        self.parts.iter().map(|p| p.name).collect::<Vec<_>>().join(sep)
    }

    /// Token spanning the whole name, for diagnostics.
    pub fn token(&self, arena: &'ast bumpalo::Bump) -> Token<'ast> {
        Token::new(TokenKind::Identifier, arena.alloc_str(&self.join(".")), self.span)
    }
}

impl fmt::Display for QualifiedName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join("."))
    }
}

/// `import a.b.C;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Import<'ast> {
    pub path: QualifiedName<'ast>,
    pub span: Span,
}

/// A parsed Water source file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'ast> {
    pub package: Option<QualifiedName<'ast>>,
    pub imports: &'ast [Import<'ast>],
    pub decls: &'ast [Decl<'ast>],
    pub span: Span,
}

impl<'ast> Program<'ast> {
    /// Whether the file has declarations that are not classes or enums,
    /// and therefore needs a container class.
    pub fn needs_container_class(&self) -> bool {
        self.decls.iter().any(|d| !d.is_new_class())
    }

    /// Package as an internal path prefix, e.g. `com/example/`.
    pub fn package_prefix(&self) -> String {
        match &self.package {
            Some(pkg) => format!("{}/", pkg.internal_name()),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    #[test]
    fn parse_simple_function() {
        let arena = Bump::new();
        let program = Parser::parse("function foo() { }", &arena).unwrap();
        assert_eq!(program.decls.len(), 1);
        assert!(program.needs_container_class());
    }

    #[test]
    fn class_only_file_needs_no_container() {
        let arena = Bump::new();
        let source = r#"
            class Player {
                var health = 100;
                function takeDamage(amount: int) {
                    health -= amount;
                }
            }
            enum Color { RED, GREEN }
        "#;
        let program = Parser::parse(source, &arena).unwrap();
        assert_eq!(program.decls.len(), 2);
        assert!(!program.needs_container_class());
    }

    #[test]
    fn package_and_imports() {
        let arena = Bump::new();
        let source = "package com.example; import java.util.ArrayList; var x = 1;";
        let program = Parser::parse(source, &arena).unwrap();
        assert_eq!(program.package_prefix(), "com/example/");
        assert_eq!(program.imports.len(), 1);
        assert_eq!(program.imports[0].path.internal_name(), "java/util/ArrayList");
        assert_eq!(program.imports[0].path.simple_name(), "ArrayList");
    }

    #[test]
    fn parse_error_is_located() {
        let arena = Bump::new();
        let err = Parser::parse("var x = ;", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
        assert_eq!(err.lexeme, ";");
        assert_eq!(err.span.col, 9);
    }
}
