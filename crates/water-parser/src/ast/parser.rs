//! Parser state and token-level helpers.
//!
//! The grammar itself is split across `decl_parser`, `stmt_parser`,
//! `expr_parser` and `type_parser`, each adding methods to [`Parser`].

use bumpalo::Bump;
use bumpalo::collections::Vec as BumpVec;
use water_core::Span;

use crate::ast::{Import, ParseError, ParseErrorKind, Program, QualifiedName};
use crate::lexer::{Lexer, Token, TokenKind};

/// Recursive-descent parser producing an arena-allocated [`Program`].
///
/// The first error aborts parsing.
pub struct Parser<'ast> {
    pub(crate) tokens: Vec<Token<'ast>>,
    pub(crate) pos: usize,
    pub(crate) arena: &'ast Bump,
    /// Set while parsing a class body; enables `static` and `constructor`.
    pub(crate) in_class: bool,
}

impl<'ast> Parser<'ast> {
    /// Lex `source` and prepare to parse it.
    pub fn new(source: &str, arena: &'ast Bump) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source, arena).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            arena,
            in_class: false,
        })
    }

    /// Parse a complete source file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<&'ast Program<'ast>, ParseError> {
        let mut parser = Parser::new(source, arena)?;
        let program = parser.parse_program()?;
        Ok(arena.alloc(program))
    }

    /// program = ("package" qualified ";")? ("import" qualified ";")* declaration*
    pub fn parse_program(&mut self) -> Result<Program<'ast>, ParseError> {
        let start = self.peek().span;

        let package = if self.eat(TokenKind::Package).is_some() {
            let name = self.parse_qualified_name("Expected package name")?;
            self.expect(TokenKind::Semicolon, "Expected ';' after package")?;
            Some(name)
        } else {
            None
        };

        let mut imports = BumpVec::new_in(self.arena);
        while let Some(import) = self.eat(TokenKind::Import) {
            let path = self.parse_qualified_name("Expected import path")?;
            self.expect(TokenKind::Semicolon, "Expected ';' after import")?;
            imports.push(Import {
                path,
                span: import.span.to(path.span),
            });
        }

        let mut decls = BumpVec::new_in(self.arena);
        while !self.is_at_end() {
            decls.push(self.parse_declaration()?);
        }

        Ok(Program {
            package,
            imports: imports.into_bump_slice(),
            decls: decls.into_bump_slice(),
            span: start.to(self.peek().span),
        })
    }

    /// qualified = IDENT ("." IDENT)*
    pub(crate) fn parse_qualified_name(&mut self, message: &str) -> Result<QualifiedName<'ast>, ParseError> {
        let mut parts = BumpVec::new_in(self.arena);
        let first = self.expect_ident(message)?;
        let mut span = first.span;
        parts.push(first);
        while self.check(TokenKind::Dot) && self.peek_nth(1).kind == TokenKind::Identifier {
            self.advance();
            let part = self.expect_ident(message)?;
            span = span.to(part.span);
            parts.push(part);
        }
        Ok(QualifiedName {
            parts: parts.into_bump_slice(),
            span,
        })
    }

    // =========================================
    // Token helpers
    // =========================================

    #[inline]
    pub(crate) fn peek(&self) -> &Token<'ast> {
        self.peek_nth(0)
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token<'ast> {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// The most recently consumed token.
    pub(crate) fn previous(&self) -> Token<'ast> {
        self.tokens[self.pos.saturating_sub(1)]
    }

    pub(crate) fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if !token.is_eof() {
            self.pos += 1;
        }
        token
    }

    #[inline]
    pub(crate) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) { Some(self.advance()) } else { None }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, message: &str) -> Result<Token<'ast>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    pub(crate) fn expect_ident(&mut self, message: &str) -> Result<crate::ast::Ident<'ast>, ParseError> {
        let token = self.expect(TokenKind::Identifier, message)?;
        Ok(crate::ast::Ident::new(token.lexeme, token.span))
    }

    #[inline]
    pub(crate) fn is_at_end(&self) -> bool {
        self.peek().is_eof()
    }

    /// Error located at the current token.
    pub(crate) fn error_here(&self, message: &str) -> ParseError {
        Self::error_at(self.peek(), message)
    }

    pub(crate) fn error_at(token: &Token<'ast>, message: &str) -> ParseError {
        let kind = if token.is_eof() {
            ParseErrorKind::UnexpectedEof
        } else {
            ParseErrorKind::UnexpectedToken
        };
        ParseError::new(kind, token.span, token.lexeme, message)
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.to(self.previous().span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_errors_are_reported_as_eof() {
        let arena = Bump::new();
        let err = Parser::parse("function f() {", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
        assert_eq!(err.report("f.wtr"), "[f.wtr:1:15] Unexpected EOF: Expected '}' after block");
    }

    #[test]
    fn lexer_errors_surface_as_parse_errors() {
        let arena = Bump::new();
        let err = Parser::parse("var s = \"open;", &arena).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::Lexical);
    }

    #[test]
    fn declaration_required_at_top_level() {
        let arena = Bump::new();
        let err = Parser::parse("x = 1;", &arena).unwrap_err();
        assert_eq!(err.report("a.wtr"), "[a.wtr:1:1] Unexpected token @ 'x': Expected declaration");
    }
}
