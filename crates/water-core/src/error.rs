//! Error types shared by every phase of the Water toolchain.
//!
//! ## Error Hierarchy
//!
//! ```text
//! WaterError (top-level wrapper)
//! ├── LexError        - malformed characters, literals, comments
//! ├── ParseError      - unexpected tokens (lexer errors surface here too)
//! └── SemanticError   - type checking, resolution and code generation
//! ```
//!
//! Lexical and syntactic errors abort the run with exit code `-1`, semantic
//! errors with `-2`. Both render with the file name the driver passes to
//! `report`, e.g. `[main.wtr:3:9] Semantic Error @ 'x': ...`.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors produced while turning source text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}'")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("invalid escape sequence '\\{ch}'")]
    InvalidEscape { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar { span, .. }
            | Self::UnterminatedString { span }
            | Self::UnterminatedChar { span }
            | Self::UnterminatedComment { span }
            | Self::InvalidEscape { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parser Errors
// ============================================================================

/// Category of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token other than the one required by the grammar.
    UnexpectedToken,
    /// Input ended in the middle of a construct.
    UnexpectedEof,
    /// The lexer rejected part of the input.
    Lexical,
    /// A literal that is well-formed lexically but out of range.
    InvalidLiteral,
}

/// A located syntax error.
///
/// The first parse error aborts parsing of a file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {span}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    /// Source text of the offending token.
    pub lexeme: String,
    pub message: String,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        span: Span,
        lexeme: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
            message: message.into(),
        }
    }

    /// Render the error the way the command line reports it.
    pub fn report(&self, file: &str) -> String {
        match self.kind {
            ParseErrorKind::UnexpectedEof => format!(
                "[{}:{}:{}] Unexpected EOF: {}",
                file, self.span.line, self.span.col, self.message
            ),
            _ => format!(
                "[{}:{}:{}] Unexpected token @ '{}': {}",
                file, self.span.line, self.span.col, self.lexeme, self.message
            ),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        let span = err.span();
        ParseError::new(ParseErrorKind::Lexical, span, "", err.to_string())
    }
}

// ============================================================================
// Semantic Errors
// ============================================================================

/// Category of a semantic error.
///
/// The message carries the detail; the kind lets callers (and tests)
/// distinguish failure modes that share wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticErrorKind {
    /// Any type or structural violation without a more specific kind.
    General,
    /// A class name could not be resolved against the type directory.
    ClassResolution,
    /// A name that is not declared in the current scope.
    Unresolved,
    /// No overload accepts the argument types.
    NoApplicableOverload,
    /// Overloads exist but none matches the static/instance call context.
    StaticContext,
    /// A declaration that collides with an existing one in the same scope.
    Redefinition,
    /// An operator applied to unsupported operand types.
    UnsupportedOperation,
    /// Assignment to something that is not assignable.
    InvalidAssignment,
}

/// A located semantic error.
///
/// Carries the offending token (its text and position) so the diagnostic
/// points at the most specific construct available.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub lexeme: String,
    pub span: Span,
    pub message: String,
}

impl SemanticError {
    pub fn new(lexeme: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self::with_kind(SemanticErrorKind::General, lexeme, span, message)
    }

    pub fn with_kind(
        kind: SemanticErrorKind,
        lexeme: impl Into<String>,
        span: Span,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
            message: message.into(),
        }
    }

    /// Render the error the way the command line reports it.
    pub fn report(&self, file: &str) -> String {
        format!(
            "[{}:{}:{}] Semantic Error @ '{}': {}",
            file, self.span.line, self.span.col, self.lexeme, self.message
        )
    }
}

// ============================================================================
// Unified Error
// ============================================================================

/// Any error the front end or compiler core can produce for one file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WaterError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

impl WaterError {
    /// Process exit code the driver uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WaterError::Lex(_) | WaterError::Parse(_) => -1,
            WaterError::Semantic(_) => -2,
        }
    }

    pub fn report(&self, file: &str) -> String {
        match self {
            WaterError::Lex(err) => ParseError::from(err.clone()).report(file),
            WaterError::Parse(err) => err.report(file),
            WaterError::Semantic(err) => err.report(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semantic_report_format() {
        let err = SemanticError::new("x", Span::new(4, 9, 1), "Cannot resolve variable 'x' in current scope.");
        assert_eq!(
            err.report("main.wtr"),
            "[main.wtr:4:9] Semantic Error @ 'x': Cannot resolve variable 'x' in current scope."
        );
        assert_eq!(err.kind, SemanticErrorKind::General);
    }

    #[test]
    fn parse_report_formats() {
        let err = ParseError::new(
            ParseErrorKind::UnexpectedToken,
            Span::new(1, 5, 1),
            "}",
            "Expected expression",
        );
        assert_eq!(
            err.report("a.wtr"),
            "[a.wtr:1:5] Unexpected token @ '}': Expected expression"
        );

        let eof = ParseError::new(ParseErrorKind::UnexpectedEof, Span::point(2, 1), "", "Expected ';'");
        assert_eq!(eof.report("a.wtr"), "[a.wtr:2:1] Unexpected EOF: Expected ';'");
    }

    #[test]
    fn lex_error_becomes_parse_error() {
        let err: ParseError = LexError::UnterminatedString { span: Span::new(3, 2, 6) }.into();
        assert_eq!(err.kind, ParseErrorKind::Lexical);
        assert_eq!(err.span, Span::new(3, 2, 6));
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn exit_codes() {
        let semantic: WaterError = SemanticError::new("f", Span::default(), "boom").into();
        assert_eq!(semantic.exit_code(), -2);
        let parse: WaterError =
            ParseError::new(ParseErrorKind::UnexpectedToken, Span::default(), ";", "boom").into();
        assert_eq!(parse.exit_code(), -1);
        let lex: WaterError = LexError::UnexpectedChar { ch: '#', span: Span::default() }.into();
        assert_eq!(lex.exit_code(), -1);
    }
}
