//! Compiler error types.
//!
//! Type checking and code generation fail with a located
//! [`SemanticError`]. Failures of the class-file layer (a label bound
//! twice, a branch that does not fit in 16 bits) are not the user's fault
//! and travel separately as [`CompileError::ClassFile`].

use thiserror::Error;
use water_classfile::ClassFileError;
use water_core::{SemanticError, SemanticErrorKind};
use water_parser::Token;

/// Any failure while compiling one file.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("class file error: {0}")]
    ClassFile(#[from] ClassFileError),
}

impl CompileError {
    pub fn as_semantic(&self) -> Option<&SemanticError> {
        match self {
            CompileError::Semantic(err) => Some(err),
            CompileError::ClassFile(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// A class name the type directory could not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UnresolvedClass(pub String);

/// Build a general semantic error located at `token`.
pub(crate) fn semantic(token: &Token<'_>, message: impl Into<String>) -> CompileError {
    SemanticError::new(token.lexeme, token.span, message).into()
}

/// Build a semantic error of a specific kind located at `token`.
pub(crate) fn semantic_kind(
    kind: SemanticErrorKind,
    token: &Token<'_>,
    message: impl Into<String>,
) -> CompileError {
    SemanticError::with_kind(kind, token.lexeme, token.span, message).into()
}

/// Wrap a directory failure into a located error.
pub(crate) fn unresolved(token: &Token<'_>, err: UnresolvedClass) -> CompileError {
    semantic_kind(
        SemanticErrorKind::ClassResolution,
        token,
        format!("Could not resolve class '{}'", err.0.replace('/', ".")),
    )
}

/// Extension for attaching a location to directory lookups.
pub(crate) trait ResolveExt<T> {
    fn at(self, token: &Token<'_>) -> Result<T>;
}

impl<T> ResolveExt<T> for std::result::Result<T, UnresolvedClass> {
    fn at(self, token: &Token<'_>) -> Result<T> {
        self.map_err(|err| unresolved(token, err))
    }
}
