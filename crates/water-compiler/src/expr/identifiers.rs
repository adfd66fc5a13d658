//! Identifier expression compilation.
//!
//! Compiles variable references (locals, fields, globals) and `this`.

use water_classfile::Opcode;
use water_core::SemanticErrorKind;
use water_parser::ast::Ident;
use water_parser::Token;

use super::place::resolve_ident;
use super::{ExprCompiler, Result};
use crate::error::semantic_kind;
use crate::types::WaterType;

/// Compile a variable reference.
pub fn compile_ident(compiler: &mut ExprCompiler<'_>, ident: &Ident<'_>) -> Result<WaterType> {
    let place = resolve_ident(compiler, ident)?;
    compiler.read_place(&place)
}

pub fn compile_this(compiler: &mut ExprCompiler<'_>, token: &Token<'_>) -> Result<WaterType> {
    if compiler.frame.is_static {
        return Err(semantic_kind(
            SemanticErrorKind::StaticContext,
            token,
            "Cannot use 'this' in a static context",
        ));
    }
    compiler.code().load(Opcode::Aload, 0);
    Ok(WaterType::object(compiler.frame.class.clone()))
}
