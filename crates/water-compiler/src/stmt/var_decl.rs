//! Variable declaration compilation.
//!
//! Handles local declarations:
//! - Inferred types: `var x = 5;`
//! - Annotated types: `var x: long = 5;` (the value is widened)
//! - Default initialization: `var x: int;`, `var s: String?;`
//! - Constants: `const x = 42;`
//!
//! [`declared_type`] and [`default_value`] are shared with fields and
//! top-level variables.

use water_core::SemanticErrorKind;
use water_parser::ast::VarDecl;
use water_parser::Token;

use super::StmtCompiler;
use crate::error::{semantic, semantic_kind, Result};
use crate::expr::ExprCompiler;
use crate::types::{TypedCode, WaterType};

/// Type stored by a declaration: the annotation if there is one,
/// otherwise the initializer's type.
pub(crate) fn declared_type(compiler: &mut ExprCompiler<'_>, decl: &VarDecl<'_>) -> Result<WaterType> {
    let token = decl.name.token();
    let annotated = match &decl.ty {
        Some(ty) => Some(compiler.ctx().resolve_type(ty, compiler.directory())?),
        None => None,
    };
    if let Some(ty) = &annotated
        && ty.is_void()
    {
        return Err(semantic(&token, format!("Cannot declare variable '{}' of type void", decl.name.name)));
    }
    let Some(init) = decl.init else {
        if decl.is_const {
            return Err(semantic(&token, format!("Constant '{}' must be initialized", decl.name.name)));
        }
        return annotated.ok_or_else(|| {
            semantic(&token, format!("Cannot infer the type of variable '{}'", decl.name.name))
        });
    };

    let value = compiler.type_of(init)?;
    if value.is_void() {
        return Err(semantic(&token, format!("Cannot assign void value to variable '{}'", decl.name.name)));
    }
    match annotated {
        Some(ty) => {
            if !compiler.is_assignable(&ty, &value, &token)? {
                return Err(semantic_kind(
                    SemanticErrorKind::InvalidAssignment,
                    &token,
                    format!("Cannot assign type of '{}' to annotated type of '{}'.", value, ty),
                ));
            }
            Ok(ty)
        }
        None if value.is_null() => Err(semantic(
            &token,
            format!("Cannot infer the type of variable '{}' from 'null'", decl.name.name),
        )),
        None => Ok(value),
    }
}

/// Push the value a declaration without initializer starts with.
pub(crate) fn default_value(compiler: &mut ExprCompiler<'_>, ty: &WaterType, token: &Token<'_>) -> Result<()> {
    if ty.is_reference() && !ty.is_nullable() {
        return Err(semantic(
            token,
            format!("Cannot default initialize variable of type '{}'", ty),
        ));
    }
    compiler.code().push_dummy(ty);
    Ok(())
}

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    pub fn compile_var_decl(&mut self, decl: &'ast VarDecl<'ast>) -> Result<()> {
        let token = decl.name.token();
        let mut compiler = self.expr_compiler();
        let ty = declared_type(&mut compiler, decl)?;
        match decl.init {
            Some(init) => {
                let value = compiler.type_of(init)?;
                compiler.infer(init)?;
                compiler.code().cast_primitive(&value, &ty);
            }
            None => default_value(&mut compiler, &ty, &token)?,
        }

        let slot = self.frame.locals.declare(decl.name.name, ty.clone(), decl.is_const).map_err(|_| {
            semantic_kind(
                SemanticErrorKind::Redefinition,
                &token,
                format!("Redefinition of variable '{}' in same scope.", decl.name.name),
            )
        })?;
        self.frame.code.store_local(&ty, slot);
        Ok(())
    }
}
