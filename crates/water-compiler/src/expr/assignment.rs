//! Assignment expression compilation.
//!
//! Handles `=` and the compound operators (`+=`, `<<=`, ...) on locals,
//! fields, properties and array elements. An assignment used as a
//! statement stores without leaving a copy of the value on the stack.

use water_core::SemanticErrorKind;
use water_parser::ast::AssignExpr;
use water_parser::Token;

use super::place::{invalid_lvalue, resolve_place, Place, PlaceKind, Target};
use super::{binary, ExprCompiler, Result};
use crate::directory::{Member, MethodInfo};
use crate::error::{semantic_kind, unresolved, CompileError};
use crate::overload::{resolve_overload, OverloadError};
use crate::types::{TypedCode, WaterType};

/// Compile an assignment; the assigned value stays on the stack when
/// `keep` is set.
pub fn compile_assign(compiler: &mut ExprCompiler<'_>, assign: &AssignExpr<'_>, keep: bool) -> Result<WaterType> {
    let compound = assign.op.binary_op();
    let invalid = if compound.is_some() {
        "Invalid lvalue - cannot perform operation"
    } else {
        "Invalid lvalue - cannot assign"
    };
    let place = resolve_place(compiler, assign.target, invalid)?;
    check_writable(&place)?;

    let (store_ty, setter, chain) = match compound {
        None => {
            let value_ty = compiler.type_of(assign.value)?;
            let (store_ty, setter) = store_plan(compiler, &place, &value_ty, &assign.op_token)?;
            let chain = compiler.emit_receivers(&place)?;
            compiler.infer(assign.value)?;
            compiler.code().cast_primitive(&value_ty, &store_ty);
            (store_ty, setter, chain)
        }
        Some(op) => {
            let chain = compiler.emit_receivers(&place)?;
            compiler.dup_receivers(&place);
            compiler.load_place(&place);
            let result = binary::apply_binary(compiler, op, &assign.op_token, &place.ty, assign.value)?;
            // Compound assignments narrow back to the target like Java's do.
            let result = if result.is_numeric() && place.ty.is_numeric() {
                compiler.code().cast_primitive(&result, &place.ty);
                place.ty.clone()
            } else {
                result
            };
            let (store_ty, setter) = store_plan(compiler, &place, &result, &assign.op_token)?;
            compiler.code().cast_primitive(&result, &store_ty);
            (store_ty, setter, chain)
        }
    };

    if keep {
        compiler.code().dup_value_under(&store_ty, place.receiver_slots());
    }
    compiler.store_place(&place, setter.as_ref())?;
    match chain {
        Some(chain) => compiler.close_null_chain(chain, keep.then_some(&store_ty)),
        None if keep => Ok(store_ty),
        None => Ok(WaterType::VOID),
    }
}

/// Reject stores into constants, finals, `length` and read-only
/// properties.
pub(crate) fn check_writable(place: &Place<'_>) -> Result<()> {
    match &place.target {
        Target::Length(_) => return Err(invalid_lvalue(&place.token)),
        Target::Accessors { setters, .. } if setters.is_empty() && !place.is_const => {
            return Err(invalid_lvalue(&place.token));
        }
        _ => {}
    }
    if !place.is_const {
        return Ok(());
    }
    let message = match place.kind {
        PlaceKind::Variable => format!("Reassignment of constant '{}'.", place.name),
        _ => format!("Cannot assign final member '{}'", place.name),
    };
    Err(semantic_kind(SemanticErrorKind::InvalidAssignment, &place.token, message))
}

/// Type the stored value has to be converted to, and the setter to call
/// when the place is a property.
pub(crate) fn store_plan(
    compiler: &ExprCompiler<'_>,
    place: &Place<'_>,
    value: &WaterType,
    token: &Token<'_>,
) -> Result<(WaterType, Option<Member<MethodInfo>>)> {
    if let Target::Accessors { setters, .. } = &place.target {
        return match resolve_overload(setters.iter(), std::slice::from_ref(value), compiler.directory, |_| true) {
            Ok(chosen) => {
                let param = chosen.candidate.info.ty.params.first().cloned().unwrap_or_else(|| place.ty.clone());
                Ok((param, Some(chosen.candidate.clone())))
            }
            Err(OverloadError::Unresolved(err)) => Err(unresolved(token, err)),
            Err(_) => Err(mismatch(place, value, token)),
        };
    }
    if compiler.is_assignable(&place.ty, value, token)? {
        Ok((place.ty.clone(), None))
    } else {
        Err(mismatch(place, value, token))
    }
}

fn mismatch(place: &Place<'_>, value: &WaterType, token: &Token<'_>) -> CompileError {
    let what = if place.kind == PlaceKind::Element { "element" } else { "variable" };
    semantic_kind(
        SemanticErrorKind::InvalidAssignment,
        token,
        format!("Cannot assign type '{}' to {} of type '{}'", value, what, place.ty),
    )
}
