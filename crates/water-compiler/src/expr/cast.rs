//! `as` casts and `instanceof`.

use water_classfile::Opcode;
use water_core::SemanticErrorKind;
use water_parser::ast::{CastExpr, InstanceOfExpr};
use water_parser::Token;

use super::{ExprCompiler, Result};
use crate::error::{semantic, semantic_kind, CompileError};
use crate::types::{TypeKind, TypedCode, WaterType};

fn invalid_cast(token: &Token<'_>, from: &WaterType, to: &WaterType) -> CompileError {
    semantic_kind(
        SemanticErrorKind::UnsupportedOperation,
        token,
        format!("Cannot cast type '{}' to '{}'", from, to),
    )
}

/// Static parse method turning a `String` into primitive `to`.
fn parse_method(to: &WaterType) -> Option<(&'static str, &'static str)> {
    Some(match to.kind() {
        TypeKind::Boolean => ("java/lang/Boolean", "parseBoolean"),
        TypeKind::Byte => ("java/lang/Byte", "parseByte"),
        TypeKind::Short => ("java/lang/Short", "parseShort"),
        TypeKind::Int => ("java/lang/Integer", "parseInt"),
        TypeKind::Long => ("java/lang/Long", "parseLong"),
        TypeKind::Float => ("java/lang/Float", "parseFloat"),
        TypeKind::Double => ("java/lang/Double", "parseDouble"),
        _ => return None,
    })
}

pub fn compile_cast(compiler: &mut ExprCompiler<'_>, cast: &CastExpr<'_>) -> Result<WaterType> {
    let token = cast.as_token;
    let from = compiler.type_of(cast.expr)?;
    let to = compiler.ctx.resolve_type(&cast.ty, compiler.directory)?;
    if from.is_void() {
        return Err(semantic(&token, "Cannot cast from void"));
    }
    if to.is_void() {
        return Err(invalid_cast(&token, &from, &to));
    }

    if from.is_primitive() && to.is_primitive() {
        if from.is_boolean() != to.is_boolean() {
            return Err(invalid_cast(&token, &from, &to));
        }
        compiler.infer(cast.expr)?;
        compiler.code().cast_primitive(&from, &to);
        return Ok(to);
    }

    if from.is_reference() && to.is_reference() {
        if from.is_nullable() && !to.is_nullable() {
            return Err(semantic(
                &token,
                format!("Cannot cast nullable type '{}' to non-nullable type '{}'", from, to),
            ));
        }
        let target = to.as_non_nullable();
        let source = from.as_non_nullable();
        let upcast = from.is_null() || compiler.is_assignable(&target, &source, &token)?;
        if !upcast && !compiler.is_assignable(&source, &target, &token)? && !involves_interface(compiler, &source, &target) {
            return Err(invalid_cast(&token, &from, &to));
        }
        compiler.infer(cast.expr)?;
        if !upcast && let Some(operand) = to.reference_operand() {
            compiler.code().type_insn(Opcode::Checkcast, &operand);
        }
        return Ok(to);
    }

    if from.is_string()
        && !from.is_nullable()
        && let Some((owner, method)) = parse_method(&to)
    {
        compiler.infer(cast.expr)?;
        let descriptor = format!("(Ljava/lang/String;){}", to.descriptor());
        compiler.code().invoke(Opcode::Invokestatic, owner, method, &descriptor, false);
        return Ok(to);
    }

    Err(semantic_kind(
        SemanticErrorKind::UnsupportedOperation,
        &token,
        format!("Cannot cast between objects and primitives ('{}' to '{}')", from, to),
    ))
}

/// A class can always be cast to an interface it does not implement
/// statically, and back.
fn involves_interface(compiler: &ExprCompiler<'_>, a: &WaterType, b: &WaterType) -> bool {
    [a, b]
        .iter()
        .filter_map(|ty| ty.class_name())
        .any(|class| compiler.is_interface(class))
}

pub fn compile_instanceof(compiler: &mut ExprCompiler<'_>, test: &InstanceOfExpr<'_>) -> Result<WaterType> {
    let token = test.op_token;
    let ty = compiler.type_of(test.expr)?;
    if !ty.is_reference() {
        return Err(semantic(
            &token,
            format!("Can only perform 'instanceof' on objects (got '{}')", ty),
        ));
    }
    let target = compiler.ctx.resolve_type(&test.ty, compiler.directory)?;
    if target.is_nullable() {
        return Err(semantic(
            &token,
            format!("Cannot check for an instance of a nullable type ('{}')", target),
        ));
    }
    let Some(operand) = target.reference_operand() else {
        return Err(semantic(
            &token,
            format!("Cannot check for an instance of type '{}'", target),
        ));
    };
    compiler.infer(test.expr)?;
    compiler.code().type_insn(Opcode::Instanceof, &operand);
    Ok(WaterType::BOOLEAN)
}
