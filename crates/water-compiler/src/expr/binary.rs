//! Binary operator compilation.
//!
//! Comparisons and `&&` / `||` are compiled as jumps (see
//! [`conditions`](super::conditions)); `??` lives with the other null
//! operators. What remains here is arithmetic, bitwise and shift
//! operators, string concatenation and string repetition.

use water_classfile::Opcode;
use water_core::SemanticErrorKind;
use water_parser::ast::{BinaryExpr, BinaryOp, Expr};
use water_parser::Token;

use super::{conditions, nullable, ExprCompiler, Result};
use crate::error::{semantic_kind, CompileError};
use crate::types::{binary_insn, TypedCode, WaterType};

const STRING_BUILDER: &str = "java/lang/StringBuilder";

pub(crate) fn unsupported(token: &Token<'_>, left: &WaterType, right: &WaterType) -> CompileError {
    semantic_kind(
        SemanticErrorKind::UnsupportedOperation,
        token,
        format!(
            "Unsupported operation of '{}' between types '{}' and '{}'",
            token.lexeme, left, right
        ),
    )
}

pub fn compile_binary(compiler: &mut ExprCompiler<'_>, bin: &BinaryExpr<'_>) -> Result<WaterType> {
    match bin.op {
        BinaryOp::NullCoalesce => nullable::compile_coalesce(compiler, bin),
        op if op.is_logical() || op.is_equality() || op.is_relational() => conditions::materialize(compiler, bin),
        BinaryOp::Add if is_concat(compiler, bin)? => compile_concat(compiler, bin),
        op => {
            let left = compiler.infer(bin.left)?;
            apply_binary(compiler, op, &bin.op_token, &left, bin.right)
        }
    }
}

fn is_concat(compiler: &mut ExprCompiler<'_>, bin: &BinaryExpr<'_>) -> Result<bool> {
    Ok(compiler.type_of(bin.left)?.is_string() || compiler.type_of(bin.right)?.is_string())
}

/// Apply `op` to the value of type `left` already on the stack and the
/// value of `right`. Shared by binary expressions and compound
/// assignments.
pub(crate) fn apply_binary(
    compiler: &mut ExprCompiler<'_>,
    op: BinaryOp,
    token: &Token<'_>,
    left: &WaterType,
    right: &Expr<'_>,
) -> Result<WaterType> {
    let right_ty = compiler.type_of(right)?;
    if left.is_void() || right_ty.is_void() {
        return Err(unsupported(token, left, &right_ty));
    }

    if op == BinaryOp::Add && (left.is_string() || right_ty.is_string()) {
        new_builder(compiler);
        compiler.code().emit(Opcode::Swap);
        append(compiler, left);
        compiler.infer(right)?;
        append(compiler, &right_ty);
        return Ok(finish_builder(compiler));
    }

    if op == BinaryOp::Mul {
        if is_repeatable(left) && right_ty.is_int_group() {
            compiler.infer(right)?;
            repeat(compiler);
            return Ok(WaterType::string());
        }
        if left.is_int_group() && is_repeatable(&right_ty) {
            compiler.infer(right)?;
            compiler.code().swap_values(&right_ty, &WaterType::INT);
            repeat(compiler);
            return Ok(WaterType::string());
        }
    }

    let bitwise = matches!(op, BinaryOp::BitwiseAnd | BinaryOp::BitwiseOr | BinaryOp::BitwiseXor);
    if bitwise && left.is_boolean() && right_ty.is_boolean() {
        compiler.infer(right)?;
        let insn = binary_insn(op, &WaterType::INT).ok_or_else(|| unsupported(token, left, &right_ty))?;
        compiler.code().emit(insn);
        return Ok(WaterType::BOOLEAN);
    }

    let shift = matches!(
        op,
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::ShiftRightUnsigned
    );
    let applicable = if shift || bitwise {
        left.is_integer() && right_ty.is_integer()
    } else {
        op.is_arithmetic() && left.is_numeric() && right_ty.is_numeric()
    };
    if !applicable {
        return Err(unsupported(token, left, &right_ty));
    }

    let ty = if shift { left.promote(&WaterType::INT) } else { left.promote(&right_ty) };
    let right_target = if shift { WaterType::INT } else { ty.clone() };
    compiler.code().cast_primitive(left, &ty);
    compiler.infer(right)?;
    compiler.code().cast_primitive(&right_ty, &right_target);
    let insn = binary_insn(op, &ty).ok_or_else(|| unsupported(token, left, &right_ty))?;
    compiler.code().emit(insn);
    Ok(ty)
}

fn is_repeatable(ty: &WaterType) -> bool {
    ty.is_string() && !ty.is_nullable()
}

/// `String.repeat(int)` with the string and the count on the stack.
fn repeat(compiler: &mut ExprCompiler<'_>) {
    compiler.code().invoke(
        Opcode::Invokevirtual,
        "java/lang/String",
        "repeat",
        "(I)Ljava/lang/String;",
        false,
    );
}

/// Compile a chain `a + b + c` of string additions into one builder.
fn compile_concat(compiler: &mut ExprCompiler<'_>, bin: &BinaryExpr<'_>) -> Result<WaterType> {
    let mut operands = Vec::new();
    collect_operands(compiler, bin.left, &mut operands)?;
    operands.push(bin.right);

    for operand in &operands {
        let ty = compiler.type_of(operand)?;
        if ty.is_void() {
            let left = compiler.type_of(bin.left)?;
            let right = compiler.type_of(bin.right)?;
            return Err(unsupported(&bin.op_token, &left, &right));
        }
    }

    new_builder(compiler);
    for operand in operands {
        let ty = compiler.type_of(operand)?;
        compiler.infer(operand)?;
        append(compiler, &ty);
    }
    Ok(finish_builder(compiler))
}

/// Flatten the left-leaning additions that are themselves string
/// concatenations and not folded.
fn collect_operands<'e>(
    compiler: &mut ExprCompiler<'_>,
    expr: &'e Expr<'e>,
    out: &mut Vec<&'e Expr<'e>>,
) -> Result<()> {
    if let Expr::Binary(inner) = expr
        && inner.op == BinaryOp::Add
        && compiler.constant(expr)?.is_none()
        && is_concat(compiler, inner)?
    {
        collect_operands(compiler, inner.left, out)?;
        out.push(inner.right);
        return Ok(());
    }
    out.push(expr);
    Ok(())
}

fn new_builder(compiler: &mut ExprCompiler<'_>) {
    let code = compiler.code();
    code.type_insn(Opcode::New, STRING_BUILDER);
    code.emit(Opcode::Dup);
    code.invoke(Opcode::Invokespecial, STRING_BUILDER, "<init>", "()V", false);
}

/// `StringBuilder.append` overload for a value of type `ty`.
fn append(compiler: &mut ExprCompiler<'_>, ty: &WaterType) {
    let param = if ty.is_string() {
        "Ljava/lang/String;".to_string()
    } else if ty.is_int_group() && *ty != WaterType::CHAR {
        "I".to_string()
    } else if ty.is_primitive() {
        ty.descriptor()
    } else {
        "Ljava/lang/Object;".to_string()
    };
    let descriptor = format!("({})L{};", param, STRING_BUILDER);
    compiler.code().invoke(Opcode::Invokevirtual, STRING_BUILDER, "append", &descriptor, false);
}

fn finish_builder(compiler: &mut ExprCompiler<'_>) -> WaterType {
    compiler.code().invoke(
        Opcode::Invokevirtual,
        STRING_BUILDER,
        "toString",
        "()Ljava/lang/String;",
        false,
    );
    WaterType::string()
}
