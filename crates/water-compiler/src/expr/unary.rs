//! Unary operator compilation: `-`, `~`, `!` and `++` / `--` in both
//! positions.

use water_classfile::Opcode;
use water_core::SemanticErrorKind;
use water_parser::ast::{Expr, PostfixExpr, PostfixOp, UnaryExpr, UnaryOp};
use water_parser::Token;

use super::assignment::{check_writable, store_plan};
use super::place::{resolve_place, Target};
use super::{ExprCompiler, Result};
use crate::error::{semantic, semantic_kind};
use crate::types::{TypeKind, TypedCode, WaterType};

pub fn compile_unary(compiler: &mut ExprCompiler<'_>, un: &UnaryExpr<'_>, keep: bool) -> Result<WaterType> {
    match un.op {
        UnaryOp::PreInc => compile_update(compiler, un.operand, &un.op_token, 1, true, keep),
        UnaryOp::PreDec => compile_update(compiler, un.operand, &un.op_token, -1, true, keep),
        UnaryOp::Neg => {
            let ty = compiler.type_of(un.operand)?;
            if !ty.is_numeric() {
                return Err(semantic_kind(
                    SemanticErrorKind::UnsupportedOperation,
                    &un.op_token,
                    format!("Can only perform '-' on numeric values. ({} is not numeric)", ty),
                ));
            }
            let result = ty.promote(&ty);
            compiler.infer(un.operand)?;
            compiler.code().cast_primitive(&ty, &result);
            let op = match result.kind() {
                TypeKind::Long => Opcode::Lneg,
                TypeKind::Float => Opcode::Fneg,
                TypeKind::Double => Opcode::Dneg,
                _ => Opcode::Ineg,
            };
            compiler.code().emit(op);
            Ok(result)
        }
        UnaryOp::BitwiseNot => {
            let ty = compiler.type_of(un.operand)?;
            if !ty.is_integer() {
                return Err(semantic_kind(
                    SemanticErrorKind::UnsupportedOperation,
                    &un.op_token,
                    format!("Can only perform '~' on integer values. ({} is not an integer)", ty),
                ));
            }
            let result = ty.promote(&ty);
            compiler.infer(un.operand)?;
            compiler.code().cast_primitive(&ty, &result);
            compiler.code().push_as(&result, -1);
            let op = if result == WaterType::LONG { Opcode::Lxor } else { Opcode::Ixor };
            compiler.code().emit(op);
            Ok(result)
        }
        UnaryOp::LogicalNot => {
            let ty = compiler.type_of(un.operand)?;
            if !ty.is_boolean() {
                return Err(semantic(
                    &un.op_token,
                    format!("Can only perform '!' on boolean values. ({} =/= boolean)", ty),
                ));
            }
            compiler.infer(un.operand)?;
            compiler.code().push_int(1);
            compiler.code().emit(Opcode::Ixor);
            Ok(WaterType::BOOLEAN)
        }
    }
}

pub fn compile_postfix(compiler: &mut ExprCompiler<'_>, post: &PostfixExpr<'_>, keep: bool) -> Result<WaterType> {
    let delta = match post.op {
        PostfixOp::PostInc => 1,
        PostfixOp::PostDec => -1,
    };
    compile_update(compiler, post.operand, &post.op_token, delta, false, keep)
}

/// `++x`, `x--` and friends. The value before (postfix) or after (prefix)
/// the update is left on the stack when `keep` is set.
fn compile_update(
    compiler: &mut ExprCompiler<'_>,
    target: &Expr<'_>,
    token: &Token<'_>,
    delta: i16,
    prefix: bool,
    keep: bool,
) -> Result<WaterType> {
    let place = resolve_place(compiler, target, "Invalid lvalue - cannot perform operation")?;
    check_writable(&place)?;
    let ty = place.ty.clone();
    if !ty.is_numeric() {
        return Err(semantic_kind(
            SemanticErrorKind::UnsupportedOperation,
            token,
            format!("Update expression ('{}') target must be numeric (got '{}')", token.lexeme, ty),
        ));
    }
    let result = if keep { ty.clone() } else { WaterType::VOID };

    if let Target::Local(slot) = place.target
        && ty == WaterType::INT
    {
        if keep && !prefix {
            compiler.code().load_local(&ty, slot);
        }
        compiler.code().iinc(slot, delta);
        if keep && prefix {
            compiler.code().load_local(&ty, slot);
        }
        return Ok(result);
    }

    let (store_ty, setter) = store_plan(compiler, &place, &ty, token)?;
    let slots = place.receiver_slots();
    let chain = compiler.emit_receivers(&place)?;
    compiler.dup_receivers(&place);
    compiler.load_place(&place);
    if keep && !prefix {
        compiler.code().dup_value_under(&ty, slots);
    }
    let op_ty = ty.promote(&ty);
    compiler.code().cast_primitive(&ty, &op_ty);
    compiler.code().push_as(&op_ty, i32::from(delta));
    let op = match op_ty.kind() {
        TypeKind::Long => Opcode::Ladd,
        TypeKind::Float => Opcode::Fadd,
        TypeKind::Double => Opcode::Dadd,
        _ => Opcode::Iadd,
    };
    compiler.code().emit(op);
    compiler.code().cast_primitive(&op_ty, &ty);
    if keep && prefix {
        compiler.code().dup_value_under(&ty, slots);
    }
    compiler.code().cast_primitive(&ty, &store_ty);
    compiler.store_place(&place, setter.as_ref())?;
    match chain {
        Some(chain) => compiler.close_null_chain(chain, keep.then_some(&ty)),
        None => Ok(result),
    }
}
