//! Array construction: `new T[n]` and `new T[n][m]...`.

use water_classfile::{ArrayType, Opcode};
use water_parser::ast::NewArrayExpr;

use super::{ExprCompiler, Result};
use crate::error::semantic;
use crate::types::{TypeKind, TypedCode, WaterType};

fn primitive_array(element: &WaterType) -> Option<ArrayType> {
    Some(match element.kind() {
        TypeKind::Boolean => ArrayType::Boolean,
        TypeKind::Char => ArrayType::Char,
        TypeKind::Float => ArrayType::Float,
        TypeKind::Double => ArrayType::Double,
        TypeKind::Byte => ArrayType::Byte,
        TypeKind::Short => ArrayType::Short,
        TypeKind::Int => ArrayType::Int,
        TypeKind::Long => ArrayType::Long,
        _ => return None,
    })
}

pub fn compile_new_array(compiler: &mut ExprCompiler<'_>, new: &NewArrayExpr<'_>) -> Result<WaterType> {
    let token = new.new_token;
    let element = compiler.ctx.resolve_type(&new.element, compiler.directory)?;
    if element.is_void() {
        return Err(semantic(&token, "Cannot create an array of void"));
    }
    if new.sizes.is_empty() {
        return Err(semantic(&token, "Array must have first dimension initialized"));
    }
    let mut ty = element.clone();
    for size in new.sizes {
        if !compiler.type_of(size)?.is_int_group() {
            return Err(semantic(&token, "Array size must be an integer"));
        }
        ty = WaterType::array_of(ty);
    }

    for size in new.sizes {
        let size_ty = compiler.type_of(size)?;
        compiler.infer(size)?;
        compiler.code().cast_primitive(&size_ty, &WaterType::INT);
    }
    if let [_] = new.sizes {
        match (primitive_array(&element), element.reference_operand()) {
            (Some(array), _) => compiler.code().newarray(array),
            (None, Some(operand)) => compiler.code().type_insn(Opcode::Anewarray, &operand),
            (None, None) => return Err(semantic(&token, format!("Cannot create an array of '{}'", element))),
        }
    } else {
        let dimensions = u8::try_from(new.sizes.len()).map_err(|_| semantic(&token, "Too many array dimensions"))?;
        compiler.code().multianewarray(&ty.descriptor(), dimensions);
    }
    Ok(ty)
}
