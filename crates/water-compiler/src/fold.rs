//! Compile-time constants and constant folding.
//!
//! Folding follows the runtime semantics of the JVM: operands are promoted
//! to the wider of both types (never narrower than `int`), integer
//! arithmetic wraps and division truncates. Integer division by zero is
//! left to the runtime so that it still throws.

use water_classfile::CodeBuilder;
use water_parser::ast::{BinaryOp, UnaryOp};

use crate::types::WaterType;

/// A value known at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

impl Constant {
    pub fn ty(&self) -> WaterType {
        match self {
            Constant::Bool(_) => WaterType::BOOLEAN,
            Constant::Char(_) => WaterType::CHAR,
            Constant::Int(_) => WaterType::INT,
            Constant::Long(_) => WaterType::LONG,
            Constant::Float(_) => WaterType::FLOAT,
            Constant::Double(_) => WaterType::DOUBLE,
            Constant::Str(_) => WaterType::string(),
        }
    }

    /// Push the constant.
    pub fn emit(&self, code: &mut CodeBuilder) {
        match self {
            Constant::Bool(v) => code.push_int(*v as i32),
            Constant::Char(v) => code.push_int(*v as i32),
            Constant::Int(v) => code.push_int(*v),
            Constant::Long(v) => code.push_long(*v),
            Constant::Float(v) => code.push_float(*v),
            Constant::Double(v) => code.push_double(*v),
            Constant::Str(v) => code.push_string(v),
        }
    }

    fn as_long(&self) -> Option<i64> {
        match self {
            Constant::Char(v) => Some(*v as i64),
            Constant::Int(v) => Some(*v as i64),
            Constant::Long(v) => Some(*v),
            _ => None,
        }
    }

    fn as_double(&self) -> Option<f64> {
        match self {
            Constant::Float(v) => Some(*v as f64),
            Constant::Double(v) => Some(*v),
            _ => self.as_long().map(|v| v as f64),
        }
    }

    /// Text produced by string conversion, when it can be computed
    /// exactly. Floating point values are never converted.
    fn display(&self) -> Option<String> {
        match self {
            Constant::Bool(v) => Some(v.to_string()),
            Constant::Char(v) => char::from_u32(*v as u32).map(String::from),
            Constant::Int(v) => Some(v.to_string()),
            Constant::Long(v) => Some(v.to_string()),
            Constant::Str(v) => Some(v.clone()),
            Constant::Float(_) | Constant::Double(_) => None,
        }
    }

    /// Concatenate two constants, at least one of them a string.
    pub fn concat(left: &Constant, right: &Constant) -> Option<Constant> {
        if !matches!(left, Constant::Str(_)) && !matches!(right, Constant::Str(_)) {
            return None;
        }
        Some(Constant::Str(format!("{}{}", left.display()?, right.display()?)))
    }

    /// Fold an arithmetic, bitwise or shift operator.
    pub fn binary(op: BinaryOp, left: &Constant, right: &Constant) -> Option<Constant> {
        let left_ty = left.ty();
        let right_ty = right.ty();
        if !left_ty.is_numeric() || !right_ty.is_numeric() {
            return None;
        }
        if op.is_integer() {
            return integer_op(op, left, right);
        }
        let result = left_ty.promote(&right_ty);
        if result == WaterType::INT {
            let (a, b) = (left.as_long()? as i32, right.as_long()? as i32);
            let value = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b != 0 => a.wrapping_div(b),
                BinaryOp::Mod if b != 0 => a.wrapping_rem(b),
                _ => return None,
            };
            Some(Constant::Int(value))
        } else if result == WaterType::LONG {
            let (a, b) = (left.as_long()?, right.as_long()?);
            let value = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div if b != 0 => a.wrapping_div(b),
                BinaryOp::Mod if b != 0 => a.wrapping_rem(b),
                _ => return None,
            };
            Some(Constant::Long(value))
        } else if result == WaterType::FLOAT {
            let (a, b) = (left.as_double()? as f32, right.as_double()? as f32);
            Some(Constant::Float(float_op(op, a, b)?))
        } else {
            let (a, b) = (left.as_double()?, right.as_double()?);
            Some(Constant::Double(float_op(op, a, b)?))
        }
    }

    /// Fold `-`, `~` or `!`.
    pub fn unary(op: UnaryOp, operand: &Constant) -> Option<Constant> {
        match (op, operand) {
            (UnaryOp::LogicalNot, Constant::Bool(v)) => Some(Constant::Bool(!v)),
            (UnaryOp::Neg, Constant::Char(v)) => Some(Constant::Int(-(*v as i32))),
            (UnaryOp::Neg, Constant::Int(v)) => Some(Constant::Int(v.wrapping_neg())),
            (UnaryOp::Neg, Constant::Long(v)) => Some(Constant::Long(v.wrapping_neg())),
            (UnaryOp::Neg, Constant::Float(v)) => Some(Constant::Float(-v)),
            (UnaryOp::Neg, Constant::Double(v)) => Some(Constant::Double(-v)),
            (UnaryOp::BitwiseNot, Constant::Char(v)) => Some(Constant::Int(!(*v as i32))),
            (UnaryOp::BitwiseNot, Constant::Int(v)) => Some(Constant::Int(!v)),
            (UnaryOp::BitwiseNot, Constant::Long(v)) => Some(Constant::Long(!v)),
            _ => None,
        }
    }
}

fn integer_op(op: BinaryOp, left: &Constant, right: &Constant) -> Option<Constant> {
    let (a, b) = (left.as_long()?, right.as_long()?);
    let wide = matches!(left, Constant::Long(_));
    let is_shift = matches!(
        op,
        BinaryOp::ShiftLeft | BinaryOp::ShiftRight | BinaryOp::ShiftRightUnsigned
    );
    if !is_shift && (wide || matches!(right, Constant::Long(_))) {
        let value = match op {
            BinaryOp::BitwiseAnd => a & b,
            BinaryOp::BitwiseOr => a | b,
            BinaryOp::BitwiseXor => a ^ b,
            _ => return None,
        };
        return Some(Constant::Long(value));
    }
    if wide {
        let shift = (b & 63) as u32;
        let value = match op {
            BinaryOp::ShiftLeft => a.wrapping_shl(shift),
            BinaryOp::ShiftRight => a.wrapping_shr(shift),
            BinaryOp::ShiftRightUnsigned => ((a as u64) >> shift) as i64,
            _ => return None,
        };
        return Some(Constant::Long(value));
    }
    let (a, b) = (a as i32, b as i32);
    let shift = (b & 31) as u32;
    let value = match op {
        BinaryOp::BitwiseAnd => a & b,
        BinaryOp::BitwiseOr => a | b,
        BinaryOp::BitwiseXor => a ^ b,
        BinaryOp::ShiftLeft => a.wrapping_shl(shift),
        BinaryOp::ShiftRight => a.wrapping_shr(shift),
        BinaryOp::ShiftRightUnsigned => ((a as u32) >> shift) as i32,
        _ => return None,
    };
    Some(Constant::Int(value))
}

fn float_op<F>(op: BinaryOp, a: F, b: F) -> Option<F>
where
    F: std::ops::Add<Output = F>
        + std::ops::Sub<Output = F>
        + std::ops::Mul<Output = F>
        + std::ops::Div<Output = F>
        + std::ops::Rem<Output = F>,
{
    Some(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        _ => return None,
    })
}
