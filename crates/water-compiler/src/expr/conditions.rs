//! Conditions compiled straight into jumps.
//!
//! `if`, `while` and `for` never materialize their condition: comparisons
//! and `&&` / `||` branch directly to the statement's labels. A boolean
//! value is only produced when a comparison is used as an expression, by
//! [`materialize`].

use water_classfile::{Label, Opcode};
use water_parser::ast::{BinaryExpr, BinaryOp, Expr, LiteralExpr, LiteralKind, UnaryOp};

use super::binary::unsupported;
use super::{ExprCompiler, Result};
use crate::error::semantic;
use crate::types::{compare_insn, TypeKind, TypedCode, WaterType, OBJECT};

/// Compile a comparison or logical operator into `0` / `1`.
pub fn materialize(compiler: &mut ExprCompiler<'_>, bin: &BinaryExpr<'_>) -> Result<WaterType> {
    let when_false = compiler.code().new_label();
    let end = compiler.code().new_label();
    compiler.branch_binary(bin, when_false, false)?;
    compiler.code().push_int(1);
    compiler.code().jump(Opcode::Goto, end);
    compiler.code().bind(when_false)?;
    compiler.code().push_int(0);
    compiler.code().bind(end)?;
    Ok(WaterType::BOOLEAN)
}

/// Conditional jump taken when a comparison of two ints holds.
fn int_compare(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Less => Opcode::IfIcmplt,
        BinaryOp::LessEqual => Opcode::IfIcmple,
        BinaryOp::Greater => Opcode::IfIcmpgt,
        _ => Opcode::IfIcmpge,
    }
}

/// Conditional jump taken when the result of a `cmp` satisfies `op`.
fn zero_compare(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Less => Opcode::Iflt,
        BinaryOp::LessEqual => Opcode::Ifle,
        BinaryOp::Greater => Opcode::Ifgt,
        _ => Opcode::Ifge,
    }
}

fn negate(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Less => BinaryOp::GreaterEqual,
        BinaryOp::LessEqual => BinaryOp::Greater,
        BinaryOp::Greater => BinaryOp::LessEqual,
        _ => BinaryOp::Less,
    }
}

impl ExprCompiler<'_> {
    /// Compile `expr` as a condition: jump to `target` when it evaluates
    /// to `jump_if`, fall through otherwise.
    pub fn branch(&mut self, expr: &Expr<'_>, target: Label, jump_if: bool) -> Result<()> {
        match expr {
            Expr::Paren(p) => self.branch(p.expr, target, jump_if),
            Expr::Literal(LiteralExpr {
                kind: LiteralKind::Bool(value),
                ..
            }) => {
                if *value == jump_if {
                    self.code().jump(Opcode::Goto, target);
                }
                Ok(())
            }
            Expr::Unary(un) if un.op == UnaryOp::LogicalNot => {
                let ty = self.type_of(un.operand)?;
                if !ty.is_boolean() {
                    return Err(semantic(
                        &un.op_token,
                        format!("Can only perform '!' on boolean values. ({} =/= boolean)", ty),
                    ));
                }
                self.branch(un.operand, target, !jump_if)
            }
            Expr::Binary(bin)
                if bin.op.is_logical() || bin.op.is_relational() || bin.op.is_equality() =>
            {
                self.branch_binary(bin, target, jump_if)
            }
            _ => {
                let ty = self.type_of(expr)?;
                if !ty.is_boolean() {
                    return Err(semantic(
                        &expr.token(),
                        format!("Invalid condition type ({} =/= boolean)", ty),
                    ));
                }
                self.infer(expr)?;
                let op = if jump_if { Opcode::Ifne } else { Opcode::Ifeq };
                self.code().jump(op, target);
                Ok(())
            }
        }
    }

    pub(crate) fn branch_binary(&mut self, bin: &BinaryExpr<'_>, target: Label, jump_if: bool) -> Result<()> {
        match bin.op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => self.branch_logical(bin, target, jump_if),
            op if op.is_relational() => self.branch_relational(bin, target, jump_if),
            op if op.is_equality() => self.branch_equality(bin, target, jump_if),
            _ => {
                let ty = super::binary::compile_binary(self, bin)?;
                if !ty.is_boolean() {
                    return Err(semantic(
                        &bin.op_token,
                        format!("Invalid condition type ({} =/= boolean)", ty),
                    ));
                }
                let op = if jump_if { Opcode::Ifne } else { Opcode::Ifeq };
                self.code().jump(op, target);
                Ok(())
            }
        }
    }

    fn branch_logical(&mut self, bin: &BinaryExpr<'_>, target: Label, jump_if: bool) -> Result<()> {
        let left = self.type_of(bin.left)?;
        let right = self.type_of(bin.right)?;
        if !left.is_boolean() || !right.is_boolean() {
            return Err(unsupported(&bin.op_token, &left, &right));
        }
        // `a && b` is true only if both are; `a || b` is false only if both are.
        let short_value = bin.op == BinaryOp::LogicalOr;
        if jump_if == short_value {
            self.branch(bin.left, target, jump_if)?;
            self.branch(bin.right, target, jump_if)
        } else {
            let skip = self.code().new_label();
            self.branch(bin.left, skip, short_value)?;
            self.branch(bin.right, target, jump_if)?;
            self.code().bind(skip)?;
            Ok(())
        }
    }

    fn branch_relational(&mut self, bin: &BinaryExpr<'_>, target: Label, jump_if: bool) -> Result<()> {
        let left = self.type_of(bin.left)?;
        let right = self.type_of(bin.right)?;
        if !left.is_numeric() || !right.is_numeric() {
            return Err(unsupported(&bin.op_token, &left, &right));
        }
        let ty = left.promote(&right);
        self.infer(bin.left)?;
        self.code().cast_primitive(&left, &ty);
        self.infer(bin.right)?;
        self.code().cast_primitive(&right, &ty);

        let op = if jump_if { bin.op } else { negate(bin.op) };
        if ty.is_int_group() {
            self.code().jump(int_compare(op), target);
            return Ok(());
        }
        // NaN has to make the written comparison false.
        let less = matches!(bin.op, BinaryOp::Less | BinaryOp::LessEqual);
        let cmp = match (ty.kind(), less) {
            (TypeKind::Float, true) => Opcode::Fcmpg,
            (TypeKind::Float, false) => Opcode::Fcmpl,
            (TypeKind::Double, true) => Opcode::Dcmpg,
            (TypeKind::Double, false) => Opcode::Dcmpl,
            _ => Opcode::Lcmp,
        };
        self.code().emit(cmp);
        self.code().jump(zero_compare(op), target);
        Ok(())
    }

    fn branch_equality(&mut self, bin: &BinaryExpr<'_>, target: Label, jump_if: bool) -> Result<()> {
        let left = self.type_of(bin.left)?;
        let right = self.type_of(bin.right)?;
        if left.is_void() || right.is_void() {
            return Err(unsupported(&bin.op_token, &left, &right));
        }
        let by_reference = matches!(bin.op, BinaryOp::RefEqual | BinaryOp::RefNotEqual);
        let tests_equal = matches!(bin.op, BinaryOp::Equal | BinaryOp::RefEqual);
        let jump_on_equal = tests_equal == jump_if;

        if left.is_primitive() && right.is_primitive() {
            if by_reference {
                return Err(semantic(
                    &bin.op_token,
                    format!("Cannot perform address comparison on primitives ('{}', '{}')", left, right),
                ));
            }
            if left.is_boolean() != right.is_boolean() {
                return Err(unsupported(&bin.op_token, &left, &right));
            }
            let ty = if left.is_boolean() { WaterType::BOOLEAN } else { left.promote(&right) };
            self.infer(bin.left)?;
            self.code().cast_primitive(&left, &ty);
            self.infer(bin.right)?;
            self.code().cast_primitive(&right, &ty);
            match compare_insn(&ty) {
                Some(cmp) => {
                    self.code().emit(cmp);
                    let op = if jump_on_equal { Opcode::Ifeq } else { Opcode::Ifne };
                    self.code().jump(op, target);
                }
                None => {
                    let op = if jump_on_equal { Opcode::IfIcmpeq } else { Opcode::IfIcmpne };
                    self.code().jump(op, target);
                }
            }
            return Ok(());
        }

        if left.is_reference() && right.is_reference() {
            if left.is_null() || right.is_null() {
                let operand = if right.is_null() { bin.left } else { bin.right };
                self.infer(operand)?;
                let op = if jump_on_equal { Opcode::Ifnull } else { Opcode::Ifnonnull };
                self.code().jump(op, target);
                return Ok(());
            }
            if by_reference {
                self.infer(bin.left)?;
                self.infer(bin.right)?;
                let op = if jump_on_equal { Opcode::IfAcmpeq } else { Opcode::IfAcmpne };
                self.code().jump(op, target);
                return Ok(());
            }
            if left.is_nullable() {
                return Err(nullable_equality(&bin.op_token, &left));
            }
            self.infer(bin.left)?;
            self.infer(bin.right)?;
            self.call_equals(&left, target, jump_on_equal);
            return Ok(());
        }

        if by_reference {
            return Err(semantic(
                &bin.op_token,
                format!("Cannot perform address comparison on types ('{}', '{}')", left, right),
            ));
        }
        let boxed = left.box_type();
        if boxed.is_nullable() {
            return Err(nullable_equality(&bin.op_token, &boxed));
        }
        self.infer(bin.left)?;
        self.code().box_value(&left);
        self.infer(bin.right)?;
        self.code().box_value(&right);
        self.call_equals(&boxed, target, jump_on_equal);
        Ok(())
    }

    /// `left.equals(right)` with both operands on the stack.
    fn call_equals(&mut self, left: &WaterType, target: Label, jump_on_equal: bool) {
        let owner = match left.class_name() {
            Some(class) if !self.is_interface(class) => class.to_string(),
            _ => OBJECT.to_string(),
        };
        self.code().invoke(Opcode::Invokevirtual, &owner, "equals", "(Ljava/lang/Object;)Z", false);
        let op = if jump_on_equal { Opcode::Ifne } else { Opcode::Ifeq };
        self.code().jump(op, target);
    }
}

fn nullable_equality(token: &water_parser::Token<'_>, ty: &WaterType) -> crate::error::CompileError {
    semantic(
        token,
        format!("Cannot perform equality check on nullable type ('{}')", ty),
    )
}
