//! If/else statement compilation.
//!
//! The condition jumps straight to the else branch (or the end) when it
//! does not hold. A condition of the form `name instanceof T` on a local
//! narrows `name` to `T` inside the then branch.

use water_classfile::Opcode;
use water_parser::ast::{Expr, IfStmt};

use super::StmtCompiler;
use crate::error::{semantic, Result};
use crate::scope::VariableKind;
use crate::types::{TypedCode, WaterType};

/// A local whose static type was narrowed, and the type to restore.
struct Narrowed {
    name: String,
    previous: WaterType,
}

fn strip_parens<'e, 'ast>(mut expr: &'e Expr<'ast>) -> &'e Expr<'ast> {
    while let Expr::Paren(p) = expr {
        expr = p.expr;
    }
    expr
}

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    pub fn compile_if(&mut self, if_stmt: &'ast IfStmt<'ast>) -> Result<()> {
        let mut compiler = self.expr_compiler();
        let condition_ty = compiler.type_of(if_stmt.condition)?;
        if !condition_ty.is_boolean() {
            return Err(semantic(
                &if_stmt.if_token,
                format!("Invalid condition type ({} =/= boolean)", condition_ty),
            ));
        }
        let otherwise = compiler.code().new_label();
        compiler.branch(if_stmt.condition, otherwise, false)?;

        let narrowed = self.narrow(if_stmt.condition)?;
        let then_result = self.compile(&if_stmt.then_branch);
        if let Some(narrowed) = narrowed {
            self.frame.locals.retype(&narrowed.name, narrowed.previous);
        }
        then_result?;

        match &if_stmt.else_branch {
            Some(else_branch) => {
                let end = self.frame.code.new_label();
                if self.frame.code.falls_through() {
                    self.frame.code.jump(Opcode::Goto, end);
                }
                self.frame.code.bind(otherwise)?;
                self.compile(else_branch)?;
                self.frame.code.bind(end)?;
            }
            None => self.frame.code.bind(otherwise)?,
        }
        Ok(())
    }

    /// Narrow a local tested with `instanceof`. The value is cast and
    /// stored back so the slot holds the narrowed type.
    fn narrow(&mut self, condition: &'ast Expr<'ast>) -> Result<Option<Narrowed>> {
        let Expr::InstanceOf(test) = strip_parens(condition) else { return Ok(None) };
        let Expr::Ident(ident) = strip_parens(test.expr) else { return Ok(None) };
        let Some(variable) = self.frame.locals.lookup(ident.name).cloned() else { return Ok(None) };
        let VariableKind::Local(slot) = variable.kind else { return Ok(None) };

        let target = self.ctx.resolve_type(&test.ty, self.directory)?;
        let compiler = self.expr_compiler();
        let current = variable.ty.as_non_nullable();
        if !compiler.is_assignable(&current, &target, &test.op_token)?
            && !compiler.is_assignable(&target, &current, &test.op_token)?
        {
            return Err(semantic(
                &test.op_token,
                format!("Cannot check for an instance between '{}' and '{}'", variable.ty, target),
            ));
        }
        let Some(operand) = target.reference_operand() else { return Ok(None) };

        let code = &mut self.frame.code;
        code.load_local(&variable.ty, slot);
        code.type_insn(Opcode::Checkcast, &operand);
        code.store_local(&target, slot);
        let previous = self.frame.locals.retype(ident.name, target).unwrap_or(variable.ty);
        Ok(Some(Narrowed {
            name: ident.name.to_string(),
            previous,
        }))
    }
}
