//! `while` and `for` loops.
//!
//! ```text
//! start:
//!   [condition, jump to end when false]
//!   [body]
//!   [update]            ; for loops only
//!   goto start
//! end:
//! ```

use water_classfile::{Label, Opcode};
use water_parser::ast::{Expr, ForInit, ForStmt, WhileStmt};
use water_parser::Token;

use super::StmtCompiler;
use crate::error::{semantic, Result};

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    pub fn compile_while(&mut self, stmt: &'ast WhileStmt<'ast>) -> Result<()> {
        let start = self.frame.code.new_label();
        let end = self.frame.code.new_label();
        self.frame.code.bind(start)?;
        self.loop_condition(stmt.condition, &stmt.while_token, end)?;
        self.compile(&stmt.body)?;
        if self.frame.code.falls_through() {
            self.frame.code.jump(Opcode::Goto, start);
        }
        self.frame.code.bind(end)?;
        Ok(())
    }

    pub fn compile_for(&mut self, stmt: &'ast ForStmt<'ast>) -> Result<()> {
        self.frame.locals.push_scope();
        let result = self.compile_for_inner(stmt);
        self.frame.locals.pop_scope();
        result
    }

    fn compile_for_inner(&mut self, stmt: &'ast ForStmt<'ast>) -> Result<()> {
        match stmt.init {
            ForInit::Var(decl) => self.compile_var_decl(decl)?,
            ForInit::Expr(expr) => self.expr_compiler().compile_discard(expr)?,
        }
        let start = self.frame.code.new_label();
        let end = self.frame.code.new_label();
        self.frame.code.bind(start)?;
        self.frame.invalidate_types();
        self.loop_condition(stmt.condition, &stmt.for_token, end)?;
        self.compile(&stmt.body)?;
        self.frame.invalidate_types();
        self.frame.mark_line(stmt.update.span().line);
        self.expr_compiler().compile_discard(stmt.update)?;
        self.frame.code.jump(Opcode::Goto, start);
        self.frame.code.bind(end)?;
        Ok(())
    }

    fn loop_condition(&mut self, condition: &Expr<'_>, token: &Token<'_>, exit: Label) -> Result<()> {
        let mut compiler = self.expr_compiler();
        let ty = compiler.type_of(condition)?;
        if !ty.is_boolean() {
            return Err(semantic(token, format!("Invalid condition type ({} =/= boolean)", ty)));
        }
        compiler.branch(condition, exit, false)
    }
}
