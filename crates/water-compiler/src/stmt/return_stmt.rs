//! `return` and `throw`.

use water_classfile::Opcode;
use water_parser::ast::{ReturnStmt, ThrowStmt};

use super::StmtCompiler;
use crate::error::{semantic, Result};
use crate::types::{TypedCode, WaterType, THROWABLE};

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    pub fn compile_return(&mut self, ret: &'ast ReturnStmt<'ast>) -> Result<()> {
        let token = ret.return_token;
        let expected = self.frame.return_type.clone();
        let Some(value) = ret.value else {
            if !expected.is_void() {
                return Err(semantic(&token, "Non-void function's return must have a value."));
            }
            self.unwind_finally()?;
            self.frame.code.return_value(&WaterType::VOID);
            return Ok(());
        };

        let mut compiler = self.expr_compiler();
        let ty = compiler.type_of(value)?;
        if ty.is_void() {
            return Err(semantic(&token, "Cannot return void value"));
        }
        if expected.is_void() {
            return Err(semantic(&token, "Cannot return value from void function"));
        }
        if !compiler.is_assignable(&expected, &ty, &token)? {
            return Err(semantic(
                &token,
                format!("Cannot return type '{}' from function expecting '{}'", ty, expected),
            ));
        }
        compiler.infer(value)?;
        compiler.code().cast_primitive(&ty, &expected);

        if self.has_finally() {
            // The value waits in a local while the finally blocks run.
            let slot = self.frame.locals.allocate(expected.size());
            self.frame.code.store_local(&expected, slot);
            self.unwind_finally()?;
            self.frame.code.load_local(&expected, slot);
        }
        self.frame.code.return_value(&expected);
        Ok(())
    }

    pub fn compile_throw(&mut self, throw: &'ast ThrowStmt<'ast>) -> Result<()> {
        let token = throw.throw_token;
        let mut compiler = self.expr_compiler();
        let ty = compiler.type_of(throw.value)?;
        if !ty.is_reference() {
            return Err(semantic(&token, format!("Cannot throw primitive type (got '{}').", ty)));
        }
        let throwable = WaterType::object(THROWABLE);
        if !ty.is_null() && !compiler.is_assignable(&throwable, &ty.as_non_nullable(), &token)? {
            return Err(semantic(
                &token,
                format!(
                    "throw target must be an extension of java.lang.Throwable ('{}' cannot be cast).",
                    ty
                ),
            ));
        }
        compiler.infer(throw.value)?;
        compiler.code().emit(Opcode::Athrow);
        Ok(())
    }
}
