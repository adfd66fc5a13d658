//! Statement compiler.
//!
//! The [`StmtCompiler`] compiles statements into the current [`Frame`],
//! handling:
//! - Blocks with nested local scopes
//! - Local `var` / `const` declarations
//! - `if` / `else` with `instanceof` narrowing
//! - `while` and `for` loops
//! - `return` and `throw`
//! - `try` / `catch` / `finally`
//!
//! Conditions are compiled straight into jumps with
//! [`ExprCompiler::branch`]. Every `finally` block is copied onto each
//! path that leaves its `try`: the normal exits, the catch-all handler
//! and every `return` in between.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = StmtCompiler::new(ctx, directory, &mut frame);
//! compiler.compile_stmts(body.stmts)?;
//! ```

mod block;
mod if_stmt;
mod loops;
mod return_stmt;
mod try_catch;
mod var_decl;

use water_classfile::Label;
use water_parser::ast::{Block, Stmt};

use crate::context::CompilationContext;
use crate::directory::TypeDirectory;
use crate::error::Result;
use crate::expr::ExprCompiler;
use crate::function_compiler::Frame;

pub(crate) use var_decl::{declared_type, default_value};

/// A `try` statement being compiled.
#[derive(Debug)]
struct TryScope<'ast> {
    finally: Option<&'ast Block<'ast>>,
    /// Code ranges holding inlined copies of `finally` blocks. They are
    /// cut out of this statement's handler ranges.
    gaps: Vec<(Label, Label)>,
}

/// Compiles statements into a method frame.
pub struct StmtCompiler<'a, 'ast> {
    ctx: &'a CompilationContext,
    directory: &'a dyn TypeDirectory,
    frame: &'a mut Frame,
    /// Enclosing `try` statements, innermost last.
    tries: Vec<TryScope<'ast>>,
}

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    pub fn new(ctx: &'a CompilationContext, directory: &'a dyn TypeDirectory, frame: &'a mut Frame) -> Self {
        Self {
            ctx,
            directory,
            frame,
            tries: Vec::new(),
        }
    }

    pub fn compile_stmts(&mut self, stmts: &'ast [Stmt<'ast>]) -> Result<()> {
        for stmt in stmts {
            self.compile(stmt)?;
        }
        Ok(())
    }

    /// Compile a single statement.
    pub fn compile(&mut self, stmt: &'ast Stmt<'ast>) -> Result<()> {
        self.frame.invalidate_types();
        self.frame.mark_line(stmt.span().line);
        match *stmt {
            Stmt::Block(block) => self.compile_block(block),
            Stmt::If(if_stmt) => self.compile_if(if_stmt),
            Stmt::While(while_stmt) => self.compile_while(while_stmt),
            Stmt::For(for_stmt) => self.compile_for(for_stmt),
            Stmt::Return(ret) => self.compile_return(ret),
            Stmt::Throw(throw) => self.compile_throw(throw),
            Stmt::Try(try_stmt) => self.compile_try(try_stmt),
            Stmt::Var(decl) => self.compile_var_decl(decl),
            Stmt::Expr(expr_stmt) => self.expr_compiler().compile_discard(expr_stmt.expr),
        }
    }

    fn expr_compiler(&mut self) -> ExprCompiler<'_> {
        ExprCompiler::new(self.ctx, self.directory, self.frame)
    }
}

#[cfg(test)]
mod tests;
