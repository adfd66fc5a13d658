//! Try/catch/finally compilation.
//!
//! ## Layout
//!
//! ```text
//! start:
//!   [try body]
//! end:
//!   [finally]                 ; normal exit
//!   goto after
//! handler_1:                  ; one per catch, for [start, end)
//!   astore binding
//!   [catch body]
//!   [finally]
//!   goto after
//! any:                        ; [start, end) and every catch body
//!   astore pending
//!   [finally]
//!   aload pending
//!   athrow
//! after:
//! ```
//!
//! A `return` inside the statement runs the `finally` block before
//! returning. The inlined copy is cut out of the handler ranges so the
//! block never runs twice for one exception.

use water_classfile::{Label, Opcode};
use water_parser::ast::{Block, CatchClause, TryStmt};

use super::{StmtCompiler, TryScope};
use crate::error::{semantic, ResolveExt, Result};
use crate::types::{TypedCode, WaterType, THROWABLE};

/// A protected code range and the gaps cut out of it.
struct Protected {
    start: Label,
    end: Label,
    gaps: Vec<(Label, Label)>,
}

impl<'a, 'ast> StmtCompiler<'a, 'ast> {
    pub fn compile_try(&mut self, stmt: &'ast TryStmt<'ast>) -> Result<()> {
        let mut catch_types = Vec::with_capacity(stmt.catches.len());
        for catch in stmt.catches {
            catch_types.push(self.catch_type(catch)?);
        }

        let after = self.frame.code.new_label();
        self.tries.push(TryScope {
            finally: stmt.finally,
            gaps: Vec::new(),
        });

        let body = self.protected(|this| this.compile_block(stmt.body))?;
        self.exit_normally(stmt.finally, after)?;

        let mut catch_ranges = Vec::with_capacity(stmt.catches.len());
        for (catch, ty) in stmt.catches.iter().zip(&catch_types) {
            let handler = self.frame.code.new_label();
            self.register(&body, handler, Some(ty.as_str()));
            self.frame.code.bind(handler)?;
            self.frame.locals.push_scope();
            let result = self.compile_catch(catch, ty);
            self.frame.locals.pop_scope();
            let range = result?;
            self.exit_normally(stmt.finally, after)?;
            catch_ranges.push(range);
        }

        self.tries.pop();
        if let Some(finally) = stmt.finally {
            let any = self.frame.code.new_label();
            self.register(&body, any, None);
            for range in &catch_ranges {
                self.register(range, any, None);
            }
            self.frame.code.bind(any)?;
            let pending = self.frame.locals.allocate(1);
            let throwable = WaterType::object(THROWABLE);
            self.frame.code.store_local(&throwable, pending);
            self.compile_block(finally)?;
            if self.frame.code.falls_through() {
                self.frame.code.load_local(&throwable, pending);
                self.frame.code.emit(Opcode::Athrow);
            }
        }
        self.frame.code.bind(after)?;
        Ok(())
    }

    /// Resolve and check the type a `catch` clause accepts.
    fn catch_type(&self, catch: &CatchClause<'_>) -> Result<String> {
        let token = catch.binding.token();
        let ty = self.ctx.resolve_type(&catch.ty, self.directory)?;
        if !ty.is_reference() {
            return Err(semantic(&token, format!("Cannot catch primitive type (got '{}').", ty)));
        }
        if ty.is_nullable() {
            return Err(semantic(&token, format!("Cannot catch nullable type '{}'", ty)));
        }
        let throwable = WaterType::object(THROWABLE);
        let is_throwable = throwable.is_assignable_from(&ty, self.directory).at(&token)?;
        match ty.class_name() {
            Some(class) if is_throwable => Ok(class.to_string()),
            _ => Err(semantic(
                &token,
                format!("catch target must be an extension of java.lang.Throwable ('{}' cannot be cast).", ty),
            )),
        }
    }

    /// Compile a catch body; the exception is on the stack.
    fn compile_catch(&mut self, catch: &'ast CatchClause<'ast>, class: &str) -> Result<Protected> {
        let ty = WaterType::object(class);
        let slot = self.frame.locals.declare(catch.binding.name, ty.clone(), true).map_err(|_| {
            semantic(
                &catch.binding.token(),
                format!("Redefinition of variable '{}' in same scope.", catch.binding.name),
            )
        })?;
        self.frame.code.store_local(&ty, slot);
        self.protected(|this| this.compile_stmts(catch.body.stmts))
    }

    /// Run `f`, returning the code range it emitted and the inlined
    /// `finally` copies inside it.
    fn protected(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<Protected> {
        let start = self.frame.code.new_label();
        let end = self.frame.code.new_label();
        self.frame.code.bind(start)?;
        let outer_gaps = self
            .tries
            .last_mut()
            .map(|scope| std::mem::take(&mut scope.gaps))
            .unwrap_or_default();
        let result = f(self);
        let gaps = match self.tries.last_mut() {
            Some(scope) => std::mem::replace(&mut scope.gaps, outer_gaps),
            None => Vec::new(),
        };
        result?;
        self.frame.code.bind(end)?;
        Ok(Protected { start, end, gaps })
    }

    /// Leave the statement on the normal path.
    fn exit_normally(&mut self, finally: Option<&'ast Block<'ast>>, after: Label) -> Result<()> {
        if !self.frame.code.falls_through() {
            return Ok(());
        }
        if let Some(finally) = finally {
            self.compile_finally_copy(finally)?;
        }
        if self.frame.code.falls_through() {
            self.frame.code.jump(Opcode::Goto, after);
        }
        Ok(())
    }

    /// Register `handler` for `range` minus its gaps.
    fn register(&mut self, range: &Protected, handler: Label, catch_type: Option<&str>) {
        let mut from = range.start;
        for &(gap_start, gap_end) in &range.gaps {
            self.frame.code.try_catch(from, gap_start, handler, catch_type);
            from = gap_end;
        }
        self.frame.code.try_catch(from, range.end, handler, catch_type);
    }

    /// Whether a `return` here has `finally` blocks to run first.
    pub(super) fn has_finally(&self) -> bool {
        self.tries.iter().any(|scope| scope.finally.is_some())
    }

    /// Inline every enclosing `finally`, innermost first, before a
    /// `return`.
    pub(super) fn unwind_finally(&mut self) -> Result<()> {
        for depth in (0..self.tries.len()).rev() {
            let Some(finally) = self.tries[depth].finally else { continue };
            let start = self.frame.code.new_label();
            let end = self.frame.code.new_label();
            self.frame.code.bind(start)?;
            let inner = self.tries.split_off(depth);
            let result = self.compile_block(finally);
            self.tries.extend(inner);
            result?;
            self.frame.code.bind(end)?;
            for scope in &mut self.tries[depth..] {
                scope.gaps.push((start, end));
            }
        }
        Ok(())
    }

    /// Compile a copy of `finally` for a normal exit. The block belongs to
    /// the innermost `try`, which does not protect it.
    fn compile_finally_copy(&mut self, finally: &'ast Block<'ast>) -> Result<()> {
        let depth = self.tries.len().saturating_sub(1);
        let inner = self.tries.split_off(depth);
        let result = self.compile_block(finally);
        self.tries.extend(inner);
        result
    }
}
