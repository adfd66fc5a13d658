//! Function compiler for generating bytecode from function bodies.
//!
//! This module provides [`FunctionCompiler`], which compiles one method
//! body into a [`CodeBuilder`]. It handles:
//!
//! - Reserving `this` and declaring parameters as locals
//! - Compiling block bodies and `= expr` bodies
//! - Verifying return paths for non-void functions
//! - Appending the implicit `return` of void functions
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = FunctionCompiler::new(ctx, directory, "demo/MainWtr", true, WaterType::INT);
//! compiler.setup_parameters(&params)?;
//! compiler.compile_body(body)?;
//! compiler.verify_returns(body, &name_token)?;
//! let code = compiler.finish();
//! ```

use rustc_hash::FxHashMap;
use water_classfile::CodeBuilder;
use water_core::{SemanticErrorKind, Span};
use water_parser::ast::{Block, Expr, Ident};
use water_parser::Token;

use crate::context::CompilationContext;
use crate::directory::TypeDirectory;
use crate::error::{semantic, semantic_kind, ResolveExt, Result};
use crate::expr::ExprCompiler;
use crate::return_checker::ReturnChecker;
use crate::scope::LocalScope;
use crate::stmt::StmtCompiler;
use crate::types::{TypedCode, WaterType};

/// Mutable state of the method being compiled.
///
/// Expression and statement compilers borrow the frame; the
/// [`CompilationContext`] stays shared and immutable.
#[derive(Debug)]
pub struct Frame {
    /// Internal name of the class the method belongs to.
    pub class: String,
    pub is_static: bool,
    pub is_constructor: bool,
    pub return_type: WaterType,
    pub code: CodeBuilder,
    pub locals: LocalScope,
    last_line: u32,
    /// Types already computed for expressions of the current statement,
    /// keyed by node address and span.
    pub(crate) types: FxHashMap<(usize, Span), WaterType>,
}

impl Frame {
    /// A frame whose locals start after `this` for instance methods.
    pub fn new(class: impl Into<String>, is_static: bool, return_type: WaterType) -> Self {
        let reserved = if is_static { 0 } else { 1 };
        Self {
            class: class.into(),
            is_static,
            is_constructor: false,
            return_type,
            code: CodeBuilder::new(reserved),
            locals: LocalScope::new(reserved),
            last_line: 0,
            types: FxHashMap::default(),
        }
    }

    /// Emit a line number entry when `line` differs from the last one.
    pub fn mark_line(&mut self, line: u32) {
        if line != self.last_line && line > 0 {
            self.last_line = line;
            self.code.line(u16::try_from(line).unwrap_or(u16::MAX));
        }
    }

    /// Forget cached expression types.
    pub(crate) fn invalidate_types(&mut self) {
        self.types.clear();
    }

    /// A throwaway copy used to compute an expression's type without
    /// touching the real instruction stream.
    pub(crate) fn scratch(&mut self) -> Frame {
        Frame {
            class: self.class.clone(),
            is_static: self.is_static,
            is_constructor: self.is_constructor,
            return_type: self.return_type.clone(),
            code: CodeBuilder::new(0),
            locals: self.locals.clone(),
            last_line: self.last_line,
            types: std::mem::take(&mut self.types),
        }
    }
}

/// Compiles a single function body.
pub struct FunctionCompiler<'a> {
    ctx: &'a CompilationContext,
    directory: &'a dyn TypeDirectory,
    frame: Frame,
}

impl<'a> FunctionCompiler<'a> {
    pub fn new(
        ctx: &'a CompilationContext,
        directory: &'a dyn TypeDirectory,
        class: &str,
        is_static: bool,
        return_type: WaterType,
    ) -> Self {
        Self {
            ctx,
            directory,
            frame: Frame::new(class, is_static, return_type),
        }
    }

    /// A compiler for a constructor (or `<clinit>` when `is_static`).
    pub fn constructor(
        ctx: &'a CompilationContext,
        directory: &'a dyn TypeDirectory,
        class: &str,
        is_static: bool,
    ) -> Self {
        let mut compiler = Self::new(ctx, directory, class, is_static, WaterType::VOID);
        compiler.frame.is_constructor = !is_static;
        compiler
    }

    /// Declare the parameters as the first locals.
    pub fn setup_parameters(&mut self, params: &[(Ident<'_>, WaterType)]) -> Result<()> {
        for (name, ty) in params {
            self.frame.locals.declare(name.name, ty.clone(), false).map_err(|_| {
                semantic_kind(
                    SemanticErrorKind::Redefinition,
                    &name.token(),
                    format!("Redefinition of variable '{}' in same scope.", name.name),
                )
            })?;
        }
        let slots = self.frame.locals.next_slot();
        if slots > 0 {
            // max_locals has to cover parameters the body never reads.
            self.frame.code = CodeBuilder::new(slots);
        }
        Ok(())
    }

    /// Run `f` with an expression compiler over this function's frame.
    pub fn with_expr<R>(&mut self, f: impl FnOnce(&mut ExprCompiler<'_>) -> Result<R>) -> Result<R> {
        let mut compiler = ExprCompiler::new(self.ctx, self.directory, &mut self.frame);
        f(&mut compiler)
    }

    pub fn frame_mut(&mut self) -> &mut Frame {
        &mut self.frame
    }

    /// Run `f` with the declared locals out of scope; their slots stay
    /// taken. Field initializers of a constructor cannot see its
    /// parameters.
    pub fn with_hidden_locals<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let reserved = self.frame.locals.next_slot();
        let hidden = std::mem::replace(&mut self.frame.locals, LocalScope::new(reserved));
        let result = f(self);
        self.frame.locals = hidden;
        result
    }

    /// Compile a block body.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_body(&mut self, body: &Block<'_>) -> Result<()> {
        let mut compiler = StmtCompiler::new(self.ctx, self.directory, &mut self.frame);
        compiler.compile_stmts(body.stmts)
    }

    /// Compile an `= expr` body and return its value.
    pub fn compile_expr_body(&mut self, body: &Expr<'_>) -> Result<()> {
        self.frame.mark_line(body.span().line);
        let return_type = self.frame.return_type.clone();
        let directory = self.directory;
        self.with_expr(|c| {
            if return_type.is_void() {
                return c.compile_discard(body);
            }
            let ty = c.type_of(body)?;
            if !return_type.is_assignable_from(&ty, directory).at(&body.token())? {
                return Err(semantic(
                    &body.token(),
                    format!("Cannot return type '{}' from function expecting '{}'", ty, return_type),
                ));
            }
            c.infer(body)?;
            c.code().cast_primitive(&ty, &return_type);
            Ok(())
        })?;
        self.frame.code.return_value(&return_type);
        Ok(())
    }

    /// Make sure every path ends in a return.
    ///
    /// Void bodies get an implicit `return`. Non-void bodies must return
    /// on every path; code that still falls through afterwards (the join
    /// point of an `if` whose branches both return) is closed with a
    /// placeholder return.
    pub fn verify_returns(&mut self, body: &Block<'_>, token: &Token<'_>) -> Result<()> {
        let return_type = self.frame.return_type.clone();
        if return_type.is_void() {
            if self.frame.code.falls_through() {
                self.frame.code.return_value(&WaterType::VOID);
            }
            return Ok(());
        }
        if !ReturnChecker::new().all_paths_return(body) {
            return Err(semantic(token, "Non-void function must return a value."));
        }
        if self.frame.code.falls_through() {
            self.frame.code.push_dummy(&return_type);
            self.frame.code.return_value(&return_type);
        }
        Ok(())
    }

    /// Close a body that has no source block (`<clinit>`, synthesized
    /// constructors).
    pub fn close_void(&mut self) {
        if self.frame.code.falls_through() {
            self.frame.code.return_value(&WaterType::VOID);
        }
    }

    pub fn finish(self) -> CodeBuilder {
        self.frame.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_numbers_are_emitted_on_change_only() {
        let mut frame = Frame::new("MainWtr", true, WaterType::VOID);
        frame.mark_line(3);
        frame.mark_line(3);
        frame.code.emit(water_classfile::Opcode::Nop);
        frame.mark_line(4);
        let listing = format!("{:?}", frame.code);
        assert_eq!(listing.matches("Line(").count(), 2);
    }

    #[test]
    fn instance_frames_reserve_this() {
        let frame = Frame::new("Player", false, WaterType::VOID);
        assert_eq!(frame.locals.next_slot(), 1);
        let frame = Frame::new("Player", true, WaterType::VOID);
        assert_eq!(frame.locals.next_slot(), 0);
    }

    #[test]
    fn hidden_locals_keep_their_slots() {
        let ctx = crate::context::CompilationContext::new(
            "main.wtr",
            "",
            true,
            crate::options::OptimizationConfig::default(),
        );
        let dir = crate::directory::ClassDirectory::default();
        let mut compiler = FunctionCompiler::constructor(&ctx, &dir, "Player", false);
        compiler.frame_mut().locals.declare("speed", WaterType::DOUBLE, false).unwrap();
        let inner = compiler
            .with_hidden_locals(|c| {
                assert!(c.frame_mut().locals.lookup("speed").is_none());
                Ok(c.frame_mut().locals.allocate(1))
            })
            .unwrap();
        assert_eq!(inner, 3);
        assert!(compiler.frame_mut().locals.lookup("speed").is_some());
    }

    #[test]
    fn scratch_frames_share_locals_but_not_code() {
        let mut frame = Frame::new("MainWtr", true, WaterType::INT);
        frame.locals.declare("x", WaterType::LONG, false).unwrap();
        let scratch = frame.scratch();
        assert!(scratch.code.is_empty());
        assert_eq!(scratch.locals.lookup("x").map(|v| v.ty.clone()), Some(WaterType::LONG));
        assert_eq!(scratch.return_type, WaterType::INT);
    }
}
