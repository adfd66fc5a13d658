//! Expression compiler.
//!
//! The [`ExprCompiler`] compiles AST expressions into the current
//! [`Frame`]'s instruction stream:
//! - `infer()` emits the expression and returns its static type
//! - `type_of()` computes the type without touching the real stream
//! - `branch()` compiles a condition straight into jumps
//!
//! `type_of` works by compiling the expression into a throwaway frame, so
//! typing and code generation can never disagree. Results are cached per
//! statement.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ExprCompiler::new(ctx, directory, &mut frame);
//!
//! // Type without emitting
//! let ty = compiler.type_of(expr)?;
//!
//! // Emit and get the type
//! let ty = compiler.infer(expr)?;
//! ```

mod arrays;
mod assignment;
mod binary;
mod calls;
mod cast;
mod conditions;
mod identifiers;
mod literals;
mod member;
mod nullable;
mod place;
mod unary;

use water_classfile::{CodeBuilder, Label, Opcode};
use water_parser::ast::{BinaryOp, Expr, UnaryOp};
use water_parser::Token;

use crate::context::CompilationContext;
use crate::directory::{Member, MethodInfo, TypeDirectory};
use crate::error::{CompileError, ResolveExt, Result};
use crate::fold::Constant;
use crate::function_compiler::Frame;
use crate::options::{CONSTANT_ARITHMETIC, CONSTANT_STRING_CONCAT, CONSTANT_UNARY};
use crate::types::{TypedCode, WaterType};
use water_classfile::AccessFlags;

pub(crate) use place::{Place, Target};

/// Compiles expressions into a method frame.
pub struct ExprCompiler<'a> {
    ctx: &'a CompilationContext,
    directory: &'a dyn TypeDirectory,
    frame: &'a mut Frame,
    /// Jump target shared by the links of a `?.` chain being compiled.
    null_chain: Option<Label>,
}

impl<'a> ExprCompiler<'a> {
    pub fn new(ctx: &'a CompilationContext, directory: &'a dyn TypeDirectory, frame: &'a mut Frame) -> Self {
        Self {
            ctx,
            directory,
            frame,
            null_chain: None,
        }
    }

    pub fn ctx(&self) -> &'a CompilationContext {
        self.ctx
    }

    pub fn directory(&self) -> &'a dyn TypeDirectory {
        self.directory
    }

    pub fn frame(&mut self) -> &mut Frame {
        &mut *self.frame
    }

    pub fn code(&mut self) -> &mut CodeBuilder {
        &mut self.frame.code
    }

    /// Emit `expr` and return its type.
    pub fn infer(&mut self, expr: &Expr<'_>) -> Result<WaterType> {
        if let Some(constant) = self.constant(expr)? {
            constant.emit(self.code());
            return Ok(constant.ty());
        }
        match expr {
            Expr::Literal(lit) => literals::compile_literal(self, lit),
            Expr::Ident(ident) => identifiers::compile_ident(self, ident),
            Expr::This(token) => identifiers::compile_this(self, token),
            Expr::Binary(bin) => binary::compile_binary(self, bin),
            Expr::Unary(un) => unary::compile_unary(self, un, true),
            Expr::Postfix(post) => unary::compile_postfix(self, post, true),
            Expr::NonNull(assert) => nullable::compile_non_null(self, assert),
            Expr::Assign(assign) => assignment::compile_assign(self, assign, true),
            Expr::Call(call) => calls::compile_call(self, call),
            Expr::MethodCall(call) => calls::compile_method_call(self, call),
            Expr::SuperCall(call) => calls::compile_super_call(self, call),
            Expr::Member(member) => member::compile_member(self, member),
            Expr::Index(index) => member::compile_index(self, index),
            Expr::New(new) => calls::compile_new(self, new),
            Expr::NewArray(new) => arrays::compile_new_array(self, new),
            Expr::Cast(cast) => cast::compile_cast(self, cast),
            Expr::InstanceOf(test) => cast::compile_instanceof(self, test),
            Expr::Paren(p) => self.infer(p.expr),
        }
    }

    /// Emit `expr`, verify it can be stored as `expected` and convert it.
    ///
    /// `mismatch` builds the error reported for an incompatible type.
    pub fn check(
        &mut self,
        expr: &Expr<'_>,
        expected: &WaterType,
        mismatch: impl FnOnce(&WaterType) -> CompileError,
    ) -> Result<WaterType> {
        let ty = self.type_of(expr)?;
        if !self.is_assignable(expected, &ty, &expr.token())? {
            return Err(mismatch(&ty));
        }
        self.infer(expr)?;
        self.code().cast_primitive(&ty, expected);
        Ok(ty)
    }

    /// Static type of `expr`. Nothing is emitted.
    pub fn type_of(&mut self, expr: &Expr<'_>) -> Result<WaterType> {
        let key = (expr as *const Expr<'_> as usize, expr.span());
        if let Some(ty) = self.frame.types.get(&key) {
            return Ok(ty.clone());
        }
        let mut scratch = self.frame.scratch();
        let result = ExprCompiler::new(self.ctx, self.directory, &mut scratch).infer(expr);
        self.frame.types = std::mem::take(&mut scratch.types);
        let ty = result?;
        self.frame.types.insert(key, ty.clone());
        Ok(ty)
    }

    /// Compile an expression statement, leaving the stack as it was.
    ///
    /// Assignments and updates skip producing the value instead of
    /// producing and popping it.
    pub fn compile_discard(&mut self, expr: &Expr<'_>) -> Result<()> {
        match expr {
            Expr::Assign(assign) => assignment::compile_assign(self, assign, false).map(drop),
            Expr::Postfix(post) => unary::compile_postfix(self, post, false).map(drop),
            Expr::Unary(un) if matches!(un.op, UnaryOp::PreInc | UnaryOp::PreDec) => {
                unary::compile_unary(self, un, false).map(drop)
            }
            _ => {
                let ty = self.infer(expr)?;
                self.code().pop_value(&ty);
                Ok(())
            }
        }
    }

    /// Argument types, in order.
    pub fn arg_types(&mut self, args: &[&Expr<'_>]) -> Result<Vec<WaterType>> {
        args.iter().map(|arg| self.type_of(arg)).collect()
    }

    /// Emit arguments converted to the chosen overload's parameters.
    pub fn compile_args(&mut self, args: &[&Expr<'_>], params: &[WaterType]) -> Result<()> {
        for (arg, param) in args.iter().zip(params) {
            let ty = self.type_of(arg)?;
            self.infer(arg)?;
            self.code().cast_primitive(&ty, param);
        }
        Ok(())
    }

    /// Compile-time value of `expr`, if folding applies to it.
    pub fn constant(&self, expr: &Expr<'_>) -> Result<Option<Constant>> {
        let options = self.ctx.options();
        match expr {
            Expr::Literal(lit) => literals::literal_constant(lit),
            Expr::Paren(p) => self.constant(p.expr),
            Expr::Unary(un) => {
                if un.op == UnaryOp::Neg
                    && let Some(min) = literals::negated_minimum(un.operand)
                {
                    return Ok(Some(min));
                }
                if !options.is_enabled(CONSTANT_UNARY) {
                    return Ok(None);
                }
                Ok(self.constant(un.operand)?.and_then(|v| Constant::unary(un.op, &v)))
            }
            Expr::Binary(bin) if bin.op.is_arithmetic() || bin.op.is_integer() => {
                let concat = bin.op == BinaryOp::Add;
                if !options.is_enabled(CONSTANT_ARITHMETIC) && !(concat && options.is_enabled(CONSTANT_STRING_CONCAT)) {
                    return Ok(None);
                }
                let Some(left) = self.constant(bin.left)? else { return Ok(None) };
                let Some(right) = self.constant(bin.right)? else { return Ok(None) };
                if concat && (matches!(left, Constant::Str(_)) || matches!(right, Constant::Str(_))) {
                    if !options.is_enabled(CONSTANT_STRING_CONCAT) {
                        return Ok(None);
                    }
                    return Ok(Constant::concat(&left, &right));
                }
                if !options.is_enabled(CONSTANT_ARITHMETIC) {
                    return Ok(None);
                }
                Ok(Constant::binary(bin.op, &left, &right))
            }
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Shared helpers
    // =========================================================================

    pub(crate) fn is_assignable(&self, to: &WaterType, from: &WaterType, token: &Token<'_>) -> Result<bool> {
        to.is_assignable_from(from, self.directory).at(token)
    }

    /// Whether a member of `owner` with `access` can be used from the
    /// class being compiled.
    pub(crate) fn can_access(&self, owner: &str, access: AccessFlags, token: &Token<'_>) -> Result<bool> {
        if access.is_public() || owner == self.frame.class {
            return Ok(true);
        }
        if access.is_private() {
            return Ok(false);
        }
        if access.contains(AccessFlags::PROTECTED) && self.directory.is_subclass(&self.frame.class, owner).at(token)? {
            return Ok(true);
        }
        Ok(package_of(owner) == package_of(&self.frame.class))
    }

    fn is_interface(&self, class: &str) -> bool {
        self.directory.class(class).is_some_and(|info| info.is_interface())
    }

    /// Invoke `method` with receiver and arguments already on the stack.
    ///
    /// `receiver` is the static class of the receiver; statics are called
    /// on their declaring class.
    pub(crate) fn invoke_method(&mut self, receiver: &str, method: &Member<MethodInfo>, special: bool) {
        let descriptor = method.info.descriptor();
        if method.info.is_static() {
            let interface = self.is_interface(&method.owner);
            self.code().invoke(Opcode::Invokestatic, &method.owner, &method.info.name, &descriptor, interface);
        } else if special || method.info.access.is_private() {
            let owner = if special { method.owner.as_str() } else { receiver };
            self.code().invoke(Opcode::Invokespecial, owner, &method.info.name, &descriptor, false);
        } else if self.is_interface(receiver) {
            self.code().invoke(Opcode::Invokeinterface, receiver, &method.info.name, &descriptor, true);
        } else {
            self.code().invoke(Opcode::Invokevirtual, receiver, &method.info.name, &descriptor, false);
        }
    }

    /// Class named by `expr` when it is a bare class name rather than a
    /// variable, as in `Math.max(a, b)`.
    pub(crate) fn static_class(&mut self, expr: &Expr<'_>) -> Result<Option<String>> {
        let Expr::Ident(ident) = expr else { return Ok(None) };
        if place::lookup_variable(self, ident)?.is_some() {
            return Ok(None);
        }
        Ok(self.ctx.lookup_class(ident.name, self.directory))
    }
}

/// Internal package prefix of a class name.
fn package_of(class: &str) -> &str {
    class.rfind('/').map_or("", |i| &class[..i])
}

#[cfg(test)]
mod tests;
