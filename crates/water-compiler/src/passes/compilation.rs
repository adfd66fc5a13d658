//! Compilation Pass (Pass 2) - Type check bodies and emit class files.
//!
//! Every signature was fixed by the skeleton pass; this pass reuses the
//! registered types so the emitted descriptors match what other files
//! were compiled against.
//!
//! ## Output
//!
//! - the container class, when the file has top-level functions or
//!   variables
//! - one class per class or enum declaration, in declaration order
//!
//! ## Initialization order
//!
//! ```text
//! <init>:   super(args) -> field initializers -> constructor body
//! <clinit>: static initializers in declaration order
//! ```

use water_classfile::{AccessFlags, ClassBuilder, MethodDef, Opcode};
use water_parser::ast::{ClassDecl, ConstructorDecl, Decl, Expr, FunctionBody, FunctionDecl, VarDecl};
use water_parser::Token;

use super::layout;
use super::{ClassSource, FileUnit};
use crate::context::CompilationContext;
use crate::directory::{MethodInfo, TypeDirectory};
use crate::error::{semantic, unresolved, ResolveExt, Result};
use crate::function_compiler::FunctionCompiler;
use crate::overload::{resolve_overload, OverloadError};
use crate::stmt::default_value;
use crate::types::{describe_types, MethodType, TypedCode, WaterType, OBJECT};

/// Runs Pass 2.
pub struct CompilationPass<'d> {
    directory: &'d dyn TypeDirectory,
}

impl<'d> CompilationPass<'d> {
    pub fn new(directory: &'d dyn TypeDirectory) -> Self {
        Self { directory }
    }

    /// Compile one file into its classes, container first.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&self, unit: &FileUnit<'_>) -> Result<Vec<ClassBuilder>> {
        let ctx = &unit.ctx;
        let mut classes = Vec::with_capacity(unit.classes.len() + 1);
        if ctx.needs_container() {
            classes.push(self.container(ctx, unit.program.decls)?);
        }
        for class in &unit.classes {
            let builder = match class.source {
                ClassSource::Class(decl) => self.class(ctx, &class.name, decl)?,
                ClassSource::Enum(decl) => layout::enum_class(&class.name, decl, ctx.source_file()),
            };
            classes.push(builder);
        }
        tracing::debug!(file = ctx.source_file(), classes = classes.len(), "compiled file");
        Ok(classes)
    }

    fn container(&self, ctx: &CompilationContext, decls: &[Decl<'_>]) -> Result<ClassBuilder> {
        let name = ctx.container();
        let mut builder = ClassBuilder::new(
            AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER,
            name,
            OBJECT,
        );
        builder.set_source_file(ctx.source_file());

        let mut globals = Vec::new();
        for decl in decls {
            match *decl {
                Decl::Function(function) => self.function(ctx, &mut builder, function, true)?,
                Decl::Var(var) => {
                    self.variable(ctx, &mut builder, var, true)?;
                    globals.push(var);
                }
                Decl::Constructor(_) | Decl::Class(_) | Decl::Enum(_) => {}
            }
        }
        if !globals.is_empty() {
            self.static_initializer(ctx, &mut builder, &globals)?;
        }
        layout::add_main_bridge(&mut builder);
        Ok(builder)
    }

    fn class(&self, ctx: &CompilationContext, name: &str, decl: &ClassDecl<'_>) -> Result<ClassBuilder> {
        let superclass = ctx
            .class(name)
            .map(|scope| scope.superclass.clone())
            .unwrap_or_else(|| OBJECT.to_string());
        let mut builder = ClassBuilder::new(layout::class_access(&decl.modifiers), name, superclass);
        builder.set_source_file(ctx.source_file());

        let mut fields = Vec::new();
        let mut statics = Vec::new();
        let mut constructors = Vec::new();
        for member in decl.members {
            match *member {
                Decl::Function(function) => self.function(ctx, &mut builder, function, false)?,
                Decl::Var(var) => {
                    self.variable(ctx, &mut builder, var, false)?;
                    if var.modifiers.is_static() {
                        statics.push(var);
                    } else {
                        fields.push(var);
                    }
                }
                Decl::Constructor(ctor) => constructors.push(ctor),
                Decl::Class(_) | Decl::Enum(_) => {}
            }
        }

        if constructors.is_empty() {
            let token = decl.name.token();
            self.constructor(ctx, &mut builder, None, &token, &fields)?;
        }
        for ctor in constructors {
            self.constructor(ctx, &mut builder, Some(ctor), &ctor.keyword, &fields)?;
        }
        if !statics.is_empty() {
            self.static_initializer(ctx, &mut builder, &statics)?;
        }
        layout::add_main_bridge(&mut builder);
        Ok(builder)
    }

    fn function(
        &self,
        ctx: &CompilationContext,
        builder: &mut ClassBuilder,
        decl: &FunctionDecl<'_>,
        is_global: bool,
    ) -> Result<()> {
        let token = decl.name.token();
        let class = builder.name().to_string();
        let is_static = is_global || decl.modifiers.is_static();
        let params = layout::param_types(ctx, self.directory, decl.params)?;
        let ty = ctx
            .class(&class)
            .and_then(|scope| scope.members.exact_function(decl.name.name, &params))
            .map(|function| function.ty.clone())
            .ok_or_else(|| semantic(&token, format!("Function '{}' was not registered", decl.name.name)))?;
        let exceptions = layout::exceptions(ctx, self.directory, &token, decl.throws)?;

        let mut compiler = FunctionCompiler::new(ctx, self.directory, &class, is_static, ty.ret.clone());
        compiler.setup_parameters(&layout::named_params(decl.params, &params))?;
        compiler.frame_mut().mark_line(decl.span.line);
        match decl.body {
            FunctionBody::Block(body) => {
                compiler.compile_body(body)?;
                compiler.verify_returns(body, &token)?;
            }
            FunctionBody::Expr(body) => compiler.compile_expr_body(body)?,
        }

        let access = layout::function_access(&decl.modifiers, is_global);
        builder.add_method(layout::method(access, decl.name.name, &ty, compiler.finish(), exceptions));
        Ok(())
    }

    /// The backing field and accessors of a variable.
    fn variable(
        &self,
        ctx: &CompilationContext,
        builder: &mut ClassBuilder,
        decl: &VarDecl<'_>,
        is_global: bool,
    ) -> Result<()> {
        let class = builder.name().to_string();
        let is_static = is_global || decl.modifiers.is_static();
        let ty = self.variable_type(ctx, &class, decl)?;
        builder.add_field(layout::field(decl.name.name, &ty, is_static, decl.is_const));
        if !decl.modifiers.is_private() {
            for accessor in layout::accessors(&class, decl.name.name, &ty, is_static, decl.is_const, is_global) {
                builder.add_method(accessor);
            }
        }
        Ok(())
    }

    fn variable_type(&self, ctx: &CompilationContext, class: &str, decl: &VarDecl<'_>) -> Result<WaterType> {
        ctx.class(class)
            .and_then(|scope| scope.members.variable(decl.name.name))
            .map(|variable| variable.ty.clone())
            .ok_or_else(|| {
                semantic(
                    &decl.name.token(),
                    format!("Variable '{}' was not registered", decl.name.name),
                )
            })
    }

    /// A constructor: the explicit one, or the default `public ()V`.
    fn constructor(
        &self,
        ctx: &CompilationContext,
        builder: &mut ClassBuilder,
        decl: Option<&ConstructorDecl<'_>>,
        token: &Token<'_>,
        fields: &[&VarDecl<'_>],
    ) -> Result<()> {
        let class = builder.name().to_string();
        let params = match decl {
            Some(decl) => layout::param_types(ctx, self.directory, decl.params)?,
            None => Vec::new(),
        };

        let mut compiler = FunctionCompiler::constructor(ctx, self.directory, &class, false);
        if let Some(decl) = decl {
            compiler.setup_parameters(&layout::named_params(decl.params, &params))?;
        }
        compiler.frame_mut().mark_line(token.span.line);

        let super_args = decl.and_then(|d| d.super_args).unwrap_or(&[]);
        self.super_call(&mut compiler, builder.super_name(), super_args, token)?;

        compiler.with_hidden_locals(|compiler| {
            for field in fields {
                let ty = self.variable_type(ctx, &class, field)?;
                initialize(compiler, &class, field, &ty, false)?;
            }
            Ok(())
        })?;

        let access = match decl {
            Some(decl) => {
                compiler.compile_body(decl.body)?;
                compiler.verify_returns(decl.body, token)?;
                layout::member_access(&decl.modifiers)
            }
            None => {
                compiler.close_void();
                AccessFlags::PUBLIC
            }
        };
        let ty = MethodType::new(params, WaterType::VOID);
        builder.add_method(layout::method(access, "<init>", &ty, compiler.finish(), Vec::new()));
        Ok(())
    }

    /// `this` and the arguments, then `invokespecial super.<init>`.
    ///
    /// The arguments are compiled before `this` is initialized, so they
    /// see the parameters but no instance members.
    fn super_call(
        &self,
        compiler: &mut FunctionCompiler<'_>,
        superclass: &str,
        args: &[&Expr<'_>],
        token: &Token<'_>,
    ) -> Result<()> {
        let info = self.directory.require(superclass).at(token)?;
        let candidates: Vec<MethodInfo> = info
            .constructors
            .iter()
            .filter(|ctor| !ctor.access.is_private())
            .cloned()
            .collect();

        compiler.frame_mut().code.load(Opcode::Aload, 0);
        compiler.frame_mut().is_static = true;
        let directory = self.directory;
        let chosen = compiler.with_expr(|c| {
            let types = c.arg_types(args)?;
            let chosen = match resolve_overload(&candidates, &types, directory, |_| true) {
                Ok(chosen) => chosen.candidate.clone(),
                Err(OverloadError::Unresolved(err)) => return Err(unresolved(token, err)),
                Err(_) => {
                    return Err(semantic(
                        token,
                        format!(
                            "SuperClass '{}' cannot be instantiated with arguments: {}",
                            WaterType::object(superclass),
                            describe_types(&types)
                        ),
                    ));
                }
            };
            c.compile_args(args, &chosen.ty.params)?;
            Ok(chosen)
        });
        compiler.frame_mut().is_static = false;
        let chosen = chosen?;

        let descriptor = MethodType::new(chosen.ty.params, WaterType::VOID).descriptor();
        compiler
            .frame_mut()
            .code
            .invoke(Opcode::Invokespecial, superclass, "<init>", &descriptor, false);
        Ok(())
    }

    /// `<clinit>` storing the initial value of every static variable.
    fn static_initializer(
        &self,
        ctx: &CompilationContext,
        builder: &mut ClassBuilder,
        variables: &[&VarDecl<'_>],
    ) -> Result<()> {
        let class = builder.name().to_string();
        let mut compiler = FunctionCompiler::constructor(ctx, self.directory, &class, true);
        for variable in variables {
            let ty = self.variable_type(ctx, &class, variable)?;
            initialize(&mut compiler, &class, variable, &ty, true)?;
        }
        compiler.close_void();
        builder.add_method(MethodDef::new(AccessFlags::STATIC, "<clinit>", "()V", compiler.finish()));
        Ok(())
    }
}

/// Store the initial value of a field or static variable.
fn initialize(
    compiler: &mut FunctionCompiler<'_>,
    owner: &str,
    decl: &VarDecl<'_>,
    ty: &WaterType,
    is_static: bool,
) -> Result<()> {
    let token = decl.name.token();
    compiler.frame_mut().mark_line(decl.span.line);
    if !is_static {
        compiler.frame_mut().code.load(Opcode::Aload, 0);
    }
    compiler.with_expr(|c| match decl.init {
        Some(init) => {
            let value = c.type_of(init)?;
            c.infer(init)?;
            c.code().cast_primitive(&value, ty);
            Ok(())
        }
        None => default_value(c, ty, &token),
    })?;
    let op = if is_static { Opcode::Putstatic } else { Opcode::Putfield };
    compiler
        .frame_mut()
        .code
        .field(op, owner, decl.name.name, &ty.descriptor());
    Ok(())
}
