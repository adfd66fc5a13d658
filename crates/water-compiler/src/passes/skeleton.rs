//! Skeleton Pass (Pass 1) - Register members with complete signatures.
//!
//! This pass runs in two stages, each over every file of the run:
//!
//! 1. [`SkeletonPass::resolve_hierarchy`] resolves superclasses.
//! 2. [`SkeletonPass::register_members`] registers enums and constructors,
//!    then walks the container and each class in declaration order. Fields
//!    and functions enter the file's symbol tables and the growing class
//!    shape is declared to the directory after every member.
//!
//! Types are inferred here: a variable without annotation takes the type
//! of its initializer, a `= expr` function the type of its body. Because
//! members are published one at a time, an inferred type can only depend
//! on members declared above it.
//!
//! Bodies are placeholders. The class builders of this pass are never
//! serialized; they only exist to describe the class shape.

use rustc_hash::FxHashSet;
use water_classfile::{AccessFlags, ClassBuilder};
use water_core::SemanticErrorKind;
use water_parser::ast::{ClassDecl, ConstructorDecl, Decl, FunctionBody, FunctionDecl, VarDecl};

use super::layout;
use super::{ClassSource, FileUnit};
use crate::context::CompilationContext;
use crate::directory::{ClassDirectory, ClassInfo, TypeDirectory};
use crate::error::{semantic, semantic_kind, ResolveExt, Result};
use crate::expr::ExprCompiler;
use crate::function_compiler::Frame;
use crate::scope::{Function, FunctionKind, Variable, VariableKind};
use crate::stmt::declared_type;
use crate::types::{describe_types, MethodType, WaterType, OBJECT};

/// Runs Pass 1.
pub struct SkeletonPass<'d> {
    directory: &'d mut ClassDirectory,
}

impl<'d> SkeletonPass<'d> {
    pub fn new(directory: &'d mut ClassDirectory) -> Self {
        Self { directory }
    }

    /// Check the imports and resolve every superclass of the file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn resolve_hierarchy(&mut self, unit: &mut FileUnit<'_>) -> Result<()> {
        for import in unit.program.imports {
            unit.ctx.resolve_class(&import.path, &*self.directory)?;
        }
        for class in &unit.classes {
            let ClassSource::Class(decl) = class.source else { continue };
            let Some(superclass) = &decl.superclass else { continue };
            let token = decl.name.token();
            let ty = unit.ctx.resolve_type(superclass, &*self.directory)?;
            let name = match ty.class_name() {
                Some(name) if ty.is_object() && !ty.is_nullable() => name.to_string(),
                _ => return Err(semantic(&token, format!("Cannot extend type '{}'", ty))),
            };
            let info = self.directory.require(&name).at(&token)?;
            if info.is_interface() {
                return Err(semantic(&token, format!("Cannot extend interface '{}'", ty)));
            }
            if info.access.is_final() {
                return Err(semantic(&token, format!("Cannot extend final class '{}'", ty)));
            }
            if self.directory.is_subclass(&name, &class.name).at(&token)? {
                return Err(semantic(
                    &token,
                    format!("Cyclic inheritance involving '{}'", class.name.replace('/', ".")),
                ));
            }

            if let Some(scope) = unit.ctx.class_mut(&class.name) {
                scope.superclass = name.clone();
            }
            let shell = ClassInfo::shell(class.name.clone(), layout::class_access(&decl.modifiers), Some(name));
            self.directory.declare(shell);
        }
        Ok(())
    }

    /// Register the members of the container and of every class.
    ///
    /// Enums and constructors go first: they need no inference, and
    /// top-level initializers may instantiate classes of the file.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register_members(&mut self, unit: &mut FileUnit<'_>) -> Result<()> {
        let mut pending = Vec::new();
        for class in &unit.classes {
            match class.source {
                ClassSource::Enum(decl) => {
                    let mut seen = FxHashSet::default();
                    for constant in decl.constants {
                        if !seen.insert(constant.name) {
                            return Err(semantic_kind(
                                SemanticErrorKind::Redefinition,
                                &constant.token(),
                                format!("Redefinition of enum constant '{}'.", constant.name),
                            ));
                        }
                    }
                    let builder = layout::enum_class(&class.name, decl, unit.ctx.source_file());
                    self.directory.declare(ClassInfo::from_builder(&builder));
                }
                ClassSource::Class(decl) => {
                    let superclass = unit
                        .ctx
                        .class(&class.name)
                        .map(|scope| scope.superclass.clone())
                        .unwrap_or_else(|| OBJECT.to_string());
                    let builder = ClassBuilder::new(layout::class_access(&decl.modifiers), class.name.clone(), superclass);
                    let mut members = Members::new(self.directory, &mut unit.ctx, builder, false);
                    members.constructors(decl)?;
                    pending.push((decl, members.into_builder()));
                }
            }
        }

        if unit.ctx.needs_container() {
            let builder = ClassBuilder::new(
                AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER,
                unit.ctx.container(),
                OBJECT,
            );
            let mut members = Members::new(self.directory, &mut unit.ctx, builder, true);
            for decl in unit.program.decls {
                match *decl {
                    Decl::Function(function) => members.function(function)?,
                    Decl::Var(var) => members.variable(var)?,
                    Decl::Constructor(ctor) => {
                        return Err(semantic(&ctor.keyword, "Constructors can only be declared inside a class."));
                    }
                    Decl::Class(_) | Decl::Enum(_) => {}
                }
            }
        }

        for (decl, builder) in pending {
            let mut members = Members::new(self.directory, &mut unit.ctx, builder, false);
            for member in decl.members {
                match *member {
                    Decl::Function(function) => members.function(function)?,
                    Decl::Var(var) => members.variable(var)?,
                    Decl::Constructor(_) | Decl::Class(_) | Decl::Enum(_) => {}
                }
            }
        }
        tracing::debug!(file = unit.ctx.source_file(), "registered members");
        Ok(())
    }
}

/// Registers the members of one class.
struct Members<'a> {
    directory: &'a mut ClassDirectory,
    ctx: &'a mut CompilationContext,
    builder: ClassBuilder,
    /// Top-level declarations of the container class.
    is_global: bool,
}

impl<'a> Members<'a> {
    fn new(
        directory: &'a mut ClassDirectory,
        ctx: &'a mut CompilationContext,
        builder: ClassBuilder,
        is_global: bool,
    ) -> Self {
        let mut members = Self {
            directory,
            ctx,
            builder,
            is_global,
        };
        members.publish();
        members
    }

    fn class_name(&self) -> String {
        self.builder.name().to_string()
    }

    fn publish(&mut self) {
        self.directory.declare(ClassInfo::from_builder(&self.builder));
    }

    fn into_builder(self) -> ClassBuilder {
        self.builder
    }

    /// Explicit constructors, or the default `public ()V` one.
    fn constructors(&mut self, decl: &ClassDecl<'_>) -> Result<()> {
        let mut has_constructor = false;
        for member in decl.members {
            if let Decl::Constructor(ctor) = *member {
                self.constructor(ctor)?;
                has_constructor = true;
            }
        }
        if !has_constructor {
            let ty = MethodType::new(Vec::new(), WaterType::VOID);
            let code = layout::stub_code(&WaterType::VOID, 1);
            self.builder
                .add_method(layout::method(AccessFlags::PUBLIC, "<init>", &ty, code, Vec::new()));
            self.publish();
        }
        Ok(())
    }

    fn function(&mut self, decl: &FunctionDecl<'_>) -> Result<()> {
        let token = decl.name.token();
        let name = decl.name.name;
        let class = self.class_name();
        let is_static = self.is_global || decl.modifiers.is_static();
        let directory: &dyn TypeDirectory = &*self.directory;
        let params = layout::param_types(self.ctx, directory, decl.params)?;

        let members = self.ctx.class(&class).map(|scope| scope.members.clone()).unwrap_or_default();
        if members.exact_function(name, &params).is_some() {
            let scope = if self.is_global { "in global scope" } else { "in current class" };
            return Err(semantic_kind(
                SemanticErrorKind::Redefinition,
                &token,
                format!("Redefinition of function '{}' {}.", name, scope),
            ));
        }

        let ret = match (&decl.return_type, decl.body) {
            (Some(ty), _) => self.ctx.resolve_type(ty, directory)?,
            (None, FunctionBody::Block(_)) => WaterType::VOID,
            (None, FunctionBody::Expr(body)) => {
                let mut frame = Frame::new(class.clone(), is_static, WaterType::VOID);
                for (param, ty) in layout::named_params(decl.params, &params) {
                    frame.locals.declare(param.name, ty, false).map_err(|_| {
                        semantic_kind(
                            SemanticErrorKind::Redefinition,
                            &param.token(),
                            format!("Redefinition of variable '{}' in same scope.", param.name),
                        )
                    })?;
                }
                let ty = ExprCompiler::new(self.ctx, directory, &mut frame).type_of(body)?;
                if ty.is_null() {
                    return Err(semantic(
                        &token,
                        format!("Cannot infer the return type of function '{}' from 'null'", name),
                    ));
                }
                ty
            }
        };
        if let Some(first) = members.functions(name).first()
            && first.ty.ret != ret
        {
            return Err(semantic(
                &token,
                format!(
                    "Function overloads may only differ in parameters, not return type. ({} =/= {})",
                    ret, first.ty.ret
                ),
            ));
        }
        let exceptions = layout::exceptions(self.ctx, directory, &token, decl.throws)?;

        let ty = MethodType::new(params, ret);
        let access = layout::function_access(&decl.modifiers, self.is_global);
        let code = layout::stub_code(&ty.ret, layout::arg_slots(&ty, is_static));
        self.builder.add_method(layout::method(access, name, &ty, code, exceptions));
        if let Some(scope) = self.ctx.class_mut(&class) {
            scope.members.add_function(Function {
                kind: if is_static { FunctionKind::Static } else { FunctionKind::Instance },
                name: name.to_string(),
                owner: class.clone(),
                ty,
                is_private: decl.modifiers.is_private(),
            });
        }
        self.publish();
        Ok(())
    }

    fn variable(&mut self, decl: &VarDecl<'_>) -> Result<()> {
        let token = decl.name.token();
        let name = decl.name.name;
        let class = self.class_name();
        let is_static = self.is_global || decl.modifiers.is_static();
        let is_global = self.is_global;
        let redefinition = || {
            let scope = if is_global { "in global scope" } else { "within class" };
            semantic_kind(
                SemanticErrorKind::Redefinition,
                &token,
                format!("Redefinition of variable '{}' {}.", name, scope),
            )
        };
        if self.ctx.class(&class).is_some_and(|scope| scope.members.variable(name).is_some()) {
            return Err(redefinition());
        }

        let directory: &dyn TypeDirectory = &*self.directory;
        let mut frame = Frame::new(class.clone(), is_static, WaterType::VOID);
        let ty = declared_type(&mut ExprCompiler::new(self.ctx, directory, &mut frame), decl)?;

        self.builder.add_field(layout::field(name, &ty, is_static, decl.is_const));
        if !decl.modifiers.is_private() {
            for accessor in layout::accessors(&class, name, &ty, is_static, decl.is_const, self.is_global) {
                self.builder.add_method(accessor);
            }
        }
        let variable = Variable {
            name: name.to_string(),
            kind: if is_static { VariableKind::Static } else { VariableKind::Field },
            owner: class.clone(),
            ty,
            is_const: decl.is_const,
            is_private: decl.modifiers.is_private(),
        };
        let declared = match self.ctx.class_mut(&class) {
            Some(scope) => scope.members.declare_variable(variable),
            None => Ok(()),
        };
        declared.map_err(|_| redefinition())?;
        self.publish();
        Ok(())
    }

    fn constructor(&mut self, decl: &ConstructorDecl<'_>) -> Result<()> {
        let params = layout::param_types(self.ctx, &*self.directory, decl.params)?;
        let ty = MethodType::new(params, WaterType::VOID);
        if self.builder.has_method("<init>", &ty.descriptor()) {
            return Err(semantic_kind(
                SemanticErrorKind::Redefinition,
                &decl.keyword,
                format!("Redefinition of constructor with parameters ({}).", describe_types(&ty.params)),
            ));
        }
        let code = layout::stub_code(&WaterType::VOID, layout::arg_slots(&ty, false));
        let access = layout::member_access(&decl.modifiers);
        self.builder.add_method(layout::method(access, "<init>", &ty, code, Vec::new()));
        self.publish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptimizationConfig;
    use crate::passes::DeclarationPass;
    use bumpalo::Bump;
    use water_parser::Parser;

    fn register(sources: &[(&str, &str)]) -> Result<ClassDirectory> {
        let arena = Bump::new();
        let mut dir = ClassDirectory::default();
        let mut units = Vec::new();
        for (name, source) in sources {
            let program = Parser::parse(source, &arena).unwrap();
            units.push(DeclarationPass::new(&mut dir).run(name, *program, OptimizationConfig::default())?);
        }
        for unit in &mut units {
            SkeletonPass::new(&mut dir).resolve_hierarchy(unit)?;
        }
        for unit in &mut units {
            SkeletonPass::new(&mut dir).register_members(unit)?;
        }
        Ok(dir)
    }

    fn error(source: &str) -> String {
        match register(&[("main.wtr", source)]) {
            Ok(_) => panic!("expected an error"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn globals_and_functions() {
        let dir = register(&[(
            "main.wtr",
            "var count = 1; const isReady = true; private var hidden: String? = null; \
             function twice(x: int) = x * 2; function log(s: String?) { }",
        )])
        .unwrap();
        let container = dir.class("mainWtr").unwrap();
        let methods: Vec<_> = container.methods.iter().map(|m| (m.name.as_str(), m.descriptor())).collect();
        assert!(methods.contains(&("getCount", "()I".to_string())));
        assert!(methods.contains(&("setCount", "(I)V".to_string())));
        assert!(methods.contains(&("isReady", "()Z".to_string())));
        assert!(!methods.iter().any(|(name, _)| *name == "setReady"));
        assert!(!methods.iter().any(|(name, _)| *name == "getHidden"));
        assert!(methods.contains(&("twice", "(I)I".to_string())));
        assert!(methods.contains(&("log", "(Ljava/lang/String;)V".to_string())));
        let twice = container.methods.iter().find(|m| m.name == "twice").unwrap();
        assert!(twice.access.contains(AccessFlags::STATIC | AccessFlags::FINAL));
        assert!(container.field("hidden").unwrap().ty.is_nullable());
    }

    #[test]
    fn classes_see_each_other_across_files() {
        let dir = register(&[
            ("a.wtr", "class Animal { var name = \"x\"; function speak() -> String { return name; } }"),
            ("b.wtr", "class Dog: Animal { constructor(n: int) { } function bark() = speak(); }"),
        ])
        .unwrap();
        let dog = dir.class("Dog").unwrap();
        assert_eq!(dog.superclass.as_deref(), Some("Animal"));
        assert_eq!(dog.constructors.len(), 1);
        assert_eq!(dog.constructors[0].descriptor(), "(I)V");
        let bark = dog.methods.iter().find(|m| m.name == "bark").unwrap();
        assert_eq!(bark.descriptor(), "()Ljava/lang/String;");
        assert!(!bark.is_static());

        let animal = dir.class("Animal").unwrap();
        assert_eq!(animal.constructors[0].descriptor(), "()V");
    }

    #[test]
    fn redefinitions() {
        assert_eq!(
            error("function f() { } function f() { }"),
            "Redefinition of function 'f' in global scope."
        );
        assert_eq!(
            error("class A { function f() { } function f() { } }"),
            "Redefinition of function 'f' in current class."
        );
        assert_eq!(
            error("function f() -> int { return 1; } function f(x: int) { }"),
            "Function overloads may only differ in parameters, not return type. (void =/= int)"
        );
        assert_eq!(error("var x = 1; var x = 2;"), "Redefinition of variable 'x' in global scope.");
        assert_eq!(error("class A { var x = 1; var x = 2; }"), "Redefinition of variable 'x' within class.");
        assert_eq!(
            error("class A { constructor(a: int) { } constructor(b: int) { } }"),
            "Redefinition of constructor with parameters (int)."
        );
        assert_eq!(error("enum E { A, B, A }"), "Redefinition of enum constant 'A'.");
    }

    #[test]
    fn superclass_checks() {
        assert_eq!(error("class A: String { }"), "Cannot extend final class 'java.lang.String'");
        assert_eq!(error("class A: B { } class B: A { }"), "Cyclic inheritance involving 'B'");
        assert_eq!(error("class A: int { }"), "Cannot extend type 'int'");
        assert_eq!(error("enum E { X } class A: E { }"), "Cannot extend final class 'E'");
    }

    #[test]
    fn signature_checks() {
        assert_eq!(
            error("function f() throws int { }"),
            "Cannot throw primitive type (got 'int')."
        );
        assert_eq!(
            error("function f() throws String { }"),
            "throw target must be an extension of java.lang.Throwable ('java.lang.String' cannot be cast)."
        );
        assert_eq!(error("function f() = null;"), "Cannot infer the return type of function 'f' from 'null'");
        assert_eq!(error("var x = null;"), "Cannot infer the type of variable 'x' from 'null'");
        assert_eq!(error("import java.util.Missing; function f() { }"), "Could not resolve class 'java.util.Missing'");
    }

    #[test]
    fn inferred_types_see_earlier_members() {
        let dir = register(&[("main.wtr", "var base = 2L; function scaled() = base * 3;")]).unwrap();
        let container = dir.class("mainWtr").unwrap();
        let scaled = container.methods.iter().find(|m| m.name == "scaled").unwrap();
        assert_eq!(scaled.ty.ret, WaterType::LONG);
    }
}
