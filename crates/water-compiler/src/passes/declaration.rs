//! Declaration Pass (Pass 0) - Name every class before anything refers
//! to one.
//!
//! For each file this pass creates the [`CompilationContext`], records
//! the imports, and gives every class and enum (nested ones included) its
//! internal name. Each class is declared to the directory as an empty
//! shell so later passes can resolve it from any file.

use water_classfile::AccessFlags;
use water_core::SemanticErrorKind;
use water_parser::ast::{Decl, Ident, Modifiers, Program};

use super::layout::{self, ENUM};
use super::{ClassSource, DeclaredClass, FileUnit};
use crate::context::{ClassScope, CompilationContext};
use crate::directory::{ClassDirectory, ClassInfo};
use crate::error::{semantic_kind, Result};
use crate::options::OptimizationConfig;
use crate::types::OBJECT;

/// Runs Pass 0 for one file.
pub struct DeclarationPass<'d> {
    directory: &'d mut ClassDirectory,
}

impl<'d> DeclarationPass<'d> {
    pub fn new(directory: &'d mut ClassDirectory) -> Self {
        Self { directory }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run<'ast>(
        &mut self,
        file_name: &str,
        program: Program<'ast>,
        options: OptimizationConfig,
    ) -> Result<FileUnit<'ast>> {
        let mut ctx = CompilationContext::new(
            file_name,
            program.package_prefix(),
            program.needs_container_class(),
            options,
        );
        for import in program.imports {
            ctx.add_import(import.path.simple_name(), import.path.internal_name());
        }
        if ctx.needs_container() {
            self.directory.declare(ClassInfo::shell(
                ctx.container(),
                AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER,
                Some(OBJECT.to_string()),
            ));
        }

        let mut unit = FileUnit {
            ctx,
            program,
            classes: Vec::new(),
        };
        let container = unit.ctx.container().to_string();
        self.declare_all(&mut unit, program.decls, &container)?;
        tracing::debug!(
            file = file_name,
            container = unit.ctx.needs_container(),
            classes = unit.classes.len(),
            "declared classes"
        );
        Ok(unit)
    }

    fn declare_all<'ast>(&mut self, unit: &mut FileUnit<'ast>, decls: &'ast [Decl<'ast>], outer: &str) -> Result<()> {
        for decl in decls {
            match *decl {
                Decl::Class(class) => {
                    let name = self.declare(unit, &class.modifiers, class.name, ClassSource::Class(class), outer)?;
                    self.declare_all(unit, class.members, &name)?;
                }
                Decl::Enum(decl) => {
                    self.declare(unit, &decl.modifiers, decl.name, ClassSource::Enum(decl), outer)?;
                }
                Decl::Function(_) | Decl::Constructor(_) | Decl::Var(_) => {}
            }
        }
        Ok(())
    }

    fn declare<'ast>(
        &mut self,
        unit: &mut FileUnit<'ast>,
        modifiers: &Modifiers<'_>,
        ident: Ident<'_>,
        source: ClassSource<'ast>,
        outer: &str,
    ) -> Result<String> {
        let name = layout::class_name(unit.ctx.package(), outer, ident.name, modifiers);
        if self.directory.is_declared(&name) || unit.ctx.is_local_class(&name) {
            return Err(semantic_kind(
                SemanticErrorKind::Redefinition,
                &ident.token(),
                format!("Redefinition of class '{}'.", name.replace('/', ".")),
            ));
        }
        if modifiers.is_private() {
            unit.ctx.add_import(ident.name, name.clone());
        }

        let (mut scope, info) = match source {
            ClassSource::Class(_) => (
                ClassScope::new(name.clone(), OBJECT),
                ClassInfo::shell(name.clone(), layout::class_access(modifiers), Some(OBJECT.to_string())),
            ),
            ClassSource::Enum(_) => (
                ClassScope::new(name.clone(), ENUM),
                ClassInfo::shell(name.clone(), layout::enum_access(modifiers), Some(ENUM.to_string())),
            ),
        };
        scope.is_enum = matches!(source, ClassSource::Enum(_));
        unit.ctx.declare_class(scope);
        self.directory.declare(info);
        unit.classes.push(DeclaredClass {
            name: name.clone(),
            source,
        });
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::TypeDirectory;
    use bumpalo::Bump;
    use water_parser::Parser;

    #[test]
    fn classes_get_internal_names() {
        let arena = Bump::new();
        let program = Parser::parse(
            "package demo.game; class Player { private class Stats { } } private enum Mode { ON } function f() { }",
            &arena,
        )
        .unwrap();
        let mut dir = ClassDirectory::default();
        let unit = DeclarationPass::new(&mut dir)
            .run("main.wtr", *program, OptimizationConfig::default())
            .unwrap();

        let names: Vec<_> = unit.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["demo/game/Player", "demo/game/Player$Stats", "demo/game/mainWtr$Mode"]);
        assert!(dir.is_declared("demo/game/mainWtr"));
        assert!(dir.class("demo/game/mainWtr$Mode").unwrap().access.contains(AccessFlags::ENUM));
        assert_eq!(unit.ctx.class("demo/game/mainWtr$Mode").unwrap().superclass, ENUM);
        assert_eq!(unit.ctx.lookup_class("Stats", &dir).as_deref(), Some("demo/game/Player$Stats"));
    }

    #[test]
    fn files_with_only_classes_have_no_container() {
        let arena = Bump::new();
        let program = Parser::parse("class A { }", &arena).unwrap();
        let mut dir = ClassDirectory::default();
        let unit = DeclarationPass::new(&mut dir)
            .run("a.wtr", *program, OptimizationConfig::default())
            .unwrap();
        assert!(!unit.ctx.needs_container());
        assert!(!dir.is_declared("aWtr"));
    }

    #[test]
    fn imports_map_simple_names() {
        let arena = Bump::new();
        let program = Parser::parse("import java.util.ArrayList; function f() { }", &arena).unwrap();
        let mut dir = ClassDirectory::default();
        let unit = DeclarationPass::new(&mut dir)
            .run("a.wtr", *program, OptimizationConfig::default())
            .unwrap();
        assert_eq!(unit.ctx.lookup_class("ArrayList", &dir).as_deref(), Some("java/util/ArrayList"));
    }

    #[test]
    fn class_names_are_unique_across_files() {
        let arena = Bump::new();
        let first = Parser::parse("class A { }", &arena).unwrap();
        let second = Parser::parse("class A { }", &arena).unwrap();
        let mut dir = ClassDirectory::default();
        let mut pass = DeclarationPass::new(&mut dir);
        pass.run("a.wtr", *first, OptimizationConfig::default()).unwrap();
        let err = pass.run("b.wtr", *second, OptimizationConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "Redefinition of class 'A'.");
    }
}
