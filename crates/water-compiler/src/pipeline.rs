//! Multi-file compilation driver.
//!
//! [`Pipeline::compile`] runs every pass over all files before starting
//! the next one:
//!
//! ```text
//! declaration  (all files)  names and shells of every class
//! hierarchy    (all files)  superclasses
//! members      (all files)  signatures, fields, inferred types
//! compilation  (per file)   bodies -> class file bytes
//! ```
//!
//! The first error stops the run and names the file it came from.

use thiserror::Error;
use water_classfile::Classpath;
use water_parser::ast::Program;

use crate::directory::ClassDirectory;
use crate::error::CompileError;
use crate::options::OptimizationConfig;
use crate::passes::{CompilationPass, DeclarationPass, SkeletonPass};

/// A parsed source file.
#[derive(Debug, Clone, Copy)]
pub struct SourceFile<'a, 'ast> {
    /// File name without directories, e.g. `main.wtr`.
    pub name: &'a str,
    pub program: Program<'ast>,
}

/// One emitted class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClass {
    /// Internal name, e.g. `com/example/mainWtr`.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CompiledClass {
    /// Last segment of the internal name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Package directories of the internal name, e.g. `com/example`.
    pub fn package_path(&self) -> &str {
        self.name.rsplit_once('/').map(|(package, _)| package).unwrap_or("")
    }
}

/// A compile error and the index of the file that caused it.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct FileError {
    pub index: usize,
    #[source]
    pub source: CompileError,
}

/// Compiles a set of files against a class path.
#[derive(Debug)]
pub struct Pipeline {
    directory: ClassDirectory,
    options: OptimizationConfig,
}

impl Pipeline {
    pub fn new(classpath: Classpath, options: OptimizationConfig) -> Self {
        Self {
            directory: ClassDirectory::new(classpath),
            options,
        }
    }

    /// Compile `files`; the result holds the classes of each file in
    /// input order.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&mut self, files: &[SourceFile<'_, '_>]) -> Result<Vec<Vec<CompiledClass>>, FileError> {
        let at = |index: usize| move |source: CompileError| FileError { index, source };

        let mut units = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            let unit = DeclarationPass::new(&mut self.directory)
                .run(file.name, file.program, self.options.clone())
                .map_err(at(index))?;
            units.push(unit);
        }
        for (index, unit) in units.iter_mut().enumerate() {
            SkeletonPass::new(&mut self.directory)
                .resolve_hierarchy(unit)
                .map_err(at(index))?;
        }
        for (index, unit) in units.iter_mut().enumerate() {
            SkeletonPass::new(&mut self.directory)
                .register_members(unit)
                .map_err(at(index))?;
        }

        let pass = CompilationPass::new(&self.directory);
        let mut output = Vec::with_capacity(units.len());
        for (index, unit) in units.iter().enumerate() {
            let builders = pass.run(unit).map_err(at(index))?;
            let mut classes = Vec::with_capacity(builders.len());
            for builder in builders {
                let bytes = builder.finish().map_err(|err| at(index)(err.into()))?;
                classes.push(CompiledClass {
                    name: builder.name().to_string(),
                    bytes,
                });
            }
            tracing::info!(file = files[index].name, classes = classes.len(), "compiled");
            output.push(classes);
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use water_classfile::ClassFile;
    use water_parser::Parser;

    fn compile(sources: &[(&str, &str)]) -> Result<Vec<Vec<CompiledClass>>, FileError> {
        let arena = Bump::new();
        let files: Vec<_> = sources
            .iter()
            .map(|(name, source)| SourceFile {
                name,
                program: *Parser::parse(source, &arena).unwrap(),
            })
            .collect();
        Pipeline::new(Classpath::new(), OptimizationConfig::default()).compile(&files)
    }

    #[test]
    fn files_can_use_each_other() {
        let output = compile(&[
            ("app.wtr", "package demo; function main() { println(new Greeter().greet(\"you\")); }"),
            ("greeter.wtr", "package demo; class Greeter { function greet(name: String) = \"Hello \" + name; }"),
        ])
        .unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(output[0][0].name, "demo/appWtr");
        assert_eq!(output[0][0].simple_name(), "appWtr");
        assert_eq!(output[0][0].package_path(), "demo");
        assert_eq!(output[1].len(), 1);
        assert_eq!(output[1][0].name, "demo/Greeter");

        let greeter = ClassFile::parse(&output[1][0].bytes).unwrap();
        assert!(greeter.method("greet", "(Ljava/lang/String;)Ljava/lang/String;").is_some());
    }

    #[test]
    fn errors_name_the_failing_file() {
        let err = compile(&[
            ("a.wtr", "function ok() { }"),
            ("b.wtr", "function broken() -> int { }"),
        ])
        .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.to_string(), "Non-void function must return a value.");
        assert!(err.source.as_semantic().is_some());
    }

    #[test]
    fn class_output_follows_declaration_order() {
        let output = compile(&[("shapes.wtr", "class B { } var x = 1; enum A { ONE } private class C { }")]).unwrap();
        let names: Vec<_> = output[0].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["shapesWtr", "B", "A", "shapesWtr$C"]);
    }
}
