//! Compilation driver.
//!
//! [`run`] reads and parses every input file, hands the programs to the
//! compiler [`Pipeline`] and writes one class file per emitted class to
//! `<output dir>/<package dirs>/<SimpleName>.class`. The output directory
//! defaults to the directory of the source file.
//!
//! The first failure stops the run. [`DriverError::exit_code`] maps it to
//! the process exit status:
//!
//! | code | failure |
//! |------|---------|
//! | `-1` | lexical or syntax error |
//! | `-2` | semantic error |
//! | `2`  | reading a source, config or class path entry |
//! | `3`  | writing a class file |

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bumpalo::Bump;
use thiserror::Error;
use water_classfile::{Classpath, ClasspathEntry};
use water_compiler::options::ConfigError;
use water_compiler::{CompileError, CompiledClass, OptimizationConfig, Pipeline, SourceFile};
use water_core::WaterError;
use water_parser::{pretty_print, Parser};

/// What to compile and where to put it.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub pretty_print: bool,
    pub output_dir: Option<PathBuf>,
    /// Optimization config file; the default set is used when absent.
    pub optimize: Option<PathBuf>,
    pub classpath: Vec<PathBuf>,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Failure reading file '{}': {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Failed whilst reading classpath: {paths}\n{reason}")]
    Classpath { paths: String, reason: String },

    /// A located lexical, syntax or semantic error.
    #[error("{}", .error.report(.file))]
    Compile { file: String, error: WaterError },

    /// The class file layer rejected generated code.
    #[error("[{file}] Failure generating class: {reason}")]
    Codegen { file: String, reason: String },

    #[error("Failure writing file '{}': {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    #[error("Failure writing to standard output: {0}")]
    Stdout(#[source] io::Error),
}

impl DriverError {
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::Read { .. } | DriverError::Classpath { .. } => 2,
            DriverError::Compile { error, .. } => error.exit_code(),
            DriverError::Codegen { .. } => -2,
            DriverError::Write { .. } | DriverError::Stdout(_) => 3,
        }
    }
}

/// Short, stable description of an I/O failure, e.g. `NotFound`.
fn io_reason(err: &io::Error) -> String {
    format!("{:?}", err.kind())
}

/// Compile `options.files`; pretty-printed trees go to `out`. Returns the
/// paths of the written class files.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn run(options: &Options, out: &mut dyn Write) -> Result<Vec<PathBuf>, DriverError> {
    let config = optimization_config(options)?;
    let classpath = classpath(&options.classpath)?;

    let arena = Bump::new();
    let mut files = Vec::with_capacity(options.files.len());
    for path in &options.files {
        let source = std::fs::read_to_string(path).map_err(|err| DriverError::Read {
            path: path.clone(),
            reason: io_reason(&err),
        })?;
        let source: &str = arena.alloc_str(&source);
        let program = Parser::parse(source, &arena).map_err(|err| DriverError::Compile {
            file: path.display().to_string(),
            error: err.into(),
        })?;
        if options.pretty_print {
            writeln!(out, "==== {} ====", path.display()).map_err(DriverError::Stdout)?;
            writeln!(out, "{}", pretty_print(program)).map_err(DriverError::Stdout)?;
        }
        tracing::debug!(path = %path.display(), decls = program.decls.len(), "parsed");
        files.push(*program);
    }

    let names: Vec<String> = options.files.iter().map(|path| file_name(path)).collect();
    let sources: Vec<SourceFile<'_, '_>> = names
        .iter()
        .zip(&files)
        .map(|(name, program)| SourceFile { name, program: *program })
        .collect();

    let compiled = Pipeline::new(classpath, config).compile(&sources).map_err(|err| {
        let file = options.files[err.index].display().to_string();
        match err.source {
            CompileError::Semantic(error) => DriverError::Compile {
                file,
                error: error.into(),
            },
            CompileError::ClassFile(error) => DriverError::Codegen {
                file,
                reason: error.to_string(),
            },
        }
    })?;

    let mut written = Vec::new();
    for (path, classes) in options.files.iter().zip(&compiled) {
        let dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => source_dir(path),
        };
        for class in classes {
            written.push(write_class(&dir, class)?);
        }
    }
    tracing::info!(files = options.files.len(), classes = written.len(), "compilation finished");
    Ok(written)
}

fn optimization_config(options: &Options) -> Result<OptimizationConfig, DriverError> {
    match &options.optimize {
        None => Ok(OptimizationConfig::default()),
        Some(path) => OptimizationConfig::load(path).map_err(|err| match err {
            ConfigError::Io { path, source } => DriverError::Read {
                path,
                reason: io_reason(&source),
            },
        }),
    }
}

fn classpath(paths: &[PathBuf]) -> Result<Classpath, DriverError> {
    Classpath::build(paths.iter().map(ClasspathEntry::from_path)).map_err(|err| {
        let joined = std::env::join_paths(paths)
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_default();
        DriverError::Classpath {
            paths: joined,
            reason: err.to_string(),
        }
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn source_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Where a class lands below `dir`.
pub fn class_path(dir: &Path, class: &CompiledClass) -> PathBuf {
    let mut path = dir.to_path_buf();
    for segment in class.package_path().split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.push(format!("{}.class", class.simple_name()));
    path
}

fn write_class(dir: &Path, class: &CompiledClass) -> Result<PathBuf, DriverError> {
    let path = class_path(dir, class);
    let failed = |err: io::Error| DriverError::Write {
        path: path.clone(),
        reason: io_reason(&err),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(failed)?;
    }
    std::fs::write(&path, &class.bytes).map_err(failed)?;
    tracing::debug!(class = %class.name, path = %path.display(), "wrote class");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &TempDir, files: &[(&str, &str)]) -> Options {
        let mut paths = Vec::new();
        for (name, source) in files {
            let path = dir.path().join(name);
            std::fs::write(&path, source).unwrap();
            paths.push(path);
        }
        Options {
            files: paths,
            ..Options::default()
        }
    }

    #[test]
    fn classes_land_in_package_directories() {
        let class = CompiledClass {
            name: "com/example/mainWtr$Inner".to_string(),
            bytes: Vec::new(),
        };
        assert_eq!(
            class_path(Path::new("out"), &class),
            Path::new("out").join("com").join("example").join("mainWtr$Inner.class")
        );
    }

    #[test]
    fn writes_next_to_the_source_by_default() {
        let dir = TempDir::new().unwrap();
        let options = options(&dir, &[("hello.wtr", "package greet; function main() { println(\"hi\"); }")]);
        let written = run(&options, &mut Vec::new()).unwrap();
        assert_eq!(written, [dir.path().join("greet").join("helloWtr.class")]);
        assert!(written[0].is_file());
    }

    #[test]
    fn output_dir_overrides_the_source_dir() {
        let dir = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let mut options = options(&dir, &[("shapes.wtr", "class Square { } class Circle { }")]);
        options.output_dir = Some(out.path().to_path_buf());
        let written = run(&options, &mut Vec::new()).unwrap();
        assert_eq!(written, [out.path().join("Square.class"), out.path().join("Circle.class")]);
    }

    #[test]
    fn pretty_print_writes_a_header_per_file() {
        let dir = TempDir::new().unwrap();
        let mut options = options(&dir, &[("a.wtr", "var x = 1;")]);
        options.pretty_print = true;
        let mut out = Vec::new();
        run(&options, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&format!("==== {} ====\n", options.files[0].display())));
    }

    #[test]
    fn failures_map_to_exit_codes() {
        let dir = TempDir::new().unwrap();

        let syntax = run(&options(&dir, &[("a.wtr", "function (")]), &mut Vec::new()).unwrap_err();
        assert_eq!(syntax.exit_code(), -1);

        let semantic = run(&options(&dir, &[("b.wtr", "var x: int = \"s\";")]), &mut Vec::new()).unwrap_err();
        assert_eq!(semantic.exit_code(), -2);
        assert!(semantic.to_string().starts_with(&format!("[{}:1:", dir.path().join("b.wtr").display())));

        let missing = Options {
            files: vec![dir.path().join("missing.wtr")],
            ..Options::default()
        };
        let read = run(&missing, &mut Vec::new()).unwrap_err();
        assert_eq!(read.exit_code(), 2);
        assert!(read.to_string().ends_with("': NotFound"));
    }

    #[test]
    fn missing_optimization_config_is_a_read_failure() {
        let dir = TempDir::new().unwrap();
        let mut options = options(&dir, &[("a.wtr", "var x = 1;")]);
        options.optimize = Some(dir.path().join("nope.properties"));
        let err = run(&options, &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("nope.properties"));
    }
}
