//! Water Compiler
//!
//! Type checks parsed Water programs and lowers them to JVM class files.
//!
//! ## Architecture
//!
//! Every pass runs over all files of a compilation before the next one
//! starts, so files can refer to each other's classes and members:
//!
//! - **Pass 0 (Declaration)**: Name every class and declare an empty shell
//! - **Pass 1 (Skeleton)**: Resolve superclasses, then register fields and
//!   method signatures, inferring the return types of `= expr` functions
//! - **Pass 2 (Compilation)**: Type check bodies and generate bytecode
//!
//! [`Pipeline`] drives the passes and serializes the result.
//!
//! ## Modules
//!
//! - [`builtins`]: Built-in table of the JDK classes the language relies on
//! - [`context`]: Per-file symbol tables, imports and class name resolution
//! - [`directory`]: Structural class queries over declared, class path and JDK classes
//! - [`expr`]: Expression compiler
//! - [`fold`]: Constant folding
//! - [`function_compiler`]: One method body at a time
//! - [`options`]: Optimization switches
//! - [`overload`]: Overload resolution for calls and constructors
//! - [`passes`]: The three compilation passes
//! - [`return_checker`]: "Every path returns" analysis
//! - [`scope`]: Members, locals and accessor naming
//! - [`stmt`]: Statement compiler for control flow and declarations
//! - [`types`]: The Water type model and its JVM lowering

pub mod builtins;
pub mod context;
pub mod directory;
pub mod error;
pub mod expr;
pub mod fold;
pub mod function_compiler;
pub mod options;
pub mod overload;
pub mod passes;
pub mod pipeline;
pub mod return_checker;
pub mod scope;
pub mod stmt;
pub mod types;

pub use context::{ClassScope, CompilationContext, CONTAINER_SUFFIX};
pub use directory::{ClassDirectory, ClassInfo, TypeDirectory};
pub use error::{CompileError, Result};
pub use expr::ExprCompiler;
pub use function_compiler::{Frame, FunctionCompiler};
pub use options::{ConfigError, OptimizationConfig};
pub use overload::{resolve_overload, OverloadError, OverloadMatch};
pub use passes::{CompilationPass, DeclarationPass, SkeletonPass};
pub use pipeline::{CompiledClass, FileError, Pipeline, SourceFile};
pub use scope::{LocalScope, MemberTable};
pub use stmt::StmtCompiler;
pub use types::{MethodType, WaterType};

// Re-exported so callers can match on error kinds without naming water-core.
pub use water_core::{SemanticError, SemanticErrorKind};
