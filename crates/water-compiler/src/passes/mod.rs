//! Compiler passes.
//!
//! - [`declaration`]: Pass 0 - name every class of every file
//! - [`skeleton`]: Pass 1 - register members with complete signatures
//! - [`compilation`]: Pass 2 - type check bodies and emit class files
//!
//! Each pass runs over all files before the next one starts, so a file
//! can use classes and members declared by any other file of the run.

use water_parser::ast::{ClassDecl, EnumDecl, Program};

use crate::context::CompilationContext;

pub mod compilation;
pub mod declaration;
pub(crate) mod layout;
pub mod skeleton;

pub use compilation::CompilationPass;
pub use declaration::DeclarationPass;
pub use skeleton::SkeletonPass;

/// Declaration a class is compiled from.
#[derive(Debug, Clone, Copy)]
pub enum ClassSource<'ast> {
    Class(&'ast ClassDecl<'ast>),
    Enum(&'ast EnumDecl<'ast>),
}

/// A class or enum declared by a source file.
#[derive(Debug, Clone)]
pub struct DeclaredClass<'ast> {
    /// Internal name.
    pub name: String,
    pub source: ClassSource<'ast>,
}

/// One source file moving through the passes.
#[derive(Debug)]
pub struct FileUnit<'ast> {
    pub ctx: CompilationContext,
    pub program: Program<'ast>,
    /// Classes and enums in declaration order, nested ones after their
    /// enclosing class.
    pub classes: Vec<DeclaredClass<'ast>>,
}
