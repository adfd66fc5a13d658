//! JVM class file support for the Water compiler.
//!
//! This crate is the compiler's bytecode sink and class path reader:
//! - [`CodeBuilder`]: append-only instruction stream with forward labels
//! - [`ClassBuilder`]: fields, methods and attributes serialized as a
//!   version 49 class file
//! - [`ClassFile`]: reader used to resolve pre-compiled classes
//! - [`Classpath`]: directory and archive index

pub mod access;
pub mod annotation;
mod bytes;
mod class;
mod classpath;
mod code;
pub mod descriptor;
mod error;
pub mod opcode;
mod pool;
mod reader;

pub use access::AccessFlags;
pub use annotation::Nullable;
pub use class::{ClassBuilder, FieldDef, MethodDef, MAJOR_VERSION};
pub use classpath::{Classpath, ClasspathEntry};
pub use code::{AssembledCode, CodeBuilder, ExceptionEntry, Label, LdcValue};
pub use error::{ClassFileError, ClasspathError, Result};
pub use opcode::{ArrayType, Opcode};
pub use pool::{Constant, ConstantPool};
pub use reader::{ClassFile, CodeInfo, FieldInfo, MethodInfo};
