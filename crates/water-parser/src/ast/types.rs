//! Type expressions as written in source.
//!
//! ```text
//! type = (primitive | qualified) "?"? ("[" "]")* "?"?
//! ```
//!
//! A `?` directly after the base marks the element nullable; a trailing
//! `?` after the brackets marks the array itself nullable.

use std::fmt;

use water_core::Span;

use crate::ast::QualifiedName;

/// Primitive type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Void,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Void => "void",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }
}

/// The non-array part of a type expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeBase<'ast> {
    Primitive(PrimitiveType),
    /// A (possibly qualified) class name, e.g. `String` or `java.util.List`.
    Named(QualifiedName<'ast>),
}

/// A complete type expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeExpr<'ast> {
    pub base: TypeBase<'ast>,
    /// `?` directly after the base type.
    pub base_nullable: bool,
    /// Number of `[]` suffixes.
    pub dimensions: u8,
    /// `?` after the array brackets.
    pub array_nullable: bool,
    pub span: Span,
}

impl<'ast> TypeExpr<'ast> {
    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    /// Whether the outermost type carries `?`.
    pub fn is_nullable(&self) -> bool {
        if self.is_array() {
            self.array_nullable
        } else {
            self.base_nullable
        }
    }

    pub fn is_void(&self) -> bool {
        !self.is_array() && matches!(self.base, TypeBase::Primitive(PrimitiveType::Void))
    }
}

impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.base {
            TypeBase::Primitive(p) => f.write_str(p.as_str())?,
            TypeBase::Named(name) => write!(f, "{}", name)?,
        }
        if self.base_nullable {
            f.write_str("?")?;
        }
        for _ in 0..self.dimensions {
            f.write_str("[]")?;
        }
        if self.array_nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}
