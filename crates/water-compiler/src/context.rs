//! Per-file compilation context.
//!
//! One [`CompilationContext`] exists for every source file. It owns the
//! symbol tables built by the skeleton pass (one [`ClassScope`] per class
//! the file declares, the container class included), the import table
//! used to resolve simple class names, and the optimization switches.
//!
//! Everything that changes while a method body is compiled (the code
//! sink, locals, the static/constructor flags) lives in a
//! [`Frame`](crate::function_compiler::Frame) instead, so the context is
//! only borrowed immutably during code generation.

use rustc_hash::FxHashMap;
use water_parser::ast::{PrimitiveType, QualifiedName, TypeBase, TypeExpr};
use water_parser::{Token, TokenKind};

use crate::directory::TypeDirectory;
use crate::error::{semantic, semantic_kind, Result};
use crate::options::OptimizationConfig;
use crate::scope::{builtin_functions, MemberTable};
use crate::types::{WaterType, OBJECT};
use water_core::SemanticErrorKind;

/// Suffix of the class holding a file's top-level declarations.
pub const CONTAINER_SUFFIX: &str = "Wtr";

/// Symbols of one class declared in the file being compiled.
#[derive(Debug, Clone)]
pub struct ClassScope {
    /// Internal name.
    pub name: String,
    pub superclass: String,
    pub members: MemberTable,
    pub is_enum: bool,
}

impl ClassScope {
    pub fn new(name: impl Into<String>, superclass: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: superclass.into(),
            members: MemberTable::new(),
            is_enum: false,
        }
    }
}

/// Name resolution and symbol tables for one source file.
#[derive(Debug)]
pub struct CompilationContext {
    source_file: String,
    package: String,
    container: String,
    needs_container: bool,
    imports: FxHashMap<String, String>,
    classes: FxHashMap<String, ClassScope>,
    builtins: MemberTable,
    options: OptimizationConfig,
}

impl CompilationContext {
    /// Create the context of `source_file` (a file name such as
    /// `main.wtr`) in package `package` (internal prefix, `a/b/` or empty).
    pub fn new(
        source_file: impl Into<String>,
        package: impl Into<String>,
        needs_container: bool,
        options: OptimizationConfig,
    ) -> Self {
        let source_file = source_file.into();
        let package = package.into();
        let stem = source_file.split('.').next().unwrap_or_default();
        let container = format!("{}{}{}", package, stem, CONTAINER_SUFFIX);
        let mut classes = FxHashMap::default();
        classes.insert(container.clone(), ClassScope::new(container.clone(), OBJECT));
        Self {
            source_file,
            package,
            container,
            needs_container,
            imports: FxHashMap::default(),
            classes,
            builtins: builtin_functions(),
            options,
        }
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    /// Internal package prefix, `a/b/` or empty.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Internal name of the class holding top-level declarations.
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn needs_container(&self) -> bool {
        self.needs_container
    }

    pub fn options(&self) -> &OptimizationConfig {
        &self.options
    }

    pub fn builtins(&self) -> &MemberTable {
        &self.builtins
    }

    /// Map a simple class name to an internal name.
    pub fn add_import(&mut self, simple: impl Into<String>, internal: impl Into<String>) {
        self.imports.insert(simple.into(), internal.into());
    }

    pub fn declare_class(&mut self, scope: ClassScope) {
        self.classes.insert(scope.name.clone(), scope);
    }

    pub fn class(&self, name: &str) -> Option<&ClassScope> {
        self.classes.get(name)
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut ClassScope> {
        self.classes.get_mut(name)
    }

    /// Whether `name` is a class declared by this file.
    pub fn is_local_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Internal name a simple name refers to, if it names a class.
    pub fn lookup_class(&self, name: &str, directory: &dyn TypeDirectory) -> Option<String> {
        if let Some(internal) = self.imports.get(name) {
            return Some(internal.clone());
        }
        let in_package = format!("{}{}", self.package, name);
        if self.classes.contains_key(&in_package) || directory.class(&in_package).is_some() {
            return Some(in_package);
        }
        let in_lang = format!("java/lang/{}", name);
        directory.class(&in_lang).map(|_| in_lang)
    }

    /// Resolve a class name as written in source.
    pub fn resolve_class(&self, name: &QualifiedName<'_>, directory: &dyn TypeDirectory) -> Result<String> {
        let token = name.parts.last().map(|p| p.token());
        let not_found = |display: String| {
            let token = token.unwrap_or_else(|| Token::new(TokenKind::Identifier, "", name.span));
            semantic_kind(
                SemanticErrorKind::ClassResolution,
                &token,
                format!("Could not resolve class '{}'", display),
            )
        };
        if name.parts.len() > 1 {
            let internal = name.internal_name();
            if self.classes.contains_key(&internal) || directory.class(&internal).is_some() {
                return Ok(internal);
            }
            return Err(not_found(name.join(".")));
        }
        self.lookup_class(name.simple_name(), directory)
            .ok_or_else(|| not_found(name.simple_name().to_string()))
    }

    /// Resolve a type expression.
    pub fn resolve_type(&self, ty: &TypeExpr<'_>, directory: &dyn TypeDirectory) -> Result<WaterType> {
        let element = match &ty.base {
            TypeBase::Primitive(primitive) => {
                let token = Token::new(TokenKind::Identifier, primitive.as_str(), ty.span);
                if ty.base_nullable {
                    return Err(semantic(&token, "Primitive types cannot be nullable."));
                }
                if *primitive == PrimitiveType::Void && ty.is_array() {
                    return Err(semantic(&token, "Unexpected primitive type"));
                }
                primitive_type(*primitive)
            }
            TypeBase::Named(name) => {
                WaterType::object(self.resolve_class(name, directory)?).with_nullable(ty.base_nullable)
            }
        };
        let mut resolved = element;
        for _ in 0..ty.dimensions {
            resolved = WaterType::array_of(resolved);
        }
        if ty.is_array() {
            resolved = resolved.with_nullable(ty.array_nullable);
        }
        Ok(resolved)
    }
}

pub(crate) fn primitive_type(primitive: PrimitiveType) -> WaterType {
    match primitive {
        PrimitiveType::Void => WaterType::VOID,
        PrimitiveType::Boolean => WaterType::BOOLEAN,
        PrimitiveType::Char => WaterType::CHAR,
        PrimitiveType::Byte => WaterType::BYTE,
        PrimitiveType::Short => WaterType::SHORT,
        PrimitiveType::Int => WaterType::INT,
        PrimitiveType::Long => WaterType::LONG,
        PrimitiveType::Float => WaterType::FLOAT,
        PrimitiveType::Double => WaterType::DOUBLE,
    }
}
