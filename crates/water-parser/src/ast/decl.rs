//! Declaration AST nodes: functions, constructors, classes, enums and
//! variables, at top level or inside a class body.

use water_core::Span;

use crate::ast::expr::Expr;
use crate::ast::stmt::Block;
use crate::ast::types::TypeExpr;
use crate::ast::Ident;
use crate::lexer::Token;

/// Explicit access modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Private,
}

/// Modifiers written before a declaration keyword.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Modifiers<'ast> {
    pub access: Option<Access>,
    /// The `static` keyword, when present.
    pub static_token: Option<Token<'ast>>,
}

impl Modifiers<'_> {
    pub fn is_static(&self) -> bool {
        self.static_token.is_some()
    }

    pub fn is_private(&self) -> bool {
        self.access == Some(Access::Private)
    }
}

/// A declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl<'ast> {
    Function(&'ast FunctionDecl<'ast>),
    Constructor(&'ast ConstructorDecl<'ast>),
    Class(&'ast ClassDecl<'ast>),
    Enum(&'ast EnumDecl<'ast>),
    Var(&'ast VarDecl<'ast>),
}

impl<'ast> Decl<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Decl::Function(d) => d.span,
            Decl::Constructor(d) => d.span,
            Decl::Class(d) => d.span,
            Decl::Enum(d) => d.span,
            Decl::Var(d) => d.span,
        }
    }

    /// Whether this declaration defines its own class file.
    pub fn is_new_class(&self) -> bool {
        matches!(self, Decl::Class(_) | Decl::Enum(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
}

/// Function body: a block, or `= expr;` whose type becomes the return type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionBody<'ast> {
    Block(&'ast Block<'ast>),
    Expr(&'ast Expr<'ast>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub modifiers: Modifiers<'ast>,
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    /// Declared return type; `None` means `void` for block bodies and
    /// inferred for expression bodies.
    pub return_type: Option<TypeExpr<'ast>>,
    pub throws: &'ast [TypeExpr<'ast>],
    pub body: FunctionBody<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstructorDecl<'ast> {
    pub modifiers: Modifiers<'ast>,
    pub keyword: Token<'ast>,
    pub params: &'ast [Param<'ast>],
    /// Arguments forwarded to the superclass constructor: `: (args)`.
    pub super_args: Option<&'ast [&'ast Expr<'ast>]>,
    pub body: &'ast Block<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub modifiers: Modifiers<'ast>,
    pub name: Ident<'ast>,
    pub superclass: Option<TypeExpr<'ast>>,
    pub members: &'ast [Decl<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumDecl<'ast> {
    pub modifiers: Modifiers<'ast>,
    pub name: Ident<'ast>,
    pub constants: &'ast [Ident<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    pub modifiers: Modifiers<'ast>,
    /// `const` instead of `var`.
    pub is_const: bool,
    pub name: Ident<'ast>,
    pub ty: Option<TypeExpr<'ast>>,
    pub init: Option<&'ast Expr<'ast>>,
    pub span: Span,
}
