//! Expression AST nodes for Water.
//!
//! # Expression Precedence
//!
//! The parser uses Pratt parsing with the following precedence levels,
//! lowest first:
//! 1. Assignment (=, +=, etc.) - right associative
//! 2. Null coalescing (??)
//! 3. Logical OR (||)
//! 4. Logical AND (&&)
//! 5. Bitwise OR (|)
//! 6. Bitwise XOR (^)
//! 7. Bitwise AND (&)
//! 8. Equality (==, !=, ===, !==)
//! 9. Relational (<, <=, >, >=, instanceof)
//! 10. Bitwise shift (<<, >>, >>>)
//! 11. Additive (+, -)
//! 12. Multiplicative (*, /, %)
//! 13. Cast (as)
//! 14. Prefix unary (-, !, ~, ++, --)
//! 15. Postfix (call, index, member, null-safe access, !, ++, --)

use water_core::Span;

use crate::ast::types::TypeExpr;
use crate::ast::{AssignOp, BinaryOp, Ident, PostfixOp, UnaryOp};
use crate::lexer::Token;

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    Literal(LiteralExpr<'ast>),
    /// Variable reference (or the head of a static access like `Math.max`).
    Ident(Ident<'ast>),
    /// `this`
    This(Token<'ast>),
    Binary(&'ast BinaryExpr<'ast>),
    Unary(&'ast UnaryExpr<'ast>),
    Postfix(&'ast PostfixExpr<'ast>),
    /// Non-null assertion `expr!`
    NonNull(&'ast NonNullExpr<'ast>),
    Assign(&'ast AssignExpr<'ast>),
    /// Free function call `f(args)`
    Call(&'ast CallExpr<'ast>),
    /// Method call `recv.m(args)` or `recv?.m(args)`
    MethodCall(&'ast MethodCallExpr<'ast>),
    /// `super.m(args)`
    SuperCall(&'ast SuperCallExpr<'ast>),
    /// Field access `obj.f` or `obj?.f`
    Member(&'ast MemberExpr<'ast>),
    /// Indexing `a[i]` or `a?[i]`
    Index(&'ast IndexExpr<'ast>),
    /// Object construction `new T(args)`
    New(&'ast NewExpr<'ast>),
    /// Array construction `new T[n][m]`
    NewArray(&'ast NewArrayExpr<'ast>),
    /// `expr as T`
    Cast(&'ast CastExpr<'ast>),
    /// `expr instanceof T`
    InstanceOf(&'ast InstanceOfExpr<'ast>),
    /// `( expr )`
    Paren(&'ast ParenExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.token.span,
            Self::Ident(e) => e.span,
            Self::This(t) => t.span,
            Self::Binary(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Postfix(e) => e.span,
            Self::NonNull(e) => e.span,
            Self::Assign(e) => e.span,
            Self::Call(e) => e.span,
            Self::MethodCall(e) => e.span,
            Self::SuperCall(e) => e.span,
            Self::Member(e) => e.span,
            Self::Index(e) => e.span,
            Self::New(e) => e.span,
            Self::NewArray(e) => e.span,
            Self::Cast(e) => e.span,
            Self::InstanceOf(e) => e.span,
            Self::Paren(e) => e.span,
        }
    }

    /// The token that best identifies this expression in a diagnostic.
    pub fn token(&self) -> Token<'ast> {
        match self {
            Self::Literal(e) => e.token,
            Self::Ident(e) => e.token(),
            Self::This(t) => *t,
            Self::Binary(e) => e.op_token,
            Self::Unary(e) => e.op_token,
            Self::Postfix(e) => e.op_token,
            Self::NonNull(e) => e.op_token,
            Self::Assign(e) => e.op_token,
            Self::Call(e) => e.name.token(),
            Self::MethodCall(e) => e.name.token(),
            Self::SuperCall(e) => e.name.token(),
            Self::Member(e) => e.name.token(),
            Self::Index(e) => e.bracket,
            Self::New(e) => e.new_token,
            Self::NewArray(e) => e.new_token,
            Self::Cast(e) => e.as_token,
            Self::InstanceOf(e) => e.op_token,
            Self::Paren(e) => e.expr.token(),
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr<'ast> {
        let mut expr = self;
        while let Expr::Paren(p) = expr {
            expr = p.expr;
        }
        expr
    }
}

/// A literal value. Numeric literals keep their source text; the compiler
/// decides the type from the suffix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr<'ast> {
    pub kind: LiteralKind<'ast>,
    pub token: Token<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind<'ast> {
    /// Numeric literal source text, e.g. `12`, `2.5`, `3f`, `4L`.
    Number(&'ast str),
    /// String literal with escapes resolved.
    String(&'ast str),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub op_token: Token<'ast>,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub op_token: Token<'ast>,
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostfixExpr<'ast> {
    pub operand: &'ast Expr<'ast>,
    pub op: PostfixOp,
    pub op_token: Token<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonNullExpr<'ast> {
    pub operand: &'ast Expr<'ast>,
    pub op_token: Token<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignExpr<'ast> {
    pub target: &'ast Expr<'ast>,
    pub op: AssignOp,
    pub op_token: Token<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub name: Ident<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodCallExpr<'ast> {
    pub receiver: &'ast Expr<'ast>,
    pub name: Ident<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    /// `?.` instead of `.`
    pub null_safe: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuperCallExpr<'ast> {
    pub super_token: Token<'ast>,
    pub name: Ident<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub name: Ident<'ast>,
    /// `?.` instead of `.`
    pub null_safe: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexExpr<'ast> {
    pub object: &'ast Expr<'ast>,
    pub index: &'ast Expr<'ast>,
    /// The `[` or `?[` token.
    pub bracket: Token<'ast>,
    pub null_safe: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewExpr<'ast> {
    pub new_token: Token<'ast>,
    pub ty: TypeExpr<'ast>,
    pub args: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewArrayExpr<'ast> {
    pub new_token: Token<'ast>,
    /// Element type (never an array itself).
    pub element: TypeExpr<'ast>,
    /// One size expression per dimension.
    pub sizes: &'ast [&'ast Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub as_token: Token<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceOfExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub op_token: Token<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParenExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
