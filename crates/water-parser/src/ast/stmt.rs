//! Statement AST nodes for Water.

use water_core::Span;

use crate::ast::decl::VarDecl;
use crate::ast::expr::Expr;
use crate::ast::types::TypeExpr;
use crate::ast::Ident;
use crate::lexer::Token;

/// A statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stmt<'ast> {
    Block(&'ast Block<'ast>),
    If(&'ast IfStmt<'ast>),
    While(&'ast WhileStmt<'ast>),
    For(&'ast ForStmt<'ast>),
    Return(&'ast ReturnStmt<'ast>),
    Throw(&'ast ThrowStmt<'ast>),
    Try(&'ast TryStmt<'ast>),
    /// Local `var` / `const` declaration.
    Var(&'ast VarDecl<'ast>),
    Expr(&'ast ExprStmt<'ast>),
}

impl<'ast> Stmt<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Try(s) => s.span,
            Stmt::Var(s) => s.span,
            Stmt::Expr(s) => s.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block<'ast> {
    pub stmts: &'ast [Stmt<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfStmt<'ast> {
    pub if_token: Token<'ast>,
    pub condition: &'ast Expr<'ast>,
    pub then_branch: Stmt<'ast>,
    pub else_branch: Option<Stmt<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhileStmt<'ast> {
    pub while_token: Token<'ast>,
    pub condition: &'ast Expr<'ast>,
    pub body: Stmt<'ast>,
    pub span: Span,
}

/// Initialiser of a `for` loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForInit<'ast> {
    Var(&'ast VarDecl<'ast>),
    Expr(&'ast Expr<'ast>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForStmt<'ast> {
    pub for_token: Token<'ast>,
    pub init: ForInit<'ast>,
    pub condition: &'ast Expr<'ast>,
    pub update: &'ast Expr<'ast>,
    pub body: Stmt<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnStmt<'ast> {
    pub return_token: Token<'ast>,
    pub value: Option<&'ast Expr<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrowStmt<'ast> {
    pub throw_token: Token<'ast>,
    pub value: &'ast Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatchClause<'ast> {
    pub catch_token: Token<'ast>,
    pub binding: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub body: &'ast Block<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TryStmt<'ast> {
    pub try_token: Token<'ast>,
    pub body: &'ast Block<'ast>,
    pub catches: &'ast [CatchClause<'ast>],
    pub finally: Option<&'ast Block<'ast>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExprStmt<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
