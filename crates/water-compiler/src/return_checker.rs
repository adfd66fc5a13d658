//! Return path verification for non-void functions.
//!
//! [`ReturnChecker`] walks a function body and decides whether control
//! can reach its end without a `return` or `throw`.
//!
//! # Example
//!
//! ```ignore
//! if !ReturnChecker::new().all_paths_return(body) {
//!     // "Non-void function must return a value."
//! }
//! ```

use water_parser::ast::{Block, Expr, LiteralKind, Stmt};

/// Verifies that every path through a body ends in `return` or `throw`.
///
/// Loops whose condition is the literal `true` never complete normally,
/// as the language has no `break`.
#[derive(Debug, Default)]
pub struct ReturnChecker;

impl ReturnChecker {
    pub fn new() -> Self {
        Self
    }

    pub fn all_paths_return(&self, block: &Block<'_>) -> bool {
        self.block_returns(block)
    }

    fn block_returns(&self, block: &Block<'_>) -> bool {
        block.stmts.iter().any(|stmt| self.stmt_returns(stmt))
    }

    fn stmt_returns(&self, stmt: &Stmt<'_>) -> bool {
        match stmt {
            Stmt::Return(_) | Stmt::Throw(_) => true,
            Stmt::Block(block) => self.block_returns(block),
            Stmt::If(if_stmt) => match &if_stmt.else_branch {
                Some(else_branch) => self.stmt_returns(&if_stmt.then_branch) && self.stmt_returns(else_branch),
                None => false,
            },
            Stmt::While(while_stmt) => is_true(while_stmt.condition),
            Stmt::For(for_stmt) => is_true(for_stmt.condition),
            Stmt::Try(try_stmt) => {
                if try_stmt.finally.is_some_and(|finally| self.block_returns(finally)) {
                    return true;
                }
                self.block_returns(try_stmt.body) && try_stmt.catches.iter().all(|c| self.block_returns(c.body))
            }
            Stmt::Var(_) | Stmt::Expr(_) => false,
        }
    }
}

fn is_true(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::Paren(p) => is_true(p.expr),
        Expr::Literal(lit) => lit.kind == LiteralKind::Bool(true),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use water_parser::ast::{Decl, FunctionBody};
    use water_parser::Parser;

    fn returns(source: &str) -> bool {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).unwrap();
        let Decl::Function(function) = &program.decls[0] else { panic!("not a function") };
        let FunctionBody::Block(body) = &function.body else { panic!("not a block body") };
        ReturnChecker::new().all_paths_return(body)
    }

    #[test]
    fn plain_return() {
        assert!(returns("function f() -> int { return 1; }"));
        assert!(!returns("function f() -> int { var x = 1; }"));
        assert!(returns("function f() -> int { { throw new RuntimeException(); } }"));
    }

    #[test]
    fn if_needs_both_branches() {
        assert!(!returns("function f(a: boolean) -> int { if (a) return 1; }"));
        assert!(returns("function f(a: boolean) -> int { if (a) return 1; else return 2; }"));
        assert!(returns(
            "function f(a: boolean) -> int { if (a) { return 1; } else if (!a) { return 2; } else { throw new RuntimeException(); } }"
        ));
    }

    #[test]
    fn loops() {
        assert!(!returns("function f(a: boolean) -> int { while (a) { return 1; } }"));
        assert!(returns("function f() -> int { while (true) { } }"));
        assert!(returns("function f() -> int { for (var i = 0; (true); i++) { } }"));
    }

    #[test]
    fn try_statements() {
        assert!(returns(
            "function f() -> int { try { return 1; } catch (e: Exception) { return 2; } }"
        ));
        assert!(!returns(
            "function f() -> int { try { return 1; } catch (e: Exception) { println(e); } }"
        ));
        assert!(returns(
            "function f() -> int { try { println(1); } finally { return 3; } }"
        ));
    }
}
