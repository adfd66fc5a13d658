//! Statement parsing.

use bumpalo::collections::Vec as BumpVec;

use super::parser::Parser;
use crate::ast::stmt::*;
use crate::ast::{Modifiers, ParseError};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// statement = block | if | while | for | return | throw | try | variable | expr ";"
    pub(crate) fn parse_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        match self.peek().kind {
            TokenKind::LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.parse_block_rest()?))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Throw => self.parse_throw(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Var | TokenKind::Const => {
                let keyword = self.advance();
                let decl =
                    self.parse_variable(Modifiers::default(), keyword.kind == TokenKind::Const, keyword.span)?;
                Ok(Stmt::Var(decl))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.peek().span;
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after expression")?;
        Ok(Stmt::Expr(self.arena.alloc(ExprStmt {
            expr,
            span: self.span_from(start),
        })))
    }

    /// if = "if" "(" expr ")" statement ("else" statement)?
    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let if_token = self.advance();
        self.expect(TokenKind::LeftParen, "Expected '(' after if")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expected ')' after condition")?;

        let then_branch = self.parse_statement()?;
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            Some(self.parse_statement()?)
        } else {
            None
        };

        Ok(Stmt::If(self.arena.alloc(IfStmt {
            if_token,
            condition,
            then_branch,
            else_branch,
            span: self.span_from(if_token.span),
        })))
    }

    /// while = "while" "(" expr ")" statement
    fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let while_token = self.advance();
        self.expect(TokenKind::LeftParen, "Expected '(' after while")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expected ')' after condition")?;
        let body = self.parse_statement()?;

        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            while_token,
            condition,
            body,
            span: self.span_from(while_token.span),
        })))
    }

    /// for = "for" "(" (variable | expr ";") expr ";" expr ")" statement
    fn parse_for(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let for_token = self.advance();
        self.expect(TokenKind::LeftParen, "Expected '(' after for")?;

        let init = if matches!(self.peek().kind, TokenKind::Var | TokenKind::Const) {
            let keyword = self.advance();
            ForInit::Var(self.parse_variable(
                Modifiers::default(),
                keyword.kind == TokenKind::Const,
                keyword.span,
            )?)
        } else {
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "Expected ';' after initializer")?;
            ForInit::Expr(expr)
        };

        let condition = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after condition")?;
        let update = self.parse_expression()?;
        self.expect(TokenKind::RightParen, "Expected ')' before for body")?;
        let body = self.parse_statement()?;

        Ok(Stmt::For(self.arena.alloc(ForStmt {
            for_token,
            init,
            condition,
            update,
            body,
            span: self.span_from(for_token.span),
        })))
    }

    fn parse_return(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let return_token = self.advance();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "Expected ';' after return")?;

        Ok(Stmt::Return(self.arena.alloc(ReturnStmt {
            return_token,
            value,
            span: self.span_from(return_token.span),
        })))
    }

    fn parse_throw(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let throw_token = self.advance();
        let value = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "Expected ';' after throw target")?;

        Ok(Stmt::Throw(self.arena.alloc(ThrowStmt {
            throw_token,
            value,
            span: self.span_from(throw_token.span),
        })))
    }

    /// try = "try" block ("catch" "(" IDENT ":" type ")" block)* ("finally" block)?
    fn parse_try(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let try_token = self.advance();
        self.expect(TokenKind::LeftBrace, "Expected '{' after try")?;
        let body = self.parse_block_rest()?;

        let mut catches = BumpVec::new_in(self.arena);
        while let Some(catch_token) = self.eat(TokenKind::Catch) {
            self.expect(TokenKind::LeftParen, "Expected '(' after catch")?;
            let binding = self.expect_ident("Expected catch exception binding name")?;
            self.expect(TokenKind::Colon, "Expected ':' between name and type")?;
            let ty = self.parse_type()?;
            self.expect(TokenKind::RightParen, "Expected ')' after catch clause")?;
            self.expect(TokenKind::LeftBrace, "Expected '{' after catch clause")?;
            let body = self.parse_block_rest()?;
            catches.push(CatchClause {
                catch_token,
                binding,
                ty,
                body,
            });
        }

        let finally = if self.eat(TokenKind::Finally).is_some() {
            self.expect(TokenKind::LeftBrace, "Expected '{' after finally")?;
            Some(self.parse_block_rest()?)
        } else {
            None
        };

        if catches.is_empty() && finally.is_none() {
            return Err(self.error_here("Expected 'catch' or 'finally' after try block"));
        }

        Ok(Stmt::Try(self.arena.alloc(TryStmt {
            try_token,
            body,
            catches: catches.into_bump_slice(),
            finally,
            span: self.span_from(try_token.span),
        })))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    fn body<'a>(source: &str, arena: &'a Bump) -> &'a [Stmt<'a>] {
        let wrapped = format!("function main() {{ {} }}", source);
        let program = Parser::parse(&wrapped, arena).unwrap();
        match program.decls[0] {
            Decl::Function(f) => match f.body {
                FunctionBody::Block(b) => b.stmts,
                FunctionBody::Expr(_) => panic!("expected block body"),
            },
            _ => panic!("expected function"),
        }
    }

    #[test]
    fn if_else_chain() {
        let arena = Bump::new();
        let stmts = body("if (a) b(); else if (c) d(); else { e(); }", &arena);
        let Stmt::If(stmt) = stmts[0] else { panic!() };
        assert!(matches!(stmt.else_branch, Some(Stmt::If(_))));
    }

    #[test]
    fn for_loop_forms() {
        let arena = Bump::new();
        let stmts = body("for (var i = 0; i < 10; i++) {} for (i = 0; i < 3; i += 1) x();", &arena);
        let Stmt::For(first) = stmts[0] else { panic!() };
        assert!(matches!(first.init, ForInit::Var(_)));
        let Stmt::For(second) = stmts[1] else { panic!() };
        assert!(matches!(second.init, ForInit::Expr(Expr::Assign(_))));
    }

    #[test]
    fn try_catch_finally() {
        let arena = Bump::new();
        let stmts = body(
            "try { risky(); } catch (e: IllegalStateException) { } catch (e: Exception) { } finally { done(); }",
            &arena,
        );
        let Stmt::Try(stmt) = stmts[0] else { panic!() };
        assert_eq!(stmt.catches.len(), 2);
        assert_eq!(stmt.catches[0].binding.name, "e");
        assert!(stmt.finally.is_some());
    }

    #[test]
    fn try_requires_handler() {
        let arena = Bump::new();
        let err = Parser::parse("function f() { try { } }", &arena).unwrap_err();
        assert_eq!(err.message, "Expected 'catch' or 'finally' after try block");
    }

    #[test]
    fn return_throw_and_locals() {
        let arena = Bump::new();
        let stmts = body("const x = 1; throw new Exception(); return;", &arena);
        assert!(matches!(stmts[0], Stmt::Var(v) if v.is_const));
        assert!(matches!(stmts[1], Stmt::Throw(_)));
        assert!(matches!(stmts[2], Stmt::Return(r) if r.value.is_none()));
    }

    #[test]
    fn missing_semicolon() {
        let arena = Bump::new();
        let err = Parser::parse("function f() { x() }", &arena).unwrap_err();
        assert_eq!(err.message, "Expected ';' after expression");
        assert_eq!(err.lexeme, "}");
    }
}
