//! Expression parsing using Pratt parsing (precedence climbing).

use bumpalo::collections::Vec as BumpVec;

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::ops::{CAST_BP, INSTANCEOF_BP};
use crate::ast::{AssignOp, BinaryOp, Ident, ParseError, ParseErrorKind, PostfixOp, UnaryOp};
use crate::lexer::{Token, TokenKind, unescape};

impl<'ast> Parser<'ast> {
    /// Parse a full expression.
    pub fn parse_expression(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        self.parse_expr(0)
    }

    /// Parse an expression with a minimum binding power.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<&'ast Expr<'ast>, ParseError> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let token = *self.peek();

            // Postfix operators bind tighter than anything else.
            match token.kind {
                TokenKind::Dot | TokenKind::QuestionDot => {
                    lhs = self.parse_member_access(lhs)?;
                    continue;
                }
                TokenKind::LeftBracket | TokenKind::QuestionBracket => {
                    lhs = self.parse_index(lhs)?;
                    continue;
                }
                TokenKind::Bang => {
                    self.advance();
                    lhs = self.arena.alloc(Expr::NonNull(self.arena.alloc(NonNullExpr {
                        operand: lhs,
                        op_token: token,
                        span: lhs.span().to(token.span),
                    })));
                    continue;
                }
                _ => {}
            }

            if let Some(op) = PostfixOp::from_token(token.kind) {
                if PostfixOp::binding_power() < min_bp {
                    break;
                }
                self.advance();
                lhs = self.arena.alloc(Expr::Postfix(self.arena.alloc(PostfixExpr {
                    operand: lhs,
                    op,
                    op_token: token,
                    span: lhs.span().to(token.span),
                })));
                continue;
            }

            if token.kind == TokenKind::As {
                if CAST_BP < min_bp {
                    break;
                }
                self.advance();
                let ty = self.parse_type()?;
                lhs = self.arena.alloc(Expr::Cast(self.arena.alloc(CastExpr {
                    expr: lhs,
                    as_token: token,
                    ty,
                    span: lhs.span().to(ty.span),
                })));
                continue;
            }

            if token.kind == TokenKind::InstanceOf {
                if INSTANCEOF_BP < min_bp {
                    break;
                }
                self.advance();
                let ty = self.parse_type()?;
                lhs = self.arena.alloc(Expr::InstanceOf(self.arena.alloc(InstanceOfExpr {
                    expr: lhs,
                    op_token: token,
                    ty,
                    span: lhs.span().to(ty.span),
                })));
                continue;
            }

            if let Some(op) = AssignOp::from_token(token.kind) {
                let (l_bp, r_bp) = AssignOp::binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let value = self.parse_expr(r_bp)?;
                lhs = self.arena.alloc(Expr::Assign(self.arena.alloc(AssignExpr {
                    target: lhs,
                    op,
                    op_token: token,
                    value,
                    span: lhs.span().to(value.span()),
                })));
                continue;
            }

            if let Some(op) = BinaryOp::from_token(token.kind) {
                let (l_bp, r_bp) = op.binding_power();
                if l_bp < min_bp {
                    break;
                }
                self.advance();
                let right = self.parse_expr(r_bp)?;
                lhs = self.arena.alloc(Expr::Binary(self.arena.alloc(BinaryExpr {
                    left: lhs,
                    op,
                    op_token: token,
                    right,
                    span: lhs.span().to(right.span()),
                })));
                continue;
            }

            break;
        }

        Ok(lhs)
    }

    /// Parse the start of an expression: literals, identifiers, prefix
    /// operators, `new`, `super` calls and grouping.
    fn parse_prefix(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let token = *self.peek();

        if let Some(op) = UnaryOp::from_token(token.kind) {
            self.advance();
            let operand = self.parse_expr(UnaryOp::binding_power())?;
            return Ok(self.arena.alloc(Expr::Unary(self.arena.alloc(UnaryExpr {
                op,
                op_token: token,
                operand,
                span: token.span.to(operand.span()),
            }))));
        }

        let expr = match token.kind {
            TokenKind::Number => {
                self.advance();
                validate_number(&token)?;
                Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Number(token.lexeme),
                    token,
                })
            }
            TokenKind::String => {
                self.advance();
                let text = unquote(token.lexeme);
                Expr::Literal(LiteralExpr {
                    kind: LiteralKind::String(self.arena.alloc_str(&text)),
                    token,
                })
            }
            TokenKind::Char => {
                self.advance();
                let ch = unquote(token.lexeme).chars().next().unwrap_or('\0');
                Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Char(ch),
                    token,
                })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Bool(token.kind == TokenKind::True),
                    token,
                })
            }
            TokenKind::Null => {
                self.advance();
                Expr::Literal(LiteralExpr {
                    kind: LiteralKind::Null,
                    token,
                })
            }
            TokenKind::This => {
                self.advance();
                Expr::This(token)
            }
            TokenKind::Super => return self.parse_super_call(),
            TokenKind::New => return self.parse_new(),
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "Expected ')' after expression")?;
                Expr::Paren(self.arena.alloc(ParenExpr {
                    expr: inner,
                    span: self.span_from(token.span),
                }))
            }
            TokenKind::Identifier => {
                self.advance();
                let name = Ident::new(token.lexeme, token.span);
                if self.check(TokenKind::LeftParen) {
                    let args = self.parse_args("function arguments")?;
                    Expr::Call(self.arena.alloc(CallExpr {
                        name,
                        args,
                        span: self.span_from(token.span),
                    }))
                } else {
                    Expr::Ident(name)
                }
            }
            _ => return Err(self.error_here("Expected value")),
        };

        Ok(self.arena.alloc(expr))
    }

    /// `.name`, `.name(args)`, `?.name`, `?.name(args)`
    fn parse_member_access(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        let dot = self.advance();
        let null_safe = dot.kind == TokenKind::QuestionDot;
        let name = self.expect_ident("Expected member name")?;

        let expr = if self.check(TokenKind::LeftParen) {
            let args = self.parse_args("method arguments")?;
            Expr::MethodCall(self.arena.alloc(MethodCallExpr {
                receiver: object,
                name,
                args,
                null_safe,
                span: self.span_from(object.span()),
            }))
        } else {
            Expr::Member(self.arena.alloc(MemberExpr {
                object,
                name,
                null_safe,
                span: object.span().to(name.span),
            }))
        };
        Ok(self.arena.alloc(expr))
    }

    /// `[index]` or `?[index]`
    fn parse_index(&mut self, object: &'ast Expr<'ast>) -> Result<&'ast Expr<'ast>, ParseError> {
        let bracket = self.advance();
        let index = self.parse_expression()?;
        self.expect(TokenKind::RightBracket, "Expected ']' after index")?;
        Ok(self.arena.alloc(Expr::Index(self.arena.alloc(IndexExpr {
            object,
            index,
            bracket,
            null_safe: bracket.kind == TokenKind::QuestionBracket,
            span: self.span_from(object.span()),
        }))))
    }

    /// `super.name(args)`
    fn parse_super_call(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let super_token = self.advance();
        self.expect(TokenKind::Dot, "Expected '.' after super")?;
        let name = self.expect_ident("Expected super method name")?;
        let args = self.parse_args("super arguments")?;
        Ok(self.arena.alloc(Expr::SuperCall(self.arena.alloc(SuperCallExpr {
            super_token,
            name,
            args,
            span: self.span_from(super_token.span),
        }))))
    }

    /// `new T(args)` or `new T[n][m]...`
    fn parse_new(&mut self) -> Result<&'ast Expr<'ast>, ParseError> {
        let new_token = self.advance();
        let ty = self.parse_type_base()?;

        if self.check(TokenKind::LeftBracket) {
            let mut sizes = BumpVec::new_in(self.arena);
            while self.eat(TokenKind::LeftBracket).is_some() {
                sizes.push(self.parse_expression()?);
                self.expect(TokenKind::RightBracket, "Expected ']' after array size")?;
            }
            return Ok(self.arena.alloc(Expr::NewArray(self.arena.alloc(NewArrayExpr {
                new_token,
                element: ty,
                sizes: sizes.into_bump_slice(),
                span: self.span_from(new_token.span),
            }))));
        }

        let args = self.parse_args("constructor arguments")?;
        Ok(self.arena.alloc(Expr::New(self.arena.alloc(NewExpr {
            new_token,
            ty,
            args,
            span: self.span_from(new_token.span),
        }))))
    }

    /// args = "(" (expr ("," expr)*)? ")"
    pub(crate) fn parse_args(&mut self, what: &str) -> Result<&'ast [&'ast Expr<'ast>], ParseError> {
        self.expect(TokenKind::LeftParen, &format!("Expected '(' before {}", what))?;
        let mut args = BumpVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, &format!("Expected ')' after {}", what))?;
        Ok(args.into_bump_slice())
    }
}

/// Strip the quotes from a string or char lexeme and resolve escapes.
fn unquote(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len().saturating_sub(1).max(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(unescape(escaped).unwrap_or(escaped));
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Reject numeric literals that cannot fit their type even when negated.
fn validate_number(token: &Token<'_>) -> Result<(), ParseError> {
    let text = token.lexeme;
    let out_of_range = || {
        ParseError::new(
            ParseErrorKind::InvalidLiteral,
            token.span,
            text,
            "Number literal out of range",
        )
    };

    if let Some(digits) = text.strip_suffix(['l', 'L']) {
        let value: u64 = digits.parse().map_err(|_| out_of_range())?;
        if value > i64::MAX as u64 + 1 {
            return Err(out_of_range());
        }
    } else if !text.contains('.') && !text.ends_with(['f', 'F']) {
        let value: u64 = text.parse().map_err(|_| out_of_range())?;
        if value > i32::MAX as u64 + 1 {
            return Err(out_of_range());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;

    fn parse<'a>(source: &str, arena: &'a Bump) -> &'a Expr<'a> {
        let mut parser = Parser::new(source, arena).unwrap();
        parser.parse_expression().unwrap()
    }

    #[test]
    fn parse_number_literal() {
        let arena = Bump::new();
        let expr = parse("42", &arena);
        assert!(matches!(expr, Expr::Literal(LiteralExpr { kind: LiteralKind::Number("42"), .. })));
    }

    #[test]
    fn parse_precedence() {
        // 1 + 2 * 3 should parse as 1 + (2 * 3)
        let arena = Bump::new();
        let Expr::Binary(bin) = parse("1 + 2 * 3", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(bin.op, BinaryOp::Add);
        assert!(matches!(bin.right, Expr::Binary(inner) if inner.op == BinaryOp::Mul));
    }

    #[test]
    fn parse_left_associativity() {
        let arena = Bump::new();
        let Expr::Binary(bin) = parse("a - b - c", &arena) else {
            panic!("expected binary");
        };
        assert!(matches!(bin.left, Expr::Binary(inner) if inner.op == BinaryOp::Sub));
    }

    #[test]
    fn assignment_is_right_associative() {
        let arena = Bump::new();
        let Expr::Assign(assign) = parse("a = b += 2", &arena) else {
            panic!("expected assignment");
        };
        assert_eq!(assign.op, AssignOp::Assign);
        assert!(matches!(assign.value, Expr::Assign(inner) if inner.op == AssignOp::AddAssign));
    }

    #[test]
    fn null_coalescing_binds_loosest() {
        let arena = Bump::new();
        let Expr::Binary(bin) = parse("a ?? b || c", &arena) else {
            panic!("expected binary");
        };
        assert_eq!(bin.op, BinaryOp::NullCoalesce);
        assert!(matches!(bin.right, Expr::Binary(inner) if inner.op == BinaryOp::LogicalOr));
    }

    #[test]
    fn cast_binds_tighter_than_multiplication() {
        let arena = Bump::new();
        let Expr::Binary(bin) = parse("a * b as long", &arena) else {
            panic!("expected binary");
        };
        assert!(matches!(bin.right, Expr::Cast(_)));
    }

    #[test]
    fn nullable_chain() {
        let arena = Bump::new();
        let Expr::Member(c) = parse("a?.b?.c", &arena) else {
            panic!("expected member");
        };
        assert!(c.null_safe);
        assert_eq!(c.name.name, "c");
        assert!(matches!(c.object, Expr::Member(b) if b.null_safe && b.name.name == "b"));
    }

    #[test]
    fn method_calls_and_index() {
        let arena = Bump::new();
        let Expr::MethodCall(call) = parse("System.out.println(xs[0], ys?[1])", &arena) else {
            panic!("expected method call");
        };
        assert_eq!(call.name.name, "println");
        assert_eq!(call.args.len(), 2);
        assert!(matches!(call.args[1], Expr::Index(idx) if idx.null_safe));
        assert!(matches!(call.receiver, Expr::Member(m) if m.name.name == "out"));
    }

    #[test]
    fn non_null_assertion_and_postfix() {
        let arena = Bump::new();
        assert!(matches!(parse("x!", &arena), Expr::NonNull(_)));
        assert!(matches!(parse("x!.y", &arena), Expr::Member(m) if matches!(m.object, Expr::NonNull(_))));
        assert!(matches!(parse("i++", &arena), Expr::Postfix(p) if p.op == PostfixOp::PostInc));
        assert!(matches!(parse("--i", &arena), Expr::Unary(u) if u.op == UnaryOp::PreDec));
        assert!(matches!(parse("a != b", &arena), Expr::Binary(b) if b.op == BinaryOp::NotEqual));
    }

    #[test]
    fn new_objects_and_arrays() {
        let arena = Bump::new();
        assert!(matches!(parse("new StringBuilder(\"x\")", &arena), Expr::New(n) if n.args.len() == 1));
        let Expr::NewArray(array) = parse("new int[3][4]", &arena) else {
            panic!("expected array");
        };
        assert_eq!(array.sizes.len(), 2);
    }

    #[test]
    fn instanceof_and_super() {
        let arena = Bump::new();
        assert!(matches!(parse("o instanceof String && b", &arena), Expr::Binary(b) if matches!(b.left, Expr::InstanceOf(_))));
        assert!(matches!(parse("super.toString()", &arena), Expr::SuperCall(s) if s.args.is_empty()));
    }

    #[test]
    fn string_escapes_are_resolved() {
        let arena = Bump::new();
        let expr = parse(r#""a\tb\n""#, &arena);
        assert!(matches!(expr, Expr::Literal(LiteralExpr { kind: LiteralKind::String("a\tb\n"), .. })));
        let expr = parse(r"'\''", &arena);
        assert!(matches!(expr, Expr::Literal(LiteralExpr { kind: LiteralKind::Char('\''), .. })));
    }

    #[test]
    fn number_range_checks() {
        let arena = Bump::new();
        assert!(Parser::new("2147483648", &arena).unwrap().parse_expression().is_ok());
        let err = Parser::new("2147483649", &arena).unwrap().parse_expression().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidLiteral);
        assert!(Parser::new("9223372036854775808L", &arena).unwrap().parse_expression().is_ok());
    }

    #[test]
    fn expected_value() {
        let arena = Bump::new();
        let err = Parser::new(")", &arena).unwrap().parse_expression().unwrap_err();
        assert_eq!(err.message, "Expected value");
    }
}
