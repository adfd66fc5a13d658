//! Type expression parsing.

use super::parser::Parser;
use crate::ast::types::{PrimitiveType, TypeBase, TypeExpr};
use crate::ast::ParseError;
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// type = (primitive | qualified) "?"? ("[" "]")* "?"?
    pub(crate) fn parse_type(&mut self) -> Result<TypeExpr<'ast>, ParseError> {
        let mut ty = self.parse_type_base()?;

        while self.check(TokenKind::LeftBracket) && self.peek_nth(1).kind == TokenKind::RightBracket {
            self.advance();
            self.advance();
            ty.dimensions += 1;
        }

        if ty.dimensions > 0 && self.eat(TokenKind::Question).is_some() {
            ty.array_nullable = true;
        }

        ty.span = self.span_from(ty.span);
        Ok(ty)
    }

    /// (primitive | qualified) "?"?
    pub(crate) fn parse_type_base(&mut self) -> Result<TypeExpr<'ast>, ParseError> {
        let start = self.peek().span;

        let base = match primitive_from_token(self.peek().kind) {
            Some(primitive) => {
                self.advance();
                TypeBase::Primitive(primitive)
            }
            None if self.check(TokenKind::Identifier) => {
                TypeBase::Named(self.parse_qualified_name("Expected class name")?)
            }
            None => return Err(self.error_here("Expected type")),
        };

        let base_nullable = self.eat(TokenKind::Question).is_some();

        Ok(TypeExpr {
            base,
            base_nullable,
            dimensions: 0,
            array_nullable: false,
            span: self.span_from(start),
        })
    }
}

fn primitive_from_token(kind: TokenKind) -> Option<PrimitiveType> {
    Some(match kind {
        TokenKind::Void => PrimitiveType::Void,
        TokenKind::Boolean => PrimitiveType::Boolean,
        TokenKind::CharKw => PrimitiveType::Char,
        TokenKind::Byte => PrimitiveType::Byte,
        TokenKind::Short => PrimitiveType::Short,
        TokenKind::Int => PrimitiveType::Int,
        TokenKind::Long => PrimitiveType::Long,
        TokenKind::Float => PrimitiveType::Float,
        TokenKind::Double => PrimitiveType::Double,
        _ => return None,
    })
}
