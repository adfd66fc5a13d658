//! Declaration parsing: functions, constructors, classes, enums and
//! variables.

use bumpalo::collections::Vec as BumpVec;

use super::parser::Parser;
use crate::ast::decl::*;
use crate::ast::{Block, ParseError};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// declaration = ("public"|"private")? ("static")? (function | class | enum | constructor | variable)
    pub(crate) fn parse_declaration(&mut self) -> Result<Decl<'ast>, ParseError> {
        let start = self.peek().span;
        let mut modifiers = Modifiers::default();

        if self.eat(TokenKind::Public).is_some() {
            modifiers.access = Some(Access::Public);
        } else if self.eat(TokenKind::Private).is_some() {
            modifiers.access = Some(Access::Private);
        }

        if self.in_class {
            modifiers.static_token = self.eat(TokenKind::Static);
        }

        let keyword = self.advance();
        let decl = match keyword.kind {
            TokenKind::Function => Decl::Function(self.parse_function(modifiers, start)?),
            TokenKind::Class => {
                if let Some(token) = modifiers.static_token {
                    return Err(Self::error_at(&token, "Classes cannot be static"));
                }
                Decl::Class(self.parse_class(modifiers, start)?)
            }
            TokenKind::Enum => Decl::Enum(self.parse_enum(modifiers, start)?),
            TokenKind::Constructor if self.in_class => {
                if let Some(token) = modifiers.static_token {
                    return Err(Self::error_at(&token, "Constructors cannot be static"));
                }
                Decl::Constructor(self.parse_constructor(modifiers, keyword, start)?)
            }
            TokenKind::Var | TokenKind::Const => {
                Decl::Var(self.parse_variable(modifiers, keyword.kind == TokenKind::Const, start)?)
            }
            _ => return Err(Self::error_at(&keyword, "Expected declaration")),
        };
        Ok(decl)
    }

    /// function = "function" IDENT params ("->" ("void"|type))? ("throws" type ("," type)*)? (block | "=" expr ";")
    fn parse_function(
        &mut self,
        modifiers: Modifiers<'ast>,
        start: water_core::Span,
    ) -> Result<&'ast FunctionDecl<'ast>, ParseError> {
        let name = self.expect_ident("Expected function name")?;
        let params = self.parse_params("function parameters")?;

        let return_type = if self.eat(TokenKind::Arrow).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };

        let mut throws = BumpVec::new_in(self.arena);
        if self.eat(TokenKind::Throws).is_some() {
            loop {
                throws.push(self.parse_type()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        let body = if self.eat(TokenKind::Equal).is_some() {
            let expr = self.parse_expression()?;
            self.expect(TokenKind::Semicolon, "Expected ';' after expression")?;
            FunctionBody::Expr(expr)
        } else {
            self.expect(TokenKind::LeftBrace, "Expected '{' before function body")?;
            FunctionBody::Block(self.parse_block_rest()?)
        };

        Ok(self.arena.alloc(FunctionDecl {
            modifiers,
            name,
            params,
            return_type,
            throws: throws.into_bump_slice(),
            body,
            span: self.span_from(start),
        }))
    }

    /// constructor = "constructor" params (":" args)? block
    fn parse_constructor(
        &mut self,
        modifiers: Modifiers<'ast>,
        keyword: crate::lexer::Token<'ast>,
        start: water_core::Span,
    ) -> Result<&'ast ConstructorDecl<'ast>, ParseError> {
        let params = self.parse_params("constructor parameters")?;

        let super_args = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_args("super constructor arguments")?)
        } else {
            None
        };

        self.expect(TokenKind::LeftBrace, "Expected '{' before constructor body")?;
        let body = self.parse_block_rest()?;

        Ok(self.arena.alloc(ConstructorDecl {
            modifiers,
            keyword,
            params,
            super_args,
            body,
            span: self.span_from(start),
        }))
    }

    /// class = "class" IDENT (":" type)? "{" declaration* "}"
    fn parse_class(
        &mut self,
        modifiers: Modifiers<'ast>,
        start: water_core::Span,
    ) -> Result<&'ast ClassDecl<'ast>, ParseError> {
        let name = self.expect_ident("Expected class name")?;

        let superclass = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect(TokenKind::LeftBrace, "Expected '{' before class body")?;

        let was_in_class = std::mem::replace(&mut self.in_class, true);
        let mut members = BumpVec::new_in(self.arena);
        let result = loop {
            if self.check(TokenKind::RightBrace) || self.is_at_end() {
                break Ok(());
            }
            match self.parse_declaration() {
                Ok(decl) => members.push(decl),
                Err(err) => break Err(err),
            }
        };
        self.in_class = was_in_class;
        result?;

        self.expect(TokenKind::RightBrace, "Expected '}' after class body")?;

        Ok(self.arena.alloc(ClassDecl {
            modifiers,
            name,
            superclass,
            members: members.into_bump_slice(),
            span: self.span_from(start),
        }))
    }

    /// enum = "enum" IDENT "{" (IDENT ("," IDENT)*)? "}"
    fn parse_enum(
        &mut self,
        modifiers: Modifiers<'ast>,
        start: water_core::Span,
    ) -> Result<&'ast EnumDecl<'ast>, ParseError> {
        let name = self.expect_ident("Expected enum name")?;
        self.expect(TokenKind::LeftBrace, "Expected '{' before enum body")?;

        let mut constants = BumpVec::new_in(self.arena);
        if !self.check(TokenKind::RightBrace) {
            loop {
                constants.push(self.expect_ident("Expected enum field name")?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::RightBrace, "Expected '}' after enum body")?;

        Ok(self.arena.alloc(EnumDecl {
            modifiers,
            name,
            constants: constants.into_bump_slice(),
            span: self.span_from(start),
        }))
    }

    /// variable = ("var"|"const") IDENT (":" type ("=" expr)? | "=" expr) ";"
    ///
    /// The `var`/`const` keyword has already been consumed.
    pub(crate) fn parse_variable(
        &mut self,
        modifiers: Modifiers<'ast>,
        is_const: bool,
        start: water_core::Span,
    ) -> Result<&'ast VarDecl<'ast>, ParseError> {
        let name = self.expect_ident("Expected variable name")?;

        let (ty, init) = if self.eat(TokenKind::Colon).is_some() {
            let ty = self.parse_type()?;
            let init = if self.eat(TokenKind::Equal).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            (Some(ty), init)
        } else {
            self.expect(TokenKind::Equal, "Expected '=' after variable name")?;
            (None, Some(self.parse_expression()?))
        };

        self.expect(TokenKind::Semicolon, "Expected ';' after variable assignment")?;

        Ok(self.arena.alloc(VarDecl {
            modifiers,
            is_const,
            name,
            ty,
            init,
            span: self.span_from(start),
        }))
    }

    /// params = "(" (IDENT ":" type ("," IDENT ":" type)*)? ")"
    fn parse_params(&mut self, what: &str) -> Result<&'ast [Param<'ast>], ParseError> {
        self.expect(TokenKind::LeftParen, &format!("Expected '(' before {}", what))?;

        let mut params = BumpVec::new_in(self.arena);
        if !self.check(TokenKind::RightParen) {
            loop {
                let name = self.expect_ident("Expected parameter name")?;
                self.expect(TokenKind::Colon, "Expected ':' between parameter name and type")?;
                let ty = self.parse_type()?;
                params.push(Param { name, ty });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(TokenKind::RightParen, &format!("Expected ')' after {}", what))?;
        Ok(params.into_bump_slice())
    }

    /// Parse the statements of a block after its `{`.
    pub(crate) fn parse_block_rest(&mut self) -> Result<&'ast Block<'ast>, ParseError> {
        let start = self.previous().span;
        let mut stmts = BumpVec::new_in(self.arena);
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }
        self.expect(TokenKind::RightBrace, "Expected '}' after block")?;
        Ok(self.arena.alloc(Block {
            stmts: stmts.into_bump_slice(),
            span: self.span_from(start),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    fn parse<'a>(source: &str, arena: &'a Bump) -> &'a Program<'a> {
        Parser::parse(source, arena).unwrap()
    }

    #[test]
    fn function_with_return_type_and_throws() {
        let arena = Bump::new();
        let program = parse("function f(a: int, b: String?) -> long throws Exception { return 1L; }", &arena);
        let Decl::Function(f) = program.decls[0] else {
            panic!("expected function");
        };
        assert_eq!(f.name.name, "f");
        assert_eq!(f.params.len(), 2);
        assert!(f.params[1].ty.is_nullable());
        assert_eq!(f.return_type.map(|t| t.to_string()), Some("long".to_string()));
        assert_eq!(f.throws.len(), 1);
        assert!(matches!(f.body, FunctionBody::Block(b) if b.stmts.len() == 1));
    }

    #[test]
    fn expression_bodied_function() {
        let arena = Bump::new();
        let program = parse("function square(x: int) = x * x;", &arena);
        let Decl::Function(f) = program.decls[0] else {
            panic!("expected function");
        };
        assert!(f.return_type.is_none());
        assert!(matches!(f.body, FunctionBody::Expr(Expr::Binary(_))));
    }

    #[test]
    fn class_members() {
        let arena = Bump::new();
        let source = r#"
            class Point : Base {
                private var x: int = 0;
                static const ORIGIN = 0;
                constructor(x: int) : (x) { this.x = x; }
                public function getLength() -> double = 1.0;
                private class Inner {}
            }
        "#;
        let program = parse(source, &arena);
        let Decl::Class(class) = program.decls[0] else {
            panic!("expected class");
        };
        assert_eq!(class.name.name, "Point");
        assert!(class.superclass.is_some());
        assert_eq!(class.members.len(), 5);
        let Decl::Var(x) = class.members[0] else { panic!() };
        assert!(x.modifiers.is_private());
        let Decl::Var(origin) = class.members[1] else { panic!() };
        assert!(origin.modifiers.is_static() && origin.is_const);
        let Decl::Constructor(ctor) = class.members[2] else { panic!() };
        assert_eq!(ctor.super_args.map(|a| a.len()), Some(1));
        assert!(matches!(class.members[4], Decl::Class(c) if c.modifiers.is_private()));
    }

    #[test]
    fn enum_constants() {
        let arena = Bump::new();
        let program = parse("enum Color { RED, GREEN, BLUE }", &arena);
        let Decl::Enum(e) = program.decls[0] else { panic!() };
        let names: Vec<_> = e.constants.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["RED", "GREEN", "BLUE"]);
    }

    #[test]
    fn static_only_inside_classes() {
        let arena = Bump::new();
        let err = Parser::parse("static var x = 1;", &arena).unwrap_err();
        assert_eq!(err.message, "Expected declaration");

        let err = Parser::parse("class A { static constructor() {} }", &arena).unwrap_err();
        assert_eq!(err.message, "Constructors cannot be static");
    }

    #[test]
    fn constructor_outside_class_is_rejected() {
        let arena = Bump::new();
        let err = Parser::parse("constructor() {}", &arena).unwrap_err();
        assert_eq!(err.lexeme, "constructor");
    }

    #[test]
    fn variable_requires_type_or_initializer() {
        let arena = Bump::new();
        let program = parse("var a: int; const b = 2; var c: String? = null;", &arena);
        assert_eq!(program.decls.len(), 3);
        let err = Parser::parse("var d;", &arena).unwrap_err();
        assert_eq!(err.message, "Expected '=' after variable name");
    }
}
