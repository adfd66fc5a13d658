//! Literal expression compilation.

use water_parser::ast::{Expr, LiteralExpr, LiteralKind};
use water_parser::Token;

use super::{ExprCompiler, Result};
use crate::error::semantic;
use crate::fold::Constant;
use crate::types::WaterType;

/// Compile a literal that did not fold, which leaves `null`.
pub fn compile_literal(compiler: &mut ExprCompiler<'_>, lit: &LiteralExpr<'_>) -> Result<WaterType> {
    match literal_constant(lit)? {
        Some(constant) => {
            constant.emit(compiler.code());
            Ok(constant.ty())
        }
        None => {
            compiler.code().push_null();
            Ok(WaterType::NULL)
        }
    }
}

/// Value of a literal; `None` for `null`.
pub fn literal_constant(lit: &LiteralExpr<'_>) -> Result<Option<Constant>> {
    let constant = match lit.kind {
        LiteralKind::Number(text) => parse_number(text, &lit.token)?,
        LiteralKind::String(text) => Constant::Str(text.to_string()),
        LiteralKind::Char(c) => {
            let unit = u16::try_from(c as u32).map_err(|_| {
                semantic(&lit.token, format!("Character '{}' does not fit in a char", c))
            })?;
            Constant::Char(unit)
        }
        LiteralKind::Bool(value) => Constant::Bool(value),
        LiteralKind::Null => return Ok(None),
    };
    Ok(Some(constant))
}

/// `-2147483648` and `-9223372036854775808L`, whose magnitude alone does
/// not fit the type.
pub fn negated_minimum(operand: &Expr<'_>) -> Option<Constant> {
    let Expr::Literal(LiteralExpr {
        kind: LiteralKind::Number(text),
        ..
    }) = operand
    else {
        return None;
    };
    match *text {
        "2147483648" => Some(Constant::Int(i32::MIN)),
        "9223372036854775808L" | "9223372036854775808l" => Some(Constant::Long(i64::MIN)),
        _ => None,
    }
}

/// Type a number literal by its suffix: `L` long, `f` float, a decimal
/// point double, otherwise int.
fn parse_number(text: &str, token: &Token<'_>) -> Result<Constant> {
    let out_of_range = || {
        semantic(token, format!("Number literal '{}' is out of range", text))
    };
    if let Some(digits) = text.strip_suffix(['l', 'L']) {
        return digits.parse::<i64>().map(Constant::Long).map_err(|_| out_of_range());
    }
    if let Some(digits) = text.strip_suffix(['f', 'F']) {
        return digits.parse::<f32>().map(Constant::Float).map_err(|_| out_of_range());
    }
    if text.contains('.') {
        return text.parse::<f64>().map(Constant::Double).map_err(|_| out_of_range());
    }
    text.parse::<i32>().map(Constant::Int).map_err(|_| out_of_range())
}

#[cfg(test)]
mod tests {
    use super::*;
    use water_core::Span;
    use water_parser::TokenKind;

    fn number(text: &str) -> Result<Constant> {
        parse_number(text, &Token::new(TokenKind::Number, text, Span::new(1, 1, text.len() as u32)))
    }

    #[test]
    fn suffixes_pick_the_type() {
        assert_eq!(number("12").unwrap(), Constant::Int(12));
        assert_eq!(number("4L").unwrap(), Constant::Long(4));
        assert_eq!(number("3f").unwrap(), Constant::Float(3.0));
        assert_eq!(number("2.5").unwrap(), Constant::Double(2.5));
        assert_eq!(number("2.5F").unwrap(), Constant::Float(2.5));
    }

    #[test]
    fn magnitudes_beyond_the_type_are_rejected() {
        assert!(number("2147483647").is_ok());
        let err = number("2147483648").unwrap_err();
        assert_eq!(err.to_string(), "Number literal '2147483648' is out of range");
        assert!(number("9223372036854775808L").is_err());
        assert!(number("1.5L").is_err());
    }
}
