//! Operator definitions for Water expressions.
//!
//! Provides enums for binary, unary, postfix and assignment operators along
//! with the binding powers used by the Pratt parser.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators, organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `??`
    NullCoalesce,

    /// `||`
    LogicalOr,

    /// `&&`
    LogicalAnd,

    /// `|`
    BitwiseOr,

    /// `^`
    BitwiseXor,

    /// `&`
    BitwiseAnd,

    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `===`
    RefEqual,
    /// `!==`
    RefNotEqual,

    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `>>>`
    ShiftRightUnsigned,

    Add,
    Sub,

    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Binding power `(left_bp, right_bp)`; every binary operator is
    /// left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            NullCoalesce => (3, 4),
            LogicalOr => (5, 6),
            LogicalAnd => (7, 8),
            BitwiseOr => (9, 10),
            BitwiseXor => (11, 12),
            BitwiseAnd => (13, 14),
            Equal | NotEqual | RefEqual | RefNotEqual => (15, 16),
            Less | LessEqual | Greater | GreaterEqual => (17, 18),
            ShiftLeft | ShiftRight | ShiftRightUnsigned => (19, 20),
            Add | Sub => (21, 22),
            Mul | Div | Mod => (23, 24),
        }
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            QuestionQuestion => BinaryOp::NullCoalesce,
            PipePipe => BinaryOp::LogicalOr,
            AmpAmp => BinaryOp::LogicalAnd,
            Pipe => BinaryOp::BitwiseOr,
            Caret => BinaryOp::BitwiseXor,
            Amp => BinaryOp::BitwiseAnd,
            EqualEqual => BinaryOp::Equal,
            BangEqual => BinaryOp::NotEqual,
            EqualEqualEqual => BinaryOp::RefEqual,
            BangEqualEqual => BinaryOp::RefNotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            LessLess => BinaryOp::ShiftLeft,
            GreaterGreater => BinaryOp::ShiftRight,
            GreaterGreaterGreater => BinaryOp::ShiftRightUnsigned,
            Plus => BinaryOp::Add,
            Minus => BinaryOp::Sub,
            Star => BinaryOp::Mul,
            Slash => BinaryOp::Div,
            Percent => BinaryOp::Mod,
            _ => return None,
        })
    }

    /// `+ - * / %`
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod)
    }

    /// `& | ^ << >> >>>`
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            BinaryOp::BitwiseAnd
                | BinaryOp::BitwiseOr
                | BinaryOp::BitwiseXor
                | BinaryOp::ShiftLeft
                | BinaryOp::ShiftRight
                | BinaryOp::ShiftRightUnsigned
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal | BinaryOp::NotEqual | BinaryOp::RefEqual | BinaryOp::RefNotEqual
        )
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::LogicalAnd | BinaryOp::LogicalOr)
    }

    pub fn as_str(&self) -> &'static str {
        use BinaryOp::*;
        match self {
            NullCoalesce => "??",
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitwiseOr => "|",
            BitwiseXor => "^",
            BitwiseAnd => "&",
            Equal => "==",
            NotEqual => "!=",
            RefEqual => "===",
            RefNotEqual => "!==",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            ShiftLeft => "<<",
            ShiftRight => ">>",
            ShiftRightUnsigned => ">>>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binding power of the `as` cast operator.
pub const CAST_BP: u8 = 25;

/// Binding power of `instanceof`, shared with the relational operators.
pub const INSTANCEOF_BP: u8 = 17;

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    LogicalNot,
    /// `~`
    BitwiseNot,
    /// `++`
    PreInc,
    /// `--`
    PreDec,
}

impl UnaryOp {
    pub fn binding_power() -> u8 {
        27
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        Some(match token {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::LogicalNot,
            TokenKind::Tilde => UnaryOp::BitwiseNot,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::LogicalNot => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::PreInc => "++",
            UnaryOp::PreDec => "--",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postfix update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostfixOp {
    /// `++`
    PostInc,
    /// `--`
    PostDec,
}

impl PostfixOp {
    pub fn binding_power() -> u8 {
        29
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::PlusPlus => Some(PostfixOp::PostInc),
            TokenKind::MinusMinus => Some(PostfixOp::PostDec),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostfixOp::PostInc => "++",
            PostfixOp::PostDec => "--",
        }
    }
}

impl fmt::Display for PostfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment operators. Compound forms apply their binary operator
/// to the current value first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    AndAssign,
    OrAssign,
    XorAssign,
}

impl AssignOp {
    /// Right-associative: `(left_bp, right_bp)` with `right_bp < left_bp`.
    pub fn binding_power() -> (u8, u8) {
        (2, 1)
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use TokenKind::*;
        Some(match token {
            Equal => AssignOp::Assign,
            PlusEqual => AssignOp::AddAssign,
            MinusEqual => AssignOp::SubAssign,
            StarEqual => AssignOp::MulAssign,
            SlashEqual => AssignOp::DivAssign,
            PercentEqual => AssignOp::ModAssign,
            LessLessEqual => AssignOp::ShlAssign,
            GreaterGreaterEqual => AssignOp::ShrAssign,
            GreaterGreaterGreaterEqual => AssignOp::UShrAssign,
            AmpEqual => AssignOp::AndAssign,
            PipeEqual => AssignOp::OrAssign,
            CaretEqual => AssignOp::XorAssign,
            _ => return None,
        })
    }

    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        use AssignOp::*;
        Some(match self {
            Assign => return None,
            AddAssign => BinaryOp::Add,
            SubAssign => BinaryOp::Sub,
            MulAssign => BinaryOp::Mul,
            DivAssign => BinaryOp::Div,
            ModAssign => BinaryOp::Mod,
            ShlAssign => BinaryOp::ShiftLeft,
            ShrAssign => BinaryOp::ShiftRight,
            UShrAssign => BinaryOp::ShiftRightUnsigned,
            AndAssign => BinaryOp::BitwiseAnd,
            OrAssign => BinaryOp::BitwiseOr,
            XorAssign => BinaryOp::BitwiseXor,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self.binary_op() {
            None => "=",
            Some(BinaryOp::Add) => "+=",
            Some(BinaryOp::Sub) => "-=",
            Some(BinaryOp::Mul) => "*=",
            Some(BinaryOp::Div) => "/=",
            Some(BinaryOp::Mod) => "%=",
            Some(BinaryOp::ShiftLeft) => "<<=",
            Some(BinaryOp::ShiftRight) => ">>=",
            Some(BinaryOp::ShiftRightUnsigned) => ">>>=",
            Some(BinaryOp::BitwiseAnd) => "&=",
            Some(BinaryOp::BitwiseOr) => "|=",
            Some(BinaryOp::BitwiseXor) => "^=",
            Some(_) => "=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_ordering() {
        let (or_bp, _) = BinaryOp::LogicalOr.binding_power();
        let (and_bp, _) = BinaryOp::LogicalAnd.binding_power();
        let (add_bp, _) = BinaryOp::Add.binding_power();
        let (mul_bp, _) = BinaryOp::Mul.binding_power();
        let (coalesce_bp, _) = BinaryOp::NullCoalesce.binding_power();
        assert!(coalesce_bp < or_bp);
        assert!(or_bp < and_bp);
        assert!(add_bp < mul_bp);
        assert!(mul_bp < CAST_BP);
        assert!(CAST_BP < UnaryOp::binding_power());
        assert!(UnaryOp::binding_power() < PostfixOp::binding_power());
    }

    #[test]
    fn compound_assignment_maps_to_binary() {
        assert_eq!(AssignOp::AddAssign.binary_op(), Some(BinaryOp::Add));
        assert_eq!(AssignOp::UShrAssign.binary_op(), Some(BinaryOp::ShiftRightUnsigned));
        assert_eq!(AssignOp::Assign.binary_op(), None);
        assert_eq!(AssignOp::ShlAssign.to_string(), "<<=");
    }

    #[test]
    fn token_mapping() {
        assert_eq!(BinaryOp::from_token(TokenKind::QuestionQuestion), Some(BinaryOp::NullCoalesce));
        assert_eq!(BinaryOp::from_token(TokenKind::EqualEqualEqual), Some(BinaryOp::RefEqual));
        assert_eq!(BinaryOp::from_token(TokenKind::Equal), None);
        assert_eq!(UnaryOp::from_token(TokenKind::Tilde), Some(UnaryOp::BitwiseNot));
        assert_eq!(AssignOp::from_token(TokenKind::CaretEqual), Some(AssignOp::XorAssign));
    }
}
