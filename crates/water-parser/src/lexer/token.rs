//! Token types and definitions for the Water lexer.

use std::fmt;
use water_core::Span;

/// A token from the source code.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is allocated.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token (allocated in arena).
    pub lexeme: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All possible token types in Water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Numeric literal: `42`, `3.14`, `2f`, `10L`
    Number,
    /// String literal: `"hello"`
    String,
    /// Character literal: `'a'`
    Char,

    /// User-defined identifier
    Identifier,

    // =========================================
    // Keywords - Types
    // =========================================
    Void,
    Int,
    Double,
    Boolean,
    CharKw,
    Float,
    Long,
    Byte,
    Short,

    // =========================================
    // Keywords - Values
    // =========================================
    True,
    False,
    Null,
    This,
    Super,

    // =========================================
    // Keywords - Declarations & modifiers
    // =========================================
    Import,
    Package,
    Function,
    Var,
    Const,
    Class,
    Enum,
    Constructor,
    Public,
    Private,
    Static,
    Throws,

    // =========================================
    // Keywords - Control flow & operators
    // =========================================
    If,
    Else,
    For,
    While,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    New,
    As,
    InstanceOf,

    // =========================================
    // Punctuation
    // =========================================
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Colon,
    Comma,
    Dot,
    /// `->`
    Arrow,

    // =========================================
    // Operators
    // =========================================
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    Bang,
    Less,
    Greater,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Question,
    /// `==`
    EqualEqual,
    /// `===`
    EqualEqualEqual,
    /// `!=`
    BangEqual,
    /// `!==`
    BangEqualEqual,
    LessEqual,
    GreaterEqual,
    AmpAmp,
    PipePipe,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,
    /// `?.`
    QuestionDot,
    /// `?[`
    QuestionBracket,
    /// `??`
    QuestionQuestion,
    PlusPlus,
    MinusMinus,

    // =========================================
    // Compound assignment
    // =========================================
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    GreaterGreaterGreaterEqual,
    AmpEqual,
    PipeEqual,
    CaretEqual,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Whether the token names a primitive type (including `void`).
    pub fn is_primitive_type(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Void | Int | Double | Boolean | CharKw | Float | Long | Byte | Short
        )
    }

    pub fn is_keyword(self) -> bool {
        lookup_keyword_kind(self).is_some()
    }
}

/// Keyword table, shared by lookup in both directions.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("void", TokenKind::Void),
    ("int", TokenKind::Int),
    ("double", TokenKind::Double),
    ("boolean", TokenKind::Boolean),
    ("char", TokenKind::CharKw),
    ("float", TokenKind::Float),
    ("long", TokenKind::Long),
    ("byte", TokenKind::Byte),
    ("short", TokenKind::Short),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("null", TokenKind::Null),
    ("this", TokenKind::This),
    ("super", TokenKind::Super),
    ("import", TokenKind::Import),
    ("package", TokenKind::Package),
    ("function", TokenKind::Function),
    ("var", TokenKind::Var),
    ("const", TokenKind::Const),
    ("class", TokenKind::Class),
    ("enum", TokenKind::Enum),
    ("constructor", TokenKind::Constructor),
    ("public", TokenKind::Public),
    ("private", TokenKind::Private),
    ("static", TokenKind::Static),
    ("throws", TokenKind::Throws),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("for", TokenKind::For),
    ("while", TokenKind::While),
    ("return", TokenKind::Return),
    ("throw", TokenKind::Throw),
    ("try", TokenKind::Try),
    ("catch", TokenKind::Catch),
    ("finally", TokenKind::Finally),
    ("new", TokenKind::New),
    ("as", TokenKind::As),
    ("instanceof", TokenKind::InstanceOf),
];

/// Look up a keyword by its source text.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(text, _)| *text == ident)
        .map(|(_, kind)| *kind)
}

fn lookup_keyword_kind(kind: TokenKind) -> Option<&'static str> {
    KEYWORDS
        .iter()
        .find(|(_, k)| *k == kind)
        .map(|(text, _)| *text)
}
