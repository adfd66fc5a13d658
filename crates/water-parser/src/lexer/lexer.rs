//! Main lexer implementation for Water.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s,
//! dispatching on the first character of each token. Lexemes are copied
//! into the arena so the source string can be freed after lexing.

use bumpalo::Bump;
use water_core::{LexError, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for Water source code.
///
/// The first malformed token is reported as a [`LexError`]; lexing does
/// not recover.
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    arena: &'ast Bump,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
        }
    }

    /// Lex the whole input, ending with an [`TokenKind::Eof`] token.
    pub fn tokenize(mut self) -> Result<Vec<Token<'ast>>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let eof = token.is_eof();
            tokens.push(token);
            if eof {
                return Ok(tokens);
            }
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Result<Token<'ast>, LexError> {
        self.skip_trivia()?;

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, "", Span::point(start_line, start_col)));
        };

        let kind = match c {
            '"' => self.scan_string(start_line, start_col)?,
            '\'' => self.scan_char(start_line, start_col)?,
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => {
                self.cursor.eat_while(is_ident_continue);
                lookup_keyword(self.cursor.slice_from(start_offset)).unwrap_or(TokenKind::Identifier)
            }
            _ => self.scan_operator(start_line, start_col)?,
        };

        Ok(self.make_token(kind, start_line, start_col, start_offset))
    }

    fn make_token(&self, kind: TokenKind, line: u32, col: u32, start_offset: u32) -> Token<'ast> {
        let text = self.cursor.slice_from(start_offset);
        let span = Span::new(line, col, text.len() as u32);
        Token::new(kind, self.arena.alloc_str(text), span)
    }

    // =========================================
    // Whitespace and comments
    // =========================================

    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            self.cursor.eat_while(|c| c.is_whitespace());

            if self.cursor.check_str("//") {
                self.cursor.eat_while(|c| c != '\n');
            } else if self.cursor.check_str("/*") {
                let span = Span::new(self.cursor.line(), self.cursor.column(), 2);
                self.cursor.advance();
                self.cursor.advance();
                loop {
                    if self.cursor.is_eof() {
                        return Err(LexError::UnterminatedComment { span });
                    }
                    if self.cursor.check_str("*/") {
                        self.cursor.advance();
                        self.cursor.advance();
                        break;
                    }
                    self.cursor.advance();
                }
            } else {
                return Ok(());
            }
        }
    }

    // =========================================
    // Literals
    // =========================================

    /// Scan `[0-9]+(\.[0-9]+)?[fFlL]?`.
    fn scan_number(&mut self) -> TokenKind {
        self.cursor.eat_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        if self.cursor.check(|c| matches!(c, 'f' | 'F' | 'l' | 'L')) {
            self.cursor.advance();
        }

        TokenKind::Number
    }

    fn scan_string(&mut self, line: u32, col: u32) -> Result<TokenKind, LexError> {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.advance() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString {
                        span: Span::new(line, col, 1),
                    });
                }
                Some('"') => return Ok(TokenKind::String),
                Some('\\') => self.scan_escape()?,
                Some(_) => {}
            }
        }
    }

    fn scan_char(&mut self, line: u32, col: u32) -> Result<TokenKind, LexError> {
        let unterminated = LexError::UnterminatedChar {
            span: Span::new(line, col, 1),
        };
        self.cursor.advance(); // opening quote
        match self.cursor.advance() {
            None | Some('\n') | Some('\'') => return Err(unterminated),
            Some('\\') => self.scan_escape()?,
            Some(_) => {}
        }
        if self.cursor.eat('\'') {
            Ok(TokenKind::Char)
        } else {
            Err(unterminated)
        }
    }

    /// Validate the character following a backslash.
    fn scan_escape(&mut self) -> Result<(), LexError> {
        let span = Span::new(self.cursor.line(), self.cursor.column().saturating_sub(1), 2);
        match self.cursor.advance() {
            Some(c) if unescape(c).is_some() => Ok(()),
            Some(c) => Err(LexError::InvalidEscape { ch: c, span }),
            None => Err(LexError::UnterminatedString { span }),
        }
    }

    // =========================================
    // Operators and punctuation
    // =========================================

    fn scan_operator(&mut self, line: u32, col: u32) -> Result<TokenKind, LexError> {
        use TokenKind::*;

        let Some(c) = self.cursor.advance() else {
            return Ok(Eof);
        };

        let kind = match c {
            '{' => LeftBrace,
            '}' => RightBrace,
            '(' => LeftParen,
            ')' => RightParen,
            '[' => LeftBracket,
            ']' => RightBracket,
            ';' => Semicolon,
            ':' => Colon,
            ',' => Comma,
            '.' => Dot,
            '~' => Tilde,
            '+' => {
                if self.cursor.eat('+') {
                    PlusPlus
                } else if self.cursor.eat('=') {
                    PlusEqual
                } else {
                    Plus
                }
            }
            '-' => {
                if self.cursor.eat('-') {
                    MinusMinus
                } else if self.cursor.eat('=') {
                    MinusEqual
                } else if self.cursor.eat('>') {
                    Arrow
                } else {
                    Minus
                }
            }
            '*' => self.with_equal(Star, StarEqual),
            '/' => self.with_equal(Slash, SlashEqual),
            '%' => self.with_equal(Percent, PercentEqual),
            '^' => self.with_equal(Caret, CaretEqual),
            '=' => {
                if self.cursor.eat('=') {
                    self.with_equal(EqualEqual, EqualEqualEqual)
                } else {
                    Equal
                }
            }
            '!' => {
                if self.cursor.eat('=') {
                    self.with_equal(BangEqual, BangEqualEqual)
                } else {
                    Bang
                }
            }
            '<' => {
                if self.cursor.eat('<') {
                    self.with_equal(LessLess, LessLessEqual)
                } else {
                    self.with_equal(Less, LessEqual)
                }
            }
            '>' => {
                if self.cursor.eat('>') {
                    if self.cursor.eat('>') {
                        self.with_equal(GreaterGreaterGreater, GreaterGreaterGreaterEqual)
                    } else {
                        self.with_equal(GreaterGreater, GreaterGreaterEqual)
                    }
                } else {
                    self.with_equal(Greater, GreaterEqual)
                }
            }
            '&' => {
                if self.cursor.eat('&') {
                    AmpAmp
                } else {
                    self.with_equal(Amp, AmpEqual)
                }
            }
            '|' => {
                if self.cursor.eat('|') {
                    PipePipe
                } else {
                    self.with_equal(Pipe, PipeEqual)
                }
            }
            '?' => {
                if self.cursor.eat('.') {
                    QuestionDot
                } else if self.cursor.eat('[') {
                    QuestionBracket
                } else if self.cursor.eat('?') {
                    QuestionQuestion
                } else {
                    Question
                }
            }
            other => {
                return Err(LexError::UnexpectedChar {
                    ch: other,
                    span: Span::new(line, col, other.len_utf8() as u32),
                });
            }
        };

        Ok(kind)
    }

    #[inline]
    fn with_equal(&mut self, plain: TokenKind, with_eq: TokenKind) -> TokenKind {
        if self.cursor.eat('=') { with_eq } else { plain }
    }
}

/// Map the character after a backslash to the character it denotes.
pub fn unescape(c: char) -> Option<char> {
    Some(match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '\\' => '\\',
        '"' => '"',
        '\'' => '\'',
        '0' => '\0',
        'b' => '\u{8}',
        'f' => '\u{c}',
        _ => return None,
    })
}
