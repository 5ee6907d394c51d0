//! Token definitions for the FluentScript language.
//!
//! Tokens are immutable descriptors produced by the lexer or by a lexical
//! plugin: a kind, an optional literal payload, the source text, and a span.
//! FluentScript has no reserved keywords at the token level; statement words
//! like `if` or `func` are plain identifiers that grammar plugins claim as
//! start tokens.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::fmt;

/// Source location of a token or AST node.
///
/// `start`/`end` are byte offsets into the source; `line` and `column` are
/// 1-based and refer to the first character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self { start, end, line, column }
    }

    /// A span covering both inputs, keeping the first one's position.
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Punctuation and operator symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sym {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    Bang,
}

impl Sym {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sym::LeftParen => "(",
            Sym::RightParen => ")",
            Sym::LeftBrace => "{",
            Sym::RightBrace => "}",
            Sym::LeftBracket => "[",
            Sym::RightBracket => "]",
            Sym::Comma => ",",
            Sym::Semicolon => ";",
            Sym::Colon => ":",
            Sym::Dot => ".",
            Sym::Plus => "+",
            Sym::Minus => "-",
            Sym::Star => "*",
            Sym::Slash => "/",
            Sym::Percent => "%",
            Sym::Assign => "=",
            Sym::EqEq => "==",
            Sym::NotEq => "!=",
            Sym::Less => "<",
            Sym::LessEq => "<=",
            Sym::Greater => ">",
            Sym::GreaterEq => ">=",
            Sym::AndAnd => "&&",
            Sym::OrOr => "||",
            Sym::Bang => "!",
        }
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    Identifier,
    Number,
    Str,
    Date,
    Time,
    Symbol(Sym),
    Comment,
    Annotation,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => f.write_str("identifier"),
            TokenKind::Number => f.write_str("number"),
            TokenKind::Str => f.write_str("string"),
            TokenKind::Date => f.write_str("date"),
            TokenKind::Time => f.write_str("time"),
            TokenKind::Symbol(s) => write!(f, "'{}'", s),
            TokenKind::Comment => f.write_str("comment"),
            TokenKind::Annotation => f.write_str("annotation"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

/// Literal payload carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Number(f64),
    Str(String),
    Date(NaiveDate),
    Time(NaiveTime),
}

/// A single token. Immutable after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: TokenValue, text: impl Into<String>, span: Span) -> Self {
        Self { kind, value, text: text.into(), span }
    }

    pub fn eof(span: Span) -> Self {
        Self { kind: TokenKind::Eof, value: TokenValue::None, text: String::new(), span }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Identifier text, if this token is an identifier.
    pub fn ident(&self) -> Option<&str> {
        if self.kind == TokenKind::Identifier {
            Some(&self.text)
        } else {
            None
        }
    }

    /// True if this token is the identifier `word`.
    pub fn is_word(&self, word: &str) -> bool {
        self.ident() == Some(word)
    }

    pub fn is_symbol(&self, sym: Sym) -> bool {
        self.kind == TokenKind::Symbol(sym)
    }

    /// Numeric payload, if any.
    pub fn number(&self) -> Option<f64> {
        match self.value {
            TokenValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            f.write_str("end of input")
        } else {
            write!(f, "'{}'", self.text)
        }
    }
}
