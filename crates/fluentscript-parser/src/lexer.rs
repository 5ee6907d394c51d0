//! Incremental lexer for FluentScript.
//!
//! The default scanner is a logos-derived token enum covering identifiers,
//! numbers, strings, and symbols. Around it sits the lexical plugin registry:
//! before a default token is committed, plugins registered for a concrete
//! trigger character get a chance to claim the input, and wildcard plugins get
//! a chance to replace an identifier/number the default scanner just produced
//! (dates, times, versions, e-mail addresses, and so on all start like plain
//! numbers or identifiers).
//!
//! Lexing is incremental (`next_token`) rather than batch: grammar plugins can
//! be registered mid-parse and must observe tokens produced after the
//! registration point.

pub mod plugins;

use crate::token::{Span, Sym, Token, TokenKind, TokenValue};
use logos::Logos;
use plugins::LexicalRegistry;
use thiserror::Error;

/// Lexer errors. Every variant carries a span; lexing never silently skips
/// unrecognized input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at {span}")]
    UnexpectedCharacter { ch: char, span: Span },

    #[error("Unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("Invalid date literal '{text}' at {span}")]
    InvalidDate { text: String, span: Span },

    #[error("Invalid time literal '{text}' at {span}")]
    InvalidTime { text: String, span: Span },

    #[error("Invalid number '{text}' at {span}")]
    InvalidNumber { text: String, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::InvalidDate { span, .. }
            | LexError::InvalidTime { span, .. }
            | LexError::InvalidNumber { span, .. } => *span,
        }
    }
}

/// Logos-based token enum for the default scanner.
///
/// Converted to the public [`Token`] type after scanning. Plugins never see
/// this enum.
#[derive(Logos, Debug, Clone, PartialEq)]
enum RawToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", parse_number)]
    Number(f64),

    #[regex(r#""([^"\\]|\\.)*""#, parse_string)]
    #[regex(r"'([^'\\]|\\.)*'", parse_string)]
    Str(String),

    // Two-character operators must come before single-character ones
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LessEq,
    #[token(">=")]
    GreaterEq,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Assign,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("!")]
    Bang,
}

fn parse_number(lex: &mut logos::Lexer<RawToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_string(lex: &mut logos::Lexer<RawToken>) -> Option<String> {
    let s = lex.slice();
    Some(unescape_string(&s[1..s.len() - 1]))
}

fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('0') => result.push('\0'),
                Some(c) => result.push(c),
                None => break,
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// A consuming view over the remaining source, handed to a lexical plugin's
/// `parse`. Tracks line/column as it advances; the lexer adopts the cursor's
/// final position after a successful plugin parse.
pub struct Scanner<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Scanner<'a> {
    /// Remaining unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Current position as a zero-width span.
    pub fn here(&self) -> Span {
        Span::new(self.pos, self.pos, self.line, self.column)
    }

    /// Consume `n` bytes, returning the consumed slice and its span.
    pub fn take(&mut self, n: usize) -> (&'a str, Span) {
        let start = self.pos;
        let (line, column) = (self.line, self.column);
        let slice = &self.source[start..start + n];
        for c in slice.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.pos += n;
        (slice, Span::new(start, self.pos, line, column))
    }
}

/// The incremental lexer.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    registry: LexicalRegistry,
    pending: Vec<Token>,
}

impl<'a> Lexer<'a> {
    /// Lexer with the standard plugin set registered.
    pub fn new(source: &'a str) -> Self {
        Self::with_registry(source, LexicalRegistry::standard())
    }

    pub fn with_registry(source: &'a str, registry: LexicalRegistry) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            registry,
            pending: Vec::new(),
        }
    }

    pub fn registry_mut(&mut self) -> &mut LexicalRegistry {
        &mut self.registry
    }

    /// Produce the next token. Returns Eof tokens forever once exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            if !self.pending.is_empty() {
                return Ok(self.pending.remove(0));
            }

            self.skip_whitespace();
            if self.pos >= self.source.len() {
                return Ok(Token::eof(Span::new(
                    self.source.len(),
                    self.source.len(),
                    self.line,
                    self.column,
                )));
            }

            let rest = self.rest();
            let trigger = rest.chars().next().unwrap_or('\0');

            // Tier 1: plugins registered for this concrete trigger character,
            // in registration order.
            let mut claimed = false;
            for plugin in self.registry.for_trigger(trigger) {
                if plugin.can_handle(None, rest) {
                    let mut scanner = self.scanner();
                    let tokens = plugin.parse(&mut scanner)?;
                    self.adopt(&scanner);
                    self.pending.extend(tokens);
                    claimed = true;
                    break;
                }
            }
            if claimed {
                // A plugin may legitimately emit nothing (it only consumed
                // input); loop to produce the next token either way.
                continue;
            }

            // Default scan. The candidate is not committed yet: wildcard
            // plugins may still replace identifier/number-shaped input.
            let candidate = self.scan_default()?;

            if matches!(candidate.kind, TokenKind::Identifier | TokenKind::Number) {
                let mut replaced = false;
                for plugin in self.registry.wildcard() {
                    if plugin.can_handle(Some(&candidate), rest) {
                        let mut scanner = self.scanner();
                        let tokens = plugin.parse(&mut scanner)?;
                        self.adopt(&scanner);
                        self.pending.extend(tokens);
                        replaced = true;
                        break;
                    }
                }
                if replaced {
                    continue;
                }
            }

            self.commit(&candidate);
            return Ok(candidate);
        }
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn scanner(&self) -> Scanner<'a> {
        Scanner {
            source: self.source,
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn adopt(&mut self, scanner: &Scanner<'a>) {
        self.pos = scanner.pos;
        self.line = scanner.line;
        self.column = scanner.column;
    }

    fn commit(&mut self, token: &Token) {
        let mut scanner = self.scanner();
        scanner.take(token.span.end - self.pos);
        self.adopt(&scanner);
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.source[self.pos..];
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        let n = rest.len() - trimmed.len();
        if n > 0 {
            let mut scanner = self.scanner();
            scanner.take(n);
            self.adopt(&scanner);
        }
    }

    /// Run the default scanner on the remaining input without committing the
    /// lexer position. The returned token's span is absolute.
    fn scan_default(&self) -> Result<Token, LexError> {
        let rest = &self.source[self.pos..];
        let mut raw = RawToken::lexer(rest);

        let here = Span::new(self.pos, self.pos, self.line, self.column);
        let next = match raw.next() {
            Some(r) => r,
            None => return Ok(Token::eof(here)),
        };
        let range = raw.span();
        // Whitespace was stripped before scanning, so the raw token starts at
        // the current position.
        debug_assert_eq!(range.start, 0);
        let span = Span::new(self.pos, self.pos + range.end, self.line, self.column);
        let text = &rest[range.clone()];

        let raw = match next {
            Ok(raw) => raw,
            Err(_) => {
                let ch = rest.chars().next().unwrap_or('\0');
                if ch == '"' || ch == '\'' {
                    return Err(LexError::UnterminatedString { span: here });
                }
                return Err(LexError::UnexpectedCharacter { ch, span: here });
            }
        };

        let token = match raw {
            RawToken::Identifier(name) => {
                Token::new(TokenKind::Identifier, TokenValue::Str(name), text, span)
            }
            RawToken::Number(n) => Token::new(TokenKind::Number, TokenValue::Number(n), text, span),
            RawToken::Str(s) => Token::new(TokenKind::Str, TokenValue::Str(s), text, span),
            RawToken::EqEq => self.symbol(Sym::EqEq, text, span),
            RawToken::NotEq => self.symbol(Sym::NotEq, text, span),
            RawToken::LessEq => self.symbol(Sym::LessEq, text, span),
            RawToken::GreaterEq => self.symbol(Sym::GreaterEq, text, span),
            RawToken::AndAnd => self.symbol(Sym::AndAnd, text, span),
            RawToken::OrOr => self.symbol(Sym::OrOr, text, span),
            RawToken::LeftParen => self.symbol(Sym::LeftParen, text, span),
            RawToken::RightParen => self.symbol(Sym::RightParen, text, span),
            RawToken::LeftBrace => self.symbol(Sym::LeftBrace, text, span),
            RawToken::RightBrace => self.symbol(Sym::RightBrace, text, span),
            RawToken::LeftBracket => self.symbol(Sym::LeftBracket, text, span),
            RawToken::RightBracket => self.symbol(Sym::RightBracket, text, span),
            RawToken::Comma => self.symbol(Sym::Comma, text, span),
            RawToken::Semicolon => self.symbol(Sym::Semicolon, text, span),
            RawToken::Colon => self.symbol(Sym::Colon, text, span),
            RawToken::Dot => self.symbol(Sym::Dot, text, span),
            RawToken::Plus => self.symbol(Sym::Plus, text, span),
            RawToken::Minus => self.symbol(Sym::Minus, text, span),
            RawToken::Star => self.symbol(Sym::Star, text, span),
            RawToken::Slash => self.symbol(Sym::Slash, text, span),
            RawToken::Percent => self.symbol(Sym::Percent, text, span),
            RawToken::Assign => self.symbol(Sym::Assign, text, span),
            RawToken::Less => self.symbol(Sym::Less, text, span),
            RawToken::Greater => self.symbol(Sym::Greater, text, span),
            RawToken::Bang => self.symbol(Sym::Bang, text, span),
            RawToken::Whitespace => unreachable!("whitespace is skipped"),
        };
        Ok(token)
    }

    fn symbol(&self, sym: Sym, text: &str, span: Span) -> Token {
        Token::new(TokenKind::Symbol(sym), TokenValue::None, text, span)
    }
}
