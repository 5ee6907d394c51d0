//! Token stream with bounded lookahead over the incremental lexer.
//!
//! Comment tokens are produced by the comment plugin but filtered here; the
//! grammar never sees them. Everything else, annotations included, flows
//! through to the parser.

use crate::lexer::{LexError, Lexer};
use crate::token::{Token, TokenKind};
use std::collections::VecDeque;

pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    buffer: VecDeque<Token>,
}

impl<'a> TokenStream<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self { lexer, buffer: VecDeque::new() }
    }

    /// Access to the lexer, for registering lexical plugins mid-parse.
    /// Already-buffered lookahead tokens are unaffected.
    pub fn lexer_mut(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    /// Peek `n` tokens ahead (0 = the current token) without consuming.
    pub fn peek(&mut self, n: usize) -> Result<&Token, LexError> {
        while self.buffer.len() <= n {
            let token = self.lexer.next_token()?;
            if token.kind == TokenKind::Comment {
                continue;
            }
            let at_eof = token.is_eof();
            self.buffer.push_back(token);
            if at_eof && self.buffer.len() <= n {
                // The lexer repeats Eof forever; avoid spinning on long peeks.
                let eof = self.buffer.back().expect("just pushed").clone();
                while self.buffer.len() <= n {
                    self.buffer.push_back(eof.clone());
                }
            }
        }
        Ok(&self.buffer[n])
    }

    /// Consume and return the current token.
    pub fn next(&mut self) -> Result<Token, LexError> {
        self.peek(0)?;
        Ok(self.buffer.pop_front().expect("peek filled the buffer"))
    }
}
