//! Recursive-descent parser driven by the grammar plugin registry.
//!
//! At statement position the parser gathers candidate plugins for the current
//! token, probes them (precedence order, registration-order tiebreak), and
//! hands control to the winner's `parse_stmt`. If no plugin claims the token,
//! parsing falls through to the default grammar (assignment / expression
//! statement); if that fails too, a syntax error with an expected-token hint
//! is raised. There is no backtracking across a committed plugin parse —
//! ambiguity is settled entirely by `can_handle` lookahead.

pub mod expr;
pub mod fluent;
pub mod guards;
pub mod registry;
pub mod scripted;
pub mod stmt;

use crate::ast::{Script, Statement};
use crate::lexer::{LexError, Lexer};
use crate::stream::TokenStream;
use crate::token::{Span, Sym, Token, TokenKind};
use registry::{GrammarPosition, GrammarRegistry};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Parser errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("Unexpected {found} at {span}, expected {expected}")]
    UnexpectedToken { expected: String, found: String, span: Span },

    #[error("Unexpected end of input at {span}, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("{message} at {span}")]
    Invalid { message: String, span: Span },

    #[error("Positional argument after named argument at {span}")]
    PositionalAfterNamed { span: Span },

    #[error("Parser limit exceeded: {message} at {span}")]
    LimitExceeded { message: String, span: Span },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::UnexpectedToken { span, .. }
            | SyntaxError::UnexpectedEof { span, .. }
            | SyntaxError::Invalid { span, .. }
            | SyntaxError::PositionalAfterNamed { span }
            | SyntaxError::LimitExceeded { span, .. } => *span,
            SyntaxError::Lex(e) => e.span(),
        }
    }
}

/// Name tables the parser consults while parsing: declared script functions,
/// wildcard-name prefixes, host-registered functions and unit names. The
/// embedding host seeds this from its registries; `func` declarations extend
/// it as they are parsed.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    pub functions: FxHashSet<String>,
    pub wildcard_functions: Vec<String>,
    pub external_functions: FxHashSet<String>,
    pub unit_names: FxHashSet<String>,
}

impl ParseContext {
    pub fn declare_function(&mut self, name: &str, wildcard: bool) {
        if wildcard {
            self.wildcard_functions.push(name.to_string());
        } else {
            self.functions.insert(name.to_string());
        }
    }

    /// True if `name` (spaced or underscored) denotes a known callable.
    pub fn is_function(&self, name: &str) -> bool {
        self.functions.contains(name) || self.external_functions.contains(name)
    }
}

pub struct Parser<'a> {
    stream: TokenStream<'a>,
    registry: GrammarRegistry,
    pub ctx: ParseContext,
    pub depth: usize,
    /// Counter for generated scripted-plugin callback names.
    pub(crate) plugin_serial: u32,
}

impl<'a> Parser<'a> {
    /// Parser with the standard lexical plugins and builtin grammar plugins.
    pub fn new(source: &'a str) -> Self {
        Self::with_context(source, ParseContext::default())
    }

    pub fn with_context(source: &'a str, ctx: ParseContext) -> Self {
        let stream = TokenStream::new(Lexer::new(source));
        let mut registry = GrammarRegistry::empty();
        stmt::register_builtin_plugins(&mut registry);
        expr::register_builtin_suffix_plugins(&mut registry);
        Self { stream, registry, ctx, depth: 0, plugin_serial: 0 }
    }

    pub fn registry_mut(&mut self) -> &mut GrammarRegistry {
        &mut self.registry
    }

    pub(crate) fn stream_mut(&mut self) -> &mut TokenStream<'a> {
        &mut self.stream
    }

    /// Parse a whole script.
    pub fn parse(mut self) -> Result<Script, SyntaxError> {
        let start = self.current()?.span;
        let mut statements = Vec::new();
        let mut guard = guards::LoopGuard::new("script");
        loop {
            guard.check(self.current()?.span)?;
            self.skip_annotations()?;
            if self.current()?.is_eof() {
                break;
            }
            statements.push(self.parse_statement()?);
        }
        let end = self.current()?.span;
        Ok(Script { statements, span: start.merge(&end) })
    }

    /// Parse one statement: plugin dispatch first, then the default grammar.
    pub fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        self.depth += 1;
        if self.depth > guards::MAX_PARSE_DEPTH {
            self.depth -= 1;
            return Err(SyntaxError::LimitExceeded {
                message: format!("maximum nesting depth ({}) exceeded", guards::MAX_PARSE_DEPTH),
                span: self.current()?.span,
            });
        }
        let result = self.parse_statement_inner();
        self.depth -= 1;
        result
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, SyntaxError> {
        self.skip_annotations()?;
        let token = self.current()?;

        if let Some(plugin) = self.select_plugin(&token, GrammarPosition::Statement)? {
            let statement = plugin.parse_stmt(self)?;
            if plugin.meta().requires_terminator {
                self.expect_terminator()?;
            } else {
                self.eat_sym(Sym::Semicolon)?;
            }
            return Ok(statement);
        }

        // Default grammar: assignment or expression statement.
        let statement = stmt::parse_default_statement(self)?;
        self.eat_sym(Sym::Semicolon)?;
        Ok(statement)
    }

    /// Gather candidates for `token` and pick the first claimant.
    ///
    /// Auto-matched plugins win as soon as the trigger selects them; other
    /// candidates are probed via `can_handle`, which must not consume input.
    pub(crate) fn select_plugin(
        &mut self,
        token: &Token,
        position: GrammarPosition,
    ) -> Result<Option<std::rc::Rc<dyn registry::GrammarPlugin>>, SyntaxError> {
        let candidates = self.registry.candidates(token, position);
        for candidate in candidates {
            if candidate.meta().auto_match || candidate.can_handle(self, token) {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    /// The driver owns statement terminators: a `;` is consumed, `}` or end
    /// of input satisfy the requirement, anything else is an error.
    fn expect_terminator(&mut self) -> Result<(), SyntaxError> {
        let token = self.current()?;
        if token.is_symbol(Sym::Semicolon) {
            self.advance()?;
            Ok(())
        } else if token.is_symbol(Sym::RightBrace) || token.is_eof() {
            Ok(())
        } else {
            Err(self.unexpected(&token, "';'"))
        }
    }

    fn skip_annotations(&mut self) -> Result<(), SyntaxError> {
        while self.current()?.kind == TokenKind::Annotation {
            self.advance()?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    pub fn current(&mut self) -> Result<Token, SyntaxError> {
        Ok(self.stream.peek(0)?.clone())
    }

    pub fn peek(&mut self, n: usize) -> Result<Token, SyntaxError> {
        Ok(self.stream.peek(n)?.clone())
    }

    pub fn advance(&mut self) -> Result<Token, SyntaxError> {
        Ok(self.stream.next()?)
    }

    /// Consume the current token if it is `sym`.
    pub fn eat_sym(&mut self, sym: Sym) -> Result<bool, SyntaxError> {
        if self.current()?.is_symbol(sym) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consume the current token if it is the identifier `word`.
    pub fn eat_word(&mut self, word: &str) -> Result<bool, SyntaxError> {
        if self.current()?.is_word(word) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn expect_sym(&mut self, sym: Sym) -> Result<Token, SyntaxError> {
        let token = self.current()?;
        if token.is_symbol(sym) {
            self.advance()
        } else {
            Err(self.unexpected(&token, &format!("'{}'", sym)))
        }
    }

    pub fn expect_word(&mut self, word: &str) -> Result<Token, SyntaxError> {
        let token = self.current()?;
        if token.is_word(word) {
            self.advance()
        } else {
            Err(self.unexpected(&token, &format!("'{}'", word)))
        }
    }

    pub fn expect_identifier(&mut self) -> Result<(String, Span), SyntaxError> {
        let token = self.current()?;
        match token.ident() {
            Some(name) => {
                let name = name.to_string();
                let span = token.span;
                self.advance()?;
                Ok((name, span))
            }
            None => Err(self.unexpected(&token, "identifier")),
        }
    }

    pub fn unexpected(&self, token: &Token, expected: &str) -> SyntaxError {
        if token.is_eof() {
            SyntaxError::UnexpectedEof { expected: expected.to_string(), span: token.span }
        } else {
            SyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.to_string(),
                span: token.span,
            }
        }
    }
}
