//! Grammar plugin registry.
//!
//! Grammar extensions declare the start tokens they claim, a precedence, and
//! flags. The parser indexes plugins by start token; when a token has several
//! candidates they are probed through `can_handle` in descending precedence
//! order, ties broken by registration order. A plugin flagged auto-match skips
//! the probe entirely.
//!
//! The registry is runtime-mutable: the `plugin` meta-construct appends new
//! descriptors while parsing is underway, and those descriptors are live for
//! every statement parsed afterwards in the same unit.

use super::{Parser, SyntaxError};
use crate::ast::{Expression, Statement};
use crate::token::{Sym, Token, TokenKind};
use rustc_hash::FxHashMap;
use std::rc::Rc;

/// A start token a grammar plugin registers for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StartToken {
    /// A specific identifier word (`if`, `aggregate`, ...).
    Word(String),
    /// A specific symbol token.
    Symbol(Sym),
    /// Probe on any identifier.
    AnyIdentifier,
    /// Probe in suffix position, after a parsed operand (units, percent).
    AnySuffix,
}

/// Where the parser is asking for candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarPosition {
    Statement,
    Expression,
    Suffix,
}

/// Static metadata for a registered grammar plugin.
#[derive(Debug, Clone)]
pub struct GrammarMeta {
    pub name: String,
    pub description: String,
    pub start_tokens: Vec<StartToken>,
    pub precedence: i32,
    /// Claims statement position (otherwise expression position only).
    pub is_statement: bool,
    /// The driver, not the plugin, enforces and consumes the terminator.
    pub requires_terminator: bool,
    /// Selected unconditionally once matched by trigger; no probe.
    pub auto_match: bool,
}

impl GrammarMeta {
    pub fn statement(name: &str, words: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            start_tokens: words.iter().map(|w| StartToken::Word(w.to_string())).collect(),
            precedence: 0,
            is_statement: true,
            requires_terminator: false,
            auto_match: true,
        }
    }

    pub fn suffix(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            start_tokens: vec![StartToken::AnySuffix],
            precedence: 0,
            is_statement: false,
            requires_terminator: false,
            auto_match: false,
        }
    }
}

/// A grammar extension. Only the methods matching the plugin's declared
/// positions are ever invoked; each `parse_*` must leave the cursor exactly
/// past the tokens it consumed — the driver never rewinds a committed parse.
pub trait GrammarPlugin {
    fn meta(&self) -> &GrammarMeta;

    /// Pure lookahead probe. Must not consume tokens and must not fail.
    fn can_handle(&self, _parser: &mut Parser, _token: &Token) -> bool {
        true
    }

    /// Parse a statement (statement-position plugins).
    fn parse_stmt(&self, parser: &mut Parser) -> Result<Statement, SyntaxError> {
        let span = parser.current()?.span;
        Err(SyntaxError::Invalid {
            message: format!("plugin '{}' cannot parse a statement", self.meta().name),
            span,
        })
    }

    /// Parse an expression (expression-position plugins).
    fn parse_expr(&self, parser: &mut Parser) -> Result<Expression, SyntaxError> {
        let span = parser.current()?.span;
        Err(SyntaxError::Invalid {
            message: format!("plugin '{}' cannot parse an expression", self.meta().name),
            span,
        })
    }

    /// Parse a suffix applied to an already-parsed left operand.
    fn parse_suffix(&self, parser: &mut Parser, left: Expression) -> Result<Expression, SyntaxError> {
        let _ = left;
        let span = parser.current()?.span;
        Err(SyntaxError::Invalid {
            message: format!("plugin '{}' cannot parse a suffix", self.meta().name),
            span,
        })
    }
}

/// Key for the start-token index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TriggerKey {
    Word(String),
    Symbol(Sym),
}

/// Registry of grammar plugins with a start-token index.
///
/// Append-only during parse; registration order is the tiebreak for equal
/// precedence.
pub struct GrammarRegistry {
    plugins: Vec<Rc<dyn GrammarPlugin>>,
    by_trigger: FxHashMap<TriggerKey, Vec<usize>>,
    any_identifier: Vec<usize>,
    any_suffix: Vec<usize>,
}

impl GrammarRegistry {
    pub fn empty() -> Self {
        Self {
            plugins: Vec::new(),
            by_trigger: FxHashMap::default(),
            any_identifier: Vec::new(),
            any_suffix: Vec::new(),
        }
    }

    pub fn register(&mut self, plugin: Rc<dyn GrammarPlugin>) {
        let index = self.plugins.len();
        for start in &plugin.meta().start_tokens {
            match start {
                StartToken::Word(w) => {
                    self.by_trigger.entry(TriggerKey::Word(w.clone())).or_default().push(index)
                }
                StartToken::Symbol(s) => {
                    self.by_trigger.entry(TriggerKey::Symbol(*s)).or_default().push(index)
                }
                StartToken::AnyIdentifier => self.any_identifier.push(index),
                StartToken::AnySuffix => self.any_suffix.push(index),
            }
        }
        self.plugins.push(plugin);
    }

    /// Candidates for `token` at `position`, sorted by descending precedence
    /// with registration order as the tiebreak.
    pub fn candidates(
        &self,
        token: &Token,
        position: GrammarPosition,
    ) -> Vec<Rc<dyn GrammarPlugin>> {
        let mut indices: Vec<usize> = Vec::new();

        if position == GrammarPosition::Suffix {
            indices.extend_from_slice(&self.any_suffix);
        } else {
            match &token.kind {
                TokenKind::Identifier => {
                    if let Some(list) = self.by_trigger.get(&TriggerKey::Word(token.text.clone())) {
                        indices.extend_from_slice(list);
                    }
                    indices.extend_from_slice(&self.any_identifier);
                }
                TokenKind::Symbol(sym) => {
                    if let Some(list) = self.by_trigger.get(&TriggerKey::Symbol(*sym)) {
                        indices.extend_from_slice(list);
                    }
                }
                _ => {}
            }
        }

        // A plugin can match both a concrete word and the any-identifier
        // marker; keep its first occurrence only.
        let mut seen = Vec::with_capacity(indices.len());
        indices.retain(|&i| {
            if seen.contains(&i) {
                return false;
            }
            seen.push(i);
            let meta = self.plugins[i].meta();
            match position {
                GrammarPosition::Statement => meta.is_statement,
                GrammarPosition::Expression => !meta.is_statement,
                GrammarPosition::Suffix => true,
            }
        });

        // Stable sort keeps registration order within a precedence tier.
        indices.sort_by_key(|&i| std::cmp::Reverse(self.plugins[i].meta().precedence));
        indices.iter().map(|&i| Rc::clone(&self.plugins[i])).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Span, TokenValue};

    struct WordPlugin {
        meta: GrammarMeta,
    }

    impl GrammarPlugin for WordPlugin {
        fn meta(&self) -> &GrammarMeta {
            &self.meta
        }
    }

    fn plugin(name: &str, precedence: i32) -> Rc<dyn GrammarPlugin> {
        let mut meta = GrammarMeta::statement(name, &["deal"]);
        meta.precedence = precedence;
        Rc::new(WordPlugin { meta })
    }

    fn trigger() -> Token {
        Token::new(TokenKind::Identifier, TokenValue::None, "deal", Span::default())
    }

    fn candidate_names(registry: &GrammarRegistry) -> Vec<String> {
        registry
            .candidates(&trigger(), GrammarPosition::Statement)
            .iter()
            .map(|p| p.meta().name.clone())
            .collect()
    }

    #[test]
    fn higher_precedence_wins_in_either_registration_order() {
        for flipped in [false, true] {
            let mut registry = GrammarRegistry::empty();
            let (low, high) = (plugin("low", 0), plugin("high", 5));
            if flipped {
                registry.register(high);
                registry.register(low);
            } else {
                registry.register(low);
                registry.register(high);
            }
            assert_eq!(candidate_names(&registry), vec!["high", "low"], "flipped: {}", flipped);
        }
    }

    #[test]
    fn equal_precedence_keeps_registration_order() {
        let mut registry = GrammarRegistry::empty();
        registry.register(plugin("first", 3));
        registry.register(plugin("second", 3));
        assert_eq!(candidate_names(&registry), vec!["first", "second"]);
    }

    #[test]
    fn position_filters_out_expression_plugins() {
        let mut registry = GrammarRegistry::empty();
        let mut meta = GrammarMeta::statement("expr-only", &["deal"]);
        meta.is_statement = false;
        registry.register(Rc::new(WordPlugin { meta }));
        registry.register(plugin("stmt", 0));
        assert_eq!(candidate_names(&registry), vec!["stmt"]);
    }
}
