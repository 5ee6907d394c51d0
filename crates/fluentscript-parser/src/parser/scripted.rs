//! The `plugin` meta-construct: scripts registering new plugins at parse time.
//!
//! ```text
//! plugin "double it" {
//!     type: "expr"
//!     start_tokens: "double, twice"
//!     grammar_parse: "double {expr}"
//!     parse: func(x) { return x * 2 }
//! }
//! ```
//!
//! An `"expr"` plugin is appended to the grammar registry immediately, so it
//! claims its start tokens in every statement parsed after the declaration in
//! the same unit. Its productions are `Extension` nodes that invoke the
//! declared callback at run time; the declaration statement itself survives
//! in the AST so evaluation defines the callback before any use.
//!
//! A `"token"` plugin is appended to the lexical registry; its grammar
//! pattern is a regular expression over the remaining input, and a claimed
//! match is emitted as a string token. The callback cannot run at lex time
//! (evaluation has not started), so token plugins are pattern-only.

use super::registry::{GrammarMeta, GrammarPlugin, StartToken};
use super::{expr, stmt, Parser, SyntaxError};
use crate::ast::*;
use crate::lexer::plugins::{LexTrigger, LexicalPlugin};
use crate::lexer::{LexError, Scanner};
use crate::token::{Sym, Token, TokenKind, TokenValue};
use regex::Regex;
use std::rc::Rc;

pub fn parse_plugin_decl(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("plugin")?.span;
    let desc_token = parser.current()?;
    let desc = match &desc_token.value {
        TokenValue::Str(s) if desc_token.kind == TokenKind::Str => s.clone(),
        _ => return Err(parser.unexpected(&desc_token, "plugin description string")),
    };
    parser.advance()?;
    parser.expect_sym(Sym::LeftBrace)?;

    let mut kind = None;
    let mut start_tokens: Vec<String> = Vec::new();
    let mut pattern = String::new();
    let mut callback = None;

    while !parser.current()?.is_symbol(Sym::RightBrace) {
        let (field, field_span) = parser.expect_identifier()?;
        parser.expect_sym(Sym::Colon)?;
        match field.as_str() {
            "type" => {
                let value = expect_string_field(parser, "type")?;
                kind = Some(match value.as_str() {
                    "expr" => ScriptedPluginKind::Expr,
                    "token" => ScriptedPluginKind::Token,
                    other => {
                        return Err(SyntaxError::Invalid {
                            message: format!("unknown plugin type '{}', expected \"expr\" or \"token\"", other),
                            span: field_span,
                        })
                    }
                });
            }
            "start_tokens" => {
                let value = expect_string_field(parser, "start_tokens")?;
                start_tokens = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "grammar_parse" => {
                pattern = expect_string_field(parser, "grammar_parse")?;
            }
            "parse" => {
                callback = Some(parse_callback(parser)?);
            }
            other => {
                return Err(SyntaxError::Invalid {
                    message: format!("unknown plugin field '{}'", other),
                    span: field_span,
                });
            }
        }
        parser.eat_sym(Sym::Comma)?;
    }
    let close = parser.expect_sym(Sym::RightBrace)?;
    let span = start.merge(&close.span);

    let kind = kind.ok_or_else(|| SyntaxError::Invalid {
        message: "plugin declaration is missing 'type'".to_string(),
        span,
    })?;
    let callback = callback.ok_or_else(|| SyntaxError::Invalid {
        message: "plugin declaration is missing 'parse'".to_string(),
        span,
    })?;

    match kind {
        ScriptedPluginKind::Expr => {
            if start_tokens.is_empty() {
                return Err(SyntaxError::Invalid {
                    message: "an \"expr\" plugin needs start_tokens".to_string(),
                    span,
                });
            }
            if pattern.is_empty() {
                pattern = start_tokens[0].clone();
            }
            let plugin = ScriptedExprPlugin::new(&desc, &start_tokens, &pattern, &callback.name);
            parser.registry_mut().register(Rc::new(plugin));
        }
        ScriptedPluginKind::Token => {
            let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|e| SyntaxError::Invalid {
                message: format!("invalid token plugin pattern: {}", e),
                span,
            })?;
            let plugin = ScriptedTokenPlugin { regex };
            parser.stream_mut().lexer_mut().registry_mut().register(Rc::new(plugin));
        }
    }

    Ok(Statement::Plugin(PluginDecl { desc, kind, start_tokens, pattern, callback, span }))
}

fn expect_string_field(parser: &mut Parser, field: &str) -> Result<String, SyntaxError> {
    let token = parser.current()?;
    match &token.value {
        TokenValue::Str(s) if token.kind == TokenKind::Str => {
            let value = s.clone();
            parser.advance()?;
            Ok(value)
        }
        _ => Err(parser.unexpected(&token, &format!("string value for '{}'", field))),
    }
}

/// Parse `func(params) { body }` and give it a generated name the evaluator
/// can bind and `Extension` nodes can call.
fn parse_callback(parser: &mut Parser) -> Result<Rc<FunctionDecl>, SyntaxError> {
    let start = parser.expect_word("func")?.span;
    let params = stmt::parse_params(parser)?;
    let body = stmt::parse_block(parser)?;
    let span = start.merge(&body.span);
    let name = format!("__plugin{}", parser.plugin_serial);
    parser.plugin_serial += 1;
    Ok(Rc::new(FunctionDecl { name, wildcard: false, params, body, span }))
}

/// A script-declared expression plugin. The grammar pattern is a sequence of
/// literal words and `{expr}` placeholders.
struct ScriptedExprPlugin {
    meta: GrammarMeta,
    elements: Vec<String>,
    callback_name: String,
}

impl ScriptedExprPlugin {
    fn new(desc: &str, start_tokens: &[String], pattern: &str, callback_name: &str) -> Self {
        let meta = GrammarMeta {
            name: format!("scripted:{}", desc),
            description: desc.to_string(),
            start_tokens: start_tokens.iter().map(|w| StartToken::Word(w.clone())).collect(),
            precedence: 0,
            is_statement: false,
            requires_terminator: false,
            auto_match: false,
        };
        Self {
            meta,
            elements: pattern.split_whitespace().map(str::to_string).collect(),
            callback_name: callback_name.to_string(),
        }
    }
}

impl GrammarPlugin for ScriptedExprPlugin {
    fn meta(&self) -> &GrammarMeta {
        &self.meta
    }

    fn can_handle(&self, parser: &mut Parser, _token: &Token) -> bool {
        // The trigger matched the first element; probe the second literal
        // word, if the pattern has one.
        match self.elements.get(1) {
            Some(word) if word != "{expr}" => {
                parser.peek(1).map_or(false, |t| t.is_word(word))
            }
            _ => true,
        }
    }

    fn parse_expr(&self, parser: &mut Parser) -> Result<Expression, SyntaxError> {
        let start = parser.current()?.span;
        let mut args = Vec::new();
        for element in &self.elements {
            if element == "{expr}" {
                args.push(expr::parse_expression(parser)?);
            } else {
                parser.expect_word(element)?;
            }
        }
        let end = parser.peek(0)?.span;
        Ok(Expression::Extension(ExtensionExpr {
            name: self.callback_name.clone(),
            args,
            span: start.merge(&end),
        }))
    }
}

/// A script-declared token plugin: a regex over the remaining input, emitted
/// as a string token on match.
struct ScriptedTokenPlugin {
    regex: Regex,
}

impl LexicalPlugin for ScriptedTokenPlugin {
    fn name(&self) -> &'static str {
        "scripted-token"
    }

    fn trigger(&self) -> LexTrigger {
        LexTrigger::Wildcard
    }

    fn can_handle(&self, _candidate: Option<&Token>, rest: &str) -> bool {
        self.regex.is_match(rest)
    }

    fn parse(&self, scanner: &mut Scanner) -> Result<Vec<Token>, LexError> {
        let len = self.regex.find(scanner.rest()).map_or(0, |m| m.end());
        let (text, span) = scanner.take(len.max(1));
        Ok(vec![Token::new(TokenKind::Str, TokenValue::Str(text.to_string()), text, span)])
    }
}
