//! Builtin statement grammar plugins and the default statement grammar.
//!
//! Every statement form of the language (`if`, `while`, `for`, `func`,
//! `const`, `module`, `return`, `break`, `continue`, `fail`, `plugin`) is a
//! registered grammar plugin; the driving parser knows nothing about them
//! beyond the registry. The default grammar, used when no plugin claims the
//! token, covers assignment, fluent calls, and expression statements.

use super::expr::{self, parse_expression};
use super::fluent;
use super::registry::{GrammarMeta, GrammarPlugin, GrammarRegistry};
use super::scripted;
use super::{Parser, SyntaxError};
use crate::ast::*;
use crate::token::{Sym, TokenKind};
use std::rc::Rc;

pub fn register_builtin_plugins(registry: &mut GrammarRegistry) {
    registry.register(Rc::new(word_plugin("if", parse_if)));
    registry.register(Rc::new(word_plugin("while", parse_while)));
    registry.register(Rc::new(word_plugin("for", parse_for)));
    registry.register(Rc::new(word_plugin("func", parse_func)));
    registry.register(Rc::new(word_plugin("const", parse_const)));
    registry.register(Rc::new(word_plugin("module", parse_module)));
    registry.register(Rc::new(word_plugin("return", parse_return)));
    registry.register(Rc::new(word_plugin("break", parse_break)));
    registry.register(Rc::new(word_plugin("continue", parse_continue)));
    registry.register(Rc::new(word_plugin("fail", parse_fail)));
    registry.register(Rc::new(word_plugin("plugin", scripted::parse_plugin_decl)));
}

type StmtFn = fn(&mut Parser) -> Result<Statement, SyntaxError>;

/// A builtin single-keyword statement plugin. Auto-matched: the start word is
/// unambiguous, so the `can_handle` probe is skipped.
struct WordStatementPlugin {
    meta: GrammarMeta,
    parse: StmtFn,
}

fn word_plugin(word: &'static str, parse: StmtFn) -> WordStatementPlugin {
    WordStatementPlugin { meta: GrammarMeta::statement(word, &[word]), parse }
}

impl GrammarPlugin for WordStatementPlugin {
    fn meta(&self) -> &GrammarMeta {
        &self.meta
    }

    fn parse_stmt(&self, parser: &mut Parser) -> Result<Statement, SyntaxError> {
        (self.parse)(parser)
    }
}

/// Parse `{ statements }`.
pub fn parse_block(parser: &mut Parser) -> Result<Block, SyntaxError> {
    let open = parser.expect_sym(Sym::LeftBrace)?;
    let mut statements = Vec::new();
    let mut guard = super::guards::LoopGuard::new("block");
    loop {
        guard.check(parser.current()?.span)?;
        let token = parser.current()?;
        if token.is_symbol(Sym::RightBrace) {
            break;
        }
        if token.is_eof() {
            return Err(parser.unexpected(&token, "'}'"));
        }
        statements.push(parser.parse_statement()?);
    }
    let close = parser.expect_sym(Sym::RightBrace)?;
    Ok(Block { statements, span: open.span.merge(&close.span) })
}

fn parse_if(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("if")?.span;
    let condition = parse_expression(parser)?;
    let then_block = parse_block(parser)?;
    let mut span = start.merge(&then_block.span);

    let else_block = if parser.eat_word("else")? {
        if parser.current()?.is_word("if") {
            // else-if chain: wrap the nested if in a synthetic block.
            let nested = parse_if(parser)?;
            let nested_span = *nested.span();
            span = span.merge(&nested_span);
            Some(Block { statements: vec![nested], span: nested_span })
        } else {
            let block = parse_block(parser)?;
            span = span.merge(&block.span);
            Some(block)
        }
    } else {
        None
    };

    Ok(Statement::If(IfStatement { condition, then_block, else_block, span }))
}

fn parse_while(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("while")?.span;
    let condition = parse_expression(parser)?;
    let body = parse_block(parser)?;
    let span = start.merge(&body.span);
    Ok(Statement::While(WhileStatement { condition, body, span }))
}

fn parse_for(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("for")?.span;
    let (variable, _) = parser.expect_identifier()?;
    parser.expect_word("in")?;
    let iterable = parse_expression(parser)?;
    let body = parse_block(parser)?;
    let span = start.merge(&body.span);
    Ok(Statement::For(ForStatement { variable, iterable, body, span }))
}

/// Parse a function declaration.
///
/// The name may span several identifier words; a `*` before the parameter
/// list declares a wildcard function. The name is entered into the parse
/// context before the body is parsed so recursive fluent calls resolve.
fn parse_func(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("func")?.span;

    let mut words = Vec::new();
    loop {
        let token = parser.current()?;
        match token.ident() {
            Some(word) => {
                words.push(word.to_string());
                parser.advance()?;
            }
            None => break,
        }
    }
    if words.is_empty() {
        let token = parser.current()?;
        return Err(parser.unexpected(&token, "function name"));
    }
    let wildcard = parser.eat_sym(Sym::Star)?;
    let name = words.join(" ");

    let params = parse_params(parser)?;
    parser.ctx.declare_function(&name, wildcard);

    let body = parse_block(parser)?;
    let span = start.merge(&body.span);
    Ok(Statement::Func(Rc::new(FunctionDecl { name, wildcard, params, body, span })))
}

/// Parse `( name [as alias] [: type] [= default], ... )`.
pub fn parse_params(parser: &mut Parser) -> Result<Vec<ParamDecl>, SyntaxError> {
    parser.expect_sym(Sym::LeftParen)?;
    let mut params = Vec::new();
    if !parser.current()?.is_symbol(Sym::RightParen) {
        loop {
            let (name, span) = parser.expect_identifier()?;
            let alias = if parser.eat_word("as")? {
                Some(parser.expect_identifier()?.0)
            } else {
                None
            };
            let type_name = if parser.eat_sym(Sym::Colon)? {
                Some(parser.expect_identifier()?.0)
            } else {
                None
            };
            let default = if parser.eat_sym(Sym::Assign)? {
                Some(parse_expression(parser)?)
            } else {
                None
            };
            params.push(ParamDecl { name, alias, type_name, default, span });
            if !parser.eat_sym(Sym::Comma)? {
                break;
            }
        }
    }
    parser.expect_sym(Sym::RightParen)?;
    Ok(params)
}

fn parse_const(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("const")?.span;
    let (name, _) = parser.expect_identifier()?;
    parser.expect_sym(Sym::Assign)?;
    let value = parse_expression(parser)?;
    let span = start.merge(value.span());
    Ok(Statement::Const(ConstStatement { name, value, span }))
}

fn parse_module(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("module")?.span;
    let (name, _) = parser.expect_identifier()?;
    let body = parse_block(parser)?;
    let span = start.merge(&body.span);
    Ok(Statement::Module(ModuleStatement { name, body, span }))
}

fn parse_return(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("return")?.span;
    let token = parser.current()?;
    let value = if token.is_symbol(Sym::Semicolon) || token.is_symbol(Sym::RightBrace) || token.is_eof() {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    let span = value.as_ref().map_or(start, |v| start.merge(v.span()));
    Ok(Statement::Return(ReturnStatement { value, span }))
}

fn parse_break(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let span = parser.expect_word("break")?.span;
    Ok(Statement::Break(span))
}

fn parse_continue(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let span = parser.expect_word("continue")?.span;
    Ok(Statement::Continue(span))
}

fn parse_fail(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let start = parser.expect_word("fail")?.span;
    let token = parser.current()?;
    let message = if token.is_symbol(Sym::Semicolon) || token.is_symbol(Sym::RightBrace) || token.is_eof() {
        None
    } else {
        Some(parse_expression(parser)?)
    };
    let span = message.as_ref().map_or(start, |m| start.merge(m.span()));
    Ok(Statement::Fail(FailStatement { message, span }))
}

/// The default grammar: assignment, fluent calls with bare argument lists,
/// or a plain expression statement.
pub fn parse_default_statement(parser: &mut Parser) -> Result<Statement, SyntaxError> {
    let token = parser.current()?;

    if token.is_identifier() {
        // Simple `name = expr` assignment.
        if parser.peek(1)?.is_symbol(Sym::Assign) {
            let (_, span) = parser.expect_identifier()?;
            parser.expect_sym(Sym::Assign)?;
            let value = parse_expression(parser)?;
            let stmt_span = span.merge(value.span());
            return Ok(Statement::Assign(AssignStatement {
                target: Expression::Identifier(Identifier { name: token.text, span }),
                value,
                span: stmt_span,
            }));
        }

        // Statement-level fluent call: arguments may follow without
        // parentheses (`refill inventory 'KL-131', 200`).
        let window = expr::identifier_window(parser)?;
        if let Some(found) = fluent::resolve(&window, &parser.ctx) {
            let call = finish_statement_call(parser, found, token.span)?;
            let span = *call.span();
            return Ok(Statement::Expression(ExpressionStatement { expression: call, span }));
        }
    }

    let expression = parse_expression(parser)?;

    if parser.current()?.is_symbol(Sym::Assign) {
        match expression {
            Expression::Identifier(_) | Expression::Member(_) | Expression::Index(_) => {
                parser.advance()?;
                let value = parse_expression(parser)?;
                let span = expression.span().merge(value.span());
                return Ok(Statement::Assign(AssignStatement { target: expression, value, span }));
            }
            _ => {
                let token = parser.current()?;
                return Err(SyntaxError::Invalid {
                    message: "invalid assignment target".to_string(),
                    span: token.span,
                });
            }
        }
    }

    let span = *expression.span();
    Ok(Statement::Expression(ExpressionStatement { expression, span }))
}

fn finish_statement_call(
    parser: &mut Parser,
    found: fluent::FluentMatch,
    start: crate::token::Span,
) -> Result<Expression, SyntaxError> {
    for _ in 0..found.consumed {
        parser.advance()?;
    }

    if parser.current()?.is_symbol(Sym::LeftParen) {
        let args = expr::parse_paren_args(parser)?;
        let end = parser.peek(0)?.span;
        return Ok(Expression::Call(CallExpr {
            target: None,
            name: found.name,
            args,
            wildcard: found.wildcard,
            span: start.merge(&end),
        }));
    }

    let mut args = Vec::new();
    if starts_expression(parser)? {
        loop {
            let arg = expr::parse_argument(parser, &args)?;
            args.push(arg);
            if !parser.eat_sym(Sym::Comma)? {
                break;
            }
        }
    }
    let end = parser.peek(0)?.span;
    Ok(Expression::Call(CallExpr {
        target: None,
        name: found.name,
        args,
        wildcard: found.wildcard,
        span: start.merge(&end),
    }))
}

/// Can the current token begin an expression? Used to decide whether a
/// parenless fluent call has arguments.
fn starts_expression(parser: &mut Parser) -> Result<bool, SyntaxError> {
    let token = parser.current()?;
    Ok(matches!(
        token.kind,
        TokenKind::Number
            | TokenKind::Str
            | TokenKind::Date
            | TokenKind::Time
            | TokenKind::Identifier
            | TokenKind::Symbol(Sym::LeftParen)
            | TokenKind::Symbol(Sym::LeftBracket)
            | TokenKind::Symbol(Sym::LeftBrace)
            | TokenKind::Symbol(Sym::Minus)
            | TokenKind::Symbol(Sym::Bang)
    ))
}
