//! Expression parsing: precedence climbing over the default grammar, with
//! grammar plugins probed at primary position and suffix plugins (units,
//! percent) probed in the postfix loop.

use super::fluent;
use super::registry::{GrammarMeta, GrammarPlugin, GrammarPosition, GrammarRegistry};
use super::{Parser, SyntaxError};
use crate::ast::*;
use crate::token::{Sym, Token, TokenKind, TokenValue};
use std::rc::Rc;

/// Binary operator precedence (higher binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Or = 1,
    And = 2,
    Equality = 3,
    Comparison = 4,
    Additive = 5,
    Multiplicative = 6,
    Unary = 7,
    Postfix = 8,
    Primary = 9,
}

pub fn register_builtin_suffix_plugins(registry: &mut GrammarRegistry) {
    registry.register(Rc::new(UnitSuffixPlugin::new()));
    registry.register(Rc::new(PercentSuffixPlugin::new()));
}

/// Parse a full expression.
pub fn parse_expression(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    parser.depth += 1;
    if parser.depth > super::guards::MAX_PARSE_DEPTH {
        parser.depth -= 1;
        return Err(SyntaxError::LimitExceeded {
            message: format!(
                "maximum nesting depth ({}) exceeded in expression",
                super::guards::MAX_PARSE_DEPTH
            ),
            span: parser.current()?.span,
        });
    }
    let result = parse_or(parser);
    parser.depth -= 1;
    result
}

fn parse_or(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut left = parse_and(parser)?;
    while parser.current()?.is_symbol(Sym::OrOr) {
        parser.advance()?;
        let right = parse_and(parser)?;
        let span = left.span().merge(right.span());
        left = Expression::Logical(LogicalExpr {
            op: LogicalOp::Or,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn parse_and(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut left = parse_equality(parser)?;
    while parser.current()?.is_symbol(Sym::AndAnd) {
        parser.advance()?;
        let right = parse_equality(parser)?;
        let span = left.span().merge(right.span());
        left = Expression::Logical(LogicalExpr {
            op: LogicalOp::And,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn compare_op(token: &Token) -> Option<CompareOp> {
    match token.kind {
        TokenKind::Symbol(Sym::EqEq) => Some(CompareOp::Eq),
        TokenKind::Symbol(Sym::NotEq) => Some(CompareOp::NotEq),
        TokenKind::Symbol(Sym::Less) => Some(CompareOp::Less),
        TokenKind::Symbol(Sym::LessEq) => Some(CompareOp::LessEq),
        TokenKind::Symbol(Sym::Greater) => Some(CompareOp::Greater),
        TokenKind::Symbol(Sym::GreaterEq) => Some(CompareOp::GreaterEq),
        _ => None,
    }
}

fn parse_equality(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut left = parse_comparison(parser)?;
    loop {
        let token = parser.current()?;
        let op = match compare_op(&token) {
            Some(op @ (CompareOp::Eq | CompareOp::NotEq)) => op,
            _ => break,
        };
        parser.advance()?;
        let right = parse_comparison(parser)?;
        let span = left.span().merge(right.span());
        left = Expression::Compare(CompareExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn parse_comparison(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut left = parse_additive(parser)?;
    loop {
        let token = parser.current()?;
        let op = match compare_op(&token) {
            Some(op @ (CompareOp::Less | CompareOp::LessEq | CompareOp::Greater | CompareOp::GreaterEq)) => op,
            _ => break,
        };
        parser.advance()?;
        let right = parse_additive(parser)?;
        let span = left.span().merge(right.span());
        left = Expression::Compare(CompareExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn parse_additive(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut left = parse_multiplicative(parser)?;
    loop {
        let token = parser.current()?;
        let op = match token.kind {
            TokenKind::Symbol(Sym::Plus) => BinaryOp::Add,
            TokenKind::Symbol(Sym::Minus) => BinaryOp::Sub,
            _ => break,
        };
        parser.advance()?;
        let right = parse_multiplicative(parser)?;
        let span = left.span().merge(right.span());
        left = Expression::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn parse_multiplicative(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut left = parse_unary(parser)?;
    loop {
        let token = parser.current()?;
        let op = match token.kind {
            TokenKind::Symbol(Sym::Star) => BinaryOp::Mul,
            TokenKind::Symbol(Sym::Slash) => BinaryOp::Div,
            TokenKind::Symbol(Sym::Percent) => BinaryOp::Mod,
            _ => break,
        };
        parser.advance()?;
        let right = parse_unary(parser)?;
        let span = left.span().merge(right.span());
        left = Expression::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }
    Ok(left)
}

fn parse_unary(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let token = parser.current()?;
    let op = match token.kind {
        TokenKind::Symbol(Sym::Minus) => Some(UnaryOp::Neg),
        TokenKind::Symbol(Sym::Bang) => Some(UnaryOp::Not),
        _ => None,
    };
    if let Some(op) = op {
        parser.advance()?;
        let operand = parse_unary(parser)?;
        let span = token.span.merge(operand.span());
        return Ok(Expression::Unary(UnaryExpr { op, operand: Box::new(operand), span }));
    }
    parse_postfix(parser)
}

fn parse_postfix(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let mut expr = parse_primary(parser)?;
    loop {
        let token = parser.current()?;
        if token.is_symbol(Sym::Dot) {
            parser.advance()?;
            let (name, name_span) = parser.expect_identifier()?;
            if parser.current()?.is_symbol(Sym::LeftParen) {
                let args = parse_paren_args(parser)?;
                let end = parser.peek(0)?.span;
                let span = expr.span().merge(&end).merge(&name_span);
                expr = Expression::Call(CallExpr {
                    target: Some(Box::new(expr)),
                    name,
                    args,
                    wildcard: None,
                    span,
                });
            } else {
                let span = expr.span().merge(&name_span);
                expr = Expression::Member(MemberExpr { target: Box::new(expr), name, span });
            }
        } else if token.is_symbol(Sym::LeftBracket) {
            parser.advance()?;
            let index = parse_expression(parser)?;
            let close = parser.expect_sym(Sym::RightBracket)?;
            let span = expr.span().merge(&close.span);
            expr = Expression::Index(IndexExpr {
                target: Box::new(expr),
                index: Box::new(index),
                span,
            });
        } else if let Some(plugin) = parser.select_plugin(&token, GrammarPosition::Suffix)? {
            expr = plugin.parse_suffix(parser, expr)?;
        } else {
            break;
        }
    }
    Ok(expr)
}

fn parse_primary(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let token = parser.current()?;
    match token.kind {
        TokenKind::Number => {
            parser.advance()?;
            let value = token.number().unwrap_or(0.0);
            Ok(Expression::NumberLiteral(NumberLiteral { value, span: token.span }))
        }
        TokenKind::Str => {
            parser.advance()?;
            let value = match token.value {
                TokenValue::Str(s) => s,
                _ => String::new(),
            };
            Ok(Expression::StringLiteral(StringLiteral { value, span: token.span }))
        }
        TokenKind::Date => {
            parser.advance()?;
            let value = match token.value {
                TokenValue::Date(d) => d,
                _ => unreachable!("date token without date payload"),
            };
            Ok(Expression::DateLiteral(DateLiteral { value, span: token.span }))
        }
        TokenKind::Time => {
            parser.advance()?;
            let value = match token.value {
                TokenValue::Time(t) => t,
                _ => unreachable!("time token without time payload"),
            };
            Ok(Expression::TimeLiteral(TimeLiteral { value, span: token.span }))
        }
        TokenKind::Symbol(Sym::LeftParen) => {
            parser.advance()?;
            let expr = parse_expression(parser)?;
            parser.expect_sym(Sym::RightParen)?;
            Ok(expr)
        }
        TokenKind::Symbol(Sym::LeftBracket) => parse_array_literal(parser),
        TokenKind::Symbol(Sym::LeftBrace) => parse_map_literal(parser),
        TokenKind::Identifier => parse_identifier_expression(parser, token),
        _ => Err(parser.unexpected(&token, "expression")),
    }
}

fn parse_identifier_expression(parser: &mut Parser, token: Token) -> Result<Expression, SyntaxError> {
    match token.text.as_str() {
        "null" => {
            parser.advance()?;
            return Ok(Expression::NullLiteral(token.span));
        }
        "true" | "false" => {
            parser.advance()?;
            return Ok(Expression::BoolLiteral(BoolLiteral {
                value: token.text == "true",
                span: token.span,
            }));
        }
        _ => {}
    }

    // Expression-position grammar plugins claim identifiers before the
    // default grammar does.
    if let Some(plugin) = parser.select_plugin(&token, GrammarPosition::Expression)? {
        return plugin.parse_expr(parser);
    }

    // Fluent multi-word call names.
    let window = identifier_window(parser)?;
    if window.len() > 1 || parser.ctx.is_function(&window[0]) || has_wildcard_prefix(parser, &window) {
        if let Some(found) = fluent::resolve(&window, &parser.ctx) {
            return finish_fluent_call(parser, found, token.span);
        }
    }

    parser.advance()?;
    if parser.current()?.is_symbol(Sym::LeftParen) {
        // Single unknown name with parentheses still parses as a call; the
        // callee is resolved at run time.
        let args = parse_paren_args(parser)?;
        let end = parser.peek(0)?.span;
        return Ok(Expression::Call(CallExpr {
            target: None,
            name: token.text,
            args,
            wildcard: None,
            span: token.span.merge(&end),
        }));
    }

    Ok(Expression::Identifier(Identifier { name: token.text, span: token.span }))
}

fn has_wildcard_prefix(parser: &Parser, window: &[String]) -> bool {
    parser
        .ctx
        .wildcard_functions
        .iter()
        .any(|prefix| prefix.split(' ').next() == window.first().map(String::as_str))
}

/// Collect the window of consecutive identifier tokens starting at the
/// current one, without consuming anything.
pub(crate) fn identifier_window(parser: &mut Parser) -> Result<Vec<String>, SyntaxError> {
    let mut window = Vec::new();
    for n in 0..fluent::MAX_FLUENT_WINDOW {
        let token = parser.peek(n)?;
        match token.ident() {
            Some(name) => window.push(name.to_string()),
            None => break,
        }
    }
    Ok(window)
}

/// Consume a resolved fluent name and its (parenthesized) arguments.
pub(crate) fn finish_fluent_call(
    parser: &mut Parser,
    found: fluent::FluentMatch,
    start: crate::token::Span,
) -> Result<Expression, SyntaxError> {
    for _ in 0..found.consumed {
        parser.advance()?;
    }
    let args = if parser.current()?.is_symbol(Sym::LeftParen) {
        parse_paren_args(parser)?
    } else {
        Vec::new()
    };
    let end = parser.peek(0)?.span;
    Ok(Expression::Call(CallExpr {
        target: None,
        name: found.name,
        args,
        wildcard: found.wildcard,
        span: start.merge(&end),
    }))
}

/// Parse `( arg, arg, ... )`. Named arguments (`name: expr`) must follow all
/// positional ones; violating that is a parse error, not a reorder.
pub(crate) fn parse_paren_args(parser: &mut Parser) -> Result<Vec<Argument>, SyntaxError> {
    parser.expect_sym(Sym::LeftParen)?;
    let mut args = Vec::new();
    if !parser.current()?.is_symbol(Sym::RightParen) {
        loop {
            args.push(parse_argument(parser, &args)?);
            if !parser.eat_sym(Sym::Comma)? {
                break;
            }
        }
    }
    parser.expect_sym(Sym::RightParen)?;
    Ok(args)
}

pub(crate) fn parse_argument(parser: &mut Parser, before: &[Argument]) -> Result<Argument, SyntaxError> {
    let token = parser.current()?;
    let named = token.is_identifier() && parser.peek(1)?.is_symbol(Sym::Colon);
    if named {
        parser.advance()?;
        parser.expect_sym(Sym::Colon)?;
        let value = parse_expression(parser)?;
        let span = token.span.merge(value.span());
        return Ok(Argument { name: Some(token.text), value, span });
    }
    if before.iter().any(|a| a.name.is_some()) {
        return Err(SyntaxError::PositionalAfterNamed { span: token.span });
    }
    let value = parse_expression(parser)?;
    let span = *value.span();
    Ok(Argument { name: None, value, span })
}

fn parse_array_literal(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let open = parser.expect_sym(Sym::LeftBracket)?;
    let mut elements = Vec::new();
    if !parser.current()?.is_symbol(Sym::RightBracket) {
        loop {
            elements.push(parse_expression(parser)?);
            if !parser.eat_sym(Sym::Comma)? {
                break;
            }
        }
    }
    let close = parser.expect_sym(Sym::RightBracket)?;
    Ok(Expression::ArrayLiteral(ArrayLiteral { elements, span: open.span.merge(&close.span) }))
}

fn parse_map_literal(parser: &mut Parser) -> Result<Expression, SyntaxError> {
    let open = parser.expect_sym(Sym::LeftBrace)?;
    let mut entries = Vec::new();
    if !parser.current()?.is_symbol(Sym::RightBrace) {
        loop {
            let key_token = parser.current()?;
            let key = match (&key_token.kind, &key_token.value) {
                (TokenKind::Identifier, _) => key_token.text.clone(),
                (TokenKind::Str, TokenValue::Str(s)) => s.clone(),
                _ => return Err(parser.unexpected(&key_token, "map key")),
            };
            parser.advance()?;
            parser.expect_sym(Sym::Colon)?;
            let value = parse_expression(parser)?;
            entries.push((key, value));
            if !parser.eat_sym(Sym::Comma)? {
                break;
            }
        }
    }
    let close = parser.expect_sym(Sym::RightBrace)?;
    Ok(Expression::MapLiteral(MapLiteral { entries, span: open.span.merge(&close.span) }))
}

// ---------------------------------------------------------------------------
// Builtin suffix plugins
// ---------------------------------------------------------------------------

/// `5 inches` — an identifier naming a registered unit directly after a
/// parsed operand.
struct UnitSuffixPlugin {
    meta: GrammarMeta,
}

impl UnitSuffixPlugin {
    fn new() -> Self {
        let mut meta = GrammarMeta::suffix("unit");
        meta.description = "unit suffix: <expr> <unit name>".to_string();
        Self { meta }
    }
}

impl GrammarPlugin for UnitSuffixPlugin {
    fn meta(&self) -> &GrammarMeta {
        &self.meta
    }

    fn can_handle(&self, parser: &mut Parser, token: &Token) -> bool {
        token.ident().map_or(false, |name| parser.ctx.unit_names.contains(name))
    }

    fn parse_suffix(&self, parser: &mut Parser, left: Expression) -> Result<Expression, SyntaxError> {
        let (unit, span) = parser.expect_identifier()?;
        let span = left.span().merge(&span);
        Ok(Expression::Unit(UnitExpr { value: Box::new(left), unit, span }))
    }
}

/// `40%` — a percent sign that is not a binary modulo. Claimed only when the
/// `%` is not followed by something that can start an expression.
struct PercentSuffixPlugin {
    meta: GrammarMeta,
}

impl PercentSuffixPlugin {
    fn new() -> Self {
        let mut meta = GrammarMeta::suffix("percent");
        meta.description = "percent suffix: <expr>%".to_string();
        Self { meta }
    }
}

impl GrammarPlugin for PercentSuffixPlugin {
    fn meta(&self) -> &GrammarMeta {
        &self.meta
    }

    fn can_handle(&self, parser: &mut Parser, token: &Token) -> bool {
        if !token.is_symbol(Sym::Percent) {
            return false;
        }
        let next = match parser.peek(1) {
            Ok(next) => next,
            Err(_) => return false,
        };
        !matches!(
            next.kind,
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
        )
    }

    fn parse_suffix(&self, parser: &mut Parser, left: Expression) -> Result<Expression, SyntaxError> {
        let token = parser.expect_sym(Sym::Percent)?;
        let span = left.span().merge(&token.span);
        Ok(Expression::Percent(PercentExpr { value: Box::new(left), span }))
    }
}
