//! Expression AST nodes.

use crate::token::Span;
use chrono::{NaiveDate, NaiveTime};

/// Expression (produces a value).
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Null literal: `null`
    NullLiteral(Span),

    /// Boolean literal: `true`, `false`
    BoolLiteral(BoolLiteral),

    /// Number literal: `42`, `3.14`
    NumberLiteral(NumberLiteral),

    /// String literal: `"hello"`, `'hello'`
    StringLiteral(StringLiteral),

    /// Date literal produced by the date lexical plugin: `1/27/1978`
    DateLiteral(DateLiteral),

    /// Time literal produced by the time lexical plugin: `14:30`
    TimeLiteral(TimeLiteral),

    /// Array literal: `[1, 2, 3]`
    ArrayLiteral(ArrayLiteral),

    /// Map literal: `{ a: 1, b: 2 }`
    MapLiteral(MapLiteral),

    /// Variable reference
    Identifier(Identifier),

    /// Arithmetic: `a + b`
    Binary(BinaryExpr),

    /// Comparison: `a < b`, `a == b`
    Compare(CompareExpr),

    /// Short-circuit logic: `a && b`, `a || b`
    Logical(LogicalExpr),

    /// Prefix: `-a`, `!a`
    Unary(UnaryExpr),

    /// Member access: `target.member`
    Member(MemberExpr),

    /// Index access: `target[index]`
    Index(IndexExpr),

    /// Function or method call, including fluent multi-word calls
    Call(CallExpr),

    /// Unit suffix from the postfix unit plugin: `5 inches`
    Unit(UnitExpr),

    /// Percent suffix from the postfix percent plugin: `40%`
    Percent(PercentExpr),

    /// Named extension expression contributed by a grammar plugin; evaluated
    /// by invoking the named function with the collected arguments.
    Extension(ExtensionExpr),
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::NullLiteral(span) => span,
            Expression::BoolLiteral(e) => &e.span,
            Expression::NumberLiteral(e) => &e.span,
            Expression::StringLiteral(e) => &e.span,
            Expression::DateLiteral(e) => &e.span,
            Expression::TimeLiteral(e) => &e.span,
            Expression::ArrayLiteral(e) => &e.span,
            Expression::MapLiteral(e) => &e.span,
            Expression::Identifier(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Compare(e) => &e.span,
            Expression::Logical(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Index(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::Unit(e) => &e.span,
            Expression::Percent(e) => &e.span,
            Expression::Extension(e) => &e.span,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Expression::NullLiteral(_)
                | Expression::BoolLiteral(_)
                | Expression::NumberLiteral(_)
                | Expression::StringLiteral(_)
                | Expression::DateLiteral(_)
                | Expression::TimeLiteral(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolLiteral {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub value: f64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateLiteral {
    pub value: NaiveDate,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeLiteral {
    pub value: NaiveTime,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayLiteral {
    pub elements: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLiteral {
    pub entries: Vec<(String, Expression)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub span: Span,
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Less => "<",
            CompareOp::LessEq => "<=",
            CompareOp::Greater => ">",
            CompareOp::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompareExpr {
    pub op: CompareOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    pub op: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub target: Box<Expression>,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub target: Box<Expression>,
    pub index: Box<Expression>,
    pub span: Span,
}

/// A call argument, optionally named (`amount: 200`).
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: Option<String>,
    pub value: Expression,
    pub span: Span,
}

/// Wildcard capture for wildcard-named functions: the trailing identifiers
/// split into parts plus the reconstructed spaced string.
#[derive(Debug, Clone, PartialEq)]
pub struct WildcardCapture {
    pub parts: Vec<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    /// Receiver for method calls (`target.name(...)`); `None` for plain and
    /// fluent calls.
    pub target: Option<Box<Expression>>,
    /// Resolved function name. Multi-word fluent names keep their spaces.
    pub name: String,
    pub args: Vec<Argument>,
    pub wildcard: Option<WildcardCapture>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitExpr {
    pub value: Box<Expression>,
    pub unit: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PercentExpr {
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionExpr {
    pub name: String,
    pub args: Vec<Expression>,
    pub span: Span,
}
