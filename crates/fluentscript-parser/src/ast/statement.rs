//! Statement AST nodes.

use super::expression::Expression;
use crate::token::Span;
use std::rc::Rc;

/// Statement (executed for effect).
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(ExpressionStatement),
    Assign(AssignStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Func(Rc<FunctionDecl>),
    Const(ConstStatement),
    Module(ModuleStatement),
    Return(ReturnStatement),
    Break(Span),
    Continue(Span),
    /// The language's explicit `fail` statement: a user-triggered abort.
    Fail(FailStatement),
    /// The `plugin` meta-construct. Registration happens at parse time; the
    /// statement survives in the AST so the callback gets defined at runtime.
    Plugin(PluginDecl),
}

impl Statement {
    pub fn span(&self) -> &Span {
        match self {
            Statement::Expression(s) => &s.span,
            Statement::Assign(s) => &s.span,
            Statement::If(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::Func(s) => &s.span,
            Statement::Const(s) => &s.span,
            Statement::Module(s) => &s.span,
            Statement::Return(s) => &s.span,
            Statement::Break(span) | Statement::Continue(span) => span,
            Statement::Fail(s) => &s.span,
            Statement::Plugin(s) => &s.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStatement {
    /// Identifier, member, or index expression.
    pub target: Expression,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_block: Block,
    /// `else { .. }` or a single nested `if` for `else if` chains.
    pub else_block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub variable: String,
    pub iterable: Expression,
    pub body: Block,
    pub span: Span,
}

/// A declared parameter. `required` is false once a default is given.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub alias: Option<String>,
    pub type_name: Option<String>,
    pub default: Option<Expression>,
    pub span: Span,
}

impl ParamDecl {
    pub fn required(&self) -> bool {
        self.default.is_none()
    }
}

/// A function declaration. The name may contain spaces (fluent multi-word
/// functions); `wildcard` marks a `func create user by*(...)` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub wildcard: bool,
    pub params: Vec<ParamDecl>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstStatement {
    pub name: String,
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleStatement {
    pub name: String,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailStatement {
    pub message: Option<Expression>,
    pub span: Span,
}

/// Kind of a scripted plugin declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedPluginKind {
    /// Contributes an expression/statement production.
    Expr,
    /// Contributes a token pattern.
    Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluginDecl {
    pub desc: String,
    pub kind: ScriptedPluginKind,
    pub start_tokens: Vec<String>,
    /// Grammar pattern: literal words and `{expr}` placeholders for `Expr`
    /// plugins, a regular expression over the remaining input for `Token`
    /// plugins.
    pub pattern: String,
    pub callback: Rc<FunctionDecl>,
    pub span: Span,
}
