//! The FluentScript error taxonomy.
//!
//! Every error carries a span; the [`ScriptError`] umbrella adds the script
//! name so any surfaced diagnostic is `(script, line, column, message)`
//! without the host inspecting internal state.

use fluentscript_parser::{LexError, Span, SyntaxError};
use std::fmt;
use thiserror::Error;

/// Operator or conversion applied to an illegal type pair.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("Operator '{op}' is not defined for {left} and {right} at {span}")]
    InvalidOperands { op: String, left: &'static str, right: &'static str, span: Span },

    #[error("Cannot convert {from} to {to} at {span}")]
    InvalidConversion { from: &'static str, to: &'static str, span: Span },

    #[error("Cannot combine {left} and {right} units at {span}")]
    UnitGroupMismatch { left: String, right: String, span: Span },

    #[error("Unknown unit '{name}' at {span}")]
    UnknownUnit { name: String, span: Span },
}

/// Errors raised while evaluating an otherwise well-typed program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Undefined variable '{name}' at {span}")]
    UndefinedVariable { name: String, span: Span },

    #[error("Undefined function '{name}' at {span}")]
    UndefinedFunction { name: String, span: Span },

    #[error("{type_name} has no member '{member}' at {span}")]
    MissingMember { type_name: String, member: String, span: Span },

    #[error("Cannot access member '{member}' on null at {span}")]
    NullReceiver { member: String, span: Span },

    #[error("Member '{member}' of {type_name} cannot be {action} at {span}")]
    MemberNotSupported { member: String, type_name: String, action: &'static str, span: Span },

    #[error("Index {index} out of bounds (length {len}) at {span}")]
    IndexOutOfBounds { index: i64, len: usize, span: Span },

    #[error("{kind} cannot be indexed with {index_kind} at {span}")]
    NotIndexable { kind: &'static str, index_kind: &'static str, span: Span },

    #[error("{kind} is not iterable at {span}")]
    NotIterable { kind: &'static str, span: Span },

    #[error("Unknown parameter '{name}' for '{function}' at {span}")]
    UnknownParameter { name: String, function: String, span: Span },

    #[error("'{function}' takes {expected} arguments, got {got} at {span}")]
    TooManyArguments { function: String, expected: usize, got: usize, span: Span },

    #[error("Cannot reassign constant '{name}' at {span}")]
    ConstantReassigned { name: String, span: Span },

    #[error("Invalid assignment target at {span}")]
    NotAssignable { span: Span },

    #[error("'{keyword}' outside of a loop at {span}")]
    LoopFlowOutsideLoop { keyword: &'static str, span: Span },

    #[error("External error in '{name}': {message} at {span}")]
    External { name: String, message: String, span: Span },
}

/// A configured resource bound was breached.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitError {
    #[error("Call depth limit ({limit}) exceeded at {span}")]
    CallDepth { limit: usize, span: Span },

    #[error("Scope depth limit ({limit}) exceeded at {span}")]
    ScopeDepth { limit: usize, span: Span },

    #[error("Parameter count limit ({limit}) exceeded at {span}")]
    ParameterCount { limit: usize, span: Span },

    #[error("String length limit ({limit}) exceeded at {span}")]
    StringLength { limit: usize, span: Span },
}

/// The language's explicit `fail` statement: a user-triggered abort, not an
/// interpreter bug.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Script failed: {message} at {span}")]
pub struct ScriptFail {
    pub message: String,
    pub span: Span,
}

/// Any error raised during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Limit(#[from] LimitError),

    #[error(transparent)]
    Fail(#[from] ScriptFail),
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::Type(e) => match e {
                TypeError::InvalidOperands { span, .. }
                | TypeError::InvalidConversion { span, .. }
                | TypeError::UnitGroupMismatch { span, .. }
                | TypeError::UnknownUnit { span, .. } => *span,
            },
            EvalError::Runtime(e) => match e {
                RuntimeError::UndefinedVariable { span, .. }
                | RuntimeError::UndefinedFunction { span, .. }
                | RuntimeError::MissingMember { span, .. }
                | RuntimeError::NullReceiver { span, .. }
                | RuntimeError::MemberNotSupported { span, .. }
                | RuntimeError::IndexOutOfBounds { span, .. }
                | RuntimeError::NotIndexable { span, .. }
                | RuntimeError::NotIterable { span, .. }
                | RuntimeError::UnknownParameter { span, .. }
                | RuntimeError::TooManyArguments { span, .. }
                | RuntimeError::ConstantReassigned { span, .. }
                | RuntimeError::NotAssignable { span }
                | RuntimeError::LoopFlowOutsideLoop { span, .. }
                | RuntimeError::External { span, .. } => *span,
            },
            EvalError::Limit(e) => match e {
                LimitError::CallDepth { span, .. }
                | LimitError::ScopeDepth { span, .. }
                | LimitError::ParameterCount { span, .. }
                | LimitError::StringLength { span, .. } => *span,
            },
            EvalError::Fail(e) => e.span,
        }
    }
}

/// Any error from any phase, tagged with the script name.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptErrorKind {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

impl ScriptErrorKind {
    pub fn span(&self) -> Span {
        match self {
            ScriptErrorKind::Lex(e) => e.span(),
            ScriptErrorKind::Syntax(e) => e.span(),
            ScriptErrorKind::Eval(e) => e.span(),
        }
    }
}

/// A diagnostic: script name, position, and message.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub script: String,
    pub kind: ScriptErrorKind,
}

impl ScriptError {
    pub fn new(script: impl Into<String>, kind: impl Into<ScriptErrorKind>) -> Self {
        Self { script: script.into(), kind: kind.into() }
    }

    pub fn span(&self) -> Span {
        self.kind.span()
    }

    pub fn line(&self) -> u32 {
        self.span().line
    }

    pub fn column(&self) -> u32 {
        self.span().column
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.script, self.line(), self.column(), self.kind)
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
