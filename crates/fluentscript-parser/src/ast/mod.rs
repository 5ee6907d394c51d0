//! AST definitions for FluentScript.
//!
//! Nodes are a closed set of variants; each node owns its children and carries
//! a span for error reporting. Nodes are never mutated after construction.

pub mod expression;
pub mod statement;

pub use expression::*;
pub use statement::*;

use crate::token::Span;

/// A parsed script: the root of the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub statements: Vec<Statement>,
    pub span: Span,
}
