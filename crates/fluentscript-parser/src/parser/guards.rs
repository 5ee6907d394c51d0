//! Parser guards against runaway recursion and stuck loops.

use super::SyntaxError;
use crate::token::Span;

/// Maximum statement/expression nesting depth.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Maximum iterations for any parser loop.
const MAX_LOOP_ITERATIONS: usize = 100_000;

/// Iteration counter for parser loops. A loop that spins this many times
/// without finishing is stuck on a token it cannot consume.
pub struct LoopGuard {
    name: &'static str,
    count: usize,
}

impl LoopGuard {
    pub fn new(name: &'static str) -> Self {
        Self { name, count: 0 }
    }

    pub fn check(&mut self, span: Span) -> Result<(), SyntaxError> {
        self.count += 1;
        if self.count > MAX_LOOP_ITERATIONS {
            Err(SyntaxError::LimitExceeded {
                message: format!("parser loop '{}' exceeded {} iterations", self.name, MAX_LOOP_ITERATIONS),
                span,
            })
        } else {
            Ok(())
        }
    }
}
