//! Configurable resource bounds, checked at the point of growth.

/// Evaluation limits. Each is enforced where the resource actually grows
/// (function call, scope push, argument collection, string concatenation) so
/// a runaway script raises a limit error instead of exhausting the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum recursive function-call depth.
    pub max_call_depth: usize,
    /// Maximum arguments in a single call.
    pub max_params: usize,
    /// Maximum nested scope entries.
    pub max_scope_depth: usize,
    /// Maximum string length produced by any single operation.
    pub max_string_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_params: 64,
            max_scope_depth: 256,
            max_string_len: 1 << 20,
        }
    }
}
