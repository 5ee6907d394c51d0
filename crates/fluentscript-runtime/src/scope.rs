//! Lexical scope stack.
//!
//! Scopes push and pop strictly LIFO with block structure. Lookup walks from
//! the innermost scope outward; assignment writes to the scope where the name
//! already lives, or declares in the current scope.

use crate::value::Value;
use rustc_hash::FxHashMap;

/// A binding in a scope.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable(Value),
    Constant(Value),
    /// Module namespace: member name to value.
    Module(FxHashMap<String, Value>),
}

impl Symbol {
    pub fn value(&self) -> Value {
        match self {
            Symbol::Variable(v) | Symbol::Constant(v) => v.clone(),
            Symbol::Module(members) => Value::Map(members.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    symbols: FxHashMap<String, Symbol>,
}

/// Outcome of an assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Assigned,
    Declared,
    ConstantViolation,
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: vec![Scope::default()] }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop(&mut self) {
        debug_assert!(self.scopes.len() > 1, "popped the global scope");
        self.scopes.pop();
    }

    /// Declare in the current scope, shadowing any outer binding.
    pub fn declare(&mut self, name: impl Into<String>, symbol: Symbol) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .symbols
            .insert(name.into(), symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.symbols.get_mut(name))
    }

    /// Assign to an existing binding, or declare a new variable in the
    /// current scope. Constants reject reassignment.
    pub fn assign(&mut self, name: &str, value: Value) -> AssignOutcome {
        for scope in self.scopes.iter_mut().rev() {
            match scope.symbols.get_mut(name) {
                Some(Symbol::Variable(slot)) => {
                    *slot = value;
                    return AssignOutcome::Assigned;
                }
                Some(Symbol::Constant(_)) | Some(Symbol::Module(_)) => {
                    return AssignOutcome::ConstantViolation;
                }
                None => {}
            }
        }
        self.declare(name, Symbol::Variable(value));
        AssignOutcome::Declared
    }

    /// Pop the current scope, returning its variable and constant bindings.
    /// Used by module declarations to turn a block into a namespace.
    pub fn pop_captured(&mut self) -> FxHashMap<String, Value> {
        debug_assert!(self.scopes.len() > 1, "popped the global scope");
        let scope = self.scopes.pop().unwrap_or_default();
        scope
            .symbols
            .into_iter()
            .filter_map(|(name, symbol)| match symbol {
                Symbol::Variable(v) | Symbol::Constant(v) => Some((name, v)),
                Symbol::Module(_) => None,
            })
            .collect()
    }

    /// Snapshot every visible variable and constant, innermost shadowing
    /// outermost. Used to capture a closure's environment at definition.
    pub fn capture(&self) -> FxHashMap<String, Value> {
        let mut captured = FxHashMap::default();
        for scope in &self.scopes {
            for (name, symbol) in &scope.symbols {
                if let Symbol::Variable(v) | Symbol::Constant(v) = symbol {
                    captured.insert(name.clone(), v.clone());
                }
            }
        }
        captured
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_and_pops() {
        let mut scopes = ScopeStack::new();
        scopes.declare("x", Symbol::Variable(Value::Number(1.0)));
        scopes.push();
        scopes.declare("x", Symbol::Variable(Value::Number(2.0)));
        match scopes.lookup("x") {
            Some(Symbol::Variable(Value::Number(n))) => assert_eq!(*n, 2.0),
            other => panic!("unexpected symbol: {:?}", other),
        }
        scopes.pop();
        match scopes.lookup("x") {
            Some(Symbol::Variable(Value::Number(n))) => assert_eq!(*n, 1.0),
            other => panic!("unexpected symbol: {:?}", other),
        }
    }

    #[test]
    fn assignment_writes_through_to_outer_scope() {
        let mut scopes = ScopeStack::new();
        scopes.declare("count", Symbol::Variable(Value::Number(0.0)));
        scopes.push();
        assert_eq!(scopes.assign("count", Value::Number(5.0)), AssignOutcome::Assigned);
        scopes.pop();
        match scopes.lookup("count") {
            Some(Symbol::Variable(Value::Number(n))) => assert_eq!(*n, 5.0),
            other => panic!("unexpected symbol: {:?}", other),
        }
    }

    #[test]
    fn constants_reject_reassignment() {
        let mut scopes = ScopeStack::new();
        scopes.declare("pi", Symbol::Constant(Value::Number(3.14)));
        assert_eq!(scopes.assign("pi", Value::Number(3.0)), AssignOutcome::ConstantViolation);
    }
}
