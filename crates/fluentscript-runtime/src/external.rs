//! Host interop: external functions, host types, and host objects.
//!
//! Host code returns `Result<_, String>`; the evaluator wraps failures with
//! the call site's span. Member handles carry closures that already bind
//! their receiver, so the runtime invokes them without threading the object
//! back through.

use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

use crate::call::ParamMetadata;
use crate::value::Value;

/// A host function callable from scripts.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, String>>;

/// Property read on a host member. The receiver is captured in the closure.
pub type GetterFn = Rc<dyn Fn() -> Result<Value, String>>;

/// Property write on a host member.
pub type SetterFn = Rc<dyn Fn(Value) -> Result<(), String>>;

/// What a resolved member is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Method,
}

/// A member surfaced by a host type or object. Unsupported operations leave
/// the corresponding slot `None`.
#[derive(Clone)]
pub struct MemberHandle {
    pub kind: MemberKind,
    pub is_static: bool,
    /// Type name that owns the member, for diagnostics.
    pub owner: String,
    pub get: Option<GetterFn>,
    pub set: Option<SetterFn>,
    pub invoke: Option<NativeFn>,
}

impl MemberHandle {
    pub fn property(owner: impl Into<String>, get: GetterFn, set: Option<SetterFn>) -> Self {
        Self { kind: MemberKind::Property, is_static: false, owner: owner.into(), get: Some(get), set, invoke: None }
    }

    pub fn method(owner: impl Into<String>, invoke: NativeFn) -> Self {
        Self { kind: MemberKind::Method, is_static: false, owner: owner.into(), get: None, set: None, invoke: Some(invoke) }
    }

    pub fn static_method(owner: impl Into<String>, invoke: NativeFn) -> Self {
        Self { is_static: true, ..Self::method(owner, invoke) }
    }
}

impl fmt::Debug for MemberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberHandle")
            .field("kind", &self.kind)
            .field("is_static", &self.is_static)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

/// A host-provided object instance.
///
/// `get_member` resolves case-sensitively; the runtime retries with a
/// case-insensitive pass so scripts can write `account.Balance` or
/// `account.balance` interchangeably.
pub trait HostObject: fmt::Debug {
    fn type_name(&self) -> &str;
    fn get_member(self: Rc<Self>, name: &str) -> Option<MemberHandle>;
    /// All member names, for the case-insensitive retry.
    fn member_names(&self) -> Vec<String>;
}

/// A host-provided type: static members reachable by type name.
pub trait HostType {
    fn name(&self) -> &str;
    fn static_member(&self, name: &str) -> Option<MemberHandle>;
}

/// A host function registration.
pub struct ExternalFunction {
    pub name: String,
    /// Wildcard functions receive `[text, parts, args]` like script-side
    /// wildcard functions.
    pub wildcard: bool,
    /// Declared parameter shape, when the host wants named-argument binding.
    pub params: Option<ParamMetadata>,
    pub func: NativeFn,
}

impl fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("name", &self.name)
            .field("wildcard", &self.wildcard)
            .finish_non_exhaustive()
    }
}

/// Everything the host has plugged into an interpreter instance.
#[derive(Debug, Default)]
pub struct ExternalRegistry {
    functions: FxHashMap<String, Rc<ExternalFunction>>,
    types: FxHashMap<String, Rc<dyn HostType>>,
}

impl fmt::Debug for dyn HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<host type {}>", self.name())
    }
}

impl ExternalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain external function. Multi-word names use spaces, the
    /// same spelling scripts call them by.
    pub fn register_fn<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + 'static,
    {
        self.functions.insert(
            name.to_string(),
            Rc::new(ExternalFunction {
                name: name.to_string(),
                wildcard: false,
                params: None,
                func: Rc::new(func),
            }),
        );
    }

    pub fn register(&mut self, function: ExternalFunction) {
        self.functions.insert(function.name.clone(), Rc::new(function));
    }

    pub fn register_type(&mut self, host_type: Rc<dyn HostType>) {
        self.types.insert(host_type.name().to_string(), host_type);
    }

    pub fn function(&self, name: &str) -> Option<&Rc<ExternalFunction>> {
        self.functions.get(name)
    }

    pub fn host_type(&self, name: &str) -> Option<&Rc<dyn HostType>> {
        self.types.get(name)
    }

    /// Names the parser should treat as known external functions.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}
