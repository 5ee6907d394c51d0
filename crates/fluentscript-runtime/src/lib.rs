//! FluentScript runtime: dynamic values, conversion matrix, member
//! resolution, host interop, and the tree-walking evaluator.

pub mod call;
pub mod convert;
pub mod error;
pub mod external;
pub mod interpreter;
pub mod limits;
pub mod member;
pub mod ops;
pub mod scope;
pub mod units;
pub mod value;

pub use convert::ConversionTable;
pub use error::{
    EvalError, LimitError, RuntimeError, ScriptError, ScriptErrorKind, ScriptFail, TypeError,
};
pub use external::{
    ExternalFunction, ExternalRegistry, HostObject, HostType, MemberHandle, MemberKind, NativeFn,
};
pub use interpreter::{Flow, Interpreter};
pub use limits::Limits;
pub use units::UnitsTable;
pub use value::{ScriptFunction, UnitValue, Value, ValueKind};
