//! The FluentScript runtime value family.
//!
//! Values form a tagged, recursive, owned tree: Array and Map payloads own
//! their element values, and nothing points back up, so no reference cycles
//! can be constructed. Every value carries its type tag; operators and
//! conversions dispatch on the tag and nothing else.

use crate::external::HostObject;
use chrono::{NaiveDateTime, NaiveTime, Weekday};
use fluentscript_parser::ast::FunctionDecl;
use rustc_hash::FxHashMap;
use std::fmt;
use std::rc::Rc;

/// Type tag for a runtime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    Str,
    Date,
    Time,
    Day,
    Unit,
    Array,
    Map,
    Function,
    Host,
}

impl ValueKind {
    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Str => "string",
            ValueKind::Date => "date",
            ValueKind::Time => "time",
            ValueKind::Day => "day_of_week",
            ValueKind::Unit => "unit",
            ValueKind::Array => "array",
            ValueKind::Map => "map",
            ValueKind::Function => "function",
            ValueKind::Host => "host_object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit-bearing quantity. `value` is what the user sees in `subgroup`
/// units; `base` is the same quantity in the group's base unit (inches for
/// length, ounces for weight, bytes for storage); `scale` is the number of
/// base units in one `subgroup` unit, carried from the units table at
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitValue {
    pub value: f64,
    pub base: f64,
    pub scale: f64,
    pub group: String,
    pub subgroup: String,
}

/// A script function value: the declaration plus bindings captured at the
/// definition site.
#[derive(Debug)]
pub struct ScriptFunction {
    pub decl: Rc<FunctionDecl>,
    pub captured: FxHashMap<String, Value>,
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Date(NaiveDateTime),
    Time(NaiveTime),
    Day(Weekday),
    Unit(UnitValue),
    Array(Vec<Value>),
    Map(FxHashMap<String, Value>),
    Function(Rc<ScriptFunction>),
    Host(Rc<dyn HostObject>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Str(_) => ValueKind::Str,
            Value::Date(_) => ValueKind::Date,
            Value::Time(_) => ValueKind::Time,
            Value::Day(_) => ValueKind::Day,
            Value::Unit(_) => ValueKind::Unit,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::Function(_) => ValueKind::Function,
            Value::Host(_) => ValueKind::Host,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Day-of-week ordinal, Monday = 1 through Sunday = 7.
    pub fn day_ordinal(day: Weekday) -> f64 {
        day.number_from_monday() as f64
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Day(a), Value::Day(b)) => a == b,
            (Value::Unit(a), Value::Unit(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Host(a), Value::Host(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Render a number the way scripts expect: no trailing `.0` on integers.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%-m/%-d/%Y")),
            Value::Time(t) => write!(f, "{}", t.format("%-H:%M:%S")),
            Value::Day(d) => write!(f, "{:?}", d),
            Value::Unit(u) => write!(f, "{} {}", format_number(u.value), u.subgroup),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, entries[*key])?;
                }
                f.write_str("}")
            }
            Value::Function(func) => write!(f, "<func {}>", func.decl.name),
            Value::Host(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}
