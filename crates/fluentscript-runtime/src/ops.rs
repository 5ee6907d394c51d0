//! Per-type-pair operator evaluation tables.
//!
//! Operators are defined for declared pairs only; an undeclared pair is a
//! type error, never a silent coercion. The declared cross-kind pairs are
//! `string +` over the stringifiable scalar kinds (the right operand is
//! rendered with its display form), unit arithmetic (both operands reduced
//! to the group's base value), day-of-week comparison by ordinal, and
//! date/time offsets. Errors here are span-free; the evaluator attaches the
//! node span.

use crate::limits::Limits;
use crate::value::{UnitValue, Value, ValueKind};
use fluentscript_parser::ast::{BinaryOp, CompareOp, UnaryOp};
use std::cmp::Ordering;

/// Span-free operator failure, mapped to `TypeError`/`LimitError` by the
/// evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum OpError {
    InvalidOperands { op: String, left: &'static str, right: &'static str },
    UnitGroupMismatch { left: String, right: String },
    StringLength { limit: usize },
}

fn invalid(op: impl Into<String>, left: &Value, right: &Value) -> OpError {
    OpError::InvalidOperands {
        op: op.into(),
        left: left.kind().name(),
        right: right.kind().name(),
    }
}

/// Evaluate an arithmetic operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value, limits: &Limits) -> Result<Value, OpError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(number_op(op, *a, *b))),

        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
            if a.len() + b.len() > limits.max_string_len {
                return Err(OpError::StringLength { limit: limits.max_string_len });
            }
            let mut out = String::with_capacity(a.len() + b.len());
            out.push_str(a);
            out.push_str(b);
            Ok(Value::Str(out))
        }

        // String + anything stringifiable concatenates through Display.
        (Value::Str(a), b) if op == BinaryOp::Add && concatenable(b) => {
            let rendered = b.to_string();
            if a.len() + rendered.len() > limits.max_string_len {
                return Err(OpError::StringLength { limit: limits.max_string_len });
            }
            Ok(Value::Str(format!("{}{}", a, rendered)))
        }

        (Value::Unit(a), Value::Unit(b)) => unit_arith(op, a, b, left, right),

        // Date - Date yields the difference in days.
        (Value::Date(a), Value::Date(b)) if op == BinaryOp::Sub => {
            let days = (*a - *b).num_seconds() as f64 / 86_400.0;
            Ok(Value::Number(days))
        }

        // Time - Time yields the difference in seconds.
        (Value::Time(a), Value::Time(b)) if op == BinaryOp::Sub => {
            Ok(Value::Number((*a - *b).num_seconds() as f64))
        }

        // Date + Number / Date - Number shift by whole days.
        (Value::Date(a), Value::Number(n)) if matches!(op, BinaryOp::Add | BinaryOp::Sub) => {
            let seconds = (n * 86_400.0) as i64;
            let delta = chrono::Duration::seconds(if op == BinaryOp::Sub { -seconds } else { seconds });
            Ok(Value::Date(*a + delta))
        }

        _ => Err(invalid(op.as_str(), left, right)),
    }
}

fn concatenable(v: &Value) -> bool {
    matches!(
        v.kind(),
        ValueKind::Number | ValueKind::Bool | ValueKind::Date | ValueKind::Time | ValueKind::Day | ValueKind::Unit
    )
}

fn number_op(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
    }
}

/// Unit arithmetic happens on base values; the result keeps the left
/// operand's group and subgroup, re-expressed in that subgroup's scale.
fn unit_arith(
    op: BinaryOp,
    a: &UnitValue,
    b: &UnitValue,
    left: &Value,
    right: &Value,
) -> Result<Value, OpError> {
    if a.group != b.group {
        return Err(OpError::UnitGroupMismatch { left: a.group.clone(), right: b.group.clone() });
    }
    let base = match op {
        BinaryOp::Add => a.base + b.base,
        BinaryOp::Sub => a.base - b.base,
        _ => return Err(invalid(op.as_str(), left, right)),
    };
    Ok(Value::Unit(UnitValue {
        value: base / a.scale,
        base,
        scale: a.scale,
        group: a.group.clone(),
        subgroup: a.subgroup.clone(),
    }))
}

/// Evaluate a comparison operator.
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<Value, OpError> {
    // Null equality short-circuits on the type tags alone; the other
    // operand's payload is never inspected.
    if left.is_null() || right.is_null() {
        return match op {
            CompareOp::Eq => Ok(Value::Bool(left.is_null() && right.is_null())),
            CompareOp::NotEq => Ok(Value::Bool(!(left.is_null() && right.is_null()))),
            _ => Err(invalid(op.as_str(), left, right)),
        };
    }

    match (left, right) {
        (Value::Number(a), Value::Number(b)) => ordered(op, a.partial_cmp(b), left, right),

        (Value::Str(a), Value::Str(b)) => match op {
            // Equality is exact, ordering is case-insensitive. The asymmetry
            // is deliberate and load-bearing.
            CompareOp::Eq => Ok(Value::Bool(a == b)),
            CompareOp::NotEq => Ok(Value::Bool(a != b)),
            _ => ordered(op, Some(a.to_lowercase().cmp(&b.to_lowercase())), left, right),
        },

        (Value::Bool(a), Value::Bool(b)) => match op {
            CompareOp::Eq => Ok(Value::Bool(a == b)),
            CompareOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(invalid(op.as_str(), left, right)),
        },

        (Value::Date(a), Value::Date(b)) => ordered(op, a.partial_cmp(b), left, right),
        (Value::Time(a), Value::Time(b)) => ordered(op, a.partial_cmp(b), left, right),

        // Day-of-week normalizes to its ordinal, against another day or
        // against a plain number.
        (Value::Day(a), Value::Day(b)) => {
            let (a, b) = (Value::day_ordinal(*a), Value::day_ordinal(*b));
            ordered(op, a.partial_cmp(&b), left, right)
        }
        (Value::Day(a), Value::Number(b)) => {
            let a = Value::day_ordinal(*a);
            ordered(op, a.partial_cmp(b), left, right)
        }
        (Value::Number(a), Value::Day(b)) => {
            let b = Value::day_ordinal(*b);
            ordered(op, a.partial_cmp(&b), left, right)
        }

        // Units in the same group compare by base value.
        (Value::Unit(a), Value::Unit(b)) => {
            if a.group != b.group {
                return Err(OpError::UnitGroupMismatch {
                    left: a.group.clone(),
                    right: b.group.clone(),
                });
            }
            ordered(op, a.base.partial_cmp(&b.base), left, right)
        }

        (Value::Array(a), Value::Array(b)) => match op {
            CompareOp::Eq => Ok(Value::Bool(a == b)),
            CompareOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(invalid(op.as_str(), left, right)),
        },
        (Value::Map(a), Value::Map(b)) => match op {
            CompareOp::Eq => Ok(Value::Bool(a == b)),
            CompareOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(invalid(op.as_str(), left, right)),
        },

        _ => Err(invalid(op.as_str(), left, right)),
    }
}

fn ordered(
    op: CompareOp,
    ordering: Option<Ordering>,
    left: &Value,
    right: &Value,
) -> Result<Value, OpError> {
    let ordering = match ordering {
        Some(o) => o,
        None => return Ok(Value::Bool(matches!(op, CompareOp::NotEq))),
    };
    let result = match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::NotEq => ordering != Ordering::Equal,
        CompareOp::Less => ordering == Ordering::Less,
        CompareOp::LessEq => ordering != Ordering::Greater,
        CompareOp::Greater => ordering == Ordering::Greater,
        CompareOp::GreaterEq => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}

/// Evaluate a unary operator.
pub fn unary(op: UnaryOp, operand: &Value, truthy: bool) -> Result<Value, OpError> {
    match op {
        UnaryOp::Neg => match operand {
            Value::Number(n) => Ok(Value::Number(-n)),
            Value::Unit(u) => Ok(Value::Unit(UnitValue {
                value: -u.value,
                base: -u.base,
                scale: u.scale,
                group: u.group.clone(),
                subgroup: u.subgroup.clone(),
            })),
            _ => Err(OpError::InvalidOperands {
                op: "-".to_string(),
                left: operand.kind().name(),
                right: "nothing",
            }),
        },
        UnaryOp::Not => Ok(Value::Bool(!truthy)),
    }
}
