//! Member and method resolution.
//!
//! Resolution order for `receiver.member`:
//!   1. an external function registered as `"{type} {member}"`,
//!   2. the intrinsic member table for the receiver's kind,
//!   3. for host objects, reflection through the object itself, retried
//!      case-insensitively.
//!
//! When the receiver is a bare identifier with no binding in scope, the
//! evaluator first tries [`resolve_static_member`], which reaches static
//! members of registered host types by type name.
//!
//! Intrinsic members are pure: they never mutate the receiver, they return
//! the result. Host member handles bind their own receiver.

use std::rc::Rc;

use crate::external::{ExternalFunction, ExternalRegistry, MemberHandle, MemberKind};
use crate::value::{format_number, Value, ValueKind};
use chrono::{Datelike, Timelike};

/// An intrinsic member of a builtin value kind.
pub struct BuiltinMember {
    pub name: &'static str,
    pub kind: MemberKind,
    pub call: fn(&Value, &[Value]) -> Result<Value, String>,
}

/// How a resolved member is carried out.
#[derive(Clone)]
pub enum MemberBinding {
    External(Rc<ExternalFunction>),
    Handle(MemberHandle),
    Builtin(&'static BuiltinMember),
}

/// The outcome of member resolution.
#[derive(Clone)]
pub struct ResolvedMember {
    pub owner: String,
    pub kind: MemberKind,
    pub binding: MemberBinding,
}

/// Resolve a member on a receiver value. `None` means no such member; the
/// evaluator raises the missing-member error with the access span.
pub fn resolve_member(
    externals: &ExternalRegistry,
    receiver: &Value,
    name: &str,
) -> Option<ResolvedMember> {
    let type_name = receiver.kind().name();

    // 1. External function spelled "{type} {member}".
    let qualified = format!("{} {}", type_name, name);
    if let Some(func) = externals.function(&qualified) {
        return Some(ResolvedMember {
            owner: type_name.to_string(),
            kind: MemberKind::Method,
            binding: MemberBinding::External(Rc::clone(func)),
        });
    }

    // 2. Intrinsic table for the receiver's kind.
    if let Some(member) = builtin_member(receiver.kind(), name) {
        return Some(ResolvedMember {
            owner: type_name.to_string(),
            kind: member.kind,
            binding: MemberBinding::Builtin(member),
        });
    }

    // 3. Host object reflection, case-insensitive on retry.
    if let Value::Host(obj) = receiver {
        if let Some(handle) = Rc::clone(obj).get_member(name) {
            return Some(ResolvedMember {
                owner: obj.type_name().to_string(),
                kind: handle.kind,
                binding: MemberBinding::Handle(handle),
            });
        }
        let lowered = name.to_lowercase();
        let actual = obj
            .member_names()
            .into_iter()
            .find(|candidate| candidate.to_lowercase() == lowered)?;
        let handle = Rc::clone(obj).get_member(&actual)?;
        return Some(ResolvedMember {
            owner: obj.type_name().to_string(),
            kind: handle.kind,
            binding: MemberBinding::Handle(handle),
        });
    }

    None
}

/// Resolve a static member on a registered host type. The spelling is tried
/// exactly, then with its first letter capitalized, so `math.pi` reaches a
/// type registered as `Math`.
pub fn resolve_static_member(
    externals: &ExternalRegistry,
    type_name: &str,
    name: &str,
) -> Option<ResolvedMember> {
    let capitalized = capitalize(type_name);
    for candidate in [type_name, capitalized.as_str()] {
        if let Some(host_type) = externals.host_type(candidate) {
            if let Some(handle) = host_type.static_member(name) {
                return Some(ResolvedMember {
                    owner: candidate.to_string(),
                    kind: handle.kind,
                    binding: MemberBinding::Handle(handle),
                });
            }
        }
    }
    None
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn builtin_member(kind: ValueKind, name: &str) -> Option<&'static BuiltinMember> {
    let table: &'static [BuiltinMember] = match kind {
        ValueKind::Str => STR_MEMBERS,
        ValueKind::Array => ARRAY_MEMBERS,
        ValueKind::Map => MAP_MEMBERS,
        ValueKind::Date => DATE_MEMBERS,
        ValueKind::Time => TIME_MEMBERS,
        ValueKind::Number => NUMBER_MEMBERS,
        _ => return None,
    };
    table.iter().find(|member| member.name == name)
}

fn expect_str(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| format!("expected a string, got {}", value.kind()))
}

fn arg_str<'a>(args: &'a [Value], index: usize, member: &str) -> Result<&'a str, String> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("'{}' expects a string argument", member))
}

fn arg_number(args: &[Value], index: usize, member: &str) -> Result<f64, String> {
    args.get(index)
        .and_then(Value::as_number)
        .ok_or_else(|| format!("'{}' expects a number argument", member))
}

static STR_MEMBERS: &[BuiltinMember] = &[
    BuiltinMember {
        name: "length",
        kind: MemberKind::Property,
        call: |recv, _| Ok(Value::Number(expect_str(recv)?.chars().count() as f64)),
    },
    BuiltinMember {
        name: "upper",
        kind: MemberKind::Method,
        call: |recv, _| Ok(Value::Str(expect_str(recv)?.to_uppercase())),
    },
    BuiltinMember {
        name: "lower",
        kind: MemberKind::Method,
        call: |recv, _| Ok(Value::Str(expect_str(recv)?.to_lowercase())),
    },
    BuiltinMember {
        name: "trim",
        kind: MemberKind::Method,
        call: |recv, _| Ok(Value::Str(expect_str(recv)?.trim().to_string())),
    },
    BuiltinMember {
        name: "contains",
        kind: MemberKind::Method,
        call: |recv, args| {
            Ok(Value::Bool(expect_str(recv)?.contains(arg_str(args, 0, "contains")?)))
        },
    },
    BuiltinMember {
        name: "starts_with",
        kind: MemberKind::Method,
        call: |recv, args| {
            Ok(Value::Bool(expect_str(recv)?.starts_with(arg_str(args, 0, "starts_with")?)))
        },
    },
    BuiltinMember {
        name: "ends_with",
        kind: MemberKind::Method,
        call: |recv, args| {
            Ok(Value::Bool(expect_str(recv)?.ends_with(arg_str(args, 0, "ends_with")?)))
        },
    },
    BuiltinMember {
        name: "replace",
        kind: MemberKind::Method,
        call: |recv, args| {
            let from = arg_str(args, 0, "replace")?;
            let to = arg_str(args, 1, "replace")?;
            Ok(Value::Str(expect_str(recv)?.replace(from, to)))
        },
    },
    BuiltinMember {
        name: "split",
        kind: MemberKind::Method,
        call: |recv, args| {
            let sep = arg_str(args, 0, "split")?;
            let parts = expect_str(recv)?
                .split(sep)
                .map(|part| Value::Str(part.to_string()))
                .collect();
            Ok(Value::Array(parts))
        },
    },
    BuiltinMember {
        name: "index_of",
        kind: MemberKind::Method,
        call: |recv, args| {
            let needle = arg_str(args, 0, "index_of")?;
            match expect_str(recv)?.find(needle) {
                Some(at) => Ok(Value::Number(at as f64)),
                None => Ok(Value::Number(-1.0)),
            }
        },
    },
];

static ARRAY_MEMBERS: &[BuiltinMember] = &[
    BuiltinMember {
        name: "length",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Array(items) => Ok(Value::Number(items.len() as f64)),
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "first",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Array(items) => Ok(items.first().cloned().unwrap_or(Value::Null)),
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "last",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Array(items) => Ok(items.last().cloned().unwrap_or(Value::Null)),
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "contains",
        kind: MemberKind::Method,
        call: |recv, args| match recv {
            Value::Array(items) => {
                let needle = args.first().cloned().unwrap_or(Value::Null);
                Ok(Value::Bool(items.contains(&needle)))
            }
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "index_of",
        kind: MemberKind::Method,
        call: |recv, args| match recv {
            Value::Array(items) => {
                let needle = args.first().cloned().unwrap_or(Value::Null);
                match items.iter().position(|item| *item == needle) {
                    Some(at) => Ok(Value::Number(at as f64)),
                    None => Ok(Value::Number(-1.0)),
                }
            }
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "join",
        kind: MemberKind::Method,
        call: |recv, args| match recv {
            Value::Array(items) => {
                let sep = arg_str(args, 0, "join")?;
                let rendered: Vec<String> = items.iter().map(|item| item.to_string()).collect();
                Ok(Value::Str(rendered.join(sep)))
            }
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "reverse",
        kind: MemberKind::Method,
        call: |recv, _| match recv {
            Value::Array(items) => {
                let mut reversed = items.clone();
                reversed.reverse();
                Ok(Value::Array(reversed))
            }
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "append",
        kind: MemberKind::Method,
        call: |recv, args| match recv {
            Value::Array(items) => {
                let mut extended = items.clone();
                extended.extend(args.iter().cloned());
                Ok(Value::Array(extended))
            }
            other => Err(format!("expected an array, got {}", other.kind())),
        },
    },
];

static MAP_MEMBERS: &[BuiltinMember] = &[
    BuiltinMember {
        name: "length",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Map(entries) => Ok(Value::Number(entries.len() as f64)),
            other => Err(format!("expected a map, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "keys",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Map(entries) => {
                let mut keys: Vec<String> = entries.keys().cloned().collect();
                keys.sort();
                Ok(Value::Array(keys.into_iter().map(Value::Str).collect()))
            }
            other => Err(format!("expected a map, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "values",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Map(entries) => {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                Ok(Value::Array(keys.into_iter().map(|k| entries[k].clone()).collect()))
            }
            other => Err(format!("expected a map, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "has",
        kind: MemberKind::Method,
        call: |recv, args| match recv {
            Value::Map(entries) => {
                let key = arg_str(args, 0, "has")?;
                Ok(Value::Bool(entries.contains_key(key)))
            }
            other => Err(format!("expected a map, got {}", other.kind())),
        },
    },
];

static DATE_MEMBERS: &[BuiltinMember] = &[
    BuiltinMember {
        name: "year",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Date(d) => Ok(Value::Number(d.year() as f64)),
            other => Err(format!("expected a date, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "month",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Date(d) => Ok(Value::Number(d.month() as f64)),
            other => Err(format!("expected a date, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "day",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Date(d) => Ok(Value::Number(d.day() as f64)),
            other => Err(format!("expected a date, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "weekday",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Date(d) => Ok(Value::Day(d.weekday())),
            other => Err(format!("expected a date, got {}", other.kind())),
        },
    },
];

static TIME_MEMBERS: &[BuiltinMember] = &[
    BuiltinMember {
        name: "hour",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Time(t) => Ok(Value::Number(t.hour() as f64)),
            other => Err(format!("expected a time, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "minute",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Time(t) => Ok(Value::Number(t.minute() as f64)),
            other => Err(format!("expected a time, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "second",
        kind: MemberKind::Property,
        call: |recv, _| match recv {
            Value::Time(t) => Ok(Value::Number(t.second() as f64)),
            other => Err(format!("expected a time, got {}", other.kind())),
        },
    },
];

static NUMBER_MEMBERS: &[BuiltinMember] = &[
    BuiltinMember {
        name: "abs",
        kind: MemberKind::Method,
        call: |recv, _| match recv {
            Value::Number(n) => Ok(Value::Number(n.abs())),
            other => Err(format!("expected a number, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "round",
        kind: MemberKind::Method,
        call: |recv, _| match recv {
            Value::Number(n) => Ok(Value::Number(n.round())),
            other => Err(format!("expected a number, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "floor",
        kind: MemberKind::Method,
        call: |recv, _| match recv {
            Value::Number(n) => Ok(Value::Number(n.floor())),
            other => Err(format!("expected a number, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "ceil",
        kind: MemberKind::Method,
        call: |recv, _| match recv {
            Value::Number(n) => Ok(Value::Number(n.ceil())),
            other => Err(format!("expected a number, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "pow",
        kind: MemberKind::Method,
        call: |recv, args| match recv {
            Value::Number(n) => Ok(Value::Number(n.powf(arg_number(args, 0, "pow")?))),
            other => Err(format!("expected a number, got {}", other.kind())),
        },
    },
    BuiltinMember {
        name: "format",
        kind: MemberKind::Method,
        call: |recv, _| match recv {
            Value::Number(n) => Ok(Value::Str(format_number(*n))),
            other => Err(format!("expected a number, got {}", other.kind())),
        },
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_length_is_a_property() {
        let externals = ExternalRegistry::new();
        let recv = Value::Str("hello".into());
        let resolved = resolve_member(&externals, &recv, "length").unwrap();
        assert_eq!(resolved.kind, MemberKind::Property);
        match resolved.binding {
            MemberBinding::Builtin(member) => {
                assert_eq!((member.call)(&recv, &[]).unwrap(), Value::Number(5.0));
            }
            _ => panic!("expected an intrinsic binding"),
        }
    }

    #[test]
    fn external_function_shadows_intrinsic() {
        let mut externals = ExternalRegistry::new();
        externals.register_fn("string length", |_| Ok(Value::Number(99.0)));
        let resolved = resolve_member(&externals, &Value::Str("x".into()), "length").unwrap();
        match resolved.binding {
            MemberBinding::External(func) => assert_eq!(func.name, "string length"),
            _ => panic!("expected the external binding to win"),
        }
    }

    #[test]
    fn unknown_member_is_none() {
        let externals = ExternalRegistry::new();
        assert!(resolve_member(&externals, &Value::Number(1.0), "frobnicate").is_none());
    }

    #[test]
    fn static_lookup_tries_exact_spelling_then_capitalized() {
        use crate::external::{GetterFn, HostType};

        struct MathType;
        impl HostType for MathType {
            fn name(&self) -> &str {
                "Math"
            }
            fn static_member(&self, name: &str) -> Option<MemberHandle> {
                if name != "pi" {
                    return None;
                }
                let get: GetterFn = Rc::new(|| Ok(Value::Number(3.14159)));
                Some(MemberHandle::property("Math", get, None))
            }
        }

        let mut externals = ExternalRegistry::new();
        externals.register_type(Rc::new(MathType));

        for spelling in ["Math", "math"] {
            let resolved = resolve_static_member(&externals, spelling, "pi").unwrap();
            assert_eq!(resolved.owner, "Math");
            assert_eq!(resolved.kind, MemberKind::Property);
        }
        assert!(resolve_static_member(&externals, "Math", "tau").is_none());
        assert!(resolve_static_member(&externals, "Mathx", "pi").is_none());
    }
}
