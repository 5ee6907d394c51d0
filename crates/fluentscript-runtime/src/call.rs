//! Call-site argument resolution.
//!
//! Positional arguments fill parameter slots left to right; named arguments
//! bind by parameter name or alias. The parser already rejects positional
//! arguments after named ones, so resolution here never has to interleave.
//! Slots left unfilled stay unset; the evaluator substitutes the declared
//! default, or `null` when there is none.

use fluentscript_parser::ast::{FunctionDecl, ParamDecl};
use fluentscript_parser::Span;
use rustc_hash::FxHashMap;
use std::rc::Rc;

use crate::value::Value;

/// An evaluated argument, with the name it was passed under (if any).
#[derive(Debug, Clone)]
pub struct ArgValue {
    pub name: Option<String>,
    pub value: Value,
    pub span: Span,
}

impl ArgValue {
    pub fn positional(value: Value, span: Span) -> Self {
        Self { name: None, value, span }
    }
}

/// Parameter shape of a callable, with a name-and-alias index for named
/// argument binding.
#[derive(Debug, Clone)]
pub struct ParamMetadata {
    params: Rc<Vec<ParamDecl>>,
    by_name: FxHashMap<String, usize>,
}

impl ParamMetadata {
    pub fn from_decl(decl: &FunctionDecl) -> Self {
        Self::new(Rc::new(decl.params.clone()))
    }

    pub fn new(params: Rc<Vec<ParamDecl>>) -> Self {
        let mut by_name = FxHashMap::default();
        for (index, param) in params.iter().enumerate() {
            by_name.insert(param.name.clone(), index);
            if let Some(alias) = &param.alias {
                by_name.insert(alias.clone(), index);
            }
        }
        Self { params, by_name }
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[ParamDecl] {
        &self.params
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// Failure to bind arguments to parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BindError {
    UnknownParameter { name: String, span: Span },
    TooManyArguments { expected: usize, got: usize, span: Span },
}

/// Bind arguments to parameter slots. Returns one `Option<Value>` per
/// declared parameter; `None` means the slot was not supplied.
pub fn resolve_arguments(
    meta: &ParamMetadata,
    args: Vec<ArgValue>,
) -> Result<Vec<Option<Value>>, BindError> {
    let mut slots: Vec<Option<Value>> = vec![None; meta.len()];
    let mut next_positional = 0usize;

    for arg in args {
        match arg.name {
            Some(name) => {
                let index = meta
                    .index_of(&name)
                    .ok_or(BindError::UnknownParameter { name, span: arg.span })?;
                slots[index] = Some(arg.value);
            }
            None => {
                if next_positional >= meta.len() {
                    return Err(BindError::TooManyArguments {
                        expected: meta.len(),
                        got: next_positional + 1,
                        span: arg.span,
                    });
                }
                slots[next_positional] = Some(arg.value);
                next_positional += 1;
            }
        }
    }

    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluentscript_parser::ast::ParamDecl;

    fn param(name: &str, alias: Option<&str>) -> ParamDecl {
        ParamDecl {
            name: name.to_string(),
            alias: alias.map(|a| a.to_string()),
            type_name: None,
            default: None,
            span: Span::default(),
        }
    }

    fn meta(params: Vec<ParamDecl>) -> ParamMetadata {
        ParamMetadata::new(Rc::new(params))
    }

    #[test]
    fn named_arguments_bind_by_name_and_alias() {
        let meta = meta(vec![param("amount", Some("qty")), param("item", None)]);
        let args = vec![
            ArgValue { name: Some("item".into()), value: Value::Str("widget".into()), span: Span::default() },
            ArgValue { name: Some("qty".into()), value: Value::Number(3.0), span: Span::default() },
        ];
        let slots = resolve_arguments(&meta, args).unwrap();
        assert_eq!(slots[0], Some(Value::Number(3.0)));
        assert_eq!(slots[1], Some(Value::Str("widget".into())));
    }

    #[test]
    fn positional_fills_left_to_right_leaving_rest_unset() {
        let meta = meta(vec![param("a", None), param("b", None), param("c", None)]);
        let args = vec![ArgValue::positional(Value::Number(1.0), Span::default())];
        let slots = resolve_arguments(&meta, args).unwrap();
        assert_eq!(slots, vec![Some(Value::Number(1.0)), None, None]);
    }

    #[test]
    fn unknown_named_parameter_is_rejected() {
        let meta = meta(vec![param("a", None)]);
        let args = vec![ArgValue {
            name: Some("bogus".into()),
            value: Value::Null,
            span: Span::default(),
        }];
        match resolve_arguments(&meta, args) {
            Err(BindError::UnknownParameter { name, .. }) => assert_eq!(name, "bogus"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
