//! `fluent tokens` — dump the token stream.

use anyhow::Context;
use fluentscript_parser::{Lexer, Token, TokenValue};
use fluentscript_runtime::ScriptError;
use serde_json::json;
use std::fs;

use crate::diagnostics;

pub fn execute(file: &str, as_json: bool) -> anyhow::Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("cannot read {}", file))?;

    let mut lexer = Lexer::new(&source);
    let mut tokens = Vec::new();
    loop {
        match lexer.next_token() {
            Ok(token) => {
                let eof = token.is_eof();
                tokens.push(token);
                if eof {
                    break;
                }
            }
            Err(error) => {
                let error = ScriptError::new(file, error);
                diagnostics::report(file, &source, &error)?;
                std::process::exit(1);
            }
        }
    }

    for token in &tokens {
        if as_json {
            println!("{}", render_json(token));
        } else {
            println!(
                "{:>4}:{:<3} {:<12} {:?}",
                token.span.line,
                token.span.column,
                token.kind.to_string(),
                token.text
            );
        }
    }
    Ok(())
}

fn render_json(token: &Token) -> serde_json::Value {
    let value = match &token.value {
        TokenValue::None => serde_json::Value::Null,
        TokenValue::Number(n) => json!(n),
        TokenValue::Str(s) => json!(s),
        TokenValue::Date(d) => json!(d.to_string()),
        TokenValue::Time(t) => json!(t.to_string()),
    };
    json!({
        "kind": token.kind,
        "text": token.text,
        "value": value,
        "span": token.span,
    })
}
