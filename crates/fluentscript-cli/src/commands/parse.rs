//! `fluent parse` — print the syntax tree.

use anyhow::Context;
use fluentscript_parser::Parser;
use fluentscript_runtime::ScriptError;
use std::fs;

use crate::diagnostics;

pub fn execute(file: &str) -> anyhow::Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("cannot read {}", file))?;

    match Parser::new(&source).parse() {
        Ok(script) => {
            println!("{:#?}", script);
            Ok(())
        }
        Err(error) => {
            let error = ScriptError::new(file, error);
            diagnostics::report(file, &source, &error)?;
            std::process::exit(1);
        }
    }
}
