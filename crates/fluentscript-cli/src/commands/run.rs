//! `fluent run` — evaluate a script file.

use anyhow::Context;
use fluentscript_runtime::{Interpreter, Value};
use std::fs;

use crate::diagnostics;

pub fn execute(file: &str) -> anyhow::Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("cannot read {}", file))?;

    let mut interpreter = Interpreter::new(file);
    register_builtins(&mut interpreter);

    match interpreter.run(&source) {
        Ok(value) => {
            if !value.is_null() {
                println!("{}", value);
            }
            Ok(())
        }
        Err(error) => {
            diagnostics::report(file, &source, &error)?;
            std::process::exit(1);
        }
    }
}

fn register_builtins(interpreter: &mut Interpreter) {
    interpreter.externals_mut().register_fn("print", |args| {
        let rendered: Vec<String> = args.iter().map(Value::to_string).collect();
        println!("{}", rendered.join(" "));
        Ok(Value::Null)
    });
}
