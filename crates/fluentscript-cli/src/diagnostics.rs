//! Error rendering with source context.

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use fluentscript_runtime::ScriptError;
use termcolor::{ColorChoice, StandardStream};

/// Print a script error as a labeled diagnostic against its source.
pub fn report(name: &str, source: &str, error: &ScriptError) -> anyhow::Result<()> {
    let file = SimpleFile::new(name, source);
    let span = error.span();
    let start = span.start.min(source.len());
    let end = span.end.clamp(start, source.len());

    let diagnostic = Diagnostic::error()
        .with_message(error.kind.to_string())
        .with_labels(vec![Label::primary((), start..end)]);

    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();
    term::emit(&mut writer.lock(), &config, &file, &diagnostic)?;
    Ok(())
}
