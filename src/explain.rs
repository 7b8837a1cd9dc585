use crate::{
    fs::Corpus,
    selector::{FileCandidate, Rejection},
    utils::line_ranges,
};
use anyhow::Result;
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFile,
    term::{emit, termcolor::WriteColor, Config},
};
use std::ops::Range;

/// Byte range of the 0-based `line` in `src`, without the line terminator.
fn line_span(src: &str, line: usize) -> Range<usize> {
    line_ranges(src).nth(line).unwrap_or(src.len()..src.len())
}

/// Writes a diagnostic for every rejected file that looked like a test,
/// returning how many were written.
pub fn explain<'a>(
    fs: &impl Corpus,
    rejected: impl IntoIterator<Item = &'a (FileCandidate, Rejection)>,
    writer: &mut dyn WriteColor,
) -> Result<usize> {
    let config = Config::default();
    let mut n = 0;
    for (file, rejection) in rejected {
        if rejection.is_out_of_scope() {
            continue;
        }
        let (source, diagnostic) = match rejection {
            Rejection::Directive { kind, line } => {
                let source = fs.read_text(&file.path)?;
                let span = line_span(&source, *line);
                let diagnostic = Diagnostic::warning()
                    .with_message(format!("test left out: {kind}"))
                    .with_labels(vec![Label::primary((), span).with_message("disqualified here")]);
                (source, diagnostic)
            }
            other => (
                String::new(),
                Diagnostic::note().with_message(format!("test left out: {other}")),
            ),
        };
        emit(writer, &config, &SimpleFile::new(&file.relative, &source), &diagnostic)?;
        n += 1;
    }
    Ok(n)
}
