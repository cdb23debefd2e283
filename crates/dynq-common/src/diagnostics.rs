//! Ariadne-based rendering for parse errors.
//!
//! Renders a [`ParseError`] against its source expression as a labeled
//! report. Output is colorless so tests and tooling see stable text.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};

use crate::error::ParseError;

/// Render a parse error into a formatted diagnostic string.
///
/// The label covers a single byte at the error offset (clamped to the
/// source bounds), which ariadne expands to the surrounding line.
pub fn render(error: &ParseError, source: &str) -> String {
    let config = Config::default().with_color(false);
    let span = clamp(error.position as usize, source.len());

    let report = Report::build(ReportKind::Error, span.clone())
        .with_message(error.kind.to_string())
        .with_config(config)
        .with_label(
            Label::new(span)
                .with_message("parsing stopped here")
                .with_color(Color::Red),
        )
        .finish();

    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("diagnostic rendering cannot fail on an in-memory buffer");
    String::from_utf8(buf).expect("diagnostic output is valid UTF-8")
}

/// Produce a non-empty in-bounds range for the error offset.
fn clamp(pos: usize, len: usize) -> Range<usize> {
    if len == 0 {
        return 0..0;
    }
    let start = pos.min(len.saturating_sub(1));
    start..(start + 1).min(len)
}
