//! Shared helpers for the round-trip test suites: fixture loading, DOM
//! descriptions and readable assertion diffs.

use std::fmt::Write;

pub mod dom_spec;
pub mod fixtures;

pub use crate::dom_spec::{BuiltDocument, ElementSpec, NodeSpec, build_document};
pub use crate::fixtures::{
    FIXTURE_FORMAT_V1, FixtureCase, FixtureError, FixtureFile, filter_cases, load_fixture,
    parse_fixture,
};

/// Escape control characters, quotes and backslashes so a line of wikitext
/// prints on one line with its whitespace visible.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '"' => {
                out.push('\\');
                out.push(ch);
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{a0}' => out.push_str("\\u{A0}"),
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Describe the first differing line with two lines of context on either
/// side. Returns only the summary line when the inputs agree.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    const MISSING: &str = "<missing>";
    let total = expected.len().max(actual.len());
    let line = |lines: &[String], i: usize| lines.get(i).map_or(MISSING, String::as_str).to_string();

    let mut out = String::new();
    let first_diff = (0..total).find(|&i| line(expected, i) != line(actual, i));
    if let Some(at) = first_diff {
        let from = at.saturating_sub(2);
        let to = (at + 3).min(total);
        let _ = writeln!(out, "first mismatch at line {} (lines {}..={}):", at + 1, from + 1, to);
        for i in from..to {
            let marker = if i == at { '>' } else { ' ' };
            let _ = writeln!(out, "{marker} {:>4}  expected: {}", i + 1, line(expected, i));
            let _ = writeln!(out, "{marker} {:>4}    actual: {}", i + 1, line(actual, i));
        }
    }
    let _ = writeln!(
        out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// [`diff_lines`] over two wikitext strings, with each line escaped.
pub fn diff_wikitext(expected: &str, actual: &str) -> String {
    let lines = |text: &str| text.split('\n').map(escape_text).collect::<Vec<_>>();
    diff_lines(&lines(expected), &lines(actual))
}

#[cfg(test)]
mod tests;
