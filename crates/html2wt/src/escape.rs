//! Escaping of novel text so that it reparses as the same text.
//!
//! Unmodified source is never escaped. Text that came from an edit is
//! checked line by line: constructs that only mean something at the start
//! of a line (lists, headings, tables, rules, indent-pre) are neutralized
//! there, and inline markup (quotes, links, templates, tags, signatures) is
//! neutralized anywhere. Text without wikitext-significant characters is
//! returned unchanged.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([#0-9a-zA-Z]+);").expect("valid regex"));
static NUMERIC_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9]+|[xX][0-9a-fA-F]+)$").expect("valid regex"));

const NAMED_ENTITIES: &[&str] = &[
    "amp", "apos", "bull", "copy", "deg", "divide", "emsp", "ensp", "euro", "gt", "hellip",
    "laquo", "lrm", "lt", "mdash", "middot", "nbsp", "ndash", "quot", "raquo", "reg", "rlm",
    "shy", "thinsp", "times", "trade", "zwj", "zwnj",
];

const URL_PROTOCOLS: &[&str] = &["http://", "https://", "ftp://", "mailto:"];

/// Where the escaped text lands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EscapeContext {
    /// The text starts a wikitext line.
    pub sol: bool,
    /// Inside wikitext table syntax, where `|` and `!` at line start are
    /// cell markup.
    pub in_table: bool,
    /// Inside `[[…]]` link text.
    pub in_link: bool,
}

/// Turn `&name;` sequences that would decode as entities into literal text.
pub fn escape_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    ENTITY.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[1];
        if NUMERIC_ENTITY.is_match(name) || NAMED_ENTITIES.contains(&name) {
            format!("&amp;{name};")
        } else {
            caps[0].to_string()
        }
    })
}

/// Escape `text` so that it parses back as plain text in `ctx`.
pub fn escape_wikitext(text: &str, ctx: EscapeContext) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let sol = i > 0 || ctx.sol;
        let rest = if sol {
            match escape_line_start(line, ctx, &mut out) {
                Some(rest) => rest,
                None => continue,
            }
        } else {
            line
        };
        escape_inline(rest, ctx, &mut out);
    }
    out
}

fn wrap(out: &mut String, text: &str) {
    out.push_str("<nowiki>");
    out.push_str(text);
    out.push_str("</nowiki>");
}

/// Handle line-start constructs. Returns the part still to be escaped
/// inline, or `None` if the whole line was wrapped.
fn escape_line_start<'t>(line: &'t str, ctx: EscapeContext, out: &mut String) -> Option<&'t str> {
    if is_heading_like(line) {
        wrap(out, line);
        return None;
    }
    if line.starts_with("----") {
        let dashes = line.bytes().take_while(|&b| b == b'-').count();
        wrap(out, &line[..dashes]);
        return Some(&line[dashes..]);
    }
    if line.starts_with("{|") || (ctx.in_table && line.starts_with("|}")) {
        wrap(out, &line[..2]);
        return Some(&line[2..]);
    }
    let first = line.bytes().next()?;
    if matches!(first, b'*' | b'#' | b':' | b';') || (ctx.in_table && matches!(first, b'|' | b'!'))
    {
        wrap(out, &line[..1]);
        return Some(&line[1..]);
    }
    let spaces = line.bytes().take_while(|&b| b == b' ' || b == b'\t').count();
    if spaces > 0 && line[spaces..].chars().next().is_some_and(|c| !c.is_whitespace()) {
        wrap(out, &line[..spaces]);
        return Some(&line[spaces..]);
    }
    Some(line)
}

fn is_heading_like(line: &str) -> bool {
    let trimmed = line.trim_end_matches([' ', '\t']);
    trimmed.len() >= 3 && trimmed.starts_with('=') && trimmed.ends_with('=')
}

fn escape_inline(line: &str, ctx: EscapeContext, out: &mut String) {
    let mut pos = 0;
    let mut at_word_start = true;
    while pos < line.len() {
        let rest = &line[pos..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        let run = if rest.starts_with("''") {
            rest.bytes().take_while(|&b| b == b'\'').count()
        } else if rest.starts_with("[[")
            || rest.starts_with("{{")
            || rest.starts_with("-{")
            || (ctx.in_link && (rest.starts_with("]]") || rest.starts_with('|')))
        {
            if rest.starts_with('|') { 1 } else { 2 }
        } else if rest.starts_with("~~~") {
            rest.bytes().take_while(|&b| b == b'~').count()
        } else if rest.starts_with('[') && starts_with_protocol(&rest[1..]) {
            1
        } else if at_word_start && starts_with_protocol(rest) {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        } else {
            0
        };

        if run > 0 {
            wrap(out, &rest[..run]);
            at_word_start = false;
            pos += run;
            continue;
        }

        if ch == '<' && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!') {
            out.push_str("&lt;");
        } else {
            out.push(ch);
        }
        at_word_start = !(ch.is_alphanumeric() || ch == '_');
        pos += ch.len_utf8();
    }
}

fn starts_with_protocol(text: &str) -> bool {
    URL_PROTOCOLS.iter().any(|p| {
        text.len() > p.len() && text.get(..p.len()).is_some_and(|head| head.eq_ignore_ascii_case(p))
    })
}
