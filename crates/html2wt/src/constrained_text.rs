//! Output chunks that know which neighbours would change their meaning.
//!
//! A line of wikitext is buffered as a list of [`ConstrainedText`] chunks.
//! Only once the whole line is known does [`escape_line`] run: each chunk
//! looks at the text to its left and right and may ask for an inert escape
//! marker (`<nowiki/>`) on either side. A link written `[[Foo]]` followed by
//! `s`, for example, would otherwise swallow the `s` as a link trail.

use std::sync::LazyLock;

use regex::Regex;
use wtdom::predicates::{first_non_deleted_child, is_language_variant, last_non_deleted_child};
use wtdom::{Document, NodeId, Stx};

use crate::config::WikiConfig;

/// Escape marker used by the context-sensitive kinds.
pub const NOWIKI_MARKER: &str = "<nowiki/>";

static WIKI_LINK_BAD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^\[])(\[\[)*\[$").expect("valid regex"));
static SAFE_ENTITY_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:lt|gt|nbsp|#x0*(?:3[CcEe]|[Aa]0)|#0*(?:60|62|160));").expect("valid regex")
});
static INCOMPLETE_ENTITY_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&[#0-9a-zA-Z]*$").expect("valid regex"));
static ENTITY_TAIL_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[#0-9a-zA-Z]*;").expect("valid regex"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Emitted as is, with its own fixed prefix/suffix if any.
    Plain,
    /// `[[…]]`. `trails` is set for real wiki and interwiki links, whose
    /// label may absorb following letters.
    WikiLink { trails: bool },
    /// `[http://… label]`; brackets make it self-delimiting.
    ExtLink,
    /// Bare URL.
    AutoUrlLink,
    /// `ISBN …`, `RFC …`, `PMID …`
    MagicLink,
    /// `-{…}-`
    LanguageVariant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstrainedText {
    pub text: String,
    pub node: NodeId,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub kind: ChunkKind,
    /// Never emit a separator before this chunk (inner chunks of a node
    /// copied from source).
    pub no_sep: bool,
    /// Text was copied from the original source.
    pub selser: bool,
}

/// What one chunk contributes once its context is known.
#[derive(Debug)]
struct Escaped<'a> {
    prefix: Option<&'a str>,
    suffix: Option<&'a str>,
    greedy: bool,
}

impl ConstrainedText {
    pub fn plain(text: impl Into<String>, node: NodeId) -> Self {
        Self {
            text: text.into(),
            node,
            prefix: None,
            suffix: None,
            kind: ChunkKind::Plain,
            no_sep: false,
            selser: false,
        }
    }

    fn with_markers(text: impl Into<String>, node: NodeId, kind: ChunkKind) -> Self {
        Self {
            prefix: Some(NOWIKI_MARKER.to_string()),
            suffix: Some(NOWIKI_MARKER.to_string()),
            kind,
            ..Self::plain(text, node)
        }
    }

    /// `rel` is the link's `rel` attribute; only `mw:WikiLink` and
    /// `mw:WikiLink/Interwiki` take link trails.
    pub fn wiki_link(text: impl Into<String>, node: NodeId, rel: &str) -> Self {
        let trails = matches!(rel, "mw:WikiLink" | "mw:WikiLink/Interwiki");
        Self::with_markers(text, node, ChunkKind::WikiLink { trails })
    }

    pub fn ext_link(text: impl Into<String>, node: NodeId) -> Self {
        Self {
            kind: ChunkKind::ExtLink,
            ..Self::plain(text, node)
        }
    }

    pub fn auto_url_link(text: impl Into<String>, node: NodeId) -> Self {
        Self::with_markers(text, node, ChunkKind::AutoUrlLink)
    }

    pub fn magic_link(text: impl Into<String>, node: NodeId) -> Self {
        Self::with_markers(text, node, ChunkKind::MagicLink)
    }

    pub fn language_variant(text: impl Into<String>, node: NodeId) -> Self {
        Self::with_markers(text, node, ChunkKind::LanguageVariant)
    }

    /// A wiki link that can absorb following text. Once emitted, nothing to
    /// its left can be affected by what comes after it.
    pub fn is_greedy(&self) -> bool {
        matches!(self.kind, ChunkKind::WikiLink { trails: true }) && !self.text.ends_with(']')
    }

    fn escape(&self, left: &str, right: &str, wiki: &WikiConfig) -> Escaped<'_> {
        let (bad_prefix, bad_suffix) = match self.kind {
            ChunkKind::Plain | ChunkKind::ExtLink => {
                return Escaped {
                    prefix: self.prefix.as_deref(),
                    suffix: self.suffix.as_deref(),
                    greedy: false,
                };
            }
            ChunkKind::WikiLink { trails } => {
                let prefix = WIKI_LINK_BAD_PREFIX.is_match(left)
                    || (trails && wiki.link_prefix.as_ref().is_some_and(|re| re.is_match(left)));
                let suffix =
                    trails && wiki.link_trail.as_ref().is_some_and(|re| re.is_match(right));
                (prefix, suffix)
            }
            ChunkKind::AutoUrlLink => {
                let suffix = auto_url_bad_suffix(right)
                    || (INCOMPLETE_ENTITY_END.is_match(&self.text)
                        && ENTITY_TAIL_START.is_match(right));
                (ends_with_word_char(left), suffix)
            }
            ChunkKind::MagicLink => (ends_with_word_char(left), starts_with_word_char(right)),
            ChunkKind::LanguageVariant => (left == "|", false),
        };
        Escaped {
            prefix: self.prefix.as_deref().filter(|_| bad_prefix),
            suffix: self.suffix.as_deref().filter(|_| bad_suffix),
            greedy: self.is_greedy(),
        }
    }

    /// Split text copied verbatim from `node`'s source range into chunks.
    ///
    /// The node's own kind decides the constraint. Otherwise first and last
    /// children that share the node's start or end offset are split off so
    /// that their constraints still see the surrounding text. Every chunk
    /// after the first is marked `no_sep`.
    pub fn from_selser(text: &str, node: NodeId, doc: &Document) -> Vec<ConstrainedText> {
        let mut chunks = from_selser_inner(text, node, doc, false, false);
        for chunk in &mut chunks {
            chunk.selser = true;
        }
        chunks
    }
}

fn typed_chunk(text: &str, node: NodeId, doc: &Document) -> Option<ConstrainedText> {
    let el = doc.element(node)?;
    if is_language_variant(doc, node) {
        return Some(ConstrainedText::language_variant(text, node));
    }
    if el.data.stx == Some(Stx::MagicLink) {
        return Some(ConstrainedText::magic_link(text, node));
    }
    if el.is_named("a") && el.data.stx == Some(Stx::Url) {
        return Some(ConstrainedText::auto_url_link(text, node));
    }
    let rel = el.attr("rel").unwrap_or("");
    let simple_or_piped = matches!(el.data.stx, Some(Stx::Simple | Stx::Piped));
    if rel == "mw:ExtLink" && !simple_or_piped {
        return Some(ConstrainedText::ext_link(text, node));
    }
    let rel = if rel == "mw:ExtLink" {
        "mw:WikiLink/Interwiki"
    } else {
        rel
    };
    if matches!(rel, "mw:WikiLink" | "mw:WikiLink/Interwiki") && simple_or_piped {
        return Some(ConstrainedText::wiki_link(text, node, rel));
    }
    None
}

fn from_selser_inner(
    text: &str,
    node: NodeId,
    doc: &Document,
    ignore_prefix: bool,
    ignore_suffix: bool,
) -> Vec<ConstrainedText> {
    if let Some(chunk) = typed_chunk(text, node, doc) {
        return vec![chunk];
    }

    let node_dsr = doc.data(node).and_then(|d| d.dsr).unwrap_or_default();
    let child_dsr = |child: Option<NodeId>| {
        let child = child?;
        let dsr = doc.data(child).and_then(|d| d.valid_dsr())?;
        Some((child, dsr))
    };
    let first = first_non_deleted_child(doc, node);
    let last = last_non_deleted_child(doc, node);

    let mut rest = text;
    let mut prefix_chunks = Vec::new();
    let mut suffix_chunks = Vec::new();

    if !ignore_prefix
        && let Some((child, dsr)) = child_dsr(first).filter(|(_, d)| d.start == node_dsr.start)
        && let Some(len) = dsr
            .width()
            .filter(|&len| len <= rest.len() && rest.is_char_boundary(len))
    {
        prefix_chunks = from_selser_inner(&rest[..len], child, doc, false, true);
        rest = &rest[len..];
    }
    if !ignore_suffix
        && last != first
        && let Some((child, dsr)) = child_dsr(last).filter(|(_, d)| d.end == node_dsr.end)
        && let Some(len) = dsr.width().filter(|&len| len <= rest.len())
        && rest.is_char_boundary(rest.len() - len)
    {
        let cut = rest.len() - len;
        suffix_chunks = from_selser_inner(&rest[cut..], child, doc, true, false);
        rest = &rest[..cut];
    }

    let mut chunks = prefix_chunks;
    chunks.push(ConstrainedText::plain(rest, node));
    chunks.extend(suffix_chunks);

    if !(ignore_prefix || ignore_suffix) {
        if chunks[0].node != node {
            chunks.insert(0, ConstrainedText::plain("", node));
        }
        for chunk in chunks.iter_mut().skip(1) {
            chunk.no_sep = true;
        }
    }
    chunks
}

/// Resolve every chunk's escapes against its neighbours and join the line.
pub fn escape_line(chunks: &[ConstrainedText], wiki: &WikiConfig) -> String {
    let total: usize = chunks.iter().map(|c| c.text.len()).sum();
    let joined: String = chunks.iter().map(|c| c.text.as_str()).collect();

    let mut safe_left = String::with_capacity(total + 16);
    let mut left = String::new();
    let mut consumed = 0;
    for chunk in chunks {
        consumed += chunk.text.len();
        let right = &joined[consumed..];
        let escaped = chunk.escape(&left, right, wiki);
        if let Some(prefix) = escaped.prefix {
            left.push_str(prefix);
        }
        left.push_str(&chunk.text);
        if let Some(suffix) = escaped.suffix {
            left.push_str(suffix);
        }
        if escaped.greedy {
            safe_left.push_str(&left);
            left.clear();
        }
    }
    safe_left.push_str(&left);
    safe_left
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn ends_with_word_char(s: &str) -> bool {
    s.chars().next_back().is_some_and(is_word_char)
}

fn starts_with_word_char(s: &str) -> bool {
    s.chars().next().is_some_and(is_word_char)
}

fn is_url_char(ch: char) -> bool {
    !matches!(
        ch,
        '[' | ']'
            | '<'
            | '>'
            | '"'
            | '\x00'..='\x20'
            | '\x7F'
            | '\u{A0}'
            | '\u{1680}'
            | '\u{180E}'
            | '\u{2000}'..='\u{200A}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
    )
}

/// Text to the right of a bare URL would be absorbed into it.
///
/// The parser strips trailing punctuation (`,;\.:!?`, and `)` when the URL
/// has no `(`) from a URL only if nothing URL-like follows it. Punctuation
/// is itself a URL character, so the test reduces to the first character.
fn auto_url_bad_suffix(right: &str) -> bool {
    if SAFE_ENTITY_PREFIX.is_match(right) || right.starts_with("''") {
        return false;
    }
    right.chars().next().is_some_and(is_url_char)
}

#[cfg(test)]
mod tests;
