//! Text, quotes, links and nodes that carry their own source.

use wtdom::predicates::{
    is_encapsulation_wrapper, is_literal_html, is_new_elt, next_non_deleted_sibling,
    previous_non_deleted_sibling,
};
use wtdom::traverse::text_content;
use wtdom::{Document, NodeId, Stx};

use crate::constrained_text::ConstrainedText;
use crate::constraints::NlConstraint;
use crate::handlers::DomHandler;
use crate::serializer::{ChildScope, WikitextSerializer, skip_over_encapsulated_content};

const TRACE: &str = "html2wt.links";

/// Text nodes. Comments and whitespace never reach a handler; the driver
/// folds them into separators.
pub struct TextHandler;

impl DomHandler for TextHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        ser.serialize_text_node(node);
        ser.doc().next_sibling(node)
    }
}

/// `''italic''` and `'''bold'''`.
pub struct QuoteHandler;

fn is_quote_elt(doc: &Document, node: NodeId) -> bool {
    matches!(doc.node_name(node), "b" | "i") && !is_literal_html(doc, node)
}

impl QuoteHandler {
    /// `'''a''''''b'''` would reparse as something else: find a quote run
    /// that ends right where `node` starts.
    fn preceding_quote(ser: &WikitextSerializer<'_>, node: NodeId) -> Option<NodeId> {
        let doc = ser.doc();
        let last_source = ser.state().sep.last_source_node?;

        let prev = previous_non_deleted_sibling(doc, node);
        if let Some(p) = prev
            && doc.text(p).is_some_and(|t| t.ends_with('\''))
        {
            return Some(p);
        }

        let mut cursor = Some(node);
        while let Some(n) = cursor
            && previous_non_deleted_sibling(doc, n).is_none()
        {
            cursor = doc.parent(n);
        }
        let mut cursor = cursor.and_then(|n| doc.prev_sibling(n));
        while let Some(n) = cursor
            && doc.is_element(n)
        {
            let last = doc.last_child(n);
            if is_quote_elt(doc, n) && last.is_some_and(|l| is_quote_elt(doc, l)) {
                return if last_source == n { last } else { None };
            }
            if last_source == n {
                return None;
            }
            cursor = last;
        }
        None
    }

    fn quote_text_follows(doc: &Document, node: NodeId) -> bool {
        next_non_deleted_sibling(doc, node)
            .and_then(|n| doc.text(n))
            .is_some_and(|t| t.starts_with('\''))
    }
}

impl DomHandler for QuoteHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        let quotes = if doc.node_name(node) == "b" { "'''" } else { "''" };
        let auto_closed = doc.data(node).is_some_and(|d| d.auto_inserted_end);

        let preceding = Self::preceding_quote(ser, node);
        let follows = Self::quote_text_follows(doc, node);
        if preceding.is_some_and(|q| follows || doc.is_element(q)) {
            ser.emit_chunk(ConstrainedText::plain("<nowiki/>", node), node);
        }
        ser.emit_chunk(ConstrainedText::plain(quotes, node), node);

        if doc.has_children(node) {
            ser.serialize_children(node);
            if !auto_closed {
                ser.emit_chunk(ConstrainedText::plain(quotes, node), node);
            }
        } else if !auto_closed {
            // `''''` alone would be a different quote run.
            ser.emit_chunk(ConstrainedText::plain("<nowiki/>", node), node);
            ser.emit_chunk(ConstrainedText::plain(quotes, node), node);
        }

        if follows {
            ser.emit_chunk(ConstrainedText::plain("<nowiki/>", node), node);
        }
        doc.next_sibling(node)
    }
}

/// Wiki links, external links and the page-property links (categories,
/// redirects, interlanguage).
pub struct LinkHandler;

/// Percent-encoding leaves `[`, `]` and friends alone; in wikitext they
/// would end the link.
fn escape_ext_link_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        let special = matches!(c, '[' | ']' | '<' | '>' | '"')
            || c.is_control()
            || c == ' '
            || c == '\u{A0}';
        if special {
            out.push_str(&format!("&#x{:X};", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Title comparison ignores `_`/space and a leading colon escape.
fn normalize_title(title: &str) -> String {
    title.trim_start_matches(':').replace('_', " ").trim().to_string()
}

fn href_target(href: &str) -> String {
    let target = href.trim_start_matches("./");
    target.replace('_', " ")
}

impl LinkHandler {
    fn link_target(doc: &Document, node: NodeId) -> String {
        let el = doc.element(node);
        match el.and_then(|el| el.data.target.clone()) {
            Some(target) => target,
            None => href_target(el.and_then(|el| el.attr("href")).unwrap_or("")),
        }
    }

    fn serialize_wiki_link(ser: &mut WikitextSerializer<'_>, node: NodeId, rel: &str) {
        let doc = ser.doc();
        let data = doc.data(node);
        let from_source = data.is_some_and(|d| d.target.is_some());
        let mut target = Self::link_target(doc, node);
        // A new link to a category or file must not turn into one.
        if !from_source
            && rel == "mw:WikiLink"
            && ["category:", "file:"]
                .iter()
                .any(|ns| target.get(..ns.len()).is_some_and(|h| h.eq_ignore_ascii_case(ns)))
        {
            target.insert(0, ':');
        }

        let content = ser.serialize_children_to_string(node, ChildScope::Link);
        let piped_in_source = data.is_some_and(|d| d.stx == Some(Stx::Piped));
        let modified = doc.diff(node).any() || is_new_elt(doc, node);
        let simple = content.is_empty()
            || ((modified || !piped_in_source)
                && normalize_title(&content) == normalize_title(&target));

        let text = if simple {
            format!("[[{target}]]")
        } else {
            format!("[[{target}|{content}]]")
        };
        log::trace!(target: TRACE, "wiki link | {text:?}");
        ser.emit_chunk(ConstrainedText::wiki_link(text, node, rel), node);
    }

    fn serialize_page_prop(ser: &mut WikitextSerializer<'_>, node: NodeId, rel: &str) {
        let target = Self::link_target(ser.doc(), node);
        let text = if rel == "mw:PageProp/redirect" {
            format!("#REDIRECT [[{target}]]")
        } else {
            format!("[[{target}]]")
        };
        ser.emit_chunk(ConstrainedText::wiki_link(text, node, rel), node);
    }

    fn serialize_ext_link(ser: &mut WikitextSerializer<'_>, node: NodeId) {
        let doc = ser.doc();
        let Some(el) = doc.element(node) else {
            return;
        };
        let href = el.attr("href").unwrap_or("");
        let url = escape_ext_link_url(href);
        let all_text = doc.has_children(node) && doc.children(node).all(|c| doc.is_text(c));

        match el.data.stx {
            Some(Stx::MagicLink) => {
                let text = text_content(doc, node);
                ser.emit_chunk(ConstrainedText::magic_link(text, node), node);
                return;
            }
            Some(Stx::Url) if all_text && text_content(doc, node) == href => {
                ser.emit_chunk(ConstrainedText::auto_url_link(url, node), node);
                return;
            }
            _ => {}
        }
        // An edited link whose label is its URL minimizes to a bare URL.
        if all_text && doc.diff(node).any() && text_content(doc, node) == href {
            ser.emit_chunk(ConstrainedText::auto_url_link(url, node), node);
            return;
        }

        let content = ser.serialize_children_to_string(node, ChildScope::Link);
        let text = if content.is_empty() {
            format!("[{url}]")
        } else {
            format!("[{url} {content}]")
        };
        ser.emit_chunk(ConstrainedText::ext_link(text, node), node);
    }

    fn is_new_category(doc: &Document, node: NodeId) -> bool {
        is_new_elt(doc, node)
            && doc
                .element(node)
                .is_some_and(|el| el.has_rel("mw:PageProp/Category"))
    }
}

impl DomHandler for LinkHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        let rel = doc
            .element(node)
            .and_then(|el| el.attr("rel"))
            .and_then(|r| r.split_ascii_whitespace().find(|r| r.starts_with("mw:")))
            .unwrap_or("");
        match rel {
            "mw:WikiLink" | "mw:WikiLink/Interwiki" => Self::serialize_wiki_link(ser, node, rel),
            "mw:ExtLink" => Self::serialize_ext_link(ser, node),
            _ if rel.starts_with("mw:PageProp/") => Self::serialize_page_prop(ser, node, rel),
            _ => {
                log::warn!(target: TRACE, "unhandled link type {rel:?} on {node:?}");
                ser.serialize_children(node);
            }
        }
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, _: NodeId) -> NlConstraint {
        // Fresh category links go on their own line.
        if Self::is_new_category(ser.doc(), node) {
            NlConstraint::at_least(1)
        } else {
            NlConstraint::NONE
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        if Self::is_new_category(doc, node) && !doc.is_root(other) {
            NlConstraint::at_least(1)
        } else {
            NlConstraint::NONE
        }
    }
}

/// Placeholders, entities and encapsulated content (templates,
/// extensions): the node's `src` is the wikitext.
pub struct SourceHandler;

impl DomHandler for SourceHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        if let Some(src) = doc.data(node).and_then(|d| d.src.as_deref()) {
            ser.emit_wikitext(src, node);
        }
        if is_encapsulation_wrapper(doc, node) {
            skip_over_encapsulated_content(doc, node)
        } else {
            doc.next_sibling(node)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ext_link_urls_encode_wikitext_delimiters() {
        assert_eq!(escape_ext_link_url("http://x/a b"), "http://x/a&#x20;b");
        assert_eq!(escape_ext_link_url("http://x/[1]"), "http://x/&#x5B;1&#x5D;");
        assert_eq!(escape_ext_link_url("http://x/ok?a=1"), "http://x/ok?a=1");
    }

    #[test]
    fn titles_compare_modulo_underscores_and_colon() {
        assert_eq!(normalize_title(":Foo_bar"), normalize_title("Foo bar"));
        assert_eq!(href_target("./Main_Page"), "Main Page");
    }
}
