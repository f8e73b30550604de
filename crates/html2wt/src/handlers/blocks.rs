//! Body, paragraphs, headings, preformatted text, rules, line breaks and
//! metas.

use wtdom::predicates::{
    emits_sol_transparent_single_line_wt, has_ancestor_named, heading_level, is_block_node,
    is_block_node_with_visible_wt, is_encapsulation_wrapper, is_list_item, is_literal_html,
    is_new_elt, is_sol_transparent_link, next_non_deleted_sibling, previous_non_deleted_sibling,
    previous_non_sep_sibling,
};
use wtdom::traverse::text_content;
use wtdom::{Document, NodeId};

use crate::constrained_text::ConstrainedText;
use crate::constraints::NlConstraint;
use crate::handlers::DomHandler;
use crate::serializer::{ChildScope, WikitextSerializer};
use crate::state::CurrLine;

pub struct BodyHandler;

impl DomHandler for BodyHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        ser.serialize_children(node);
        None
    }

    fn first_child(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::range(0, 1)
    }

    fn last_child(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::range(0, 1)
    }
}

/// Wikitext paragraphs: no markup of their own, only newlines around them.
pub struct PHandler;

impl PHandler {
    /// Text and inline nodes next to a `p` behave like another paragraph.
    fn treat_as_p_transition(doc: &Document, node: NodeId) -> bool {
        if doc.is_text(node) {
            return true;
        }
        let includes = doc
            .element(node)
            .is_some_and(|el| el.typeof_matches(|t| t.starts_with("mw:Includes/")));
        doc.is_element(node)
            && !is_block_node(doc, node)
            && !is_literal_html(doc, node)
            && !is_encapsulation_wrapper(doc, node)
            && !is_sol_transparent_link(doc, node)
            && !includes
    }

    fn is_p_transition(doc: &Document, node: NodeId) -> bool {
        (doc.node_name(node) == "p" && !is_literal_html(doc, node))
            || Self::treat_as_p_transition(doc, node)
    }

    /// A block node already sits on the wikitext line that ends at `node`,
    /// so one newline is enough to start a paragraph.
    fn curr_line_has_block_node(
        doc: &Document,
        line: &CurrLine,
        node: NodeId,
        skip_node: bool,
    ) -> bool {
        if !skip_node && has_newline_then_content(&text_content(doc, node)) {
            return false;
        }
        let mut parent = doc.parent(node);
        let mut cursor = previous_non_deleted_sibling(doc, node);
        loop {
            while let Some(n) = cursor {
                if is_block_node_with_visible_wt(doc, n) {
                    return true;
                }
                if text_content(doc, n).contains('\n') {
                    return false;
                }
                cursor = previous_non_deleted_sibling(doc, n);
                if let (Some(prev), Some(first)) = (cursor, line.first_node)
                    && (prev == first || doc.is_ancestor_of(prev, first))
                {
                    return false;
                }
            }
            match parent {
                Some(p) if !doc.is_root(p) => {
                    cursor = Some(p);
                    parent = doc.parent(p);
                }
                _ => return false,
            }
        }
    }

    fn next_line_might_have_block_node(doc: &Document, node: NodeId) -> bool {
        let mut cursor = next_non_deleted_sibling(doc, node);
        while let Some(n) = cursor {
            if let Some(text) = doc.text(n) {
                if text.contains('\n') {
                    return false;
                }
            } else if doc.is_element(n) {
                if requires_sol_context(doc.node_name(n)) && !is_literal_html(doc, n) {
                    return false;
                }
                return is_block_node_with_visible_wt(doc, n);
            }
            cursor = next_non_deleted_sibling(doc, n);
        }
        false
    }
}

fn has_newline_then_content(text: &str) -> bool {
    text.split('\n')
        .skip(1)
        .any(|line| line.starts_with(|c: char| !c.is_whitespace()))
}

/// Tags whose wikitext always starts on a fresh line.
fn requires_sol_context(name: &str) -> bool {
    matches!(
        name,
        "pre" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr" | "ul" | "ol" | "dl" | "table"
    )
}

fn transition_range(doc: &Document, other: NodeId) -> NlConstraint {
    if has_ancestor_named(doc, other, "figcaption") {
        NlConstraint::range(0, 2)
    } else {
        NlConstraint::range(1, 2)
    }
}

impl DomHandler for PHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        ser.serialize_children(node);
        ser.doc().next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        let other_name = doc.node_name(other);
        let cell_or_body = matches!(other_name, "td" | "th" | "body");
        if doc.parent(node) == Some(other) && (is_list_item(doc, other) || cell_or_body) {
            return if cell_or_body {
                NlConstraint::range(0, 1)
            } else {
                NlConstraint::range(0, 0)
            };
        }

        let p_after_p = previous_non_deleted_sibling(doc, node) == Some(other)
            && other_name == "p"
            && !is_literal_html(doc, other);
        let text_then_p = Self::treat_as_p_transition(doc, other)
            && previous_non_sep_sibling(doc, node) == Some(other)
            && !Self::curr_line_has_block_node(doc, &ser.state().curr_line, other, false);
        if p_after_p || text_then_p {
            return NlConstraint::range(2, 2);
        }

        if Self::treat_as_p_transition(doc, other)
            || (is_block_node(doc, other) && other_name != "blockquote" && doc.parent(node) == Some(other))
            || (emits_sol_transparent_single_line_wt(doc, other) && is_new_elt(doc, node))
        {
            transition_range(doc, other)
        } else {
            NlConstraint::range(0, 2)
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        let ends_in_br = doc.last_child(node).is_some_and(|c| doc.node_name(c) == "br");
        if !ends_in_br
            && Self::is_p_transition(doc, other)
            && !Self::curr_line_has_block_node(doc, &ser.state().curr_line, node, true)
            && !Self::next_line_might_have_block_node(doc, other)
        {
            NlConstraint::range(2, 2)
        } else if doc.is_root(other) {
            NlConstraint::range(0, 2)
        } else if Self::treat_as_p_transition(doc, other)
            || (is_block_node(doc, other)
                && doc.node_name(other) != "blockquote"
                && doc.parent(node) == Some(other))
        {
            transition_range(doc, other)
        } else {
            NlConstraint::range(0, 2)
        }
    }

    fn force_sol(&self) -> bool {
        true
    }
}

/// `== Heading ==`
pub struct HeadingHandler;

impl DomHandler for HeadingHandler {
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId> {
        let doc = ser.doc();
        let level = heading_level(doc.node_name(node)).unwrap_or(1);
        let markup = "=".repeat(level);
        let open = if wrapper_unmodified {
            ser.open_tag_source(node).map_or_else(|| markup.clone(), str::to_string)
        } else {
            markup.clone()
        };
        ser.emit_chunk(ConstrainedText::plain(open, node), node);
        ser.state_mut().single_line.enforce();
        if doc.has_children(node) {
            ser.serialize_children(node);
        } else {
            // `====` alone would parse as a different heading.
            ser.emit_chunk(ConstrainedText::plain("<nowiki/>", node), node);
        }
        ser.state_mut().single_line.pop();
        let close = if wrapper_unmodified {
            ser.close_tag_source(node).map_or(markup, str::to_string)
        } else {
            markup
        };
        ser.emit_chunk(ConstrainedText::plain(close, node), node);
        doc.next_sibling(node)
    }

    fn before(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::range(1, 2)
    }

    fn after(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::range(1, 2)
    }

    fn first_child(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::at_most(0)
    }

    fn last_child(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::at_most(0)
    }

    fn force_sol(&self) -> bool {
        true
    }
}

/// Indent-pre: every line of content is prefixed by a space.
pub struct PreHandler;

impl DomHandler for PreHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let content = ser.serialize_children_to_string(node, ChildScope::IndentPre);
        let (content, trailing_nl) = match content.strip_suffix('\n') {
            Some(stripped) => (stripped, "\n"),
            None => (content.as_str(), ""),
        };
        let indented = indent_lines(content);
        ser.emit_chunk(ConstrainedText::plain(indented, node), node);
        ser.state_mut().append_sep(trailing_nl);
        ser.doc().next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, _: NodeId, other: NodeId) -> NlConstraint {
        pre_separation(ser.doc(), other)
    }

    fn after(&self, ser: &WikitextSerializer<'_>, _: NodeId, other: NodeId) -> NlConstraint {
        pre_separation(ser.doc(), other)
    }
}

/// Two adjacent indent-pres need a blank line or they merge.
fn pre_separation(doc: &Document, other: NodeId) -> NlConstraint {
    if doc.node_name(other) == "pre" && !is_literal_html(doc, other) {
        NlConstraint::at_least(2)
    } else {
        NlConstraint::at_least(1)
    }
}

/// Prefix each line with a space, leaving comment-only lines alone.
fn indent_lines(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 8);
    let lines: Vec<&str> = content.split('\n').collect();
    let last = lines.len() - 1;
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let trailing_empty = i == last && i > 0 && line.is_empty();
        if !trailing_empty && !is_comment_only_line(line) {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}

fn is_comment_only_line(line: &str) -> bool {
    let stripped = tools::strip_comments(line);
    stripped.len() < line.len() && stripped.trim_matches([' ', '\t']).is_empty()
}

/// `----`
pub struct HrHandler;

impl DomHandler for HrHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        let markup = doc
            .data(node)
            .and_then(|d| d.dsr)
            .and_then(|dsr| dsr.width())
            .filter(|&w| w > 4 && ser.state().reuses_source())
            .map_or_else(|| "----".to_string(), |w| "-".repeat(w));
        ser.emit_chunk(ConstrainedText::plain(markup, node), node);
        doc.next_sibling(node)
    }

    fn before(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::range(1, 2)
    }

    fn after(&self, _: &WikitextSerializer<'_>, _: NodeId, _: NodeId) -> NlConstraint {
        NlConstraint::range(1, 2)
    }

    fn force_sol(&self) -> bool {
        true
    }
}

/// A wikitext `br` is the blank line inside a paragraph; it has no text of
/// its own.
pub struct BrHandler;

impl DomHandler for BrHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        let in_paragraph = doc.parent(node).is_some_and(|p| doc.node_name(p) == "p");
        let text = if ser.state().single_line.enforced() || !in_paragraph {
            "<br />"
        } else {
            ""
        };
        ser.emit_chunk(ConstrainedText::plain(text, node), node);
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        if doc.parent(node) == Some(other) && doc.node_name(other) == "p" {
            NlConstraint::range(1, 2)
        } else {
            NlConstraint::NONE
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        // List items do not like line breaks.
        if is_list_item(ser.doc(), other) {
            NlConstraint::NONE
        } else {
            self.before(ser, node, other)
        }
    }
}

/// Metas carry their wikitext (behavior switches, include directives) in
/// `src`; markers render as nothing.
pub struct MetaHandler;

impl DomHandler for MetaHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        if let Some(src) = doc.data(node).and_then(|d| d.src.as_deref()) {
            ser.emit_wikitext(src, node);
        }
        doc.next_sibling(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_prefixes_each_line() {
        assert_eq!(indent_lines("a\nb"), " a\n b");
        assert_eq!(indent_lines("a\n"), " a\n");
        assert_eq!(indent_lines("a\n<!--c-->\nb"), " a\n<!--c-->\n b");
    }

    #[test]
    fn newline_then_content_detection() {
        assert!(has_newline_then_content("a\nb"));
        assert!(!has_newline_then_content("a\n \n"));
        assert!(!has_newline_then_content("ab"));
    }
}
