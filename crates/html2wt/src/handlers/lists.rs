//! `*`, `#`, `;` and `:` lists.

use wtdom::predicates::{first_non_sep_child, is_list, is_list_item, is_literal_html};
use wtdom::{Document, NodeId, Stx};

use crate::constrained_text::ConstrainedText;
use crate::constraints::NlConstraint;
use crate::handlers::{DomHandler, is_html, list_bullets, wt_list_eol};
use crate::serializer::WikitextSerializer;

/// `ul`, `ol` and `dl`. Bullets are emitted by the items; the list itself
/// only speaks when it has no items to carry them.
pub struct ListHandler;

fn is_builder_inserted(doc: &Document, node: NodeId) -> bool {
    doc.data(node)
        .is_some_and(|d| d.auto_inserted_start && d.auto_inserted_end)
}

fn takes_items(list: &str, item: &str) -> bool {
    match list {
        "dl" => matches!(item, "dt" | "dd"),
        _ => item == "li",
    }
}

impl DomHandler for ListHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        // Nested item separators must not be folded into one line.
        ser.state_mut().single_line.disable();

        let mut first = first_non_sep_child(doc, node);
        while let Some(f) = first
            && is_builder_inserted(doc, f)
        {
            first = first_non_sep_child(doc, f);
        }
        let has_items = first.is_some_and(|f| {
            takes_items(doc.node_name(node), doc.node_name(f)) && !is_literal_html(doc, f)
        });
        if !has_items {
            ser.emit_chunk(ConstrainedText::plain(list_bullets(doc, node), node), node);
        }
        ser.serialize_children(node);

        ser.state_mut().single_line.pop();
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        if doc.is_root(other) {
            NlConstraint::range(0, 0)
        } else if doc.is_text(other) && doc.parent(node).is_some_and(|p| is_list_item(doc, p)) {
            // <li>foo<ul>…</ul></li>
            NlConstraint::range(1, 1)
        } else {
            NlConstraint::range(1, 2)
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        wt_list_eol(ser.doc(), node, other)
    }
}

/// `li`, `dt` and `dd`.
pub struct ListItemHandler;

fn is_row(doc: &Document, node: NodeId) -> bool {
    doc.data(node).is_some_and(|d| d.stx == Some(Stx::Row))
}

impl DomHandler for ListItemHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        let doc = ser.doc();
        let starts_with_list = first_non_sep_child(doc, node).is_some_and(|c| is_list(doc, c));
        if !starts_with_list {
            // `;term:def` puts the dd on the dt's line.
            let bullets = if doc.node_name(node) == "dd" && is_row(doc, node) {
                ":".to_string()
            } else {
                list_bullets(doc, node)
            };
            ser.emit_chunk(ConstrainedText::plain(bullets, node), node);
        }
        ser.state_mut().single_line.enforce();
        ser.serialize_children(node);
        ser.state_mut().single_line.pop();
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        match doc.node_name(node) {
            "li" => {
                let parent_list = doc.parent(node) == Some(other)
                    && matches!(doc.node_name(other), "ul" | "ol");
                if parent_list || is_html(doc, other) {
                    NlConstraint::NONE
                } else {
                    NlConstraint::range(1, 2)
                }
            }
            "dd" if is_row(doc, node) => NlConstraint::range(0, 0),
            _ => NlConstraint::range(1, 2),
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        if doc.node_name(node) == "dt" && doc.node_name(other) == "dd" && is_row(doc, other) {
            NlConstraint::range(0, 0)
        } else {
            wt_list_eol(doc, node, other)
        }
    }

    fn first_child(&self, ser: &WikitextSerializer<'_>, _: NodeId, other: NodeId) -> NlConstraint {
        if is_list(ser.doc(), other) {
            NlConstraint::NONE
        } else {
            NlConstraint::range(0, 0)
        }
    }

    fn last_child(&self, ser: &WikitextSerializer<'_>, _: NodeId, other: NodeId) -> NlConstraint {
        if is_list(ser.doc(), other) {
            NlConstraint::NONE
        } else {
            NlConstraint::range(0, 0)
        }
    }
}
