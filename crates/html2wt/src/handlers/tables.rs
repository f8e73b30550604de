//! `{| … |}` tables.

use wtdom::predicates::{
    is_literal_html, is_new_elt, previous_non_deleted_sibling, previous_non_sep_sibling,
};
use wtdom::{Document, NodeId, Stx};

use crate::constrained_text::ConstrainedText;
use crate::constraints::{ConstraintInfo, NlConstraint, SepType, SeparatorConstraints};
use crate::handlers::DomHandler;
use crate::serializer::WikitextSerializer;

/// A freshly inserted table row or cell always starts its own line.
fn max_nls_in_table(doc: &Document, node: NodeId, other: NodeId) -> u32 {
    if is_new_elt(doc, node) || is_new_elt(doc, other) { 1 } else { 2 }
}

fn start_tag_src(doc: &Document, node: NodeId) -> Option<&str> {
    doc.data(node).and_then(|d| d.start_tag_src.as_deref())
}

fn is_row_syntax(doc: &Document, node: NodeId) -> bool {
    doc.data(node).is_some_and(|d| d.stx == Some(Stx::Row))
}

pub struct TableHandler;

impl DomHandler for TableHandler {
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId> {
        let doc = ser.doc();
        let symbol = start_tag_src(doc, node).unwrap_or("{|");
        let open = ser.serialize_table_tag(symbol, Some(""), node, wrapper_unmodified);
        ser.emit_chunk(ConstrainedText::plain(open, node), node);

        let wikitext = !is_literal_html(doc, node);
        if wikitext {
            ser.state_mut().wiki_table_nesting += 1;
        }
        ser.serialize_children(node);
        if wikitext {
            ser.state_mut().wiki_table_nesting -= 1;
        }

        // `{|\n|}`: a table without children never computed its
        // last-child constraint.
        let state = ser.state_mut();
        if state.sep.constraints.is_none() {
            state.sep.constraints = Some(SeparatorConstraints {
                nl: NlConstraint::range(1, 2),
                info: ConstraintInfo {
                    on_sol: state.on_sol,
                    force_sol: false,
                    sep_type: SepType::ParentChild,
                    node_a: node,
                    node_b: node,
                },
            });
        }

        let close = match doc.data(node).and_then(|d| d.end_tag_src.as_deref()) {
            Some(src) => src.to_string(),
            None if wrapper_unmodified => ser.close_tag_source(node).unwrap_or("|}").to_string(),
            None => "|}".to_string(),
        };
        ser.emit_chunk(ConstrainedText::plain(close, node), node);
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        // Indented table: `:{|`
        if doc.parent(node) == Some(other) && doc.node_name(other) == "dd" {
            NlConstraint::range(0, 2)
        } else {
            NlConstraint::range(1, 2)
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        if is_new_elt(doc, node) || is_new_elt(doc, other) {
            NlConstraint::range(1, 2)
        } else {
            NlConstraint::range(0, 2)
        }
    }

    fn first_child(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        NlConstraint::range(1, max_nls_in_table(ser.doc(), node, other))
    }

    fn last_child(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        NlConstraint::range(1, max_nls_in_table(ser.doc(), node, other))
    }
}

/// `tbody`, `thead` and `tfoot` have no wikitext of their own.
pub struct TableSectionHandler;

impl DomHandler for TableSectionHandler {
    fn handle(&self, ser: &mut WikitextSerializer<'_>, node: NodeId, _: bool) -> Option<NodeId> {
        ser.serialize_children(node);
        ser.doc().next_sibling(node)
    }
}

/// `|-`; the first row of a table usually has no marker in the source.
pub struct RowHandler;

impl DomHandler for RowHandler {
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId> {
        let doc = ser.doc();
        let src = start_tag_src(doc, node);
        if src.is_some() || previous_non_sep_sibling(doc, node).is_some() {
            let open = ser.serialize_table_tag(src.unwrap_or("|-"), Some(""), node, wrapper_unmodified);
            ser.emit_chunk(ConstrainedText::plain(open, node), node);
        }
        ser.serialize_children(node);
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        let max = max_nls_in_table(doc, node, other);
        if previous_non_deleted_sibling(doc, node).is_none() && start_tag_src(doc, node).is_none() {
            NlConstraint::range(0, max)
        } else {
            NlConstraint::range(1, max)
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        NlConstraint::range(0, max_nls_in_table(ser.doc(), node, other))
    }
}

/// `|` and `!` cells, `||` and `!!` when sharing a line.
pub struct CellHandler;

impl DomHandler for CellHandler {
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId> {
        let doc = ser.doc();
        let header = doc.node_name(node) == "th";
        let symbol = match (header, is_row_syntax(doc, node)) {
            (true, true) => "!!",
            (true, false) => "!",
            (false, true) => "||",
            (false, false) => "|",
        };
        let symbol = start_tag_src(doc, node).unwrap_or(symbol);
        let open = ser.serialize_table_tag(symbol, None, node, wrapper_unmodified);
        ser.emit_chunk(ConstrainedText::plain(open, node), node);
        ser.serialize_children(node);
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        let min = if is_row_syntax(doc, node) { 0 } else { 1 };
        NlConstraint::range(min, max_nls_in_table(doc, node, other))
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        NlConstraint::range(0, max_nls_in_table(ser.doc(), node, other))
    }
}

/// `|+`
pub struct CaptionHandler;

impl DomHandler for CaptionHandler {
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId> {
        let doc = ser.doc();
        let symbol = start_tag_src(doc, node).unwrap_or("|+");
        let open = ser.serialize_table_tag(symbol, None, node, wrapper_unmodified);
        ser.emit_chunk(ConstrainedText::plain(open, node), node);
        ser.serialize_children(node);
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        let doc = ser.doc();
        let max = max_nls_in_table(doc, node, other);
        if doc.node_name(other) == "table" {
            NlConstraint::range(0, max)
        } else {
            NlConstraint::range(1, max)
        }
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, other: NodeId) -> NlConstraint {
        NlConstraint::range(1, max_nls_in_table(ser.doc(), node, other))
    }
}
