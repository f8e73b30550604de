//! Literal HTML tags and elements with no wikitext form.

use wtdom::predicates::{is_block_node, is_new_elt};
use wtdom::{Document, NodeId};

use crate::constrained_text::ConstrainedText;
use crate::constraints::NlConstraint;
use crate::handlers::DomHandler;
use crate::serializer::WikitextSerializer;

pub struct HtmlHandler;

/// Newly added block tags get their own lines so they do not glue onto
/// surrounding paragraphs.
fn new_block(doc: &Document, node: NodeId) -> NlConstraint {
    if is_new_elt(doc, node) && is_block_node(doc, node) {
        NlConstraint::range(1, 2)
    } else {
        NlConstraint::NONE
    }
}

impl DomHandler for HtmlHandler {
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId> {
        let doc = ser.doc();
        let open = ser.serialize_html_tag(node, wrapper_unmodified);
        if !open.is_empty() {
            ser.emit_chunk(ConstrainedText::plain(open, node), node);
        }

        // Inside block-level HTML, line-start wikitext has no meaning.
        let block = is_block_node(doc, node);
        let saved = ser.state().in_php_block;
        if block {
            ser.state_mut().in_php_block = true;
        }
        ser.serialize_children(node);
        ser.state_mut().in_php_block = saved;

        let close = ser.serialize_html_end_tag(node, wrapper_unmodified);
        if !close.is_empty() {
            ser.emit_chunk(ConstrainedText::plain(close, node), node);
        }
        doc.next_sibling(node)
    }

    fn before(&self, ser: &WikitextSerializer<'_>, node: NodeId, _: NodeId) -> NlConstraint {
        new_block(ser.doc(), node)
    }

    fn after(&self, ser: &WikitextSerializer<'_>, node: NodeId, _: NodeId) -> NlConstraint {
        new_block(ser.doc(), node)
    }
}
