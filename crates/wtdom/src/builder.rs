//! Fluent construction of annotated documents.
//!
//! The builder keeps a stack of open elements the same way a tree builder
//! does: `open` pushes, `close` pops, and leaf constructors (`text`,
//! `comment`, `void`) attach to whatever is on top. Attribute and metadata
//! setters apply to the most recently created element.

use crate::document::Document;
use crate::node_data::{NodeData, Stx};
use crate::source_range::{DomSourceRange, SourceRange};
use crate::types::{Element, NodeId};

#[derive(Debug, Default)]
pub struct DocumentBuilder {
    doc: Document,
    open_elements: Vec<NodeId>,
    last: Option<NodeId>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the most recently created node.
    pub fn last_id(&self) -> Option<NodeId> {
        self.last
    }

    fn current_parent(&self) -> NodeId {
        self.open_elements
            .last()
            .copied()
            .unwrap_or(Document::ROOT)
    }

    fn attach(&mut self, child: NodeId) {
        let parent = self.current_parent();
        if let Err(err) = self.doc.append_child(parent, child) {
            unreachable!("fresh node must attach to an open element: {err}");
        }
        self.last = Some(child);
    }

    fn last_data(&mut self) -> &mut NodeData {
        let Some(id) = self.last else {
            panic!("metadata setter called before any element was created");
        };
        match self.doc.data_mut(id) {
            Some(data) => data,
            None => panic!("metadata setter called on a non-element node"),
        }
    }

    fn last_element(&mut self) -> &mut Element {
        let Some(id) = self.last else {
            panic!("attribute setter called before any element was created");
        };
        match self.doc.element_mut(id) {
            Some(el) => el,
            None => panic!("attribute setter called on a non-element node"),
        }
    }

    pub fn open(&mut self, name: &str) -> &mut Self {
        let id = self.doc.create_element(Element::new(name));
        self.attach(id);
        self.open_elements.push(id);
        self
    }

    /// Element that never receives children (markers, `br`, `hr`).
    pub fn void(&mut self, name: &str) -> &mut Self {
        let id = self.doc.create_element(Element::new(name));
        self.attach(id);
        self
    }

    pub fn close(&mut self) -> &mut Self {
        if self.open_elements.pop().is_none() {
            panic!("close() without a matching open()");
        }
        self
    }

    pub fn text(&mut self, text: &str) -> &mut Self {
        let id = self.doc.create_text(text);
        self.attach(id);
        self
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        let id = self.doc.create_comment(text);
        self.attach(id);
        self
    }

    pub fn attr(&mut self, name: &str, value: &str) -> &mut Self {
        self.last_element().set_attr(name, Some(value));
        self
    }

    pub fn type_of(&mut self, value: &str) -> &mut Self {
        self.attr("typeof", value)
    }

    pub fn rel(&mut self, value: &str) -> &mut Self {
        self.attr("rel", value)
    }

    pub fn tsr(&mut self, start: usize, end: usize) -> &mut Self {
        self.last_data().tsr = Some(SourceRange::new(start, end));
        self
    }

    pub fn dsr(&mut self, dsr: DomSourceRange) -> &mut Self {
        self.last_data().dsr = Some(dsr);
        self
    }

    pub fn stx(&mut self, stx: Stx) -> &mut Self {
        self.last_data().stx = Some(stx);
        self
    }

    pub fn auto_inserted_start(&mut self) -> &mut Self {
        self.last_data().auto_inserted_start = true;
        self
    }

    pub fn auto_inserted_end(&mut self) -> &mut Self {
        self.last_data().auto_inserted_end = true;
        self
    }

    pub fn fostered(&mut self) -> &mut Self {
        self.last_data().fostered = true;
        self
    }

    pub fn self_close(&mut self) -> &mut Self {
        self.last_data().self_close = true;
        self
    }

    pub fn src(&mut self, src: &str) -> &mut Self {
        self.last_data().src = Some(src.to_string());
        self
    }

    pub fn start_tag_src(&mut self, src: &str) -> &mut Self {
        self.last_data().start_tag_src = Some(src.to_string());
        self
    }

    pub fn end_tag_src(&mut self, src: &str) -> &mut Self {
        self.last_data().end_tag_src = Some(src.to_string());
        self
    }

    pub fn target(&mut self, target: &str) -> &mut Self {
        self.last_data().target = Some(target.to_string());
        self
    }

    pub fn ext_link_content_offset(&mut self, offset: usize) -> &mut Self {
        self.last_data().ext_link_content_offset = Some(offset);
        self
    }

    pub fn stripped_name(&mut self, name: &str) -> &mut Self {
        self.last_data().stripped_name = Some(name.to_string());
        self
    }

    /// Mark the most recent node as inserted by an edit.
    pub fn inserted(&mut self) -> &mut Self {
        self.mark(|d| d.inserted = true)
    }

    pub fn modified(&mut self) -> &mut Self {
        self.mark(|d| d.modified = true)
    }

    pub fn children_changed(&mut self) -> &mut Self {
        self.mark(|d| d.children_changed = true)
    }

    pub fn subtree_changed(&mut self) -> &mut Self {
        self.mark(|d| d.subtree_changed = true)
    }

    fn mark(&mut self, f: impl FnOnce(&mut crate::types::DiffMarks)) -> &mut Self {
        if let Some(id) = self.last {
            f(self.doc.diff_mut(id));
        }
        self
    }

    /// Record the most recent node's id into `slot`.
    pub fn id_into(&mut self, slot: &mut Option<NodeId>) -> &mut Self {
        *slot = self.last;
        self
    }

    pub fn finish(self) -> Document {
        debug_assert!(
            self.open_elements.is_empty(),
            "finish() with {} element(s) still open",
            self.open_elements.len()
        );
        self.doc
    }
}
