use thiserror::Error;

use crate::node_data::NodeData;
use crate::types::{DiffMarks, Element, NodeId, NodeKind};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0:?} cannot have children")]
    NotAContainer(NodeId),
    #[error("node {0:?} is already attached to a parent")]
    AlreadyAttached(NodeId),
    #[error("node {node:?} is not a child of {parent:?}")]
    NotAChild { node: NodeId, parent: NodeId },
    #[error("the document root cannot be moved or removed")]
    RootMove,
    #[error("inserting {0:?} would make it its own ancestor")]
    Cycle(NodeId),
}

/// One arena slot.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub diff: DiffMarks,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            diff: DiffMarks::default(),
        }
    }
}

/// Arena-backed document.
///
/// Invariants:
/// - Slot 0 is the root and is never detached.
/// - Sibling links are consistent with the parent's first/last child links.
/// - Removing a node detaches it (and its subtree) but its slot is never
///   reused, so ids held by an in-progress walk stay valid.
///
/// Ids from another document are a caller bug and panic on access.
#[derive(Clone, Debug)]
pub struct Document {
    nodes: Vec<Node>,
    /// Sidecar of the root; elements keep theirs inline.
    body: NodeData,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Document)],
            body: NodeData::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of arena slots, detached nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].first_child.is_none()
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(kind));
        id
    }

    pub fn create_element(&mut self, element: Element) -> NodeId {
        self.push(NodeKind::Element(element))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Comment(text.to_string()))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id) {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.index()].kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Metadata of an element, or of the root.
    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        if id == Self::ROOT {
            return Some(&self.body);
        }
        self.element(id).map(|el| &el.data)
    }

    pub fn data_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        if id == Self::ROOT {
            return Some(&mut self.body);
        }
        self.element_mut(id).map(|el| &mut el.data)
    }

    /// Character data of a text or comment node.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text(t) | NodeKind::Comment(t) => Some(t),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) {
        if let NodeKind::Text(t) | NodeKind::Comment(t) = &mut self.nodes[id.index()].kind {
            t.clear();
            t.push_str(value);
        }
    }

    /// Lowercase tag name, `#text`, `#comment`, or `body` for the root.
    pub fn node_name(&self, id: NodeId) -> &str {
        match self.kind(id) {
            NodeKind::Document => "body",
            NodeKind::Element(el) => &el.name,
            NodeKind::Text(_) => "#text",
            NodeKind::Comment(_) => "#comment",
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element(_))
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Text(_))
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Comment(_))
    }

    pub fn is_root(&self, id: NodeId) -> bool {
        id == Self::ROOT
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        self.node(id).first_child.is_some()
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    pub fn diff(&self, id: NodeId) -> DiffMarks {
        self.node(id).diff
    }

    pub fn diff_mut(&mut self, id: NodeId) -> &mut DiffMarks {
        &mut self.nodes[id.index()].diff
    }

    pub fn is_ancestor_of(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        while let Some(parent) = self.parent(node) {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    fn can_have_children(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Document | NodeKind::Element(_))
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if child == Self::ROOT {
            return Err(DomError::RootMove);
        }
        if !self.can_have_children(parent) {
            return Err(DomError::NotAContainer(parent));
        }
        if self.parent(child).is_some() {
            return Err(DomError::AlreadyAttached(child));
        }
        if child == parent || self.is_ancestor_of(child, parent) {
            return Err(DomError::Cycle(child));
        }
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (append when `None`).
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        self.check_insertable(parent, child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    node: reference,
                    parent,
                });
            }
        }

        let prev = match reference {
            Some(reference) => self.prev_sibling(reference),
            None => self.last_child(parent),
        };
        {
            let node = &mut self.nodes[child.index()];
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = Some(child),
            None => self.nodes[parent.index()].first_child = Some(child),
        }
        match reference {
            Some(reference) => self.nodes[reference.index()].prev_sibling = Some(child),
            None => self.nodes[parent.index()].last_child = Some(child),
        }
        Ok(())
    }

    /// Detach `id` (with its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == Self::ROOT {
            return Err(DomError::RootMove);
        }
        let Some(parent) = self.parent(id) else {
            return Ok(());
        };
        let (prev, next) = {
            let node = &self.nodes[id.index()];
            (node.prev_sibling, node.next_sibling)
        };
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next {
            Some(next) => self.nodes[next.index()].prev_sibling = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }
        let node = &mut self.nodes[id.index()];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        Ok(())
    }
}

/// Iterator over the direct children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests;
