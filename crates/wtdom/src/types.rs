use crate::node_data::NodeData;

/// Stable index of a node inside its [`crate::Document`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// The body root. There is exactly one per document.
    Document,
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, Option<String>)>,
    pub data: NodeData,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
            data: NodeData::default(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn set_attr(&mut self, name: &str, value: Option<&str>) {
        let value = value.map(str::to_string);
        match self
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// `typeof` holds a whitespace separated list of types.
    pub fn has_typeof(&self, ty: &str) -> bool {
        self.typeof_matches(|t| t == ty)
    }

    pub fn typeof_matches(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.attr("typeof")
            .is_some_and(|v| v.split_ascii_whitespace().any(pred))
    }

    pub fn has_rel(&self, rel: &str) -> bool {
        self.attr("rel")
            .is_some_and(|v| v.split_ascii_whitespace().any(|r| r == rel))
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Edit annotations left by the DOM diff pass.
///
/// Deleted nodes are not flagged here; the diff pass leaves a
/// `mw:DiffMarker/deleted` meta in their place instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffMarks {
    pub inserted: bool,
    pub modified: bool,
    pub children_changed: bool,
    pub subtree_changed: bool,
}

impl DiffMarks {
    pub fn any(self) -> bool {
        self.inserted || self.modified || self.children_changed || self.subtree_changed
    }

    /// Something below the node changed, but the node itself did not.
    pub fn only_subtree_changed(self) -> bool {
        !self.inserted && !self.modified && (self.children_changed || self.subtree_changed)
    }
}
