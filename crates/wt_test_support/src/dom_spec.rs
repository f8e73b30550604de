//! Declarative DOM descriptions for fixture files.
//!
//! A fixture describes the tree a parser would hand the engines: element
//! names, attributes, tokenizer ranges and parse flags. Nodes may carry a
//! `label` so assertions can refer to them after the document is built.
//!
//! ```toml
//! dom = [
//!   { tag = "p", children = [
//!     { tag = "a", label = "link", rel = "mw:WikiLink", tsr = [0, 7], children = [
//!       { text = "Foo" },
//!     ] },
//!   ] },
//! ]
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;
use wtdom::{Document, DocumentBuilder, DomSourceRange, NodeId, Stx};

use crate::fixtures::FixtureError;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NodeSpec {
    Text { text: String },
    Comment { comment: String },
    Element(ElementSpec),
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ElementSpec {
    pub tag: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, rename = "typeof")]
    pub type_of: Option<String>,
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub tsr: Option<[usize; 2]>,
    /// Fully known `[start, end, open, close]`.
    #[serde(default)]
    pub dsr: Option<[usize; 4]>,
    #[serde(default)]
    pub stx: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub diff: Vec<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub start_tag_src: Option<String>,
    #[serde(default)]
    pub end_tag_src: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub ext_link_content_offset: Option<usize>,
    #[serde(default)]
    pub stripped_name: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

/// A built fixture document plus its labelled nodes.
#[derive(Debug)]
pub struct BuiltDocument {
    pub doc: Document,
    pub labels: BTreeMap<String, NodeId>,
}

impl BuiltDocument {
    pub fn node(&self, label: &str) -> NodeId {
        match self.labels.get(label) {
            Some(id) => *id,
            None => panic!("fixture has no node labelled '{label}'"),
        }
    }
}

pub fn parse_stx(raw: &str) -> Result<Stx, FixtureError> {
    Ok(match raw {
        "html" => Stx::Html,
        "piped" => Stx::Piped,
        "simple" => Stx::Simple,
        "url" => Stx::Url,
        "magiclink" => Stx::MagicLink,
        "row" => Stx::Row,
        other => return Err(FixtureError::UnknownValue("stx", other.to_string())),
    })
}

pub fn build_document(nodes: &[NodeSpec]) -> Result<BuiltDocument, FixtureError> {
    let mut b = DocumentBuilder::new();
    let mut labels = BTreeMap::new();
    for node in nodes {
        build_node(&mut b, node, &mut labels)?;
    }
    Ok(BuiltDocument {
        doc: b.finish(),
        labels,
    })
}

fn build_node(
    b: &mut DocumentBuilder,
    node: &NodeSpec,
    labels: &mut BTreeMap<String, NodeId>,
) -> Result<(), FixtureError> {
    let el = match node {
        NodeSpec::Text { text } => {
            b.text(text);
            return Ok(());
        }
        NodeSpec::Comment { comment } => {
            b.comment(comment);
            return Ok(());
        }
        NodeSpec::Element(el) => el,
    };

    b.open(&el.tag);
    for (name, value) in &el.attrs {
        b.attr(name, value);
    }
    if let Some(value) = &el.type_of {
        b.type_of(value);
    }
    if let Some(value) = &el.rel {
        b.rel(value);
    }
    if let Some([start, end]) = el.tsr {
        b.tsr(start, end);
    }
    if let Some([start, end, open, close]) = el.dsr {
        b.dsr(DomSourceRange::known(start, end, open, close));
    }
    if let Some(stx) = &el.stx {
        b.stx(parse_stx(stx)?);
    }
    for flag in &el.flags {
        match flag.as_str() {
            "auto_inserted_start" => b.auto_inserted_start(),
            "auto_inserted_end" => b.auto_inserted_end(),
            "fostered" => b.fostered(),
            "self_close" => b.self_close(),
            other => return Err(FixtureError::UnknownValue("flag", other.to_string())),
        };
    }
    for mark in &el.diff {
        match mark.as_str() {
            "inserted" => b.inserted(),
            "modified" => b.modified(),
            "children_changed" => b.children_changed(),
            "subtree_changed" => b.subtree_changed(),
            other => return Err(FixtureError::UnknownValue("diff", other.to_string())),
        };
    }
    if let Some(src) = &el.src {
        b.src(src);
    }
    if let Some(src) = &el.start_tag_src {
        b.start_tag_src(src);
    }
    if let Some(src) = &el.end_tag_src {
        b.end_tag_src(src);
    }
    if let Some(target) = &el.target {
        b.target(target);
    }
    if let Some(offset) = el.ext_link_content_offset {
        b.ext_link_content_offset(offset);
    }
    if let Some(name) = &el.stripped_name {
        b.stripped_name(name);
    }
    if let Some(label) = &el.label {
        let mut id = None;
        b.id_into(&mut id);
        if let Some(id) = id
            && labels.insert(label.clone(), id).is_some()
        {
            return Err(FixtureError::DuplicateLabel(label.clone()));
        }
    }
    for child in &el.children {
        build_node(b, child, labels)?;
    }
    b.close();
    Ok(())
}
