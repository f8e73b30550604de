//! Per-tag serialization handlers.
//!
//! A handler renders one kind of node and states how many newlines it wants
//! around itself. The separator engine asks both nodes of every adjacent
//! pair; see [`crate::constraints`] for how the answers combine.

mod blocks;
mod html;
mod inline;
mod lists;
mod tables;

use wtdom::predicates::{
    first_non_deleted_child, is_block_node, is_encapsulation_wrapper, is_formatting_elt, is_list,
    is_list_item, is_list_or_list_item, is_new_elt, is_placeholder, last_non_sep_child,
    next_non_sep_sibling,
};
use wtdom::{Document, NodeId, NodeKind, Stx};

use crate::constraints::NlConstraint;
use crate::serializer::WikitextSerializer;

pub use blocks::{BodyHandler, BrHandler, HeadingHandler, HrHandler, MetaHandler, PHandler, PreHandler};
pub use html::HtmlHandler;
pub use inline::{LinkHandler, QuoteHandler, SourceHandler, TextHandler};
pub use lists::{ListHandler, ListItemHandler};
pub use tables::{CaptionHandler, CellHandler, RowHandler, TableHandler, TableSectionHandler};

pub trait DomHandler: Sync {
    /// Emit `node` and return the node the walk continues with (normally
    /// the next sibling).
    ///
    /// `wrapper_unmodified` is set in selective mode when only the node's
    /// descendants changed: its own opening and closing markup may then be
    /// copied from source.
    fn handle(
        &self,
        ser: &mut WikitextSerializer<'_>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> Option<NodeId>;

    fn before(&self, _ser: &WikitextSerializer<'_>, _node: NodeId, _other: NodeId) -> NlConstraint {
        NlConstraint::NONE
    }

    fn after(&self, _ser: &WikitextSerializer<'_>, _node: NodeId, _other: NodeId) -> NlConstraint {
        NlConstraint::NONE
    }

    fn first_child(
        &self,
        _ser: &WikitextSerializer<'_>,
        _node: NodeId,
        _other: NodeId,
    ) -> NlConstraint {
        NlConstraint::NONE
    }

    fn last_child(
        &self,
        _ser: &WikitextSerializer<'_>,
        _node: NodeId,
        _other: NodeId,
    ) -> NlConstraint {
        NlConstraint::NONE
    }

    /// The node must start a wikitext line; whitespace before it is never
    /// left to start an indent-pre.
    fn force_sol(&self) -> bool {
        false
    }
}

/// Maps a node to its handler.
pub trait HandlerTable: Sync {
    fn handler(&self, doc: &Document, node: NodeId) -> &dyn DomHandler;
}

/// The built-in table.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultHandlers;

pub(crate) static DEFAULT_HANDLERS: DefaultHandlers = DefaultHandlers;

impl HandlerTable for DefaultHandlers {
    fn handler(&self, doc: &Document, node: NodeId) -> &dyn DomHandler {
        let el = match doc.kind(node) {
            NodeKind::Document => return &BodyHandler,
            NodeKind::Element(el) => el,
            NodeKind::Text(_) | NodeKind::Comment(_) => return &TextHandler,
        };
        if el.data.src.is_some()
            && (is_encapsulation_wrapper(doc, node)
                || is_placeholder(doc, node)
                || el.has_typeof("mw:Entity"))
        {
            return &SourceHandler;
        }

        let literal = el.data.is_literal_html();
        match el.name.as_str() {
            "a" if el.has_rel("mw:WikiLink")
                || el.has_rel("mw:WikiLink/Interwiki")
                || el.has_rel("mw:ExtLink") =>
            {
                &LinkHandler
            }
            "link" if el.attr("rel").is_some_and(|r| r.starts_with("mw:PageProp/")) => {
                &LinkHandler
            }
            "meta" => &MetaHandler,
            _ if literal => &HtmlHandler,
            "p" => &PHandler,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => &HeadingHandler,
            "ul" | "ol" | "dl" => &ListHandler,
            "li" | "dt" | "dd" => &ListItemHandler,
            "b" | "i" => &QuoteHandler,
            "pre" => &PreHandler,
            "hr" => &HrHandler,
            "br" => &BrHandler,
            "table" => &TableHandler,
            "tbody" | "thead" | "tfoot" => &TableSectionHandler,
            "tr" => &RowHandler,
            "td" | "th" => &CellHandler,
            "caption" => &CaptionHandler,
            _ => &HtmlHandler,
        }
    }
}

fn is_html(doc: &Document, node: NodeId) -> bool {
    doc.data(node).is_some_and(|d| d.stx == Some(Stx::Html))
}

/// Newlines a list or list item wants after itself before `other`.
pub(crate) fn wt_list_eol(doc: &Document, node: NodeId, other: NodeId) -> NlConstraint {
    if !doc.is_element(other) {
        return NlConstraint::range(0, 2);
    }
    if is_encapsulation_wrapper(doc, other) {
        return NlConstraint::range(if is_list(doc, node) { 1 } else { 0 }, 2);
    }

    let next = next_non_sep_sibling(doc, node);
    let other_has_src = doc.data(other).is_some_and(|d| d.src.is_some());
    if (next == Some(other) && is_html(doc, other)) || other_has_src {
        NlConstraint::range(0, 2)
    } else if next == Some(other) && is_list_or_list_item(doc, other) {
        let parent_name = doc.parent(node).map_or("", |p| doc.node_name(p));
        if is_list(doc, node) && doc.node_name(other) == doc.node_name(node) {
            // Adjacent lists of one type would merge.
            NlConstraint::range(2, 2)
        } else if is_list_item(doc, node) || matches!(parent_name, "li" | "dd") {
            NlConstraint::range(1, 1)
        } else {
            NlConstraint::range(1, 2)
        }
    } else if is_list(doc, other) || is_html(doc, other) {
        // Other is our enclosing list; it decides.
        NlConstraint::NONE
    } else if doc
        .parent(node)
        .is_some_and(|p| is_block_node(doc, p) && last_non_sep_child(doc, p) == Some(node))
    {
        NlConstraint::range(1, 2)
    } else if is_formatting_elt(doc, other) {
        NlConstraint::range(1, 1)
    } else {
        NlConstraint::range(2, 2)
    }
}

/// Bullet prefix (`**`, `#:`, `;` …) for a list item, read off its
/// ancestors.
pub(crate) fn list_bullets(doc: &Document, node: NodeId) -> String {
    let mut bullets = String::new();
    let mut cursor = Some(node);
    while let Some(n) = cursor {
        let Some(data) = doc.data(n) else {
            break;
        };
        let name = doc.node_name(n);
        let wikitext_list = !data.is_literal_html()
            && matches!(name, "ul" | "ol" | "dl" | "li" | "dt" | "dd");
        if wikitext_list {
            let bullet = match name {
                "li" => nearest_list_bullet(doc, n),
                "dt" => ";",
                "dd" => ":",
                _ => "",
            };
            bullets.insert_str(0, bullet);
        } else if !(data.is_literal_html() && data.auto_inserted_start && data.auto_inserted_end) {
            break;
        }
        cursor = doc.parent(n);
    }

    if bullets.is_empty() {
        return bullets;
    }
    // New items get `* foo` rather than `*foo`.
    if is_new_elt(doc, node)
        && let Some(first) = first_non_deleted_child(doc, node)
        && !doc.text(first).is_some_and(|t| t.starts_with(char::is_whitespace))
    {
        bullets.push(' ');
    }
    bullets
}

fn nearest_list_bullet(doc: &Document, li: NodeId) -> &'static str {
    let mut cursor = doc.parent(li);
    while let Some(p) = cursor {
        match doc.node_name(p) {
            "ul" => return "*",
            "ol" => return "#",
            _ => cursor = doc.parent(p),
        }
    }
    log::warn!(target: "html2wt.wts", "<li> {li:?} outside any <ul>/<ol>");
    ""
}

#[cfg(test)]
mod tests;
