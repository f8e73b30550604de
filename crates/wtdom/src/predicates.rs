//! Node classification shared by the DSR and separator engines.
//!
//! Tag-name tests are plain `matches!` tables over lowercase names. Node
//! tests take the document and an id; they never panic on a text or comment
//! node, they just answer `false`.

use crate::document::Document;
use crate::node_data::Stx;
use crate::types::{Element, NodeId};

pub fn is_list_tag(name: &str) -> bool {
    matches!(name, "ul" | "ol" | "dl")
}

pub fn is_list_item_tag(name: &str) -> bool {
    matches!(name, "li" | "dt" | "dd")
}

/// Block-level tags as far as wikitext line handling is concerned.
pub fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "div"
            | "p"
            | "table"
            | "tbody"
            | "thead"
            | "tfoot"
            | "caption"
            | "th"
            | "tr"
            | "td"
            | "ul"
            | "ol"
            | "li"
            | "dl"
            | "dt"
            | "dd"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "hgroup"
            | "article"
            | "aside"
            | "nav"
            | "section"
            | "footer"
            | "header"
            | "figure"
            | "figcaption"
            | "fieldset"
            | "details"
            | "blockquote"
            | "hr"
            | "button"
            | "canvas"
            | "center"
            | "col"
            | "colgroup"
            | "embed"
            | "map"
            | "object"
            | "pre"
            | "progress"
    )
}

/// Inline formatting tags that the tree builder reconstructs across blocks.
pub fn is_formatting_tag(name: &str) -> bool {
    matches!(
        name,
        "a" | "b"
            | "big"
            | "code"
            | "em"
            | "font"
            | "i"
            | "nobr"
            | "s"
            | "small"
            | "strike"
            | "strong"
            | "tt"
            | "u"
    )
}

pub fn is_heading_tag(name: &str) -> bool {
    heading_level(name).is_some()
}

pub fn heading_level(name: &str) -> Option<usize> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Tags whose wikitext form has no visible markup of its own.
pub fn is_zero_width_wikitext_tag(name: &str) -> bool {
    matches!(
        name,
        "p" | "meta" | "ol" | "ul" | "dl" | "tbody" | "thead" | "tfoot" | "br" | "figcaption"
    )
}

/// Table tags that appear as children of another table tag.
pub fn is_child_table_tag(name: &str) -> bool {
    matches!(
        name,
        "tbody" | "thead" | "tfoot" | "tr" | "caption" | "th" | "td"
    )
}

/// Leading whitespace on a new line changes how these parse.
pub fn is_sol_space_sensitive_tag(name: &str) -> bool {
    matches!(
        name,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "li" | "dl" | "dd" | "dt"
    )
}

/// Immediate children of these never start an indent-pre.
pub fn is_weak_indent_pre_suppressing_tag(name: &str) -> bool {
    matches!(name, "table" | "tbody" | "tr")
}

/// No descendant of these starts an indent-pre.
pub fn is_strong_indent_pre_suppressing_tag(name: &str) -> bool {
    matches!(
        name,
        "blockquote"
            | "pre"
            | "p"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "dl"
            | "li"
    )
}

fn element_named(doc: &Document, id: NodeId, pred: impl Fn(&str) -> bool) -> bool {
    doc.element(id).is_some_and(|el| pred(&el.name))
}

pub fn is_list(doc: &Document, id: NodeId) -> bool {
    element_named(doc, id, is_list_tag)
}

pub fn is_list_item(doc: &Document, id: NodeId) -> bool {
    element_named(doc, id, is_list_item_tag)
}

pub fn is_list_or_list_item(doc: &Document, id: NodeId) -> bool {
    is_list(doc, id) || is_list_item(doc, id)
}

pub fn is_nested_in_list_item(doc: &Document, id: NodeId) -> bool {
    let mut cursor = doc.parent(id);
    while let Some(parent) = cursor {
        if is_list_item(doc, parent) {
            return true;
        }
        cursor = doc.parent(parent);
    }
    false
}

pub fn is_formatting_elt(doc: &Document, id: NodeId) -> bool {
    element_named(doc, id, is_formatting_tag)
}

/// Some strict ancestor of `id` is an element called `name`.
pub fn has_ancestor_named(doc: &Document, id: NodeId, name: &str) -> bool {
    let mut cursor = doc.parent(id);
    while let Some(parent) = cursor {
        if element_named(doc, parent, |n| n == name) {
            return true;
        }
        cursor = doc.parent(parent);
    }
    false
}

pub fn is_block_node(doc: &Document, id: NodeId) -> bool {
    element_named(doc, id, is_block_tag)
}

pub fn is_literal_html(doc: &Document, id: NodeId) -> bool {
    doc.data(id).is_some_and(|d| d.is_literal_html())
}

pub fn is_zero_width_wikitext_elt(doc: &Document, id: NodeId) -> bool {
    element_named(doc, id, is_zero_width_wikitext_tag) && !is_literal_html(doc, id)
}

/// A block element whose wikitext form has visible markup.
pub fn is_block_node_with_visible_wt(doc: &Document, id: NodeId) -> bool {
    is_block_node(doc, id) && !is_zero_width_wikitext_elt(doc, id)
}

/// A `pre` produced by leading-space indentation rather than a `<pre>` tag.
pub fn is_indent_pre(doc: &Document, id: NodeId) -> bool {
    element_named(doc, id, |n| n == "pre") && !is_literal_html(doc, id)
}

/// Bytes a text node inside an indent-pre lost to the stripped leading
/// spaces: one per newline (the pre's trailing newline excluded).
pub fn indent_pre_dsr_correction(doc: &Document, text_node: NodeId) -> usize {
    let Some(parent) = doc.parent(text_node) else {
        return 0;
    };
    if !doc.is_text(text_node) || !is_indent_pre(doc, parent) {
        return 0;
    }
    let bytes = doc.text(text_node).unwrap_or("").as_bytes();
    if doc.last_child(parent) == Some(text_node) {
        bytes
            .windows(2)
            .filter(|w| w[0] == b'\n' && w[1] != b'\n')
            .count()
    } else {
        bytes.iter().filter(|&&b| b == b'\n').count()
    }
}

fn meta_with(doc: &Document, id: NodeId, pred: impl Fn(&Element) -> bool) -> bool {
    doc.element(id).is_some_and(|el| el.is_named("meta") && pred(el))
}

pub fn is_marker_meta(doc: &Document, id: NodeId, ty: &str) -> bool {
    meta_with(doc, id, |el| el.has_typeof(ty))
}

/// `mw:EndTag` / `mw:TSRMarker` metas that only carry a source range.
pub fn is_range_marker_meta(doc: &Document, id: NodeId) -> bool {
    meta_with(doc, id, |el| {
        el.has_typeof("mw:EndTag") || el.has_typeof("mw:TSRMarker")
    })
}

pub fn is_diff_marker(doc: &Document, id: NodeId) -> bool {
    meta_with(doc, id, |el| {
        el.typeof_matches(|t| t.starts_with("mw:DiffMarker/"))
    })
}

pub fn is_deleted_marker(doc: &Document, id: NodeId) -> bool {
    is_marker_meta(doc, id, "mw:DiffMarker/deleted")
}

/// Deleted-node marker standing in for a block element.
pub fn is_deleted_block_node(doc: &Document, id: NodeId) -> bool {
    is_deleted_marker(doc, id) && doc.element(id).is_some_and(|el| el.attr("data-is-block").is_some())
}

fn template_meta_type(el: &Element) -> Option<&str> {
    el.attr("typeof")?.split_ascii_whitespace().find(|t| {
        matches!(
            *t,
            "mw:Transclusion" | "mw:Transclusion/End" | "mw:Param" | "mw:Param/End"
        ) || t.starts_with("mw:Extension/")
    })
}

/// Start or end boundary meta of template, parameter or extension output.
pub fn is_template_marker_meta(doc: &Document, id: NodeId) -> bool {
    meta_with(doc, id, |el| template_meta_type(el).is_some())
}

pub fn is_template_start_marker_meta(doc: &Document, id: NodeId) -> bool {
    meta_with(doc, id, |el| {
        template_meta_type(el).is_some_and(|t| !t.ends_with("/End"))
    })
}

pub fn is_dom_fragment_wrapper(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|el| el.typeof_matches(|t| t.starts_with("mw:DOMFragment")))
}

/// First node of encapsulated template, extension or variant output.
pub fn is_encapsulation_wrapper(doc: &Document, id: NodeId) -> bool {
    doc.element(id).is_some_and(|el| {
        el.typeof_matches(|t| {
            matches!(t, "mw:Transclusion" | "mw:Param" | "mw:LanguageVariant")
                || t.starts_with("mw:Extension/")
        })
    })
}

pub fn is_placeholder(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|el| el.typeof_matches(|t| t.starts_with("mw:Placeholder")))
}

pub fn is_language_variant(doc: &Document, id: NodeId) -> bool {
    doc.element(id)
        .is_some_and(|el| el.has_typeof("mw:LanguageVariant"))
}

/// `[[…]]` syntax, including interwiki links written that way.
pub fn uses_wiki_link_syntax(el: &Element) -> bool {
    el.has_rel("mw:WikiLink")
        || el
            .data
            .stx
            .is_some_and(|stx| !matches!(stx, Stx::Url | Stx::MagicLink))
}

/// `[http://… label]` syntax.
pub fn uses_ext_link_syntax(el: &Element) -> bool {
    el.has_rel("mw:ExtLink") && !matches!(el.data.stx, Some(Stx::Url | Stx::MagicLink))
}

pub fn uses_url_link_syntax(el: &Element) -> bool {
    el.has_rel("mw:ExtLink") && el.data.stx == Some(Stx::Url)
}

pub fn uses_magic_link_syntax(el: &Element) -> bool {
    el.has_rel("mw:ExtLink") && el.data.stx == Some(Stx::MagicLink)
}

/// Whitespace-only text.
pub fn is_iew(doc: &Document, id: NodeId) -> bool {
    doc.is_text(id) && doc.text(id).is_some_and(|t| t.chars().all(char::is_whitespace))
}

/// Anything but comments, whitespace-only text and diff markers.
pub fn is_content_node(doc: &Document, id: NodeId) -> bool {
    !doc.is_comment(id) && !is_iew(doc, id) && !is_diff_marker(doc, id)
}

pub fn is_category_link(doc: &Document, id: NodeId) -> bool {
    doc.element(id).is_some_and(|el| {
        el.is_named("link") && el.has_rel("mw:PageProp/Category")
    })
}

fn sol_transparent_link(el: &Element) -> bool {
    el.is_named("link")
        && (el.has_rel("mw:PageProp/Category")
            || el.has_rel("mw:PageProp/redirect")
            || el.has_rel("mw:PageProp/Language"))
}

/// Category, redirect and interlanguage links: they render nowhere and
/// leave the line state alone.
pub fn is_sol_transparent_link(doc: &Document, id: NodeId) -> bool {
    doc.element(id).is_some_and(sol_transparent_link)
}

/// Nodes that vanish from rendered output (comments, page-property links,
/// behavior-switch metas).
pub fn is_rendering_transparent(doc: &Document, id: NodeId) -> bool {
    if doc.is_comment(id) {
        return true;
    }
    let Some(el) = doc.element(id) else {
        return false;
    };
    sol_transparent_link(el)
        || (el.is_named("meta")
            && (el.has_typeof("mw:StartTag")
                || el.has_typeof("mw:EndTag")
                || !el.data.is_literal_html()))
        || (el.is_named("span") && el.has_typeof("mw:FallbackId"))
}

/// Emits single-line wikitext that leaves the start-of-line state alone.
pub fn emits_sol_transparent_single_line_wt(doc: &Document, id: NodeId) -> bool {
    if let Some(text) = doc.text(id).filter(|_| doc.is_text(id)) {
        return text.bytes().all(|b| b == b' ' || b == b'\t');
    }
    is_rendering_transparent(doc, id)
}

/// Node was added by the edit.
pub fn is_new_elt(doc: &Document, id: NodeId) -> bool {
    doc.is_element(id) && doc.diff(id).inserted
}

pub fn previous_non_sep_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut cursor = doc.prev_sibling(id);
    while let Some(prev) = cursor {
        if is_content_node(doc, prev) {
            return Some(prev);
        }
        cursor = doc.prev_sibling(prev);
    }
    None
}

pub fn next_non_sep_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut cursor = doc.next_sibling(id);
    while let Some(next) = cursor {
        if is_content_node(doc, next) {
            return Some(next);
        }
        cursor = doc.next_sibling(next);
    }
    None
}

pub fn previous_non_deleted_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut cursor = doc.prev_sibling(id);
    while let Some(prev) = cursor {
        if !is_diff_marker(doc, prev) {
            return Some(prev);
        }
        cursor = doc.prev_sibling(prev);
    }
    None
}

pub fn first_non_deleted_child(doc: &Document, id: NodeId) -> Option<NodeId> {
    doc.children(id).find(|&c| !is_diff_marker(doc, c))
}

pub fn last_non_deleted_child(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut cursor = doc.last_child(id);
    while let Some(child) = cursor {
        if !is_diff_marker(doc, child) {
            return Some(child);
        }
        cursor = doc.prev_sibling(child);
    }
    None
}

pub fn next_non_deleted_sibling(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut cursor = doc.next_sibling(id);
    while let Some(next) = cursor {
        if !is_diff_marker(doc, next) {
            return Some(next);
        }
        cursor = doc.next_sibling(next);
    }
    None
}

pub fn first_non_sep_child(doc: &Document, id: NodeId) -> Option<NodeId> {
    doc.children(id).find(|&c| is_content_node(doc, c))
}

pub fn last_non_sep_child(doc: &Document, id: NodeId) -> Option<NodeId> {
    let mut cursor = doc.last_child(id);
    while let Some(child) = cursor {
        if is_content_node(doc, child) {
            return Some(child);
        }
        cursor = doc.prev_sibling(child);
    }
    None
}

/// Whether `node` sat next to a block element that the edit deleted, looking
/// past rendering-transparent neighbours and zero-width wikitext parents.
pub fn next_to_deleted_block_node(doc: &Document, node: Option<NodeId>, before: bool) -> bool {
    let Some(mut orig) = node else {
        return false;
    };
    if doc.is_root(orig) {
        return false;
    }
    loop {
        let mut cursor = Some(orig);
        loop {
            cursor = cursor.and_then(|n| {
                if before {
                    doc.prev_sibling(n)
                } else {
                    doc.next_sibling(n)
                }
            });
            match cursor {
                Some(n) if is_deleted_marker(doc, n) => return is_deleted_block_node(doc, n),
                Some(n) if emits_sol_transparent_single_line_wt(doc, n) => continue,
                _ => break,
            }
        }
        if cursor.is_some() {
            return false;
        }
        match doc.parent(orig) {
            Some(parent) if is_zero_width_wikitext_elt(doc, parent) => orig = parent,
            _ => return false,
        }
    }
}
