//! DOM → wikitext driver.
//!
//! Walks the document in order, asking the handler table how to render each
//! element and the separator engine what to put between the pieces. Output
//! is buffered one wikitext line at a time so that [`ConstrainedText`]
//! chunks can see their neighbours before anything is committed.

use std::sync::LazyLock;

use log::trace;
use regex::{Captures, Regex};
use thiserror::Error;
use tools::{ends_at_line_start, is_valid_separator};
use wtdom::predicates::{
    first_non_sep_child, has_ancestor_named, is_block_tag, is_diff_marker,
    is_encapsulation_wrapper, is_literal_html, is_zero_width_wikitext_elt, next_non_sep_sibling,
    next_to_deleted_block_node, previous_non_sep_sibling,
};
use wtdom::{Diagnostics, Document, NodeId, NodeKind};

use crate::config::{SerializeMode, SerializerConfig, WikiConfig};
use crate::constrained_text::{ChunkKind, ConstrainedText};
use crate::constraints::SepType;
use crate::escape::{EscapeContext, escape_entities, escape_wikitext};
use crate::handlers::{DEFAULT_HANDLERS, HandlerTable};
use crate::separators::orig_src_valid_in_edited_context;
use crate::state::SerializerState;

const TRACE: &str = "html2wt.wts";

static DOUBLE_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n)+").expect("valid regex"));
static TRAILING_NEWLINE_SEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*$").expect("valid regex"));
static LEADING_NEWLINE_SEP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*\n+\s*").expect("valid regex"));
static SOL_WIKITEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:<!--.*?-->)*)([ *#:;{|!=].*)$").expect("valid regex"));
static SOL_BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[*#:;]|\{\||.*=$)").expect("valid regex"));
static INDENT_PRE_NOWIKI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:<!--.*?-->)*)<nowiki>(\s+)</nowiki>(.*)$").expect("valid regex")
});
static SOL_TRANSPARENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s|<!--.*?-->|\[\[Category:[^\]]*\]\])*$").expect("valid regex")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)[^<>]*>").expect("valid regex"));
static TRAILING_NOWIKI_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([^=\n]*?)(?:<nowiki\s*/>[ \t]*)+$").expect("valid regex")
});

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SerializeError {
    #[error("serialization must start at the document root, got {0:?}")]
    NotADocument(NodeId),
    #[error("{0:?} serialization needs the original source text")]
    MissingSource(SerializeMode),
}

#[derive(Debug)]
pub struct SerializeOutput {
    pub wikitext: String,
    pub diagnostics: Diagnostics,
}

/// Which flag a nested serialization runs under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChildScope {
    Link,
    IndentPre,
}

pub struct WikitextSerializer<'a> {
    pub(crate) doc: &'a Document,
    source: Option<&'a str>,
    config: &'a SerializerConfig,
    pub(crate) handlers: &'a dyn HandlerTable,
    pub(crate) state: SerializerState,
    pub(crate) diagnostics: Diagnostics,
}

/// Serialize `doc` with the default handler tables.
pub fn serialize(
    doc: &Document,
    source: Option<&str>,
    config: &SerializerConfig,
) -> Result<SerializeOutput, SerializeError> {
    WikitextSerializer::new(doc, source, config).serialize(doc.root())
}

impl<'a> WikitextSerializer<'a> {
    pub fn new(doc: &'a Document, source: Option<&'a str>, config: &'a SerializerConfig) -> Self {
        Self {
            doc,
            source,
            config,
            handlers: &DEFAULT_HANDLERS,
            state: SerializerState::new(config.mode),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_handlers(mut self, handlers: &'a dyn HandlerTable) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn doc(&self) -> &'a Document {
        self.doc
    }

    pub fn state(&self) -> &SerializerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SerializerState {
        &mut self.state
    }

    pub fn wiki_config(&self) -> &'a WikiConfig {
        &self.config.wiki
    }

    /// `source[start..end]`, when there is a source and the range is sane.
    pub fn orig_src(&self, start: usize, end: usize) -> Option<&'a str> {
        if start > end {
            return None;
        }
        self.source?.get(start..end)
    }

    pub fn serialize(mut self, root: NodeId) -> Result<SerializeOutput, SerializeError> {
        if !self.doc.is_root(root) {
            return Err(SerializeError::NotADocument(root));
        }
        if self.config.mode != SerializeMode::Normal && self.source.is_none() {
            return Err(SerializeError::MissingSource(self.config.mode));
        }

        self.kick_off(root);

        let mut out = std::mem::take(&mut self.state.out);
        if self.state.has_indent_pre_nowikis {
            out = strip_unnecessary_indent_pre_nowikis(&out);
        }
        if self.state.selser {
            out = TRAILING_NOWIKI_MARKERS.replace_all(&out, "$1").into_owned();
        }
        trace!(target: TRACE, "done | {} bytes, {} diagnostics", out.len(), self.diagnostics.len());
        Ok(SerializeOutput {
            wikitext: out,
            diagnostics: self.diagnostics,
        })
    }

    fn kick_off(&mut self, node: NodeId) {
        self.state.update_sep(node);
        self.state.curr_node_unmodified = false;
        self.state.update_modification_flags(node);
        self.state.reset_curr_line(self.doc.first_child(node));
        self.serialize_children(node);
        // Child→parent separator before the end of the scope.
        self.emit_sep_for_node(node);
        self.state.flush_line(&self.config.wiki);
    }

    /// Serialize every child of `node` into the shared state.
    pub fn serialize_children(&mut self, node: NodeId) {
        let mut child = self.doc.first_child(node);
        while let Some(c) = child {
            child = self.serialize_node(c);
        }
        // Children were walked one by one, so `node` itself was modified.
        self.state.curr_node_unmodified = false;
    }

    /// Serialize the children of `node` into a detached string, leaving the
    /// surrounding line and separator state untouched.
    pub fn serialize_children_to_string(&mut self, node: NodeId, scope: ChildScope) -> String {
        let saved_sep = std::mem::take(&mut self.state.sep);
        let saved_out = std::mem::take(&mut self.state.out);
        let saved_line = std::mem::take(&mut self.state.curr_line);
        let saved_sol = self.state.on_sol;
        let saved_start = self.state.at_start_of_output;
        let saved_flags = (
            self.state.prev_node_unmodified,
            self.state.curr_node_unmodified,
            self.state.prev_node,
        );

        self.state.on_sol = false;
        self.state.at_start_of_output = false;
        self.set_scope(scope, true);

        self.kick_off(node);

        let bits = std::mem::replace(&mut self.state.out, saved_out);
        self.set_scope(scope, false);
        self.state.sep = saved_sep;
        self.state.curr_line = saved_line;
        self.state.on_sol = saved_sol;
        self.state.at_start_of_output = saved_start;
        (
            self.state.prev_node_unmodified,
            self.state.curr_node_unmodified,
            self.state.prev_node,
        ) = saved_flags;
        bits
    }

    fn set_scope(&mut self, scope: ChildScope, on: bool) {
        match scope {
            ChildScope::Link => self.state.in_link = on,
            ChildScope::IndentPre => self.state.in_indent_pre = on,
        }
    }

    /// Serialize one node and return the node to continue with.
    fn serialize_node(&mut self, node: NodeId) -> Option<NodeId> {
        let doc = self.doc;
        trace!(
            target: TRACE,
            "node | {} | prev-unmodified={} sol={}",
            doc.node_name(node),
            self.state.prev_node_unmodified,
            self.state.on_sol
        );

        match doc.kind(node) {
            NodeKind::Element(_) if is_diff_marker(doc, node) => {
                self.state.update_sep(node);
                self.state.update_modification_flags(node);
                return doc.next_sibling(node);
            }
            NodeKind::Text(_) => {
                if self.handle_separator_text(node) {
                    return doc.next_sibling(node);
                }
                if self.state.selser {
                    let prev = doc.prev_sibling(node);
                    let parent_is_root = doc.parent(node).is_some_and(|p| doc.is_root(p));
                    self.state.curr_node_unmodified = !self.state.in_modified_content
                        && match prev {
                            None => parent_is_root,
                            Some(prev) => !is_diff_marker(doc, prev),
                        };
                }
            }
            NodeKind::Comment(_) => {
                self.handle_separator_text(node);
                return doc.next_sibling(node);
            }
            NodeKind::Element(_) => {}
            NodeKind::Document => unreachable!("the root is never a child"),
        }

        let before = previous_non_sep_sibling(doc, node).or(doc.parent(node));
        if let Some(before) = before {
            self.update_separator_constraints(before, node);
        }

        let next = if doc.is_element(node) {
            self.serialize_dom_node(node)
        } else {
            let handlers = self.handlers;
            handlers.handler(doc, node).handle(self, node, false)
        };

        let after = next_non_sep_sibling(doc, node).or(doc.parent(node));
        if let Some(after) = after {
            self.update_separator_constraints(node, after);
        }
        self.state.update_modification_flags(node);
        next
    }

    fn serialize_dom_node(&mut self, node: NodeId) -> Option<NodeId> {
        let doc = self.doc;
        let handlers = self.handlers;
        let handler = handlers.handler(doc, node);
        let mut wrapper_unmodified = false;

        if self.state.selser
            && !self.state.in_modified_content
            && orig_src_valid_in_edited_context(doc, node)
            && let Some(data) = doc.data(node)
            && let Some(dsr) = data.valid_dsr()
            && let (Some(start), Some(end)) = (dsr.start, dsr.end)
            && (end > start
                || (end == start && matches!(doc.node_name(node), "p" | "br" | "ol"))
                || data.fostered)
        {
            if !doc.diff(node).any() {
                self.state.curr_node_unmodified = true;
                self.retarget_zero_width_constraints(node);

                if let Some(out) = self.orig_src(start, end) {
                    trace!(target: TRACE, "orig-src | [{start},{end}] = {out:?}");
                    let suppress_single_line = is_encapsulation_wrapper(doc, node)
                        || matches!(doc.node_name(node), "dl" | "ul" | "ol")
                        || (doc.node_name(node) == "table"
                            && doc.parent(node).is_some_and(|p| doc.node_name(p) == "dd")
                            && previous_non_sep_sibling(doc, node).is_none());
                    if suppress_single_line {
                        self.state.single_line.disable();
                    }
                    for chunk in ConstrainedText::from_selser(out, node, doc) {
                        let chunk_node = chunk.node;
                        self.emit_chunk(chunk, chunk_node);
                    }
                    if suppress_single_line {
                        self.state.single_line.pop();
                    }
                    return if is_encapsulation_wrapper(doc, node) {
                        skip_over_encapsulated_content(doc, node)
                    } else {
                        doc.next_sibling(node)
                    };
                }
            } else {
                wrapper_unmodified = doc.diff(node).only_subtree_changed()
                    && dsr.has_valid_tag_widths()
                    && (!(data.auto_inserted_start || data.auto_inserted_end)
                        || matches!(doc.node_name(node), "td" | "th" | "tr"));
            }
        }

        self.state.curr_node_unmodified = false;
        let inserted = self.state.selser && doc.diff(node).inserted;
        let saved = self.state.in_modified_content;
        if inserted {
            self.state.in_modified_content = true;
        }
        let next = handler.handle(self, node, wrapper_unmodified);
        self.state.in_modified_content = saved;
        next
    }

    /// A zero-width wrapper copied from source vanishes; the pending sibling
    /// constraint then really separates its parent from its first child.
    fn retarget_zero_width_constraints(&mut self, node: NodeId) {
        let doc = self.doc;
        let on_sol = self.state.on_sol;
        if !is_zero_width_wikitext_elt(doc, node) {
            return;
        }
        let Some(first) = doc.first_child(node) else {
            return;
        };
        if let Some(constraints) = self.state.sep.constraints.as_mut()
            && constraints.info.sep_type == SepType::Sibling
        {
            constraints.info.on_sol = on_sol;
            constraints.info.sep_type = SepType::ParentChild;
            constraints.info.node_a = node;
            constraints.info.node_b = first;
        }
    }

    /// Emit the separator owed before `node`.
    pub(crate) fn emit_sep_for_node(&mut self, node: NodeId) {
        let doc = self.doc;
        let again = self.state.sep.last_source_node == Some(node);
        let usable = !again
            && self.state.prev_node_unmodified
            && !next_to_deleted_block_node(doc, self.state.prev_node, true)
            && self.state.curr_node_unmodified
            && !next_to_deleted_block_node(doc, Some(node), false);

        let orig_sep = if usable {
            let dsr_of = |n: NodeId| doc.data(n).and_then(|d| d.dsr);
            match self.state.prev_node {
                Some(prev) if doc.data(prev).is_some() && doc.data(node).is_some() => {
                    match (dsr_of(prev).and_then(|d| d.end), dsr_of(node).and_then(|d| d.start)) {
                        (Some(end), Some(start)) => self.orig_src(end, start).map(str::to_string),
                        _ => None,
                    }
                }
                _ => self.state.sep.src.clone(),
            }
        } else {
            None
        };

        match orig_sep.filter(|sep| is_valid_separator(sep)) {
            Some(sep) => {
                trace!(target: TRACE, "orig-sep | {sep:?}");
                self.state.push_sep(sep, node);
            }
            None => {
                let sep = self.build_sep(node).unwrap_or_default();
                self.state.push_sep(sep, node);
            }
        }
    }

    /// Append a chunk to the current line, emitting its separator first.
    pub fn emit_chunk(&mut self, mut chunk: ConstrainedText, node: NodeId) {
        if self.state.single_line.enforced() {
            chunk.text = chunk.text.replace('\n', " ");
        }
        if !chunk.no_sep {
            self.emit_sep_for_node(node);
        }
        if self.state.on_sol {
            self.state.flush_line(&self.config.wiki);
            self.state.reset_curr_line(Some(node));
        }

        if self.state.escape_text {
            let ctx = EscapeContext {
                sol: self.state.on_sol && !(self.state.in_indent_pre || self.state.in_php_block),
                in_table: self.state.wiki_table_nesting > 0,
                in_link: self.state.in_link,
            };
            chunk.text = escape_wikitext(&chunk.text, ctx);
            chunk.kind = ChunkKind::Plain;
            self.state.escape_text = false;
        } else if self.state.selser
            && self.state.on_sol
            && self.state.curr_node_unmodified
            && !self.state.prev_node_unmodified
            && self.doc.node_name(node) == "p"
            && !is_literal_html(self.doc, node)
            && first_non_sep_child(self.doc, node).is_some_and(|c| self.doc.is_text(c))
        {
            // A block tag that kept this text off the line start may have
            // been deleted.
            if let Some(escaped) = self.escape_exposed_line_start(&chunk.text, node) {
                chunk = ConstrainedText {
                    text: escaped,
                    ..ConstrainedText::plain("", node)
                };
            }
        }

        self.state.curr_line.text.push_str(&chunk.text);
        trace!(target: TRACE, "---> {:?}", chunk.text);
        let at_sol = ends_at_line_start(&chunk.text);
        let chunk_node = chunk.node;
        self.state.push(chunk);
        self.state.update_sep(chunk_node);
        if !at_sol {
            self.state.on_sol = false;
        }
        self.state.at_start_of_output = false;
    }

    fn escape_exposed_line_start(&self, text: &str, node: NodeId) -> Option<String> {
        let caps = SOL_WIKITEXT.captures(text)?;
        let lead = caps.get(1).map_or("", |m| m.as_str());
        let body = caps.get(2)?.as_str();
        let needs_escape = SOL_BLOCK_START.is_match(body)
            || (body.starts_with(['|', '!']) && self.state.wiki_table_nesting > 0)
            || (body.starts_with(' ')
                && body[1..].starts_with(|c: char| !c.is_whitespace())
                && !has_ancestor_named(self.doc, node, "blockquote"));
        if !needs_escape {
            return None;
        }
        let first = body.chars().next()?;
        let rest = &body[first.len_utf8()..];
        Some(format!("{lead}<nowiki>{first}</nowiki>{rest}"))
    }

    /// Emit handler-built wikitext, moving leading and trailing newlines
    /// into the surrounding separators.
    pub fn emit_wikitext(&mut self, text: &str, node: NodeId) {
        let body = text.trim_start_matches('\n');
        let lead = &text[..text.len() - body.len()];
        if body.is_empty() {
            self.state.append_sep(lead);
            return;
        }
        let trimmed = body.trim_end_matches('\n');
        let trail = &body[trimmed.len()..];
        if !lead.is_empty() {
            self.state.append_sep(lead);
        }
        self.emit_chunk(ConstrainedText::plain(trimmed, node), node);
        if !trail.is_empty() {
            self.state.append_sep(trail);
        }
    }

    /// Text node: newline runs at either end become separator text, the
    /// rest is entity- and wikitext-escaped unless it came unmodified from
    /// the source.
    pub fn serialize_text_node(&mut self, node: NodeId) {
        let doc = self.doc;
        let Some(text) = doc.text(node) else {
            return;
        };
        let double_newlines = DOUBLE_NEWLINE.find_iter(text).count();
        let trailing_sep = TRAILING_NEWLINE_SEP.find(text).map(|m| m.as_str().to_string());
        let mut res = TRAILING_NEWLINE_SEP.replace(text, "").into_owned();

        if !self.state.in_indent_pre {
            let all_text_siblings = doc
                .parent(node)
                .is_some_and(|p| doc.children(p).all(|c| doc.is_text(c)));
            if !all_text_siblings || double_newlines != 1 {
                res = DOUBLE_NEWLINE.replace_all(&res, "\n").into_owned();
            }
            res = LEADING_NEWLINE_SEP.replace(&res, "").into_owned();
        }

        let res = escape_entities(&res).into_owned();
        self.state.escape_text = self.state.on_sol || !self.state.curr_node_unmodified;
        self.emit_chunk(ConstrainedText::plain(res, node), node);
        self.state.escape_text = false;

        if let Some(sep) = trailing_sep
            && self.state.sep.src.as_deref().is_none_or(str::is_empty)
        {
            self.state.set_sep(sep);
            self.state.update_sep(node);
        }
    }

    /// Source of `node`'s own opening markup, located by its DSR.
    pub fn open_tag_source(&self, node: NodeId) -> Option<&'a str> {
        let dsr = self.doc.data(node)?.dsr?;
        let start = dsr.start?;
        self.orig_src(start, start + dsr.open_width?)
    }

    /// Source of `node`'s own closing markup, located by its DSR.
    pub fn close_tag_source(&self, node: NodeId) -> Option<&'a str> {
        let dsr = self.doc.data(node)?.dsr?;
        let end = dsr.end?;
        self.orig_src(end.checked_sub(dsr.close_width?)?, end)
    }

    /// Opening tag of `node` in literal HTML form.
    pub fn serialize_html_tag(&self, node: NodeId, wrapper_unmodified: bool) -> String {
        let Some(el) = self.doc.element(node) else {
            return String::new();
        };
        if wrapper_unmodified && let Some(src) = self.open_tag_source(node) {
            return src.to_string();
        }
        if let Some(src) = &el.data.start_tag_src {
            return src.clone();
        }
        if el.data.auto_inserted_start {
            return String::new();
        }
        let attrs = self.serialize_attributes(node);
        let close = if el.data.self_close || is_void_tag(&el.name) { " /" } else { "" };
        if attrs.is_empty() {
            format!("<{}{close}>", el.name)
        } else {
            format!("<{} {attrs}{close}>", el.name)
        }
    }

    /// `name="value"` pairs of the author-visible attributes, space separated.
    pub fn serialize_attributes(&self, node: NodeId) -> String {
        let Some(el) = self.doc.element(node) else {
            return String::new();
        };
        let mut out = String::new();
        for (name, value) in &el.attributes {
            if is_internal_attribute(name) {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&value.replace('"', "&quot;"));
                out.push('"');
            }
        }
        out
    }

    /// Wikitext table markup (`{|`, `|-`, `|`, `!!` …) with the element's
    /// attributes. Cells close their attribute list with `end_symbol`, or
    /// ` |` when none is given.
    pub fn serialize_table_tag(
        &self,
        symbol: &str,
        end_symbol: Option<&str>,
        node: NodeId,
        wrapper_unmodified: bool,
    ) -> String {
        if wrapper_unmodified && let Some(src) = self.open_tag_source(node) {
            return src.to_string();
        }
        let attrs = self.serialize_attributes(node);
        if attrs.is_empty() {
            format!("{symbol}{}", end_symbol.unwrap_or(""))
        } else {
            format!("{symbol} {attrs}{}", end_symbol.unwrap_or(" |"))
        }
    }

    /// Closing tag of `node` in literal HTML form, or "" when it has none.
    pub fn serialize_html_end_tag(&self, node: NodeId, wrapper_unmodified: bool) -> String {
        let Some(el) = self.doc.element(node) else {
            return String::new();
        };
        if wrapper_unmodified && let Some(src) = self.close_tag_source(node) {
            return src.to_string();
        }
        if let Some(src) = &el.data.end_tag_src {
            return src.clone();
        }
        if el.data.auto_inserted_end || el.data.self_close || is_void_tag(&el.name) {
            return String::new();
        }
        format!("</{}>", el.name)
    }
}

fn is_internal_attribute(name: &str) -> bool {
    matches!(name, "typeof" | "about" | "data-mw" | "data-parsoid" | "data-is-block")
}

fn is_void_tag(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// First sibling after the run of nodes sharing `node`'s `about` id.
pub(crate) fn skip_over_encapsulated_content(doc: &Document, node: NodeId) -> Option<NodeId> {
    let about = doc.element(node).and_then(|el| el.attr("about"));
    let mut next = doc.next_sibling(node);
    if let Some(about) = about {
        while let Some(n) = next
            && doc.element(n).and_then(|el| el.attr("about")) == Some(about)
        {
            next = doc.next_sibling(n);
        }
    }
    next
}

/// Drop `<nowiki> </nowiki>` guards whose line could not have become an
/// indent-pre anyway.
fn strip_unnecessary_indent_pre_nowikis(out: &str) -> String {
    let lines: Vec<String> = out
        .split('\n')
        .map(|line| {
            INDENT_PRE_NOWIKI
                .replace(line, |caps: &Captures<'_>| {
                    let rest = &caps[3];
                    let required = !SOL_TRANSPARENT_LINE.is_match(rest)
                        && !HTML_TAG.captures_iter(rest).any(|tag| {
                            is_block_tag(&tag[2].to_ascii_lowercase())
                        });
                    if required {
                        caps[0].to_string()
                    } else {
                        format!("{}{}{}", &caps[1], &caps[2], rest)
                    }
                })
                .into_owned()
        })
        .collect();
    lines.join("\n")
}

impl std::fmt::Debug for WikitextSerializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikitextSerializer")
            .field("mode", &self.config.mode)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
