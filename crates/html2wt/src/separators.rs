//! Separator reconstruction.
//!
//! Between any two emitted fragments sits a separator: whitespace and
//! comments. When the original source is available and both neighbours are
//! unedited, the separator is cut out of the source using their DSR.
//! Otherwise it is synthesized from whatever separator text the DOM held,
//! padded or trimmed to satisfy the accumulated newline constraints, and
//! finally guarded against accidentally starting an indent-pre.

use log::trace;
use tools::{comment_wikitext, comment_wikitext_len, count_newlines, is_valid_separator};
use tools::{separator_bits, trailing_space_runs};
use wtdom::predicates::{
    emits_sol_transparent_single_line_wt, first_non_deleted_child, indent_pre_dsr_correction,
    is_block_node_with_visible_wt, is_child_table_tag, is_content_node, is_diff_marker,
    is_encapsulation_wrapper, is_iew, is_list_or_list_item, is_literal_html,
    is_nested_in_list_item, is_sol_space_sensitive_tag, is_strong_indent_pre_suppressing_tag,
    is_weak_indent_pre_suppressing_tag, is_zero_width_wikitext_elt, next_to_deleted_block_node,
    previous_non_sep_sibling,
};
use wtdom::traverse::text_content;
use wtdom::{DiagnosticKind, Document, DomSourceRange, NodeId, NodeKind, Stx};

use crate::constraints::{
    ConstraintInfo, NlConstraint, SepType, SeparatorConstraints, get_sep_nl_constraints,
    merge_constraints,
};
use crate::serializer::WikitextSerializer;

const TRACE: &str = "html2wt.sep";

impl WikitextSerializer<'_> {
    /// Collect separator-only nodes into `sep.src`.
    ///
    /// Returns true when the node was consumed. Text that merely starts with
    /// a newline run contributes that run and still gets serialized.
    pub(crate) fn handle_separator_text(&mut self, node: NodeId) -> bool {
        match self.doc.kind(node) {
            NodeKind::Text(text) if !self.state.in_indent_pre => {
                if text.chars().all(char::is_whitespace) {
                    self.state.append_sep(text);
                    return true;
                }
                let run = leading_newline_run(text);
                if !run.is_empty() {
                    self.state.sep.src.get_or_insert_default().push_str(run);
                }
                false
            }
            NodeKind::Comment(text) => {
                self.state
                    .sep
                    .src
                    .get_or_insert_default()
                    .push_str(&comment_wikitext(text));
                true
            }
            _ => false,
        }
    }

    /// Ask the handlers of `a` and `b` how they want to be separated and fold
    /// the answer into the pending separator.
    pub(crate) fn update_separator_constraints(&mut self, a: NodeId, b: NodeId) {
        let doc = self.doc;
        let handlers = self.handlers;
        let handler_a = handlers.handler(doc, a);
        let handler_b = handlers.handler(doc, b);

        let (sep_type, nl) = if doc.parent(b) == Some(a) {
            (
                SepType::ParentChild,
                get_sep_nl_constraints(handler_a.first_child(self, a, b), handler_b.before(self, b, a)),
            )
        } else if doc.parent(a) == Some(b) {
            (
                SepType::ChildParent,
                get_sep_nl_constraints(handler_a.after(self, a, b), handler_b.last_child(self, b, a)),
            )
        } else {
            (
                SepType::Sibling,
                get_sep_nl_constraints(handler_a.after(self, a, b), handler_b.before(self, b, a)),
            )
        };

        let nl = match self.state.sep.constraints {
            Some(old) => merge_constraints(old.nl, nl, Some(b), &mut self.diagnostics),
            None => nl,
        };
        trace!(
            target: TRACE,
            "constraint | {} | <{},{}> | {nl:?}",
            sep_type.as_str(),
            doc.node_name(a),
            doc.node_name(b)
        );
        self.state.sep.constraints = Some(SeparatorConstraints {
            nl,
            info: ConstraintInfo {
                on_sol: self.state.on_sol,
                force_sol: handler_b.force_sol(),
                sep_type,
                node_a: a,
                node_b: b,
            },
        });
    }

    /// Separator to emit before `node`'s output, or `None` when nothing is
    /// pending.
    pub(crate) fn build_sep(&mut self, node: NodeId) -> Option<String> {
        let doc = self.doc;
        let prev = self.state.sep.last_source_node;

        let mut sep = None;
        if let Some(prev) = prev
            && prev != node
            && self.state.reuses_source()
            && !self.state.in_modified_content
            && !next_to_deleted_block_node(doc, Some(prev), true)
            && !next_to_deleted_block_node(doc, Some(node), false)
            && orig_src_valid_in_edited_context(doc, prev)
            && orig_src_valid_in_edited_context(doc, node)
        {
            sep = self.source_separator(prev, node);
        }

        let constraints = self.state.sep.constraints;
        let collected = self.state.sep.src.clone().unwrap_or_default();
        trace!(
            target: TRACE,
            "maybe-sep | prev={:?} node={} sep={sep:?} collected={collected:?}",
            prev.map(|p| doc.node_name(p)),
            doc.node_name(node)
        );

        let reusable = sep
            .as_deref()
            .is_some_and(|s| is_valid_separator(s) && (collected.is_empty() || collected == s));
        if !reusable {
            sep = if constraints.is_some() || !collected.is_empty() {
                let nl = constraints.map_or(NlConstraint::at_most(0), |c| c.nl);
                Some(make_separator(
                    doc,
                    &collected,
                    nl,
                    constraints.map(|c| c.info).as_ref(),
                    self.state.at_start_of_output,
                ))
            } else {
                None
            };
        }

        sep.map(|sep| self.make_sep_indent_pre_safe(sep, constraints.as_ref()))
    }

    /// Cut the separator between `prev` and `node` out of the source.
    fn source_separator(&mut self, prev: NodeId, node: NodeId) -> Option<String> {
        let doc = self.doc;

        let dsr_a = if doc.data(prev).is_some() {
            handle_auto_inserted(doc, prev)
        } else {
            let parent = doc.parent(prev);
            let prev_sibling = doc.prev_sibling(prev);
            let siblings_stable = doc
                .parent(node)
                .is_none_or(|p| !doc.diff(p).children_changed);
            if doc.next_sibling(prev).is_none()
                && let Some(parent) = parent.filter(|&p| p != node)
                && dsr_of(doc, parent).is_some_and(|d| d.close_width == Some(0))
            {
                handle_auto_inserted(doc, parent)
            } else if let Some(ps) = prev_sibling.filter(|&ps| doc.is_element(ps))
                && let Some(end) = dsr_of(doc, ps).and_then(|d| d.end)
                && siblings_stable
            {
                let len = match doc.kind(prev) {
                    NodeKind::Comment(text) => comment_wikitext_len(text),
                    NodeKind::Text(text) => text.len(),
                    _ => 0,
                };
                let end_a = end + len + indent_pre_dsr_correction(doc, prev);
                Some(DomSourceRange::known(end, end_a, 0, 0))
            } else {
                None
            }
        };
        let dsr_a = dsr_a?;

        let dsr_b = if doc.data(node).is_none() {
            let parent = doc.parent(node)?;
            let parent_dsr = dsr_of(doc, parent).filter(|d| d.open_width == Some(0));
            match parent_dsr {
                Some(mut dsr) if parent != prev => {
                    let sep_len = preceding_separator_text_len(doc, node)?;
                    if let Some(start) = dsr.start {
                        dsr.start = Some(start + sep_len);
                    }
                    Some(dsr)
                }
                _ => None,
            }
        } else {
            let mut target = node;
            if doc.parent(prev) == Some(node) {
                while doc.next_sibling(target).is_none()
                    && !doc.is_root(target)
                    && !dsr_of(doc, target).is_some_and(|d| d.is_valid())
                    && let Some(parent) = doc.parent(target)
                {
                    target = parent;
                }
            }
            handle_auto_inserted(doc, target)
        };
        let dsr_b = dsr_b?;

        let (Some(a_start), Some(a_end), Some(b_start), Some(b_end)) =
            (dsr_a.start, dsr_a.end, dsr_b.start, dsr_b.end)
        else {
            return None;
        };

        if a_start <= b_start {
            if b_end <= a_end {
                if a_start == b_start && a_end == b_end {
                    Some(String::new())
                } else {
                    let open = dsr_a.open_width?;
                    self.orig_src(a_start + open, b_start).map(str::to_string)
                }
            } else if a_end <= b_start {
                self.orig_src(a_end, b_start).map(str::to_string)
            } else {
                let inner_end = b_end.checked_sub(dsr_b.close_width?)?;
                self.orig_src(a_end, inner_end).map(str::to_string)
            }
        } else if a_end <= b_end {
            let inner_end = b_end.checked_sub(dsr_b.close_width?)?;
            self.orig_src(a_end, inner_end).map(str::to_string)
        } else {
            self.diagnostics.report(
                DiagnosticKind::DsrBackwards,
                Some(node),
                format!("A=[{a_start},{a_end}] B=[{b_start},{b_end}]"),
            );
            None
        }
    }

    /// Escape a run of spaces after a newline that would otherwise start an
    /// indent-pre before the next node.
    pub(crate) fn make_sep_indent_pre_safe(
        &mut self,
        sep: String,
        constraints: Option<&SeparatorConstraints>,
    ) -> String {
        let doc = self.doc;
        let info = constraints.map(|c| c.info);
        let sep_type = info.map(|i| i.sep_type);
        let on_sol = info.is_some_and(|i| i.on_sol);
        let force_sol = info.is_some_and(|i| i.force_sol && i.sep_type != SepType::ChildParent);

        let runs = trailing_space_runs(&sep);
        let Some(run) = runs.first().cloned() else {
            return sep;
        };
        let after_newline = runs
            .iter()
            .any(|r| r.start > 0 && sep.as_bytes()[r.start - 1] == b'\n');
        if self.state.in_php_block
            || self.state.in_indent_pre
            || !(after_newline || on_sol || force_sol)
        {
            return sep;
        }

        let orig_b = info.map(|i| i.node_b);
        let mut node_b = orig_b;
        let mut safe = false;

        if node_b.is_some_and(|b| preceding_space_suppresses_indent_pre(doc, b, orig_b)) {
            safe = true;
        } else if sep_type == Some(SepType::Sibling)
            || info.is_some_and(|i| doc.is_root(i.node_a))
        {
            while let Some(b) = node_b
                && (is_diff_marker(doc, b) || emits_sol_transparent_single_line_wt(doc, b))
            {
                node_b = doc.next_sibling(b);
            }
            safe = node_b.is_none_or(|b| preceding_space_suppresses_indent_pre(doc, b, orig_b));
        }

        if let Some(b) = node_b.filter(|&b| !doc.is_root(b)) {
            let mut parent_b = doc.parent(b);
            while let Some(p) = parent_b
                && is_zero_width_wikitext_elt(doc, p)
            {
                parent_b = doc.parent(p);
            }
            if let Some(p) = parent_b {
                if is_weak_indent_pre_suppressing_tag(doc.node_name(p)) && doc.is_element(p) {
                    safe = true;
                } else {
                    let mut cursor = Some(p);
                    while let Some(c) = cursor.filter(|&c| !doc.is_root(c)) {
                        let name = doc.node_name(c);
                        if is_strong_indent_pre_suppressing_tag(name)
                            && (name != "p" || is_literal_html(doc, c))
                        {
                            safe = true;
                        }
                        cursor = doc.parent(c);
                    }
                }
            }
        }

        let strip_leading_space = (on_sol || force_sol)
            && node_b.is_some_and(|b| doc.is_element(b) && is_sol_space_sensitive_tag(doc.node_name(b)));
        if safe && !strip_leading_space {
            return sep;
        }

        let mut out = String::with_capacity(sep.len() + 17);
        out.push_str(&sep[..run.start]);
        if !strip_leading_space {
            self.state.on_sol = false;
            self.state.has_indent_pre_nowikis = true;
            out.push_str("<nowiki>");
            out.push_str(&sep[run.clone()]);
            out.push_str("</nowiki>");
        }
        out.push_str(&sep[run.end..]);
        trace!(target: TRACE, "ipre-safe | {sep:?} -> {out:?}");
        out
    }
}

/// `[ \t]*\n+` at the start of `text`, or "".
fn leading_newline_run(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut pos = 0;
    while matches!(bytes.get(pos), Some(b' ' | b'\t')) {
        pos += 1;
    }
    let newlines_start = pos;
    while bytes.get(pos) == Some(&b'\n') {
        pos += 1;
    }
    if pos == newlines_start { "" } else { &text[..pos] }
}

fn dsr_of(doc: &Document, node: NodeId) -> Option<DomSourceRange> {
    doc.data(node).and_then(|d| d.dsr)
}

/// DSR with the widths of builder-inserted tags blanked out: a tag that
/// never appeared in the source has no width to skip.
pub(crate) fn handle_auto_inserted(doc: &Document, node: NodeId) -> Option<DomSourceRange> {
    let data = doc.data(node)?;
    let mut dsr = data.dsr?;
    if data.auto_inserted_start {
        dsr.open_width = None;
    }
    if data.auto_inserted_end {
        dsr.close_width = None;
    }
    Some(dsr)
}

/// Byte length of the whitespace and comments between `node` and the start
/// of its parent, or `None` if anything else precedes it.
pub(crate) fn preceding_separator_text_len(doc: &Document, node: NodeId) -> Option<usize> {
    let mut len = 0;
    let mut cursor = doc.prev_sibling(node);
    while let Some(n) = cursor {
        match doc.kind(n) {
            NodeKind::Comment(text) => len += comment_wikitext_len(text),
            NodeKind::Text(text) if is_iew(doc, n) => len += text.len(),
            _ => return None,
        }
        cursor = doc.prev_sibling(n);
    }
    Some(len)
}

/// Whether a run of spaces before `node` is harmless: the node itself starts
/// a new line or is a block with its own markup.
///
/// `sep_node` is the node the separator was built for; if that is a text
/// node its leading newlines are already in the separator and prove nothing.
pub(crate) fn preceding_space_suppresses_indent_pre(
    doc: &Document,
    node: NodeId,
    sep_node: Option<NodeId>,
) -> bool {
    if Some(node) != sep_node && doc.is_text(node) {
        let text = doc.text(node).unwrap_or("");
        return !leading_newline_run(text).is_empty();
    }
    if doc.node_name(node) == "br" {
        return true;
    }
    if is_encapsulation_wrapper(doc, node) {
        return !doc.has_children(node) || text_content(doc, node).starts_with('\n');
    }
    is_block_node_with_visible_wt(doc, node)
}

/// Whether `node`'s source can be reused given what the edit did around it.
pub fn orig_src_valid_in_edited_context(doc: &Document, node: NodeId) -> bool {
    let Some(el) = doc.element(node) else {
        return true;
    };
    if el.is_named("link") && el.has_rel("mw:PageProp/redirect") {
        return doc.parent(node).is_some_and(|p| doc.is_root(p)) && doc.prev_sibling(node).is_none();
    }
    match el.name.as_str() {
        "td" | "th" => {
            let Some(prev) = doc.prev_sibling(node) else {
                return true;
            };
            let prev_diff = doc.diff(prev);
            if !is_diff_marker(doc, prev) && !prev_diff.inserted && !prev_diff.children_changed {
                return true;
            }
            // Row syntax (`||`) needs the cell before it on the same line.
            el.data.stx != Some(Stx::Row)
        }
        "tr" if el.data.start_tag_src.is_none() => previous_non_sep_sibling(doc, node).is_none(),
        _ if is_list_or_list_item(doc, node) && is_nested_in_list_item(doc, node) => {
            // Bullets of a nested item live in its ancestors' source when it
            // is the first child.
            let mut cursor = doc.prev_sibling(node);
            if cursor.is_none() {
                return false;
            }
            while let Some(prev) = cursor {
                if is_diff_marker(doc, prev) || doc.diff(prev).inserted {
                    return false;
                }
                cursor = doc.prev_sibling(prev);
            }
            true
        }
        _ => true,
    }
}

/// Adjust collected separator text `sep` so that its newline count (outside
/// comment-only lines) lies in `[nl.min, nl.max]`.
///
/// Padding goes at the front when the newlines belong to A's side (a parent
/// whose first child is not content, or a sibling before literal HTML) and
/// at the back otherwise. Surplus newlines are removed from the end, never
/// from inside a comment.
pub fn make_separator(
    doc: &Document,
    sep: &str,
    nl: NlConstraint,
    info: Option<&ConstraintInfo>,
    at_start_of_output: bool,
) -> String {
    let bits = separator_bits(sep);
    let sep_nl_count: usize = bits
        .iter()
        .filter(|b| !b.ignorable)
        .map(|b| count_newlines(b.text))
        .sum();

    let mut min_nls = nl.min_or_zero() as usize;
    if at_start_of_output && min_nls > 0 {
        // The start of output already is a line start.
        min_nls -= 1;
    }

    let out = if min_nls > 0 && sep_nl_count < min_nls {
        let pad = "\n".repeat(min_nls - sep_nl_count);
        let prepend = match info {
            Some(info) if info.sep_type == SepType::ParentChild => {
                first_non_deleted_child(doc, info.node_a).is_some_and(|c| !is_content_node(doc, c))
                    && !(is_child_table_tag(doc.node_name(info.node_b))
                        && doc.is_element(info.node_b)
                        && !is_literal_html(doc, info.node_b))
            }
            Some(info) if info.sep_type == SepType::Sibling => is_literal_html(doc, info.node_b),
            _ => false,
        };
        if prepend {
            pad + sep
        } else {
            let mut out = sep.to_string();
            out.push_str(&pad);
            out
        }
    } else if let Some(max) = nl.max.map(|m| m as usize)
        && sep_nl_count > max
    {
        let mut pieces: Vec<(String, bool)> = bits
            .iter()
            .map(|b| (b.text.to_string(), b.ignorable))
            .collect();
        let mut excess = sep_nl_count - max;
        for (text, ignorable) in pieces.iter_mut().rev() {
            if excess == 0 {
                break;
            }
            if *ignorable {
                continue;
            }
            while excess > 0
                && let Some(pos) = text.find('\n')
            {
                text.remove(pos);
                excess -= 1;
            }
        }
        pieces.into_iter().map(|(text, _)| text).collect()
    } else {
        sep.to_string()
    };

    trace!(
        target: TRACE,
        "make-new | {out:?} from {sep:?}, min={min_nls} count={sep_nl_count} {nl:?}"
    );
    out
}
