//! DOM source range (DSR) computation.
//!
//! One recursive pass over a freshly built DOM that assigns every element
//! the source slice its serialization came from, plus the widths of its own
//! opening and closing markup.
//!
//! Contract:
//! - Children are visited right to left; each child's start becomes the end
//!   cursor for its left sibling.
//! - A tokenizer range (TSR) is the most trusted anchor. When an anchor moves
//!   a child's end, the new offsets are pushed rightward into following
//!   siblings, never past a template start marker.
//! - `mw:EndTag` / `mw:TSRMarker` metas are consumed: their range is recorded
//!   as the `end_tsr` of the element they close and the meta is removed.
//! - Inconsistencies are recorded in [`Diagnostics`] and never abort the pass.
//!
//! Offsets are computed in `i64` so that intermediate values may go negative;
//! a negative start is stored as unknown and a negative end is clamped to 0.

use log::trace;
use wtdom::predicates::{
    indent_pre_dsr_correction, is_dom_fragment_wrapper, is_language_variant, is_list,
    is_list_item, is_list_or_list_item, is_literal_html, is_nested_in_list_item, is_placeholder,
    is_range_marker_meta, is_template_marker_meta, is_template_start_marker_meta,
    uses_ext_link_syntax, uses_magic_link_syntax, uses_url_link_syntax, uses_wiki_link_syntax,
};
use wtdom::{
    DiagnosticKind, Diagnostics, Document, DomSourceRange, NodeData, NodeId, NodeKind,
    SourceRange, Stx,
};

use crate::config::DsrOptions;
use crate::tag_widths::{TagWidths, has_limited_tsr, is_quote_tag, wt_tag_widths};

const TRACE: &str = "wt2html.dsr";

type Offset = Option<i64>;

fn offset(v: usize) -> i64 {
    v as i64
}

fn to_usize(v: Option<i64>) -> Option<usize> {
    v.and_then(|v| usize::try_from(v).ok())
}

/// Compute DSR for every element of `doc`.
///
/// `source_len` is the byte length of the page source; it bounds the root
/// unless `opts.source_offsets` names a narrower window.
pub fn compute_dsr(
    doc: &mut Document,
    source_len: usize,
    opts: &DsrOptions,
    diagnostics: &mut Diagnostics,
) {
    let start = opts.source_offsets.map_or(0, |r| r.start);
    let end = opts.source_offsets.map_or(source_len, |r| r.end);
    trace!(target: TRACE, "computing DSR over [{start}, {end})");

    let root = doc.root();
    let mut pass = DsrPass {
        doc,
        opts,
        diagnostics,
    };
    pass.compute_node_dsr(root, Some(offset(start)), Some(offset(end)), 0);

    if let Some(data) = pass.doc.data_mut(root) {
        data.dsr = Some(DomSourceRange::known(start, end, 0, 0));
    }
    trace!(target: TRACE, "done computing DSR");
}

struct DsrPass<'a> {
    doc: &'a mut Document,
    opts: &'a DsrOptions,
    diagnostics: &'a mut Diagnostics,
}

impl DsrPass<'_> {
    /// Process `node`'s children given that its content spans `[s, e)` and
    /// return the `[start, end)` actually consumed.
    fn compute_node_dsr(
        &mut self,
        node: NodeId,
        s: Offset,
        mut e: Offset,
        mut dsr_correction: i64,
    ) -> (Offset, Offset) {
        if e.is_none() && !self.doc.has_children(node) {
            e = s;
        }
        trace!(target: TRACE, "BEG: {} with [s, e]=[{s:?}, {e:?}]", self.doc.node_name(node));

        let mut ce = e;
        let mut cs = ce;
        let mut child = self.doc.last_child(node);
        while let Some(c) = child {
            let mut prev_child = self.doc.prev_sibling(c);
            let orig_ce = ce;
            let mut fostered = false;
            let mut marker_tsr: Option<SourceRange> = None;
            let mut is_marker = false;
            cs = None;

            let end_tsr = if self.doc.is_element(c) {
                self.doc.data(c).and_then(|d| d.end_tsr)
            } else {
                None
            };
            if let Some(end_tsr) = end_tsr {
                ce = Some(offset(end_tsr.end));
            }

            if let Some(correction) = self.stripped_tag_correction(c) {
                if let Some(v) = ce.as_mut() {
                    *v += correction;
                }
                dsr_correction = correction;
            }

            trace!(target: TRACE, "  CHILD: {} with [cs, ce]=[{cs:?}, {ce:?}]", self.doc.node_name(c));

            match self.doc.kind(c) {
                NodeKind::Text(text) => {
                    if let Some(v) = ce {
                        cs = Some(v - offset(text.len()) - self.indent_pre_correction(c));
                    }
                }
                NodeKind::Comment(text) => {
                    if let Some(v) = ce {
                        cs = Some(v - offset(tools::comment_wikitext_len(text)));
                    }
                }
                NodeKind::Document => {}
                NodeKind::Element(_) => {
                    let data = self.doc.data(c).cloned().unwrap_or_default();
                    let name = self.doc.node_name(c).to_string();
                    let tsr = data.tsr;
                    let old_ce = tsr.map(|t| offset(t.end));
                    let mut propagate_right = false;
                    let mut st_width: Offset = None;
                    let mut et_width: Offset = None;
                    fostered = data.fostered;

                    // A quote tag re-inserted after a stripped one gives back
                    // the width its neighbour absorbed.
                    if data.auto_inserted_end
                        && is_quote_tag(&name)
                        && let Some(v) = ce
                    {
                        let correction = 3 + offset(name.len());
                        if correction == dsr_correction {
                            ce = Some(v - correction);
                            dsr_correction = 0;
                        }
                    }

                    let src_len = data.src.as_ref().map(|s| offset(s.len()));
                    if name == "meta" {
                        if is_range_marker_meta(self.doc, c) {
                            self.copy_end_tag_src(c, &data);
                            is_marker = true;
                            if let Some(tsr) = tsr {
                                marker_tsr = Some(tsr);
                                cs = Some(offset(tsr.end));
                                ce = Some(offset(tsr.end));
                                propagate_right = true;
                            }
                        } else if let Some(tsr) = tsr {
                            cs = Some(offset(tsr.start));
                            ce = Some(offset(tsr.end));
                            propagate_right = is_template_marker_meta(self.doc, c);
                        } else if is_placeholder(self.doc, c)
                            && let (Some(v), Some(len)) = (ce, src_len)
                        {
                            cs = Some(v - len);
                        }
                    } else if self.has_typeof(c, "mw:Entity")
                        && let (Some(v), Some(len)) = (ce, src_len)
                    {
                        cs = Some(v - len);
                    } else {
                        if is_placeholder(self.doc, c)
                            && let (Some(v), Some(len)) = (ce, src_len)
                        {
                            cs = Some(v - len);
                        } else {
                            if let Some(end_tsr) = end_tsr {
                                et_width = Some(offset(end_tsr.len()));
                            }
                            if let Some(tsr) = tsr.filter(|_| !data.auto_inserted_start) {
                                cs = Some(offset(tsr.start));
                                if self.tsr_spans_tag_dom(c, &data, &name) {
                                    if tsr.end > 0 {
                                        ce = Some(offset(tsr.end));
                                        propagate_right = true;
                                    }
                                } else {
                                    st_width = Some(offset(tsr.len()));
                                }
                                trace!(target: TRACE, "    TSR: {tsr:?}; cs: {cs:?}; ce: {ce:?}");
                            } else if let Some(s) = s
                                && self.doc.prev_sibling(c).is_none()
                            {
                                cs = Some(s);
                            }
                        }

                        (st_width, et_width) =
                            self.compute_tag_widths(st_width, et_width, c, &data, &name);
                        if data.auto_inserted_start {
                            st_width = Some(0);
                        }
                        if data.auto_inserted_end {
                            et_width = Some(0);
                        }

                        let ccs = cs.zip(st_width).map(|(cs, w)| cs + w);
                        let cce = ce.zip(et_width).map(|(ce, w)| ce - w);

                        let new_dsr = if self.skips_subtree(c, &data, &name) {
                            (ccs, cce)
                        } else {
                            trace!(
                                target: TRACE,
                                "    before-recursing: [cs,ce]=[{cs:?},{ce:?}]; [sw,ew]=[{st_width:?},{et_width:?}]; subtree=[{ccs:?},{cce:?}]"
                            );
                            self.compute_node_dsr(c, ccs, cce, dsr_correction)
                        };

                        if let (Some(w), Some(start)) = (st_width, new_dsr.0) {
                            let new_cs = start - w;
                            match cs {
                                None => cs = Some(new_cs),
                                Some(cur) if tsr.is_none() && new_cs < cur => cs = Some(new_cs),
                                Some(_) => {}
                            }
                        }
                        if let (Some(w), Some(end)) = (et_width, new_dsr.1) {
                            let new_ce = end + w;
                            if ce.is_none_or(|cur| new_ce > cur) {
                                ce = Some(new_ce);
                            }
                        }
                    }

                    if cs.is_some() || ce.is_some() {
                        if let Some(v) = cs
                            && v < 0
                        {
                            if !fostered {
                                self.diagnostics.report(
                                    DiagnosticKind::DsrNegative,
                                    Some(c),
                                    format!("negative DSR start {v} for <{name}>; resetting to 0"),
                                );
                            }
                            cs = Some(0);
                        }
                        if let Some(v) = ce
                            && v < 0
                        {
                            if !fostered {
                                self.diagnostics.report(
                                    DiagnosticKind::DsrNegative,
                                    Some(c),
                                    format!("negative DSR end {v} for <{name}>; resetting to 0"),
                                );
                            }
                            ce = Some(0);
                        }

                        let dsr = if fostered {
                            let at = to_usize(orig_ce.map(|v| v.max(0)));
                            DomSourceRange::new(at, at, None, None)
                        } else {
                            DomSourceRange::new(
                                to_usize(cs),
                                to_usize(ce),
                                to_usize(st_width),
                                to_usize(et_width),
                            )
                        };
                        if let Some(d) = self.doc.data_mut(c) {
                            d.dsr = Some(dsr);
                        }
                        trace!(target: TRACE, "    UPDATING {name} with [{cs:?}, {ce:?}]");
                    }

                    if let Some(v) = ce
                        && (propagate_right || old_ce != ce || e.is_none())
                        && !is_template_start_marker_meta(self.doc, c)
                        && let Some(end) = self.propagate_right(c, v)
                    {
                        e = end;
                    }
                }
            }

            if fostered {
                ce = orig_ce;
            } else {
                ce = cs;
            }

            if is_marker {
                if let Some(tsr) = marker_tsr {
                    self.record_end_tsr(c, prev_child, tsr);
                }
                // Collapsing the neighbours keeps later rightward walks short.
                if let Some((merged, left_width)) = self.merge_texts_around(c) {
                    if let Some(v) = ce {
                        cs = Some(v - left_width);
                        ce = cs;
                    }
                    prev_child = self.doc.prev_sibling(merged);
                }
                self.remove_marker(c);
            }

            child = prev_child;
        }

        let cs = cs.or(s);
        if let Some(s) = s
            && cs != Some(s)
            && !self.acceptable_inconsistency(node)
        {
            self.diagnostics.report(
                DiagnosticKind::DsrInconsistent,
                Some(node),
                format!(
                    "cs/s mismatch for <{}>: s={s}; cs={cs:?}",
                    self.doc.node_name(node)
                ),
            );
        }
        trace!(target: TRACE, "END: {}, returning [{cs:?}, {e:?}]", self.doc.node_name(node));
        (cs, e)
    }

    fn has_typeof(&self, id: NodeId, ty: &str) -> bool {
        self.doc.element(id).is_some_and(|el| el.has_typeof(ty))
    }

    /// Width a stripped quote-tag placeholder to the right of `child` hands
    /// over to `child`.
    fn stripped_tag_correction(&self, child: NodeId) -> Option<i64> {
        let next = self.doc.next_sibling(child)?;
        let el = self.doc.element(next)?;
        let src = el.data.src.as_ref()?;
        if !el.has_typeof("mw:Placeholder/StrippedTag") || is_nested_in_list_item(self.doc, next)
        {
            return None;
        }
        let stripped = el.data.stripped_name.as_deref()?;
        let child_name = self.doc.element(child)?.name.as_str();
        (is_quote_tag(stripped) && is_quote_tag(child_name)).then(|| offset(src.len()))
    }

    /// Newlines of an indent-pre's text that the leading-space syntax turned
    /// into extra source bytes.
    fn indent_pre_correction(&self, text_node: NodeId) -> i64 {
        offset(indent_pre_dsr_correction(self.doc, text_node))
    }

    fn tsr_spans_tag_dom(&self, id: NodeId, data: &NodeData, name: &str) -> bool {
        !(has_limited_tsr(name)
            || self.doc.element(id).is_some_and(|el| {
                el.typeof_matches(|t| t == "mw:Placeholder" || t == "mw:LanguageVariant")
            })
            || data.is_literal_html())
    }

    /// Wrappers and plain wikilinks already carry their full range; their
    /// content would only produce spurious mismatches.
    fn skips_subtree(&self, id: NodeId, data: &NodeData, name: &str) -> bool {
        if is_dom_fragment_wrapper(self.doc, id) || is_language_variant(self.doc, id) {
            return true;
        }
        name == "a"
            && data.stx != Some(Stx::Piped)
            && self.doc.element(id).is_some_and(uses_wiki_link_syntax)
    }

    fn compute_tag_widths(
        &self,
        st_width: Offset,
        et_width: Offset,
        id: NodeId,
        data: &NodeData,
        name: &str,
    ) -> (Offset, Offset) {
        let (mut st, mut et) = (st_width, et_width);
        if data.is_literal_html() {
            if data.self_close {
                et = Some(0);
            }
        } else if is_language_variant(self.doc, id) {
            st = Some(2);
            et = Some(2);
        } else if name == "tr" && data.start_tag_src.is_none() {
            st = Some(0);
            et = Some(0);
        } else {
            let mut widths = wt_tag_widths(name);
            if st.is_none() {
                if name == "a" {
                    widths = self.a_tag_widths(id, data);
                    st = widths.and_then(|w| w.open).map(offset);
                } else if name == "li" || name == "dd" {
                    st = Some(offset(self.list_elt_width(id)));
                } else if let Some(w) = widths {
                    st = w.open.map(offset);
                }
            }
            if et.is_none()
                && let Some(w) = widths
            {
                et = w.close.map(offset);
            }
        }
        (st, et)
    }

    /// Markup widths of an anchor by link syntax:
    /// `[[Foo|` / `]]`, `[[` / `]]`, `[http://x ` / `]`, or nothing for
    /// bare URLs and magic links.
    fn a_tag_widths(&self, id: NodeId, data: &NodeData) -> Option<TagWidths> {
        let el = self.doc.element(id)?;
        if uses_wiki_link_syntax(el) && !el.typeof_matches(|t| t.starts_with("mw:ExpandedAttrs")) {
            if data.stx == Some(Stx::Piped) {
                let target = data.target.as_ref().filter(|t| !t.is_empty())?;
                Some(TagWidths::new(Some(target.len() + 3), Some(2)))
            } else {
                Some(TagWidths::new(Some(2), Some(2)))
            }
        } else if let Some(tsr) = data.tsr
            && uses_ext_link_syntax(el)
        {
            let content = data.ext_link_content_offset?;
            Some(TagWidths::new(content.checked_sub(tsr.start), Some(1)))
        } else if uses_url_link_syntax(el) || uses_magic_link_syntax(el) {
            Some(TagWidths::new(Some(0), Some(0)))
        } else {
            None
        }
    }

    /// Bullet count of a list item: its nesting depth, or 0 for the first
    /// item of a chain of nested lists.
    fn list_elt_width(&self, li: NodeId) -> usize {
        if self.doc.prev_sibling(li).is_none()
            && let Some(first) = self.doc.first_child(li)
            && is_list(self.doc, first)
        {
            return 0;
        }

        let mut depth = 0;
        let mut cursor = li;
        while !self.doc.is_root(cursor) {
            if is_list_or_list_item(self.doc, cursor) {
                if is_list_item(self.doc, cursor) {
                    depth += 1;
                }
            } else {
                let transparent = is_literal_html(self.doc, cursor)
                    && self
                        .doc
                        .data(cursor)
                        .is_some_and(|d| d.auto_inserted_start && d.auto_inserted_end);
                if !transparent {
                    break;
                }
            }
            match self.doc.parent(cursor) {
                Some(parent) => cursor = parent,
                None => break,
            }
        }
        depth
    }

    /// Re-stamp the starts of `child`'s right siblings from `ce`.
    ///
    /// Returns `Some(new_end)` when the walk ran off the end of the sibling
    /// list, which moves the parent's end.
    fn propagate_right(&mut self, child: NodeId, ce: i64) -> Option<Offset> {
        let mut sibling = self.doc.next_sibling(child);
        let mut new_ce = Some(ce);
        while let (Some(nce), Some(sib)) = (new_ce, sibling) {
            if is_template_start_marker_meta(self.doc, sib) {
                break;
            }
            let text_len = match self.doc.kind(sib) {
                NodeKind::Text(t) => Some(t.len()),
                NodeKind::Comment(t) => Some(tools::comment_wikitext_len(t)),
                NodeKind::Element(_) => None,
                NodeKind::Document => break,
            };
            match text_len {
                Some(len) => new_ce = Some(nce + offset(len)),
                None => {
                    let Some(data) = self.doc.data_mut(sib) else {
                        break;
                    };
                    let fostered = data.fostered;
                    let has_tsr = data.tsr.is_some();
                    let dsr = data.dsr.get_or_insert_with(DomSourceRange::default);
                    let start = dsr.start.map(offset);
                    if fostered
                        || start == Some(nce)
                        || (has_tsr && start.is_some_and(|s| s < nce))
                    {
                        break;
                    }
                    trace!(target: TRACE, "    CHANGING start of sibling from {start:?} to {nce}");
                    dsr.start = to_usize(Some(nce));
                    if let Some(end) = dsr.end
                        && nce > offset(end)
                    {
                        dsr.end = to_usize(Some(nce));
                    }
                    new_ce = dsr.end.map(offset);
                }
            }
            sibling = self.doc.next_sibling(sib);
        }
        sibling.is_none().then_some(new_ce)
    }

    /// A wikitext table's closing `|}` source travels on its end marker.
    fn copy_end_tag_src(&mut self, marker: NodeId, data: &NodeData) {
        if !self.has_typeof(marker, "mw:EndTag") {
            return;
        }
        let Some(src) = data.end_tag_src.clone() else {
            return;
        };
        if let Some(prev) = self.doc.prev_sibling(marker)
            && self.doc.element(prev).is_some_and(|el| el.is_named("table"))
            && !is_literal_html(self.doc, prev)
            && let Some(prev_data) = self.doc.data_mut(prev)
        {
            prev_data.end_tag_src = Some(src);
        }
    }

    /// Hand an end marker's range to the element it closes so that its close
    /// width survives the marker's removal.
    fn record_end_tsr(&mut self, marker: NodeId, prev: Option<NodeId>, tsr: SourceRange) {
        let closes = self
            .doc
            .element(marker)
            .and_then(|el| el.attr("data-etag"))
            .map(str::to_ascii_lowercase);
        let Some(prev) = prev else {
            return;
        };
        let matches = match (closes, self.doc.element(prev)) {
            (Some(closes), Some(el)) => el.name == closes,
            _ => false,
        };
        if matches && let Some(d) = self.doc.data_mut(prev) {
            d.end_tsr = Some(tsr);
        }
    }

    /// Join the text nodes on both sides of a marker about to be removed.
    ///
    /// Returns the merged node and the source width of its left part.
    fn merge_texts_around(&mut self, marker: NodeId) -> Option<(NodeId, i64)> {
        let prev = self.doc.prev_sibling(marker)?;
        let next = self.doc.next_sibling(marker)?;
        if !self.doc.is_text(prev) || !self.doc.is_text(next) {
            return None;
        }
        let left_width = offset(self.doc.text(prev)?.len()) + self.indent_pre_correction(prev);
        let mut merged = self.doc.text(prev)?.to_string();
        merged.push_str(self.doc.text(next)?);
        self.doc.set_text(prev, &merged);
        if let Err(err) = self.doc.remove(next) {
            unreachable!("attached sibling must be removable: {err}");
        }
        Some((prev, left_width))
    }

    fn remove_marker(&mut self, marker: NodeId) {
        if let Err(err) = self.doc.remove(marker) {
            unreachable!("marker meta is never the root: {err}");
        }
    }

    fn acceptable_inconsistency(&self, node: NodeId) -> bool {
        if let Some(el) = self.doc.element(node)
            && (uses_url_link_syntax(el) || uses_magic_link_syntax(el))
        {
            return true;
        }
        self.opts.attr_expansion && self.doc.is_root(node)
    }
}

#[cfg(test)]
mod tests;
