use std::fmt::Write;

use crate::document::Document;
use crate::source_range::DomSourceRange;
use crate::types::{NodeId, NodeKind};

fn push_width(out: &mut String, v: Option<usize>) {
    match v {
        Some(v) => {
            let _ = write!(out, "{v}");
        }
        None => out.push('_'),
    }
}

/// `[start,end,open,close]` with `_` for unknown fields.
pub fn format_dsr(dsr: &DomSourceRange) -> String {
    let mut out = String::with_capacity(16);
    out.push('[');
    push_width(&mut out, dsr.start);
    out.push(',');
    push_width(&mut out, dsr.end);
    out.push(',');
    push_width(&mut out, dsr.open_width);
    out.push(',');
    push_width(&mut out, dsr.close_width);
    out.push(']');
    out
}

/// Indented dump of at most `cap` nodes, each element annotated with its DSR.
pub fn outline(doc: &Document, root: NodeId, cap: usize) -> Vec<String> {
    struct IndentGuard<'a> {
        indent: &'a mut String,
        step: usize,
    }

    impl Drop for IndentGuard<'_> {
        fn drop(&mut self) {
            let new_len = self.indent.len() - self.step;
            self.indent.truncate(new_len);
        }
    }

    fn push_preview(out: &mut String, s: &str, max_chars: usize) {
        for (i, ch) in s.chars().enumerate() {
            if i == max_chars {
                out.push('…');
                break;
            }
            match ch {
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                ch => out.push(ch),
            }
        }
    }

    const INDENT_STEP: &str = "  ";
    const PREVIEW_CHARS: usize = 40;

    fn walk(
        doc: &Document,
        node: NodeId,
        indent: &mut String,
        out: &mut Vec<String>,
        left: &mut usize,
    ) {
        if *left == 0 {
            return;
        }
        *left -= 1;
        let mut line = String::with_capacity(indent.len() + 64);
        line.push_str(indent);
        match doc.kind(node) {
            NodeKind::Document | NodeKind::Element(_) => {
                line.push('<');
                line.push_str(doc.node_name(node));
                if let Some(ty) = doc.element(node).and_then(|el| el.attr("typeof")) {
                    let _ = write!(&mut line, r#" typeof="{ty}""#);
                }
                line.push('>');
                if let Some(dsr) = doc.data(node).and_then(|d| d.dsr) {
                    line.push(' ');
                    line.push_str(&format_dsr(&dsr));
                }
                out.push(line);
                indent.push_str(INDENT_STEP);
                let mut guard = IndentGuard {
                    indent,
                    step: INDENT_STEP.len(),
                };
                for child in doc.children(node) {
                    walk(doc, child, guard.indent, out, left);
                }
            }
            NodeKind::Text(text) => {
                line.push('"');
                push_preview(&mut line, text, PREVIEW_CHARS);
                line.push('"');
                out.push(line);
            }
            NodeKind::Comment(text) => {
                line.push_str("<!--");
                push_preview(&mut line, text, PREVIEW_CHARS);
                line.push_str("-->");
                out.push(line);
            }
        }
    }

    let mut out = Vec::new();
    let mut left = cap;
    let mut indent = String::new();
    walk(doc, root, &mut indent, &mut out, &mut left);
    out
}
