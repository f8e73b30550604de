use crate::document::Document;
use crate::types::NodeId;

/// Pre-order walk over `root` and everything below it.
pub fn descendants(doc: &Document, root: NodeId) -> Vec<NodeId> {
    fn walk(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        for child in doc.children(node) {
            walk(doc, child, out);
        }
    }

    let mut out = Vec::new();
    walk(doc, root, &mut out);
    out
}

/// Elements under `root` (inclusive) in document order.
pub fn elements(doc: &Document, root: NodeId) -> Vec<NodeId> {
    descendants(doc, root)
        .into_iter()
        .filter(|&id| doc.is_element(id))
        .collect()
}

pub fn find_first_by_name(doc: &Document, root: NodeId, name: &str) -> Option<NodeId> {
    if doc.element(root).is_some_and(|el| el.is_named(name)) {
        return Some(root);
    }
    doc.children(root)
        .find_map(|child| find_first_by_name(doc, child, name))
}

pub fn find_all_by_name(doc: &Document, root: NodeId, name: &str) -> Vec<NodeId> {
    descendants(doc, root)
        .into_iter()
        .filter(|&id| doc.element(id).is_some_and(|el| el.is_named(name)))
        .collect()
}

/// Concatenated character data of all text nodes under `root`.
pub fn text_content(doc: &Document, root: NodeId) -> String {
    let mut out = String::new();
    for id in descendants(doc, root) {
        if doc.is_text(id) {
            out.push_str(doc.text(id).unwrap_or(""));
        }
    }
    out
}

/// First `(parent, child)` pair whose fully known DSRs do not nest.
/// Fostered children must instead be zero-width.
pub fn first_containment_violation(doc: &Document, root: NodeId) -> Option<(NodeId, NodeId)> {
    for parent in descendants(doc, root) {
        let Some(pdsr) = doc.data(parent).and_then(|d| d.valid_dsr()) else {
            continue;
        };
        for child in doc.children(parent) {
            let Some(cdata) = doc.data(child) else {
                continue;
            };
            let Some(cdsr) = cdata.valid_dsr() else {
                continue;
            };
            let ok = if cdata.fostered {
                cdsr.start == cdsr.end
            } else {
                pdsr.start <= cdsr.start && cdsr.end <= pdsr.end
            };
            if !ok {
                return Some((parent, child));
            }
        }
    }
    None
}
