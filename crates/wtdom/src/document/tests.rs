use super::*;
use crate::builder::DocumentBuilder;

fn names(doc: &Document, parent: NodeId) -> Vec<String> {
    doc.children(parent)
        .map(|c| doc.node_name(c).to_string())
        .collect()
}

#[test]
fn append_and_insert_keep_sibling_links() {
    let mut doc = Document::new();
    let p = doc.create_element(Element::new("P"));
    let a = doc.create_text("a");
    let b = doc.create_text("b");
    let c = doc.create_comment("c");
    doc.append_child(doc.root(), p).expect("append p");
    doc.append_child(p, a).expect("append a");
    doc.append_child(p, c).expect("append c");
    doc.insert_before(p, b, Some(c)).expect("insert b");

    assert_eq!(names(&doc, p), vec!["#text", "#text", "#comment"]);
    assert_eq!(doc.node_name(p), "p");
    assert_eq!(doc.first_child(p), Some(a));
    assert_eq!(doc.last_child(p), Some(c));
    assert_eq!(doc.next_sibling(a), Some(b));
    assert_eq!(doc.prev_sibling(c), Some(b));
    assert_eq!(doc.parent(b), Some(p));
}

#[test]
fn remove_detaches_without_invalidating_neighbours() {
    let mut b = DocumentBuilder::new();
    b.open("p").text("a").void("meta").text("b").close();
    let mut doc = b.finish();
    let p = doc.first_child(doc.root()).expect("p");
    let meta = doc
        .children(p)
        .find(|&c| doc.is_element(c))
        .expect("meta");
    let next = doc.next_sibling(meta).expect("text after meta");

    doc.remove(meta).expect("remove meta");

    assert_eq!(doc.parent(meta), None);
    assert_eq!(doc.text(next), Some("b"));
    assert_eq!(doc.children(p).count(), 2);
    assert_eq!(doc.prev_sibling(next), doc.first_child(p));
}

#[test]
fn structural_misuse_is_reported() {
    let mut doc = Document::new();
    let t = doc.create_text("x");
    let u = doc.create_text("y");
    let p = doc.create_element(Element::new("p"));
    doc.append_child(doc.root(), t).expect("append text");
    doc.append_child(doc.root(), p).expect("append p");

    assert_eq!(doc.append_child(t, u), Err(DomError::NotAContainer(t)));
    assert_eq!(doc.append_child(p, t), Err(DomError::AlreadyAttached(t)));
    assert_eq!(doc.remove(Document::ROOT), Err(DomError::RootMove));
    assert_eq!(
        doc.insert_before(p, u, Some(t)),
        Err(DomError::NotAChild { node: t, parent: p })
    );

    doc.remove(p).expect("detach p");
    let inner = doc.create_element(Element::new("b"));
    doc.append_child(p, inner).expect("append b");
    doc.remove(p).expect("already detached is a no-op");
    assert_eq!(doc.append_child(inner, p), Err(DomError::Cycle(p)));
}

#[test]
fn root_carries_its_own_sidecar() {
    let mut doc = Document::new();
    assert_eq!(doc.node_name(doc.root()), "body");
    doc.data_mut(Document::ROOT).expect("root data").fostered = true;
    assert!(doc.data(Document::ROOT).expect("root data").fostered);
    assert!(doc.is_empty());
}

#[test]
#[should_panic(expected = "metadata setter called on a non-element node")]
fn builder_rejects_tsr_on_text() {
    let mut b = DocumentBuilder::new();
    b.text("a").tsr(0, 1);
}

#[test]
#[should_panic(expected = "close() without a matching open()")]
fn builder_rejects_unbalanced_close() {
    let mut b = DocumentBuilder::new();
    b.close();
}
