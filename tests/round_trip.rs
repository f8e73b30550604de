use wikirt::html2wt::{SerializerConfig, serialize};
use wikirt::round_trip;
use wikirt::wt2html::DsrOptions;
use wikirt::wtdom::{DiagnosticKind, Document, DocumentBuilder};
use wt_test_support::diff_wikitext;

const SOURCE: &str = "=A=\n*a\n*b\n\n[[Foo]] ''x''";

/// The DOM a parser would build for [`SOURCE`].
fn page() -> Document {
    let mut b = DocumentBuilder::new();
    b.open("h1").tsr(0, 1).text("A").close();
    b.void("meta")
        .type_of("mw:EndTag")
        .attr("data-etag", "h1")
        .tsr(2, 3);
    b.text("\n");
    b.open("ul");
    b.open("li").tsr(4, 5).text("a").close();
    b.text("\n");
    b.open("li").tsr(7, 8).text("b").close();
    b.close();
    b.text("\n\n");
    b.open("p");
    b.open("a")
        .rel("mw:WikiLink")
        .attr("href", "./Foo")
        .tsr(11, 18)
        .text("Foo")
        .close();
    b.text(" ");
    b.open("i").tsr(19, 21).text("x").close();
    b.void("meta")
        .type_of("mw:EndTag")
        .attr("data-etag", "i")
        .tsr(22, 24);
    b.close();
    b.finish()
}

#[test]
fn unedited_page_round_trips_in_selective_mode() {
    let mut doc = page();
    let out = round_trip(&mut doc, SOURCE, &DsrOptions::default(), &SerializerConfig::selser())
        .unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(out.wikitext, SOURCE, "{}", diff_wikitext(SOURCE, &out.wikitext));
    assert!(!out.diagnostics.has(DiagnosticKind::DsrInconsistent), "{:?}", out.diagnostics);
    assert!(!out.diagnostics.has(DiagnosticKind::DsrNegative), "{:?}", out.diagnostics);
}

#[test]
fn regenerated_page_keeps_its_structure() {
    let mut doc = page();
    let _ = round_trip(&mut doc, SOURCE, &DsrOptions::default(), &SerializerConfig::selser())
        .unwrap_or_else(|err| panic!("{err}"));

    let out = serialize(&doc, None, &SerializerConfig::default())
        .unwrap_or_else(|err| panic!("{err}"));
    for piece in ["=A=", "*a\n*b", "[[Foo]] ''x''"] {
        assert!(out.wikitext.contains(piece), "{piece:?} missing from {:?}", out.wikitext);
    }
}
