use super::*;
use wtdom::DocumentBuilder;
use wtdom::traverse::{elements, first_containment_violation};

fn run(doc: &mut Document, source: &str) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    compute_dsr(doc, source.len(), &DsrOptions::default(), &mut diagnostics);
    diagnostics
}

fn dsr(doc: &Document, id: Option<NodeId>) -> DomSourceRange {
    let id = id.expect("node id recorded");
    doc.data(id)
        .and_then(|d| d.dsr)
        .expect("element has a dsr")
}

#[test]
fn plain_wikilink_gets_bracket_widths() {
    let src = "[[Foo]]";
    let mut a = None;
    let mut b = DocumentBuilder::new();
    b.open("a")
        .rel("mw:WikiLink")
        .tsr(0, 7)
        .id_into(&mut a)
        .text("Foo")
        .close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    assert_eq!(dsr(&doc, a), DomSourceRange::known(0, 7, 2, 2));
    assert_eq!(dsr(&doc, Some(doc.root())), DomSourceRange::known(0, 7, 0, 0));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn piped_wikilink_open_width_covers_target() {
    let src = "[[Foo|bar]]";
    let mut a = None;
    let mut b = DocumentBuilder::new();
    b.open("a")
        .rel("mw:WikiLink")
        .stx(Stx::Piped)
        .target("Foo")
        .tsr(0, 11)
        .id_into(&mut a)
        .text("bar")
        .close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    assert_eq!(dsr(&doc, a), DomSourceRange::known(0, 11, 6, 2));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn external_and_url_links() {
    let src = "[http://x.org foo] http://x.org";
    let (mut ext, mut url) = (None, None);
    let mut b = DocumentBuilder::new();
    b.open("a")
        .rel("mw:ExtLink")
        .tsr(0, 18)
        .ext_link_content_offset(14)
        .id_into(&mut ext)
        .text("foo")
        .close();
    b.text(" ");
    b.open("a")
        .rel("mw:ExtLink")
        .stx(Stx::Url)
        .tsr(19, 31)
        .id_into(&mut url)
        .text("http://x.org")
        .close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    assert_eq!(dsr(&doc, ext), DomSourceRange::known(0, 18, 14, 1));
    assert_eq!(dsr(&doc, url), DomSourceRange::known(19, 31, 0, 0));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn synthetic_paragraph_takes_its_content_range() {
    let src = "a";
    let mut p = None;
    let mut b = DocumentBuilder::new();
    b.open("p").id_into(&mut p).text("a").close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    assert_eq!(dsr(&doc, p), DomSourceRange::known(0, 1, 0, 0));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn list_items_use_nesting_depth() {
    let src = "*a\n*b";
    let (mut ul, mut li1, mut li2) = (None, None, None);
    let mut b = DocumentBuilder::new();
    b.open("ul").id_into(&mut ul);
    b.open("li").tsr(0, 1).id_into(&mut li1).text("a").close();
    b.text("\n");
    b.open("li").tsr(3, 4).id_into(&mut li2).text("b").close();
    b.close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    assert_eq!(dsr(&doc, ul), DomSourceRange::known(0, 5, 0, 0));
    assert_eq!(dsr(&doc, li1), DomSourceRange::known(0, 2, 1, 0));
    assert_eq!(dsr(&doc, li2), DomSourceRange::known(3, 5, 1, 0));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn nested_list_item_without_tsr_counts_bullets() {
    let src = "**a";
    let (mut outer, mut inner) = (None, None);
    let mut b = DocumentBuilder::new();
    b.open("ul").open("li").id_into(&mut outer);
    b.open("ul").open("li").id_into(&mut inner).text("a");
    b.close().close().close().close();
    let mut doc = b.finish();

    run(&mut doc, src);

    // The outer item starts a chain of nested lists and has no bullets of
    // its own; the inner one owns both.
    assert_eq!(dsr(&doc, outer).open_width, Some(0));
    assert_eq!(dsr(&doc, inner), DomSourceRange::known(0, 3, 2, 0));
}

#[test]
fn end_marker_is_consumed_and_recorded() {
    let src = "''a''";
    let mut i = None;
    let mut b = DocumentBuilder::new();
    b.open("i").tsr(0, 2).id_into(&mut i).text("a").close();
    b.void("meta")
        .type_of("mw:EndTag")
        .attr("data-etag", "i")
        .tsr(3, 5);
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    let i_id = i.expect("i");
    assert_eq!(dsr(&doc, i), DomSourceRange::known(0, 5, 2, 2));
    assert_eq!(
        doc.data(i_id).and_then(|d| d.end_tsr),
        Some(SourceRange::new(3, 5))
    );
    assert_eq!(doc.children(doc.root()).count(), 1, "marker removed");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn heading_with_end_marker() {
    let src = "=A=";
    let mut h = None;
    let mut b = DocumentBuilder::new();
    b.open("h1").tsr(0, 1).id_into(&mut h).text("A").close();
    b.void("meta")
        .type_of("mw:EndTag")
        .attr("data-etag", "h1")
        .tsr(2, 3);
    let mut doc = b.finish();

    run(&mut doc, src);

    assert_eq!(dsr(&doc, h), DomSourceRange::known(0, 3, 1, 1));
}

#[test]
fn marker_between_texts_merges_them() {
    let src = "ab";
    let mut b = DocumentBuilder::new();
    b.open("p");
    b.text("a");
    b.void("meta").type_of("mw:TSRMarker").tsr(1, 1);
    b.text("b");
    b.close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    let p = doc.first_child(doc.root()).expect("p");
    let texts: Vec<_> = doc.children(p).filter_map(|c| doc.text(c)).collect();
    assert_eq!(texts, vec!["ab"]);
    assert_eq!(dsr(&doc, Some(p)), DomSourceRange::known(0, 2, 0, 0));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn wikitext_table_end_marker_carries_end_tag_source() {
    let src = "{|\n|x\n|}";
    let (mut table, mut tr) = (None, None);
    let mut b = DocumentBuilder::new();
    b.open("table").tsr(0, 2).id_into(&mut table);
    b.open("tbody").text("\n");
    b.open("tr").id_into(&mut tr);
    b.open("td").tsr(3, 4).text("x").close();
    b.close().text("\n").close();
    b.close();
    b.void("meta")
        .type_of("mw:EndTag")
        .attr("data-etag", "table")
        .end_tag_src("|}")
        .tsr(6, 8);
    let mut doc = b.finish();

    run(&mut doc, src);

    let table_id = table.expect("table");
    assert_eq!(
        doc.data(table_id).and_then(|d| d.end_tag_src.clone()),
        Some("|}".to_string())
    );
    assert_eq!(dsr(&doc, table), DomSourceRange::known(0, 8, 2, 2));
    assert_eq!(dsr(&doc, tr), DomSourceRange::known(3, 5, 0, 0));
}

#[test]
fn indent_pre_text_accounts_for_leading_spaces() {
    let src = " a\n b";
    let mut pre = None;
    let mut b = DocumentBuilder::new();
    b.open("pre").tsr(0, 1).id_into(&mut pre).text("a\nb").close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    assert_eq!(dsr(&doc, pre), DomSourceRange::known(0, 5, 1, 0));
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn fostered_content_is_zero_width() {
    let src = "ab";
    let mut p = None;
    let mut b = DocumentBuilder::new();
    b.open("p").fostered().id_into(&mut p).text("a").close();
    b.text("b");
    let mut doc = b.finish();

    run(&mut doc, src);

    assert_eq!(dsr(&doc, p), DomSourceRange::point(1));
    assert_eq!(first_containment_violation(&doc, doc.root()), None);
}

#[test]
fn stripped_quote_tag_width_moves_to_its_neighbour() {
    let src = "'''a'''";
    let (mut bold, mut placeholder) = (None, None);
    let mut b = DocumentBuilder::new();
    b.open("b").tsr(0, 3).id_into(&mut bold).text("a").close();
    b.void("meta")
        .type_of("mw:Placeholder/StrippedTag")
        .src("'''")
        .stripped_name("b")
        .id_into(&mut placeholder);
    let mut doc = b.finish();

    run(&mut doc, src);

    assert_eq!(dsr(&doc, bold), DomSourceRange::known(0, 7, 3, 3));
    assert_eq!(dsr(&doc, placeholder).start, Some(7));
}

#[test]
fn propagation_stops_at_template_start_marker() {
    let src = "ab{{x}}";
    let (mut span, mut tpl) = (None, None);
    let mut b = DocumentBuilder::new();
    b.open("span").tsr(0, 2).id_into(&mut span).text("ab").close();
    b.void("meta")
        .type_of("mw:Transclusion")
        .tsr(2, 7)
        .id_into(&mut tpl);
    let mut doc = b.finish();

    run(&mut doc, src);

    assert_eq!(dsr(&doc, tpl).start, Some(2));
    assert_eq!(dsr(&doc, tpl).end, Some(7));
    assert_eq!(dsr(&doc, span).start, Some(0));
    assert_eq!(dsr(&doc, span).end, Some(2));
}

#[test]
fn start_mismatch_is_reported_unless_expanding_attributes() {
    let src = "abc";
    let build = || {
        let mut b = DocumentBuilder::new();
        b.text("ab");
        b.finish()
    };

    let mut doc = build();
    let diagnostics = run(&mut doc, src);
    assert_eq!(diagnostics.count(DiagnosticKind::DsrInconsistent), 1);

    let mut doc = build();
    let mut diagnostics = Diagnostics::new();
    let opts = DsrOptions {
        attr_expansion: true,
        ..DsrOptions::default()
    };
    compute_dsr(&mut doc, src.len(), &opts, &mut diagnostics);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
}

#[test]
fn negative_end_is_clamped() {
    let src = "ab";
    let mut p = None;
    let mut b = DocumentBuilder::new();
    b.open("p").id_into(&mut p).text("x").close();
    b.text("abcd");
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    let p_dsr = dsr(&doc, p);
    assert_eq!(p_dsr.end, Some(0));
    assert_eq!(p_dsr.start, Some(0));
    assert_eq!(diagnostics.count(DiagnosticKind::DsrNegative), 2);
}

#[test]
fn negative_start_is_clamped() {
    let src = "abc";
    let mut p = None;
    let mut b = DocumentBuilder::new();
    b.text("xyz");
    b.open("p").id_into(&mut p).text("abcdef").close();
    let mut doc = b.finish();

    let diagnostics = run(&mut doc, src);

    let p_dsr = dsr(&doc, p);
    assert_eq!(p_dsr.start, Some(0));
    assert_eq!(p_dsr.end, Some(3));
    assert_eq!(diagnostics.count(DiagnosticKind::DsrNegative), 1);
    assert!(diagnostics.has(DiagnosticKind::DsrInconsistent));
}

#[test]
fn source_window_bounds_the_root() {
    let src = "xxxxab";
    let mut p = None;
    let mut b = DocumentBuilder::new();
    b.open("p").id_into(&mut p).text("ab").close();
    let mut doc = b.finish();
    let mut diagnostics = Diagnostics::new();
    let opts = DsrOptions {
        source_offsets: Some(SourceRange::new(4, 6)),
        ..DsrOptions::default()
    };

    compute_dsr(&mut doc, src.len(), &opts, &mut diagnostics);

    assert_eq!(dsr(&doc, p), DomSourceRange::known(4, 6, 0, 0));
    assert_eq!(dsr(&doc, Some(doc.root())), DomSourceRange::known(4, 6, 0, 0));
}

#[test]
fn recomputing_is_idempotent() {
    let src = "=A=\n*a\n*b";
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
    let mut doc = b.finish();

    let first_diagnostics = run(&mut doc, src);
    let first: Vec<_> = elements(&doc, doc.root())
        .into_iter()
        .map(|id| doc.data(id).and_then(|d| d.dsr))
        .collect();
    let second_diagnostics = run(&mut doc, src);
    let second: Vec<_> = elements(&doc, doc.root())
        .into_iter()
        .map(|id| doc.data(id).and_then(|d| d.dsr))
        .collect();

    assert!(first_diagnostics.is_empty(), "{first_diagnostics:?}");
    assert!(second_diagnostics.is_empty(), "{second_diagnostics:?}");
    assert_eq!(first, second);
    assert_eq!(first_containment_violation(&doc, doc.root()), None);
}
