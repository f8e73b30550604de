use wtdom::{DocumentBuilder, DomSourceRange, Stx};

use super::*;

const N: NodeId = NodeId(0);

fn line(chunks: &[ConstrainedText]) -> String {
    escape_line(chunks, &WikiConfig::default())
}

fn link(text: &str) -> ConstrainedText {
    ConstrainedText::wiki_link(text, NodeId(1), "mw:WikiLink")
}

#[test]
fn wiki_link_after_open_bracket_gets_prefix_escape() {
    let out = line(&[
        ConstrainedText::plain("[", N),
        link("[[Foo]]"),
        ConstrainedText::plain("]", N),
    ]);
    assert_eq!(out, "[<nowiki/>[[Foo]]]");
}

#[test]
fn wiki_link_before_letters_gets_suffix_escape() {
    let out = line(&[link("[[Foo]]"), ConstrainedText::plain("s", N)]);
    assert_eq!(out, "[[Foo]]<nowiki/>s");
}

#[test]
fn apostrophe_does_not_trail() {
    let out = line(&[link("[[Foo]]"), ConstrainedText::plain("'s", N)]);
    assert_eq!(out, "[[Foo]]'s");
}

#[test]
fn double_bracket_before_link_is_harmless() {
    let out = line(&[ConstrainedText::plain("[[", N), link("[[Foo]]")]);
    assert_eq!(out, "[[[[Foo]]");
}

#[test]
fn category_style_links_take_no_trail() {
    let cat = ConstrainedText::wiki_link("[[Category:X]]", NodeId(1), "mw:PageProp/Category");
    let out = line(&[cat, ConstrainedText::plain("s", N)]);
    assert_eq!(out, "[[Category:X]]s");
}

#[test]
fn disabled_link_trail_never_escapes() {
    let wiki = WikiConfig {
        link_trail: None,
        link_prefix: None,
    };
    let out = escape_line(&[link("[[Foo]]"), ConstrainedText::plain("s", N)], &wiki);
    assert_eq!(out, "[[Foo]]s");
}

#[test]
fn greediness_follows_trailing_bracket() {
    assert!(!link("[[Foo]]").is_greedy());
    assert!(link("[[Foo]]bar").is_greedy());
    assert!(!ConstrainedText::plain("x", N).is_greedy());
}

#[test]
fn auto_url_escapes() {
    let url = || ConstrainedText::auto_url_link("http://example.org", NodeId(1));
    assert_eq!(
        line(&[ConstrainedText::plain("see ", N), url(), ConstrainedText::plain(" now", N)]),
        "see http://example.org now"
    );
    assert_eq!(
        line(&[ConstrainedText::plain("a", N), url()]),
        "a<nowiki/>http://example.org"
    );
    assert_eq!(
        line(&[url(), ConstrainedText::plain("x", N)]),
        "http://example.org<nowiki/>x"
    );
    assert_eq!(
        line(&[url(), ConstrainedText::plain("&lt;b", N)]),
        "http://example.org&lt;b"
    );
    assert_eq!(
        line(&[url(), ConstrainedText::plain("''it''", N)]),
        "http://example.org''it''"
    );
}

#[test]
fn auto_url_incomplete_entity_gets_suffix() {
    let url = ConstrainedText::auto_url_link("http://example.org/?a&amp", NodeId(1));
    assert_eq!(
        line(&[url, ConstrainedText::plain(";", N)]),
        "http://example.org/?a&amp<nowiki/>;"
    );
}

#[test]
fn magic_link_needs_word_boundaries() {
    let isbn = || ConstrainedText::magic_link("ISBN 1234567890", NodeId(1));
    assert_eq!(
        line(&[ConstrainedText::plain("x", N), isbn(), ConstrainedText::plain("y", N)]),
        "x<nowiki/>ISBN 1234567890<nowiki/>y"
    );
    assert_eq!(
        line(&[ConstrainedText::plain("x ", N), isbn(), ConstrainedText::plain(".", N)]),
        "x ISBN 1234567890."
    );
}

#[test]
fn language_variant_after_lone_pipe() {
    let lv = || ConstrainedText::language_variant("-{x}-", NodeId(1));
    assert_eq!(line(&[ConstrainedText::plain("|", N), lv()]), "|<nowiki/>-{x}-");
    assert_eq!(line(&[ConstrainedText::plain("a|", N), lv()]), "a|-{x}-");
}

#[test]
fn plain_chunks_keep_fixed_markers() {
    let mut chunk = ConstrainedText::plain("x", N);
    chunk.prefix = Some("<nowiki>".into());
    chunk.suffix = Some("</nowiki>".into());
    assert_eq!(line(&[chunk]), "<nowiki>x</nowiki>");
}

#[test]
fn selser_split_exposes_leading_link() {
    let mut p = None;
    let mut a = None;
    let mut b = DocumentBuilder::new();
    b.open("p")
        .dsr(DomSourceRange::known(0, 12, 0, 0))
        .id_into(&mut p)
        .open("a")
        .rel("mw:WikiLink")
        .stx(Stx::Simple)
        .dsr(DomSourceRange::known(0, 7, 2, 2))
        .id_into(&mut a)
        .text("Foo")
        .close()
        .text(" tail")
        .close();
    let doc = b.finish();
    let (p, a) = (p.unwrap(), a.unwrap());

    let chunks = ConstrainedText::from_selser("[[Foo]] tail", p, &doc);
    let summary: Vec<_> = chunks
        .iter()
        .map(|c| (c.text.as_str(), c.node, c.no_sep, c.selser))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("", p, false, true),
            ("[[Foo]]", a, true, true),
            (" tail", p, true, true),
        ]
    );
    assert_eq!(chunks[1].kind, ChunkKind::WikiLink { trails: true });
}

#[test]
fn selser_link_is_a_single_typed_chunk() {
    let mut a = None;
    let mut b = DocumentBuilder::new();
    b.open("a")
        .rel("mw:ExtLink")
        .stx(Stx::Url)
        .dsr(DomSourceRange::known(0, 18, 0, 0))
        .id_into(&mut a)
        .text("http://example.org")
        .close();
    let doc = b.finish();
    let chunks = ConstrainedText::from_selser("http://example.org", a.unwrap(), &doc);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].kind, ChunkKind::AutoUrlLink);
    assert!(chunks[0].selser);
}
