use html2wt::{
    ConstraintInfo, NlConstraint, SepType, SerializerConfig, make_separator, serialize,
};
use tools::separator_bits;
use wt_test_support::diff_wikitext;
use wt2html::{DsrOptions, compute_dsr};
use wtdom::traverse::find_all_by_name;
use wtdom::{Diagnostics, Document, DocumentBuilder, DomSourceRange, NodeId};

fn parse(source: &str, build: impl FnOnce(&mut DocumentBuilder)) -> Document {
    let mut b = DocumentBuilder::new();
    build(&mut b);
    let mut doc = b.finish();
    let mut diagnostics = Diagnostics::new();
    compute_dsr(&mut doc, source.len(), &DsrOptions::default(), &mut diagnostics);
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    doc
}

fn wikitext(doc: &Document, source: Option<&str>, config: &SerializerConfig) -> String {
    match serialize(doc, source, config) {
        Ok(out) => out.wikitext,
        Err(err) => panic!("serialization failed: {err}"),
    }
}

/// Newlines outside comment-only lines, the way separators are measured.
fn counted_newlines(sep: &str) -> usize {
    separator_bits(sep)
        .iter()
        .filter(|bit| !bit.ignorable)
        .map(|bit| bit.text.matches('\n').count())
        .sum()
}

#[test]
fn wikilink_source_range_and_output() {
    let source = "[[Foo]]";
    let mut link = None;
    let doc = parse(source, |b| {
        b.open("p");
        b.open("a")
            .rel("mw:WikiLink")
            .attr("href", "./Foo")
            .tsr(0, 7)
            .id_into(&mut link)
            .text("Foo")
            .close();
        b.close();
    });

    let link = link.expect("link");
    assert_eq!(
        doc.data(link).and_then(|d| d.dsr),
        Some(DomSourceRange::known(0, 7, 2, 2))
    );
    assert_eq!(wikitext(&doc, None, &SerializerConfig::default()), source);
    assert_eq!(wikitext(&doc, Some(source), &SerializerConfig::selser()), source);
}

fn three_paragraphs(source: &str) -> Document {
    parse(source, |b| {
        b.open("p").text("a").close();
        b.text("\n\n");
        b.open("p").text("b").close();
        b.text("\n\n\n");
        b.open("p").text("c").close();
    })
}

fn edit_paragraph(doc: &mut Document, index: usize, text: &str) {
    let paragraphs: Vec<NodeId> = find_all_by_name(doc, doc.root(), "p");
    let p = paragraphs[index];
    let child = doc.first_child(p).expect("paragraph text");
    doc.set_text(child, text);
    doc.diff_mut(p).children_changed = true;
}

#[test]
fn selser_only_rewrites_the_edited_paragraph() {
    let source = "a\n\nb\n\n\nc";
    let mut doc = three_paragraphs(source);
    edit_paragraph(&mut doc, 1, "bee");

    let out = wikitext(&doc, Some(source), &SerializerConfig::selser());
    assert_eq!(out, "a\n\nbee\n\n\nc", "{}", diff_wikitext("a\n\nbee\n\n\nc", &out));
}

#[test]
fn selser_keeps_untouched_neighbours_verbatim() {
    let source = "a\n\nb\n\n\nc";
    let mut doc = three_paragraphs(source);
    edit_paragraph(&mut doc, 0, "*x");

    let out = wikitext(&doc, Some(source), &SerializerConfig::selser());
    assert!(out.ends_with("\n\nb\n\n\nc"), "{out:?}");
    assert!(out.starts_with("<nowiki>*</nowiki>x"), "{out:?}");
}

#[test]
fn unedited_document_is_reproduced_in_every_reusing_mode() {
    let source = "a\n\nb\n\n\nc";
    let doc = three_paragraphs(source);
    assert_eq!(wikitext(&doc, Some(source), &SerializerConfig::selser()), source);
    assert_eq!(wikitext(&doc, Some(source), &SerializerConfig::rt_test()), source);
    assert_eq!(
        wikitext(&doc, None, &SerializerConfig::default()),
        "a\n\nb\n\nc"
    );
}

#[test]
fn synthesized_separators_respect_newline_bounds() {
    let mut b = DocumentBuilder::new();
    let (mut first, mut second) = (None, None);
    b.open("p").id_into(&mut first).text("a").close();
    b.open("p").id_into(&mut second).text("b").close();
    let doc = b.finish();
    let info = ConstraintInfo {
        on_sol: false,
        force_sol: false,
        sep_type: SepType::Sibling,
        node_a: first.expect("first"),
        node_b: second.expect("second"),
    };

    let candidates = ["", " ", "\n", "\n\n\n\n", "<!--c-->", "<!--c-->\n\n\n", " \n \n "];
    for min in 0..=2 {
        for max in min..=3 {
            let nl = NlConstraint::range(min, max);
            for sep in candidates {
                let out = make_separator(&doc, sep, nl, Some(&info), false);
                let count = counted_newlines(&out) as u32;
                assert!(
                    (min..=max).contains(&count),
                    "{sep:?} under {nl:?} became {out:?} with {count} newline(s)"
                );

                let out = make_separator(&doc, sep, nl, Some(&info), true);
                let count = counted_newlines(&out) as u32;
                assert!(
                    (min.saturating_sub(1)..=max).contains(&count),
                    "start of output: {sep:?} under {nl:?} became {out:?}"
                );
            }
        }
    }
}

#[test]
fn leading_space_before_inline_content_is_escaped() {
    let mut b = DocumentBuilder::new();
    b.open("p");
    b.text("a");
    b.text("\n ");
    b.open("span").text("b").close();
    b.close();
    let doc = b.finish();

    assert_eq!(
        wikitext(&doc, None, &SerializerConfig::default()),
        "a\n<nowiki> </nowiki><span>b</span>"
    );
}
