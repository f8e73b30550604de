use std::path::Path;

use serde::Deserialize;
use wtdom::Stx;

use super::*;

#[derive(Debug, Deserialize)]
struct Expect {
    wikitext: String,
}

const FIXTURE: &str = r#"
format = "wikirt-fixture-v1"

[[cases]]
id = "link"
source = "[[Foo]]"
dom = [
  { tag = "p", children = [
    { tag = "a", label = "link", rel = "mw:WikiLink", tsr = [0, 7], stx = "simple", attrs = { href = "./Foo" }, children = [
      { text = "Foo" },
    ] },
  ] },
  { comment = "c" },
]
expect = { wikitext = "[[Foo]]" }
"#;

#[test]
fn escape_keeps_whitespace_visible() {
    assert_eq!(escape_text("a\tb\n\"c\"\\"), "a\\tb\\n\\\"c\\\"\\\\");
    assert_eq!(escape_text("\u{1}\u{a0}"), "\\u{01}\\u{A0}");
}

#[test]
fn diff_points_at_the_first_mismatch() {
    let report = diff_wikitext("a\nb\nc", "a\nB\nc");
    assert!(report.contains("first mismatch at line 2"), "{report}");
    assert!(report.contains(">    2  expected: b"), "{report}");

    let report = diff_wikitext("a", "a\n");
    assert!(report.contains("expected 1 lines, actual 2 lines"), "{report}");
}

#[test]
fn fixture_builds_labelled_dom() {
    let file: FixtureFile<Expect> =
        parse_fixture(FIXTURE, Path::new("inline.toml")).expect("fixture parses");
    assert_eq!(file.cases.len(), 1);
    let case = &file.cases[0];
    assert_eq!(case.expect.wikitext, "[[Foo]]");

    let built = case.build().expect("dom builds");
    let link = built.node("link");
    let data = built.doc.data(link).expect("element");
    assert_eq!(data.stx, Some(Stx::Simple));
    assert_eq!(data.tsr.map(|r| (r.start, r.end)), Some((0, 7)));
    assert_eq!(
        built.doc.element(link).and_then(|el| el.attr("href")),
        Some("./Foo")
    );
}

#[test]
fn fixture_rejects_unknown_format_and_duplicates() {
    let wrong = FIXTURE.replace("wikirt-fixture-v1", "v0");
    let err = parse_fixture::<Expect>(&wrong, Path::new("x.toml")).expect_err("bad format");
    assert!(matches!(err, FixtureError::Format(ref f) if f == "v0"));

    let doubled = format!("{FIXTURE}\n{}", &FIXTURE[FIXTURE.find("[[cases]]").unwrap_or(0)..]);
    let err = parse_fixture::<Expect>(&doubled, Path::new("x.toml")).expect_err("duplicate");
    assert!(matches!(err, FixtureError::DuplicateCase(ref id) if id == "link"));
}

#[test]
fn unknown_flags_are_reported() {
    let spec = NodeSpec::Element(ElementSpec {
        tag: "b".to_string(),
        flags: vec!["sticky".to_string()],
        ..ElementSpec::default()
    });
    let err = build_document(&[spec]).expect_err("unknown flag");
    assert!(matches!(err, FixtureError::UnknownValue("flag", ref v) if v == "sticky"));
}
