use wtdom::DocumentBuilder;

use super::*;
use crate::config::SerializerConfig;
use crate::serializer::serialize;

fn wikitext(doc: &Document) -> String {
    match serialize(doc, None, &SerializerConfig::default()) {
        Ok(out) => out.wikitext,
        Err(err) => panic!("serialization failed: {err}"),
    }
}

#[test]
fn encapsulated_content_is_emitted_from_its_source() {
    let mut b = DocumentBuilder::new();
    b.open("span").type_of("mw:Transclusion").attr("about", "#mwt1").src("{{echo|x}}");
    b.text("x").close();
    b.open("span").attr("about", "#mwt1").text("rest of template output").close();
    assert_eq!(wikitext(&b.finish()), "{{echo|x}}");
}

#[test]
fn plain_anchor_is_literal_html() {
    let mut b = DocumentBuilder::new();
    b.open("p");
    b.open("a").attr("href", "http://x").text("y").close();
    b.close();
    assert_eq!(wikitext(&b.finish()), "<a href=\"http://x\">y</a>");
}

#[test]
fn bullets_accumulate_through_nested_lists() {
    let mut b = DocumentBuilder::new();
    let (mut inner, mut dd) = (None, None);
    b.open("ul").open("li").text("a");
    b.open("ol").open("li").id_into(&mut inner).text("b").close().close();
    b.close().close();
    b.open("dl").open("dd").id_into(&mut dd).text("c").close().close();
    let doc = b.finish();

    assert_eq!(list_bullets(&doc, inner.expect("inner li")), "*#");
    assert_eq!(list_bullets(&doc, dd.expect("dd")), ":");
}

#[test]
fn new_items_get_a_space_after_the_bullet() {
    let mut b = DocumentBuilder::new();
    let mut li = None;
    b.open("ul").open("li").inserted().id_into(&mut li).text("new").close().close();
    let doc = b.finish();
    assert_eq!(list_bullets(&doc, li.expect("li")), "* ");
}

#[test]
fn list_eol_keeps_same_type_lists_apart() {
    let mut b = DocumentBuilder::new();
    let (mut first, mut second, mut third) = (None, None, None);
    b.open("ul").id_into(&mut first).open("li").text("a").close().close();
    b.open("ul").id_into(&mut second).open("li").text("b").close().close();
    b.open("ol").id_into(&mut third).open("li").text("c").close().close();
    let doc = b.finish();
    let (first, second, third) = (
        first.expect("first"),
        second.expect("second"),
        third.expect("third"),
    );

    assert_eq!(wt_list_eol(&doc, first, second), NlConstraint::range(2, 2));
    assert_eq!(wt_list_eol(&doc, second, third), NlConstraint::range(1, 2));
    assert_eq!(wt_list_eol(&doc, third, doc.root()), NlConstraint::range(0, 2));
}

#[test]
fn paragraphs_are_separated_by_a_blank_line() {
    let mut b = DocumentBuilder::new();
    b.open("p").text("a").close();
    b.open("p").text("b").close();
    assert_eq!(wikitext(&b.finish()), "a\n\nb");
}

#[test]
fn list_items_each_start_a_line() {
    let mut b = DocumentBuilder::new();
    b.open("ul");
    b.open("li").text("a").close();
    b.open("li").text("b").close();
    b.close();
    assert_eq!(wikitext(&b.finish()), "*a\n*b");
}

#[test]
fn heading_wraps_its_content() {
    let mut b = DocumentBuilder::new();
    b.open("h2").text("Title").close();
    // A heading still ends its line before the end of the body.
    assert_eq!(wikitext(&b.finish()), "==Title==\n");
}

#[test]
fn table_cells_and_attributes() {
    let mut b = DocumentBuilder::new();
    b.open("table").open("tbody").open("tr");
    b.open("td").text("x").close();
    b.close().close().close();
    assert_eq!(wikitext(&b.finish()), "{|\n|x\n|}");

    let mut b = DocumentBuilder::new();
    b.open("table").open("tbody").open("tr");
    b.open("td").attr("class", "a").text("x").close();
    b.close().close().close();
    assert_eq!(wikitext(&b.finish()), "{|\n| class=\"a\" |x\n|}");
}

#[test]
fn wiki_links_minimize_to_simple_form() {
    let mut b = DocumentBuilder::new();
    b.open("p");
    b.open("a").rel("mw:WikiLink").attr("href", "./Foo").text("Foo").close();
    b.text(" and ");
    b.open("a").rel("mw:WikiLink").attr("href", "./Foo").text("bar").close();
    b.close();
    assert_eq!(wikitext(&b.finish()), "[[Foo]] and [[Foo|bar]]");
}

#[test]
fn quotes_wrap_children() {
    let mut b = DocumentBuilder::new();
    b.open("p").text("a");
    b.open("b").text("x").close();
    b.text("c").close();
    assert_eq!(wikitext(&b.finish()), "a'''x'''c");
}

#[test]
fn unknown_inline_tags_fall_back_to_html() {
    let mut b = DocumentBuilder::new();
    b.open("p");
    b.open("span").attr("class", "x").text("y").close();
    b.close();
    assert_eq!(wikitext(&b.finish()), "<span class=\"x\">y</span>");
}
