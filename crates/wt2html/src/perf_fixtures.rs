use wtdom::{Document, DocumentBuilder};

pub const ITEM_TEMPLATE: &str = "*item";

/// `*item` lines joined by newlines, and the DOM a parser would build for
/// them: one `ul` whose `li`s carry their bullet's range.
pub fn make_list(items: usize) -> (String, Document) {
    let mut source = String::with_capacity((ITEM_TEMPLATE.len() + 1) * items);
    let mut b = DocumentBuilder::new();
    b.open("ul");
    for i in 0..items {
        if i > 0 {
            source.push('\n');
            b.text("\n");
        }
        let at = source.len();
        source.push_str(ITEM_TEMPLATE);
        b.open("li").tsr(at, at + 1).text(&ITEM_TEMPLATE[1..]).close();
    }
    b.close();
    (source, b.finish())
}
