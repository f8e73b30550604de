//! Static wikitext tag widths.
//!
//! Widths are byte counts of the wikitext markup that opens and closes an
//! element (`'''` for `b`, `==` for `h2`). `None` means the width depends on
//! the source and cannot be known from the tag name alone.

use wtdom::predicates::heading_level;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagWidths {
    pub open: Option<usize>,
    pub close: Option<usize>,
}

impl TagWidths {
    pub const fn new(open: Option<usize>, close: Option<usize>) -> Self {
        Self { open, close }
    }

    const fn fixed(open: usize, close: usize) -> Self {
        Self::new(Some(open), Some(close))
    }
}

pub fn wt_tag_widths(name: &str) -> Option<TagWidths> {
    let widths = match name {
        "body" | "html" | "head" | "p" | "meta" | "ol" | "ul" | "dl" | "tbody" | "thead"
        | "tfoot" | "br" | "figcaption" => TagWidths::fixed(0, 0),
        "pre" | "li" | "dt" | "dd" => TagWidths::fixed(1, 0),
        "hr" => TagWidths::fixed(4, 0),
        "table" | "i" | "figure" => TagWidths::fixed(2, 2),
        "b" => TagWidths::fixed(3, 3),
        "tr" | "td" | "th" => TagWidths::new(None, Some(0)),
        _ => {
            let level = heading_level(name)?;
            TagWidths::fixed(level, level)
        }
    };
    Some(widths)
}

/// Tags whose tokenizer range covers only the opening markup. For every
/// other wikitext-generated tag the range covers the whole subtree.
pub fn has_limited_tsr(name: &str) -> bool {
    matches!(
        name,
        "b" | "i"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "ul"
            | "ol"
            | "dl"
            | "li"
            | "dt"
            | "dd"
            | "table"
            | "caption"
            | "tr"
            | "td"
            | "th"
            | "hr"
            | "br"
            | "pre"
    )
}

/// Quote tags (`''`, `'''`).
pub fn is_quote_tag(name: &str) -> bool {
    matches!(name, "b" | "i")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_are_symmetric() {
        assert_eq!(wt_tag_widths("h3"), Some(TagWidths::fixed(3, 3)));
        assert_eq!(wt_tag_widths("h7"), None);
    }

    #[test]
    fn table_rows_have_unknown_open_width() {
        assert_eq!(wt_tag_widths("td"), Some(TagWidths::new(None, Some(0))));
        assert_eq!(wt_tag_widths("b"), Some(TagWidths::fixed(3, 3)));
        assert_eq!(wt_tag_widths("span"), None);
    }

    #[test]
    fn zero_width_table_entries_match_the_wtdom_predicate() {
        for name in ["p", "meta", "ol", "ul", "dl", "tbody", "thead", "tfoot", "br", "figcaption"] {
            assert_eq!(wt_tag_widths(name), Some(TagWidths::fixed(0, 0)), "{name}");
            assert!(wtdom::predicates::is_zero_width_wikitext_tag(name), "{name}");
        }
        for name in ["html", "head", "body"] {
            assert!(!wtdom::predicates::is_zero_width_wikitext_tag(name), "{name}");
        }
    }
}
