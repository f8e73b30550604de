use crate::source_range::{DomSourceRange, SourceRange};

/// Which surface syntax produced an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stx {
    /// Literal HTML tag in the wikitext (`<b>` rather than `'''`).
    Html,
    /// `[[Target|text]]`
    Piped,
    /// `[[Target]]`
    Simple,
    /// Bare URL autolink.
    Url,
    /// `ISBN …`, `RFC …`, `PMID …`
    MagicLink,
    /// Table cell or definition item sharing a line with its predecessor
    /// (`||`, `!!`, `;a:b`).
    Row,
}

/// Metadata sidecar carried by every element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeData {
    /// Tokenizer-assigned range of the opening tag (or whole construct).
    pub tsr: Option<SourceRange>,
    /// Range of the matching end tag, recorded when its marker is consumed.
    pub end_tsr: Option<SourceRange>,
    /// Computed DOM source range.
    pub dsr: Option<DomSourceRange>,
    pub stx: Option<Stx>,
    pub auto_inserted_start: bool,
    pub auto_inserted_end: bool,
    /// Relocated by tree construction (foster parenting).
    pub fostered: bool,
    pub self_close: bool,
    /// Original source of placeholders, entities and stripped tags.
    pub src: Option<String>,
    pub start_tag_src: Option<String>,
    pub end_tag_src: Option<String>,
    /// Link target as written in the source (`Foo` in `[[Foo|bar]]`).
    pub target: Option<String>,
    /// Source offset where an external link's label starts.
    pub ext_link_content_offset: Option<usize>,
    /// Tag name of a `mw:Placeholder/StrippedTag`.
    pub stripped_name: Option<String>,
}

impl NodeData {
    pub fn is_literal_html(&self) -> bool {
        self.stx == Some(Stx::Html)
    }

    pub fn valid_dsr(&self) -> Option<DomSourceRange> {
        self.dsr.filter(DomSourceRange::is_valid)
    }
}
