use wtdom::SourceRange;

/// Knobs for one DSR computation run.
#[derive(Clone, Debug, Default)]
pub struct DsrOptions {
    /// Source window the DOM was parsed from. Defaults to the whole source,
    /// `[0, source_len)`; sub-documents (extension bodies, attribute values)
    /// pass their own window.
    pub source_offsets: Option<SourceRange>,
    /// The DOM is an expanded attribute value. Attribute values carry no
    /// source offsets, so a start mismatch at the root is expected.
    pub attr_expansion: bool,
}
