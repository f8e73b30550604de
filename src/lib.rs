//! Round-trip core for wikitext: source ranges on the way in, separator
//! reconstruction on the way out.
//!
//! [`wt2html::compute_dsr`] annotates a freshly built DOM with the source
//! span of every element. [`html2wt::serialize`] turns a (possibly edited)
//! DOM back into wikitext, reusing the original source where the ranges and
//! diff marks allow it. [`round_trip`] runs both over one document.

pub use html2wt;
pub use wt2html;
pub use wtdom;

use html2wt::{SerializeError, SerializeOutput, SerializerConfig};
use wt2html::DsrOptions;
use wtdom::{Diagnostics, Document};

/// Annotate `doc` with source ranges for `source`, then serialize it.
///
/// The returned diagnostics hold the DSR warnings followed by the
/// serializer's own.
pub fn round_trip(
    doc: &mut Document,
    source: &str,
    dsr: &DsrOptions,
    config: &SerializerConfig,
) -> Result<SerializeOutput, SerializeError> {
    let mut diagnostics = Diagnostics::new();
    wt2html::compute_dsr(doc, source.len(), dsr, &mut diagnostics);
    let mut out = html2wt::serialize(doc, Some(source), config)?;
    diagnostics.extend(out.diagnostics);
    out.diagnostics = diagnostics;
    Ok(out)
}
