//! Wikitext-to-HTML side of the round trip: source range bookkeeping for a
//! freshly parsed DOM.

pub mod perf_fixtures;

mod compute_dsr;
mod config;
mod tag_widths;

pub use crate::compute_dsr::compute_dsr;
pub use crate::config::DsrOptions;
pub use crate::tag_widths::{TagWidths, has_limited_tsr, is_quote_tag, wt_tag_widths};
