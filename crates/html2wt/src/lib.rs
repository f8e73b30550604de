//! HTML-to-wikitext side of the round trip.
//!
//! The serializer walks an annotated DOM and reconstructs wikitext. With the
//! original source at hand it reuses whatever the edit left untouched: whole
//! subtrees in selective mode, and the whitespace and comments between
//! nodes wherever their source ranges allow it.

pub mod constrained_text;
pub mod constraints;
pub mod escape;
pub mod handlers;

mod config;
mod separators;
mod serializer;
mod state;

pub use crate::config::{SerializeMode, SerializerConfig, WikiConfig};
pub use crate::constrained_text::{ChunkKind, ConstrainedText, escape_line};
pub use crate::constraints::{ConstraintInfo, NlConstraint, SepType, SeparatorConstraints};
pub use crate::handlers::{DefaultHandlers, DomHandler, HandlerTable};
pub use crate::separators::{make_separator, orig_src_valid_in_edited_context};
pub use crate::serializer::{
    ChildScope, SerializeError, SerializeOutput, WikitextSerializer, serialize,
};
pub use crate::state::{CurrLine, SerializerState, SeparatorState, SingleLineContext};
