//! Arena DOM for wikitext round-tripping.
//!
//! Elements carry a metadata sidecar ([`NodeData`]) with the source ranges
//! and parse flags that the DSR and separator engines read and write. Nodes
//! live in a [`Document`] arena and are addressed by [`NodeId`]; removing a
//! node detaches it without invalidating any other id.

pub mod builder;
pub mod debug;
pub mod diagnostics;
pub mod predicates;
pub mod traverse;

mod document;
mod node_data;
mod source_range;
mod types;

pub use crate::builder::DocumentBuilder;
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use crate::document::{Children, Document, DomError};
pub use crate::node_data::{NodeData, Stx};
pub use crate::source_range::{DomSourceRange, SourceRange};
pub use crate::types::{DiffMarks, Element, NodeId, NodeKind};
