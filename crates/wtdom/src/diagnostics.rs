//! Structured sink for recoverable anomalies.
//!
//! Neither engine fails on inconsistent input; they record a [`Diagnostic`]
//! and carry on with the affected field left unknown or clamped. Every report
//! is mirrored to the `log` facade so a host with a logger installed sees it
//! without inspecting the sink.

use std::fmt;

use crate::types::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Computed start disagrees with the start the parent expected.
    DsrInconsistent,
    /// A computed end went negative and was clamped to zero.
    DsrNegative,
    /// Neighbouring ranges overlap in a way no separator can be cut from.
    DsrBackwards,
    /// Merged newline constraints had `min > max`.
    IncompatibleConstraints,
}

impl DiagnosticKind {
    pub fn log_target(self) -> &'static str {
        match self {
            DiagnosticKind::DsrInconsistent | DiagnosticKind::DsrNegative => "wt2html.dsr",
            DiagnosticKind::DsrBackwards | DiagnosticKind::IncompatibleConstraints => {
                "html2wt.sep"
            }
        }
    }

    fn log_level(self) -> log::Level {
        match self {
            DiagnosticKind::IncompatibleConstraints => log::Level::Info,
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::DsrInconsistent => "dsr-inconsistent",
            DiagnosticKind::DsrNegative => "dsr-negative",
            DiagnosticKind::DsrBackwards => "dsr-backwards",
            DiagnosticKind::IncompatibleConstraints => "incompatible-constraints",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub node: Option<NodeId>,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, kind: DiagnosticKind, node: Option<NodeId>, message: String) {
        log::log!(
            target: kind.log_target(),
            kind.log_level(),
            "{kind}: {message} (node={node:?})"
        );
        self.entries.push(Diagnostic {
            kind,
            node,
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    pub fn has(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
