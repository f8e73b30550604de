//! Newline constraints between adjacent output fragments.
//!
//! Handlers answer "how many newlines do you want between you and that
//! node" with an [`NlConstraint`]. The pairwise answer of two handlers is
//! combined by [`get_sep_nl_constraints`]; answers collected across
//! separator-only nodes (comments, blank text) accumulate through
//! [`merge_constraints`].

use log::info;
use wtdom::{DiagnosticKind, Diagnostics, NodeId};

const TRACE: &str = "html2wt.sep";

/// Upper bound used when no handler states one.
pub const DEFAULT_MAX_NLS: u32 = 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NlConstraint {
    pub min: Option<u32>,
    pub max: Option<u32>,
    /// Keep this constraint's minimum even when a later one conflicts.
    pub force: bool,
}

impl NlConstraint {
    pub const NONE: NlConstraint = NlConstraint {
        min: None,
        max: None,
        force: false,
    };

    pub const fn range(min: u32, max: u32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            force: false,
        }
    }

    pub const fn at_least(min: u32) -> Self {
        Self {
            min: Some(min),
            max: None,
            force: false,
        }
    }

    pub const fn at_most(max: u32) -> Self {
        Self {
            min: None,
            max: Some(max),
            force: false,
        }
    }

    pub const fn forced(self) -> Self {
        Self {
            force: true,
            ..self
        }
    }

    pub fn min_or_zero(&self) -> u32 {
        self.min.unwrap_or(0)
    }

    pub fn max_or_default(&self) -> u32 {
        self.max.unwrap_or(DEFAULT_MAX_NLS)
    }
}

/// How the two nodes around a separator relate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SepType {
    Sibling,
    /// A is the parent, B its first child.
    ParentChild,
    /// A is the last child, B its parent.
    ChildParent,
}

impl SepType {
    pub fn as_str(self) -> &'static str {
        match self {
            SepType::Sibling => "sibling",
            SepType::ParentChild => "parent-child",
            SepType::ChildParent => "child-parent",
        }
    }
}

/// Where the constraint came from; the indent-pre guard and padding
/// placement look at this.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub on_sol: bool,
    /// B's handler needs B to start on a fresh line.
    pub force_sol: bool,
    pub sep_type: SepType,
    pub node_a: NodeId,
    pub node_b: NodeId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeparatorConstraints {
    pub nl: NlConstraint,
    pub info: ConstraintInfo,
}

/// Combine A's and B's wishes for one node pair. B wins on conflict.
pub fn get_sep_nl_constraints(a: NlConstraint, b: NlConstraint) -> NlConstraint {
    let mut nl = NlConstraint {
        min: a.min,
        max: a.max,
        force: a.force || b.force,
    };

    if let Some(b_min) = b.min {
        if nl.max.is_some_and(|max| max < b_min) {
            info!(target: TRACE, "conflicting newline constraints {a:?} / {b:?}, using B's min");
            nl.min = Some(b_min);
            nl.max = Some(b_min);
        } else {
            nl.min = Some(nl.min_or_zero().max(b_min));
        }
    }

    if let Some(b_max) = b.max {
        if nl.min.is_some_and(|min| min > b_max) {
            info!(target: TRACE, "conflicting newline constraints {a:?} / {b:?}, using B's max");
            nl.min = Some(b_max);
            nl.max = Some(b_max);
        } else {
            nl.max = Some(nl.max.map_or(b_max, |max| max.min(b_max)));
        }
    }

    if nl.max.is_none() {
        nl.max = Some(DEFAULT_MAX_NLS);
    }
    nl
}

/// Fold a newly observed constraint into the accumulated one.
///
/// Takes the tighter bound on each side. When that leaves `min > max` the
/// newer constraint wins unless the older one was forced; either way the
/// result collapses to `max = min` and the conflict is reported.
pub fn merge_constraints(
    old: NlConstraint,
    new: NlConstraint,
    node: Option<NodeId>,
    diagnostics: &mut Diagnostics,
) -> NlConstraint {
    let mut min = old.min_or_zero().max(new.min_or_zero());
    let max = old.max_or_default().min(new.max_or_default());
    let force = old.force || new.force;

    if min > max {
        if !old.force {
            let new_max_fits = new.max.is_some_and(|m| m > min);
            if !new_max_fits
                && let Some(new_min) = new.min.filter(|&m| m > 0 && m < min)
            {
                min = new_min;
            }
        }
        diagnostics.report(
            DiagnosticKind::IncompatibleConstraints,
            node,
            format!("old={old:?} new={new:?} -> min=max={min}"),
        );
        return NlConstraint {
            min: Some(min),
            max: Some(min),
            force,
        };
    }

    NlConstraint {
        min: Some(min),
        max: Some(max),
        force,
    }
}
