//! Source offsets attached to elements.
//!
//! All offsets are byte offsets into the UTF-8 page source.

/// Tag source range stamped by the tokenizer: `[start, end)` of one literal
/// tag occurrence (or of a whole construct for self-contained tokens such as
/// `[[Foo]]`).
///
/// Invariant: `start <= end`. Never mutated once stamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceRange {
    pub start: usize,
    pub end: usize,
}

impl SourceRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "source range start must be <= end");
        Self { start, end }
    }

    pub fn len(self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// DOM source range: the source slice that reproduces an element's whole
/// serialization, plus the widths of its own opening and closing markup.
///
/// Any field may be unknown. Consumers must treat a range without both
/// offsets as "no verbatim reuse possible".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DomSourceRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub open_width: Option<usize>,
    pub close_width: Option<usize>,
}

impl DomSourceRange {
    pub fn new(
        start: Option<usize>,
        end: Option<usize>,
        open_width: Option<usize>,
        close_width: Option<usize>,
    ) -> Self {
        Self {
            start,
            end,
            open_width,
            close_width,
        }
    }

    /// Fully known range, handy in tests and fixtures.
    pub fn known(start: usize, end: usize, open_width: usize, close_width: usize) -> Self {
        Self::new(Some(start), Some(end), Some(open_width), Some(close_width))
    }

    /// Zero-width range at `at` with unknown widths (fostered content).
    pub fn point(at: usize) -> Self {
        Self::new(Some(at), Some(at), None, None)
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    pub fn has_valid_tag_widths(&self) -> bool {
        self.open_width.is_some() && self.close_width.is_some()
    }

    pub fn width(&self) -> Option<usize> {
        Some(self.end?.saturating_sub(self.start?))
    }

    /// Start of the content between the opening and closing markup.
    pub fn inner_start(&self) -> Option<usize> {
        Some(self.start? + self.open_width?)
    }

    /// End of the content between the opening and closing markup.
    pub fn inner_end(&self) -> Option<usize> {
        self.end?.checked_sub(self.close_width?)
    }
}
