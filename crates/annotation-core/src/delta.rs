//! Structured edit deltas between two versions of rendered content.
//!
//! Deltas are expressed in **character offsets** (Unicode scalar values) into the *previous*
//! text. Unlike editor undo deltas, they are not applied in sequence: every delta of a set refers
//! to the same previous text and deltas of a set never overlap.

/// A single change between a previous and a current text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDelta {
    /// Start character offset of the change in the previous text.
    pub offset: usize,
    /// Replaced text of the previous version (may be empty).
    pub original: String,
    /// Replacement text of the current version (may be empty).
    pub revised: String,
}

/// Where a delta falls relative to an annotation selection `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaPlacement {
    /// The delta ends at or before the selection start.
    Before,
    /// The delta lies within the selection.
    Inside,
    /// The delta spans past both selection boundaries.
    Covers,
    /// The delta starts before the selection and ends inside it.
    OverlapsStart,
    /// The delta starts inside the selection and ends after it.
    OverlapsEnd,
    /// The delta starts at or after the selection end.
    After,
}

impl EditDelta {
    /// Create a delta replacing `original` with `revised` at `offset`.
    pub fn new(offset: usize, original: impl Into<String>, revised: impl Into<String>) -> Self {
        Self {
            offset,
            original: original.into(),
            revised: revised.into(),
        }
    }

    /// Length of `original` in characters.
    pub fn original_len(&self) -> usize {
        self.original.chars().count()
    }

    /// Length of `revised` in characters.
    pub fn revised_len(&self) -> usize {
        self.revised.chars().count()
    }

    /// Exclusive end character offset in the previous text.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.original_len())
    }

    /// `revised_len - original_len`.
    pub fn signed_delta(&self) -> isize {
        self.revised_len() as isize - self.original_len() as isize
    }

    /// Returns `true` if nothing from the previous text is replaced.
    pub fn is_insertion(&self) -> bool {
        self.original.is_empty()
    }

    /// Classify this delta against the selection `[start, end)`.
    ///
    /// Rules are tried in order and the first match wins, so boundary cases resolve as:
    /// - a pure insertion at `start` is `Before`, one at `end` is `After`;
    /// - a replacement of exactly `[start, end)` is `Inside`;
    /// - `Covers` therefore always exceeds the selection on at least one side.
    pub fn classify(&self, start: usize, end: usize) -> DeltaPlacement {
        let d_start = self.offset;
        let d_end = self.end();

        if d_end <= start {
            DeltaPlacement::Before
        } else if d_start >= end {
            DeltaPlacement::After
        } else if d_start >= start && d_end <= end {
            DeltaPlacement::Inside
        } else if d_start <= start && d_end >= end {
            DeltaPlacement::Covers
        } else if d_end <= end {
            DeltaPlacement::OverlapsStart
        } else {
            DeltaPlacement::OverlapsEnd
        }
    }
}
