//! Annotation data model.
//!
//! An [`Annotation`] is anchored to a span of a document's rendered plain text by three strings:
//! the selected text itself plus a left and right context used to tell repeated occurrences of
//! the selection apart. The anchor is textual, not positional: offsets are recomputed from the
//! strings every time the document changes.

use serde::{Deserialize, Serialize};

/// Lifecycle state of an annotation with respect to document edits.
///
/// Transitions only move forward: `Safe -> Updated -> Altered` (or straight to `Altered`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnnotationState {
    /// No edit has touched the annotation so far.
    #[default]
    Safe,
    /// An edit touched the selection or its context, but the selection could be recovered.
    Updated,
    /// An edit fully overlapped the selection. The annotation is no longer tracked.
    Altered,
}

impl AnnotationState {
    /// Returns `true` if no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Altered)
    }

    /// Returns the state reached by requesting `next`.
    ///
    /// Backward moves (`Updated -> Safe`, anything out of `Altered`) keep the current state.
    pub fn transition(self, next: AnnotationState) -> AnnotationState {
        match (self, next) {
            (Self::Altered, _) => Self::Altered,
            (Self::Updated, Self::Safe) => Self::Updated,
            (_, next) => next,
        }
    }
}

/// A user-created marker anchored to a span of a document's rendered plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Unique identifier of the annotation within its target.
    pub id: String,
    /// Identifier of the annotated document.
    pub target: String,
    /// The exact text covered by the annotation.
    pub selection: String,
    /// Text immediately before the selection.
    #[serde(default)]
    pub selection_left_context: String,
    /// Text immediately after the selection.
    #[serde(default)]
    pub selection_right_context: String,
    /// Selection text at the time of the first update, set once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_selection: Option<String>,
    /// Lifecycle state.
    #[serde(default)]
    pub state: AnnotationState,
    /// Author of the annotation, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Comment body attached to the selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
    /// Creation date as supplied by the annotation service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl Annotation {
    /// Create a new `Safe` annotation with an empty context.
    pub fn new(
        id: impl Into<String>,
        target: impl Into<String>,
        selection: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            target: target.into(),
            selection: selection.into(),
            selection_left_context: String::new(),
            selection_right_context: String::new(),
            original_selection: None,
            state: AnnotationState::Safe,
            author: None,
            annotation: None,
            date: None,
        }
    }

    /// Set the left and right context.
    pub fn with_context(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.selection_left_context = left.into();
        self.selection_right_context = right.into();
        self
    }

    /// Set the comment body.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.annotation = Some(comment.into());
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// The selection surrounded by its left and right context.
    pub fn selection_in_context(&self) -> String {
        let mut out = String::with_capacity(
            self.selection_left_context.len()
                + self.selection.len()
                + self.selection_right_context.len(),
        );
        out.push_str(&self.selection_left_context);
        out.push_str(&self.selection);
        out.push_str(&self.selection_right_context);
        out
    }

    /// Replace selection and context at once.
    pub fn set_selection(
        &mut self,
        selection: impl Into<String>,
        left_context: impl Into<String>,
        right_context: impl Into<String>,
    ) {
        self.selection = selection.into();
        self.selection_left_context = left_context.into();
        self.selection_right_context = right_context.into();
    }

    /// Record the current selection as the original one, unless that already happened.
    pub fn snapshot_original_selection(&mut self) {
        if self.original_selection.is_none() {
            self.original_selection = Some(self.selection.clone());
        }
    }

    /// Move to `next`, following [`AnnotationState::transition`].
    pub fn set_state(&mut self, next: AnnotationState) {
        self.state = self.state.transition(next);
    }
}
