//! Annotation position maintenance.
//!
//! When a document is saved, its annotations must follow the text they were made on. The
//! [`AnnotationMaintainer`] renders the previous and current source to plain text, diffs the two
//! renderings, and for every annotation:
//!
//! 1. locates the annotation's context in the previous rendering (whitespace-insensitively),
//! 2. classifies every edit delta against the selection span and derives the shifted context
//!    start and the new selection length,
//! 3. slices the new selection and context out of the current rendering,
//! 4. grows the context until it is unique again.
//!
//! Only annotations whose state or text changed are written back, in a single batch.

use crate::annotation::{Annotation, AnnotationState};
use crate::config::MaintainerConfig;
use crate::delta::{DeltaPlacement, EditDelta};
use crate::diff::{ContentDiffer, MyersDiffer};
use crate::error::{MaintenanceCause, MaintenanceError};
use crate::expander::UniquenessExpander;
use crate::normalize::{AlteredContent, strip_whitespace};
use crate::render::{PlainTextRenderer, Syntax};
use crate::search;
use crate::store::AnnotationStore;
use tracing::{debug, debug_span, trace};

/// Counters describing one maintenance run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Annotations read from the store.
    pub fetched: usize,
    /// Annotations ignored because they were already `Altered`.
    pub skipped: usize,
    /// Annotations whose context could not be found in the previous rendering.
    pub unmapped: usize,
    /// Annotations written back to the store.
    pub persisted: usize,
    /// Annotations that became `Altered` during this run.
    pub altered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Skipped,
    Unmapped,
    Unchanged,
    Changed,
}

/// The two renderings of a document, prepared for relocation.
struct Revisions<'a> {
    spaceless_previous: AlteredContent,
    current: &'a str,
    current_chars: Vec<char>,
}

impl<'a> Revisions<'a> {
    fn new(previous: &str, current: &'a str) -> Self {
        Self {
            spaceless_previous: strip_whitespace(previous),
            current,
            current_chars: current.chars().collect(),
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.current_chars[start..end].iter().collect()
    }
}

/// Keeps the annotations of a document anchored across content changes.
///
/// Collaborators are injected: `S` stores annotations, `R` renders sources to plain text and `D`
/// diffs the renderings.
#[derive(Debug)]
pub struct AnnotationMaintainer<S, R, D = MyersDiffer> {
    store: S,
    renderer: R,
    differ: D,
    expander: UniquenessExpander,
    config: MaintainerConfig,
}

impl<S, R> AnnotationMaintainer<S, R, MyersDiffer>
where
    S: AnnotationStore,
    R: PlainTextRenderer,
{
    /// Create a maintainer with the default configuration and differ.
    pub fn new(store: S, renderer: R) -> Self {
        Self::with_config(store, renderer, MaintainerConfig::default())
    }

    /// Create a maintainer with the default differ, limited as configured.
    pub fn with_config(store: S, renderer: R, config: MaintainerConfig) -> Self {
        let differ = config
            .diff_max_cost
            .map_or_else(MyersDiffer::new, MyersDiffer::with_max_cost);
        Self::with_differ(store, renderer, differ, config)
    }
}

impl<S, R, D> AnnotationMaintainer<S, R, D>
where
    S: AnnotationStore,
    R: PlainTextRenderer,
    D: ContentDiffer,
{
    /// Create a maintainer with a custom differ.
    pub fn with_differ(store: S, renderer: R, differ: D, config: MaintainerConfig) -> Self {
        let expander =
            UniquenessExpander::new().with_word_snapping(config.snap_to_word_boundaries);
        Self {
            store,
            renderer,
            differ,
            expander,
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &MaintainerConfig {
        &self.config
    }

    /// The annotation store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Update the annotations of `target` after its source changed from `previous` to
    /// `current`, both in the configured default syntax.
    pub fn update_annotations(
        &self,
        target: &str,
        previous: &str,
        current: &str,
    ) -> Result<MaintenanceReport, MaintenanceError> {
        self.update_annotations_with_syntax(target, &self.config.default_syntax, previous, current)
    }

    /// Update the annotations of `target` after its source, written in `syntax`, changed from
    /// `previous` to `current`.
    ///
    /// Any collaborator failure aborts the whole run; nothing is persisted in that case.
    pub fn update_annotations_with_syntax(
        &self,
        target: &str,
        syntax: &Syntax,
        previous: &str,
        current: &str,
    ) -> Result<MaintenanceReport, MaintenanceError> {
        let span = debug_span!("update_annotations", page = target, syntax = %syntax);
        let _guard = span.enter();
        self.maintain(target, syntax, previous, current)
            .map_err(|cause| MaintenanceError::new(target, cause))
    }

    fn maintain(
        &self,
        target: &str,
        syntax: &Syntax,
        previous: &str,
        current: &str,
    ) -> Result<MaintenanceReport, MaintenanceCause> {
        let annotations = self.store.annotations(target)?;
        let mut report = MaintenanceReport {
            fetched: annotations.len(),
            ..MaintenanceReport::default()
        };
        if annotations.is_empty() {
            debug!("no annotations, nothing to maintain");
            return Ok(report);
        }

        let previous_rendered = self.renderer.render(previous, syntax)?;
        let current_rendered = self.renderer.render(current, syntax)?;
        let deltas = self.differ.diff(&previous_rendered, &current_rendered)?;
        if deltas.is_empty() {
            debug!("rendered content unchanged");
            return Ok(report);
        }
        debug!(deltas = deltas.len(), annotations = report.fetched, "maintaining annotations");

        let revisions = Revisions::new(&previous_rendered, &current_rendered);
        let mut changed = Vec::new();
        for mut annotation in annotations {
            match self.recompute_in(&mut annotation, &deltas, &revisions) {
                Outcome::Skipped => report.skipped += 1,
                Outcome::Unmapped => report.unmapped += 1,
                Outcome::Unchanged => {}
                Outcome::Changed => {
                    if annotation.state == AnnotationState::Altered {
                        report.altered += 1;
                    }
                    changed.push(annotation);
                }
            }
        }

        if !changed.is_empty() {
            self.store.update_annotations(target, &changed)?;
        }
        report.persisted = changed.len();
        debug!(
            persisted = report.persisted,
            altered = report.altered,
            unmapped = report.unmapped,
            "annotations maintained"
        );
        Ok(report)
    }

    /// Recompute one annotation against already rendered content.
    ///
    /// `deltas` must describe the change from `previous_rendered` to `current_rendered`.
    /// Returns `true` if the annotation changed and should be persisted.
    pub fn recompute(
        &self,
        annotation: &mut Annotation,
        deltas: &[EditDelta],
        previous_rendered: &str,
        current_rendered: &str,
    ) -> bool {
        let revisions = Revisions::new(previous_rendered, current_rendered);
        self.recompute_in(annotation, deltas, &revisions) == Outcome::Changed
    }

    fn recompute_in(
        &self,
        annotation: &mut Annotation,
        deltas: &[EditDelta],
        revisions: &Revisions<'_>,
    ) -> Outcome {
        if annotation.state.is_terminal() {
            return Outcome::Skipped;
        }

        let left = strip_whitespace(&annotation.selection_left_context);
        let selection = strip_whitespace(&annotation.selection);
        let right = strip_whitespace(&annotation.selection_right_context);
        if selection.is_empty() {
            trace!(annotation = %annotation.id, "blank selection, cannot be located");
            return Outcome::Unmapped;
        }

        let needle = [left.content(), selection.content(), right.content()].concat();
        let previous = &revisions.spaceless_previous;
        let Some(found) = search::find(previous.content(), &needle) else {
            trace!(annotation = %annotation.id, "context not found in previous content");
            return Outcome::Unmapped;
        };

        // Spaceless offsets of the last char of the context and of the selection. Ends are
        // derived from the last char inside so that trailing whitespace stays outside.
        let spaceless_context_last = found.end - 1;
        let spaceless_selection_start = found.start + left.len();
        let spaceless_selection_last = spaceless_selection_start + selection.len() - 1;

        let context_start = previous.initial_offset(found.start);
        let context_end = previous.initial_offset(spaceless_context_last) + 1;
        let selection_start = previous.initial_offset(spaceless_selection_start);
        let selection_end = previous.initial_offset(spaceless_selection_last) + 1;

        let previous_state = annotation.state;
        let mut next_state = previous_state;
        let mut altered_context_start = context_start as isize;
        let mut altered_selection_len = (selection_end - selection_start) as isize;

        for delta in deltas {
            let placement = delta.classify(selection_start, selection_end);
            trace!(
                annotation = %annotation.id,
                offset = delta.offset,
                original_len = delta.original_len(),
                signed_delta = delta.signed_delta(),
                ?placement,
                "delta classified"
            );
            match placement {
                DeltaPlacement::Before => altered_context_start += delta.signed_delta(),
                DeltaPlacement::Inside => {
                    altered_selection_len += delta.signed_delta();
                    next_state = next_state.transition(AnnotationState::Updated);
                }
                DeltaPlacement::Covers => {
                    next_state = AnnotationState::Altered;
                    break;
                }
                DeltaPlacement::OverlapsStart => {
                    altered_context_start += delta.signed_delta();
                    next_state = next_state.transition(AnnotationState::Updated);
                }
                DeltaPlacement::OverlapsEnd => {
                    next_state = next_state.transition(AnnotationState::Updated);
                }
                DeltaPlacement::After => {}
            }
        }

        // Nothing of the selected text survived.
        if altered_selection_len <= 0 {
            next_state = AnnotationState::Altered;
        }

        if next_state == AnnotationState::Altered {
            debug!(annotation = %annotation.id, "selection overwritten, annotation altered");
            annotation.set_state(AnnotationState::Altered);
            return Outcome::Changed;
        }

        let left_len = (selection_start - context_start) as isize;
        let right_len = (context_end - selection_end) as isize;
        let len = revisions.current_chars.len() as isize;

        // Boundaries are clamped to the current content.
        let new_selection_start = (altered_context_start + left_len).clamp(0, len);
        let new_selection_end =
            (new_selection_start + altered_selection_len.max(0)).clamp(new_selection_start, len);
        let new_context_start = (new_selection_start - left_len).max(0);
        let new_context_end = (new_selection_end + right_len).min(len);

        let [context_start, selection_start, selection_end, context_end] = [
            new_context_start,
            new_selection_start,
            new_selection_end,
            new_context_end,
        ]
        .map(|offset| offset as usize);

        let new_left = revisions.slice(context_start, selection_start);
        let new_selection = revisions.slice(selection_start, selection_end);
        let new_right = revisions.slice(selection_end, context_end);

        // A context edit is an update too, even when no delta touched the selection.
        if next_state == AnnotationState::Safe
            && (strip_whitespace(&new_left).content() != left.content()
                || strip_whitespace(&new_right).content() != right.content())
        {
            next_state = AnnotationState::Updated;
        }

        if next_state == AnnotationState::Updated && previous_state == AnnotationState::Safe {
            annotation.snapshot_original_selection();
        }
        annotation.set_state(next_state);

        let before = (
            annotation.selection_left_context.clone(),
            annotation.selection.clone(),
            annotation.selection_right_context.clone(),
        );
        annotation.set_selection(new_selection, new_left, new_right);
        self.expander.ensure_unique(
            revisions.current,
            annotation,
            context_start,
            selection_start - context_start,
            selection_end - selection_start,
            context_end - selection_end,
        );

        let changed = annotation.state != previous_state
            || annotation.selection_left_context != before.0
            || annotation.selection != before.1
            || annotation.selection_right_context != before.2;
        if changed {
            trace!(
                annotation = %annotation.id,
                state = ?annotation.state,
                selection = %annotation.selection,
                "annotation updated"
            );
            Outcome::Changed
        } else {
            Outcome::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PlainSyntaxRenderer;
    use crate::store::InMemoryAnnotationStore;

    fn maintainer() -> AnnotationMaintainer<InMemoryAnnotationStore, PlainSyntaxRenderer> {
        AnnotationMaintainer::new(InMemoryAnnotationStore::new(), PlainSyntaxRenderer)
    }

    fn quick() -> Annotation {
        Annotation::new("a1", "Main.Fox", "quick").with_context("The ", " fox jumps.")
    }

    #[test]
    fn test_edit_inside_selection() {
        let mut annotation = quick();
        let deltas = [EditDelta::new(4, "quick", "slow brown")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "The slow brown fox jumps.",
        );

        assert!(changed);
        assert_eq!(annotation.state, AnnotationState::Updated);
        assert_eq!(annotation.selection, "slow brown");
        assert_eq!(annotation.selection_left_context, "The ");
        assert_eq!(annotation.selection_right_context, " fox jumps.");
        assert_eq!(annotation.original_selection.as_deref(), Some("quick"));
    }

    #[test]
    fn test_covering_edit_alters() {
        let mut annotation = quick();
        let deltas = [EditDelta::new(0, "The quick fox", "A dog")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "A dog jumps.",
        );

        assert!(changed);
        assert_eq!(annotation.state, AnnotationState::Altered);
        assert_eq!(annotation.selection, "quick");
        assert!(annotation.original_selection.is_none());
    }

    #[test]
    fn test_deleting_the_selection_alters() {
        let mut annotation =
            Annotation::new("a1", "T", "quick").with_context("The ", ", fox runs");
        let deltas = [EditDelta::new(4, "quick", "")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick, fox runs",
            "The , fox runs",
        );

        assert!(changed);
        assert_eq!(annotation.state, AnnotationState::Altered);
        assert_eq!(annotation.selection, "quick");
    }

    #[test]
    fn test_altered_is_never_recomputed() {
        let mut annotation = quick();
        annotation.state = AnnotationState::Altered;
        let before = annotation.clone();
        let deltas = [EditDelta::new(4, "quick", "slow")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "The slow fox jumps.",
        );
        assert!(!changed);
        assert_eq!(annotation, before);
    }

    #[test]
    fn test_insertion_far_before_keeps_annotation() {
        let mut annotation =
            Annotation::new("a1", "T", "fox").with_context("quick ", " jumps");
        let deltas = [EditDelta::new(0, "", "Oh. ")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "Oh. The quick fox jumps.",
        );
        assert!(!changed);
        assert_eq!(annotation.state, AnnotationState::Safe);
        assert_eq!(annotation.selection, "fox");
    }

    #[test]
    fn test_edit_inside_left_context_updates_context() {
        let mut annotation = quick();
        let deltas = [EditDelta::new(0, "The", "A")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "A quick fox jumps.",
        );
        assert!(changed);
        assert_eq!(annotation.state, AnnotationState::Updated);
        assert_eq!(annotation.selection, "quick");
        assert_eq!(annotation.selection_left_context, "A ");
        assert_eq!(annotation.original_selection.as_deref(), Some("quick"));
    }

    #[test]
    fn test_overlapping_end_keeps_selection_size() {
        let mut annotation = quick();
        // "ck f" -> "ck, f": the delta starts inside "quick" and ends in the right context.
        let deltas = [EditDelta::new(7, "ck f", "ck, f")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "The quick, fox jumps.",
        );
        assert!(changed);
        assert_eq!(annotation.state, AnnotationState::Updated);
        assert_eq!(annotation.selection, "quick");
        assert_eq!(annotation.selection_right_context, ", fox jumps");
    }

    #[test]
    fn test_whitespace_differences_still_locate() {
        // The stored context was captured with different whitespace than the rendering.
        let mut annotation =
            Annotation::new("a1", "T", "quick").with_context("The  ", "\nfox jumps.");
        let deltas = [EditDelta::new(4, "quick", "slow")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "The slow fox jumps.",
        );
        assert!(changed);
        assert_eq!(annotation.selection, "slow");
        assert_eq!(annotation.selection_left_context, "The ");
        assert_eq!(annotation.selection_right_context, " fox jumps.");
    }

    #[test]
    fn test_unlocatable_annotation_is_left_alone() {
        let mut annotation = Annotation::new("a1", "T", "wolf").with_context("grey ", "");
        let before = annotation.clone();
        let deltas = [EditDelta::new(4, "quick", "slow")];
        let changed = maintainer().recompute(
            &mut annotation,
            &deltas,
            "The quick fox jumps.",
            "The slow fox jumps.",
        );
        assert!(!changed);
        assert_eq!(annotation, before);
    }
}
