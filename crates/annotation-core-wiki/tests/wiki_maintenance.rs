use annotation_core::{
    Annotation, AnnotationMaintainer, AnnotationState, AnnotationStore, InMemoryAnnotationStore,
    MaintenanceCause, RenderError,
};
use annotation_core_wiki::WikiRenderer;
use pretty_assertions::assert_eq;

const TARGET: &str = "Main.Fox";
const PREVIOUS: &str = "= Fox =\n\nThe **quick** fox jumps over the //lazy// dog.";

fn seeded_store() -> InMemoryAnnotationStore {
    let store = InMemoryAnnotationStore::new();
    store
        .add_annotation(Annotation::new("quick", TARGET, "quick").with_context("The ", " fox"))
        .unwrap();
    store
        .add_annotation(Annotation::new("lazy", TARGET, "lazy").with_context("the ", " dog."))
        .unwrap();
    store
}

#[test]
fn test_markup_only_change_is_a_no_op() {
    let store = seeded_store();
    let maintainer = AnnotationMaintainer::new(&store, WikiRenderer::new().unwrap());

    let current = "= Fox =\n\nThe //quick// fox jumps over the **lazy** dog.\n\n{{comment}}todo{{/comment}}";
    let report = maintainer.update_annotations(TARGET, PREVIOUS, current).unwrap();
    assert_eq!(report.fetched, 2);
    assert_eq!(report.persisted, 0);
    assert_eq!(store.update_calls(), 0);
}

#[test]
fn test_text_edit_under_markup_is_tracked() {
    let store = seeded_store();
    let maintainer = AnnotationMaintainer::new(&store, WikiRenderer::new().unwrap());

    let current = "= Fox =\n\nThe **slow brown** fox jumps over the //lazy// dog.";
    let report = maintainer.update_annotations(TARGET, PREVIOUS, current).unwrap();
    assert_eq!(report.persisted, 1);

    let stored = store.annotations(TARGET).unwrap();
    let quick = stored.iter().find(|a| a.id == "quick").unwrap();
    assert_eq!(quick.selection, "slow brown");
    assert_eq!(quick.state, AnnotationState::Updated);
    assert_eq!(quick.original_selection.as_deref(), Some("quick"));

    let lazy = stored.iter().find(|a| a.id == "lazy").unwrap();
    assert_eq!(lazy.state, AnnotationState::Safe);
}

#[test]
fn test_macro_errors_abort_maintenance() {
    let store = seeded_store();
    let maintainer = AnnotationMaintainer::new(&store, WikiRenderer::new().unwrap());

    let err = maintainer
        .update_annotations(TARGET, PREVIOUS, "{{info}}unterminated")
        .unwrap_err();
    assert!(matches!(
        err.cause,
        MaintenanceCause::Render(RenderError::Transformation { .. })
    ));
    assert_eq!(store.update_calls(), 0);
}

#[test]
fn test_nested_boxes_are_maintained() {
    let store = InMemoryAnnotationStore::new();
    store
        .add_annotation(Annotation::new("inner", TARGET, "inner").with_context("outer ", " note"))
        .unwrap();
    let maintainer = AnnotationMaintainer::new(&store, WikiRenderer::new().unwrap());

    let previous = "{{box}}outer {{box}}inner note{{/box}} tail{{/box}}";
    let current = "{{box}}outer {{box}}inner **note**{{/box}} tail{{/box}} and more";
    let report = maintainer.update_annotations(TARGET, previous, current).unwrap();
    assert_eq!(report.unmapped, 0);
    assert_eq!(report.persisted, 0);
}
