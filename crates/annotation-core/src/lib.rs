#![warn(missing_docs)]
//! Annotation Core - Headless Annotation Anchoring Engine
//!
//! # Overview
//!
//! `annotation-core` keeps text annotations anchored to the right span of a document while the
//! document is being edited. An annotation is stored as text (selection plus a left and right
//! context), never as offsets, so after every save the anchors are re-derived from the rendered
//! plain text of the previous and current versions of the document.
//!
//! # Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  AnnotationMaintainer                       │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  UniquenessExpander                         │  ← Context disambiguation
//! ├─────────────────────────────────────────────┤
//! │  EditDelta classification                   │  ← Offset translation
//! ├─────────────────────────────────────────────┤
//! │  ContentDiffer (Myers)                      │  ← What changed
//! ├─────────────────────────────────────────────┤
//! │  PlainTextRenderer + whitespace normalizer  │  ← What the reader sees
//! ├─────────────────────────────────────────────┤
//! │  AnnotationStore                            │  ← Persistence
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use annotation_core::{
//!     Annotation, AnnotationMaintainer, AnnotationState, AnnotationStore,
//!     InMemoryAnnotationStore, MaintainerConfig, PlainSyntaxRenderer, Syntax,
//! };
//!
//! let store = InMemoryAnnotationStore::new();
//! store
//!     .add_annotation(
//!         Annotation::new("a1", "Main.Fox", "quick").with_context("The ", " fox jumps."),
//!     )
//!     .unwrap();
//!
//! let config = MaintainerConfig {
//!     default_syntax: Syntax::plain(),
//!     ..MaintainerConfig::default()
//! };
//! let maintainer = AnnotationMaintainer::with_config(&store, PlainSyntaxRenderer, config);
//! maintainer
//!     .update_annotations("Main.Fox", "The quick fox jumps.", "The slow brown fox jumps.")
//!     .unwrap();
//!
//! let annotation = &store.annotations("Main.Fox").unwrap()[0];
//! assert_eq!(annotation.selection, "slow brown");
//! assert_eq!(annotation.state, AnnotationState::Updated);
//! ```
//!
//! # Module Description
//!
//! - [`annotation`] - Annotation data model and state lattice
//! - [`config`] - YAML-backed maintainer settings
//! - [`delta`] - Edit deltas and their placement relative to a selection
//! - [`diff`] - Content differencing (Myers)
//! - [`normalize`] - Whitespace stripping with offset translation
//! - [`search`] - Literal search in character offsets
//! - [`render`] - Plain-text rendering seam
//! - [`store`] - Annotation persistence
//! - [`expander`] - Context uniqueness
//! - [`maintainer`] - The maintenance pipeline
//!
//! # Offsets
//!
//! All offsets are **character offsets** (Unicode scalar values), never byte offsets.

pub mod annotation;
pub mod config;
pub mod delta;
pub mod diff;
mod error;
pub mod expander;
pub mod maintainer;
pub mod normalize;
pub mod render;
pub mod search;
pub mod store;

pub use annotation::{Annotation, AnnotationState};
pub use config::{ConfigError, MaintainerConfig};
pub use delta::{DeltaPlacement, EditDelta};
pub use diff::{ContentDiffer, DiffError, MyersDiffer};
pub use error::{MaintenanceCause, MaintenanceError};
pub use expander::{Expansion, UniquenessExpander};
pub use maintainer::{AnnotationMaintainer, MaintenanceReport};
pub use normalize::{AlteredContent, normalize_whitespace, strip_whitespace};
pub use render::{PlainSyntaxRenderer, PlainTextRenderer, RenderError, Syntax};
pub use search::SearchMatch;
pub use store::{AnnotationStore, InMemoryAnnotationStore, JsonFileAnnotationStore, StoreError};
