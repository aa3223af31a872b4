//! Annotation persistence.
//!
//! The maintainer reads all annotations of a target once, then writes back the changed subset in
//! a single batch. [`AnnotationStore`] is that seam; the two implementations here cover tests
//! and small deployments (an in-memory map and a single JSON file).

use crate::annotation::Annotation;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use tracing::debug;

/// Errors produced by annotation stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    /// Filesystem I/O failed.
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    /// Stored data could not be (de)serialized.
    Json(#[from] serde_json::Error),

    #[error("annotation store lock poisoned")]
    /// A writer panicked while holding the store lock.
    Poisoned,

    #[error("unknown annotation '{id}' for target '{target}'")]
    /// A batch update referenced an annotation the store does not hold.
    UnknownAnnotation {
        /// The annotated document.
        target: String,
        /// The missing annotation id.
        id: String,
    },
}

/// Storage for annotations, keyed by target document.
pub trait AnnotationStore {
    /// All annotations of `target`, in storage order.
    fn annotations(&self, target: &str) -> Result<Vec<Annotation>, StoreError>;

    /// Replace the stored copies of `annotations` (matched by id) in one batch.
    ///
    /// Either all annotations are written or none is.
    fn update_annotations(&self, target: &str, annotations: &[Annotation])
    -> Result<(), StoreError>;
}

impl<T: AnnotationStore + ?Sized> AnnotationStore for &T {
    fn annotations(&self, target: &str) -> Result<Vec<Annotation>, StoreError> {
        (**self).annotations(target)
    }

    fn update_annotations(
        &self,
        target: &str,
        annotations: &[Annotation],
    ) -> Result<(), StoreError> {
        (**self).update_annotations(target, annotations)
    }
}

fn replace_by_id(
    target: &str,
    stored: &mut [Annotation],
    updates: &[Annotation],
) -> Result<(), StoreError> {
    // Validate first so a failing batch leaves the stored copies untouched.
    let positions: Vec<usize> = updates
        .iter()
        .map(|update| {
            stored
                .iter()
                .position(|a| a.id == update.id)
                .ok_or_else(|| StoreError::UnknownAnnotation {
                    target: target.to_string(),
                    id: update.id.clone(),
                })
        })
        .collect::<Result<_, _>>()?;

    for (pos, update) in positions.into_iter().zip(updates) {
        stored[pos] = update.clone();
    }
    Ok(())
}

/// A process-local store.
#[derive(Debug, Default)]
pub struct InMemoryAnnotationStore {
    annotations: RwLock<HashMap<String, Vec<Annotation>>>,
    update_calls: AtomicUsize,
}

impl InMemoryAnnotationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an annotation under its own target.
    pub fn add_annotation(&self, annotation: Annotation) -> Result<(), StoreError> {
        let mut map = self.annotations.write().map_err(|_| StoreError::Poisoned)?;
        map.entry(annotation.target.clone())
            .or_default()
            .push(annotation);
        Ok(())
    }

    /// Remove an annotation. Returns `true` if it existed.
    pub fn remove_annotation(&self, target: &str, id: &str) -> Result<bool, StoreError> {
        let mut map = self.annotations.write().map_err(|_| StoreError::Poisoned)?;
        let Some(list) = map.get_mut(target) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|a| a.id != id);
        Ok(list.len() != before)
    }

    /// Number of batch writes received so far.
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::Relaxed)
    }
}

impl AnnotationStore for InMemoryAnnotationStore {
    fn annotations(&self, target: &str) -> Result<Vec<Annotation>, StoreError> {
        let map = self.annotations.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(target).cloned().unwrap_or_default())
    }

    fn update_annotations(
        &self,
        target: &str,
        annotations: &[Annotation],
    ) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        let mut map = self.annotations.write().map_err(|_| StoreError::Poisoned)?;
        let stored = map.entry(target.to_string()).or_default();
        replace_by_id(target, stored, annotations)
    }
}

/// A store persisting every target in one pretty-printed JSON file.
///
/// Writes go through a sibling temporary file that is renamed over the store file, so readers
/// never observe a half-written batch.
#[derive(Debug)]
pub struct JsonFileAnnotationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

type JsonDocument = BTreeMap<String, Vec<Annotation>>;

impl JsonFileAnnotationStore {
    /// Open a store at `path`. The file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add an annotation under its own target.
    pub fn add_annotation(&self, annotation: Annotation) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut doc = self.load()?;
        doc.entry(annotation.target.clone())
            .or_default()
            .push(annotation);
        self.save(&doc)
    }

    fn load(&self) -> Result<JsonDocument, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(JsonDocument::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(JsonDocument::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, doc: &JsonDocument) -> Result<(), StoreError> {
        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path)?;
        serde_json::to_writer_pretty(&mut file, doc)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), targets = doc.len(), "annotation store saved");
        Ok(())
    }
}

impl AnnotationStore for JsonFileAnnotationStore {
    fn annotations(&self, target: &str) -> Result<Vec<Annotation>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(target).unwrap_or_default())
    }

    fn update_annotations(
        &self,
        target: &str,
        annotations: &[Annotation],
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut doc = self.load()?;
        let stored = doc.entry(target.to_string()).or_default();
        replace_by_id(target, stored, annotations)?;
        self.save(&doc)
    }
}
