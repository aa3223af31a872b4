//! `annotation-core-wiki` - Wiki markup rendering for `annotation-core`.
//!
//! Annotations are anchored against the plain text a reader sees, so the maintainer needs to
//! render wiki sources the same way the display does. [`WikiRenderer`] runs a pipeline of
//! [`Transformation`]s over the source (macro expansion by default), strips the remaining
//! `xwiki/2.1` markup, then collapses whitespace.
//!
//! ```rust
//! use annotation_core::{PlainTextRenderer, Syntax};
//! use annotation_core_wiki::WikiRenderer;
//!
//! let renderer = WikiRenderer::new().unwrap();
//! let text = renderer
//!     .render("= Fox =\n\nThe **quick** fox.", &Syntax::new(Syntax::XWIKI_2_1))
//!     .unwrap();
//! assert_eq!(text, "Fox The quick fox.");
//! ```

pub mod markup;
pub mod transform;

use annotation_core::{PlainTextRenderer, RenderError, Syntax, normalize_whitespace};
use std::fmt;
use tracing::trace;

pub use markup::MarkupStripper;
pub use transform::{MacroOutput, MacroTransformation, Transformation, TransformationError};

/// Renders `xwiki/2.1` (and `plain/1.0`) sources to normalized plain text.
pub struct WikiRenderer {
    stripper: MarkupStripper,
    transformations: Vec<Box<dyn Transformation>>,
}

impl WikiRenderer {
    /// Renderer with the standard macro transformation.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self::without_transformations()?.with_transformation(MacroTransformation::standard()?))
    }

    /// Renderer that only strips markup.
    pub fn without_transformations() -> Result<Self, regex::Error> {
        Ok(Self {
            stripper: MarkupStripper::new()?,
            transformations: Vec::new(),
        })
    }

    /// Append a transformation; transformations run in insertion order.
    pub fn with_transformation(mut self, transformation: impl Transformation + 'static) -> Self {
        self.transformations.push(Box::new(transformation));
        self
    }

    /// Names of the configured transformations, in execution order.
    pub fn transformation_names(&self) -> Vec<&str> {
        self.transformations.iter().map(|t| t.name()).collect()
    }

    fn render_wiki(&self, source: &str) -> Result<String, RenderError> {
        let mut text = source.to_string();
        for transformation in &self.transformations {
            text = transformation
                .transform(&text)
                .map_err(|err| RenderError::Transformation {
                    name: transformation.name().to_string(),
                    message: err.to_string(),
                })?;
            trace!(transformation = transformation.name(), len = text.len(), "applied");
        }
        Ok(normalize_whitespace(&self.stripper.strip(&text)))
    }
}

impl fmt::Debug for WikiRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WikiRenderer")
            .field("transformations", &self.transformation_names())
            .finish()
    }
}

impl PlainTextRenderer for WikiRenderer {
    fn render(&self, source: &str, syntax: &Syntax) -> Result<String, RenderError> {
        match syntax.as_str() {
            Syntax::XWIKI_2_1 => self.render_wiki(source),
            Syntax::PLAIN_1_0 => Ok(normalize_whitespace(source)),
            _ => Err(RenderError::UnsupportedSyntax(syntax.clone())),
        }
    }
}
