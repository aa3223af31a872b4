//! Rendering document sources to normalized plain text.
//!
//! Annotations are anchored against what the reader sees, so both versions of a document must be
//! rendered with the same pipeline used for display before they can be compared. Markup-aware
//! renderers live in integration crates (`annotation-core-wiki`); this module defines the
//! [`PlainTextRenderer`] seam and a renderer for the plain-text syntax.

use crate::normalize::normalize_whitespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A document syntax identifier, e.g. `xwiki/2.1` or `plain/1.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Syntax(String);

impl Syntax {
    /// Identifier of the plain-text syntax.
    pub const PLAIN_1_0: &'static str = "plain/1.0";
    /// Identifier of the XWiki 2.1 syntax.
    pub const XWIKI_2_1: &'static str = "xwiki/2.1";

    /// Create a syntax identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The plain-text syntax.
    pub fn plain() -> Self {
        Self::new(Self::PLAIN_1_0)
    }

    /// The identifier as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Syntax {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Errors produced while rendering a document to plain text.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported syntax '{0}'")]
    /// No renderer is registered for the syntax.
    UnsupportedSyntax(Syntax),

    #[error("parse error at char {offset}: {message}")]
    /// The source could not be parsed.
    Parse {
        /// Char offset in the source.
        offset: usize,
        /// Parser message.
        message: String,
    },

    #[error("transformation '{name}' failed: {message}")]
    /// A transformation of the rendering pipeline failed.
    Transformation {
        /// Name of the failing transformation.
        name: String,
        /// Failure message.
        message: String,
    },
}

/// Renders a document source in a given syntax to normalized plain text.
pub trait PlainTextRenderer {
    /// Render `source`. The result must have whitespace runs collapsed to single spaces.
    fn render(&self, source: &str, syntax: &Syntax) -> Result<String, RenderError>;
}

impl<T: PlainTextRenderer + ?Sized> PlainTextRenderer for &T {
    fn render(&self, source: &str, syntax: &Syntax) -> Result<String, RenderError> {
        (**self).render(source, syntax)
    }
}

/// Renderer for `plain/1.0` sources: whitespace normalization only.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainSyntaxRenderer;

impl PlainTextRenderer for PlainSyntaxRenderer {
    fn render(&self, source: &str, syntax: &Syntax) -> Result<String, RenderError> {
        if syntax.as_str() != Syntax::PLAIN_1_0 {
            return Err(RenderError::UnsupportedSyntax(syntax.clone()));
        }
        Ok(normalize_whitespace(source))
    }
}
