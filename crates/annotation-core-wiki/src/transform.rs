//! Source transformations applied before markup stripping.
//!
//! The display pipeline runs transformations (macro expansion and the like) over the wiki
//! source before it is rendered. The same pipeline must run here, otherwise annotation offsets
//! would be computed against text the reader never sees.

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a [`Transformation`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransformationError {
    #[error("macro '{name}' opened at char {offset} is never closed")]
    /// A block macro has no matching `{{/name}}` tag.
    UnclosedMacro {
        /// Macro name.
        name: String,
        /// Char offset of the opening tag.
        offset: usize,
    },

    #[error("closing tag for macro '{name}' at char {offset} has no opening tag")]
    /// A `{{/name}}` tag appears without an opening tag.
    UnexpectedClose {
        /// Macro name.
        name: String,
        /// Char offset of the closing tag.
        offset: usize,
    },
}

/// A source-to-source step of the rendering pipeline.
pub trait Transformation {
    /// Stable name, reported when the transformation fails.
    fn name(&self) -> &str;

    /// Transform wiki source.
    fn transform(&self, source: &str) -> Result<String, TransformationError>;
}

/// What a block macro contributes to the rendered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroOutput {
    /// The macro renders nothing visible (e.g. `comment`).
    Hidden,
    /// The macro renders its body as a separate block (e.g. `info`, `box`, `code`).
    Body,
}

/// Expands `{{name ...}}body{{/name}}` and `{{name .../}}` macros.
///
/// Inline (self-closing) macros render nothing. Block macros render according to their
/// registered [`MacroOutput`]; unregistered macros fall back to the default output.
#[derive(Debug, Clone)]
pub struct MacroTransformation {
    tag: Regex,
    outputs: HashMap<String, MacroOutput>,
    default_output: MacroOutput,
}

impl MacroTransformation {
    /// An empty registry where every block macro renders its body.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tag: Regex::new(
                r"\{\{(?P<close>/)?(?P<name>[A-Za-z][\w.-]*)(?:\s[^}]*?)?(?P<inline>/)?\}\}",
            )?,
            outputs: HashMap::new(),
            default_output: MacroOutput::Body,
        })
    }

    /// The macros shipped with a stock wiki.
    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self::new()?
            .with_macro("comment", MacroOutput::Hidden)
            .with_macro("html", MacroOutput::Hidden)
            .with_macro("velocity", MacroOutput::Hidden)
            .with_macro("groovy", MacroOutput::Hidden)
            .with_macro("info", MacroOutput::Body)
            .with_macro("warning", MacroOutput::Body)
            .with_macro("error", MacroOutput::Body)
            .with_macro("success", MacroOutput::Body)
            .with_macro("box", MacroOutput::Body)
            .with_macro("code", MacroOutput::Body))
    }

    /// Register (or override) a macro.
    pub fn with_macro(mut self, name: impl Into<String>, output: MacroOutput) -> Self {
        self.outputs.insert(name.into(), output);
        self
    }

    /// Output used for macros that are not registered.
    pub fn with_default_output(mut self, output: MacroOutput) -> Self {
        self.default_output = output;
        self
    }

    fn output_of(&self, name: &str) -> MacroOutput {
        self.outputs.get(name).copied().unwrap_or(self.default_output)
    }

    /// Byte range `(start, end)` of the `{{/name}}` tag closing a macro whose body starts at
    /// `from`. Nested macros of the same name are skipped.
    fn matching_close(&self, source: &str, name: &str, from: usize) -> Option<(usize, usize)> {
        let mut depth = 1usize;
        for caps in self.tag.captures_iter(&source[from..]) {
            if &caps["name"] != name || caps.name("inline").is_some() {
                continue;
            }
            let tag = caps.get(0)?;
            if caps.name("close").is_some() {
                depth -= 1;
                if depth == 0 {
                    return Some((from + tag.start(), from + tag.end()));
                }
            } else {
                depth += 1;
            }
        }
        None
    }

    /// `base` is the char offset of `source` within the top-level input.
    fn expand(&self, source: &str, base: usize) -> Result<String, TransformationError> {
        let mut out = String::with_capacity(source.len());
        let mut pos = 0;

        while let Some(caps) = self.tag.captures_at(source, pos) {
            let Some(whole) = caps.get(0) else {
                break;
            };
            let name = &caps["name"];
            let offset = base + source[..whole.start()].chars().count();
            out.push_str(&source[pos..whole.start()]);

            if caps.name("close").is_some() {
                return Err(TransformationError::UnexpectedClose {
                    name: name.to_string(),
                    offset,
                });
            }
            if caps.name("inline").is_some() {
                debug!(macro_name = name, "dropping inline macro");
                pos = whole.end();
                continue;
            }

            let body_start = whole.end();
            let Some((body_end, after)) = self.matching_close(source, name, body_start) else {
                return Err(TransformationError::UnclosedMacro {
                    name: name.to_string(),
                    offset,
                });
            };
            let body = &source[body_start..body_end];

            match self.output_of(name) {
                MacroOutput::Hidden => {
                    debug!(macro_name = name, "hiding macro body");
                }
                MacroOutput::Body => {
                    let body_base = base + source[..body_start].chars().count();
                    out.push('\n');
                    out.push_str(&self.expand(body, body_base)?);
                    out.push('\n');
                }
            }
            pos = after;
        }

        out.push_str(&source[pos..]);
        Ok(out)
    }
}

impl Transformation for MacroTransformation {
    fn name(&self) -> &str {
        "macro"
    }

    fn transform(&self, source: &str) -> Result<String, TransformationError> {
        self.expand(source, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> MacroTransformation {
        MacroTransformation::standard().unwrap()
    }

    #[test]
    fn test_text_without_macros_is_unchanged() {
        let src = "The **quick** fox";
        assert_eq!(standard().transform(src).unwrap(), src);
    }

    #[test]
    fn test_hidden_macro_is_removed() {
        let out = standard()
            .transform("before {{comment}}secret **notes**{{/comment}} after")
            .unwrap();
        assert_eq!(out, "before  after");
    }

    #[test]
    fn test_body_macro_becomes_its_own_block() {
        let out = standard()
            .transform("intro{{info title=\"Note\"}}read this{{/info}}outro")
            .unwrap();
        assert_eq!(out, "intro\nread this\noutro");
    }

    #[test]
    fn test_inline_macro_renders_nothing() {
        let out = standard().transform("a {{toc depth=\"2\"/}} b").unwrap();
        assert_eq!(out, "a  b");
    }

    #[test]
    fn test_nested_macros_expand() {
        let out = standard()
            .transform("{{box}}x {{comment}}hidden{{/comment}}y{{/box}}")
            .unwrap();
        assert_eq!(out, "\nx y\n");
    }

    #[test]
    fn test_nested_macros_of_the_same_name() {
        let out = standard()
            .transform("{{box}}outer {{box}}inner{{/box}} tail{{/box}} end")
            .unwrap();
        assert_eq!(out, "\nouter \ninner\n tail\n end");
    }

    #[test]
    fn test_unbalanced_nested_macro_is_unclosed() {
        let err = standard()
            .transform("{{box}}outer {{box}}inner{{/box}}")
            .unwrap_err();
        assert_eq!(
            err,
            TransformationError::UnclosedMacro {
                name: "box".to_string(),
                offset: 0,
            }
        );
    }

    #[test]
    fn test_unregistered_macro_uses_default_output() {
        let hidden = MacroTransformation::new()
            .unwrap()
            .with_default_output(MacroOutput::Hidden);
        assert_eq!(hidden.transform("a{{custom}}b{{/custom}}c").unwrap(), "ac");
        assert_eq!(
            MacroTransformation::new()
                .unwrap()
                .transform("a{{custom}}b{{/custom}}c")
                .unwrap(),
            "a\nb\nc"
        );
    }

    #[test]
    fn test_unclosed_macro_reports_char_offset() {
        let err = standard().transform("héllo {{box}}open").unwrap_err();
        assert_eq!(
            err,
            TransformationError::UnclosedMacro {
                name: "box".to_string(),
                offset: 6,
            }
        );
    }

    #[test]
    fn test_stray_closing_tag_is_an_error() {
        let err = standard().transform("text{{/info}}").unwrap_err();
        assert!(matches!(err, TransformationError::UnexpectedClose { offset: 4, .. }));
    }
}
