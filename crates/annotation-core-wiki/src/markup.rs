//! Regex-based stripping of `xwiki/2.1` markup.
//!
//! This is *not* a full wiki parser. It removes the markup that does not show up in the rendered
//! page (formatting delimiters, heading and list markers, table separators, link targets) and
//! keeps the text a reader sees. Verbatim blocks (`{{{ ... }}}`) are copied untouched.

use regex::{Captures, Regex};

/// A single stripping rule: every match of `regex` is replaced by `replacement`.
#[derive(Debug, Clone)]
struct StripRule {
    regex: Regex,
    replacement: &'static str,
}

impl StripRule {
    fn new(pattern: &str, replacement: &'static str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            replacement,
        })
    }
}

/// Removes wiki markup, leaving the visible text.
#[derive(Debug, Clone)]
pub struct MarkupStripper {
    verbatim: Regex,
    image: Regex,
    link: Regex,
    rules: Vec<StripRule>,
}

impl MarkupStripper {
    /// Build the stripper for the `xwiki/2.1` subset.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            verbatim: Regex::new(r"(?s)\{\{\{(.*?)\}\}\}")?,
            image: Regex::new(r"\[\[image:[^\]]*\]\]")?,
            link: Regex::new(r"\[\[(?:(?P<label>[^\]]*?)>>)?(?P<target>[^\]|]*?)(?:\|\|[^\]]*)?\]\]")?,
            rules: vec![
                // Block and inline parameters: (% class="x" %)
                StripRule::new(r"\(%[^%]*%\)", "")?,
                // Headings: == Title ==
                StripRule::new(r"(?m)^[ \t]*=+[ \t]*(.*?)[ \t]*=*[ \t]*$", "$1")?,
                // Horizontal rules
                StripRule::new(r"(?m)^[ \t]*-{4,}[ \t]*$", "")?,
                // List items and definition lists: *, 1., 1.1., ;, :
                StripRule::new(r"(?m)^[ \t]*(?:\*+|\d+(?:\.\d+)*\.|;|:+)[ \t]+", "")?,
                // Table cell separators: |= header, | cell
                StripRule::new(r"\|=?", " ")?,
                // Forced line breaks
                StripRule::new(r"\\\\", "\n")?,
                // Italic, kept apart from URL schemes (http://)
                StripRule::new(r"(^|[^:])//", "$1")?,
                // Bold, underline, strikethrough, monospace, superscript, subscript
                StripRule::new(r"\*\*|__|--|##|\^\^|,,", "")?,
                // Leftover macro markers when no macro transformation ran
                StripRule::new(r"\{\{[^}]*\}\}", "")?,
            ],
        })
    }

    /// Strip markup from `source`. Whitespace is left as is.
    pub fn strip(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len());
        let mut pos = 0;
        for caps in self.verbatim.captures_iter(source) {
            let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&self.strip_segment(&source[pos..whole.start()]));
            out.push_str(body.as_str());
            pos = whole.end();
        }
        out.push_str(&self.strip_segment(&source[pos..]));
        out
    }

    fn strip_segment(&self, segment: &str) -> String {
        let text = self.image.replace_all(segment, "");
        let mut text = self
            .link
            .replace_all(&text, |caps: &Captures<'_>| {
                match caps.name("label").map(|m| m.as_str()) {
                    Some(label) if !label.is_empty() => label.to_string(),
                    _ => caps["target"].to_string(),
                }
            })
            .into_owned();
        for rule in &self.rules {
            text = rule.regex.replace_all(&text, rule.replacement).into_owned();
        }
        text
    }
}
