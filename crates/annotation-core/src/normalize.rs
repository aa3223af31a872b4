//! Whitespace normalization with offset translation.
//!
//! Renderers collapse whitespace runs, and annotation contexts are captured from what the
//! reader saw, so whitespace is not a reliable part of an anchor. Matching is done on a
//! *spaceless* form of the text, and [`AlteredContent`] keeps the table needed to map offsets in
//! the spaceless text back to offsets in the text it was derived from.

/// Text with all whitespace removed, plus a translation table back to the initial text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlteredContent {
    content: String,
    /// `initial_offsets[i]` is the char offset, in the initial text, of the `i`-th char of
    /// `content`.
    initial_offsets: Vec<usize>,
    initial_len: usize,
}

impl AlteredContent {
    /// The altered (spaceless) text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Length of the altered text in characters.
    pub fn len(&self) -> usize {
        self.initial_offsets.len()
    }

    /// Returns `true` if the altered text is empty.
    pub fn is_empty(&self) -> bool {
        self.initial_offsets.is_empty()
    }

    /// Translate a char offset in the altered text to a char offset in the initial text.
    ///
    /// Offsets at or past the end translate to the initial text length.
    pub fn initial_offset(&self, altered_offset: usize) -> usize {
        self.initial_offsets
            .get(altered_offset)
            .copied()
            .unwrap_or(self.initial_len)
    }
}

/// Remove every whitespace character from `text`.
pub fn strip_whitespace(text: &str) -> AlteredContent {
    let mut content = String::with_capacity(text.len());
    let mut initial_offsets = Vec::new();
    let mut initial_len = 0usize;

    for (offset, ch) in text.chars().enumerate() {
        initial_len = offset + 1;
        if ch.is_whitespace() {
            continue;
        }
        content.push(ch);
        initial_offsets.push(offset);
    }

    AlteredContent {
        content,
        initial_offsets,
        initial_len,
    }
}

/// Collapse every whitespace run into a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_whitespace_translates_offsets() {
        let altered = strip_whitespace("The quick  fox");
        assert_eq!(altered.content(), "Thequickfox");
        assert_eq!(altered.len(), 11);
        // 'q' is at 4 in the initial text.
        assert_eq!(altered.initial_offset(3), 4);
        // 'f' follows a double space.
        assert_eq!(altered.initial_offset(8), 11);
        assert_eq!(altered.initial_offset(10), 13);
        assert_eq!(altered.initial_offset(11), 14);
    }

    #[test]
    fn test_strip_whitespace_empty() {
        let altered = strip_whitespace("");
        assert!(altered.is_empty());
        assert_eq!(altered.content(), "");
        assert_eq!(altered.initial_offset(0), 0);

        let altered = strip_whitespace(" \n\t");
        assert!(altered.is_empty());
        assert_eq!(altered.initial_offset(0), 3);
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\n b\tc  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("   "), "");
    }
}
