//! Literal text search in character offsets.
//!
//! All public inputs/outputs are **character offsets** (not byte offsets). Occurrence searches
//! report overlapping matches, since two anchors may share characters (`"aa"` occurs twice in
//! `"aaa"`).

use regex::Regex;

/// A match expressed as a half-open character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    /// Inclusive start character offset.
    pub start: usize,
    /// Exclusive end character offset.
    pub end: usize,
}

impl SearchMatch {
    /// Returns the length of the match in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the match is empty.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

#[derive(Debug)]
pub(crate) struct CharIndex {
    char_to_byte: Vec<usize>,
    text_len: usize,
}

impl CharIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut char_to_byte: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(text.len());
        Self {
            char_to_byte,
            text_len: text.len(),
        }
    }

    pub(crate) fn char_count(&self) -> usize {
        self.char_to_byte.len().saturating_sub(1)
    }

    pub(crate) fn char_to_byte(&self, char_offset: usize) -> usize {
        let clamped = char_offset.min(self.char_count());
        self.char_to_byte
            .get(clamped)
            .copied()
            .unwrap_or(self.text_len)
    }

    pub(crate) fn byte_to_char(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_len);
        match self.char_to_byte.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx,
        }
    }
}

fn literal_regex(needle: &str) -> Option<Regex> {
    // An escaped literal always compiles; the size limit is the only way this can fail.
    Regex::new(&regex::escape(needle)).ok()
}

fn find_from(text: &str, index: &CharIndex, re: &Regex, from_char: usize) -> Option<SearchMatch> {
    if from_char > index.char_count() {
        return None;
    }
    let m = re.find_at(text, index.char_to_byte(from_char))?;
    Some(SearchMatch {
        start: index.byte_to_char(m.start()),
        end: index.byte_to_char(m.end()),
    })
}

/// Find the first occurrence of `needle` in `text`.
///
/// Returns `None` if there is no match or if `needle` is empty.
pub fn find(text: &str, needle: &str) -> Option<SearchMatch> {
    if needle.is_empty() {
        return None;
    }
    let re = literal_regex(needle)?;
    let index = CharIndex::new(text);
    find_from(text, &index, &re, 0)
}

/// Find the start offsets of all (possibly overlapping) occurrences of `needle` in `text`.
///
/// Returns an empty list if `needle` is empty.
pub fn find_occurrences(text: &str, needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    let Some(re) = literal_regex(needle) else {
        return Vec::new();
    };
    let index = CharIndex::new(text);

    let mut starts = Vec::new();
    let mut from = 0usize;
    while let Some(m) = find_from(text, &index, &re, from) {
        starts.push(m.start);
        from = m.start + 1;
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_reports_char_offsets() {
        let m = find("héllo wörld", "wörld").unwrap();
        assert_eq!((m.start, m.end), (6, 11));
        assert_eq!(m.len(), 5);
        assert!(find("abc", "").is_none());
        assert!(find("abc", "d").is_none());
    }

    #[test]
    fn test_find_treats_needle_literally() {
        let m = find("a.b a*b", "a*b").unwrap();
        assert_eq!(m.start, 4);
    }

    #[test]
    fn test_find_occurrences_overlapping() {
        assert_eq!(find_occurrences("aaa", "aa"), vec![0, 1]);
        assert_eq!(find_occurrences("one two one", "one"), vec![0, 8]);
        assert!(find_occurrences("one", "").is_empty());
        assert!(find_occurrences("", "x").is_empty());
    }

    #[test]
    fn test_find_occurrences_multibyte() {
        assert_eq!(find_occurrences("éaéaé", "é"), vec![0, 2, 4]);
    }
}
