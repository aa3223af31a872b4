//! Context uniqueness.
//!
//! After an edit, the context sliced around an annotation may occur more than once in the
//! document, in which case the annotation could later be relocated to the wrong occurrence. The
//! [`UniquenessExpander`] grows the context one character per side at a time until no other
//! occurrence agrees with it, then widens it to whole words.

use crate::annotation::Annotation;
use crate::search::find_occurrences;
use tracing::{trace, warn};

/// Outcome of [`UniquenessExpander::ensure_unique`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// The context occurs once; nothing was changed.
    AlreadyUnique,
    /// The context was widened. Offsets are char offsets into the content.
    Expanded {
        /// New context start.
        context_start: usize,
        /// New left context length.
        left_len: usize,
        /// New right context length.
        right_len: usize,
    },
    /// The context lies outside the content or could not be made unique before both document
    /// boundaries were reached. The annotation keeps its current context.
    Exhausted,
}

/// Grows annotation contexts until they are unique in the document.
#[derive(Debug, Clone, Copy)]
pub struct UniquenessExpander {
    snap_to_word_boundaries: bool,
}

impl Default for UniquenessExpander {
    fn default() -> Self {
        Self {
            snap_to_word_boundaries: true,
        }
    }
}

impl UniquenessExpander {
    /// Create an expander that snaps to word boundaries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Control whether a successful expansion is widened to whole words.
    pub fn with_word_snapping(mut self, snap: bool) -> Self {
        self.snap_to_word_boundaries = snap;
        self
    }

    /// Make the context of `annotation` unique in `content`.
    ///
    /// `context_start` and the three lengths locate the annotation's current context in
    /// `content` (char offsets). On [`Expansion::Expanded`] the left and right context of
    /// `annotation` are re-sliced from `content`; the selection itself is never touched.
    pub fn ensure_unique(
        &self,
        content: &str,
        annotation: &mut Annotation,
        context_start: usize,
        left_len: usize,
        selection_len: usize,
        right_len: usize,
    ) -> Expansion {
        let chars: Vec<char> = content.chars().collect();
        let expansion = self.expand(
            content,
            &chars,
            context_start,
            left_len,
            selection_len,
            right_len,
        );

        if let Expansion::Expanded {
            context_start: start,
            left_len: new_left,
            right_len: new_right,
        } = expansion
        {
            let selection_start = start + new_left;
            let selection_end = selection_start + selection_len;
            let left: String = chars[start..selection_start].iter().collect();
            let right: String = chars[selection_end..selection_end + new_right]
                .iter()
                .collect();
            trace!(
                annotation = %annotation.id,
                left = %left,
                right = %right,
                "context expanded to unique"
            );
            annotation.selection_left_context = left;
            annotation.selection_right_context = right;
        }

        expansion
    }

    fn expand(
        &self,
        content: &str,
        chars: &[char],
        context_start: usize,
        left_len: usize,
        selection_len: usize,
        right_len: usize,
    ) -> Expansion {
        let context_len = left_len + selection_len + right_len;
        let context_end = context_start + context_len;
        if context_len == 0 || context_end > chars.len() {
            warn!(
                context_start,
                context_len,
                content_len = chars.len(),
                "context outside of content, uniqueness not checked"
            );
            return Expansion::Exhausted;
        }

        let context: String = chars[context_start..context_end].iter().collect();
        let mut others: Vec<usize> = find_occurrences(content, &context)
            .into_iter()
            .filter(|&start| start != context_start)
            .collect();
        if others.is_empty() {
            return Expansion::AlreadyUnique;
        }

        let len = chars.len();
        let mut left = 0usize;
        let mut right = 0usize;
        while !others.is_empty() {
            let can_left = context_start > left;
            let can_right = context_end + right < len;
            if !can_left && !can_right {
                warn!(
                    context = %context,
                    remaining = others.len(),
                    "context could not be made unique"
                );
                return Expansion::Exhausted;
            }

            // Whitespace never tells occurrences apart: relocation ignores it.
            if can_left {
                left += 1;
                let ch = chars[context_start - left];
                if !ch.is_whitespace() {
                    others.retain(|&other| other >= left && chars[other - left] == ch);
                }
            }
            if can_right {
                right += 1;
                let ch = chars[context_end + right - 1];
                if !ch.is_whitespace() {
                    others.retain(|&other| {
                        chars.get(other + context_len + right - 1) == Some(&ch)
                    });
                }
            }
        }

        let mut start = context_start - left;
        let mut end = context_end + right;
        if self.snap_to_word_boundaries {
            while start > 0 && !chars[start - 1].is_whitespace() {
                start -= 1;
            }
            while end < len && !chars[end].is_whitespace() {
                end += 1;
            }
        }

        Expansion::Expanded {
            context_start: start,
            left_len: left_len + (context_start - start),
            right_len: right_len + (end - context_end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_context_is_untouched() {
        let content = "The quick fox jumps.";
        let mut annotation =
            Annotation::new("a", "T", "quick").with_context("The ", " fox jumps.");
        let before = annotation.clone();

        let result =
            UniquenessExpander::new().ensure_unique(content, &mut annotation, 0, 4, 5, 11);
        assert_eq!(result, Expansion::AlreadyUnique);
        assert_eq!(annotation, before);
    }

    #[test]
    fn test_duplicate_is_expanded_to_words() {
        // The second "cat" is annotated without any context.
        let content = "a cat sat and a cat ran";
        let mut annotation = Annotation::new("a", "T", "cat");

        let result =
            UniquenessExpander::new().ensure_unique(content, &mut annotation, 16, 0, 3, 0);
        assert_eq!(
            result,
            Expansion::Expanded {
                context_start: 14,
                left_len: 2,
                right_len: 4,
            }
        );
        assert_eq!(annotation.selection_left_context, "a ");
        assert_eq!(annotation.selection, "cat");
        assert_eq!(annotation.selection_right_context, " ran");
        assert_eq!(annotation.selection_in_context(), "a cat ran");
    }

    #[test]
    fn test_expansion_without_word_snapping() {
        let content = "a cat sat and a cat ran";
        let mut annotation = Annotation::new("a", "T", "cat");

        let result = UniquenessExpander::new()
            .with_word_snapping(false)
            .ensure_unique(content, &mut annotation, 16, 0, 3, 0);
        assert_eq!(
            result,
            Expansion::Expanded {
                context_start: 14,
                left_len: 2,
                right_len: 2,
            }
        );
        assert_eq!(annotation.selection_right_context, " r");
    }

    #[test]
    fn test_expansion_keeps_existing_context() {
        // "b x" appears twice; the annotated one is the first.
        let content = "ab xy ab xz";
        let mut annotation = Annotation::new("a", "T", "x").with_context("b ", "");

        let result =
            UniquenessExpander::new().ensure_unique(content, &mut annotation, 1, 2, 1, 0);
        assert_eq!(
            result,
            Expansion::Expanded {
                context_start: 0,
                left_len: 3,
                right_len: 1,
            }
        );
        assert_eq!(annotation.selection_in_context(), "ab xy");
    }

    #[test]
    fn test_words_are_never_split() {
        let content = "one token two token three token";
        for start in [4, 14] {
            let mut annotation = Annotation::new("a", "T", "token");
            let result =
                UniquenessExpander::new().ensure_unique(content, &mut annotation, start, 0, 5, 0);
            let Expansion::Expanded {
                context_start,
                left_len,
                right_len,
            } = result
            else {
                panic!("expected an expansion for start {start}");
            };
            let chars: Vec<char> = content.chars().collect();
            let end = context_start + left_len + 5 + right_len;
            assert!(context_start == 0 || chars[context_start - 1].is_whitespace());
            assert!(end == chars.len() || chars[end].is_whitespace());
        }
    }

    #[test]
    fn test_repeated_pattern_expands_to_both_document_boundaries() {
        // Every step still collides until the competing occurrences fall off the content.
        let content = "ab ab ab";
        let mut annotation = Annotation::new("a", "T", "ab");

        let result =
            UniquenessExpander::new().ensure_unique(content, &mut annotation, 3, 0, 2, 0);
        assert_eq!(
            result,
            Expansion::Expanded {
                context_start: 0,
                left_len: 3,
                right_len: 3,
            }
        );
        assert_eq!(annotation.selection_left_context, "ab ");
        assert_eq!(annotation.selection_right_context, " ab");
        assert_eq!(annotation.selection_in_context(), content);
    }

    #[test]
    fn test_out_of_range_context_is_reported() {
        let mut annotation = Annotation::new("a", "T", "abc");
        let result =
            UniquenessExpander::new().ensure_unique("ab", &mut annotation, 0, 0, 3, 0);
        assert_eq!(result, Expansion::Exhausted);
        assert_eq!(annotation.selection, "abc");
    }
}
