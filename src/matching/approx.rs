//! Bounded edit-distance substring search
//!
//! Finds where a needle occurs in a haystack allowing a fixed number of
//! single-character insertions, deletions and substitutions. The forward pass
//! is Sellers' dynamic program with a free starting column, so it stops at the
//! first haystack position where some occurrence ends. A short backward pass
//! anchored at that end then recovers where the occurrence starts.

use serde::{Deserialize, Serialize};

/// Character range `[start, end)` inside a string
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Find the first approximate occurrence of `needle` in `haystack`
///
/// Returns the occurrence ending earliest. For that end, the start with the
/// fewest edits wins and ties go to the shortest span. With `max_errors == 0`
/// this is plain substring search.
pub fn find_approx(haystack: &str, needle: &str, max_errors: usize) -> Option<Span> {
    let text: Vec<char> = haystack.chars().collect();
    let pattern: Vec<char> = needle.chars().collect();
    find_approx_chars(&text, &pattern, max_errors)
}

/// Same as [`find_approx`] over pre-split characters
pub fn find_approx_chars(text: &[char], pattern: &[char], max_errors: usize) -> Option<Span> {
    let end = first_match_end(text, pattern, max_errors)?;
    let start = match_start(text, pattern, end, max_errors);
    Some(Span { start, end })
}

/// Earliest haystack position at which an occurrence with at most `max_errors` edits ends
fn first_match_end(text: &[char], pattern: &[char], max_errors: usize) -> Option<usize> {
    let m = pattern.len();

    // column[i]: fewest edits turning pattern[..i] into some suffix of text[..j]
    let mut column: Vec<usize> = (0..=m).collect();
    if column[m] <= max_errors {
        return Some(0);
    }

    let mut next = vec![0usize; m + 1];
    for (j, &c) in text.iter().enumerate() {
        next[0] = 0;
        for i in 1..=m {
            let substitution = column[i - 1] + usize::from(pattern[i - 1] != c);
            let skip_text = column[i] + 1;
            let skip_pattern = next[i - 1] + 1;
            next[i] = substitution.min(skip_text).min(skip_pattern);
        }
        std::mem::swap(&mut column, &mut next);

        if column[m] <= max_errors {
            return Some(j + 1);
        }
    }

    None
}

/// Start of the best occurrence ending at `end`
fn match_start(text: &[char], pattern: &[char], end: usize, max_errors: usize) -> usize {
    let m = pattern.len();
    let longest = end.min(m + max_errors);

    // Global alignment of the reversed pattern against text[..end] read backwards.
    // row[i]: edits between the last i pattern chars and the last `len` text chars
    let mut row: Vec<usize> = (0..=m).collect();
    let mut best_len = 0;
    let mut best_cost = row[m];

    let mut next = vec![0usize; m + 1];
    for len in 1..=longest {
        let c = text[end - len];
        next[0] = len;
        for i in 1..=m {
            let substitution = row[i - 1] + usize::from(pattern[m - i] != c);
            let skip_text = row[i] + 1;
            let skip_pattern = next[i - 1] + 1;
            next[i] = substitution.min(skip_text).min(skip_pattern);
        }
        std::mem::swap(&mut row, &mut next);

        if row[m] < best_cost {
            best_cost = row[m];
            best_len = len;
        }
    }

    end - best_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let span = find_approx("the quick brown fox", "brown", 0).unwrap();
        assert_eq!(span, Span { start: 10, end: 15 });
    }

    #[test]
    fn test_exact_miss() {
        assert!(find_approx("the quick brown fox", "browne", 0).is_none());
    }

    #[test]
    fn test_substitution() {
        let span = find_approx("the quick brown fox", "brawn", 1).unwrap();
        assert_eq!(span, Span { start: 10, end: 15 });
    }

    #[test]
    fn test_deletion_in_haystack() {
        // haystack is missing the "i" of "quick"
        let span = find_approx("the quck brown fox", "quick", 1).unwrap();
        assert_eq!(span, Span { start: 4, end: 8 });
    }

    #[test]
    fn test_insertion_in_haystack() {
        // OCR noise: an extra character inside the word
        let span = find_approx("a hyphen-ated word", "hyphenated", 1).unwrap();
        assert_eq!(span, Span { start: 2, end: 13 });
    }

    #[test]
    fn test_budget_exceeded() {
        assert!(find_approx("the quick brown fox", "bluish", 2).is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let span = find_approx("cat hat cat", "cat", 0).unwrap();
        assert_eq!(span.start, 0);
    }

    #[test]
    fn test_unicode_offsets_are_chars() {
        let span = find_approx("naïve café", "café", 0).unwrap();
        assert_eq!(span, Span { start: 6, end: 10 });
    }

    #[test]
    fn test_budget_larger_than_needle_matches_empty() {
        let span = find_approx("anything", "ab", 2).unwrap();
        assert!(span.is_empty());
    }
}
