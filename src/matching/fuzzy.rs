//! Approximate equality of annotation texts
//!
//! Text extracted from a PDF under a highlight rarely matches the text the
//! viewer stored byte for byte: line wraps, ligatures and OCR noise all leak
//! in. Two regimes are used. Short snippets are compared by content with a
//! small edit budget; longer ones only by relative length.

use super::approx::find_approx_chars;

/// Snippets at least this long are compared by length ratio only
const SHORT_TEXT_LIMIT: usize = 10;
/// Edit budget for short snippets, as a share of the shorter length
const SHORT_TEXT_ERROR_RATE: f64 = 0.2;
/// Minimum shorter/longer length ratio for long snippets
const LONG_TEXT_MIN_RATIO: f64 = 0.8;

/// Whether `a` and `b` plausibly denote the same annotation text
///
/// Not symmetric. In the short regime an approximate occurrence of `a` must
/// exist inside `b`, and the budget truncates towards zero, so snippets under
/// five characters need an exact containment (`"cat"` vs `"bat"` is false).
/// In the long regime the content is not looked at at all.
pub fn fuzzy_equal(a: &str, b: &str) -> bool {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (len_a, len_b) = (a_chars.len(), b_chars.len());

    if len_a.max(len_b) < SHORT_TEXT_LIMIT {
        let budget = (len_a.min(len_b) as f64 * SHORT_TEXT_ERROR_RATE).floor() as usize;
        find_approx_chars(&b_chars, &a_chars, budget).is_some()
            && find_approx_chars(&a_chars, &a_chars, budget).is_some()
    } else {
        let ratio = len_a.min(len_b) as f64 / len_a.max(len_b) as f64;
        ratio > LONG_TEXT_MIN_RATIO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_short() {
        assert!(fuzzy_equal("note", "note"));
        assert!(fuzzy_equal("", ""));
    }

    #[test]
    fn test_short_budget_truncates_to_zero() {
        // min length 4 gives floor(0.8) = 0 edits, so one deletion already fails
        assert!(!fuzzy_equal("hello", "helo"));
        assert!(!fuzzy_equal("cat", "bat"));
    }

    #[test]
    fn test_short_containment() {
        assert!(fuzzy_equal("cat", "a cat!"));
    }

    #[test]
    fn test_short_one_edit_allowed() {
        // min length 5 gives a budget of one edit
        assert!(fuzzy_equal("house", "horse"));
        assert!(!fuzzy_equal("house", "hoarse"));
    }

    #[test]
    fn test_short_is_asymmetric() {
        // "cat" occurs inside "cats" but "cats" does not occur inside "cat"
        assert!(fuzzy_equal("cat", "cats"));
        assert!(!fuzzy_equal("cats", "cat"));
    }

    #[test]
    fn test_long_ratio() {
        assert!(fuzzy_equal(&"a".repeat(50), &"a".repeat(45)));
        assert!(!fuzzy_equal(&"a".repeat(50), &"a".repeat(30)));
    }

    #[test]
    fn test_long_ignores_content() {
        // known weakness: equal lengths pass whatever the text says
        assert!(fuzzy_equal("completely different", "words of same length"));
    }

    #[test]
    fn test_long_against_empty() {
        assert!(!fuzzy_equal("a sentence of text", ""));
    }
}
