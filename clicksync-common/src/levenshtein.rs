//! Levenshtein distance and closest-key lookup
//!
//! Device identifiers (user-agent strings and the like) change slightly
//! between browser versions, so calibration lookup falls back to the stored
//! identifier with the smallest edit distance to the query.
//!
//! # Examples
//!
//! ```rust
//! use clicksync_common::Levenshtein;
//!
//! let mut matcher = Levenshtein::new();
//! assert_eq!(matcher.distance("kitten", "sitting"), 3);
//!
//! let result = matcher.closest_key(["abc", "abd"], "abx");
//! assert_eq!(result.key, Some("abc"));
//! assert_eq!(result.distance, 1);
//! ```

/// Result of a closest-key query
///
/// `key` is `None` only when there were no candidates, in which case
/// `distance` is `usize::MAX` (infinite).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult<'a> {
    /// Candidate closest to the query
    pub key: Option<&'a str>,
    /// Edit distance between the query and `key`
    pub distance: usize,
}

impl MatchResult<'_> {
    /// Result for an empty candidate set
    pub fn none() -> Self {
        Self {
            key: None,
            distance: usize::MAX,
        }
    }

    /// True when the query matched a candidate exactly
    pub fn is_exact(&self) -> bool {
        self.key.is_some() && self.distance == 0
    }
}

/// Edit-distance calculator with a reusable scratch row
///
/// Queries are frequent relative to the number of stored identifiers, so
/// the row buffer is kept between calls instead of reallocated.
#[derive(Debug, Default)]
pub struct Levenshtein {
    row: Vec<usize>,
    short: Vec<char>,
}

impl Levenshtein {
    /// Create a matcher with an empty scratch buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Levenshtein distance between `a` and `b`
    ///
    /// Insertion, deletion and substitution each cost 1. Returns 0 iff the
    /// strings are equal; if either is empty, the length of the other.
    /// Lengths are counted in Unicode scalar values.
    pub fn distance(&mut self, a: &str, b: &str) -> usize {
        if a == b {
            return 0;
        }

        let a_len = a.chars().count();
        let b_len = b.chars().count();
        if a_len == 0 || b_len == 0 {
            return a_len + b_len;
        }

        // Row spans the shorter string: O(min(len(a), len(b))) space
        let (short, long) = if a_len <= b_len { (a, b) } else { (b, a) };

        self.short.clear();
        self.short.extend(short.chars());
        self.row.clear();
        self.row.extend(1..=self.short.len());

        let mut last = 0;
        for (j, long_char) in long.chars().enumerate() {
            // `diagonal` is row[i-1] of the previous pass, `left` is row[i-1] of this pass
            let mut diagonal = j;
            let mut left = j + 1;
            for (i, &short_char) in self.short.iter().enumerate() {
                let substitution = diagonal + usize::from(short_char != long_char);
                let above = self.row[i];
                let cell = (above + 1).min(left + 1).min(substitution);
                diagonal = above;
                self.row[i] = cell;
                left = cell;
            }
            last = left;
        }
        last
    }

    /// Find the candidate closest to `query`
    ///
    /// Candidates are visited in iteration order. The first candidate that
    /// reaches the running minimum is kept (later ties never replace it), and
    /// the scan stops as soon as an exact match is found.
    pub fn closest_key<'a, I>(&mut self, candidates: I, query: &str) -> MatchResult<'a>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut best = MatchResult::none();
        for candidate in candidates {
            let d = self.distance(query, candidate);
            if d < best.distance {
                best = MatchResult {
                    key: Some(candidate),
                    distance: d,
                };
            }
            if best.distance == 0 {
                break;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_identical_is_zero() {
        let mut m = Levenshtein::new();
        assert_eq!(m.distance("", ""), 0);
        assert_eq!(m.distance("abc", "abc"), 0);
        assert_eq!(m.distance("Mozilla/5.0 (X11)", "Mozilla/5.0 (X11)"), 0);
    }

    #[test]
    fn test_distance_against_empty_is_length() {
        let mut m = Levenshtein::new();
        assert_eq!(m.distance("", "hello"), 5);
        assert_eq!(m.distance("hello", ""), 5);
        assert_eq!(m.distance("", "héllo"), 5);
    }

    #[test]
    fn test_distance_classic_cases() {
        let mut m = Levenshtein::new();
        assert_eq!(m.distance("kitten", "sitting"), 3);
        assert_eq!(m.distance("flaw", "lawn"), 2);
        assert_eq!(m.distance("abc", "abx"), 1);
        assert_eq!(m.distance("abc", "xyz"), 3);
        assert_eq!(m.distance("a", "b"), 1);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let mut m = Levenshtein::new();
        let pairs = [
            ("kitten", "sitting"),
            ("Mozilla/5.0 (A)", "Mozilla/5.0 (Bcd)"),
            ("short", "a much longer string"),
            ("ümlaut", "umlaut"),
        ];
        for (a, b) in pairs {
            assert_eq!(m.distance(a, b), m.distance(b, a), "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn test_distance_bounded_by_longer_length() {
        let mut m = Levenshtein::new();
        let d = m.distance("abcdef", "uvwxyz12");
        assert!(d <= 8);
        assert_eq!(d, 8);
    }

    #[test]
    fn test_scratch_row_reused_across_lengths() {
        let mut m = Levenshtein::new();
        assert_eq!(m.distance("a long string here", "a long string there"), 1);
        // Shorter query after a longer one must not read stale cells
        assert_eq!(m.distance("ab", "ba"), 2);
        assert_eq!(m.distance("abc", "abcd"), 1);
    }

    #[test]
    fn test_distance_matches_reference_implementation() {
        let mut m = Levenshtein::new();
        let words = [
            "",
            "a",
            "ab",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 9_2 like Mac OS X)",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 9_3 like Mac OS X)",
            "Mozilla/5.0 (Linux; Android 6.0)",
            "sunday",
            "saturday",
            "日本語",
            "日本人",
        ];
        for a in words {
            for b in words {
                assert_eq!(m.distance(a, b), strsim::levenshtein(a, b), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_closest_key_empty_candidates() {
        let mut m = Levenshtein::new();
        let result = m.closest_key(std::iter::empty(), "query");
        assert_eq!(result, MatchResult::none());
        assert_eq!(result.key, None);
        assert_eq!(result.distance, usize::MAX);
        assert!(!result.is_exact());
    }

    #[test]
    fn test_closest_key_tie_keeps_first_inserted() {
        let mut m = Levenshtein::new();
        let result = m.closest_key(["abc", "abd"], "abx");
        assert_eq!(result.key, Some("abc"));
        assert_eq!(result.distance, 1);

        let result = m.closest_key(["abd", "abc"], "abx");
        assert_eq!(result.key, Some("abd"));
    }

    #[test]
    fn test_closest_key_exact_match_short_circuits() {
        let mut m = Levenshtein::new();
        let result = m.closest_key(["zzz", "abc", "abd"], "abc");
        assert_eq!(result.key, Some("abc"));
        assert_eq!(result.distance, 0);
        assert!(result.is_exact());
    }

    #[test]
    fn test_closest_key_prefers_smaller_distance_later() {
        let mut m = Levenshtein::new();
        let result = m.closest_key(["completely different", "Mozilla/5.0 (A)"], "Mozilla/5.0 (B)");
        assert_eq!(result.key, Some("Mozilla/5.0 (A)"));
        assert_eq!(result.distance, 1);
    }

    #[test]
    fn test_closest_key_single_unrelated_candidate_still_matches() {
        let mut m = Levenshtein::new();
        let result = m.closest_key(["xyz"], "a");
        assert_eq!(result.key, Some("xyz"));
        assert_eq!(result.distance, 3);
    }
}
