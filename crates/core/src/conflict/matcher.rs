//! Context similarity matching.
//!
//! Candidates for a conflict region are records with the same conflict body.
//! They are told apart by how closely their surrounding context matches the
//! region's, then by whether they came from the same file and how close
//! their original line number is.

use tracing::debug;

use super::ConflictRegion;
use crate::store::{RecordKey, StoredRecord};

/// The best stored resolution for a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub resolution: &'a str,
    /// Context similarity of the chosen record, in `[0, 1]`.
    pub confidence: f64,
    pub key: &'a RecordKey,
    /// File the resolution was originally recorded in.
    pub source_file: &'a str,
    pub source_line: usize,
}

/// Ranks stored records against a region by context similarity.
#[derive(Debug, Clone, Copy)]
pub struct ContextSimilarityMatcher {
    threshold: f64,
}

impl ContextSimilarityMatcher {
    pub fn new(similarity_threshold: f64) -> Self {
        Self {
            threshold: similarity_threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Pick the best candidate for `region`, or `None` if no candidate's
    /// context similarity reaches the threshold.
    ///
    /// Survivors are ranked by same file first, then similarity, then
    /// distance between line numbers. Remaining ties go to the earliest
    /// candidate, so a fixed candidate list always yields the same match.
    pub fn find_best<'a>(
        &self,
        region: &ConflictRegion,
        candidates: &'a [StoredRecord],
    ) -> Option<Match<'a>> {
        let mut ranked: Vec<(bool, f64, usize, &'a StoredRecord)> = candidates
            .iter()
            .filter(|c| c.record.region.conflict_text == region.conflict_text)
            .filter_map(|c| {
                let similarity = context_similarity(region, &c.record.region);
                if similarity < self.threshold {
                    debug!(key = %c.key, similarity, "candidate below threshold");
                    return None;
                }
                let same_file = c.record.region.file_path == region.file_path;
                let distance = c.record.region.start_line.abs_diff(region.start_line);
                Some((same_file, similarity, distance, c))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| b.1.total_cmp(&a.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let (_, confidence, _, best) = ranked.into_iter().next()?;
        debug!(
            key = %best.key,
            confidence,
            start_line = region.start_line,
            "selected stored resolution"
        );
        Some(Match {
            resolution: &best.record.resolution,
            confidence,
            key: &best.key,
            source_file: &best.record.region.file_path,
            source_line: best.record.region.start_line,
        })
    }
}

/// Mean of the before- and after-context similarity of two regions.
pub fn context_similarity(a: &ConflictRegion, b: &ConflictRegion) -> f64 {
    let before = sequence_ratio(&a.before_context, &b.before_context);
    let after = sequence_ratio(&a.after_context, &b.after_context);
    (before + after) / 2.0
}

/// Similarity of two strings as `2 * M / T`, where `M` is the length of
/// their longest common character subsequence and `T` their combined length.
///
/// Two empty strings are identical (1.0); a non-empty string against an
/// empty one scores 0.0.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches = lcs_len(&a, &b);
    (2 * matches) as f64 / total as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut cur = vec![0usize; inner.len() + 1];
    for x in outer {
        for (j, y) in inner.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[inner.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ResolutionRecord;

    const CONFLICT: &str = "<<<<<<<\na\n=======\nb\n>>>>>>>\n";

    fn region(file: &str, before: &str, after: &str, start_line: usize) -> ConflictRegion {
        ConflictRegion {
            conflict_text: CONFLICT.into(),
            before_context: before.into(),
            after_context: after.into(),
            start_line,
            end_line: start_line + 4,
            file_path: file.into(),
        }
    }

    fn stored(region: ConflictRegion, resolution: &str) -> StoredRecord {
        let record = ResolutionRecord::new(region, resolution);
        StoredRecord {
            key: record.key(),
            record,
        }
    }

    #[test]
    fn test_ratio_identity_and_symmetry() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("abc", "abc"), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);

        let pairs = [("kitten", "sitting"), ("def test():\n", "def toast():\n"), ("ab", "ba")];
        for (x, y) in pairs {
            assert_eq!(sequence_ratio(x, y), sequence_ratio(y, x));
        }
    }

    #[test]
    fn test_ratio_values() {
        // LCS("abcd", "abed") = "abd" -> 2*3/8
        assert_eq!(sequence_ratio("abcd", "abed"), 0.75);
        // LCS("kitten", "sitting") = "ittn" -> 2*4/13
        assert!((sequence_ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_decreases_with_edits() {
        let base = "fn main() {\n    run();\n";
        let one = "fn main() {\n    walk();\n";
        let two = "fn start() {\n    walk();\n";
        assert!(sequence_ratio(base, one) > sequence_ratio(base, two));
    }

    #[test]
    fn test_context_similarity_identical() {
        let a = region("f", "def test():\n    x = 1\n", "    return x\n", 1);
        let b = region("g", "def test():\n    x = 1\n", "    return x\n", 9);
        assert_eq!(context_similarity(&a, &b), 1.0);
    }

    #[test]
    fn test_no_candidates() {
        let matcher = ContextSimilarityMatcher::new(0.8);
        assert!(matcher.find_best(&region("f", "x", "y", 0), &[]).is_none());
    }

    #[test]
    fn test_threshold_boundary() {
        // before: identical (1.0); after: "abcd" vs "abed" (0.75) -> 0.875
        let query = region("f", "same\n", "abcd", 0);
        let candidates = vec![stored(region("f", "same\n", "abed", 0), "r\n")];

        let at = ContextSimilarityMatcher::new(0.875).find_best(&query, &candidates);
        let found = at.expect("score equal to threshold is accepted");
        assert_eq!(found.confidence, 0.875);
        assert_eq!(found.resolution, "r\n");

        let above = ContextSimilarityMatcher::new(0.875 + 1e-9).find_best(&query, &candidates);
        assert!(above.is_none());
    }

    #[test]
    fn test_prefers_same_file_over_higher_similarity() {
        let query = region("mine.txt", "alpha\n", "omega\n", 10);
        let candidates = vec![
            stored(region("other.txt", "alpha\n", "omega\n", 10), "other\n"),
            stored(region("mine.txt", "alpha\n", "omegas\n", 10), "mine\n"),
        ];
        let found = ContextSimilarityMatcher::new(0.5)
            .find_best(&query, &candidates)
            .unwrap();
        assert_eq!(found.resolution, "mine\n");
        assert!(found.confidence < 1.0);
    }

    #[test]
    fn test_prefers_higher_similarity_then_closer_line() {
        let query = region("f", "alpha\n", "omega\n", 10);
        let candidates = vec![
            stored(region("f", "alpha\n", "omegas\n", 10), "weaker\n"),
            stored(region("f", "alpha\n", "omega\n", 50), "far\n"),
            stored(region("f", "alpha\n", "omega\n", 12), "near\n"),
        ];
        let found = ContextSimilarityMatcher::new(0.5)
            .find_best(&query, &candidates)
            .unwrap();
        assert_eq!(found.resolution, "near\n");
        assert_eq!(found.confidence, 1.0);
        assert_eq!(found.source_line, 12);
    }

    #[test]
    fn test_ties_go_to_first_candidate() {
        let query = region("f", "alpha\n", "omega\n", 10);
        let candidates = vec![
            stored(region("g", "alpha\n", "omega\n", 8), "first\n"),
            stored(region("h", "alpha\n", "omega\n", 12), "second\n"),
        ];
        let matcher = ContextSimilarityMatcher::new(0.8);
        for _ in 0..5 {
            let found = matcher.find_best(&query, &candidates).unwrap();
            assert_eq!(found.resolution, "first\n");
            assert_eq!(found.key, &candidates[0].key);
        }
    }

    #[test]
    fn test_different_conflict_body_is_ignored() {
        let query = region("f", "alpha\n", "omega\n", 10);
        let mut other = region("f", "alpha\n", "omega\n", 10);
        other.conflict_text = "<<<<<<<\nz\n=======\nb\n>>>>>>>\n".into();
        let candidates = vec![stored(other, "nope\n")];
        assert!(ContextSimilarityMatcher::new(0.0)
            .find_best(&query, &candidates)
            .is_none());
    }
}
