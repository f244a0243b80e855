//! Fuzzy matching for person suggestions, backed by skim's scorer.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher as _;
use roster_core::{FuzzyMatch, FuzzyMatcher, MatchSpan, PreparedSearch};

pub struct SkimFuzzy {
    matcher: SkimMatcherV2,
}

impl Default for SkimFuzzy {
    fn default() -> Self {
        Self::new()
    }
}

impl SkimFuzzy {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default().smart_case(),
        }
    }
}

impl FuzzyMatcher for SkimFuzzy {
    fn prepare<'a>(&'a self, query: &str) -> PreparedSearch<'a> {
        let pattern: String = query.split_whitespace().collect();
        Box::new(move |candidate: &str| {
            let (score, indices) = self.matcher.fuzzy_indices(candidate, &pattern)?;
            Some(FuzzyMatch {
                score,
                matches: merge_indices(&indices),
            })
        })
    }
}

/// Collapse sorted char indices into contiguous spans.
fn merge_indices(indices: &[usize]) -> Vec<MatchSpan> {
    let mut spans: Vec<MatchSpan> = Vec::new();
    for &idx in indices {
        match spans.last_mut() {
            Some(last) if last.end == idx => last.end = idx + 1,
            _ => spans.push(MatchSpan {
                start: idx,
                end: idx + 1,
            }),
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_adjacent_indices() {
        assert_eq!(
            merge_indices(&[0, 1, 2, 5, 7, 8]),
            vec![
                MatchSpan { start: 0, end: 3 },
                MatchSpan { start: 5, end: 6 },
                MatchSpan { start: 7, end: 9 },
            ]
        );
        assert!(merge_indices(&[]).is_empty());
    }

    #[test]
    fn matches_subsequences() {
        let fuzzy = SkimFuzzy::new();
        let search = fuzzy.prepare("aln");
        let found = search("People/Alan.md").expect("match");
        assert!(!found.matches.is_empty());
        assert!(search("People/Bob.md").is_none());
    }

    #[test]
    fn tighter_match_scores_higher() {
        let fuzzy = SkimFuzzy::new();
        let search = fuzzy.prepare("ann");
        let tight = search("People/Ann.md").expect("tight").score;
        let loose = search("People/Adrian Nunn.md").expect("loose").score;
        assert!(tight > loose);
    }
}
