//! String similarity on a 0-100 scale

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, levenshtein};

/// A normalized string similarity. Implementations must be deterministic and
/// return values within `0.0..=100.0`.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;

    /// Highest similarity reachable by any pair of strings with these char
    /// lengths. Lets callers skip hopeless comparisons.
    fn upper_bound(&self, _a_len: usize, _b_len: usize) -> f64 {
        100.0
    }

    fn algorithm(&self) -> FuzzyAlgorithm;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyAlgorithm {
    Levenshtein,
    JaroWinkler,
}

/// `100 * (max_len - edit_distance) / max_len`, over chars.
///
/// Whole-number ratios come out exact (9 of 10 chars is exactly 90.0).
pub struct LevenshteinRatio;

impl Similarity for LevenshteinRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 100.0;
        }
        let distance = levenshtein(a, b).min(max_len);
        (100 * (max_len - distance)) as f64 / max_len as f64
    }

    fn upper_bound(&self, a_len: usize, b_len: usize) -> f64 {
        let max_len = a_len.max(b_len);
        if max_len == 0 {
            return 100.0;
        }
        (100 * a_len.min(b_len)) as f64 / max_len as f64
    }

    fn algorithm(&self) -> FuzzyAlgorithm {
        FuzzyAlgorithm::Levenshtein
    }
}

pub struct JaroWinklerRatio;

impl Similarity for JaroWinklerRatio {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        (jaro_winkler(a, b) * 100.0).clamp(0.0, 100.0)
    }

    fn algorithm(&self) -> FuzzyAlgorithm {
        FuzzyAlgorithm::JaroWinkler
    }
}

impl FuzzyAlgorithm {
    pub fn build(self) -> Box<dyn Similarity> {
        match self {
            FuzzyAlgorithm::Levenshtein => Box::new(LevenshteinRatio),
            FuzzyAlgorithm::JaroWinkler => Box::new(JaroWinklerRatio),
        }
    }
}

impl Default for FuzzyAlgorithm {
    fn default() -> Self {
        FuzzyAlgorithm::Levenshtein
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_ratio_is_exact_for_whole_ratios() {
        let sim = LevenshteinRatio;
        assert_eq!(sim.similarity("kubernetes", "kubernetas"), 90.0);
        assert_eq!(sim.similarity("python", "python"), 100.0);
        assert_eq!(sim.similarity("abcd", "wxyz"), 0.0);
    }

    #[test]
    fn test_levenshtein_upper_bound() {
        let sim = LevenshteinRatio;
        assert_eq!(sim.upper_bound(5, 10), 50.0);
        assert!(sim.similarity("docker", "dockerfile") <= sim.upper_bound(6, 10));
    }

    #[test]
    fn test_empty_strings() {
        assert_eq!(LevenshteinRatio.similarity("", ""), 100.0);
        assert_eq!(LevenshteinRatio.similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_jaro_winkler_range() {
        let sim = JaroWinklerRatio;
        let score = sim.similarity("javascript", "javascrpit");
        assert!(score > 85.0 && score <= 100.0);
        assert_eq!(sim.algorithm(), FuzzyAlgorithm::JaroWinkler);
    }
}
