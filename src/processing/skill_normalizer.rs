//! Skill mention normalization: exact, alias and fuzzy matching against the
//! canonical vocabulary

use crate::config::MatchingConfig;
use crate::processing::similarity::Similarity;
use crate::processing::text_processor::{fold, ngrams, normalize_unicode, tokenize};
use crate::processing::vocabulary::{EntryKind, SkillVocabulary};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    Alias,
    Fuzzy,
}

impl MatchMode {
    /// Higher is more trustworthy
    fn rank(self) -> u8 {
        match self {
            MatchMode::Exact => 3,
            MatchMode::Alias => 2,
            MatchMode::Fuzzy => 1,
        }
    }
}

impl From<EntryKind> for MatchMode {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Canonical => MatchMode::Exact,
            EntryKind::Alias => MatchMode::Alias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub skill: String,
    pub mode: MatchMode,
    /// Set for fuzzy matches only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    /// The normalized phrase from the document that produced the match
    pub mention: String,
}

/// Canonical skills found in one document, keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillMatchSet {
    matches: BTreeMap<String, SkillMatch>,
}

impl SkillMatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a match, keeping the most trustworthy one per skill.
    ///
    /// Exact beats alias beats fuzzy; between fuzzy matches the higher
    /// similarity wins; on a tie the earlier match stays.
    pub fn insert(&mut self, candidate: SkillMatch) {
        match self.matches.get_mut(&candidate.skill) {
            None => {
                self.matches.insert(candidate.skill.clone(), candidate);
            }
            Some(existing) => {
                let better_mode = candidate.mode.rank() > existing.mode.rank();
                let better_fuzzy = candidate.mode == MatchMode::Fuzzy
                    && existing.mode == MatchMode::Fuzzy
                    && candidate.similarity.unwrap_or(0.0) > existing.similarity.unwrap_or(0.0);
                if better_mode || better_fuzzy {
                    *existing = candidate;
                }
            }
        }
    }

    pub fn get(&self, skill: &str) -> Option<&SkillMatch> {
        self.matches.get(skill)
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.matches.contains_key(skill)
    }

    /// Membership test on canonical names, ignoring case and punctuation
    pub fn contains_ignore_case(&self, skill: &str) -> bool {
        if self.contains(skill) {
            return true;
        }
        let key = fold(skill);
        self.matches.keys().any(|k| fold(k) == key)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillMatch> {
        self.matches.values()
    }

    /// Canonical names in sorted order
    pub fn skills(&self) -> Vec<&str> {
        self.matches.keys().map(String::as_str).collect()
    }
}

/// Maps free text onto the canonical vocabulary
pub struct SkillNormalizer {
    similarity: Box<dyn Similarity>,
    fuzzy_threshold: f64,
    fuzzy_min_length: usize,
    max_ngram: usize,
}

impl SkillNormalizer {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            similarity: config.algorithm.build(),
            fuzzy_threshold: config.fuzzy_threshold,
            fuzzy_min_length: config.fuzzy_min_length,
            max_ngram: config.max_ngram.max(1),
        }
    }

    /// Find every vocabulary skill mentioned in `text`.
    ///
    /// Deterministic: the same text and vocabulary always produce the same set.
    pub fn normalize_skills(&self, text: &str, vocabulary: &SkillVocabulary) -> SkillMatchSet {
        let mut found = SkillMatchSet::new();
        if text.trim().is_empty() {
            return found;
        }

        let tokens = tokenize(&normalize_unicode(text));
        // Lookups reach the longest vocabulary phrase; fuzzy stops at max_ngram
        let max_n = vocabulary.max_tokens().max(1);
        let mut fuzzy_candidates = 0usize;

        for phrase in ngrams(&tokens, max_n) {
            if let Some(entry) = vocabulary.lookup(&phrase.text) {
                found.insert(SkillMatch {
                    skill: entry.canonical.clone(),
                    mode: entry.kind.into(),
                    similarity: None,
                    mention: phrase.text,
                });
                continue;
            }

            if phrase.tokens > self.max_ngram || phrase.text.chars().count() < self.fuzzy_min_length {
                continue;
            }
            fuzzy_candidates += 1;

            if let Some((skill, similarity)) = self.best_fuzzy(&phrase.text, phrase.tokens, vocabulary) {
                found.insert(SkillMatch {
                    skill: skill.to_string(),
                    mode: MatchMode::Fuzzy,
                    similarity: Some(similarity),
                    mention: phrase.text,
                });
            }
        }

        debug!(
            "Normalized {} tokens ({} fuzzy candidates) into {} skills",
            tokens.len(),
            fuzzy_candidates,
            found.len()
        );
        found
    }

    /// Best vocabulary entry with the same token count whose similarity
    /// reaches the threshold. Ties go to the lexicographically smallest
    /// canonical name.
    pub fn best_fuzzy<'v>(
        &self,
        phrase: &str,
        tokens: usize,
        vocabulary: &'v SkillVocabulary,
    ) -> Option<(&'v str, f64)> {
        let phrase_len = phrase.chars().count();
        let mut best: Option<(&'v str, f64)> = None;

        for entry in vocabulary.entries_with_tokens(tokens) {
            let entry_len = entry.key.chars().count();
            if entry_len < self.fuzzy_min_length {
                continue;
            }
            if self.similarity.upper_bound(phrase_len, entry_len) < self.fuzzy_threshold {
                continue;
            }

            let score = self.similarity.similarity(phrase, &entry.key);
            if score < self.fuzzy_threshold {
                continue;
            }

            let replace = match best {
                None => true,
                Some((name, best_score)) => {
                    score > best_score || (score == best_score && entry.canonical.as_str() < name)
                }
            };
            if replace {
                best = Some((entry.canonical.as_str(), score));
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VocabularyConfig;
    use crate::processing::similarity::FuzzyAlgorithm;

    fn vocab(entries: &[(&str, &[&str])]) -> SkillVocabulary {
        let map = entries
            .iter()
            .map(|(c, a)| (c.to_string(), a.iter().map(|s| s.to_string()).collect()))
            .collect();
        SkillVocabulary::new(&map).unwrap()
    }

    fn normalizer(threshold: f64) -> SkillNormalizer {
        SkillNormalizer::new(&MatchingConfig {
            algorithm: FuzzyAlgorithm::Levenshtein,
            fuzzy_threshold: threshold,
            fuzzy_min_length: 4,
            max_ngram: 4,
        })
    }

    #[test]
    fn test_exact_and_alias_matches() {
        let v = vocab(&[
            ("JavaScript", &["js"]),
            ("Machine Learning", &[]),
            ("Node.js", &["nodejs"]),
        ]);
        let set = normalizer(85.0).normalize_skills(
            "Built ML tooling in JS and Node.js; strong machine   learning background.",
            &v,
        );

        assert_eq!(set.skills(), vec!["JavaScript", "Machine Learning", "Node.js"]);
        assert_eq!(set.get("JavaScript").unwrap().mode, MatchMode::Alias);
        assert_eq!(set.get("Node.js").unwrap().mode, MatchMode::Exact);
        assert_eq!(set.get("Machine Learning").unwrap().mention, "machine learning");
    }

    #[test]
    fn test_exact_beats_alias_for_same_skill() {
        let v = vocab(&[("JavaScript", &["js"])]);
        let set = normalizer(85.0).normalize_skills("js, javascript", &v);
        let m = set.get("JavaScript").unwrap();
        assert_eq!(m.mode, MatchMode::Exact);
        assert_eq!(m.similarity, None);
    }

    #[test]
    fn test_fuzzy_match_records_similarity() {
        let v = vocab(&[("Kubernetes", &[])]);
        let set = normalizer(85.0).normalize_skills("Deployed services on Kubernetas clusters", &v);
        let m = set.get("Kubernetes").unwrap();
        assert_eq!(m.mode, MatchMode::Fuzzy);
        assert_eq!(m.similarity, Some(90.0));
        assert_eq!(m.mention, "kubernetas");
    }

    #[test]
    fn test_fuzzy_threshold_boundary() {
        let v = vocab(&[("Kubernetes", &[])]);
        let text = "kubernetas";

        // Exactly at the threshold is accepted
        assert!(normalizer(90.0).normalize_skills(text, &v).contains("Kubernetes"));
        // One unit above the similarity is rejected
        assert!(!normalizer(91.0).normalize_skills(text, &v).contains("Kubernetes"));
        // Two edits (80.0) fall below a threshold of 90
        assert!(!normalizer(90.0).normalize_skills("kubernatas", &v).contains("Kubernetes"));
    }

    #[test]
    fn test_fuzzy_keeps_highest_similarity() {
        let v = vocab(&[("Kubernetes", &[])]);
        let set = normalizer(75.0).normalize_skills("kubernatas then kubernetas", &v);
        assert_eq!(set.get("Kubernetes").unwrap().similarity, Some(90.0));
    }

    #[test]
    fn test_fuzzy_tie_prefers_smallest_canonical_name() {
        // "abcdx" is one edit from both keys
        let v = vocab(&[("abcdy", &[]), ("abcdz", &[])]);
        let n = normalizer(80.0);
        assert_eq!(n.best_fuzzy("abcdx", 1, &v), Some(("abcdy", 80.0)));
    }

    #[test]
    fn test_fuzzy_only_compares_same_token_count() {
        let v = vocab(&[("Python", &[])]);
        let set = normalizer(50.0).normalize_skills("pythonic code", &v);
        // "pythonic" vs "python" is 75, accepted at 50; the 2-gram is never compared
        assert_eq!(set.get("Python").unwrap().mention, "pythonic");
    }

    #[test]
    fn test_short_phrases_are_not_fuzzy_matched() {
        let v = vocab(&[("SQL", &[]), ("Java", &[])]);
        let set = normalizer(50.0).normalize_skills("sq jav", &v);
        assert!(set.is_empty());
    }

    #[test]
    fn test_empty_text_yields_empty_set() {
        let v = vocab(&[("SQL", &[])]);
        assert!(normalizer(85.0).normalize_skills("", &v).is_empty());
        assert!(normalizer(85.0).normalize_skills("   \n", &v).is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let v = SkillVocabulary::from_config(&VocabularyConfig::default()).unwrap();
        let n = normalizer(85.0);
        let text = "Senior engineer: Pythn, Dockr, k8s, Amazon Web Services, scikit learn, PowerBI, Reactjs";
        let first = n.normalize_skills(text, &v);
        let second = n.normalize_skills(text, &v);
        assert_eq!(first, second);
        assert!(first.contains("AWS"));
        assert!(first.contains("Kubernetes"));
        assert!(first.contains("scikit-learn"));
    }

    #[test]
    fn test_contains_ignore_case() {
        let v = vocab(&[("PostgreSQL", &[])]);
        let set = normalizer(85.0).normalize_skills("postgresql", &v);
        assert!(set.contains_ignore_case("postgresql"));
        assert!(!set.contains("postgresql"));

        let v = vocab(&[("CI-CD", &[])]);
        let set = normalizer(85.0).normalize_skills("Owned the ci/cd setup", &v);
        assert!(set.contains_ignore_case("ci/cd"));
        assert!(!set.contains_ignore_case("cicd"));
    }

    #[test]
    fn test_vocabulary_phrases_longer_than_max_ngram_match_exactly() {
        let v = vocab(&[("Certified Information Systems Security Professional", &[])]);
        let n = normalizer(85.0);
        let set = n.normalize_skills(
            "Holder of the Certified Information Systems Security Professional credential",
            &v,
        );
        assert_eq!(set.get("Certified Information Systems Security Professional").unwrap().mode, MatchMode::Exact);

        // Five-token phrases are never fuzzy candidates
        let set = n.normalize_skills("certified informaton systems security professional", &v);
        assert!(set.is_empty());
    }
}
