//! Canonical skill vocabulary with aliases

use crate::config::VocabularyConfig;
use crate::error::{Result, ScreenerError};
use crate::processing::text_processor::fold;
use log::debug;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Canonical,
    Alias,
}

/// One searchable key of the vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    /// Folded comparison key
    pub key: String,
    pub canonical: String,
    pub kind: EntryKind,
    pub tokens: usize,
}

/// Immutable lookup structure built once from configuration.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    entries: Vec<VocabularyEntry>,
    index: HashMap<String, usize>,
    /// Entry indices grouped by token count; `by_tokens[n]` holds n-token keys
    by_tokens: Vec<Vec<usize>>,
    canonical_count: usize,
}

impl SkillVocabulary {
    pub fn from_config(config: &VocabularyConfig) -> Result<Self> {
        Self::new(&config.skills)
    }

    /// Build from a canonical-name -> aliases map.
    ///
    /// Fails on an empty vocabulary, blank names, and on keys that would
    /// resolve to two different canonical skills.
    pub fn new(skills: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        if skills.is_empty() {
            return Err(ScreenerError::Configuration(
                "skill vocabulary is empty".to_string(),
            ));
        }

        let mut vocabulary = Self {
            entries: Vec::new(),
            index: HashMap::new(),
            by_tokens: Vec::new(),
            canonical_count: 0,
        };

        for canonical in skills.keys() {
            vocabulary.insert_canonical(canonical)?;
        }
        for (canonical, aliases) in skills {
            for alias in aliases {
                vocabulary.insert_alias(canonical, alias)?;
            }
        }

        debug!(
            "Built skill vocabulary: {} skills, {} keys",
            vocabulary.canonical_count,
            vocabulary.entries.len()
        );
        Ok(vocabulary)
    }

    fn insert_canonical(&mut self, canonical: &str) -> Result<()> {
        let name = canonical.trim();
        let key = fold(name);
        if key.is_empty() {
            return Err(ScreenerError::Configuration(format!(
                "skill name '{}' has no matchable characters",
                canonical
            )));
        }
        if let Some(existing) = self.lookup(&key) {
            return Err(ScreenerError::Configuration(format!(
                "skills '{}' and '{}' are indistinguishable after normalization",
                existing.canonical, name
            )));
        }
        self.push(key, name.to_string(), EntryKind::Canonical);
        self.canonical_count += 1;
        Ok(())
    }

    fn insert_alias(&mut self, canonical: &str, alias: &str) -> Result<()> {
        let canonical = canonical.trim();
        let key = fold(alias);
        if key.is_empty() {
            return Err(ScreenerError::Configuration(format!(
                "alias '{}' of skill '{}' has no matchable characters",
                alias, canonical
            )));
        }
        match self.lookup(&key) {
            Some(existing) if existing.canonical == canonical => Ok(()),
            Some(existing) => Err(ScreenerError::Configuration(format!(
                "alias '{}' of skill '{}' collides with skill '{}'",
                alias, canonical, existing.canonical
            ))),
            None => {
                self.push(key, canonical.to_string(), EntryKind::Alias);
                Ok(())
            }
        }
    }

    fn push(&mut self, key: String, canonical: String, kind: EntryKind) {
        let tokens = key.split(' ').count();
        let idx = self.entries.len();
        if self.by_tokens.len() <= tokens {
            self.by_tokens.resize(tokens + 1, Vec::new());
        }
        self.by_tokens[tokens].push(idx);
        self.index.insert(key.clone(), idx);
        self.entries.push(VocabularyEntry {
            key,
            canonical,
            kind,
            tokens,
        });
    }

    /// Exact lookup of an already folded phrase
    pub fn lookup(&self, folded: &str) -> Option<&VocabularyEntry> {
        self.index.get(folded).map(|&idx| &self.entries[idx])
    }

    /// Resolve a free-form skill name (canonical or alias, any casing)
    pub fn canonicalize(&self, name: &str) -> Option<&str> {
        self.lookup(&fold(name)).map(|entry| entry.canonical.as_str())
    }

    /// Entries whose key spans exactly `tokens` tokens
    pub fn entries_with_tokens(&self, tokens: usize) -> impl Iterator<Item = &VocabularyEntry> {
        self.by_tokens
            .get(tokens)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.entries[idx])
    }

    /// Longest key, in tokens
    pub fn max_tokens(&self) -> usize {
        self.by_tokens.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.canonical_count
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_count == 0
    }

    /// The vocabulary extended with any of `names` it does not already know,
    /// each added as an alias-free canonical skill.
    pub fn with_skills<'a, I>(&self, names: I) -> Cow<'_, SkillVocabulary>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unknown: Vec<&str> = names
            .into_iter()
            .map(str::trim)
            .filter(|name| {
                let key = fold(name);
                !key.is_empty() && self.lookup(&key).is_none()
            })
            .collect();

        if unknown.is_empty() {
            return Cow::Borrowed(self);
        }

        let mut extended = self.clone();
        for name in unknown {
            // Duplicates within `unknown` are the only possible collision here
            if extended.lookup(&fold(name)).is_none() {
                debug!("Adding job skill '{}' to the vocabulary", name);
                extended.push(fold(name), name.to_string(), EntryKind::Canonical);
                extended.canonical_count += 1;
            }
        }
        Cow::Owned(extended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab(entries: &[(&str, &[&str])]) -> Result<SkillVocabulary> {
        let map = entries
            .iter()
            .map(|(c, a)| (c.to_string(), a.iter().map(|s| s.to_string()).collect()))
            .collect();
        SkillVocabulary::new(&map)
    }

    #[test]
    fn test_lookup_canonical_and_alias() {
        let v = vocab(&[("JavaScript", &["js"]), ("Node.js", &["nodejs"])]).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v.lookup("javascript").unwrap().kind, EntryKind::Canonical);
        assert_eq!(v.lookup("js").unwrap().canonical, "JavaScript");
        assert_eq!(v.lookup("node js").unwrap().canonical, "Node.js");
        assert_eq!(v.canonicalize("NODEJS"), Some("Node.js"));
        assert_eq!(v.canonicalize("Ruby"), None);
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        let result = vocab(&[]);
        assert!(matches!(result, Err(ScreenerError::Configuration(_))));
    }

    #[test]
    fn test_conflicting_alias_is_rejected() {
        let result = vocab(&[("Go", &["golang"]), ("Golang Tools", &["golang"])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_alias_equal_to_own_canonical_is_ignored() {
        let v = vocab(&[("React", &["react", "reactjs"])]).unwrap();
        assert_eq!(v.lookup("react").unwrap().kind, EntryKind::Canonical);
        assert_eq!(v.lookup("reactjs").unwrap().kind, EntryKind::Alias);
    }

    #[test]
    fn test_blank_names_are_rejected() {
        assert!(vocab(&[("  ", &[])]).is_err());
        assert!(vocab(&[("SQL", &["--"])]).is_err());
    }

    #[test]
    fn test_max_tokens_and_grouping() {
        let v = vocab(&[("SQL", &[]), ("Adobe Premiere Pro", &["premiere"])]).unwrap();
        assert_eq!(v.max_tokens(), 3);
        assert_eq!(v.entries_with_tokens(1).count(), 2);
        assert_eq!(v.entries_with_tokens(3).count(), 1);
        assert_eq!(v.entries_with_tokens(7).count(), 0);
    }

    #[test]
    fn test_with_skills_extends_only_when_needed() {
        let v = vocab(&[("Python", &[]), ("JavaScript", &["js"])]).unwrap();
        assert!(matches!(v.with_skills(["python", "JS"]), Cow::Borrowed(_)));

        let extended = v.with_skills(["FastAPI", "Python", "fastapi"]);
        assert!(matches!(extended, Cow::Owned(_)));
        assert_eq!(extended.len(), 3);
        assert_eq!(extended.canonicalize("fastapi"), Some("FastAPI"));
    }
}
