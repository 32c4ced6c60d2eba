//! Education and experience cues in raw text

use crate::config::SignalConfig;
use crate::error::{Result, ScreenerError};
use crate::processing::text_processor::{fold, normalize_unicode};
use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSignals {
    /// Canonical degree labels, in order of appearance
    pub education: Vec<String>,
    /// Experience keyword phrases found, in order of appearance
    pub experience_phrases: Vec<String>,
    pub years_experience: Option<u32>,
}

impl TextSignals {
    pub fn has_education(&self) -> bool {
        !self.education.is_empty()
    }

    pub fn has_experience(&self) -> bool {
        !self.experience_phrases.is_empty() || self.years_experience.is_some()
    }
}

/// Whole-phrase matcher over folded text
struct PhraseMatcher {
    automaton: Option<AhoCorasick>,
    /// Label reported for each pattern, indexed by pattern id
    labels: Vec<String>,
    abbreviations: Vec<Abbreviation>,
}

/// A dotted abbreviation ("m.a.") matched on the unfolded text. Folded it
/// reads like ordinary words ("I'm a" folds to "i m a").
struct Abbreviation {
    regex: Regex,
    label: String,
}

impl Abbreviation {
    fn new(label: &str, variant: &str) -> Result<Self> {
        let body = variant.trim().trim_end_matches('.');
        let regex = Regex::new(&format!(
            r"(?i)(?:^|[^\p{{L}}\p{{N}}.])({})(?:$|[^\p{{L}}\p{{N}}])",
            regex::escape(body)
        ))?;
        Ok(Self {
            regex,
            label: label.to_string(),
        })
    }

    /// Position of the first occurrence, in folded-text coordinates
    fn find(&self, normalized: &str) -> Option<usize> {
        let start = self.regex.captures(normalized)?.get(1)?.start();
        let prefix = fold(&normalized[..start]);
        Some(if prefix.is_empty() { 0 } else { prefix.len() + 1 })
    }
}

fn is_abbreviation(folded: &str) -> bool {
    folded.split(' ').all(|token| token.chars().count() == 1)
}

impl PhraseMatcher {
    fn new<'a, I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut patterns = Vec::new();
        let mut labels = Vec::new();
        let mut abbreviations = Vec::new();
        for (label, phrase) in pairs {
            let folded = fold(phrase);
            if folded.is_empty() {
                continue;
            }
            if is_abbreviation(&folded) && phrase.contains('.') {
                abbreviations.push(Abbreviation::new(label, phrase)?);
                continue;
            }
            patterns.push(folded);
            labels.push(label.to_string());
        }

        let automaton = if patterns.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&patterns).map_err(|e| {
                ScreenerError::Configuration(format!("Failed to build keyword matcher: {}", e))
            })?)
        };

        Ok(Self {
            automaton,
            labels,
            abbreviations,
        })
    }

    /// Labels of all phrases occurring on token boundaries, deduplicated, in
    /// order of appearance
    fn find(&self, text: &str, folded_text: &str) -> Vec<String> {
        let mut hits: Vec<(usize, &str)> = Vec::new();

        if let Some(automaton) = &self.automaton {
            let bytes = folded_text.as_bytes();
            for mat in automaton.find_overlapping_iter(folded_text) {
                let starts_on_boundary = mat.start() == 0 || bytes[mat.start() - 1] == b' ';
                let ends_on_boundary = mat.end() == bytes.len() || bytes[mat.end()] == b' ';
                if starts_on_boundary && ends_on_boundary {
                    hits.push((mat.start(), self.labels[mat.pattern().as_usize()].as_str()));
                }
            }
        }

        if !self.abbreviations.is_empty() {
            let normalized = normalize_unicode(text);
            for abbreviation in &self.abbreviations {
                if let Some(position) = abbreviation.find(&normalized) {
                    hits.push((position, abbreviation.label.as_str()));
                }
            }
        }

        hits.sort_by_key(|&(position, _)| position);
        let mut found: Vec<String> = Vec::new();
        for (_, label) in hits {
            if !found.iter().any(|f| f == label) {
                found.push(label.to_string());
            }
        }
        found
    }
}

pub struct SignalDetector {
    education: PhraseMatcher,
    experience: PhraseMatcher,
    range_regex: Regex,
    minimum_regex: Regex,
    plus_regex: Regex,
    simple_regex: Regex,
}

impl SignalDetector {
    pub fn new(config: &SignalConfig) -> Result<Self> {
        let education = PhraseMatcher::new(config.education.iter().flat_map(|(label, variants)| {
            variants.iter().map(move |v| (label.as_str(), v.as_str()))
        }))?;

        let experience = PhraseMatcher::new(
            config
                .experience_keywords
                .iter()
                .map(|k| (k.as_str(), k.as_str())),
        )?;

        Ok(Self {
            education,
            experience,
            range_regex: Regex::new(r"(?i)\b(\d{1,2})\s*(?:-|to)\s*(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b")
                .expect("Invalid range regex"),
            minimum_regex: Regex::new(
                r"(?i)\b(?:min(?:imum)?|at\s+least)\s*(?:of\s+)?(\d{1,2})\s*\+?\s*(?:years?|yrs?)\b",
            )
            .expect("Invalid minimum regex"),
            plus_regex: Regex::new(r"(?i)\b(\d{1,2})\s*\+\s*(?:years?|yrs?)\b")
                .expect("Invalid plus regex"),
            simple_regex: Regex::new(r"(?i)\b(\d{1,2})\s*(?:years?|yrs?)\b")
                .expect("Invalid simple regex"),
        })
    }

    pub fn detect(&self, text: &str) -> TextSignals {
        let folded = fold(text);
        TextSignals {
            education: self.education.find(text, &folded),
            experience_phrases: self.experience.find(text, &folded),
            years_experience: self.extract_years_experience(text),
        }
    }

    /// Canonical degree labels mentioned in `text`
    pub fn extract_education(&self, text: &str) -> Vec<String> {
        self.education.find(text, &fold(text))
    }

    /// Years of experience stated in `text`.
    ///
    /// Rules in priority order: a range takes its upper bound ("3-5 years" -> 5),
    /// then "minimum/at least N years", "N+ years", and finally "N years".
    pub fn extract_years_experience(&self, text: &str) -> Option<u32> {
        if text.trim().is_empty() {
            return None;
        }
        let text = normalize_unicode(text);

        if let Some(caps) = self.range_regex.captures(&text) {
            let a = caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
            let b = caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok());
            if let (Some(a), Some(b)) = (a, b) {
                return Some(a.max(b));
            }
        }

        [&self.minimum_regex, &self.plus_regex, &self.simple_regex]
            .into_iter()
            .find_map(|regex| {
                regex
                    .captures(&text)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<u32>().ok())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> SignalDetector {
        SignalDetector::new(&SignalConfig::default()).unwrap()
    }

    #[test]
    fn test_education_variants() {
        let d = detector();
        assert_eq!(d.extract_education("BSc Computer Science"), vec!["BSc"]);
        assert_eq!(d.extract_education("B.Sc. in Physics, later an MBA"), vec!["BSc", "MBA"]);
        assert_eq!(d.extract_education("Master of Science (2019)"), vec!["MSc"]);
        assert_eq!(d.extract_education("Bachelor's of Arts"), vec!["BA"]);
    }

    #[test]
    fn test_dotted_abbreviations_need_their_dots() {
        let d = detector();
        // "I'm a" folds to the same tokens as "M.A."
        assert!(d.extract_education("I'm a developer").is_empty());
        assert!(d.extract_education("I\u{2019}m a nurse and a mentor").is_empty());
        assert_eq!(d.extract_education("M.A. in History"), vec!["MA"]);
        assert_eq!(d.extract_education("Degree: B.S, 2015; M.D. 2020"), vec!["BSc", "MD"]);
        // The "b.a." inside "M.B.A." is not a BA
        assert!(d.extract_education("M.B.A.").is_empty());
    }

    #[test]
    fn test_abbreviations_merge_in_order_of_appearance() {
        let d = detector();
        assert_eq!(
            d.extract_education("Master of Science, then M.D. and a PhD"),
            vec!["MSc", "MD", "PhD"]
        );
        let signals = d.detect("M.A. 2012, BSc 2009");
        assert_eq!(signals.education, vec!["MA", "BSc"]);
        assert!(signals.has_education());
    }

    #[test]
    fn test_education_requires_whole_phrases() {
        let d = detector();
        // "rn" inside "learn" or "modern" is not a nursing degree
        assert!(d.extract_education("I learn modern frameworks").is_empty());
        assert_eq!(d.extract_education("Licensed RN, ICU"), vec!["RN"]);
    }

    #[test]
    fn test_experience_phrases() {
        let signals = detector().detect("Over 6 years of experience; summer internship at Acme");
        assert_eq!(signals.experience_phrases, vec!["years of experience", "internship"]);
        assert_eq!(signals.years_experience, Some(6));
        assert!(signals.has_experience());
        assert!(!signals.has_education());
    }

    #[test]
    fn test_years_rules_priority() {
        let d = detector();
        assert_eq!(d.extract_years_experience("3-5 years in backend"), Some(5));
        assert_eq!(d.extract_years_experience("3 \u{2013} 5 yrs"), Some(5));
        assert_eq!(d.extract_years_experience("2 to 4 years"), Some(4));
        assert_eq!(d.extract_years_experience("at least 4 years"), Some(4));
        assert_eq!(d.extract_years_experience("minimum 7 yrs"), Some(7));
        assert_eq!(d.extract_years_experience("5+ years"), Some(5));
        assert_eq!(d.extract_years_experience("7 years experience"), Some(7));
        assert_eq!(d.extract_years_experience("no numbers here"), None);
        assert_eq!(d.extract_years_experience(""), None);
    }

    #[test]
    fn test_empty_text_has_no_signals() {
        let signals = detector().detect("");
        assert_eq!(signals, TextSignals::default());
    }

    #[test]
    fn test_empty_keyword_lists() {
        let config = SignalConfig {
            experience_keywords: Vec::new(),
            education: Default::default(),
        };
        let d = SignalDetector::new(&config).unwrap();
        let signals = d.detect("BSc, 10 years of experience");
        assert!(signals.education.is_empty());
        assert!(signals.experience_phrases.is_empty());
        assert_eq!(signals.years_experience, Some(10));
    }
}
