//! Job specifications: required and preferred skills plus derived requirements

use crate::error::{Result, ScreenerError};
use crate::processing::signals::SignalDetector;
use crate::processing::text_processor::fold;
use crate::processing::vocabulary::SkillVocabulary;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// Requirements derived from the job description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequirements {
    /// Canonical degree labels, any one of which satisfies the job
    pub required_education: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_years_experience: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mandatory_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    #[serde(default)]
    pub requirements: JobRequirements,
}

impl JobSpec {
    /// Skill names are trimmed and deduplicated case-insensitively, keeping
    /// the first spelling.
    pub fn new<I, J, S, T>(id: impl Into<String>, title: impl Into<String>, mandatory: I, preferred: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            mandatory_skills: dedup_skills(mandatory),
            preferred_skills: dedup_skills(preferred),
            requirements: JobRequirements::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_requirements(mut self, requirements: JobRequirements) -> Self {
        self.requirements = requirements;
        self
    }

    /// Build a job from free text.
    ///
    /// Text that labels its lists ("Mandatory: ...", "Preferred: ...") is split
    /// into the two tiers. Otherwise the first five comma-separated items
    /// longer than two characters become the mandatory skills. Education and
    /// minimum years come from the signal rules.
    pub fn from_description(
        id: impl Into<String>,
        title: impl Into<String>,
        text: &str,
        detector: &SignalDetector,
    ) -> Self {
        let (mandatory, preferred) = split_description(text);
        debug!(
            "Parsed job description: {} mandatory, {} preferred",
            mandatory.len(),
            preferred.len()
        );

        let requirements = JobRequirements {
            required_education: detector.extract_education(text),
            min_years_experience: detector.extract_years_experience(text),
        };

        Self::new(id, title, mandatory, preferred)
            .with_description(text)
            .with_requirements(requirements)
    }

    pub fn has_skills(&self) -> bool {
        !self.mandatory_skills.is_empty() || !self.preferred_skills.is_empty()
    }

    /// Preferred skills that are not also mandatory, compared on folded names
    pub fn preferred_only(&self) -> impl Iterator<Item = &str> {
        let mandatory: Vec<String> = self.mandatory_skills.iter().map(|m| fold(m)).collect();
        self.preferred_skills
            .iter()
            .map(String::as_str)
            .filter(move |p| !mandatory.contains(&fold(p)))
    }

    /// A copy with every skill name replaced by its vocabulary canonical
    /// name where one exists
    pub fn canonicalized(&self, vocabulary: &SkillVocabulary) -> JobSpec {
        let canonical = |names: &[String]| -> Vec<String> {
            dedup_skills(
                names
                    .iter()
                    .map(|name| vocabulary.canonicalize(name).unwrap_or(name.as_str())),
            )
        };

        JobSpec {
            mandatory_skills: canonical(&self.mandatory_skills),
            preferred_skills: canonical(&self.preferred_skills),
            ..self.clone()
        }
    }

    /// Every skill named by the job, mandatory first
    pub fn all_skills(&self) -> impl Iterator<Item = &str> {
        self.mandatory_skills
            .iter()
            .chain(self.preferred_skills.iter())
            .map(String::as_str)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScreenerError::InvalidInput(format!("Failed to read job '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let job: JobSpec = toml::from_str(content)
            .map_err(|e| ScreenerError::InvalidInput(format!("Invalid job file: {}", e)))?;
        Ok(Self::new(job.id, job.title, job.mandatory_skills, job.preferred_skills)
            .with_description(job.description)
            .with_requirements(job.requirements))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ScreenerError::OutputFormatting(format!("Failed to serialize job: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

fn dedup_skills<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut skills: Vec<String> = Vec::new();
    let mut keys: Vec<String> = Vec::new();
    for name in names {
        let name = name.as_ref().trim();
        let key = fold(name);
        if key.is_empty() || keys.contains(&key) {
            continue;
        }
        keys.push(key);
        skills.push(name.to_string());
    }
    skills
}

fn section_regexes() -> &'static (Regex, Regex) {
    static SECTIONS: OnceLock<(Regex, Regex)> = OnceLock::new();
    SECTIONS.get_or_init(|| {
        (
            Regex::new(r"(?is)\bmandatory(?:\s+(?:skills|requirements))?\s*[:\-]?\s*(.*?)(?:\bpreferred\b|\z)")
                .expect("Invalid mandatory section regex"),
            Regex::new(r"(?is)\bpreferred(?:\s+(?:skills|requirements))?\s*[:\-]?\s*(.*?)(?:\bmandatory\b|\z)")
                .expect("Invalid preferred section regex"),
        )
    })
}

fn split_description(text: &str) -> (Vec<String>, Vec<String>) {
    let lower = text.to_lowercase();
    if lower.contains("mandatory") || lower.contains("preferred") {
        let (mandatory_regex, preferred_regex) = section_regexes();
        let section = |regex: &Regex| {
            regex
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| split_list(m.as_str()))
                .unwrap_or_default()
        };
        (section(mandatory_regex), section(preferred_regex))
    } else {
        let mandatory = text
            .split(',')
            .map(str::trim)
            .filter(|item| item.chars().count() > 2)
            .take(5)
            .map(str::to_string)
            .collect();
        (mandatory, Vec::new())
    }
}

fn split_list(section: &str) -> Vec<String> {
    section
        .split(|c: char| matches!(c, ',' | ';' | '\n' | '•'))
        .map(|item| item.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalConfig;
    use std::collections::BTreeMap;

    fn detector() -> SignalDetector {
        SignalDetector::new(&SignalConfig::default()).unwrap()
    }

    #[test]
    fn test_new_deduplicates_case_insensitively() {
        let job = JobSpec::new("j1", "Dev", ["Python", " python ", "SQL", ""], ["Docker"]);
        assert_eq!(job.mandatory_skills, vec!["Python", "SQL"]);
        assert_eq!(job.preferred_skills, vec!["Docker"]);
        assert!(job.has_skills());
    }

    #[test]
    fn test_preferred_only_excludes_mandatory() {
        let job = JobSpec::new("j1", "Dev", ["Python"], ["python", "Docker"]);
        assert_eq!(job.preferred_only().collect::<Vec<_>>(), vec!["Docker"]);
    }

    #[test]
    fn test_skill_spellings_dedup_on_folded_names() {
        let job = JobSpec::new("j1", "Dev", ["CI-CD"], ["ci/cd", "Docker"]);
        assert_eq!(job.preferred_only().collect::<Vec<_>>(), vec!["Docker"]);

        let job = JobSpec::new("j1", "Dev", ["CI/CD", "ci-cd", "C#"], ["c#", "C++"]);
        assert_eq!(job.mandatory_skills, vec!["CI/CD", "C#"]);
        assert_eq!(job.preferred_only().collect::<Vec<_>>(), vec!["C++"]);
    }

    #[test]
    fn test_labelled_description() {
        let text = "We are hiring.\nMandatory skills: Python, SQL; Docker\n\
                    Preferred:\n- Kubernetes\n- AWS\nBSc required, 3-5 years of experience";
        let job = JobSpec::from_description("j2", "Backend", text, &detector());
        assert_eq!(job.mandatory_skills, vec!["Python", "SQL", "Docker"]);
        assert_eq!(
            job.preferred_skills,
            vec!["Kubernetes", "AWS", "BSc required", "3-5 years of experience"]
        );
        assert_eq!(job.requirements.required_education, vec!["BSc"]);
        assert_eq!(job.requirements.min_years_experience, Some(5));
    }

    #[test]
    fn test_unlabelled_description_takes_first_five_items() {
        let text = "Python, SQL, Go, Docker, Kubernetes, AWS, Terraform";
        let job = JobSpec::from_description("j3", "Ops", text, &detector());
        // "Go" is too short to count
        assert_eq!(
            job.mandatory_skills,
            vec!["Python", "SQL", "Docker", "Kubernetes", "AWS"]
        );
        assert!(job.preferred_skills.is_empty());
        assert_eq!(job.requirements.min_years_experience, None);
    }

    #[test]
    fn test_canonicalized_uses_vocabulary() {
        let mut skills = BTreeMap::new();
        skills.insert("JavaScript".to_string(), vec!["js".to_string()]);
        skills.insert("PostgreSQL".to_string(), vec!["postgres".to_string()]);
        let vocab = SkillVocabulary::new(&skills).unwrap();

        let job = JobSpec::new("j4", "Web", ["JS", "javascript", "Elm"], ["Postgres"]);
        let canonical = job.canonicalized(&vocab);
        assert_eq!(canonical.mandatory_skills, vec!["JavaScript", "Elm"]);
        assert_eq!(canonical.preferred_skills, vec!["PostgreSQL"]);
        // The original is untouched
        assert_eq!(job.mandatory_skills, vec!["JS", "javascript", "Elm"]);
    }

    #[test]
    fn test_toml_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job.toml");
        let job = JobSpec::new("j5", "Analyst", ["SQL"], ["Tableau"]).with_requirements(JobRequirements {
            required_education: vec!["BSc".to_string()],
            min_years_experience: Some(2),
        });
        job.save(&path).unwrap();
        assert_eq!(JobSpec::load(&path).unwrap(), job);
    }

    #[test]
    fn test_minimal_toml() {
        let job = JobSpec::from_toml("id = \"x\"\ntitle = \"Empty\"\n").unwrap();
        assert!(!job.has_skills());
        assert_eq!(job.requirements, JobRequirements::default());
        assert!(JobSpec::from_toml("title = 3").is_err());
    }
}
