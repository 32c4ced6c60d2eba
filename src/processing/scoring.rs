//! Banded match scoring of a candidate against a job

use crate::config::{BandConfig, DecisionThresholds, ScoringConfig};
use crate::error::Result;
use crate::processing::job::JobSpec;
use crate::processing::signals::TextSignals;
use crate::processing::skill_normalizer::SkillMatchSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Decision {
    Weak,
    Good,
    Excellent,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Decision::Excellent => "Excellent",
            Decision::Good => "Good",
            Decision::Weak => "Weak",
        };
        write!(f, "{}", label)
    }
}

/// How the final score was assembled
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub band: String,
    pub base: f64,
    pub education_bonus: f64,
    pub experience_bonus: f64,
    pub coverage_bonus: f64,
    /// Score before rounding and the band cap
    pub uncapped: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: f64,
    pub decision: Decision,
    pub mandatory_matched: usize,
    pub preferred_matched: usize,
    pub matched_mandatory: Vec<String>,
    pub missing_mandatory: Vec<String>,
    pub matched_preferred: Vec<String>,
    pub missing_preferred: Vec<String>,
    pub skills: SkillMatchSet,
    pub breakdown: ScoreBreakdown,
    pub rationale: String,
}

impl ScoreRecord {
    /// Distinct job skills matched, `M + P`
    pub fn total_matched(&self) -> usize {
        self.mandatory_matched + self.preferred_matched
    }

    /// A zero `Weak` record for a document that could not be evaluated
    pub fn unscored(job: &JobSpec, reason: &str) -> Self {
        Self {
            score: 0.0,
            decision: Decision::Weak,
            mandatory_matched: 0,
            preferred_matched: 0,
            matched_mandatory: Vec::new(),
            missing_mandatory: job.mandatory_skills.clone(),
            matched_preferred: Vec::new(),
            missing_preferred: job.preferred_only().map(str::to_string).collect(),
            skills: SkillMatchSet::new(),
            breakdown: ScoreBreakdown::default(),
            rationale: format!("Not scored: {}", reason),
        }
    }
}

pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Rejects an inconsistent band table or thresholds
    pub fn new(config: &ScoringConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
        })
    }

    pub fn score(&self, job: &JobSpec, skills: &SkillMatchSet, signals: &TextSignals) -> ScoreRecord {
        let (matched_mandatory, missing_mandatory) =
            partition(job.mandatory_skills.iter().map(String::as_str), skills);
        let (matched_preferred, missing_preferred) = partition(job.preferred_only(), skills);

        let m = matched_mandatory.len();
        let p = matched_preferred.len();
        let (band, base) = self.base_score(m + p);

        let education_bonus = if education_applies(job, signals) {
            self.config.education_bonus
        } else {
            0.0
        };
        let experience_bonus = if experience_applies(job, signals) {
            self.config.experience_bonus
        } else {
            0.0
        };
        let coverage_bonus = if job.mandatory_skills.is_empty() {
            0.0
        } else {
            self.config.coverage_bonus * m as f64 / job.mandatory_skills.len() as f64
        };

        let uncapped = base + education_bonus + experience_bonus + coverage_bonus;
        let score = round2(uncapped.min(band.score_cap).clamp(0.0, 100.0));
        let decision = self.decide(score);

        let breakdown = ScoreBreakdown {
            band: band.name.clone(),
            base,
            education_bonus,
            experience_bonus,
            coverage_bonus: round2(coverage_bonus),
            uncapped: round2(uncapped),
        };

        let rationale = rationale(
            &matched_mandatory,
            &missing_mandatory,
            &matched_preferred,
            &missing_preferred,
            &breakdown,
            signals,
        );

        ScoreRecord {
            score,
            decision,
            mandatory_matched: m,
            preferred_matched: p,
            matched_mandatory,
            missing_mandatory,
            matched_preferred,
            missing_preferred,
            skills: skills.clone(),
            breakdown,
            rationale,
        }
    }

    /// Base score for `total` matched skills and the band it falls in.
    ///
    /// Linear within the band: `min(floor + (total - min_matches) * step, ceiling)`.
    pub fn base_score(&self, total: usize) -> (&BandConfig, f64) {
        let band = self
            .config
            .bands
            .iter()
            .rev()
            .find(|band| band.min_matches <= total)
            .unwrap_or(&self.config.bands[0]);
        let extra = total.saturating_sub(band.min_matches) as f64;
        let base = (band.base_floor + extra * band.step).min(band.base_ceiling);
        (band, base)
    }

    pub fn decide(&self, score: f64) -> Decision {
        decide(score, &self.config.thresholds)
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }
}

pub fn decide(score: f64, thresholds: &DecisionThresholds) -> Decision {
    if score >= thresholds.excellent {
        Decision::Excellent
    } else if score >= thresholds.good {
        Decision::Good
    } else {
        Decision::Weak
    }
}

fn partition<'a, I>(names: I, skills: &SkillMatchSet) -> (Vec<String>, Vec<String>)
where
    I: Iterator<Item = &'a str>,
{
    let (matched, missing): (Vec<&str>, Vec<&str>) =
        names.partition(|name| skills.contains_ignore_case(name));
    (
        matched.into_iter().map(str::to_string).collect(),
        missing.into_iter().map(str::to_string).collect(),
    )
}

fn education_applies(job: &JobSpec, signals: &TextSignals) -> bool {
    if !signals.has_education() {
        return false;
    }
    let required = &job.requirements.required_education;
    required.is_empty()
        || signals
            .education
            .iter()
            .any(|held| required.iter().any(|r| r.eq_ignore_ascii_case(held)))
}

fn experience_applies(job: &JobSpec, signals: &TextSignals) -> bool {
    if !signals.has_experience() {
        return false;
    }
    match (job.requirements.min_years_experience, signals.years_experience) {
        (Some(min), Some(years)) => years >= min,
        _ => true,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

fn rationale(
    matched_mandatory: &[String],
    missing_mandatory: &[String],
    matched_preferred: &[String],
    missing_preferred: &[String],
    breakdown: &ScoreBreakdown,
    signals: &TextSignals,
) -> String {
    let mut parts = vec![
        format!(
            "Mandatory matched {}/{}: {}; missing: {}",
            matched_mandatory.len(),
            matched_mandatory.len() + missing_mandatory.len(),
            list_or_none(matched_mandatory),
            list_or_none(missing_mandatory)
        ),
        format!(
            "Preferred matched {}/{}: {}; missing: {}",
            matched_preferred.len(),
            matched_preferred.len() + missing_preferred.len(),
            list_or_none(matched_preferred),
            list_or_none(missing_preferred)
        ),
        format!("{} band base {}", breakdown.band, breakdown.base),
    ];

    if breakdown.education_bonus > 0.0 {
        parts.push(format!(
            "education +{} ({})",
            breakdown.education_bonus,
            signals.education.join(", ")
        ));
    }
    if breakdown.experience_bonus > 0.0 {
        let evidence = match signals.years_experience {
            Some(years) => format!("{} years", years),
            None => signals.experience_phrases.join(", "),
        };
        parts.push(format!("experience +{} ({})", breakdown.experience_bonus, evidence));
    }
    if breakdown.coverage_bonus > 0.0 {
        parts.push(format!("mandatory coverage +{}", breakdown.coverage_bonus));
    }

    parts.join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::job::JobRequirements;
    use crate::processing::skill_normalizer::{MatchMode, SkillMatch};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(&ScoringConfig::default()).unwrap()
    }

    fn matches(names: &[&str]) -> SkillMatchSet {
        let mut set = SkillMatchSet::new();
        for name in names {
            set.insert(SkillMatch {
                skill: name.to_string(),
                mode: MatchMode::Exact,
                similarity: None,
                mention: name.to_lowercase(),
            });
        }
        set
    }

    fn signals(education: &[&str], years: Option<u32>) -> TextSignals {
        TextSignals {
            education: education.iter().map(|s| s.to_string()).collect(),
            experience_phrases: Vec::new(),
            years_experience: years,
        }
    }

    #[test]
    fn test_base_score_mapping() {
        let e = engine();
        let expected = [0.0, 35.0, 60.0, 80.0, 90.0, 92.5, 95.0, 97.5, 100.0, 100.0, 100.0];
        for (total, want) in expected.iter().enumerate() {
            assert_eq!(e.base_score(total).1, *want, "T={}", total);
        }
        assert_eq!(e.base_score(3).0.name, "Good");
        assert_eq!(e.base_score(1).0.name, "Weak");
    }

    #[test]
    fn test_good_band_with_bonuses() {
        let job = JobSpec::new("j", "Dev", ["Python", "SQL"], ["Docker"]);
        let record = engine().score(&job, &matches(&["Docker", "Python", "SQL"]), &signals(&["BSc"], None));

        assert_eq!(record.mandatory_matched, 2);
        assert_eq!(record.preferred_matched, 1);
        assert_eq!(record.breakdown.base, 80.0);
        assert_eq!(record.breakdown.education_bonus, 3.0);
        assert_eq!(record.breakdown.experience_bonus, 0.0);
        assert_eq!(record.breakdown.coverage_bonus, 4.0);
        assert_eq!(record.score, 87.0);
        assert_eq!(record.decision, Decision::Good);
        assert!(record.missing_mandatory.is_empty());
    }

    #[test]
    fn test_bonuses_never_cross_band_cap() {
        let job = JobSpec::new("j", "Dev", ["Python", "SQL", "Docker"], Vec::<String>::new());
        let record = engine().score(&job, &matches(&["Python", "SQL", "Docker"]), &signals(&["MSc"], Some(10)));
        // 80 + 3 + 2 + 4 = 89, exactly the Good cap
        assert_eq!(record.score, 89.0);
        assert_eq!(record.decision, Decision::Good);

        let mut config = ScoringConfig::default();
        config.education_bonus = 8.0;
        let record = ScoringEngine::new(&config)
            .unwrap()
            .score(&job, &matches(&["Python", "SQL", "Docker"]), &signals(&["MSc"], Some(10)));
        assert_eq!(record.score, 89.0);
        assert_eq!(record.breakdown.uncapped, 94.0);
    }

    #[test]
    fn test_degenerate_job_is_weak() {
        let job = JobSpec::new("j", "Empty", Vec::<String>::new(), Vec::<String>::new());
        let record = engine().score(&job, &matches(&["Python", "SQL", "Docker", "AWS"]), &signals(&["PhD"], Some(20)));
        assert_eq!(record.total_matched(), 0);
        assert_eq!(record.decision, Decision::Weak);
        assert_eq!(record.breakdown.coverage_bonus, 0.0);
        assert!(record.score < 60.0);
    }

    #[test]
    fn test_skill_in_both_tiers_counts_once_as_mandatory() {
        let job = JobSpec::new("j", "Dev", ["Python"], ["python", "Go"]);
        let record = engine().score(&job, &matches(&["Python"]), &TextSignals::default());
        assert_eq!(record.mandatory_matched, 1);
        assert_eq!(record.preferred_matched, 0);
        assert_eq!(record.missing_preferred, vec!["Go"]);
    }

    #[test]
    fn test_comparison_ignores_case() {
        let job = JobSpec::new("j", "Dev", ["postgresql"], Vec::<String>::new());
        let record = engine().score(&job, &matches(&["PostgreSQL"]), &TextSignals::default());
        assert_eq!(record.mandatory_matched, 1);
    }

    #[test]
    fn test_required_education_must_be_held() {
        let job = JobSpec::new("j", "Dev", ["Python"], Vec::<String>::new()).with_requirements(JobRequirements {
            required_education: vec!["PhD".to_string()],
            min_years_experience: Some(5),
        });
        let e = engine();

        let record = e.score(&job, &matches(&["Python"]), &signals(&["BSc"], Some(3)));
        assert_eq!(record.breakdown.education_bonus, 0.0);
        assert_eq!(record.breakdown.experience_bonus, 0.0);

        let record = e.score(&job, &matches(&["Python"]), &signals(&["phd"], Some(5)));
        assert_eq!(record.breakdown.education_bonus, 3.0);
        assert_eq!(record.breakdown.experience_bonus, 2.0);
    }

    #[test]
    fn test_unknown_years_still_earn_experience_bonus() {
        let job = JobSpec::new("j", "Dev", ["Python"], Vec::<String>::new()).with_requirements(JobRequirements {
            required_education: Vec::new(),
            min_years_experience: Some(5),
        });
        let signals = TextSignals {
            experience_phrases: vec!["work experience".to_string()],
            ..TextSignals::default()
        };
        let record = engine().score(&job, &matches(&["Python"]), &signals);
        assert_eq!(record.breakdown.experience_bonus, 2.0);
    }

    #[test]
    fn test_decision_follows_score_only() {
        let e = engine();
        for (score, decision) in [
            (0.0, Decision::Weak),
            (59.99, Decision::Weak),
            (60.0, Decision::Good),
            (89.99, Decision::Good),
            (90.0, Decision::Excellent),
            (100.0, Decision::Excellent),
        ] {
            assert_eq!(e.decide(score), decision, "score {}", score);
        }
    }

    #[test]
    fn test_fractional_coverage_is_rounded() {
        let job = JobSpec::new("j", "Dev", ["A1", "B2", "C3"], Vec::<String>::new());
        let record = engine().score(&job, &matches(&["A1"]), &TextSignals::default());
        // 35 + 4/3
        assert_eq!(record.score, 36.33);
        assert_eq!(record.decision, Decision::Weak);
    }

    #[test]
    fn test_unscored_lists_everything_missing() {
        let job = JobSpec::new("j", "Dev", ["Python"], ["Docker"]);
        let record = ScoreRecord::unscored(&job, "timed out");
        assert_eq!(record.score, 0.0);
        assert_eq!(record.decision, Decision::Weak);
        assert_eq!(record.missing_mandatory, vec!["Python"]);
        assert_eq!(record.missing_preferred, vec!["Docker"]);
        assert!(record.rationale.contains("timed out"));
    }

    #[test]
    fn test_rationale_names_skills() {
        let job = JobSpec::new("j", "Dev", ["Python", "SQL"], ["Docker"]);
        let record = engine().score(&job, &matches(&["Python"]), &signals(&["BSc"], None));
        assert!(record.rationale.contains("Mandatory matched 1/2: Python; missing: SQL"));
        assert!(record.rationale.contains("Preferred matched 0/1: none; missing: Docker"));
        assert!(record.rationale.contains("education +3 (BSc)"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ScoringConfig::default();
        config.thresholds.good = 95.0;
        assert!(ScoringEngine::new(&config).is_err());
    }
}
