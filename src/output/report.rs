//! Screening report structures

use crate::config::Config;
use crate::input::Confidence;
use crate::pipeline::{rank, BatchEntry, BatchStatus};
use crate::processing::job::{JobRequirements, JobSpec};
use crate::processing::scoring::Decision;
use crate::processing::similarity::FuzzyAlgorithm;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ranked results of one batch against one job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub metadata: ReportMetadata,
    pub job: JobSummary,
    pub summary: ReportSummary,
    /// Best candidates first
    pub entries: Vec<BatchEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub screener_version: String,
    pub processing_time_ms: u64,
    pub workers: usize,
    pub fuzzy_algorithm: FuzzyAlgorithm,
    pub fuzzy_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub mandatory_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub requirements: JobRequirements,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub documents: usize,
    pub completed: usize,
    pub failed: usize,
    pub excellent: usize,
    pub good: usize,
    pub weak: usize,
    /// Mean score over completed documents
    pub average_score: f64,
    pub low_confidence: usize,
}

impl From<&JobSpec> for JobSummary {
    fn from(job: &JobSpec) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            mandatory_skills: job.mandatory_skills.clone(),
            preferred_skills: job.preferred_skills.clone(),
            requirements: job.requirements.clone(),
        }
    }
}

impl ReportSummary {
    pub fn from_entries(entries: &[BatchEntry]) -> Self {
        let mut summary = ReportSummary {
            documents: entries.len(),
            ..ReportSummary::default()
        };
        let mut total = 0.0;

        for entry in entries {
            match entry.status {
                BatchStatus::Completed => {
                    summary.completed += 1;
                    total += entry.score();
                }
                BatchStatus::TimedOut | BatchStatus::Failed => summary.failed += 1,
            }
            match entry.evaluation.score.decision {
                Decision::Excellent => summary.excellent += 1,
                Decision::Good => summary.good += 1,
                Decision::Weak => summary.weak += 1,
            }
            if entry.evaluation.extraction.confidence == Confidence::Low {
                summary.low_confidence += 1;
            }
        }

        if summary.completed > 0 {
            summary.average_score = (total / summary.completed as f64 * 100.0).round() / 100.0;
        }
        summary
    }
}

impl ScreeningReport {
    /// Build a report; entries are ranked best first
    pub fn new(job: &JobSpec, mut entries: Vec<BatchEntry>, processing_time_ms: u64, workers: usize, config: &Config) -> Self {
        rank(&mut entries);
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                screener_version: env!("CARGO_PKG_VERSION").to_string(),
                processing_time_ms,
                workers,
                fuzzy_algorithm: config.matching.algorithm,
                fuzzy_threshold: config.matching.fuzzy_threshold,
            },
            job: JobSummary::from(job),
            summary: ReportSummary::from_entries(&entries),
            entries,
        }
    }

    pub fn top(&self) -> Option<&BatchEntry> {
        self.entries.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Evaluation;

    fn entry(name: &str, score: f64, decision: Decision, status: BatchStatus) -> BatchEntry {
        let job = JobSpec::new("j", "Dev", ["Python"], Vec::<String>::new());
        let mut evaluation = Evaluation::unscored(&job, "fixture");
        evaluation.score.score = score;
        evaluation.score.decision = decision;
        BatchEntry {
            document: name.to_string(),
            status,
            error: None,
            elapsed_ms: 1,
            evaluation,
        }
    }

    #[test]
    fn test_report_ranks_and_summarizes() {
        let job = JobSpec::new("j", "Dev", ["Python"], ["Docker"]);
        let entries = vec![
            entry("weak.txt", 35.0, Decision::Weak, BatchStatus::Completed),
            entry("best.pdf", 92.5, Decision::Excellent, BatchStatus::Completed),
            entry("slow.pdf", 0.0, Decision::Weak, BatchStatus::TimedOut),
            entry("ok.md", 65.0, Decision::Good, BatchStatus::Completed),
        ];
        let report = ScreeningReport::new(&job, entries, 120, 2, &Config::default());

        assert_eq!(report.top().unwrap().document, "best.pdf");
        assert_eq!(report.entries.last().unwrap().document, "slow.pdf");
        assert_eq!(report.summary.documents, 4);
        assert_eq!(report.summary.completed, 3);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.excellent, 1);
        assert_eq!(report.summary.good, 1);
        assert_eq!(report.summary.weak, 2);
        assert_eq!(report.summary.average_score, 64.17);
        assert_eq!(report.job.preferred_skills, vec!["Docker"]);
    }

    #[test]
    fn test_empty_report() {
        let job = JobSpec::new("j", "Dev", Vec::<String>::new(), Vec::<String>::new());
        let report = ScreeningReport::new(&job, Vec::new(), 0, 1, &Config::default());
        assert!(report.top().is_none());
        assert_eq!(report.summary, ReportSummary::default());
    }
}
