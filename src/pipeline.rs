//! Screening pipeline: extraction, contact parsing, skill normalization,
//! signal detection and scoring for one document or a batch.

use crate::config::Config;
use crate::error::Result;
use crate::input::document::Document;
use crate::input::ocr::OcrEngine;
use crate::input::text_extractor::{Confidence, ExtractionMethod, ExtractionResult, TextExtractor};
use crate::processing::contacts::{ContactParser, ContactRecord};
use crate::processing::job::JobSpec;
use crate::processing::scoring::{ScoreRecord, ScoringEngine};
use crate::processing::signals::{SignalDetector, TextSignals};
use crate::processing::skill_normalizer::{SkillMatchSet, SkillNormalizer};
use crate::processing::text_processor::non_whitespace_chars;
use crate::processing::vocabulary::SkillVocabulary;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// What the extractor produced, without the text itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub method: ExtractionMethod,
    pub confidence: Confidence,
    pub pages: usize,
    pub characters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&ExtractionResult> for ExtractionSummary {
    fn from(result: &ExtractionResult) -> Self {
        Self {
            method: result.method,
            confidence: result.confidence,
            pages: result.pages,
            characters: non_whitespace_chars(&result.text),
            note: result.note.clone(),
        }
    }
}

/// Everything extracted from a document, before scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(skip)]
    pub text: String,
    pub extraction: ExtractionSummary,
    pub contacts: ContactRecord,
    pub skills: SkillMatchSet,
    pub signals: TextSignals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub job_id: String,
    pub score: ScoreRecord,
    pub contacts: ContactRecord,
    pub extraction: ExtractionSummary,
    pub signals: TextSignals,
}

impl Evaluation {
    /// A failed evaluation: zero score, nothing extracted
    pub fn unscored(job: &JobSpec, reason: &str) -> Self {
        Self {
            job_id: job.id.clone(),
            score: ScoreRecord::unscored(job, reason),
            contacts: ContactRecord::default(),
            extraction: ExtractionSummary::from(&ExtractionResult::empty(reason)),
            signals: TextSignals::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    TimedOut,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub document: String,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub evaluation: Evaluation,
}

impl BatchEntry {
    pub fn score(&self) -> f64 {
        self.evaluation.score.score
    }
}

/// Sort by score, best first; equal scores by document name
pub fn rank(entries: &mut [BatchEntry]) {
    entries.sort_by(|a, b| {
        b.score()
            .total_cmp(&a.score())
            .then_with(|| a.document.cmp(&b.document))
    });
}

/// Stateless after construction; share it across tasks with `Arc`.
pub struct Pipeline {
    config: Config,
    extractor: TextExtractor,
    contacts: ContactParser,
    vocabulary: SkillVocabulary,
    normalizer: SkillNormalizer,
    signals: SignalDetector,
    scoring: ScoringEngine,
}

impl Pipeline {
    /// Validate `config` and build every stage. Any configuration problem
    /// fails here, before a document is touched.
    pub fn new(config: Config) -> Result<Self> {
        let extractor = TextExtractor::new(&config.extraction);
        Self::build(config, extractor)
    }

    /// Like [`Pipeline::new`] with a specific OCR engine
    pub fn with_ocr(config: Config, ocr: Arc<dyn OcrEngine>) -> Result<Self> {
        let extractor = TextExtractor::with_ocr(&config.extraction, ocr);
        Self::build(config, extractor)
    }

    fn build(config: Config, extractor: TextExtractor) -> Result<Self> {
        config.validate()?;

        let vocabulary = SkillVocabulary::from_config(&config.vocabulary)?;
        let contacts = ContactParser::new(&config.contacts)?;
        let signals = SignalDetector::new(&config.signals)?;
        let scoring = ScoringEngine::new(&config.scoring)?;
        let normalizer = SkillNormalizer::new(&config.matching);

        info!(
            "Pipeline ready: {} skills, fuzzy {:?} >= {}, OCR {}",
            vocabulary.len(),
            config.matching.algorithm,
            config.matching.fuzzy_threshold,
            if config.extraction.ocr_enabled { "on" } else { "off" }
        );

        Ok(Self {
            config,
            extractor,
            contacts,
            vocabulary,
            normalizer,
            signals,
            scoring,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    /// The job with skill names mapped to canonical vocabulary names
    pub fn normalize_job(&self, job: &JobSpec) -> JobSpec {
        job.canonicalized(&self.vocabulary)
    }

    /// Parse a free-text job description into a normalized job
    pub fn parse_job(&self, id: &str, title: &str, description: &str) -> JobSpec {
        self.normalize_job(&JobSpec::from_description(id, title, description, &self.signals))
    }

    /// Normalized job plus a vocabulary that can detect every skill it names
    fn prepare<'a>(&'a self, job: &JobSpec) -> (JobSpec, Cow<'a, SkillVocabulary>) {
        let job = self.normalize_job(job);
        let vocabulary = self.vocabulary.with_skills(job.all_skills());
        (job, vocabulary)
    }

    fn analyze_with(&self, bytes: &[u8], media_type: &str, vocabulary: &SkillVocabulary) -> Analysis {
        let extraction = self.extractor.extract(bytes, media_type);
        let text = extraction.text.as_str();

        let contacts = self.contacts.parse_contacts(text);
        let skills = self.normalizer.normalize_skills(text, vocabulary);
        let signals = self.signals.detect(text);

        debug!(
            "Analyzed document: {} skills, email {}, {} education signal(s)",
            skills.len(),
            if contacts.email.is_some() { "found" } else { "missing" },
            signals.education.len()
        );

        Analysis {
            extraction: ExtractionSummary::from(&extraction),
            text: extraction.text,
            contacts,
            skills,
            signals,
        }
    }

    /// Extract and analyze a document against the base vocabulary, without a job
    pub fn inspect(&self, bytes: &[u8], media_type: &str) -> Analysis {
        self.analyze_with(bytes, media_type, &self.vocabulary)
    }

    fn evaluate_prepared(
        &self,
        bytes: &[u8],
        media_type: &str,
        job: &JobSpec,
        vocabulary: &SkillVocabulary,
    ) -> Evaluation {
        let analysis = self.analyze_with(bytes, media_type, vocabulary);
        let score = self.scoring.score(job, &analysis.skills, &analysis.signals);

        Evaluation {
            job_id: job.id.clone(),
            score,
            contacts: analysis.contacts,
            extraction: analysis.extraction,
            signals: analysis.signals,
        }
    }

    /// Score one document against `job`. Never fails: unreadable input
    /// yields a complete `Weak` evaluation.
    pub fn evaluate(&self, bytes: &[u8], media_type: &str, job: &JobSpec) -> Evaluation {
        let (job, vocabulary) = self.prepare(job);
        self.evaluate_prepared(bytes, media_type, &job, &vocabulary)
    }

    pub fn evaluate_document(&self, document: &Document, job: &JobSpec) -> Evaluation {
        self.evaluate(&document.bytes, &document.media_type, job)
    }

    /// Worker count for batches: configured, or one per available core
    pub fn worker_count(&self) -> usize {
        self.config.batch.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Evaluate many documents against one job on a bounded pool of blocking
    /// workers. A document that fails or overruns the configured timeout
    /// becomes a zero-score entry; the others are unaffected. Entries keep
    /// input order.
    pub async fn evaluate_batch(self: &Arc<Self>, documents: Vec<Document>, job: &JobSpec) -> Vec<BatchEntry> {
        let (job, vocabulary) = self.prepare(job);
        let job = Arc::new(job);
        let vocabulary = Arc::new(vocabulary.into_owned());

        let workers = self.worker_count();
        let semaphore = Arc::new(Semaphore::new(workers));
        let limit = self.config.batch.document_timeout_secs.map(Duration::from_secs);

        info!(
            "Evaluating {} document(s) against '{}' with {} worker(s)",
            documents.len(),
            job.title,
            workers
        );

        let mut handles = Vec::with_capacity(documents.len());
        for document in documents {
            let name = document.name.clone();
            let pipeline = Arc::clone(self);
            let job = Arc::clone(&job);
            let vocabulary = Arc::clone(&vocabulary);
            let semaphore = Arc::clone(&semaphore);

            let handle = tokio::spawn(async move {
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => return Err((BatchStatus::Failed, e.to_string())),
                };
                let started = Instant::now();

                // The permit lives as long as the blocking work, even past a timeout
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    pipeline.evaluate_prepared(&document.bytes, &document.media_type, &job, &vocabulary)
                });

                let joined = match limit {
                    Some(limit) => match tokio::time::timeout(limit, work).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            return Err((
                                BatchStatus::TimedOut,
                                format!("timed out after {}s", limit.as_secs()),
                            ))
                        }
                    },
                    None => work.await,
                };

                joined
                    .map(|evaluation| (evaluation, started.elapsed()))
                    .map_err(|e| (BatchStatus::Failed, format!("evaluation aborted: {}", e)))
            });
            handles.push((name, handle));
        }

        let mut entries = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err((BatchStatus::Failed, format!("task failed: {}", e))));

            let entry = match outcome {
                Ok((evaluation, elapsed)) => {
                    debug!("{}: {:.2} ({})", name, evaluation.score.score, evaluation.score.decision);
                    BatchEntry {
                        document: name,
                        status: BatchStatus::Completed,
                        error: None,
                        elapsed_ms: elapsed.as_millis() as u64,
                        evaluation,
                    }
                }
                Err((status, reason)) => {
                    warn!("{}: {}", name, reason);
                    BatchEntry {
                        document: name,
                        status,
                        evaluation: Evaluation::unscored(&job, &reason),
                        error: Some(reason),
                        elapsed_ms: 0,
                    }
                }
            };
            entries.push(entry);
        }

        entries
    }
}
