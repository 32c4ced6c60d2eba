//! Output formatters for screening reports and single-document inspection

use crate::config::OutputFormat;
use crate::error::{Result, ScreenerError};
use crate::input::Confidence;
use crate::output::report::ScreeningReport;
use crate::pipeline::{Analysis, BatchEntry, BatchStatus};
use crate::processing::contacts::ContactRecord;
use crate::processing::scoring::Decision;
use crate::processing::skill_normalizer::{MatchMode, SkillMatchSet};
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting screening reports
pub trait OutputFormatter {
    fn format_report(&self, report: &ScreeningReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Colored terminal output
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Dispatches to the formatter for the requested format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_decision_badge(&self, decision: Decision) -> String {
        let color = match decision {
            Decision::Excellent => Color::Green,
            Decision::Good => Color::Yellow,
            Decision::Weak => Color::Red,
        };
        let label = decision.to_string().to_uppercase();

        if self.use_colors {
            format!("[{}]", label.color(color).bold())
        } else {
            format!("[{}]", label)
        }
    }

    fn format_skills(&self, skills: &SkillMatchSet) -> String {
        let mut output = String::new();
        for m in skills.iter() {
            let detail = match (m.mode, m.similarity) {
                (MatchMode::Fuzzy, Some(similarity)) => format!("fuzzy {:.1}, '{}'", similarity, m.mention),
                (MatchMode::Alias, _) => format!("alias '{}'", m.mention),
                _ => "exact".to_string(),
            };
            output.push_str(&format!("  • {} ({})\n", m.skill, detail));
        }
        output
    }

    fn format_contacts(&self, contacts: &ContactRecord) -> String {
        let missing = || self.colorize("not found", Color::BrightBlack);
        let mut output = String::new();
        output.push_str(&format!(
            "  Name:  {}\n",
            contacts.name.clone().unwrap_or_else(missing)
        ));
        output.push_str(&format!(
            "  Email: {}\n",
            contacts.email.clone().unwrap_or_else(missing)
        ));
        output.push_str(&format!(
            "  Phone: {}\n",
            contacts
                .phone
                .as_ref()
                .map(|p| format!("{} ({})", p.display, p.normalized))
                .unwrap_or_else(missing)
        ));
        if !contacts.links.is_empty() {
            output.push_str(&format!("  Links: {}\n", contacts.links.join(", ")));
        }
        output
    }

    fn format_entry(&self, rank: usize, entry: &BatchEntry) -> String {
        let evaluation = &entry.evaluation;
        let score = &evaluation.score;
        let mut output = format!(
            "{:>3}. {:<32} {:>6.2} {}",
            rank,
            entry.document,
            score.score,
            self.format_decision_badge(score.decision)
        );

        if entry.status != BatchStatus::Completed {
            let reason = entry.error.as_deref().unwrap_or("failed");
            output.push_str(&format!("  {}", self.colorize(reason, Color::Red)));
        } else {
            output.push_str(&format!(
                "  mandatory {}/{}, preferred {}/{}",
                score.mandatory_matched,
                score.mandatory_matched + score.missing_mandatory.len(),
                score.preferred_matched,
                score.preferred_matched + score.missing_preferred.len()
            ));
            if evaluation.extraction.confidence == Confidence::Low {
                output.push_str(&self.colorize("  (low confidence)", Color::Yellow));
            }
        }
        output.push('\n');

        if self.detailed && entry.status == BatchStatus::Completed {
            if let Some(name) = &evaluation.contacts.name {
                output.push_str(&format!("       Candidate: {}\n", name));
            }
            if let Some(email) = &evaluation.contacts.email {
                output.push_str(&format!("       Email: {}\n", email));
            }
            output.push_str(&format!("       {}\n", score.rationale));
        }

        output
    }

    /// Human-readable view of a single analyzed document
    pub fn format_analysis(&self, name: &str, analysis: &Analysis) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header(&format!("DOCUMENT INSPECTION: {}", name), 1));

        let extraction = &analysis.extraction;
        output.push_str(&format!(
            "Extraction: {:?} ({:?} confidence), {} page(s), {} characters\n",
            extraction.method, extraction.confidence, extraction.pages, extraction.characters
        ));
        if let Some(note) = &extraction.note {
            output.push_str(&format!("Note: {}\n", self.colorize(note, Color::Yellow)));
        }

        output.push_str(&self.format_header("Contacts", 2));
        output.push_str(&self.format_contacts(&analysis.contacts));

        output.push_str(&self.format_header(&format!("Skills ({})", analysis.skills.len()), 2));
        if analysis.skills.is_empty() {
            output.push_str("  none detected\n");
        } else {
            output.push_str(&self.format_skills(&analysis.skills));
        }

        let signals = &analysis.signals;
        output.push_str(&self.format_header("Signals", 2));
        output.push_str(&format!(
            "  Education: {}\n",
            if signals.education.is_empty() { "none".to_string() } else { signals.education.join(", ") }
        ));
        output.push_str(&format!(
            "  Experience: {}\n",
            if signals.experience_phrases.is_empty() {
                "none".to_string()
            } else {
                signals.experience_phrases.join(", ")
            }
        ));
        if let Some(years) = signals.years_experience {
            output.push_str(&format!("  Years of experience: {}\n", years));
        }

        if self.detailed && !analysis.text.is_empty() {
            output.push_str(&self.format_header("Text Preview", 3));
            output.push_str(&truncate_text(&analysis.text, 600));
            output.push('\n');
        }

        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &ScreeningReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME SCREENING REPORT", 1));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms | Workers: {}\n",
            report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.metadata.processing_time_ms,
            report.metadata.workers
        ));

        output.push_str(&self.format_header(&format!("Job: {} ({})", report.job.title, report.job.id), 2));
        output.push_str(&format!(
            "Mandatory: {}\n",
            if report.job.mandatory_skills.is_empty() {
                "none".to_string()
            } else {
                report.job.mandatory_skills.join(", ")
            }
        ));
        output.push_str(&format!(
            "Preferred: {}\n",
            if report.job.preferred_skills.is_empty() {
                "none".to_string()
            } else {
                report.job.preferred_skills.join(", ")
            }
        ));

        let summary = &report.summary;
        output.push_str(&self.format_header("Summary", 2));
        output.push_str(&format!(
            "{} document(s): {} {}, {} {}, {} {}",
            summary.documents,
            summary.excellent,
            self.colorize("excellent", Color::Green),
            summary.good,
            self.colorize("good", Color::Yellow),
            summary.weak,
            self.colorize("weak", Color::Red)
        ));
        if summary.failed > 0 {
            output.push_str(&format!(", {} failed", summary.failed));
        }
        output.push_str(&format!("\nAverage score: {:.2}\n", summary.average_score));

        output.push_str(&self.format_header("Ranking", 2));
        if report.entries.is_empty() {
            output.push_str("No documents screened.\n");
        }
        for (i, entry) in report.entries.iter().enumerate() {
            output.push_str(&self.format_entry(i + 1, entry));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &ScreeningReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &ScreeningReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("# Screening Report: {}\n\n", report.job.title));

        if self.include_metadata {
            output.push_str(&format!(
                "**Generated:** {} | **Processing Time:** {}ms | **Version:** {}\n\n",
                report.metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
                report.metadata.processing_time_ms,
                report.metadata.screener_version
            ));
        }

        output.push_str("## Job Requirements\n\n");
        output.push_str(&format!("- **Mandatory:** {}\n", report.job.mandatory_skills.join(", ")));
        output.push_str(&format!("- **Preferred:** {}\n", report.job.preferred_skills.join(", ")));
        if !report.job.requirements.required_education.is_empty() {
            output.push_str(&format!(
                "- **Education:** {}\n",
                report.job.requirements.required_education.join(" or ")
            ));
        }
        if let Some(years) = report.job.requirements.min_years_experience {
            output.push_str(&format!("- **Experience:** {}+ years\n", years));
        }

        output.push_str("\n## Ranking\n\n");
        output.push_str("| # | Document | Score | Decision | Mandatory | Preferred | Status |\n");
        output.push_str("|---|----------|-------|----------|-----------|-----------|--------|\n");
        for (i, entry) in report.entries.iter().enumerate() {
            let score = &entry.evaluation.score;
            let status = match entry.status {
                BatchStatus::Completed => "completed".to_string(),
                _ => Self::escape_cell(entry.error.as_deref().unwrap_or("failed")),
            };
            output.push_str(&format!(
                "| {} | {} | {:.2} | {} | {}/{} | {}/{} | {} |\n",
                i + 1,
                Self::escape_cell(&entry.document),
                score.score,
                score.decision,
                score.mandatory_matched,
                score.mandatory_matched + score.missing_mandatory.len(),
                score.preferred_matched,
                score.preferred_matched + score.missing_preferred.len(),
                status
            ));
        }

        output.push_str("\n## Details\n\n");
        for entry in &report.entries {
            let evaluation = &entry.evaluation;
            output.push_str(&format!("### {}\n\n", entry.document));
            if let Some(name) = &evaluation.contacts.name {
                output.push_str(&format!("- **Candidate:** {}\n", name));
            }
            if let Some(email) = &evaluation.contacts.email {
                output.push_str(&format!("- **Email:** {}\n", email));
            }
            if let Some(phone) = &evaluation.contacts.phone {
                output.push_str(&format!("- **Phone:** {}\n", phone.display));
            }
            output.push_str(&format!(
                "- **Extraction:** {:?}, {:?} confidence\n",
                evaluation.extraction.method, evaluation.extraction.confidence
            ));
            output.push_str(&format!("\n{}\n\n", evaluation.score.rationale));
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(true, false),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn with_options(use_colors: bool, detailed: bool, pretty_json: bool, include_metadata: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(pretty_json),
            markdown_formatter: MarkdownFormatter::new(include_metadata),
        }
    }

    pub fn generate_report(&self, report: &ScreeningReport, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
            OutputFormat::Markdown => self.markdown_formatter.format_report(report),
        }
    }

    /// Single-document view; Markdown falls back to the console layout
    pub fn generate_analysis(&self, name: &str, analysis: &Analysis, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(analysis)?),
            OutputFormat::Console | OutputFormat::Markdown => {
                Ok(self.console_formatter.format_analysis(name, analysis))
            }
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content).map_err(|e| {
        ScreenerError::OutputFormatting(format!("Failed to write '{}': {}", file_path.display(), e))
    })
}

pub fn suggest_filename(format: &OutputFormat, job_id: &str, timestamp: bool) -> String {
    let base: String = job_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    let timestamp_suffix = if timestamp {
        format!("_{}", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        String::new()
    };

    let extension = match format {
        OutputFormat::Console => "txt",
        OutputFormat::Json => "json",
        OutputFormat::Markdown => "md",
    };
    format!("{}_screening{}.{}", base, timestamp_suffix, extension)
}

/// First `max_chars` characters, cut at a char boundary
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
