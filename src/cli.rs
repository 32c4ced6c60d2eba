//! CLI interface for the resume screener

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-screener")]
#[command(about = "Screen and rank resumes against a job's skill requirements")]
#[command(long_about = "Extract text from PDF, Markdown and plain-text resumes, detect contacts, skills and education, and rank candidates with banded, capped scoring")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score and rank resumes against a job
    Screen {
        /// Job definition (TOML)
        #[arg(short, long)]
        job: PathBuf,

        /// Resume files (PDF, TXT, MD)
        #[arg(required = true)]
        resumes: Vec<PathBuf>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Number of concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-document timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Show contacts and rationale per candidate
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show what is extracted from a single resume
    Inspect {
        /// Resume file (PDF, TXT, MD)
        resume: PathBuf,

        /// Output format: console, json
        #[arg(short, long)]
        output: Option<String>,

        /// Include a preview of the extracted text
        #[arg(short, long)]
        detailed: bool,
    },

    /// Job definition commands
    Job {
        #[command(subcommand)]
        action: JobAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum JobAction {
    /// Build a job definition from a free-text description
    Parse {
        /// Job description file (TXT, MD)
        description: PathBuf,

        /// Job identifier
        #[arg(long)]
        id: String,

        /// Job title
        #[arg(long)]
        title: String,

        /// Write the job definition here instead of printing it
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        "markdown" | "md" => Ok(OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &std::path::Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
