//! Resume screener: rank resumes against a job's skill requirements

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use resume_screener::cli::{self, Cli, Commands, ConfigAction, JobAction};
use resume_screener::config::{Config, OutputFormat};
use resume_screener::input::Document;
use resume_screener::output::formatter::save_report_to_file;
use resume_screener::output::{ReportGenerator, ScreeningReport};
use resume_screener::processing::job::JobSpec;
use resume_screener::{Pipeline, Result, ScreenerError};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, mut config: Config) -> Result<()> {
    match command {
        Commands::Screen {
            job,
            resumes,
            output,
            save,
            workers,
            timeout,
            detailed,
        } => {
            cli::validate_file_extension(&job, &["toml"])
                .map_err(|e| ScreenerError::InvalidInput(format!("Job file: {}", e)))?;
            let format = resolve_format(output.as_deref(), &config)?;

            if workers.is_some() {
                config.batch.workers = workers;
            }
            if timeout.is_some() {
                config.batch.document_timeout_secs = timeout;
            }
            let detailed = detailed || config.output.detailed;
            let use_colors = config.output.color_output && save.is_none();

            let job = JobSpec::load(&job)?;
            if !job.has_skills() {
                warn!("Job '{}' lists no skills; every candidate will rank as weak", job.id);
            }

            let mut documents = Vec::with_capacity(resumes.len());
            for path in &resumes {
                documents.push(Document::load(path).await?);
            }

            let pipeline = Arc::new(Pipeline::new(config)?);
            let workers = pipeline.worker_count();

            let spinner = batch_spinner(documents.len());
            let started = Instant::now();
            let entries = pipeline.evaluate_batch(documents, &job).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            spinner.finish_and_clear();

            info!("Screened {} document(s) in {}ms", entries.len(), elapsed_ms);

            let job = pipeline.normalize_job(&job);
            let report = ScreeningReport::new(&job, entries, elapsed_ms, workers, pipeline.config());
            let generator = ReportGenerator::with_options(use_colors, detailed, true, true);
            let rendered = generator.generate_report(&report, &format)?;

            match save {
                Some(path) => {
                    save_report_to_file(&rendered, &path)?;
                    println!("Report saved to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Inspect {
            resume,
            output,
            detailed,
        } => {
            let format = resolve_format(output.as_deref(), &config)?;
            let detailed = detailed || config.output.detailed;
            let use_colors = config.output.color_output;

            let document = Document::load(&resume).await?;
            let pipeline = Pipeline::new(config)?;
            let analysis = pipeline.inspect(&document.bytes, &document.media_type);

            let generator = ReportGenerator::with_options(use_colors, detailed, true, true);
            println!("{}", generator.generate_analysis(&document.name, &analysis, &format)?);
        }

        Commands::Job { action } => match action {
            JobAction::Parse {
                description,
                id,
                title,
                save,
            } => {
                cli::validate_file_extension(&description, &["txt", "md"])
                    .map_err(|e| ScreenerError::InvalidInput(format!("Job description file: {}", e)))?;
                let text = tokio::fs::read_to_string(&description).await?;

                let pipeline = Pipeline::new(config)?;
                let job = pipeline.parse_job(&id, &title, &text);
                if !job.has_skills() {
                    warn!("No skills found in {}", description.display());
                }

                match save {
                    Some(path) => {
                        job.save(&path)?;
                        println!(
                            "Job '{}' saved to {} ({} mandatory, {} preferred)",
                            job.id,
                            path.display(),
                            job.mandatory_skills.len(),
                            job.preferred_skills.len()
                        );
                    }
                    None => print!("{}", job.to_toml()?),
                }
            }
        },

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                config.validate()?;
                print!("{}", render_config(&config)?);
            }

            Some(ConfigAction::Reset) => {
                Config::default().save()?;
                println!("Configuration reset to defaults at {}", Config::config_path().display());
            }

            Some(ConfigAction::Path) => {
                println!("{}", Config::config_path().display());
            }
        },
    }

    Ok(())
}

fn resolve_format(requested: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match requested {
        Some(format) => cli::parse_output_format(format).map_err(ScreenerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn render_config(config: &Config) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| ScreenerError::Configuration(format!("Failed to serialize config: {}", e)))
}

fn batch_spinner(documents: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Screening {} document(s)", documents));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
