//! Resume screener library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod pipeline;
pub mod processing;

pub use config::Config;
pub use error::{Result, ScreenerError};
pub use input::Document;
pub use pipeline::{Analysis, BatchEntry, BatchStatus, Evaluation, Pipeline};
pub use processing::contacts::ContactRecord;
pub use processing::job::JobSpec;
pub use processing::scoring::{Decision, ScoreRecord};
