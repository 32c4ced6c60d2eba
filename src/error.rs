//! Error handling for the resume screener

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Output formatting error: {0}")]
    OutputFormatting(String),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ScreenerError {
    fn from(err: anyhow::Error) -> Self {
        ScreenerError::Processing(err.to_string())
    }
}

impl From<toml::de::Error> for ScreenerError {
    fn from(err: toml::de::Error) -> Self {
        ScreenerError::Configuration(format!("Failed to parse TOML: {}", err))
    }
}

impl From<regex::Error> for ScreenerError {
    fn from(err: regex::Error) -> Self {
        ScreenerError::Configuration(format!("Invalid pattern: {}", err))
    }
}
