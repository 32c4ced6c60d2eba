//! Text extraction from PDF, plain text and Markdown documents

use crate::config::ExtractionConfig;
use crate::error::{Result, ScreenerError};
use crate::input::media_type::MediaType;
use crate::input::ocr::{DisabledOcr, OcrEngine, TesseractOcr};
use crate::processing::text_processor::{alphanumeric_chars, non_whitespace_chars};
use log::{debug, info, warn};
use pulldown_cmark::{Event, Parser, Tag};
use serde::{Deserialize, Serialize};
use std::panic;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Direct,
    Ocr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub method: ExtractionMethod,
    pub confidence: Confidence,
    pub pages: usize,
    /// Why the result is degraded, when it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ExtractionResult {
    pub fn direct(text: String, pages: usize) -> Self {
        Self {
            text,
            method: ExtractionMethod::Direct,
            confidence: Confidence::High,
            pages,
            note: None,
        }
    }

    /// No usable text
    pub fn empty(note: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            method: ExtractionMethod::Direct,
            confidence: Confidence::Low,
            pages: 0,
            note: Some(note.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extraction for one document format
pub trait FormatExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult>;
}

/// PDF text layer with an OCR fallback for scanned pages
pub struct PdfExtractor {
    ocr: Arc<dyn OcrEngine>,
    min_chars_per_page: usize,
    max_ocr_pages: usize,
}

impl PdfExtractor {
    pub fn new(config: &ExtractionConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            ocr,
            min_chars_per_page: config.min_chars_per_page,
            max_ocr_pages: config.max_ocr_pages,
        }
    }

    /// True when the text layer carries enough characters per page to be trusted
    pub fn is_dense(&self, text: &str, pages: usize) -> bool {
        let per_page = non_whitespace_chars(text) as f64 / pages.max(1) as f64;
        per_page > self.min_chars_per_page as f64
    }

    fn text_layer(bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed documents
        let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ScreenerError::PdfExtraction(e.to_string())),
            Err(_) => Err(ScreenerError::PdfExtraction(
                "text extraction aborted on malformed content".to_string(),
            )),
        }
    }
}

impl FormatExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let pages = lopdf::Document::load_mem(bytes)
            .map_err(|e| ScreenerError::PdfExtraction(format!("Unreadable PDF: {}", e)))?
            .get_pages()
            .len();

        let direct = Self::text_layer(bytes).unwrap_or_else(|e| {
            warn!("No text layer extracted: {}", e);
            String::new()
        });

        if self.is_dense(&direct, pages) {
            return Ok(ExtractionResult::direct(direct, pages));
        }

        debug!(
            "Sparse text layer ({} chars over {} page(s)), trying OCR with {}",
            non_whitespace_chars(&direct),
            pages,
            self.ocr.name()
        );

        let recognized = if pages == 0 {
            String::new()
        } else {
            self.ocr
                .recognize_pdf(bytes, pages.min(self.max_ocr_pages))
                .unwrap_or_else(|e| {
                    warn!("OCR failed: {}", e);
                    String::new()
                })
        };

        if alphanumeric_chars(&recognized) > alphanumeric_chars(&direct) {
            info!("Using OCR text for {} page(s)", pages.min(self.max_ocr_pages));
            return Ok(ExtractionResult {
                text: recognized,
                method: ExtractionMethod::Ocr,
                confidence: Confidence::Low,
                pages,
                note: Some("text layer too sparse, recognized with OCR".to_string()),
            });
        }

        let note = if direct.trim().is_empty() {
            "no text layer and OCR found no text"
        } else {
            "sparse text layer and OCR found nothing better"
        };
        Ok(ExtractionResult {
            text: direct,
            method: ExtractionMethod::Direct,
            confidence: Confidence::Low,
            pages,
            note: Some(note.to_string()),
        })
    }
}

pub struct PlainTextExtractor;

impl FormatExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let text = String::from_utf8_lossy(bytes);
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);
        Ok(ExtractionResult::direct(text.to_string(), 1))
    }
}

/// Renders Markdown to plain text; link targets are kept so profile URLs survive
pub struct MarkdownExtractor;

impl MarkdownExtractor {
    fn markdown_to_text(markdown: &str) -> String {
        let mut text = String::new();
        let mut link_target: Option<String> = None;

        for event in Parser::new(markdown) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::Start(Tag::Link(_, dest, _)) => link_target = Some(dest.to_string()),
                Event::End(Tag::Link(..)) => {
                    if let Some(dest) = link_target.take() {
                        let dest = dest.strip_prefix("mailto:").unwrap_or(&dest);
                        if !dest.is_empty() && !text.ends_with(dest) {
                            text.push_str(" (");
                            text.push_str(dest);
                            text.push(')');
                        }
                    }
                }
                Event::End(Tag::TableCell) => text.push(' '),
                Event::End(
                    Tag::Paragraph | Tag::Heading(..) | Tag::Item | Tag::CodeBlock(_) | Tag::TableRow | Tag::TableHead,
                ) => text.push('\n'),
                _ => {}
            }
        }

        text
    }
}

impl FormatExtractor for MarkdownExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractionResult> {
        let markdown = String::from_utf8_lossy(bytes);
        Ok(ExtractionResult::direct(Self::markdown_to_text(&markdown), 1))
    }
}

/// Picks the extractor for a declared media type. Never fails: problems
/// degrade into an empty, low-confidence result with a note.
pub struct TextExtractor {
    pdf: PdfExtractor,
    plain: PlainTextExtractor,
    markdown: MarkdownExtractor,
}

impl TextExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        let ocr: Arc<dyn OcrEngine> = if config.ocr_enabled {
            Arc::new(TesseractOcr::new(config))
        } else {
            Arc::new(DisabledOcr)
        };
        Self::with_ocr(config, ocr)
    }

    pub fn with_ocr(config: &ExtractionConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self {
            pdf: PdfExtractor::new(config, ocr),
            plain: PlainTextExtractor,
            markdown: MarkdownExtractor,
        }
    }

    pub fn extract(&self, bytes: &[u8], media_type: &str) -> ExtractionResult {
        if bytes.is_empty() {
            return ExtractionResult::empty("document is empty");
        }

        let media = match MediaType::parse(media_type) {
            Some(media) => media,
            None => {
                warn!("Unsupported media type '{}'", media_type);
                return ExtractionResult::empty(format!("unsupported media type '{}'", media_type));
            }
        };

        let extractor: &dyn FormatExtractor = match media {
            MediaType::Pdf => &self.pdf,
            MediaType::PlainText => &self.plain,
            MediaType::Markdown => &self.markdown,
        };

        match extractor.extract(bytes) {
            Ok(result) => {
                debug!(
                    "Extracted {} chars from {} ({:?}, {:?})",
                    result.text.len(),
                    media,
                    result.method,
                    result.confidence
                );
                result
            }
            Err(e) => {
                warn!("Extraction failed for {}: {}", media, e);
                ExtractionResult::empty(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> TextExtractor {
        TextExtractor::with_ocr(&ExtractionConfig::default(), Arc::new(DisabledOcr))
    }

    #[test]
    fn test_plain_text_is_decoded_lossily() {
        let result = extractor().extract(b"\xEF\xBB\xBFJane Doe\nPython \xFF SQL", "text/plain");
        assert_eq!(result.method, ExtractionMethod::Direct);
        assert_eq!(result.confidence, Confidence::High);
        assert!(result.text.starts_with("Jane Doe"));
        assert!(result.text.contains("Python \u{FFFD} SQL"));
    }

    #[test]
    fn test_markdown_keeps_text_and_link_targets() {
        let md = "# Jane Doe\n\n**Skills:** Rust, `SQL`\n\n- [GitHub](https://github.com/jane)\n- [Email](mailto:jane@example.com)\n";
        let result = extractor().extract(md.as_bytes(), "text/markdown");
        assert!(result.text.contains("Jane Doe\n"));
        assert!(result.text.contains("Skills: Rust, SQL"));
        assert!(result.text.contains("GitHub (https://github.com/jane)"));
        assert!(result.text.contains("Email (jane@example.com)"));
    }

    #[test]
    fn test_empty_and_unsupported_inputs_degrade() {
        let e = extractor();

        let empty = e.extract(b"", "application/pdf");
        assert!(empty.is_empty());
        assert_eq!(empty.confidence, Confidence::Low);
        assert_eq!(empty.note.as_deref(), Some("document is empty"));

        let unsupported = e.extract(b"GIF89a", "image/gif");
        assert!(unsupported.is_empty());
        assert!(unsupported.note.unwrap().contains("image/gif"));
    }

    #[test]
    fn test_corrupt_pdf_degrades_to_empty() {
        let result = extractor().extract(b"%PDF-1.4 this is not really a pdf", "application/pdf");
        assert!(result.is_empty());
        assert_eq!(result.confidence, Confidence::Low);
        assert!(result.note.is_some());
    }

    #[test]
    fn test_density_predicate() {
        let pdf = PdfExtractor::new(&ExtractionConfig::default(), Arc::new(DisabledOcr));
        let twenty = "a".repeat(20);
        let twenty_one = "a".repeat(21);
        assert!(!pdf.is_dense(&twenty, 1));
        assert!(pdf.is_dense(&twenty_one, 1));
        assert!(!pdf.is_dense(&format!("{} {}", twenty, twenty), 2));
        assert!(pdf.is_dense(&format!("{} {}", twenty_one, twenty_one), 2));
        // No pages counts as one
        assert!(pdf.is_dense(&twenty_one, 0));
        assert!(!pdf.is_dense("  \n\t ", 1));
    }
}
