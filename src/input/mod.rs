//! Input processing module
//! Handles media types, document loading, text extraction and OCR

pub mod document;
pub mod media_type;
pub mod ocr;
pub mod text_extractor;

pub use document::Document;
pub use media_type::MediaType;
pub use text_extractor::{Confidence, ExtractionMethod, ExtractionResult, TextExtractor};
