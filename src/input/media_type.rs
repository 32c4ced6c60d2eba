//! Declared media types

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Pdf,
    PlainText,
    Markdown,
}

impl MediaType {
    /// Parse a declared media type such as `"application/pdf"` or
    /// `"text/plain; charset=utf-8"`. Parameters and case are ignored.
    pub fn parse(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/pdf" | "application/x-pdf" => Some(MediaType::Pdf),
            "text/plain" => Some(MediaType::PlainText),
            "text/markdown" | "text/x-markdown" => Some(MediaType::Markdown),
            _ => None,
        }
    }

    /// Media type to declare for a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(MediaType::Pdf),
            "txt" | "text" => Some(MediaType::PlainText),
            "md" | "markdown" => Some(MediaType::Markdown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::PlainText => "text/plain",
            MediaType::Markdown => "text/markdown",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_case_and_parameters() {
        assert_eq!(MediaType::parse("application/pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::parse("Application/PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::parse("text/plain; charset=utf-8"), Some(MediaType::PlainText));
        assert_eq!(MediaType::parse(" text/x-markdown "), Some(MediaType::Markdown));
    }

    #[test]
    fn test_parse_rejects_unknown_types() {
        assert_eq!(MediaType::parse("image/png"), None);
        assert_eq!(MediaType::parse(""), None);
        assert_eq!(MediaType::parse("pdf"), None);
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(MediaType::from_extension("PDF"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_extension("md"), Some(MediaType::Markdown));
        assert_eq!(MediaType::from_extension("docx"), None);
        assert_eq!(MediaType::Markdown.to_string(), "text/markdown");
    }
}
