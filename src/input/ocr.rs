//! Optical character recognition for scanned PDFs

use crate::config::ExtractionConfig;
use crate::error::{Result, ScreenerError};
use anyhow::{bail, Context};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Recognizes text on the rendered pages of a PDF.
pub trait OcrEngine: Send + Sync {
    /// Text of the first `max_pages` pages, joined with newlines in page order
    fn recognize_pdf(&self, pdf: &[u8], max_pages: usize) -> Result<String>;

    fn name(&self) -> &str;
}

/// Used when OCR is switched off; recognizes nothing
pub struct DisabledOcr;

impl OcrEngine for DisabledOcr {
    fn recognize_pdf(&self, _pdf: &[u8], _max_pages: usize) -> Result<String> {
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Renders pages with poppler's `pdftoppm` and reads them with `tesseract`
pub struct TesseractOcr {
    pdftoppm: PathBuf,
    tesseract: PathBuf,
    dpi: u32,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            pdftoppm: config.pdftoppm_path.clone(),
            tesseract: config.tesseract_path.clone(),
            dpi: config.ocr_dpi,
            language: config.ocr_language.clone(),
        }
    }

    fn render_pages(&self, pdf_path: &Path, out_dir: &Path, max_pages: usize) -> anyhow::Result<Vec<PathBuf>> {
        let prefix = out_dir.join("page");
        let output = Command::new(&self.pdftoppm)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg("-f")
            .arg("1")
            .arg("-l")
            .arg(max_pages.to_string())
            .arg(pdf_path)
            .arg(&prefix)
            .output()
            .with_context(|| format!("failed to run {}", self.pdftoppm.display()))?;

        if !output.status.success() {
            bail!(
                "pdftoppm exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let mut pages: Vec<(u32, PathBuf)> = std::fs::read_dir(out_dir)
            .context("failed to list rendered pages")?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter_map(|path| page_number(&path).map(|n| (n, path)))
            .collect();
        pages.sort_by_key(|(n, _)| *n);

        Ok(pages.into_iter().map(|(_, path)| path).collect())
    }

    fn recognize_image(&self, image: &Path) -> anyhow::Result<String> {
        let output = Command::new(&self.tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .output()
            .with_context(|| format!("failed to run {}", self.tesseract.display()))?;

        if !output.status.success() {
            bail!(
                "tesseract exited with {} on {}: {}",
                output.status,
                image.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run(&self, pdf: &[u8], max_pages: usize) -> anyhow::Result<String> {
        let workdir = tempfile::tempdir().context("failed to create OCR scratch directory")?;
        let pdf_path = workdir.path().join("input.pdf");
        std::fs::write(&pdf_path, pdf).context("failed to write PDF for rendering")?;

        let pages = self.render_pages(&pdf_path, workdir.path(), max_pages)?;
        debug!("Rendered {} page(s) at {} dpi for OCR", pages.len(), self.dpi);

        let mut texts = Vec::with_capacity(pages.len());
        for page in &pages {
            texts.push(self.recognize_image(page)?);
        }
        Ok(texts.join("\n"))
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize_pdf(&self, pdf: &[u8], max_pages: usize) -> Result<String> {
        self.run(pdf, max_pages)
            .map_err(|e| ScreenerError::Ocr(format!("{:#}", e)))
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// `page-07.png` -> 7
fn page_number(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix("page-")?.parse().ok()
}
