//! Page-ordered text extraction. PDFs go through `pdf-extract`; plain text
//! files are split into pages on form feeds.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error reading {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("PDF extraction failed for {path}: {reason}")]
    Pdf { path: String, reason: String },

    #[error("No extractor for {0}")]
    Unsupported(String),
}

/// Pages as `(1-based page number, text)` in document order.
pub type Pages = Vec<(u32, String)>;

pub trait DocumentExtractor: Send + Sync {
    fn supports(&self, path: &Path) -> bool;
    fn extract(&self, path: &Path) -> Result<Pages, ExtractError>;
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|s| s.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn number_pages(pages: impl IntoIterator<Item = String>) -> Pages {
    pages.into_iter().enumerate().map(|(i, text)| (u32::try_from(i + 1).unwrap_or(u32::MAX), text)).collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl DocumentExtractor for PdfExtractor {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, "pdf")
    }

    fn extract(&self, path: &Path) -> Result<Pages, ExtractError> {
        let pages = pdf_extract::extract_text_by_pages(path)
            .map_err(|e| ExtractError::Pdf { path: path.display().to_string(), reason: e.to_string() })?;
        Ok(number_pages(pages))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn split_pages(content: &str) -> Pages {
        number_pages(content.split('\u{000C}').map(str::to_string))
    }
}

impl DocumentExtractor for PlainTextExtractor {
    fn supports(&self, path: &Path) -> bool {
        has_extension(path, "txt") || has_extension(path, "md")
    }

    fn extract(&self, path: &Path) -> Result<Pages, ExtractError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Io { path: path.display().to_string(), source })?;
        let content = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Self::split_pages(&content))
    }
}

/// Dispatches on file extension to the first extractor that supports it.
pub struct ExtractorSet {
    extractors: Vec<Box<dyn DocumentExtractor>>,
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self { extractors: vec![Box::new(PdfExtractor), Box::new(PlainTextExtractor)] }
    }
}

impl ExtractorSet {
    pub fn new(extractors: Vec<Box<dyn DocumentExtractor>>) -> Self {
        Self { extractors }
    }

    pub fn supports(&self, path: &Path) -> bool {
        self.extractors.iter().any(|e| e.supports(path))
    }

    pub fn extract(&self, path: &Path) -> Result<Pages, ExtractError> {
        self.extractors
            .iter()
            .find(|e| e.supports(path))
            .ok_or_else(|| ExtractError::Unsupported(path.display().to_string()))?
            .extract(path)
    }
}
