//! PDF text extraction behind a small trait.
//!
//! The pipeline only needs "a string and maybe a page count"; how PDF bytes become text is an
//! implementation detail of the adapter. [`PdfTextExtractor`] delegates to `pdf-extract` on a
//! blocking thread and bounds the work with a timeout.

use crate::processing::ExtractionError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Default time budget for extracting one document.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Text pulled out of a stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page texts joined by blank lines.
    pub text: String,
    /// Number of pages in the source file.
    pub page_count: usize,
}

/// Interface implemented by text extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from the file stored at `path`.
    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError>;
}

/// `pdf-extract` backed extractor.
pub struct PdfTextExtractor {
    timeout: Duration,
}

impl PdfTextExtractor {
    /// Create an extractor with the given time budget.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTION_TIMEOUT)
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
        let bytes = tokio::fs::read(path).await.map_err(ExtractionError::Read)?;
        tracing::debug!(bytes = bytes.len(), path = %path.display(), "Extracting PDF text");

        let pages = tokio::time::timeout(
            self.timeout,
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes)),
        )
        .await
        .map_err(|_| ExtractionError::Timeout(self.timeout))?
        .map_err(|error| ExtractionError::Join(error.to_string()))?
        .map_err(|error| ExtractionError::Parse(error.to_string()))?;

        let page_count = pages.len();
        let text = join_pages(pages);
        tracing::info!(page_count, chars = text.chars().count(), "PDF text extraction complete");
        Ok(ExtractedText { text, page_count })
    }
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
