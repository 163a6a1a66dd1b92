//! Core data types and error definitions for the summarization pipeline.

use crate::config::Config;
use crate::summarization::ServiceError;
use std::time::{Duration, Instant};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Suggested follow-up actions attached to every analysis. They do not depend on content.
pub const SUGGESTED_ACTIONS: [&str; 4] = [
    "Review the summary with the compliance team",
    "Verify each key point against the original document",
    "Identify internal policies affected by the document",
    "Schedule a follow-up review before the next compliance deadline",
];

/// Errors emitted by the summarization pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The document contains no words, so there is nothing to summarize.
    #[error("Document contains no extractable text")]
    EmptyDocument,
    /// The summarization service failed for one of the chunks.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The merged summary was still too long after the last allowed pass.
    #[error("Summary still has {words} words after {passes} summarization passes")]
    PassLimitExceeded {
        /// Number of passes performed.
        passes: usize,
        /// Word count of the merged summary when the budget ran out.
        words: usize,
    },
}

/// Errors raised while turning an uploaded file into a [`Document`].
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The upload could not be written to request-scoped storage.
    #[error("Failed to store upload: {0}")]
    Storage(#[source] std::io::Error),
    /// The stored upload could not be read back.
    #[error("Failed to read upload: {0}")]
    Read(#[source] std::io::Error),
    /// The PDF parser rejected the file.
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
    /// Extraction did not finish within the allotted time.
    #[error("PDF extraction timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    /// The blocking extraction task panicked or was cancelled.
    #[error("PDF extraction task failed: {0}")]
    Join(String),
}

/// Raw text extracted from an upload. Immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Original file name reported by the client.
    pub file_name: String,
    /// Extracted text.
    pub text: String,
    /// Number of characters (Unicode scalar values) in `text`.
    pub text_length: usize,
    /// Page count when the extractor could determine it.
    pub page_count: Option<usize>,
}

impl Document {
    /// Build a document, computing its character length.
    pub fn new(
        file_name: impl Into<String>,
        text: impl Into<String>,
        page_count: Option<usize>,
    ) -> Self {
        let text = text.into();
        Self {
            file_name: file_name.into(),
            text_length: text.chars().count(),
            text,
            page_count,
        }
    }

    /// Number of whitespace-separated words in the document.
    pub fn word_count(&self) -> usize {
        count_words(&self.text)
    }
}

/// Contiguous, word-bounded slice of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of the chunk in the document.
    pub index: usize,
    /// Words of the chunk joined by single spaces.
    pub text: String,
    /// Number of words in `text`.
    pub word_count: usize,
}

/// A sentence fragment lifted from the final summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPoint {
    /// One-based position among the extracted key points.
    pub index: usize,
    /// Trimmed sentence fragment.
    pub text: String,
}

impl KeyPoint {
    /// Display label, e.g. `Point 1: Deadline is June`.
    pub fn label(&self) -> String {
        format!("Point {}: {}", self.index, self.text)
    }
}

/// Processing metadata attached to every analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisMetadata {
    /// Original file name.
    pub file_name: String,
    /// Page count, when known.
    pub page_count: Option<usize>,
    /// Character length of the original document text.
    pub text_length: usize,
    /// RFC 3339 timestamp recorded when processing finished.
    pub processing_time: String,
    /// Chunks produced from the original document on the first pass.
    pub chunk_count: usize,
    /// Chunk/summarize/aggregate passes performed.
    pub summary_passes: usize,
    /// Wall-clock time spent in the pipeline.
    pub duration_ms: u64,
}

impl AnalysisMetadata {
    /// Capture metadata for `document`, stamping the current time.
    pub fn new(
        document: &Document,
        chunk_count: usize,
        summary_passes: usize,
        started: Instant,
    ) -> Self {
        Self {
            file_name: document.file_name.clone(),
            page_count: document.page_count,
            text_length: document.text_length,
            processing_time: current_timestamp(),
            chunk_count,
            summary_passes,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Completed analysis returned by [`crate::processing::AnalysisService::analyze`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    /// Final summary, at most the configured number of words.
    pub summary: String,
    /// Key points derived from the summary.
    pub key_points: Vec<KeyPoint>,
    /// Static suggested actions.
    pub actions: Vec<String>,
    /// Processing metadata.
    pub metadata: AnalysisMetadata,
}

/// Pipeline knobs derived from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Upper bound on words per chunk.
    pub chunk_max_words: usize,
    /// Longest merged summary returned without another pass.
    pub summary_max_words: usize,
    /// Maximum number of key points.
    pub max_key_points: usize,
    /// Maximum number of passes before giving up.
    pub max_passes: usize,
    /// Chunk summarization calls allowed in flight.
    pub concurrency: usize,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        Self {
            chunk_max_words: config.chunk_max_words,
            summary_max_words: config.summary_max_words,
            max_key_points: config.max_key_points,
            max_passes: config.max_summary_passes,
            concurrency: config.summarize_concurrency,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

pub(crate) fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

fn current_timestamp() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}
