//! Analysis service coordinating extraction, chunking, summarization, and key-point extraction.

use crate::{
    config::Config,
    extraction::{PdfTextExtractor, TextExtractor},
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        aggregate::{Aggregation, aggregate},
        chunking::chunk_text,
        key_points::extract_key_points,
        types::{
            AnalysisMetadata, Chunk, Document, ExtractionError, PipelineError, PipelineResult,
            PipelineSettings, SUGGESTED_ACTIONS, count_words,
        },
    },
    summarization::{HealthReport, HttpSummarizerClient, ServiceError, SummarizerClient},
    upload::ScopedUpload,
};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt, stream};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Runs the summarization pipeline for one document at a time.
///
/// The service owns long-lived handles to the summarizer client, the text extractor, and the
/// metrics registry. Every [`AnalysisService::analyze`] call works on its own document, chunks,
/// and intermediate summaries; nothing is shared between concurrent requests except the
/// counters. Construct it once at startup and share it through an `Arc`.
pub struct AnalysisService {
    summarizer: Box<dyn SummarizerClient>,
    extractor: Box<dyn TextExtractor>,
    settings: PipelineSettings,
    upload_dir: PathBuf,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the analysis pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait AnalysisApi: Send + Sync {
    /// Store an uploaded file for the duration of extraction and turn it into a document.
    async fn load_document(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Document, ExtractionError>;

    /// Run the full pipeline over a document.
    async fn analyze(&self, document: &Document) -> Result<PipelineResult, PipelineError>;

    /// Summarize a single piece of text with one service call.
    async fn summarize_text(&self, text: &str) -> Result<String, ServiceError>;

    /// Probe the summarization service.
    async fn probe_service(&self) -> Result<HealthReport, ServiceError>;

    /// Base URL of the summarization service.
    fn service_url(&self) -> &str;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;

    /// Count a degraded response handed to a client in place of an analysis.
    fn record_degraded_response(&self);
}

impl AnalysisService {
    /// Build the service with the HTTP summarizer and PDF extractor described by `config`.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let summarizer = HttpSummarizerClient::new(config)?;
        tracing::info!(service_url = %config.ai_service_url, "Summarization client initialized");
        Ok(Self::with_components(
            PipelineSettings::from(config),
            Box::new(summarizer),
            Box::new(PdfTextExtractor::default()),
            config.upload_dir.clone(),
        ))
    }

    /// Assemble a service from explicit components.
    pub fn with_components(
        settings: PipelineSettings,
        summarizer: Box<dyn SummarizerClient>,
        extractor: Box<dyn TextExtractor>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            summarizer,
            extractor,
            settings,
            upload_dir,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Pipeline settings in effect.
    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    /// Chunk, summarize, and aggregate until the merged summary fits the word budget.
    ///
    /// Returns the final summary, the first-pass chunk count, and the number of passes.
    async fn condense(&self, text: &str) -> Result<(String, usize, usize), PipelineError> {
        let mut current = text.to_string();
        let mut first_chunk_count = None;
        let mut passes = 0;

        loop {
            passes += 1;
            let input_words = count_words(&current);
            let chunks = chunk_text(&current, self.settings.chunk_max_words);
            let chunk_count = chunks.len();
            first_chunk_count.get_or_insert(chunk_count);
            tracing::debug!(pass = passes, input_words, chunk_count, "Summarization pass");

            let summaries = self.summarize_chunks(&chunks).await?;
            self.metrics.record_chunks(summaries.len() as u64);

            match aggregate(&summaries, self.settings.summary_max_words) {
                Aggregation::Final(summary) => {
                    tracing::debug!(
                        pass = passes,
                        words = summary.word_count,
                        "Merged summary within budget"
                    );
                    return Ok((summary.text, first_chunk_count.unwrap_or(0), passes));
                }
                Aggregation::NeedsResummarization(summary) => {
                    if summary.word_count >= input_words {
                        tracing::warn!(
                            pass = passes,
                            input_words,
                            output_words = summary.word_count,
                            "Summarization pass did not shorten the text"
                        );
                    }
                    if passes >= self.settings.max_passes {
                        return Err(PipelineError::PassLimitExceeded {
                            passes,
                            words: summary.word_count,
                        });
                    }
                    tracing::info!(
                        pass = passes,
                        words = summary.word_count,
                        limit = self.settings.summary_max_words,
                        "Merged summary over budget; summarizing again"
                    );
                    current = summary.text;
                }
            }
        }
    }

    /// Summarize every chunk, keeping results aligned with chunk order.
    ///
    /// At most `concurrency` calls are in flight; the first failure stops the pass.
    async fn summarize_chunks(&self, chunks: &[Chunk]) -> Result<Vec<String>, ServiceError> {
        let concurrency = self.settings.concurrency.max(1);
        let pending: Vec<_> = chunks.iter().map(|chunk| self.summarize_chunk(chunk)).collect();
        stream::iter(pending)
            .buffered(concurrency)
            .try_collect()
            .await
    }

    async fn summarize_chunk(&self, chunk: &Chunk) -> Result<String, ServiceError> {
        let started = Instant::now();
        let result = self.summarizer.summarize(&chunk.text).await;
        match &result {
            Ok(summary) => tracing::debug!(
                chunk = chunk.index,
                words = chunk.word_count,
                summary_words = summary.split_whitespace().count(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chunk summarized"
            ),
            Err(error) => tracing::warn!(
                chunk = chunk.index,
                kind = error.kind(),
                error = %error,
                "Chunk summarization failed"
            ),
        }
        result
    }
}

#[async_trait]
impl AnalysisApi for AnalysisService {
    async fn load_document(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Document, ExtractionError> {
        let upload =
            ScopedUpload::create(&self.upload_dir, bytes).map_err(ExtractionError::Storage)?;
        let extracted = self.extractor.extract(upload.path()).await?;
        drop(upload);

        let document = Document::new(file_name, extracted.text, Some(extracted.page_count));
        tracing::info!(
            file_name,
            pages = extracted.page_count,
            text_length = document.text_length,
            "Document loaded"
        );
        Ok(document)
    }

    async fn analyze(&self, document: &Document) -> Result<PipelineResult, PipelineError> {
        let started = Instant::now();
        let words = document.word_count();
        if words == 0 {
            return Err(PipelineError::EmptyDocument);
        }
        tracing::info!(
            file_name = %document.file_name,
            words,
            text_length = document.text_length,
            "Analyzing document"
        );

        let (summary, chunk_count, passes) = match self.condense(&document.text).await {
            Ok(outcome) => outcome,
            Err(error) => {
                match &error {
                    PipelineError::Service(_) => self.metrics.record_service_failure(),
                    PipelineError::PassLimitExceeded { .. } => {
                        self.metrics.record_pass_limit_failure()
                    }
                    PipelineError::EmptyDocument => {}
                }
                tracing::error!(file_name = %document.file_name, error = %error, "Analysis failed");
                return Err(error);
            }
        };

        let key_points = extract_key_points(&summary, self.settings.max_key_points);
        let metadata = AnalysisMetadata::new(document, chunk_count, passes, started);
        self.metrics.record_document(passes as u64);
        tracing::info!(
            file_name = %document.file_name,
            chunks = chunk_count,
            passes,
            key_points = key_points.len(),
            duration_ms = metadata.duration_ms,
            "Analysis completed"
        );

        Ok(PipelineResult {
            summary,
            key_points,
            actions: SUGGESTED_ACTIONS.iter().map(|action| action.to_string()).collect(),
            metadata,
        })
    }

    async fn summarize_text(&self, text: &str) -> Result<String, ServiceError> {
        self.summarizer.summarize(text).await
    }

    async fn probe_service(&self) -> Result<HealthReport, ServiceError> {
        self.summarizer.probe().await
    }

    fn service_url(&self) -> &str {
        self.summarizer.service_url()
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    fn record_degraded_response(&self) {
        self.metrics.record_degraded_response();
    }
}
