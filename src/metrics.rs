use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_analyzed: AtomicU64,
    chunks_summarized: AtomicU64,
    summary_passes: AtomicU64,
    service_failures: AtomicU64,
    pass_limit_failures: AtomicU64,
    degraded_responses: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed analysis and the number of passes it took.
    pub fn record_document(&self, passes: u64) {
        self.documents_analyzed.fetch_add(1, Ordering::Relaxed);
        self.summary_passes.fetch_add(passes, Ordering::Relaxed);
    }

    /// Record chunks successfully summarized during one pass.
    pub fn record_chunks(&self, chunk_count: u64) {
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record an analysis aborted by a summarization service failure.
    pub fn record_service_failure(&self) {
        self.service_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an analysis that did not converge within the pass budget.
    pub fn record_pass_limit_failure(&self) {
        self.pass_limit_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a degraded response served while the summarization service was unavailable.
    pub fn record_degraded_response(&self) {
        self.degraded_responses.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_analyzed: self.documents_analyzed.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            summary_passes: self.summary_passes.load(Ordering::Relaxed),
            service_failures: self.service_failures.load(Ordering::Relaxed),
            pass_limit_failures: self.pass_limit_failures.load(Ordering::Relaxed),
            degraded_responses: self.degraded_responses.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Documents analyzed successfully since startup.
    pub documents_analyzed: u64,
    /// Chunk summaries obtained across all passes.
    pub chunks_summarized: u64,
    /// Summarization passes across all successful analyses.
    pub summary_passes: u64,
    /// Analyses stopped by a summarization service failure.
    pub service_failures: u64,
    /// Analyses stopped because the summary never fit the word budget.
    pub pass_limit_failures: u64,
    /// Degraded responses served while the service was unreachable or loading.
    pub degraded_responses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = PipelineMetrics::new();
        metrics.record_chunks(3);
        metrics.record_document(1);
        metrics.record_chunks(4);
        metrics.record_chunks(1);
        metrics.record_document(2);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_analyzed, 2);
        assert_eq!(snapshot.chunks_summarized, 8);
        assert_eq!(snapshot.summary_passes, 3);
    }

    #[test]
    fn failures_are_counted_separately() {
        let metrics = PipelineMetrics::new();
        metrics.record_service_failure();
        metrics.record_pass_limit_failure();
        metrics.record_service_failure();
        metrics.record_degraded_response();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_analyzed, 0);
        assert_eq!(snapshot.service_failures, 2);
        assert_eq!(snapshot.pass_limit_failures, 1);
        assert_eq!(snapshot.degraded_responses, 1);
    }
}
