//! Summarization pipeline: chunking, per-chunk summarization, aggregation, and key points.

pub mod aggregate;
pub mod chunking;
pub mod key_points;
mod service;
pub mod types;

pub use aggregate::{AggregatedSummary, Aggregation};
pub use service::{AnalysisApi, AnalysisService};
pub use types::{
    AnalysisMetadata, Chunk, Document, ExtractionError, KeyPoint, PipelineError, PipelineResult,
    PipelineSettings, SUGGESTED_ACTIONS,
};
