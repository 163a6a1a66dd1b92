#![deny(missing_docs)]

//! Core library for the ComplySummarize backend.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// PDF text extraction adapters.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline activity counters.
pub mod metrics;
/// Summarization pipeline: chunking, aggregation, key points, orchestration.
pub mod processing;
/// Client for the external summarization service.
pub mod summarization;
/// Request-scoped upload storage.
pub mod upload;
