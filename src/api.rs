//! HTTP surface for ComplySummarize.
//!
//! The Axum router exposes:
//!
//! - `POST /upload` – Accept a multipart `file` field holding a PDF, extract its text, and run
//!   the summarization pipeline. Returns `{ summary, keyPoints, actions, metadata }`. When the
//!   summarization service is unreachable or still loading the response is still `200`, with a
//!   diagnostic `summary` and a `status` tag naming the failure.
//! - `GET /test-api` – Summarize a fixed sample text to check the service end to end.
//! - `GET /health-check` – Probe the summarization service (`503` when disconnected).
//! - `GET /metrics` – Pipeline counters.
//! - `GET /` – Service descriptor listing the endpoints above.
//!
//! Input validation happens before any call to the summarization service. Upload storage is
//! released before the handler returns, whatever the outcome.

use crate::metrics::MetricsSnapshot;
use crate::processing::{
    AnalysisApi, AnalysisMetadata, Document, ExtractionError, PipelineError, PipelineResult,
    SUGGESTED_ACTIONS,
};
use crate::summarization::ServiceError;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

/// Multipart field carrying the uploaded document.
pub const UPLOAD_FIELD: &str = "file";

const SERVICE_NAME: &str = "ComplySummarize IA Backend";
const SAMPLE_TEXT: &str = "The new data protection regulation requires every organisation that \
processes personal data to appoint a data protection officer, keep a register of processing \
activities, and notify the supervisory authority of any breach within seventy-two hours. \
Companies must review their contracts with subcontractors so that the same obligations apply \
along the whole processing chain. Failure to comply exposes the organisation to administrative \
fines of up to four percent of its annual worldwide turnover. The regulation enters into force \
on the first day of the next financial year, and a transition period of six months is granted \
to small and medium-sized enterprises.";

/// Build the HTTP router exposing the analysis API surface.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: AnalysisApi + 'static,
{
    Router::new()
        .route("/", get(describe_service))
        .route("/upload", post(upload_document::<S>))
        .route("/test-api", get(test_api::<S>))
        .route("/health-check", get(health_check::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Success body for `POST /upload`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Final summary, or a diagnostic message for degraded responses.
    pub summary: String,
    /// Key points rendered as `Point N: text`.
    pub key_points: Vec<String>,
    /// Suggested follow-up actions.
    pub actions: Vec<String>,
    /// Processing metadata.
    pub metadata: MetadataResponse,
    /// Failure kind when the analysis was degraded; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// Metadata block of [`AnalysisResponse`].
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    /// Original file name.
    pub file_name: String,
    /// Page count when known.
    pub page_count: Option<usize>,
    /// Character length of the extracted text.
    pub text_length: usize,
    /// RFC 3339 completion timestamp.
    pub processing_time: String,
    /// Chunks produced on the first pass; absent on degraded responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    /// Summarization passes performed; absent on degraded responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_passes: Option<usize>,
    /// Time spent in the pipeline.
    pub duration_ms: u64,
}

impl From<AnalysisMetadata> for MetadataResponse {
    fn from(metadata: AnalysisMetadata) -> Self {
        Self {
            file_name: metadata.file_name,
            page_count: metadata.page_count,
            text_length: metadata.text_length,
            processing_time: metadata.processing_time,
            chunk_count: Some(metadata.chunk_count),
            summary_passes: Some(metadata.summary_passes),
            duration_ms: metadata.duration_ms,
        }
    }
}

impl From<PipelineResult> for AnalysisResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            summary: result.summary,
            key_points: result.key_points.iter().map(|point| point.label()).collect(),
            actions: result.actions,
            metadata: result.metadata.into(),
            status: None,
        }
    }
}

impl AnalysisResponse {
    /// Envelope returned when the summarization service is unreachable or still loading.
    ///
    /// `started` marks the beginning of the request so `durationMs` covers the failed attempt.
    /// Chunk and pass counts are omitted because the analysis never completed.
    pub fn degraded(
        document: &Document,
        error: &ServiceError,
        service_url: &str,
        started: Instant,
    ) -> Self {
        let mut metadata = MetadataResponse::from(AnalysisMetadata::new(document, 0, 0, started));
        metadata.chunk_count = None;
        metadata.summary_passes = None;
        Self {
            summary: diagnostic_message(error, service_url),
            key_points: Vec::new(),
            actions: SUGGESTED_ACTIONS.iter().map(|action| action.to_string()).collect(),
            metadata,
            status: Some(error.kind()),
        }
    }
}

/// Human-readable explanation of a summarization service failure.
pub fn diagnostic_message(error: &ServiceError, service_url: &str) -> String {
    match error {
        ServiceError::ServiceUnavailable(_) => format!(
            "Error: Cannot connect to AI service at {service_url}. Please make sure the \
             summarization service is running."
        ),
        ServiceError::ModelLoading(_) => "Error: The AI model is still loading. Please try \
             again in a few moments."
            .to_string(),
        ServiceError::GenericFailure(detail) => {
            format!("Error: The AI service could not summarize the document: {detail}")
        }
    }
}

/// Analyze an uploaded PDF.
#[tracing::instrument(skip(service, multipart), fields(request_id = %Uuid::new_v4()))]
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Response, AppError>
where
    S: AnalysisApi,
{
    let started = Instant::now();
    let upload = read_upload(&mut multipart).await?;
    if !is_pdf(upload.content_type.as_deref()) {
        tracing::warn!(
            file_name = %upload.file_name,
            content_type = ?upload.content_type,
            "Rejected non-PDF upload"
        );
        return Err(AppError::InvalidFormat);
    }
    tracing::info!(
        file_name = %upload.file_name,
        bytes = upload.bytes.len(),
        "Upload received"
    );

    let document = service
        .load_document(&upload.file_name, &upload.bytes)
        .await?;

    match service.analyze(&document).await {
        Ok(result) => Ok(Json(AnalysisResponse::from(result)).into_response()),
        Err(PipelineError::Service(error)) if error.is_transient() => {
            tracing::warn!(
                kind = error.kind(),
                error = %error,
                "Returning degraded analysis"
            );
            service.record_degraded_response();
            let body =
                AnalysisResponse::degraded(&document, &error, service.service_url(), started);
            Ok(Json(body).into_response())
        }
        Err(error) => Err(error.into()),
    }
}

struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

async fn read_upload(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(AppError::from)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("document.pdf").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(AppError::from)?;
        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::MissingFile)
}

fn is_pdf(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false)
}

/// Summarize a fixed sample to verify the summarization service end to end.
async fn test_api<S>(State(service): State<Arc<S>>) -> Response
where
    S: AnalysisApi,
{
    match service.summarize_text(SAMPLE_TEXT).await {
        Ok(summary) => Json(json!({
            "summary": summary,
            "serviceUrl": service.service_url(),
            "status": "success",
        }))
        .into_response(),
        Err(error) => {
            tracing::error!(kind = error.kind(), error = %error, "AI service test failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "AI service test failed",
                    "details": error.to_string(),
                    "serviceUrl": service.service_url(),
                })),
            )
                .into_response()
        }
    }
}

/// Report API and summarization service status.
async fn health_check<S>(State(service): State<Arc<S>>) -> Response
where
    S: AnalysisApi,
{
    match service.probe_service().await {
        Ok(report) => Json(json!({
            "apiStatus": "running",
            "aiService": "connected",
            "serviceUrl": service.service_url(),
            "model": report.model,
        }))
        .into_response(),
        Err(error) => {
            tracing::warn!(kind = error.kind(), error = %error, "AI service health probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "apiStatus": "running",
                    "aiService": "disconnected",
                    "error": error.to_string(),
                    "serviceUrl": service.service_url(),
                })),
            )
                .into_response()
        }
    }
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: AnalysisApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single endpoint in the service catalog.
#[derive(Serialize)]
struct EndpointDescriptor {
    method: &'static str,
    path: &'static str,
    description: &'static str,
}

/// Response body for `GET /`.
#[derive(Serialize)]
struct ServiceDescriptor {
    message: &'static str,
    version: &'static str,
    endpoints: Vec<EndpointDescriptor>,
}

/// Describe the service and enumerate its endpoints.
async fn describe_service() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor {
        message: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            EndpointDescriptor {
                method: "POST",
                path: "/upload",
                description: "Upload a PDF (multipart field \"file\") and receive its summary, key points, suggested actions, and metadata.",
            },
            EndpointDescriptor {
                method: "GET",
                path: "/test-api",
                description: "Summarize a built-in sample text to verify the AI service.",
            },
            EndpointDescriptor {
                method: "GET",
                path: "/health-check",
                description: "Report whether the AI summarization service is reachable.",
            },
            EndpointDescriptor {
                method: "GET",
                path: "/metrics",
                description: "Return pipeline counters.",
            },
        ],
    })
}

/// Errors rendered by the HTTP layer.
#[derive(Debug)]
enum AppError {
    MissingFile,
    InvalidFormat,
    Multipart {
        status: StatusCode,
        details: String,
    },
    Extraction(ExtractionError),
    Pipeline(PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::MissingFile => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No file uploaded" }),
            ),
            Self::InvalidFormat => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid file format" }),
            ),
            Self::Multipart { status, details } => {
                let error = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "File too large"
                } else {
                    "Malformed upload"
                };
                tracing::warn!(%status, details = %details, "Rejected multipart upload");
                (status, json!({ "error": error, "details": details }))
            }
            Self::Pipeline(PipelineError::EmptyDocument) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "No text could be extracted from the PDF" }),
            ),
            Self::Extraction(error) => {
                tracing::error!(error = %error, "Text extraction failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to extract text from PDF", "details": error.to_string() }),
                )
            }
            Self::Pipeline(error) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Failed to process document", "details": error.to_string() }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart {
            status: inner.status(),
            details: inner.body_text(),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(inner: ExtractionError) -> Self {
        Self::Extraction(inner)
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}
