use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use comply_summarize::{
    api,
    config::Config,
    extraction::{ExtractedText, TextExtractor},
    processing::{
        AnalysisApi, AnalysisService, Document, ExtractionError, PipelineError, PipelineSettings,
    },
    summarization::HttpSummarizerClient,
};
use httpmock::{Method::POST, MockServer};
use regex::Regex;
use serde_json::{Value, json};
use tower::ServiceExt;

const BOUNDARY: &str = "pipeline-integration-boundary";

/// Extractor reading the stored upload as UTF-8, or failing after checking the file exists.
struct Utf8Extractor {
    fail: bool,
}

#[async_trait]
impl TextExtractor for Utf8Extractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractionError> {
        assert!(path.exists(), "upload must exist while it is being extracted");
        if self.fail {
            return Err(ExtractionError::Parse("not a PDF".into()));
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(ExtractionError::Read)?;
        Ok(ExtractedText {
            text,
            page_count: 2,
        })
    }
}

fn config_for(base_url: String, upload_dir: PathBuf) -> Config {
    Config {
        ai_service_url: base_url,
        upload_dir,
        summarize_timeout: Duration::from_secs(2),
        health_timeout: Duration::from_secs(1),
        ..Config::default()
    }
}

fn service_with(
    config: &Config,
    settings: PipelineSettings,
    fail_extraction: bool,
) -> AnalysisService {
    let summarizer = HttpSummarizerClient::new(config).expect("summarizer client");
    AnalysisService::with_components(
        settings,
        Box::new(summarizer),
        Box::new(Utf8Extractor {
            fail: fail_extraction,
        }),
        config.upload_dir.clone(),
    )
}

fn words(count: usize) -> String {
    (0..count)
        .map(|idx| format!("clause{idx}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn leftover_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.count())
        .unwrap_or(0)
}

fn upload_request(file_name: &str, content_type: &str, body: &str) -> Request<Body> {
    let payload = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{body}\r\n--{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(payload))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("router response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&body).expect("json body"))
}

#[tokio::test]
async fn analyzes_a_short_document_against_the_sidecar() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/summarize");
            then.status(200).json_body(json!([{
                "summary_text": "Data must be encrypted. Breaches are reported within three days. \
                    Officers are appointed. Contracts are reviewed. Fines may apply. \
                    Audits happen yearly. Training is mandatory."
            }]));
        })
        .await;
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config_for(server.base_url(), dir.path().join("uploads"));
    let service = service_with(&config, PipelineSettings::from(&config), false);

    let text = words(50);
    let document = Document::new("policy.pdf", text.clone(), Some(1));
    let result = service.analyze(&document).await.expect("analysis");

    mock.assert_async().await;
    assert_eq!(result.metadata.summary_passes, 1);
    assert_eq!(result.metadata.chunk_count, 1);
    assert_eq!(result.metadata.text_length, text.chars().count());
    assert_eq!(result.key_points.len(), 5);
    assert_eq!(result.key_points[0].text, "Data must be encrypted");
    assert_eq!(result.key_points[4].index, 5);
    let timestamp = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("regex");
    assert!(timestamp.is_match(&result.metadata.processing_time));
}

#[tokio::test]
async fn sidecar_that_never_shortens_hits_the_pass_limit() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/summarize");
            then.status(200)
                .json_body(json!([{ "summary_text": words(120) }]));
        })
        .await;
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config_for(server.base_url(), dir.path().to_path_buf());
    let settings = PipelineSettings {
        chunk_max_words: 100,
        summary_max_words: 50,
        max_key_points: 5,
        max_passes: 3,
        concurrency: 2,
    };
    let service = service_with(&config, settings, false);
    let document = Document::new("adversarial.pdf", words(250), None);

    let error = tokio::time::timeout(Duration::from_secs(10), service.analyze(&document))
        .await
        .expect("pipeline must terminate")
        .expect_err("summary never fits the budget");

    assert!(matches!(
        error,
        PipelineError::PassLimitExceeded { passes: 3, .. }
    ));
    // Every chunk comes back as 120 words: 250 -> 3 chunks, 360 -> 4 chunks, 480 -> 5 chunks.
    assert_eq!(mock.hits_async().await, 12);
    assert_eq!(service.metrics_snapshot().pass_limit_failures, 1);
}

#[tokio::test]
async fn upload_storage_is_released_for_every_outcome() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/summarize");
            then.status(200)
                .json_body(json!([{ "summary_text": "Retention is limited. Access is logged." }]));
        })
        .await;
    let dir = tempfile::tempdir().expect("temp dir");
    let upload_dir = dir.path().join("uploads");
    let config = config_for(server.base_url(), upload_dir.clone());

    let healthy = Arc::new(service_with(&config, PipelineSettings::from(&config), false));
    let router = api::create_router(healthy.clone(), config.max_upload_bytes);

    let (status, _) = send(
        router.clone(),
        upload_request("notes.txt", "text/plain", "plain text"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(leftover_files(&upload_dir), 0);

    let (status, json) = send(
        router,
        upload_request("policy.pdf", "application/pdf", "Personal data is retained for a year."),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["keyPoints"],
        json!(["Point 1: Retention is limited", "Point 2: Access is logged"])
    );
    assert_eq!(json["metadata"]["pageCount"], 2);
    assert_eq!(json["metadata"]["textLength"], 37);
    assert_eq!(leftover_files(&upload_dir), 0);
    assert_eq!(healthy.metrics_snapshot().documents_analyzed, 1);

    let broken = Arc::new(service_with(&config, PipelineSettings::from(&config), true));
    let (status, json) = send(
        api::create_router(broken, config.max_upload_bytes),
        upload_request("corrupt.pdf", "application/pdf", "%PDF-garbage"),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Failed to extract text from PDF");
    assert_eq!(leftover_files(&upload_dir), 0);
}

#[tokio::test]
async fn unreachable_sidecar_degrades_upload_and_fails_health_check() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = config_for("http://127.0.0.1:1".into(), dir.path().to_path_buf());
    let service = Arc::new(service_with(&config, PipelineSettings::from(&config), false));
    let router = api::create_router(service, config.max_upload_bytes);

    let (status, json) = send(
        router.clone(),
        upload_request("policy.pdf", "application/pdf", "Vendors sign the data agreement."),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "service_unavailable");
    assert_eq!(json["keyPoints"], json!([]));
    assert!(
        json["summary"]
            .as_str()
            .expect("summary")
            .contains("http://127.0.0.1:1")
    );

    assert!(json["metadata"].get("summaryPasses").is_none());

    let (status, json) = send(router.clone(), get("/health-check")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["aiService"], "disconnected");
    assert_eq!(json["serviceUrl"], "http://127.0.0.1:1");

    let (status, json) = send(router, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["degradedResponses"], 1);
    assert_eq!(json["serviceFailures"], 1);
    assert_eq!(json["documentsAnalyzed"], 0);
}
