//! Run the summarization pipeline on a local file and print the JSON envelope.
//!
//! Uses the same configuration as the HTTP server (environment and `.env`), so it is a quick
//! way to check a document against a running summarization sidecar without going through the
//! upload endpoint.
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use comply_summarize::{
    api::AnalysisResponse,
    config,
    logging,
    processing::{AnalysisApi, AnalysisService, Document},
};

#[derive(Parser)]
#[command(
    name = "summarize-file",
    about = "Summarize a local PDF (or plain-text) file with the configured AI service"
)]
struct Cli {
    /// File to analyze.
    path: PathBuf,
    /// Treat the input as UTF-8 text instead of a PDF.
    #[arg(long)]
    text: bool,
    /// Override `AI_SERVICE_URL`.
    #[arg(long)]
    ai_service_url: Option<String>,
    /// Override `MAX_SUMMARY_PASSES`.
    #[arg(long)]
    max_passes: Option<usize>,
    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();
    let cli = Cli::parse();

    let mut config = config::load_config().context("failed to load configuration")?;
    if let Some(url) = cli.ai_service_url {
        config.ai_service_url = url.trim_end_matches('/').to_string();
    }
    if let Some(passes) = cli.max_passes {
        config.max_summary_passes = passes;
    }
    config.validate().context("invalid configuration")?;

    let service =
        AnalysisService::new(&config).context("failed to initialize analysis service")?;
    tracing::debug!(settings = ?service.settings(), "Pipeline settings");

    let file_name = cli
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.path.display().to_string());

    let document = if cli.text {
        let text = tokio::fs::read_to_string(&cli.path)
            .await
            .with_context(|| format!("failed to read {}", cli.path.display()))?;
        Document::new(file_name, text, None)
    } else {
        let bytes = tokio::fs::read(&cli.path)
            .await
            .with_context(|| format!("failed to read {}", cli.path.display()))?;
        service
            .load_document(&file_name, &bytes)
            .await
            .with_context(|| format!("failed to extract text from {}", cli.path.display()))?
    };

    let started = Instant::now();
    let response = match service.analyze(&document).await {
        Ok(result) => AnalysisResponse::from(result),
        Err(comply_summarize::processing::PipelineError::Service(error))
            if error.is_transient() =>
        {
            service.record_degraded_response();
            AnalysisResponse::degraded(&document, &error, service.service_url(), started)
        }
        Err(error) => bail!("analysis failed: {error}"),
    };

    let output = if cli.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{output}");
    Ok(())
}
