use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_AI_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {key}: {value:?}")]
    InvalidValue {
        /// Name of the offending variable.
        key: String,
        /// Raw value found in the environment.
        value: String,
    },
    /// A combination of values cannot be satisfied.
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Runtime configuration for the ComplySummarize backend.
///
/// Loaded once at process start and handed to the services that need it. Nothing reads the
/// environment after construction.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub server_port: u16,
    /// Base URL of the inference sidecar exposing `/summarize` and `/health`.
    pub ai_service_url: String,
    /// Upper bound on words per chunk sent to the summarizer.
    pub chunk_max_words: usize,
    /// Longest merged summary (in words) returned without another summarization pass.
    pub summary_max_words: usize,
    /// Maximum number of key points extracted from the final summary.
    pub max_key_points: usize,
    /// Maximum number of chunk/summarize/aggregate passes per document.
    pub max_summary_passes: usize,
    /// Number of chunk summarization calls allowed in flight at once.
    pub summarize_concurrency: usize,
    /// `max_length` generation parameter forwarded to the summarizer.
    pub summary_max_length: u32,
    /// `min_length` generation parameter forwarded to the summarizer.
    pub summary_min_length: u32,
    /// Timeout applied to each summarization call.
    pub summarize_timeout: Duration,
    /// Timeout applied to the health probe.
    pub health_timeout: Duration,
    /// Directory receiving request-scoped upload files.
    pub upload_dir: PathBuf,
    /// Largest accepted request body for `POST /upload`.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: DEFAULT_PORT,
            ai_service_url: DEFAULT_AI_SERVICE_URL.to_string(),
            chunk_max_words: 800,
            summary_max_words: 300,
            max_key_points: 5,
            max_summary_passes: 4,
            summarize_concurrency: 1,
            summary_max_length: 150,
            summary_min_length: 40,
            summarize_timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(5),
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            server_port: parse_env("PORT")?.unwrap_or(defaults.server_port),
            ai_service_url: load_env_optional("AI_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.ai_service_url),
            chunk_max_words: parse_env("CHUNK_MAX_WORDS")?.unwrap_or(defaults.chunk_max_words),
            summary_max_words: parse_env("SUMMARY_MAX_WORDS")?
                .unwrap_or(defaults.summary_max_words),
            max_key_points: parse_env("MAX_KEY_POINTS")?.unwrap_or(defaults.max_key_points),
            max_summary_passes: parse_env("MAX_SUMMARY_PASSES")?
                .unwrap_or(defaults.max_summary_passes),
            summarize_concurrency: parse_env("SUMMARIZE_CONCURRENCY")?
                .unwrap_or(defaults.summarize_concurrency),
            summary_max_length: parse_env("SUMMARY_MAX_LENGTH")?
                .unwrap_or(defaults.summary_max_length),
            summary_min_length: parse_env("SUMMARY_MIN_LENGTH")?
                .unwrap_or(defaults.summary_min_length),
            summarize_timeout: parse_env("SUMMARIZE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.summarize_timeout),
            health_timeout: parse_env("HEALTH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.health_timeout),
            upload_dir: load_env_optional("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES")?.unwrap_or(defaults.max_upload_bytes),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that would make the pipeline unable to make progress.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary_max_words == 0 {
            return Err(ConfigError::Inconsistent(
                "SUMMARY_MAX_WORDS must be greater than zero".into(),
            ));
        }
        if self.max_summary_passes == 0 {
            return Err(ConfigError::Inconsistent(
                "MAX_SUMMARY_PASSES must be greater than zero".into(),
            ));
        }
        if self.summary_min_length > self.summary_max_length {
            return Err(ConfigError::Inconsistent(format!(
                "SUMMARY_MIN_LENGTH ({}) exceeds SUMMARY_MAX_LENGTH ({})",
                self.summary_min_length, self.summary_max_length
            )));
        }
        Ok(())
    }
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}

/// Load `.env` into the process environment when the file exists.
///
/// Call before [`crate::logging::init_tracing`] so `RUST_LOG` from `.env` takes effect.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Build the configuration from the process environment and log the effective values.
pub fn load_config() -> Result<Config, ConfigError> {
    let config = Config::from_env()?;
    tracing::debug!(
        server_port = config.server_port,
        ai_service_url = %config.ai_service_url,
        chunk_max_words = config.chunk_max_words,
        summary_max_words = config.summary_max_words,
        max_summary_passes = config.max_summary_passes,
        summarize_concurrency = config.summarize_concurrency,
        upload_dir = %config.upload_dir.display(),
        "Loaded configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.chunk_max_words, 800);
        assert_eq!(config.summary_max_words, 300);
        assert_eq!(config.max_key_points, 5);
        assert_eq!(config.summarize_timeout, Duration::from_secs(30));
        assert_eq!(config.health_timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_pass_budget() {
        let config = Config {
            max_summary_passes: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Inconsistent(message)) if message.contains("MAX_SUMMARY_PASSES")
        ));
    }

    #[test]
    fn validate_rejects_inverted_length_range() {
        let config = Config {
            summary_min_length: 200,
            summary_max_length: 100,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
