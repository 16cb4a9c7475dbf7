use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Explicit renderer binary. `None` means auto-detect on PATH.
    pub chrome_bin: Option<PathBuf>,
    /// Pass `--no-sandbox` to the renderer (needed when running as root in containers).
    pub render_no_sandbox: bool,
    pub llm_timeout: Duration,
    pub limits: PipelineLimits,
}

/// Bounds and thresholds used by the pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineLimits {
    pub render_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Bound on each object-storage operation, retries included.
    pub storage_timeout: Duration,
    /// Cap on acquired job-posting text, in characters.
    pub max_content_chars: usize,
    /// Minimum extracted document text, in characters.
    pub min_content_chars: usize,
    /// Heuristic threshold for selector-based job content. Tunable.
    pub selector_min_chars: usize,
    pub llm_max_tokens: u32,
    pub llm_temperature: f32,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            render_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(10),
            storage_timeout: Duration::from_secs(30),
            max_content_chars: 10_000,
            min_content_chars: 50,
            selector_min_chars: 200,
            llm_max_tokens: 4096,
            llm_temperature: 0.1,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = PipelineLimits::default();
        let limits = PipelineLimits {
            render_timeout: Duration::from_secs(env_or("RENDER_TIMEOUT_SECS", 10)?),
            fetch_timeout: Duration::from_secs(env_or("FETCH_TIMEOUT_SECS", 10)?),
            storage_timeout: Duration::from_secs(env_or("STORAGE_TIMEOUT_SECS", 30)?),
            max_content_chars: env_or("MAX_CONTENT_CHARS", defaults.max_content_chars)?,
            min_content_chars: env_or("MIN_CONTENT_CHARS", defaults.min_content_chars)?,
            selector_min_chars: env_or("SELECTOR_MIN_CHARS", defaults.selector_min_chars)?,
            llm_max_tokens: env_or("LLM_MAX_TOKENS", defaults.llm_max_tokens)?,
            llm_temperature: env_or("LLM_TEMPERATURE", defaults.llm_temperature)?,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: env_or("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            chrome_bin: std::env::var_os("CHROME_BIN").map(PathBuf::from),
            render_no_sandbox: env_or("RENDER_NO_SANDBOX", false)?,
            llm_timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 90)?),
            limits,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}
