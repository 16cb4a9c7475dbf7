//! Content Acquisition: turns a job-posting URL into bounded plain text.
//!
//! Strategies are tried in order; the first one that yields non-empty text wins.
//! Default chain: headless render → direct fetch + selector scrape.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::PipelineLimits;
use crate::text::{char_len, collapse_whitespace, truncate_chars};

pub mod render;
pub mod scrape;

pub use render::HeadlessRenderer;
pub use scrape::FetchScrapeStrategy;

/// Which strategy produced the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    #[serde(rename = "rendered")]
    Rendered,
    #[serde(rename = "scraped-fallback")]
    ScrapedFallback,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Rendered => "rendered",
            StrategyKind::ScrapedFallback => "scraped-fallback",
        }
    }
}

/// Text obtained from a URL, collapsed and capped.
#[derive(Debug, Clone, Serialize)]
pub struct AcquiredContent {
    pub url: String,
    pub text: String,
    pub strategy: StrategyKind,
    /// Character count before truncation.
    pub original_chars: usize,
    pub truncated: bool,
}

/// Failure of a single strategy attempt.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("strategy unavailable: {0}")]
    Unavailable(String),

    #[error("renderer failed: {0}")]
    Process(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("page contained no visible text")]
    EmptyContent,
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("Could not retrieve content from {url}")]
    Exhausted {
        url: String,
        /// One `name: cause` entry per strategy, in order. Logged, not displayed.
        attempts: String,
        #[source]
        cause: StrategyError,
    },
}

/// One way of turning a URL into raw visible text.
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn attempt(&self, url: &Url) -> Result<String, StrategyError>;
}

/// Parses and validates an absolute http(s) URL without touching the network.
pub fn parse_url(input: &str) -> Result<Url, AcquisitionError> {
    let invalid = |reason: String| AcquisitionError::InvalidUrl {
        input: input.to_string(),
        reason,
    };
    let url = Url::parse(input.trim()).map_err(|e| {
        debug!("URL parse failed for '{input}': {e}");
        invalid("not an absolute http(s) URL".to_string())
    })?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

/// Ordered strategy chain with shared post-processing.
pub struct ContentResolver {
    strategies: Vec<Box<dyn AcquisitionStrategy>>,
    max_content_chars: usize,
}

impl ContentResolver {
    pub fn new(strategies: Vec<Box<dyn AcquisitionStrategy>>, max_content_chars: usize) -> Self {
        Self {
            strategies,
            max_content_chars,
        }
    }

    /// Default chain: headless render, then fetch + scrape.
    pub fn from_limits(
        chrome_bin: Option<std::path::PathBuf>,
        no_sandbox: bool,
        limits: &PipelineLimits,
    ) -> Result<Self, StrategyError> {
        let renderer =
            HeadlessRenderer::new(chrome_bin, limits.render_timeout).no_sandbox(no_sandbox);
        let scraper = FetchScrapeStrategy::new(limits.fetch_timeout, limits.selector_min_chars)?;
        Ok(Self::new(
            vec![Box::new(renderer), Box::new(scraper)],
            limits.max_content_chars,
        ))
    }

    pub async fn acquire(&self, raw_url: &str) -> Result<AcquiredContent, AcquisitionError> {
        let url = parse_url(raw_url)?;

        let mut attempts = Vec::new();
        let mut last_error =
            StrategyError::Unavailable("no acquisition strategies configured".into());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let outcome = strategy.attempt(&url).await.and_then(|raw| {
                let text = collapse_whitespace(&raw);
                if text.is_empty() {
                    Err(StrategyError::EmptyContent)
                } else {
                    Ok(text)
                }
            });

            match outcome {
                Ok(mut text) => {
                    let original_chars = char_len(&text);
                    let truncated = truncate_chars(&mut text, self.max_content_chars);
                    info!(
                        "Acquired {} chars from {} via {} (truncated: {})",
                        original_chars.min(self.max_content_chars),
                        url,
                        kind.as_str(),
                        truncated
                    );
                    return Ok(AcquiredContent {
                        url: url.to_string(),
                        text,
                        strategy: kind,
                        original_chars,
                        truncated,
                    });
                }
                Err(e) => {
                    warn!("Acquisition strategy {} failed for {}: {e}", kind.as_str(), url);
                    attempts.push(format!("{}: {e}", kind.as_str()));
                    last_error = e;
                }
            }
        }

        let attempts = attempts.join("; ");
        warn!("All acquisition strategies failed for {url}: {attempts}");
        Err(AcquisitionError::Exhausted {
            url: url.to_string(),
            attempts,
            cause: last_error,
        })
    }
}
