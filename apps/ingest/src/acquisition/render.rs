//! Primary acquisition: render the page in a headless Chromium and read back
//! the serialized DOM.
//!
//! Each render runs in a throwaway profile directory. The child process is
//! killed when the attempt times out or the calling future is dropped.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use url::Url;

use super::scrape::page_text;
use super::{AcquisitionStrategy, StrategyError, StrategyKind};

/// Binaries searched for on PATH when none is configured.
const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
];

pub struct HeadlessRenderer {
    binary: Option<PathBuf>,
    timeout: Duration,
    no_sandbox: bool,
}

impl HeadlessRenderer {
    pub fn new(configured: Option<PathBuf>, timeout: Duration) -> Self {
        let binary = configured.or_else(detect_browser);
        match &binary {
            Some(path) => debug!("Headless renderer: {}", path.display()),
            None => debug!("No headless browser found; rendering strategy disabled"),
        }
        Self {
            binary,
            timeout,
            no_sandbox: false,
        }
    }

    /// Needed when running as root inside containers.
    pub fn no_sandbox(mut self, enabled: bool) -> Self {
        self.no_sandbox = enabled;
        self
    }

    fn command(&self, binary: &Path, profile_dir: &Path, url: &Url) -> Command {
        let mut cmd = Command::new(binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--mute-audio")
            .arg("--no-first-run")
            .arg(format!("--user-data-dir={}", profile_dir.display()));
        if self.no_sandbox {
            cmd.arg("--no-sandbox");
        }
        cmd.arg("--dump-dom")
            .arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

fn detect_browser() -> Option<PathBuf> {
    BROWSER_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

#[async_trait]
impl AcquisitionStrategy for HeadlessRenderer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rendered
    }

    async fn attempt(&self, url: &Url) -> Result<String, StrategyError> {
        let binary = self
            .binary
            .as_ref()
            .ok_or_else(|| StrategyError::Unavailable("no headless browser installed".into()))?;

        let profile_dir = tempfile::Builder::new()
            .prefix("render-profile-")
            .tempdir()
            .map_err(|e| StrategyError::Process(format!("profile dir: {e}")))?;

        let child = self
            .command(binary, profile_dir.path(), url)
            .spawn()
            .map_err(|e| {
                StrategyError::Process(format!("failed to launch {}: {e}", binary.display()))
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| StrategyError::Timeout(self.timeout))?
            .map_err(|e| StrategyError::Process(e.to_string()))?;

        if !output.status.success() {
            return Err(StrategyError::Process(format!(
                "renderer exited with {}",
                output.status
            )));
        }

        let dom = String::from_utf8_lossy(&output.stdout);
        Ok(page_text(&dom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_browser_is_unavailable() {
        let renderer = HeadlessRenderer {
            binary: None,
            timeout: Duration::from_secs(1),
            no_sandbox: false,
        };
        let url = Url::parse("https://example.com/job").unwrap();
        let err = renderer.attempt(&url).await.unwrap_err();
        assert!(matches!(err, StrategyError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unlaunchable_binary_is_process_error() {
        let renderer = HeadlessRenderer::new(
            Some(PathBuf::from("/nonexistent/bin/chromium-for-tests")),
            Duration::from_secs(1),
        );
        let url = Url::parse("https://example.com/job").unwrap();
        let err = renderer.attempt(&url).await.unwrap_err();
        assert!(matches!(err, StrategyError::Process(_)));
    }

    #[test]
    fn test_command_includes_sandbox_flag_only_when_enabled() {
        let renderer = HeadlessRenderer {
            binary: None,
            timeout: Duration::from_secs(1),
            no_sandbox: true,
        };
        let url = Url::parse("https://example.com/job").unwrap();
        let cmd = renderer.command(Path::new("chromium"), Path::new("/tmp/p"), &url);
        let args: Vec<String> = cmd
            .as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert!(args.contains(&"--dump-dom".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/job"));
    }
}
