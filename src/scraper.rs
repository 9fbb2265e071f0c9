//! Keeps the on-disk corpus fresh before a profile is built.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, error, info};
use url::Url;

use crate::error::{Result, StyleGenError};
use crate::TARGET_WEB_REQUEST;

/// Populates `corpus_root/<host>` for a publication address.
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    async fn refresh(&self, source: &Url) -> Result<()>;
}

/// Leaves the corpus untouched; profiles whatever is already on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipRefresh;

#[async_trait]
impl CorpusProvider for SkipRefresh {
    async fn refresh(&self, source: &Url) -> Result<()> {
        debug!(target: TARGET_WEB_REQUEST, "Corpus refresh disabled, using existing files for {}", source);
        Ok(())
    }
}

/// Runs the external scraper as `<program> <args...> -w <url>`.
#[derive(Debug, Clone)]
pub struct ScraperCommand {
    program: String,
    args: Vec<String>,
    workdir: PathBuf,
    timeout: Duration,
}

impl ScraperCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>, workdir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            workdir: workdir.into(),
            timeout,
        }
    }

    /// Split a whitespace separated command line such as `cargo run --release --`.
    pub fn from_command_line(command: &str, workdir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next().ok_or_else(|| {
            StyleGenError::ConfigurationMissing("scraper command is empty".to_string())
        })?;
        Ok(Self::new(program, parts.collect(), workdir, timeout))
    }
}

#[async_trait]
impl CorpusProvider for ScraperCommand {
    async fn refresh(&self, source: &Url) -> Result<()> {
        info!(target: TARGET_WEB_REQUEST, "Running scraper for {}", source);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg("-w")
            .arg(source.as_str())
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(target: TARGET_WEB_REQUEST, "Could not start scraper {}: {}", self.program, e);
                return Err(StyleGenError::ScraperFailed(format!(
                    "could not start {}: {}",
                    self.program, e
                )));
            }
            Err(_) => {
                error!(target: TARGET_WEB_REQUEST, "Scraper for {} timed out after {:?}", source, self.timeout);
                return Err(StyleGenError::ScraperFailed(format!(
                    "timed out after {} seconds",
                    self.timeout.as_secs()
                )));
            }
        };

        if output.status.success() {
            info!(target: TARGET_WEB_REQUEST, "Scraper finished for {}", source);
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        error!(target: TARGET_WEB_REQUEST, "Scraper for {} exited with {}: {}", source, output.status, detail);
        Err(StyleGenError::ScraperFailed(detail))
    }
}
