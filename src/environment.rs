use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StyleGenError};

pub const DEFAULT_CORPUS_ROOT: &str = "blogs";
pub const DEFAULT_SCRAPER_COMMAND: &str = "cargo run --release --";
pub const DEFAULT_SCRAPER_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Splits a delimited setting into trimmed, non-empty entries.
///
/// # Arguments
/// - `value`: The raw setting, e.g. `"a, b,,c"`.
/// - `delimiter`: The character to split the value by.
///
/// # Returns
/// - `Vec<String>`
pub fn split_list(value: &str, delimiter: char) -> Vec<String> {
    value
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Process-wide settings, read once at startup.
#[derive(Clone, PartialEq)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_api_base: Option<String>,
    pub corpus_root: PathBuf,
    pub scraper_enabled: bool,
    pub scraper_command: String,
    pub scraper_workdir: PathBuf,
    pub scraper_timeout: Duration,
    pub llm_timeout: Duration,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai_api_key", &"[REDACTED]")
            .field("openai_api_base", &self.openai_api_base)
            .field("corpus_root", &self.corpus_root)
            .field("scraper_enabled", &self.scraper_enabled)
            .field("scraper_command", &self.scraper_command)
            .field("scraper_workdir", &self.scraper_workdir)
            .field("scraper_timeout", &self.scraper_timeout)
            .field("llm_timeout", &self.llm_timeout)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Fails with `ConfigurationMissing` when `OPENAI_API_KEY` is absent or
    /// blank; malformed numbers and flags are reported as `ConfigurationMissing`
    /// too, naming the variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            StyleGenError::ConfigurationMissing(
                "OPENAI_API_KEY environment variable is not set.".to_string(),
            )
        })?;

        let scraper_enabled = match get("SCRAPER_ENABLED").as_deref() {
            None => true,
            Some(value) => parse_flag(value).ok_or_else(|| invalid("SCRAPER_ENABLED", value))?,
        };

        Ok(Self {
            openai_api_key,
            openai_api_base: get("OPENAI_API_BASE"),
            corpus_root: PathBuf::from(get("CORPUS_ROOT").unwrap_or_else(|| DEFAULT_CORPUS_ROOT.to_string())),
            scraper_enabled,
            scraper_command: get("SCRAPER_COMMAND").unwrap_or_else(|| DEFAULT_SCRAPER_COMMAND.to_string()),
            scraper_workdir: PathBuf::from(get("SCRAPER_WORKDIR").unwrap_or_else(|| ".".to_string())),
            scraper_timeout: Duration::from_secs(parse_or("SCRAPER_TIMEOUT_SECS", get("SCRAPER_TIMEOUT_SECS"), DEFAULT_SCRAPER_TIMEOUT_SECS)?),
            llm_timeout: Duration::from_secs(parse_or("LLM_TIMEOUT_SECS", get("LLM_TIMEOUT_SECS"), DEFAULT_LLM_TIMEOUT_SECS)?),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT)?,
            cors_origins: split_list(&get("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()), ','),
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| invalid(key, &value)),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, value: &str) -> StyleGenError {
    StyleGenError::ConfigurationMissing(format!("{} has an invalid value: {}", key, value))
}
