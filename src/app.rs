//! HTTP-facing request and response types and service wiring.

pub mod api;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::StyleRequestConfig;
use crate::environment::AppConfig;
use crate::error::Result;
use crate::llm::{OpenAIBackend, PromptAssembler};
use crate::metrics::CorpusMetrics;
use crate::pipeline::{StylePipeline, StyleProfile};
use crate::scraper::{CorpusProvider, ScraperCommand, SkipRefresh};

/// Body of `POST /profile`. Omitted limits fall back to
/// [`StyleRequestConfig::default`].
#[derive(Debug, Clone, Deserialize)]
pub struct StyleProfileRequest {
    pub substack_url: String,
    #[serde(flatten)]
    pub config: StyleRequestConfig,
}

/// Body returned by `POST /profile`.
#[derive(Debug, Clone, Serialize)]
pub struct StyleProfileResponse {
    pub style_prompt: String,
    pub metrics: CorpusMetrics,
    pub samples_used: Vec<String>,
}

impl From<StyleProfile> for StyleProfileResponse {
    fn from(profile: StyleProfile) -> Self {
        Self {
            style_prompt: profile.style_prompt,
            metrics: profile.metrics,
            samples_used: profile.samples_used,
        }
    }
}

/// Wire the OpenAI backend and corpus provider described by `config`.
pub fn build_pipeline(config: &AppConfig) -> Result<StylePipeline> {
    let backend = OpenAIBackend::new(
        &config.openai_api_key,
        config.openai_api_base.as_deref(),
        config.llm_timeout,
    );

    let provider: Arc<dyn CorpusProvider> = if config.scraper_enabled {
        Arc::new(ScraperCommand::from_command_line(
            &config.scraper_command,
            &config.scraper_workdir,
            config.scraper_timeout,
        )?)
    } else {
        Arc::new(SkipRefresh)
    };

    Ok(StylePipeline::new(
        &config.corpus_root,
        provider,
        PromptAssembler::new(Arc::new(backend)),
    ))
}
