pub mod app;
pub mod config;
pub mod corpus;
pub mod environment;
pub mod error;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod prompt;
pub mod scraper;

pub use config::StyleRequestConfig;
pub use corpus::PostSample;
pub use error::StyleGenError;
pub use metrics::CorpusMetrics;
pub use pipeline::{StylePipeline, StyleProfile};

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_CORPUS: &str = "corpus";

/// Model selection for a single generation call.
#[derive(Clone, Debug, PartialEq)]
pub struct LLMParams {
    pub model: String,
    pub temperature: f32,
}
