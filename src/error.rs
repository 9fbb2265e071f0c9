use thiserror::Error;

pub type Result<T> = std::result::Result<T, StyleGenError>;

#[derive(Error, Debug)]
pub enum StyleGenError {
    /// The corpus directory for a host was missing or yielded no usable posts.
    #[error("No posts found under {corpus_dir}. Did the scrape succeed?")]
    NoSamplesFound { host: String, corpus_dir: String },

    /// The generative service answered, but without text we can use.
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Scraper failed: {0}")]
    ScraperFailed(String),

    /// The generative service could not be reached or timed out.
    #[error("Generative service error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}
