use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::config::StyleRequestConfig;
use crate::corpus::{is_publication_key, select};
use crate::error::{Result, StyleGenError};
use crate::llm::PromptAssembler;
use crate::metrics::{summarize, CorpusMetrics};
use crate::scraper::CorpusProvider;
use crate::TARGET_WEB_REQUEST;

/// Result of one profiling run.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleProfile {
    pub style_prompt: String,
    pub metrics: CorpusMetrics,
    /// Sample origins relative to the corpus root, in selection order.
    pub samples_used: Vec<String>,
}

/// Parse a publication address and derive its host label (host plus any
/// explicit port).
pub fn resolve_publication(address: &str) -> Result<(Url, String)> {
    let url = Url::parse(address.trim())
        .map_err(|e| StyleGenError::InvalidRequest(format!("invalid URL {}: {}", address, e)))?;
    if !url.scheme().starts_with("http") {
        return Err(StyleGenError::InvalidRequest(
            "URL must start with http or https".to_string(),
        ));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host,
        _ => {
            return Err(StyleGenError::InvalidRequest(
                "Could not determine host from URL".to_string(),
            ))
        }
    };
    let label = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    if !is_publication_key(&label) {
        return Err(StyleGenError::InvalidRequest(format!(
            "URL host {} is not a publication host name",
            host
        )));
    }
    Ok((url, label))
}

/// Sequences sample selection, corpus statistics and prompt generation.
#[derive(Clone)]
pub struct StylePipeline {
    corpus_root: PathBuf,
    provider: Arc<dyn CorpusProvider>,
    assembler: PromptAssembler,
}

impl StylePipeline {
    pub fn new(
        corpus_root: impl Into<PathBuf>,
        provider: Arc<dyn CorpusProvider>,
        assembler: PromptAssembler,
    ) -> Self {
        Self {
            corpus_root: corpus_root.into(),
            provider,
            assembler,
        }
    }

    pub fn corpus_root(&self) -> &Path {
        &self.corpus_root
    }

    /// Refresh the corpus for `address`, then profile its host.
    pub async fn profile(&self, address: &str, config: &StyleRequestConfig) -> Result<StyleProfile> {
        config.validate()?;
        let (url, host) = resolve_publication(address)?;
        self.provider.refresh(&url).await?;
        self.run(config, &host).await
    }

    /// Profile the posts already on disk for `host`.
    ///
    /// # Returns
    /// * `Ok(StyleProfile)` - Generated prompt, metrics and sample origins
    /// * `Err(StyleGenError::NoSamplesFound)` - Nothing usable under the host directory
    /// * `Err(StyleGenError::GenerationFailure)` - The model answered without text
    pub async fn run(&self, config: &StyleRequestConfig, host: &str) -> Result<StyleProfile> {
        let root = self.corpus_root.clone();
        let key = host.to_string();
        let (max_posts, max_chars) = (config.max_posts, config.max_chars_per_post);
        let samples = tokio::task::spawn_blocking(move || select(&root, &key, max_posts, max_chars))
            .await
            .map_err(|e| StyleGenError::Internal(format!("sample selection task failed: {}", e)))?;

        if samples.is_empty() {
            let corpus_dir = self.corpus_dir_label(host);
            warn!(target: TARGET_WEB_REQUEST, "No usable posts under {}", corpus_dir);
            return Err(StyleGenError::NoSamplesFound {
                host: host.to_string(),
                corpus_dir,
            });
        }

        let metrics = summarize(&samples);
        info!(
            target: TARGET_WEB_REQUEST,
            "Profiling {} with {} samples, {} tokens",
            host, metrics.sample_count, metrics.total_tokens
        );

        let style_prompt = self
            .assembler
            .assemble(host, &samples, &metrics, &config.llm_params())
            .await?;

        let samples_used = samples
            .iter()
            .map(|sample| sample.relative_origin(&self.corpus_root))
            .collect();

        Ok(StyleProfile {
            style_prompt,
            metrics,
            samples_used,
        })
    }

    /// `blogs/<host>` style label used in not-found messages.
    fn corpus_dir_label(&self, host: &str) -> String {
        let root_name = self
            .corpus_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.corpus_root.display().to_string());
        format!("{}/{}", root_name, host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{GenerationBackend, GenerationRequest, GenerationResponse};
    use crate::scraper::SkipRefresh;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const HOST: &str = "example.substack.com";

    struct CountingBackend {
        reply: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl CountingBackend {
        fn new(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl GenerationBackend for CountingBackend {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GenerationResponse {
                choices: self.reply.map(|r| vec![Some(r.to_string())]).unwrap_or_default(),
            })
        }
    }

    /// Records the URLs it was asked to refresh.
    #[derive(Default)]
    struct RecordingProvider {
        refreshed: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CorpusProvider for RecordingProvider {
        async fn refresh(&self, source: &Url) -> Result<()> {
            self.refreshed.lock().unwrap().push(source.to_string());
            Ok(())
        }
    }

    fn pipeline(root: &Path, backend: Arc<CountingBackend>) -> StylePipeline {
        StylePipeline::new(root, Arc::new(SkipRefresh), PromptAssembler::new(backend))
    }

    #[test]
    fn test_resolve_publication() {
        let (_, host) = resolve_publication("https://example.substack.com/archive").unwrap();
        assert_eq!(host, "example.substack.com");

        let (_, host) = resolve_publication("http://localhost:8081/").unwrap();
        assert_eq!(host, "localhost:8081");

        assert!(matches!(
            resolve_publication("ftp://example.com/"),
            Err(StyleGenError::InvalidRequest(_))
        ));
        assert!(matches!(
            resolve_publication("not a url"),
            Err(StyleGenError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_resolve_publication_rejects_dot_hosts() {
        for address in ["http://../", "http://%2e%2e/", "http://./", "http://.../", "https://a..b/"] {
            assert!(
                matches!(resolve_publication(address), Err(StyleGenError::InvalidRequest(_))),
                "{} accepted",
                address
            );
        }
    }

    #[tokio::test]
    async fn test_run_returns_profile() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(HOST);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("only-post"), "Plain words here. More plain words.").unwrap();

        let backend = CountingBackend::new(Some("  Write plainly.  "));
        let profile = pipeline(root.path(), backend.clone())
            .run(&StyleRequestConfig::default(), HOST)
            .await
            .unwrap();

        assert_eq!(profile.style_prompt, "Write plainly.");
        assert_eq!(profile.metrics.sample_count, 1);
        assert_eq!(profile.samples_used, vec![format!("{}/only-post", HOST)]);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_not_found() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(HOST)).unwrap();

        let backend = CountingBackend::new(Some("unused"));
        let result = pipeline(root.path(), backend.clone())
            .run(&StyleRequestConfig::default(), HOST)
            .await;

        match result {
            Err(StyleGenError::NoSamplesFound { host, corpus_dir }) => {
                assert_eq!(host, HOST);
                assert!(corpus_dir.ends_with(&format!("/{}", HOST)));
            }
            other => panic!("expected NoSamplesFound, got {:?}", other),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_retried() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(HOST);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("post"), "Some text.").unwrap();

        let backend = CountingBackend::new(None);
        let result = pipeline(root.path(), backend.clone())
            .run(&StyleRequestConfig::default(), HOST)
            .await;

        assert!(matches!(result, Err(StyleGenError::GenerationFailure(_))));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_profile_refreshes_then_runs() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join(HOST);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("post"), "Some text.").unwrap();

        let provider = Arc::new(RecordingProvider::default());
        let backend = CountingBackend::new(Some("Prompt."));
        let pipeline = StylePipeline::new(root.path(), provider.clone(), PromptAssembler::new(backend));

        let profile = pipeline
            .profile("https://example.substack.com/", &StyleRequestConfig::default())
            .await
            .unwrap();
        assert_eq!(profile.style_prompt, "Prompt.");
        assert_eq!(
            *provider.refreshed.lock().unwrap(),
            vec!["https://example.substack.com/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_profile_rejects_invalid_config_before_refresh() {
        let root = TempDir::new().unwrap();
        let provider = Arc::new(RecordingProvider::default());
        let pipeline = StylePipeline::new(
            root.path(),
            provider.clone(),
            PromptAssembler::new(CountingBackend::new(Some("unused"))),
        );

        let config = StyleRequestConfig {
            max_posts: 0,
            ..Default::default()
        };
        let result = pipeline.profile("https://example.substack.com/", &config).await;
        assert!(matches!(result, Err(StyleGenError::InvalidRequest(_))));
        assert!(provider.refreshed.lock().unwrap().is_empty());
    }
}
