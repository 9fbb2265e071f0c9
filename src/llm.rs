use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
};
use async_openai::Client as OpenAIClient;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::corpus::PostSample;
use crate::error::{Result, StyleGenError};
use crate::metrics::CorpusMetrics;
use crate::prompt::{style_messages, StyleMessages};
use crate::{LLMParams, TARGET_LLM_REQUEST};

/// A request for one chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub params: LLMParams,
    pub messages: StyleMessages,
}

/// The generated choices returned by a backend, in service order. A choice
/// without text content is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResponse {
    pub choices: Vec<Option<String>>,
}

impl From<CreateChatCompletionResponse> for GenerationResponse {
    fn from(response: CreateChatCompletionResponse) -> Self {
        Self {
            choices: response
                .choices
                .into_iter()
                .map(|choice| choice.message.content)
                .collect(),
        }
    }
}

/// Anything that can turn a [`GenerationRequest`] into generated choices.
///
/// Transport problems are reported as `Err`; a well-formed but empty answer is
/// an `Ok` response that the [`PromptAssembler`] rejects.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

/// Chat completions against the OpenAI API (or a compatible endpoint).
#[derive(Clone)]
pub struct OpenAIBackend {
    client: OpenAIClient<OpenAIConfig>,
    request_timeout: Duration,
}

impl std::fmt::Debug for OpenAIBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIBackend")
            .field("request_timeout", &self.request_timeout)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl OpenAIBackend {
    /// Create a backend bound to `api_key`; `api_base` overrides the endpoint.
    pub fn new(api_key: &str, api_base: Option<&str>, request_timeout: Duration) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: OpenAIClient::with_config(config),
            request_timeout,
        }
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let model = request.params.model.clone();
        let chat_request = chat_completion_request(&request)?;

        debug!(target: TARGET_LLM_REQUEST, "Sending chat completion request to {}", model);
        match timeout(self.request_timeout, self.client.chat().create(chat_request)).await {
            Ok(Ok(response)) => {
                debug!(target: TARGET_LLM_REQUEST, "Received {} choices from {}", response.choices.len(), model);
                Ok(response.into())
            }
            Ok(Err(e)) => {
                warn!(target: TARGET_LLM_REQUEST, "Chat completion request to {} failed: {}", model, e);
                Err(StyleGenError::Upstream(e.to_string()))
            }
            Err(_) => {
                warn!(target: TARGET_LLM_REQUEST, "Chat completion request to {} timed out after {:?}", model, self.request_timeout);
                Err(StyleGenError::Upstream(format!(
                    "request timed out after {} seconds",
                    self.request_timeout.as_secs()
                )))
            }
        }
    }
}

/// Convert a [`GenerationRequest`] into the OpenAI wire request.
pub fn chat_completion_request(request: &GenerationRequest) -> Result<CreateChatCompletionRequest> {
    let invalid = |e: async_openai::error::OpenAIError| StyleGenError::InvalidRequest(e.to_string());

    let system = ChatCompletionRequestSystemMessageArgs::default()
        .content(request.messages.system.as_str())
        .build()
        .map_err(invalid)?;
    let user = ChatCompletionRequestUserMessageArgs::default()
        .content(request.messages.user.as_str())
        .build()
        .map_err(invalid)?;

    let messages: Vec<ChatCompletionRequestMessage> = vec![system.into(), user.into()];
    CreateChatCompletionRequestArgs::default()
        .model(request.params.model.as_str())
        .temperature(request.params.temperature)
        .messages(messages)
        .build()
        .map_err(invalid)
}

/// Pull the generated text out of the first choice, trimmed.
pub fn extract_generated_text(response: &GenerationResponse) -> Result<String> {
    let first = response.choices.first().ok_or_else(|| {
        StyleGenError::GenerationFailure("response contained no choices".to_string())
    })?;

    let text = first.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(StyleGenError::GenerationFailure(
            "first choice carried no text content".to_string(),
        ));
    }
    Ok(text.to_string())
}

/// Renders the style request and turns the model's answer into a style prompt.
#[derive(Clone)]
pub struct PromptAssembler {
    backend: Arc<dyn GenerationBackend>,
}

impl PromptAssembler {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Build the request for `host`, submit it once, and return the generated
    /// style prompt.
    ///
    /// # Returns
    /// * `Ok(String)` - Trimmed text of the first generated choice
    /// * `Err(StyleGenError::GenerationFailure)` - The response had no usable text
    /// * `Err(_)` - The backend failed before producing a response
    pub async fn assemble(
        &self,
        host: &str,
        samples: &[PostSample],
        metrics: &CorpusMetrics,
        params: &LLMParams,
    ) -> Result<String> {
        let request = GenerationRequest {
            params: params.clone(),
            messages: style_messages(host, samples, metrics),
        };

        info!(target: TARGET_LLM_REQUEST, "Requesting style prompt for {} from {} ({} samples)", host, params.model, samples.len());
        let response = self.backend.generate(request).await?;

        extract_generated_text(&response).inspect_err(|e| {
            error!(target: TARGET_LLM_REQUEST, "Unusable response for {}: {}", host, e);
        })
    }
}
