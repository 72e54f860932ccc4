//! OpenAI-compatible chat-completions client.
//!
//! Speaks the plain `POST /chat/completions` protocol over reqwest, which is
//! what most hosted and self-hosted text-generation services expose.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use url::Url;

use cropbot_core::{
    traits::{ChatMessage, GenerationParams, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

/// Longest slice of an error body kept in error messages.
const ERROR_BODY_PREVIEW: usize = 200;

/// Configuration for [`ChatCompletionsClient`].
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    /// API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// Bearer token.
    pub api_key: Secret<String>,
}

/// Chat-completions client over reqwest.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
    api_key: Secret<String>,
}

impl ChatCompletionsClient {
    /// Create a new client. Fails if `base_url` is not an absolute URL.
    pub fn new(config: ChatCompletionsConfig) -> Result<Self> {
        let endpoint = completions_endpoint(&config.base_url)?;
        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            model: config.model,
            api_key: config.api_key,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }
}

fn completions_endpoint(base_url: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)
        .map_err(|e| Error::Config(format!("invalid model_gateway.base_url {:?}: {}", base_url, e)))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("chat/completions")
        .map_err(|e| Error::Config(format!("invalid completions endpoint: {}", e)))
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
    stream: bool,
    messages: &'a [ChatMessage],
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageBody>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct UsageBody {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn chat(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<LlmResponse> {
        let body = CompletionRequest {
            model: &self.model,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            stream: false,
            messages,
            response_format: ResponseFormat { kind: "text" },
        };

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let resp = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(Error::network(format!("Model host returned {}: {}", status, preview)));
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| Error::invalid_response(format!("Malformed completion body: {}", e)))?;

        let usage = parsed.usage.unwrap_or_default();
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::invalid_response("Completion has no choices"))?;
        let content = choice
            .message
            .and_then(|m| m.content)
            .ok_or_else(|| Error::invalid_response("Completion has no message content"))?;

        tracing::info!(
            model = %self.model,
            total_tokens = usage.total_tokens,
            "Chat completion received"
        );

        Ok(LlmResponse {
            content,
            finish_reason: choice.finish_reason.unwrap_or_else(|| "unknown".to_string()),
            usage: LlmUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}
