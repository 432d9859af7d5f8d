/// LLM Client: the single point of entry for every provider call in the resume API.
///
/// ARCHITECTURAL RULE: No other module may call OpenAI, Anthropic or DeepSeek directly.
/// All LLM interactions MUST go through this module.
///
/// Models are hardcoded per provider to prevent drift. There is no retry policy:
/// one request per call, failures are reported to the caller.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod parse;

pub use parse::{parse_structured_response, ParseError};

const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const OPENAI_MODEL: &str = "gpt-4o";
pub const ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";
pub const DEEPSEEK_MODEL: &str = "deepseek-chat";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
    DeepSeek,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::DeepSeek => "deepseek",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionOptions {
    pub const fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("no API key configured for {0}")]
    MissingApiKey(Provider),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error(transparent)]
    Malformed(#[from] ParseError),
}

/// One provider endpoint. Implemented over HTTP in production and by stubs in tests.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String, LlmError>;
}

// ─── OpenAI / DeepSeek (chat completions wire format) ───────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Bearer-authenticated chat-completions endpoint. OpenAI and DeepSeek share the format.
pub struct ChatCompletionsBackend {
    client: Client,
    provider: Provider,
    url: &'static str,
    model: &'static str,
    api_key: Option<String>,
}

impl ChatCompletionsBackend {
    pub fn openai(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            provider: Provider::OpenAi,
            url: OPENAI_API_URL,
            model: OPENAI_MODEL,
            api_key,
        }
    }

    pub fn deepseek(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            provider: Provider::DeepSeek,
            url: DEEPSEEK_API_URL,
            model: DEEPSEEK_MODEL,
            api_key,
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionsBackend {
    async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey(self.provider))?;

        let body = ChatRequest {
            model: self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(self.url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyContent)?;

        debug!(provider = %self.provider, chars = text.len(), "completion succeeded");
        Ok(text)
    }
}

// ─── Anthropic (messages wire format) ───────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

pub struct AnthropicBackend {
    client: Client,
    api_key: Option<String>,
}

impl AnthropicBackend {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl CompletionBackend for AnthropicBackend {
    async fn complete(&self, prompt: &str, options: CompletionOptions) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey(Provider::Anthropic))?;

        let body = AnthropicRequest {
            model: ANTHROPIC_MODEL,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: AnthropicResponse = response.json().await?;
        debug!(
            "Anthropic call succeeded: input_tokens={}, output_tokens={}",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        parsed
            .text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(LlmError::EmptyContent)
    }
}

// ─── Client ─────────────────────────────────────────────────────────────────

/// The single LLM client shared by every AI route. Cheap to clone.
#[derive(Clone)]
pub struct LlmClient {
    openai: Arc<dyn CompletionBackend>,
    anthropic: Arc<dyn CompletionBackend>,
    deepseek: Arc<dyn CompletionBackend>,
}

impl LlmClient {
    /// Builds the HTTP backends. A missing key is not an error here; calls to
    /// that provider fail with `LlmError::MissingApiKey` and degrade at the call site.
    pub fn new(
        openai_api_key: Option<String>,
        anthropic_api_key: Option<String>,
        deepseek_api_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_backends(
            Arc::new(ChatCompletionsBackend::openai(client.clone(), openai_api_key)),
            Arc::new(AnthropicBackend::new(client.clone(), anthropic_api_key)),
            Arc::new(ChatCompletionsBackend::deepseek(client, deepseek_api_key)),
        ))
    }

    pub fn with_backends(
        openai: Arc<dyn CompletionBackend>,
        anthropic: Arc<dyn CompletionBackend>,
        deepseek: Arc<dyn CompletionBackend>,
    ) -> Self {
        Self {
            openai,
            anthropic,
            deepseek,
        }
    }

    fn backend(&self, provider: Provider) -> &dyn CompletionBackend {
        match provider {
            Provider::OpenAi => self.openai.as_ref(),
            Provider::Anthropic => self.anthropic.as_ref(),
            Provider::DeepSeek => self.deepseek.as_ref(),
        }
    }

    /// One call to one provider. Errors are returned untouched.
    pub async fn try_complete(
        &self,
        prompt: &str,
        provider: Provider,
        options: CompletionOptions,
    ) -> Result<String, LlmError> {
        self.backend(provider).complete(prompt, options).await
    }

    /// Like `try_complete`, but any failure is logged and replaced by `fallback`.
    pub async fn request_completion(
        &self,
        prompt: &str,
        provider: Provider,
        options: CompletionOptions,
        fallback: &str,
    ) -> String {
        match self.try_complete(prompt, provider, options).await {
            Ok(text) => text,
            Err(e) => {
                warn!(%provider, "completion failed, using fallback: {e}");
                fallback.to_string()
            }
        }
    }

    /// Calls the provider and deserialises the reply as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        provider: Provider,
        options: CompletionOptions,
    ) -> Result<T, LlmError> {
        let text = self.try_complete(prompt, provider, options).await?;
        Ok(parse_structured_response(&text)?)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{client_with, StubBackend};
    use super::*;
    use serde::Deserialize;

    const OPTS: CompletionOptions = CompletionOptions::new(200, 0.7);

    #[derive(Debug, Deserialize)]
    struct Echo {
        value: String,
    }

    #[tokio::test]
    async fn test_routes_to_selected_provider() {
        let anthropic = StubBackend::replying("from claude");
        let llm = client_with(Provider::Anthropic, anthropic.clone());

        let text = llm
            .try_complete("hi", Provider::Anthropic, OPTS)
            .await
            .unwrap();
        assert_eq!(text, "from claude");
        assert_eq!(anthropic.calls(), 1);
        assert!(llm.try_complete("hi", Provider::OpenAi, OPTS).await.is_err());
    }

    #[tokio::test]
    async fn test_request_completion_falls_back_without_retrying() {
        let openai = StubBackend::failing();
        let llm = client_with(Provider::OpenAi, openai.clone());

        let text = llm
            .request_completion("hi", Provider::OpenAi, OPTS, "fallback text")
            .await;
        assert_eq!(text, "fallback text");
        assert_eq!(openai.calls(), 1);
    }

    #[tokio::test]
    async fn test_complete_json_strips_fences() {
        let deepseek = StubBackend::replying("```json\n{\"value\": \"ok\"}\n```");
        let llm = client_with(Provider::DeepSeek, deepseek);

        let echo: Echo = llm
            .complete_json("hi", Provider::DeepSeek, OPTS)
            .await
            .unwrap();
        assert_eq!(echo.value, "ok");
    }

    #[tokio::test]
    async fn test_complete_json_reports_malformed_reply() {
        let llm = client_with(Provider::DeepSeek, StubBackend::replying("not json"));
        let err = llm
            .complete_json::<Echo>("hi", Provider::DeepSeek, OPTS)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let backend = AnthropicBackend::new(Client::new(), None);
        let err = backend.complete("hi", OPTS).await.unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey(Provider::Anthropic)));
    }
}
