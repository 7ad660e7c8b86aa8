//! LLM provider abstraction and implementations.
//!
//! Supports `OpenAI`-compatible servers and Anthropic via a common trait.

pub mod anthropic;
pub mod openai;

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::AiError;
use crate::sse::SseDecoder;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions for the model.
    System,
    /// The dashboard user.
    User,
    /// The model.
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author role.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// A system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// One turn of the transcript the dashboard keeps client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `"user"` for the dashboard user; anything else is the assistant.
    pub writer: String,
    /// Turn text.
    pub message: String,
}

impl From<&ChatTurn> for Message {
    fn from(turn: &ChatTurn) -> Self {
        if turn.writer == "user" {
            Self::user(turn.message.clone())
        } else {
            Self::assistant(turn.message.clone())
        }
    }
}

/// A completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Ordered messages, system messages included.
    pub messages: Vec<Message>,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// Incremental text fragments of a streamed completion, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, AiError>>;

/// Trait for LLM providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Sends a completion request and returns the full response text.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request fails.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;

    /// Sends a streaming completion request.
    ///
    /// The returned future resolves once the provider has accepted the
    /// request; text then arrives through the stream. Dropping the stream
    /// closes the upstream connection.
    ///
    /// # Errors
    ///
    /// Returns [`AiError`] if the request is rejected before streaming
    /// starts.
    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, AiError>;
}

/// What a single upstream stream payload means.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StreamEvent {
    /// A text fragment to forward.
    Text(String),
    /// The provider signalled the end of the completion.
    Done,
    /// Bookkeeping payload with no text.
    Skip,
}

/// Turns a streaming HTTP response into text fragments using a
/// provider-specific payload parser.
pub(crate) fn text_stream(
    mut resp: reqwest::Response,
    parse: fn(&str) -> Result<StreamEvent, AiError>,
) -> impl futures::Stream<Item = Result<String, AiError>> + Send + 'static {
    async_stream::try_stream! {
        let mut decoder = SseDecoder::default();
        let mut finished = false;

        'read: while let Some(chunk) = resp.chunk().await? {
            for payload in decoder.push(&chunk) {
                match parse(&payload)? {
                    StreamEvent::Text(text) => yield text,
                    StreamEvent::Done => {
                        finished = true;
                        break 'read;
                    }
                    StreamEvent::Skip => {}
                }
            }
        }

        let tail = if finished { None } else { decoder.finish() };
        if let Some(StreamEvent::Text(text)) = tail.map(|payload| parse(&payload)).transpose()? {
            yield text;
        }
    }
}

/// Default model names per provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderModels {
    /// Model used with `OpenAI`-compatible servers.
    pub openai: String,
    /// Model used with Anthropic.
    pub anthropic: String,
}

/// Creates an LLM provider based on environment variables.
///
/// If `AI_PROVIDER` is explicitly set, uses that provider. Otherwise
/// auto-detects from available credentials:
///
/// 1. `OPENAI_API_KEY` set -> `OpenAI`
/// 2. `ANTHROPIC_API_KEY` set -> Anthropic Claude
///
/// `AI_MODEL` overrides the configured model for the chosen provider and
/// `AI_BASE_URL` points the `OpenAI` provider at a compatible server.
///
/// # Errors
///
/// Returns [`AiError::Config`] if no credentials are found or the
/// explicitly requested provider is not configured.
pub fn create_provider_from_env(models: &ProviderModels) -> Result<Box<dyn LlmProvider>, AiError> {
    let provider = std::env::var("AI_PROVIDER").unwrap_or_else(|_| detect_provider());

    match provider.to_lowercase().as_str() {
        "openai" | "gpt" => {
            let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| AiError::Config {
                message: "OPENAI_API_KEY environment variable not set".to_string(),
            })?;
            let model = std::env::var("AI_MODEL").unwrap_or_else(|_| models.openai.clone());
            let base_url = std::env::var("AI_BASE_URL")
                .unwrap_or_else(|_| openai::DEFAULT_BASE_URL.to_string());
            log::info!("Using OpenAI-compatible provider at {base_url} with model {model}");
            Ok(Box::new(openai::OpenAiProvider::new(api_key, model, base_url)))
        }
        "anthropic" | "claude" => {
            let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| AiError::Config {
                message: "ANTHROPIC_API_KEY environment variable not set".to_string(),
            })?;
            let model = std::env::var("AI_MODEL").unwrap_or_else(|_| models.anthropic.clone());
            log::info!("Using Anthropic provider with model {model}");
            Ok(Box::new(anthropic::AnthropicProvider::new(api_key, model)))
        }
        other => Err(AiError::Config {
            message: format!("Unknown AI provider: {other}. Use 'openai' or 'anthropic'."),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
///
/// Returns a provider name string that matches the arms in
/// [`create_provider_from_env`].
fn detect_provider() -> String {
    if std::env::var("OPENAI_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: OpenAI (OPENAI_API_KEY found)");
        return "openai".to_string();
    }

    if std::env::var("ANTHROPIC_API_KEY").is_ok() {
        log::info!("Auto-detected AI provider: Anthropic (ANTHROPIC_API_KEY found)");
        return "anthropic".to_string();
    }

    log::warn!(
        "No AI credentials detected. Set OPENAI_API_KEY or ANTHROPIC_API_KEY, \
         or set AI_PROVIDER explicitly."
    );

    // Fall back to openai; produces a clear error about the missing key
    "openai".to_string()
}
