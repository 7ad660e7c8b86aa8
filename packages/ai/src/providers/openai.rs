//! `OpenAI` chat completions provider.
//!
//! Also works with any server exposing the `OpenAI` chat completions API.

use serde::{Deserialize, Serialize};

use super::{CompletionRequest, LlmProvider, Message, StreamEvent, TextStream, text_stream};
use crate::AiError;

/// Base URL of the public `OpenAI` API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` API provider.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    /// Creates a new `OpenAI` provider.
    #[must_use]
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Posts the request and rejects non-success statuses.
    async fn send(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, AiError> {
        let body = OpenAiRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream,
        };

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await?;
            let err: OpenAiError = serde_json::from_str(&body).unwrap_or_else(|_| OpenAiError {
                error: OpenAiErrorDetail {
                    message: format!("HTTP {status}: {body}"),
                },
            });
            return Err(AiError::Provider {
                message: err.error.message,
            });
        }

        Ok(resp)
    }
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiChunk {
    #[serde(default)]
    choices: Vec<OpenAiChunkChoice>,
}

#[derive(Deserialize)]
struct OpenAiChunkChoice {
    #[serde(default)]
    delta: OpenAiDelta,
}

#[derive(Deserialize, Default)]
struct OpenAiDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

/// Parses one `data:` payload of a chat completions stream.
pub(super) fn parse_stream_payload(payload: &str) -> Result<StreamEvent, AiError> {
    if payload.trim() == "[DONE]" {
        return Ok(StreamEvent::Done);
    }

    let value: serde_json::Value = serde_json::from_str(payload)?;
    if value.get("error").is_some() {
        let err: OpenAiError = serde_json::from_value(value)?;
        return Err(AiError::Provider {
            message: err.error.message,
        });
    }

    let chunk: OpenAiChunk = serde_json::from_value(value)?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|text| !text.is_empty())
        .map_or(StreamEvent::Skip, StreamEvent::Text))
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        let resp = self.send(request, false).await?;
        let response: OpenAiResponse = serde_json::from_str(&resp.text().await?)?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Provider {
                message: "No choices in OpenAI response".to_string(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<TextStream, AiError> {
        let resp = self.send(request, true).await?;
        Ok(Box::pin(text_stream(resp, parse_stream_payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_content_delta() {
        let payload = r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Kora"}}]}"#;
        assert_eq!(
            parse_stream_payload(payload).unwrap(),
            StreamEvent::Text("Kora".to_string())
        );
    }

    #[test]
    fn skips_role_only_and_empty_deltas() {
        let role = r#"{"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        let empty = r#"{"choices":[{"index":0,"delta":{"content":""},"finish_reason":"stop"}]}"#;
        let usage = r#"{"choices":[],"usage":{"total_tokens":12}}"#;
        assert_eq!(parse_stream_payload(role).unwrap(), StreamEvent::Skip);
        assert_eq!(parse_stream_payload(empty).unwrap(), StreamEvent::Skip);
        assert_eq!(parse_stream_payload(usage).unwrap(), StreamEvent::Skip);
    }

    #[test]
    fn recognises_done_marker() {
        assert_eq!(parse_stream_payload("[DONE]").unwrap(), StreamEvent::Done);
    }

    #[test]
    fn surfaces_in_stream_errors() {
        let payload = r#"{"error":{"message":"rate limited","type":"requests"}}"#;
        let err = parse_stream_payload(payload).unwrap_err();
        assert!(matches!(err, AiError::Provider { message } if message == "rate limited"));
    }

    #[test]
    fn request_omits_stream_flag_when_not_streaming() {
        let messages = [Message::user("hi")];
        let body = OpenAiRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            max_tokens: 500,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("stream").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn joins_endpoint_without_double_slash() {
        let provider = OpenAiProvider::new(
            "k".to_string(),
            "m".to_string(),
            "http://localhost:11434/v1/".to_string(),
        );
        assert_eq!(
            provider.endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }
}
