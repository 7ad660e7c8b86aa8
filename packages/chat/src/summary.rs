//! Condenses a chat transcript into the short hint the dashboard sends
//! back with later turns.

use area_insights_ai::AiError;
use area_insights_ai::providers::{ChatTurn, CompletionRequest, LlmProvider, Message};
use area_insights_area::dataset::Dataset;
use thiserror::Error;

use crate::config::ChatConfig;

/// Errors from summarising a transcript.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Nothing to summarise.
    #[error("Chat history is required")]
    EmptyHistory,

    /// The model returned no text.
    #[error("Failed to generate summary")]
    EmptySummary,

    /// The completion request failed.
    #[error(transparent)]
    Ai(#[from] AiError),
}

/// Summarises `history` with a single non-streaming completion.
///
/// # Errors
///
/// Returns [`SummaryError::EmptyHistory`] for an empty transcript,
/// [`SummaryError::EmptySummary`] if the model answers with blank text, or
/// [`SummaryError::Ai`] if the request fails.
pub async fn summarise(
    provider: &dyn LlmProvider,
    config: &ChatConfig,
    dataset: &Dataset,
    history: &[ChatTurn],
) -> Result<String, SummaryError> {
    if history.is_empty() {
        return Err(SummaryError::EmptyHistory);
    }

    let instructions =
        config.summary_instructions(dataset.areas().iter().map(|a| a.name.as_str()));

    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message::system(instructions));
    messages.extend(history.iter().map(Message::from));

    let request = CompletionRequest {
        messages,
        max_tokens: config.summary_max_tokens,
    };

    let summary = provider.complete(&request).await?;
    let summary = summary.trim();
    if summary.is_empty() {
        return Err(SummaryError::EmptySummary);
    }

    log::debug!("Summarised {} turns into {} chars", history.len(), summary.len());
    Ok(summary.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use area_insights_ai::providers::{Role, TextStream};

    use super::*;

    struct FixedReply {
        reply: Result<&'static str, &'static str>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl FixedReply {
        fn new(reply: Result<&'static str, &'static str>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for FixedReply {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
            self.seen.lock().unwrap().push(request.clone());
            self.reply
                .map(str::to_string)
                .map_err(|message| AiError::Provider {
                    message: message.to_string(),
                })
        }

        async fn stream(&self, _request: &CompletionRequest) -> Result<TextStream, AiError> {
            unreachable!("summaries are not streamed")
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"[
                {"pinCode": 560034, "name": "Koramangala", "isServed": true},
                {"pinCode": 560064, "name": "Yelahanka", "isServed": false}
            ]"#,
            "[]",
            "[]",
        )
        .unwrap()
    }

    fn history() -> Vec<ChatTurn> {
        vec![
            ChatTurn {
                writer: "user".to_string(),
                message: "How many orders in Koramangala?".to_string(),
            },
            ChatTurn {
                writer: "assistant".to_string(),
                message: "Koramangala had 90 orders.".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn rejects_empty_history_without_calling_provider() {
        let provider = FixedReply::new(Ok("unused"));
        let err = summarise(&provider, &ChatConfig::embedded(), &dataset(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::EmptyHistory));
        assert!(provider.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn returns_trimmed_summary() {
        let provider = FixedReply::new(Ok("  Koramangala: 90 orders.\n"));
        let config = ChatConfig::embedded();
        let summary = summarise(&provider, &config, &dataset(), &history())
            .await
            .unwrap();
        assert_eq!(summary, "Koramangala: 90 orders.");

        let seen = provider.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.max_tokens, config.summary_max_tokens);
        assert_eq!(request.messages.len(), 3);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Koramangala, Yelahanka"));
        assert_eq!(request.messages[2].role, Role::Assistant);
    }

    #[tokio::test]
    async fn blank_completion_is_an_error() {
        let provider = FixedReply::new(Ok("   "));
        let err = summarise(&provider, &ChatConfig::embedded(), &dataset(), &history())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::EmptySummary));
        assert_eq!(err.to_string(), "Failed to generate summary");
    }

    #[tokio::test]
    async fn propagates_provider_errors() {
        let provider = FixedReply::new(Err("quota exceeded"));
        let err = summarise(&provider, &ChatConfig::embedded(), &dataset(), &history())
            .await
            .unwrap_err();
        assert!(matches!(err, SummaryError::Ai(_)));
    }
}
