//! Chat prompts, model names and limits.
//!
//! The defaults live in `config/chat.toml`, embedded at compile time.
//! `AI_MAX_TOKENS` overrides the streamed completion budget; `AI_MODEL`
//! is applied when the provider is created.

use area_insights_ai::providers::ProviderModels;
use serde::Deserialize;

const CHAT_TOML: &str = include_str!("../config/chat.toml");

/// Chat settings loaded from the embedded TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Instructions sent ahead of every chat.
    pub system_prompt: String,
    /// Instructions for summarising a transcript. `{localities}` is
    /// replaced by the comma-separated list of known area names.
    pub summary_prompt: String,
    /// System message carrying the prior summary. `{summary}` is replaced
    /// by the summary text.
    pub summary_hint: String,
    /// Token budget of a streamed chat reply.
    pub max_tokens: u32,
    /// Token budget of a transcript summary.
    pub summary_max_tokens: u32,
    /// Upper bound on the serialized relevant-stats section.
    pub max_context_chars: usize,
    /// Default model per provider.
    pub models: ProviderModels,
}

impl ChatConfig {
    /// Parses the embedded configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (it is compiled into the
    /// binary, so this is caught by the tests).
    #[must_use]
    pub fn embedded() -> Self {
        toml::de::from_str(CHAT_TOML)
            .unwrap_or_else(|e| panic!("Failed to parse embedded chat config: {e}"))
    }

    /// The embedded configuration with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::embedded();
        if let Ok(raw) = std::env::var("AI_MAX_TOKENS") {
            match raw.trim().parse() {
                Ok(max_tokens) => config.max_tokens = max_tokens,
                Err(e) => log::warn!("Ignoring invalid AI_MAX_TOKENS '{raw}': {e}"),
            }
        }
        config
    }

    /// The system message carrying a prior summary. `None` when the client
    /// sent no summary or a blank one.
    #[must_use]
    pub fn summary_message(&self, summary: Option<&str>) -> Option<String> {
        summary
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.summary_hint.replace("{summary}", s))
    }

    /// The summariser instructions listing every known locality.
    #[must_use]
    pub fn summary_instructions<'a>(&self, localities: impl IntoIterator<Item = &'a str>) -> String {
        let names = localities.into_iter().collect::<Vec<_>>().join(", ");
        self.summary_prompt.trim().replace("{localities}", &names)
    }
}
