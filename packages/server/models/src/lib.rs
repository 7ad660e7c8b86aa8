#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the area insights server.
//!
//! These types define the JSON contract with the dashboard. They are kept
//! separate from the dataset types so the API can evolve independently.

use area_insights_area_models::PinCode;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// The `{success, message, data?}` envelope used by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    /// `true` unless the request failed.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Payload, omitted on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// A successful response carrying `data`.
    #[must_use]
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// A failed response with no payload.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Body of `POST /api/areas/getSalary` and `POST /api/areas/getRentPrice`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinCodeBody {
    /// Area to look up.
    pub pin_code: PinCode,
}

/// One turn of the client-side chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChatTurn {
    /// `"user"` for the dashboard user; anything else is the assistant.
    pub writer: String,
    /// Turn text.
    pub message: String,
}

/// Body of `POST /api/chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCompletionBody {
    /// The new user message. Required and non-blank.
    #[serde(default)]
    pub message: String,
    /// Area currently selected on the dashboard.
    #[serde(default)]
    pub pin_code: Option<PinCode>,
    /// Earlier turns, oldest first.
    #[serde(default)]
    pub chat_history: Vec<ApiChatTurn>,
    /// Summary returned by an earlier `POST /api/chat/summarise`.
    #[serde(default)]
    pub summary: Option<String>,
}

/// Body of `POST /api/chat/summarise`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummariseBody {
    /// Transcript to summarise.
    #[serde(default)]
    pub chat_history: Vec<ApiChatTurn>,
}

/// Response of `POST /api/chat/summarise`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Human-readable status line.
    pub message: String,
    /// Model-written summary of the chat history.
    pub summary: String,
}
