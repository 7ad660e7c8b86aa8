//! Chat endpoints: streamed completions and transcript summaries.
//!
//! The completion handler spawns a [`ChatRelay`] and waits for its first
//! event before committing to a status line. An early failure is answered
//! with a JSON 500; once streaming has started, failures are written into
//! the event stream as `data: [ERROR]`.

use std::convert::Infallible;
use std::sync::Arc;

use actix_web::{HttpResponse, web};
use area_insights_ai::providers::{ChatTurn, LlmProvider};
use area_insights_chat::context::{self, ContextRequest};
use area_insights_chat::relay::{ChatRelay, RelayEvent, RelayRequest};
use area_insights_chat::summary;
use area_insights_server_models::{ApiChatTurn, ApiSummary, ChatCompletionBody, SummariseBody};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::AppState;
use crate::error::ApiError;

/// Capacity of the relay channel. Small so a slow client pushes back on
/// the upstream read.
const RELAY_BUFFER: usize = 16;

const RELAY_FAILED_MESSAGE: &str = "Something went wrong processing your request.";

/// Aborts the relay task when the response stream is dropped.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// `POST /api/chat/completions`
///
/// Streams the assistant's reply as server-sent events, one
/// `data: <fragment>\n\n` per text fragment.
pub async fn completions(
    state: web::Data<AppState>,
    body: web::Json<ChatCompletionBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let provider = provider(&state)?;

    let context = context::build(
        &ContextRequest {
            message: &body.message,
            pin_code: body.pin_code,
        },
        &state.dataset,
        state.chat.max_context_chars,
    )?;

    let request = RelayRequest {
        system_prompt: state.chat.system_prompt.clone(),
        context,
        history: chat_turns(body.chat_history),
        summary: body.summary,
        message: body.message,
    };

    let (tx, mut rx) = mpsc::channel(RELAY_BUFFER);
    let mut relay = ChatRelay::new(provider, Arc::clone(&state.chat));
    let task = AbortOnDrop(tokio::spawn(async move {
        let outcome = relay.run(request, tx).await;
        log::debug!("Chat relay finished: {outcome}");
    }));

    let first = match rx.recv().await {
        Some(RelayEvent::Failed { message, .. }) => {
            log::error!("Chat completion failed before streaming: {message}");
            return Err(ApiError::Internal(RELAY_FAILED_MESSAGE.to_string()));
        }
        other => other,
    };

    let stream = async_stream::stream! {
        let _task = task;
        let mut next = first;
        while let Some(event) = next {
            match event {
                RelayEvent::Fragment(text) => {
                    yield Ok::<_, Infallible>(web::Bytes::from(format!("data: {text}\n\n")));
                }
                RelayEvent::Failed { message, fragments_sent } => {
                    log::error!("Chat completion failed after {fragments_sent} fragments: {message}");
                    yield Ok(web::Bytes::from_static(b"data: [ERROR]\n\n"));
                    break;
                }
            }
            next = rx.recv().await;
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}

/// `POST /api/chat/summarise`
pub async fn summarise(
    state: web::Data<AppState>,
    body: web::Json<SummariseBody>,
) -> Result<HttpResponse, ApiError> {
    let provider = provider(&state)?;
    let history = chat_turns(body.into_inner().chat_history);

    let summary = summary::summarise(provider.as_ref(), &state.chat, &state.dataset, &history).await?;

    Ok(HttpResponse::Ok().json(ApiSummary {
        success: true,
        message: "Summary generated successfully".to_string(),
        summary,
    }))
}

fn provider(state: &AppState) -> Result<Arc<dyn LlmProvider>, ApiError> {
    state
        .provider
        .clone()
        .ok_or_else(|| ApiError::Unavailable("Chat is not configured".to_string()))
}

fn chat_turns(turns: Vec<ApiChatTurn>) -> Vec<ChatTurn> {
    turns
        .into_iter()
        .map(|turn| ChatTurn {
            writer: turn.writer,
            message: turn.message,
        })
        .collect()
}
