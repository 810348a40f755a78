//! Chat handlers
//!
//! `POST /api/chat` streams the answer as server-sent events. `POST /api/answer`
//! returns it in one JSON body. Both answer from the single best-matching
//! document; when nothing matches, the reply is a plain JSON error with status 200.
//! A blank question scores zero against every document and gets that reply too.

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use docchat_common::errors::Result;
use docchat_context::{stream_answer, Frame};
use docchat_search::best_match;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::{info, instrument};

use crate::AppState;

pub const NO_INFORMATION: &str = "No relevant information found to answer your question";

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    fn answer(answer: String) -> Self {
        Self { answer: Some(answer), error: None }
    }

    fn no_information() -> Self {
        Self {
            answer: None,
            error: Some(NO_INFORMATION.to_string()),
        }
    }
}

/// Event data for one relay frame. Carriage returns are not allowed in SSE
/// data, so line endings are normalised to `\n`.
fn event_data(frame: &Frame) -> String {
    let payload = frame.payload();
    if payload.contains('\r') {
        payload.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        payload
    }
}

fn to_event(frame: Frame) -> Event {
    Event::default().data(event_data(&frame))
}

/// Stream the answer to `question` as server-sent events
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Response> {
    let Some(document) = best_match(&request.question, &state.corpus) else {
        info!(question_len = request.question.len(), "No relevant document for question");
        return Ok(Json(ChatResponse::no_information()).into_response());
    };
    info!(document = %document.path(), "Streaming answer");

    let relay = stream_answer(
        state.generator.clone(),
        document.content().to_string(),
        request.question,
    );
    let events = relay
        .into_stream()
        .map(|frame| Ok::<_, Infallible>(to_event(frame)));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()).into_response())
}

/// Answer `question` in a single JSON body
#[instrument(skip_all)]
pub async fn answer(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let Some(document) = best_match(&request.question, &state.corpus) else {
        info!(question_len = request.question.len(), "No relevant document for question");
        return Ok(Json(ChatResponse::no_information()));
    };
    info!(document = %document.path(), "Generating answer");

    let answer = state
        .generator
        .generate(document.content(), &request.question)
        .await?;
    Ok(Json(ChatResponse::answer(answer)))
}
