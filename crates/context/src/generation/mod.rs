//! Generation backend client
//!
//! Renders a prompt from a document and a question, persists it, submits it
//! to the backend's `/api/generate` endpoint and reads the streamed reply.
//! Two forms are offered:
//! - `generate` accumulates the whole answer
//! - `generate_streaming` pushes each increment to a [`ChunkSink`] as soon as it is decoded

mod decoder;

pub use decoder::{BackendChunk, StreamDecoder};

use crate::prompt::{DebugPromptWriter, PromptTemplate};
use crate::relay::ChunkSink;
use async_trait::async_trait;
use docchat_common::config::GenerationConfig;
use docchat_common::errors::{AppError, Result};
use docchat_common::metrics;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Trait for answer generation
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate the complete answer
    async fn generate(&self, document: &str, question: &str) -> Result<String>;

    /// Push answer increments to `sink` in production order.
    ///
    /// Chunks already pushed are not retracted if an error follows. Returns
    /// early, without error, once the sink's consumer has gone away.
    async fn generate_streaming(&self, document: &str, question: &str, sink: &ChunkSink) -> Result<()>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Request body for the generate endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// Whether reading stopped because the consumer went away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadOutcome {
    Finished,
    Abandoned,
}

/// Client for an Ollama-compatible generation backend
pub struct OllamaGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    template_path: PathBuf,
    debug_prompts: DebugPromptWriter,
}

impl OllamaGenerator {
    /// Create a new generator from configuration
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        // Connect timeout only: a slow model must be allowed to keep streaming
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint(),
            model: config.model.clone(),
            template_path: config.template_path.clone(),
            debug_prompts: DebugPromptWriter::new(config.debug_dir.clone()),
        })
    }

    /// Template, persist, and submit. Returns the successful response with its body unread.
    async fn open_stream(&self, document: &str, question: &str) -> Result<reqwest::Response> {
        let template = PromptTemplate::load(&self.template_path).await?;
        let prompt = template.render(document, question);
        let saved = self.debug_prompts.persist(&prompt).await?;

        let request = GenerationRequest {
            model: self.model.clone(),
            prompt,
            stream: true,
        };

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_file = %saved.display(),
            "Submitting generation request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Network {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Generation backend rejected request");
            return Err(AppError::BackendStatus {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    /// Decode the body, handing each `response` text to `on_text` until
    /// end of stream, a `done: true` object, or `on_text` returning false.
    async fn read_stream<F>(response: reqwest::Response, mut on_text: F) -> Result<ReadOutcome>
    where
        F: FnMut(String) -> bool + Send,
    {
        let mut body = response.bytes_stream();
        let mut decoder = StreamDecoder::new();

        while let Some(bytes) = body.next().await {
            let bytes = bytes.map_err(|e| AppError::Decode {
                message: e.to_string(),
            })?;

            for chunk in decoder.feed(&bytes)? {
                if let Some(text) = chunk.response {
                    if !on_text(text) {
                        return Ok(ReadOutcome::Abandoned);
                    }
                }
                if chunk.done {
                    return Ok(ReadOutcome::Finished);
                }
            }
        }

        decoder.finish()?;
        Ok(ReadOutcome::Finished)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, document: &str, question: &str) -> Result<String> {
        let start = Instant::now();

        let result = async {
            let response = self.open_stream(document, question).await?;
            let mut answer = String::new();
            Self::read_stream(response, |text| {
                answer.push_str(&text);
                true
            })
            .await?;
            Ok::<_, AppError>(answer)
        }
        .await;

        metrics::record_generation(start.elapsed().as_secs_f64(), "blocking", result.is_ok());
        if let Ok(answer) = &result {
            info!(model = %self.model, chars = answer.len(), "Answer generated");
        }
        result
    }

    async fn generate_streaming(&self, document: &str, question: &str, sink: &ChunkSink) -> Result<()> {
        let start = Instant::now();
        let mut chunks = 0usize;

        let result = async {
            let response = self.open_stream(document, question).await?;
            Self::read_stream(response, |text| {
                chunks += 1;
                sink.send(text)
            })
            .await
        }
        .await;

        metrics::record_generation(start.elapsed().as_secs_f64(), "stream", result.is_ok());
        match &result {
            Ok(ReadOutcome::Finished) => {
                info!(model = %self.model, chunks, "Answer streamed");
            }
            Ok(ReadOutcome::Abandoned) => {
                info!(model = %self.model, chunks, "Stream consumer disconnected, stopping generation");
            }
            Err(e) => {
                warn!(model = %self.model, chunks, error = %e, "Streaming generation failed");
            }
        }
        result.map(|_| ())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
