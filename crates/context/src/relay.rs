//! Stream relay between a generation task and one consumer
//!
//! The producer runs as its own Tokio task and pushes chunks into an unbounded
//! data channel. Its outcome travels on a single-shot error channel. The
//! consumer pulls [`Frame`]s: every data chunk in production order, then either
//! nothing (normal completion) or exactly one terminal error frame.
//!
//! Dropping the relay aborts the producer task, which also drops any
//! in-flight backend request.

use crate::generation::Generator;
use docchat_common::errors::{AppError, Result};
use docchat_common::metrics;
use futures::Stream;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Producer side of the data channel
#[derive(Debug, Clone)]
pub struct ChunkSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChunkSink {
    /// A sink and the receiver it feeds
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Push one chunk. Returns false once the consumer has gone away.
    pub fn send(&self, chunk: impl Into<String>) -> bool {
        self.tx.send(chunk.into()).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// One unit of relay output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(String),
    Error(String),
}

impl Frame {
    /// The SSE `data` value: raw text, or `{"error":"<message>"}` for errors
    pub fn payload(&self) -> String {
        match self {
            Frame::Data(text) => text.clone(),
            Frame::Error(message) => serde_json::json!({ "error": message }).to_string(),
        }
    }
}

/// Relay lifecycle. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Streaming,
    Completed,
    Failed,
}

/// Consumer handle for one producer task
pub struct StreamRelay {
    data_rx: mpsc::UnboundedReceiver<String>,
    outcome_rx: oneshot::Receiver<AppError>,
    outcome_seen: bool,
    task: Option<JoinHandle<()>>,
    state: RelayState,
    delivered: usize,
}

impl StreamRelay {
    /// Spawn `producer` with a fresh sink.
    ///
    /// The sink is dropped when the producer's future completes, closing the
    /// data channel; a producer error is then published on the error channel.
    pub fn spawn<F, Fut>(producer: F) -> Self
    where
        F: FnOnce(ChunkSink) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (sink, data_rx) = ChunkSink::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        let work = producer(sink);
        let task = tokio::spawn(async move {
            if let Err(e) = work.await {
                // Receiver gone means the consumer already left
                let _ = outcome_tx.send(e);
            }
        });

        Self {
            data_rx,
            outcome_rx,
            outcome_seen: false,
            task: Some(task),
            state: RelayState::Idle,
            delivered: 0,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Data frames handed out so far
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Wait for the next frame. `None` once the relay has terminated.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        match self.state {
            RelayState::Completed | RelayState::Failed => return None,
            RelayState::Idle => self.state = RelayState::Streaming,
            RelayState::Streaming => {}
        }

        loop {
            tokio::select! {
                // Chunks already queued go out before a later error
                biased;

                chunk = self.data_rx.recv() => {
                    return match chunk {
                        Some(chunk) => {
                            self.delivered += 1;
                            Some(Frame::Data(chunk))
                        }
                        None => self.finish().await,
                    };
                }

                outcome = &mut self.outcome_rx, if !self.outcome_seen => {
                    self.outcome_seen = true;
                    if let Ok(error) = outcome {
                        return Some(self.fail(error));
                    }
                    // Producer finished cleanly but a sink clone is still alive; keep draining
                }
            }
        }
    }

    /// Adapt into a `Stream` of frames for response bodies
    pub fn into_stream(self) -> impl Stream<Item = Frame> + Send + 'static {
        futures::stream::unfold(self, |mut relay| async move {
            relay.next_frame().await.map(|frame| (frame, relay))
        })
    }

    /// Data channel closed: report the producer's outcome
    async fn finish(&mut self) -> Option<Frame> {
        if !self.outcome_seen {
            self.outcome_seen = true;
            if let Ok(error) = (&mut self.outcome_rx).await {
                return Some(self.fail(error));
            }
        }

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    return Some(self.fail(AppError::Internal {
                        message: "generation task panicked".to_string(),
                    }));
                }
            }
        }

        self.state = RelayState::Completed;
        metrics::record_stream_chunks(self.delivered);
        debug!(chunks = self.delivered, "Relay completed");
        None
    }

    fn fail(&mut self, error: AppError) -> Frame {
        self.state = RelayState::Failed;
        metrics::record_stream_chunks(self.delivered);
        warn!(chunks = self.delivered, error = %error, "Relay failed");
        Frame::Error(error.to_string())
    }
}

impl Drop for StreamRelay {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                debug!("Relay dropped before producer finished, aborting");
            }
            task.abort();
        }
    }
}

/// Relay a streaming generation for `document` and `question`
pub fn stream_answer(generator: Arc<dyn Generator>, document: String, question: String) -> StreamRelay {
    StreamRelay::spawn(move |sink| async move {
        generator.generate_streaming(&document, &question, &sink).await
    })
}
