//! DocChat Context
//!
//! Turns a retrieved document and a question into an answer:
//! - Prompt templating and debug prompt persistence
//! - Generation backend client (blocking and streaming forms)
//! - Stream relay from a generation task to a single consumer

pub mod generation;
pub mod prompt;
pub mod relay;

pub use generation::{GenerationRequest, Generator, OllamaGenerator};
pub use prompt::{DebugPromptWriter, PromptTemplate};
pub use relay::{stream_answer, ChunkSink, Frame, RelayState, StreamRelay};
