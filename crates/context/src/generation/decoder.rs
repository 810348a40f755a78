//! Incremental decoder for the backend's stream of JSON objects
//!
//! The backend writes one JSON object per generated increment, normally one
//! per line. Network reads do not respect object boundaries, so bytes are
//! buffered until at least one complete object is available.

use docchat_common::errors::{AppError, Result};
use serde_json::{Map, Value};

/// One decoded increment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendChunk {
    /// Generated text, when the object carries a string `response`
    pub response: Option<String>,
    /// True when the object carries `done: true`
    pub done: bool,
}

impl BackendChunk {
    fn from_object(object: Map<String, Value>) -> Self {
        Self {
            response: object
                .get("response")
                .and_then(Value::as_str)
                .map(str::to_string),
            done: object.get("done").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

/// Buffers raw body bytes and yields complete objects
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and decode every object completed by them
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<BackendChunk>> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        let mut consumed = 0;
        let mut objects = serde_json::Deserializer::from_slice(&self.buffer)
            .into_iter::<Map<String, Value>>();

        loop {
            match objects.next() {
                Some(Ok(object)) => {
                    consumed = objects.byte_offset();
                    chunks.push(BackendChunk::from_object(object));
                }
                // Incomplete trailing object: wait for more bytes
                Some(Err(e)) if e.is_eof() => break,
                Some(Err(e)) => {
                    return Err(AppError::Decode {
                        message: e.to_string(),
                    })
                }
                None => {
                    consumed = self.buffer.len();
                    break;
                }
            }
        }

        self.buffer.drain(..consumed);
        Ok(chunks)
    }

    /// Signal end of body. Leftover non-whitespace bytes are a truncated object.
    pub fn finish(self) -> Result<()> {
        if self.buffer.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(AppError::Decode {
                message: format!(
                    "unexpected end of stream with {} undecoded bytes",
                    self.buffer.len()
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(chunks: &[BackendChunk]) -> Vec<Option<&str>> {
        chunks.iter().map(|c| c.response.as_deref()).collect()
    }

    #[test]
    fn test_decodes_lines() {
        let mut decoder = StreamDecoder::new();
        let chunks = decoder
            .feed(b"{\"response\":\"Hel\",\"done\":false}\n{\"response\":\"lo\",\"done\":false}\n")
            .unwrap();
        assert_eq!(text(&chunks), vec![Some("Hel"), Some("lo")]);
        assert!(chunks.iter().all(|c| !c.done));
        decoder.finish().unwrap();
    }

    #[test]
    fn test_object_split_across_reads() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.feed(b"{\"respo").unwrap().is_empty());
        assert!(decoder.feed(b"nse\":\"wor").unwrap().is_empty());
        let chunks = decoder.feed(b"ld\"}\n{\"done\":true}").unwrap();
        assert_eq!(
            chunks,
            vec![
                BackendChunk { response: Some("world".into()), done: false },
                BackendChunk { response: None, done: true },
            ]
        );
        decoder.finish().unwrap();
    }

    #[test]
    fn test_objects_without_newlines() {
        let mut decoder = StreamDecoder::new();
        let chunks = decoder.feed(b"{\"response\":\"a\"}{\"response\":\"b\"}  ").unwrap();
        assert_eq!(text(&chunks), vec![Some("a"), Some("b")]);
        decoder.finish().unwrap();
    }

    #[test]
    fn test_non_string_response_ignored() {
        let mut decoder = StreamDecoder::new();
        let chunks = decoder
            .feed(b"{\"response\":42,\"done\":\"yes\"}\n{\"model\":\"m\"}\n")
            .unwrap();
        assert_eq!(chunks, vec![BackendChunk::default(), BackendChunk::default()]);
    }

    #[test]
    fn test_malformed_object_fails() {
        let mut decoder = StreamDecoder::new();
        let err = decoder.feed(b"{\"response\":\"ok\"}\n{not json}\n").unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[test]
    fn test_non_object_fails() {
        let mut decoder = StreamDecoder::new();
        let err = decoder.feed(b"[1,2,3]\n").unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[test]
    fn test_truncated_object_at_end_fails() {
        let mut decoder = StreamDecoder::new();
        let chunks = decoder.feed(b"{\"response\":\"a\"}\n{\"response\":\"b").unwrap();
        assert_eq!(text(&chunks), vec![Some("a")]);
        let err = decoder.finish().unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
    }

    #[test]
    fn test_empty_body() {
        let decoder = StreamDecoder::new();
        decoder.finish().unwrap();
    }
}
