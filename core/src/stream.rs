//! Decoding of server-sent completion events into text fragments.
//!
//! The body arrives in arbitrary transport chunks. Lines are reassembled across chunk
//! boundaries before decoding, so a frame or a multi-byte character split between two
//! reads is never lost or mangled.

use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::pin::Pin;
use tracing::{debug, warn};

use crate::errors::{AssistantError, AssistantResult};
use crate::types::CompletionChunk;

pub const DATA_PREFIX: &str = "data:";
pub const DONE_SENTINEL: &str = "[DONE]";

/// Lazy, finite, non-restartable sequence of answer fragments.
///
/// A transport failure is delivered as a final `Err` item.
pub type FragmentStream = Pin<Box<dyn Stream<Item = AssistantResult<String>> + Send>>;

/// Meaningful content of one event line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Fragment(String),
    Done,
}

/// Decodes a single line. Returns `None` for lines that carry nothing: blanks, comments,
/// non-data fields, empty deltas, and malformed payloads (which are logged).
pub fn decode_line(line: &str) -> Option<Frame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    let payload = payload.strip_prefix(' ').unwrap_or(payload);

    if payload == DONE_SENTINEL {
        return Some(Frame::Done);
    }

    match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => chunk
            .into_content()
            .filter(|text| !text.is_empty())
            .map(Frame::Fragment),
        Err(e) => {
            warn!(error = %e, line = payload, "Skipping malformed stream frame");
            None
        }
    }
}

/// Accumulates raw bytes and hands out complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Appends a chunk and returns every line it completed, in order
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(String::from_utf8_lossy(&self.pending[start..end]).into_owned());
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Returns the unterminated tail left when the body ends
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&tail).into_owned())
    }
}

/// Turns a streamed response body into answer fragments.
///
/// Ends at the `[DONE]` sentinel or at end of body. A transport error is yielded as the last
/// item, after every fragment decoded before it.
pub fn decode_fragments<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = Box::pin(body);
        let mut lines = LineBuffer::default();
        let mut done = false;

        while !done {
            let Some(chunk) = body.next().await else {
                break;
            };
            let bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    yield Err(AssistantError::ResponseError(format!(
                        "Completion stream interrupted: {}",
                        e
                    )));
                    break;
                }
            };
            for line in lines.push(bytes.as_ref()) {
                match decode_line(&line) {
                    Some(Frame::Fragment(text)) => {
                        yield Ok(text);
                    }
                    Some(Frame::Done) => {
                        done = true;
                        break;
                    }
                    None => {}
                }
            }
        }

        if !done {
            if let Some(Frame::Fragment(text)) = lines.finish().as_deref().and_then(decode_line) {
                yield Ok(text);
            }
        }
        debug!("Completion stream finished");
    })
}
