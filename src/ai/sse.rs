//! Server-sent event decoding for streamed chat completions
//!
//! Bytes arrive in arbitrary slices, so lines are assembled from raw bytes and
//! only decoded once complete. Each `data:` line carries one JSON delta;
//! `data: [DONE]` ends the stream. Malformed JSON lines are skipped.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::ai::error::AiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Chunk(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamingResponse {
    #[serde(default)]
    choices: Vec<StreamingChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamingChoice {
    #[serde(default)]
    delta: StreamingDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamingDelta {
    content: Option<String>,
}

/// Incremental line decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events completed by `bytes`
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            if let Some(event) = parse_line(&String::from_utf8_lossy(&line)) {
                events.push(event);
            }
        }
        events
    }

    /// Events from a trailing line with no terminator
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
            .into_iter()
            .collect()
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.trim().strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }

    match serde_json::from_str::<StreamingResponse>(data) {
        Ok(response) => response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map(SseEvent::Chunk),
        Err(e) => {
            debug!("Skipping malformed stream chunk: {}", e);
            None
        }
    }
}

/// Text deltas of a streamed completion, in arrival order
pub struct SseChunks<S> {
    bytes: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    done: bool,
}

impl<S> SseChunks<S> {
    pub fn new(bytes: S) -> Self {
        Self {
            bytes,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    fn absorb(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Chunk(text) if !self.done => self.pending.push_back(text),
                SseEvent::Chunk(_) => {}
                SseEvent::Done => self.done = true,
            }
        }
    }
}

impl<S> Stream for SseChunks<S>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    type Item = Result<String, AiError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(chunk) = self.pending.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match self.bytes.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let events = self.decoder.push(&bytes);
                    self.absorb(events);
                }
                Poll::Ready(Some(Err(e))) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(AiError::Request(e))));
                }
                Poll::Ready(None) => {
                    let events = self.decoder.finish();
                    self.absorb(events);
                    self.done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
