//! Incremental decoding of `data:`-framed Server-Sent Events.
//!
//! Bytes are buffered until a full line is available, so multi-byte UTF-8
//! sequences and lines split across network chunks are reassembled before
//! parsing.

use crate::entities::CompletionChunk;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// One decoded `data:` line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    /// Incremental text fragment of the assistant reply.
    Delta(String),
    /// Valid completion object without a text fragment.
    Metadata,
    /// The `[DONE]` terminator.
    Done,
    /// Payload that was not valid completion JSON.
    Malformed(String),
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns every frame completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|b| *b == b'\n') {
            let line_end = consumed + offset;
            if let Some(frame) = decode_line(&self.pending[consumed..line_end]) {
                frames.push(frame);
            }
            consumed = line_end + 1;
        }
        self.pending.drain(..consumed);
        frames
    }

    /// Flushes a trailing line that arrived without a final newline.
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(raw: &[u8]) -> Option<SseFrame> {
    let text = String::from_utf8_lossy(raw);
    let line = text.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }
    let payload = line.strip_prefix(DATA_PREFIX)?;
    Some(parse_payload(payload))
}

/// Interprets the payload of a single `data:` line.
pub fn parse_payload(payload: &str) -> SseFrame {
    if payload == DONE_SENTINEL {
        return SseFrame::Done;
    }
    match serde_json::from_str::<CompletionChunk>(payload) {
        Ok(chunk) => match chunk.fragment() {
            Some(fragment) => SseFrame::Delta(fragment.to_string()),
            None => SseFrame::Metadata,
        },
        Err(e) => {
            log::warn!("Skipping malformed stream frame ({}): {}", e, payload);
            SseFrame::Malformed(payload.to_string())
        }
    }
}
