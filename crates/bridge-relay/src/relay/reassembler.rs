//! Incremental SSE frame reassembly.
//!
//! The upstream stream arrives in arbitrary chunk boundaries; this parser
//! buffers raw bytes, splits complete frames on the blank-line delimiter,
//! and decodes each frame's `data:` payload once. Text decoding happens per
//! complete frame, never per chunk, so a multi-byte character split across
//! chunk boundaries reassembles intact. Comment-only frames and malformed
//! payloads are dropped silently; the relay keeps running.

use crate::domain::event::BridgeEvent;

/// Compact the consumed prefix once it crosses this size, so the working
/// buffer does not grow with the whole session.
const COMPACT_THRESHOLD: usize = 16 * 1024;

/// Frame delimiter per the event-stream convention.
const DELIMITER: &[u8] = b"\n\n";

/// Per-session frame reassembler. Never shared across sessions; a fresh
/// client connection gets a fresh buffer.
#[derive(Default)]
pub struct FrameReassembler {
    buf: Vec<u8>,
    consumed: usize,
}

impl FrameReassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one inbound chunk and return every payload completed by it, in
    /// order. A chunk may complete zero, one, or many frames.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<BridgeEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = find_delimiter(&self.buf[self.consumed..]) {
            let frame_end = self.consumed + pos;
            if let Some(event) = parse_frame(&self.buf[self.consumed..frame_end]) {
                events.push(event);
            }
            self.consumed = frame_end + DELIMITER.len();
        }

        if self.consumed >= COMPACT_THRESHOLD {
            self.buf.drain(..self.consumed);
            self.consumed = 0;
        }

        events
    }

    /// Bytes buffered but not yet forming a complete frame.
    pub fn pending(&self) -> usize {
        self.buf.len() - self.consumed
    }
}

fn find_delimiter(buf: &[u8]) -> Option<usize> {
    buf.windows(DELIMITER.len()).position(|w| w == DELIMITER)
}

/// Extract and decode the payload of one complete frame.
///
/// Every `data:` line is stripped of its marker and leading whitespace, then
/// concatenated; multi-line payloads reconstruct one logical payload. Frames
/// without data lines (comments, keep-alives) and payloads that fail to
/// decode yield `None`.
fn parse_frame(frame: &[u8]) -> Option<BridgeEvent> {
    let frame = String::from_utf8_lossy(frame);
    let mut payload = String::new();
    for line in frame.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            payload.push_str(rest.trim_start());
        }
    }
    if payload.is_empty() {
        return None;
    }
    serde_json::from_str(&payload).ok()
}
