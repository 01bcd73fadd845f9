//! Incremental extraction of the tool-call sideband.
//!
//! Out-of-band instrumentation lines of the form
//! `TOOL_CALL:<id>:<name>:<base64-input>\n` may be interleaved with the
//! model stream. Chunks arrive at arbitrary boundaries, so an unterminated
//! trailing line is buffered until the next chunk. The base64 payload is
//! opaque to this crate; lines that fail to decode are silently dropped.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

const TOOL_CALL_PREFIX: &str = "TOOL_CALL:";

/// One decoded sideband tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Vec<u8>,
}

/// Incremental consumer of sideband chunks.
#[derive(Debug, Default)]
pub struct ToolCallExtractor {
    buffer: String,
}

impl ToolCallExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk and returns the tool calls completed by it.
    pub fn push_chunk(&mut self, chunk: &str) -> Vec<ToolCall> {
        self.buffer.push_str(chunk);

        let mut calls = Vec::new();
        while let Some(newline) = self.buffer.find('\n') {
            let rest = self.buffer.split_off(newline + 1);
            let line = std::mem::replace(&mut self.buffer, rest);
            if let Some(call) = parse_tool_call_line(line.trim_end_matches(['\n', '\r'])) {
                calls.push(call);
            }
        }
        calls
    }

    /// True when a partial line is still buffered.
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty()
    }
}

fn parse_tool_call_line(line: &str) -> Option<ToolCall> {
    let rest = line.strip_prefix(TOOL_CALL_PREFIX)?;
    let mut parts = rest.splitn(3, ':');
    let id = parts.next()?;
    let name = parts.next()?;
    let payload = parts.next()?;
    if id.is_empty() || name.is_empty() {
        return None;
    }
    match BASE64.decode(payload) {
        Ok(input) => Some(ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            input,
        }),
        Err(e) => {
            tracing::warn!("Dropping tool call with undecodable payload: {}", e);
            None
        }
    }
}
