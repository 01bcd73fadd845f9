//! Wire-format aware extraction of edits from accumulated model output.
//!
//! Two formats are recognized, in priority order: a fenced `json` block
//! containing a structured edit envelope, and a code-block fallback of the
//! form `` `path`: `` followed by a fenced block. If the envelope is
//! present and decodes to at least one edit it is authoritative and the
//! fallback is never consulted.
//!
//! Parsing is pure and restartable: the same input always yields the same
//! output. Unknown JSON fields are ignored, malformed JSON falls through to
//! the fallback, and malformed fallback matches are skipped.

pub mod tool_calls;

use crate::types::{EditOperation, LineRange, ParsedEdit};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Which wire format produced a parse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    JsonEnvelope,
    CodeBlock,
}

/// Parses the full accumulated stream text into an ordered list of edits.
pub fn parse_streaming_text(text: &str) -> Vec<ParsedEdit> {
    parse_with_format(text).0
}

/// Like [`parse_streaming_text`], additionally reporting which wire format
/// matched. `None` means no edits were found.
pub fn parse_with_format(text: &str) -> (Vec<ParsedEdit>, Option<WireFormat>) {
    let envelope_edits = parse_json_envelope(text);
    if !envelope_edits.is_empty() {
        return (envelope_edits, Some(WireFormat::JsonEnvelope));
    }
    let fallback_edits = parse_code_blocks(text);
    if !fallback_edits.is_empty() {
        return (fallback_edits, Some(WireFormat::CodeBlock));
    }
    (Vec::new(), None)
}

#[derive(Debug, Deserialize)]
struct EditEnvelope {
    #[serde(default)]
    edits: Vec<WireEdit>,
}

#[derive(Debug, Deserialize)]
struct WireEdit {
    file: String,
    operation: String,
    #[serde(default)]
    range: Option<WireRange>,
    #[serde(default)]
    content: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireRange {
    #[serde(rename = "startLine")]
    start_line: i64,
    #[serde(rename = "endLine")]
    end_line: i64,
}

fn envelope_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```json[ \t]*\r?\n(?s:(?P<body>.*?))```")
            .expect("regex to extract fenced json edit envelopes")
    })
}

fn code_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^`?(?P<path>[^\s`]+)`?:[ \t]*\r?\n```(?:[A-Za-z0-9_+.#-]*)[ \t]*\r?\n(?s:(?P<body>.*?))\r?\n?```",
        )
        .expect("regex to extract path-tagged fenced code blocks")
    })
}

/// Decodes the first fenced `json` block that yields at least one edit.
fn parse_json_envelope(text: &str) -> Vec<ParsedEdit> {
    for capture in envelope_regex().captures_iter(text) {
        let Some(body) = capture.name("body") else {
            continue;
        };
        let Ok(envelope) = serde_json::from_str::<EditEnvelope>(body.as_str()) else {
            continue;
        };
        let edits: Vec<ParsedEdit> = envelope
            .edits
            .into_iter()
            .filter_map(wire_edit_to_parsed)
            .collect();
        if !edits.is_empty() {
            return edits;
        }
    }
    Vec::new()
}

fn wire_edit_to_parsed(edit: WireEdit) -> Option<ParsedEdit> {
    let operation = match edit.operation.as_str() {
        "insert" => EditOperation::Insert,
        "replace" => EditOperation::Replace,
        "delete" => EditOperation::Delete,
        _ => return None,
    };
    if edit.file.is_empty() {
        return None;
    }
    let range = edit.range.map(|r| LineRange {
        start: r.start_line.max(1) as usize,
        end: r.end_line.max(1) as usize,
    });
    Some(ParsedEdit {
        file_path: edit.file,
        content: edit.content.join("\n"),
        operation,
        range,
    })
}

/// Extracts `` `path`: `` + fenced-block matches as full-file replacements.
fn parse_code_blocks(text: &str) -> Vec<ParsedEdit> {
    code_block_regex()
        .captures_iter(text)
        .filter_map(|capture| {
            let path = capture.name("path")?.as_str();
            let body = capture.name("body")?.as_str();
            Some(ParsedEdit {
                file_path: path.to_string(),
                content: body.to_string(),
                operation: EditOperation::Replace,
                range: None,
            })
        })
        .collect()
}
