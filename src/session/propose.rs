//! Projection of parsed edits onto file snapshots.
//!
//! Turns each [`ParsedEdit`] whose path matches a session snapshot into a
//! [`ProposedEdit`] by applying the operation to the original content and
//! diffing the result. Edits referencing unknown paths are dropped.

use crate::config::SessionConfig;
use crate::diff::DiffEngine;
use crate::parser::{parse_with_format, WireFormat};
use crate::types::{EditOperation, FileSnapshot, LineRange, ParsedEdit, ProposedEdit};
use std::collections::HashMap;

/// Applies a parsed edit's operation to the original content. Line numbers
/// are 1-based inclusive and clamped; lines are joined with `"\n"`.
pub(crate) fn apply_operation(original: &str, edit: &ParsedEdit) -> String {
    let line_count = original.split('\n').count();
    match (edit.operation, edit.range) {
        (EditOperation::Insert, Some(range)) => {
            let index = range.start.saturating_sub(1).min(line_count);
            splice_lines(original, index, index, Some(&edit.content))
        }
        (EditOperation::Insert, None) => format!("{}\n{}", original, edit.content),
        (EditOperation::Replace, Some(range)) => {
            let (start, end) = clamp_range(range, line_count);
            splice_lines(original, start, end, Some(&edit.content))
        }
        (EditOperation::Replace, None) => edit.content.clone(),
        (EditOperation::Delete, Some(range)) => {
            let (start, end) = clamp_range(range, line_count);
            splice_lines(original, start, end, None)
        }
        (EditOperation::Delete, None) => String::new(),
    }
}

/// Converts a 1-based inclusive range into 0-based start / exclusive end
/// indices, clamped to the line count.
fn clamp_range(range: LineRange, line_count: usize) -> (usize, usize) {
    let start = (range.start.max(1) - 1).min(line_count);
    let end = range.end.min(line_count).max(start);
    (start, end)
}

/// Replaces the line interval `[start, end)` of `original` with the
/// replacement's lines (or removes it when `None`).
fn splice_lines(original: &str, start: usize, end: usize, replacement: Option<&str>) -> String {
    let lines: Vec<&str> = original.split('\n').collect();
    let mut result: Vec<&str> = Vec::with_capacity(lines.len());
    result.extend(&lines[..start]);
    if let Some(content) = replacement {
        result.extend(content.split('\n'));
    }
    result.extend(&lines[end..]);
    result.join("\n")
}

/// Parses the accumulated stream text and projects every edit matching a
/// known snapshot into a proposed edit with its diff.
pub(crate) fn build_proposed_edits(
    stream_text: &str,
    snapshots: &HashMap<String, FileSnapshot>,
    engine: &DiffEngine,
    config: &SessionConfig,
) -> Vec<ProposedEdit> {
    let (parsed, format) = parse_with_format(stream_text);
    let confidence = match format {
        Some(WireFormat::JsonEnvelope) => 1.0,
        _ => config.fallback_confidence,
    };
    parsed
        .into_iter()
        .filter_map(|edit| {
            let snapshot = snapshots.get(&edit.file_path)?;
            let proposed_content = apply_operation(&snapshot.content, &edit);
            let diff = engine.compute_diff(&snapshot.content, &proposed_content);
            Some(ProposedEdit::new(
                edit.file_path,
                snapshot.content.clone(),
                proposed_content,
                diff,
                confidence,
                config.source.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineRange;

    fn edit(operation: EditOperation, range: Option<LineRange>, content: &str) -> ParsedEdit {
        ParsedEdit {
            file_path: "f".to_string(),
            content: content.to_string(),
            operation,
            range,
        }
    }

    #[test]
    fn test_insert_with_range_inserts_before_start() {
        let result = apply_operation(
            "a\nb\nc",
            &edit(
                EditOperation::Insert,
                Some(LineRange { start: 2, end: 2 }),
                "x\ny",
            ),
        );
        assert_eq!(result, "a\nx\ny\nb\nc");
    }

    #[test]
    fn test_insert_with_range_past_end_appends() {
        let result = apply_operation(
            "a\nb",
            &edit(
                EditOperation::Insert,
                Some(LineRange { start: 99, end: 99 }),
                "x",
            ),
        );
        assert_eq!(result, "a\nb\nx");
    }

    #[test]
    fn test_insert_without_range_appends_with_newline() {
        let result = apply_operation("a", &edit(EditOperation::Insert, None, "b"));
        assert_eq!(result, "a\nb");
    }

    #[test]
    fn test_replace_with_range_is_inclusive() {
        let result = apply_operation(
            "a\nb\nc\nd",
            &edit(
                EditOperation::Replace,
                Some(LineRange { start: 2, end: 3 }),
                "x",
            ),
        );
        assert_eq!(result, "a\nx\nd");
    }

    #[test]
    fn test_replace_clamps_out_of_bounds_range() {
        let result = apply_operation(
            "a\nb",
            &edit(
                EditOperation::Replace,
                Some(LineRange { start: 1, end: 99 }),
                "x",
            ),
        );
        assert_eq!(result, "x");
    }

    #[test]
    fn test_replace_without_range_replaces_everything() {
        let result = apply_operation("a\nb", &edit(EditOperation::Replace, None, "x"));
        assert_eq!(result, "x");
    }

    #[test]
    fn test_delete_with_range_removes_inclusive_interval() {
        let result = apply_operation(
            "a\nb\nc\nd",
            &edit(EditOperation::Delete, Some(LineRange { start: 2, end: 3 }), ""),
        );
        assert_eq!(result, "a\nd");
    }

    #[test]
    fn test_delete_without_range_empties_file() {
        let result = apply_operation("a\nb", &edit(EditOperation::Delete, None, ""));
        assert_eq!(result, "");
    }

    #[test]
    fn test_build_drops_edits_for_unknown_paths() {
        let mut snapshots = HashMap::new();
        snapshots.insert(
            "known.rs".to_string(),
            FileSnapshot::new("known.rs", "old", None),
        );
        let text = "`unknown.rs`:\n```\nnew\n```\n\n`known.rs`:\n```\nnew\n```";
        let edits = build_proposed_edits(
            text,
            &snapshots,
            &DiffEngine::new(),
            &SessionConfig::default(),
        );
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].file_path, "known.rs");
        assert_eq!(edits[0].original_content, "old");
        assert_eq!(edits[0].proposed_content, "new");
    }

    #[test]
    fn test_fallback_edits_get_fallback_confidence() {
        let mut snapshots = HashMap::new();
        snapshots.insert("a.rs".to_string(), FileSnapshot::new("a.rs", "old", None));
        let config = SessionConfig::default();

        let fallback = build_proposed_edits(
            "`a.rs`:\n```\nnew\n```",
            &snapshots,
            &DiffEngine::new(),
            &config,
        );
        assert!((fallback[0].confidence - config.fallback_confidence).abs() < f64::EPSILON);

        let envelope = build_proposed_edits(
            "```json\n{ \"edits\": [ { \"file\": \"a.rs\", \"operation\": \"replace\", \"content\": [\"new\"] } ] }\n```",
            &snapshots,
            &DiffEngine::new(),
            &config,
        );
        assert!((envelope[0].confidence - 1.0).abs() < f64::EPSILON);
    }
}
