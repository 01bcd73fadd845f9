use super::lines::split_keeping_terminators;
use super::{DiffEngine, DiffLineKind, DiffResult};
use proptest::prelude::*;

/// Applies a diff to the old content as a sequence of line removals and
/// additions, reconstructing the new content.
fn reconstruct(old: &str, diff: &DiffResult) -> String {
    let old_lines = split_keeping_terminators(old);
    let mut result = String::new();
    let mut old_idx = 0;
    for hunk in &diff.hunks {
        while old_idx + 1 < hunk.old_start_line {
            result.push_str(&old_lines[old_idx].raw());
            old_idx += 1;
        }
        for line in &hunk.lines {
            match line.kind {
                DiffLineKind::Removed => old_idx += 1,
                DiffLineKind::Added => result.push_str(&line.text),
                DiffLineKind::Unchanged => panic!("unchanged line inside a hunk"),
            }
        }
    }
    while old_idx < old_lines.len() {
        result.push_str(&old_lines[old_idx].raw());
        old_idx += 1;
    }
    result
}

#[test]
fn test_identical_contents_produce_no_hunks() {
    let diff = DiffEngine::new().compute_diff("a\nb\nc", "a\nb\nc");
    assert!(diff.hunks.is_empty());
    assert!(!diff.has_changes());
    assert_eq!(diff.unchanged_lines, 3);
    assert_eq!(diff.added_lines, 0);
    assert_eq!(diff.removed_lines, 0);
}

#[test]
fn test_single_line_replacement() {
    let diff = DiffEngine::new().compute_diff("a\nb\nc", "a\nx\nc");
    assert_eq!(diff.hunks.len(), 1);
    assert_eq!(diff.added_lines, 1);
    assert_eq!(diff.removed_lines, 1);
    assert_eq!(diff.unchanged_lines, 2);

    let hunk = &diff.hunks[0];
    assert_eq!(hunk.old_start_line, 2);
    assert_eq!(hunk.new_start_line, 2);
    assert_eq!(hunk.old_line_count, 1);
    assert_eq!(hunk.new_line_count, 1);
}

#[test]
fn test_pure_insertion() {
    let diff = DiffEngine::new().compute_diff("a\nc", "a\nb\nc");
    assert_eq!(diff.added_lines, 1);
    assert_eq!(diff.removed_lines, 0);
    let hunk = &diff.hunks[0];
    assert_eq!(hunk.old_line_count, 0);
    assert_eq!(hunk.new_line_count, 1);
    assert_eq!(hunk.old_start_line, 2);
    assert_eq!(hunk.new_start_line, 2);
}

#[test]
fn test_pure_deletion() {
    let diff = DiffEngine::new().compute_diff("a\nb\nc", "a\nc");
    assert_eq!(diff.added_lines, 0);
    assert_eq!(diff.removed_lines, 1);
    let hunk = &diff.hunks[0];
    assert_eq!(hunk.lines[0].line_number, 2);
    assert_eq!(hunk.lines[0].text, "b\n");
}

#[test]
fn test_empty_to_content() {
    let diff = DiffEngine::new().compute_diff("", "hello\nworld");
    assert!(diff.has_changes());
    assert_eq!(reconstruct("", &diff), "hello\nworld");
}

#[test]
fn test_content_to_empty() {
    let diff = DiffEngine::new().compute_diff("hello\nworld", "");
    assert!(diff.has_changes());
    assert_eq!(reconstruct("hello\nworld", &diff), "");
}

#[test]
fn test_crlf_terminators_round_trip() {
    let old = "a\r\nb\r\nc";
    let new = "a\r\nx\r\nc";
    let diff = DiffEngine::new().compute_diff(old, new);
    assert_eq!(reconstruct(old, &diff), new);
    let hunk = &diff.hunks[0];
    assert_eq!(hunk.lines[0].text, "b\r\n");
    assert_eq!(hunk.lines[1].text, "x\r\n");
}

#[test]
fn test_terminator_change_is_a_change() {
    let diff = DiffEngine::new().compute_diff("a\nb", "a\r\nb");
    assert!(diff.has_changes());
    assert_eq!(reconstruct("a\nb", &diff), "a\r\nb");
}

#[test]
fn test_anchors_keep_moved_blocks_aligned() {
    let old = "fn one() {}\nfn two() {}\nfn three() {}";
    let new = "fn one() {}\nfn two(x: u32) {}\nfn three() {}";
    let diff = DiffEngine::new().compute_diff(old, new);
    assert_eq!(diff.hunks.len(), 1);
    assert_eq!(diff.added_lines, 1);
    assert_eq!(diff.removed_lines, 1);
    assert_eq!(reconstruct(old, &diff), new);
}

#[test]
fn test_trailing_newline_difference() {
    let diff = DiffEngine::new().compute_diff("a", "a\n");
    assert!(diff.has_changes());
    assert_eq!(reconstruct("a", &diff), "a\n");
}

#[test]
fn test_counts_match_hunk_contents() {
    let diff = DiffEngine::new().compute_diff("a\nb\nc\nd", "a\nx\ny\nd\ne");
    let added: usize = diff
        .hunks
        .iter()
        .flat_map(|h| &h.lines)
        .filter(|l| l.kind == DiffLineKind::Added)
        .count();
    let removed: usize = diff
        .hunks
        .iter()
        .flat_map(|h| &h.lines)
        .filter(|l| l.kind == DiffLineKind::Removed)
        .count();
    assert_eq!(diff.added_lines, added);
    assert_eq!(diff.removed_lines, removed);
}

proptest! {
    #[test]
    fn prop_round_trip(
        old in proptest::string::string_regex("[abcx \\r\\n]{0,60}").unwrap(),
        new in proptest::string::string_regex("[abcx \\r\\n]{0,60}").unwrap(),
    ) {
        let diff = DiffEngine::new().compute_diff(&old, &new);
        prop_assert_eq!(reconstruct(&old, &diff), new);
    }

    #[test]
    fn prop_deterministic(
        old in proptest::string::string_regex("[ab\\n]{0,40}").unwrap(),
        new in proptest::string::string_regex("[ab\\n]{0,40}").unwrap(),
    ) {
        let engine = DiffEngine::new();
        prop_assert_eq!(engine.compute_diff(&old, &new), engine.compute_diff(&old, &new));
    }

    #[test]
    fn prop_hunks_contain_only_changes(
        old in proptest::string::string_regex("[abc\\n]{0,40}").unwrap(),
        new in proptest::string::string_regex("[abc\\n]{0,40}").unwrap(),
    ) {
        let diff = DiffEngine::new().compute_diff(&old, &new);
        for hunk in &diff.hunks {
            prop_assert!(!hunk.lines.is_empty());
            for line in &hunk.lines {
                prop_assert!(line.kind != DiffLineKind::Unchanged);
            }
        }
    }
}
