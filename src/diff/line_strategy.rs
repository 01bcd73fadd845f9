//! Patience-anchored line diff.
//!
//! Lines occurring exactly once in both inputs are used as alignment
//! anchors; the gaps between anchors are diffed with a greedy LCS walk.
//! The same walk is used for every gap size, which keeps the output fully
//! deterministic.

use super::lines::{split_keeping_terminators, SplitLine};
use super::{DiffHunk, DiffLine, DiffLineKind, DiffResult, DiffStrategy};
use std::collections::HashMap;

/// The default, authoritative line-based strategy.
pub struct LineDiffStrategy;

impl DiffStrategy for LineDiffStrategy {
    fn compute(&self, old_content: &str, new_content: &str) -> DiffResult {
        let old_lines = split_keeping_terminators(old_content);
        let new_lines = split_keeping_terminators(new_content);
        let ops = diff_lines(&old_lines, &new_lines);
        group_hunks(&ops)
    }
}

#[derive(Clone, Copy)]
enum OpKind {
    Unchanged,
    Added,
    Removed,
}

struct Op<'a> {
    kind: OpKind,
    line: SplitLine<'a>,
}

fn occurrence_counts<'a>(lines: &[SplitLine<'a>]) -> HashMap<SplitLine<'a>, usize> {
    let mut counts = HashMap::new();
    for line in lines {
        *counts.entry(*line).or_insert(0) += 1;
    }
    counts
}

/// Aligns both inputs on unique anchors, then diffs the gaps in between.
fn diff_lines<'a>(old: &[SplitLine<'a>], new: &[SplitLine<'a>]) -> Vec<Op<'a>> {
    let old_counts = occurrence_counts(old);
    let new_counts = occurrence_counts(new);

    let mut new_positions: HashMap<SplitLine<'a>, usize> = HashMap::new();
    for (idx, line) in new.iter().enumerate() {
        if new_counts.get(line) == Some(&1) {
            new_positions.insert(*line, idx);
        }
    }

    // Anchor pairs ascending in both indices. Walking old in order keeps
    // oldIdx sorted; an anchor whose counterpart would move backwards in
    // new cannot partition both ranges and is skipped.
    let mut anchors: Vec<(usize, usize)> = Vec::new();
    for (old_idx, line) in old.iter().enumerate() {
        if old_counts.get(line) != Some(&1) {
            continue;
        }
        if let Some(&new_idx) = new_positions.get(line) {
            let ascending = anchors
                .last()
                .is_none_or(|&(_, last_new)| new_idx > last_new);
            if ascending {
                anchors.push((old_idx, new_idx));
            }
        }
    }

    let mut ops = Vec::new();
    let mut old_from = 0;
    let mut new_from = 0;
    for (old_idx, new_idx) in anchors {
        diff_gap(&mut ops, &old[old_from..old_idx], &new[new_from..new_idx]);
        ops.push(Op {
            kind: OpKind::Unchanged,
            line: old[old_idx],
        });
        old_from = old_idx + 1;
        new_from = new_idx + 1;
    }
    diff_gap(&mut ops, &old[old_from..], &new[new_from..]);
    ops
}

/// Greedy LCS walk over one gap. Matching heads are unchanged; otherwise an
/// add is preferred when the next new line reappears later in old.
fn diff_gap<'a>(ops: &mut Vec<Op<'a>>, old: &[SplitLine<'a>], new: &[SplitLine<'a>]) {
    let mut i = 0;
    let mut j = 0;
    while i < old.len() || j < new.len() {
        if i < old.len() && j < new.len() && old[i] == new[j] {
            ops.push(Op {
                kind: OpKind::Unchanged,
                line: old[i],
            });
            i += 1;
            j += 1;
        } else if j < new.len() && (i >= old.len() || should_prefer_add(&old[i..], &new[j])) {
            ops.push(Op {
                kind: OpKind::Added,
                line: new[j],
            });
            j += 1;
        } else {
            ops.push(Op {
                kind: OpKind::Removed,
                line: old[i],
            });
            i += 1;
        }
    }
}

fn should_prefer_add(old_rest: &[SplitLine<'_>], next_new: &SplitLine<'_>) -> bool {
    old_rest.iter().any(|line| line == next_new)
}

/// Walks the op stream grouping contiguous changed runs into hunks.
/// Unchanged ops finalize the current hunk and only advance the counters;
/// they are never emitted inside a hunk.
fn group_hunks(ops: &[Op<'_>]) -> DiffResult {
    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut current: Option<DiffHunk> = None;
    let mut old_line = 1;
    let mut new_line = 1;
    let mut added_lines = 0;
    let mut removed_lines = 0;
    let mut unchanged_lines = 0;

    for op in ops {
        match op.kind {
            OpKind::Unchanged => {
                if let Some(hunk) = current.take() {
                    hunks.push(hunk);
                }
                old_line += 1;
                new_line += 1;
                unchanged_lines += 1;
            }
            OpKind::Added => {
                let hunk = current.get_or_insert_with(|| DiffHunk::starting_at(old_line, new_line));
                hunk.lines.push(DiffLine {
                    kind: DiffLineKind::Added,
                    text: op.line.raw(),
                    line_number: new_line,
                });
                hunk.new_line_count += 1;
                new_line += 1;
                added_lines += 1;
            }
            OpKind::Removed => {
                let hunk = current.get_or_insert_with(|| DiffHunk::starting_at(old_line, new_line));
                hunk.lines.push(DiffLine {
                    kind: DiffLineKind::Removed,
                    text: op.line.raw(),
                    line_number: old_line,
                });
                hunk.old_line_count += 1;
                old_line += 1;
                removed_lines += 1;
            }
        }
    }
    if let Some(hunk) = current.take() {
        hunks.push(hunk);
    }

    DiffResult {
        hunks,
        added_lines,
        removed_lines,
        unchanged_lines,
    }
}
