//! Core value types for the edit pipeline.
//!
//! Everything here is an immutable value: snapshots of file content, parsed
//! edits extracted from a model stream, and proposed edits carrying the
//! original content, the projected content, and the computed diff.

use crate::diff::DiffResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Immutable record of a file's content at a moment in time.
///
/// The path is the unique key within a session's snapshot map. Two
/// snapshots are equal iff all fields are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: String,
    pub content: String,
    pub language: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl FileSnapshot {
    pub fn new(
        path: impl Into<String>,
        content: impl Into<String>,
        language: Option<String>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            language,
            timestamp: Utc::now(),
        }
    }
}

/// The user instruction that started a session, with optional context
/// key/value pairs. Created once per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditInstruction {
    pub text: String,
    pub context: Option<HashMap<String, String>>,
}

impl EditInstruction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: HashMap<String, String>) -> Self {
        self.context = Some(context);
        self
    }
}

/// Edit operation extracted from the model stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EditOperation {
    Insert,
    Replace,
    Delete,
}

/// 1-based inclusive line range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// A single edit as extracted by the stream parser. Has no identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedEdit {
    pub file_path: String,
    pub content: String,
    pub operation: EditOperation,
    pub range: Option<LineRange>,
}

/// Classification of a proposed edit relative to the original content.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Creation,
    Modification,
    Deletion,
}

impl EditType {
    /// Infers the edit type from original and proposed content: creation
    /// when the original is empty and the proposal is not, deletion for the
    /// inverse, modification otherwise.
    pub fn infer(original: &str, proposed: &str) -> Self {
        if original.is_empty() && !proposed.is_empty() {
            Self::Creation
        } else if !original.is_empty() && proposed.is_empty() {
            Self::Deletion
        } else {
            Self::Modification
        }
    }
}

/// A parsed edit joined with the matching file snapshot: the original
/// content, the projected proposed content, and the computed diff.
///
/// Identity is the freshly generated id; equality compares ids only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedEdit {
    pub id: Uuid,
    pub file_path: String,
    pub original_content: String,
    pub proposed_content: String,
    pub diff: DiffResult,
    pub edit_type: EditType,
    pub confidence: f64,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl ProposedEdit {
    pub fn new(
        file_path: impl Into<String>,
        original_content: impl Into<String>,
        proposed_content: impl Into<String>,
        diff: DiffResult,
        confidence: f64,
        source: impl Into<String>,
    ) -> Self {
        let original_content = original_content.into();
        let proposed_content = proposed_content.into();
        let edit_type = EditType::infer(&original_content, &proposed_content);
        Self {
            id: Uuid::new_v4(),
            file_path: file_path.into(),
            original_content,
            proposed_content,
            diff,
            edit_type,
            confidence: confidence.clamp(0.0, 1.0),
            source: source.into(),
            timestamp: Utc::now(),
        }
    }
}

impl PartialEq for ProposedEdit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ProposedEdit {}

/// Value object handed to the caller after a commit so its adapter can
/// perform the write and undo can reconstruct the reverse delta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditToApply {
    pub id: Uuid,
    pub file_path: String,
    pub new_content: String,
    pub original_content: String,
}

impl From<&ProposedEdit> for EditToApply {
    fn from(edit: &ProposedEdit) -> Self {
        Self {
            id: edit.id,
            file_path: edit.file_path.clone(),
            new_content: edit.proposed_content.clone(),
            original_content: edit.original_content.clone(),
        }
    }
}
