//! Transactions: ordered bundles of proposed edits treated as a single
//! commit/undo unit, plus the pre-commit snapshot captured alongside them.

use crate::types::{FileSnapshot, ProposedEdit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata attached to a transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionMetadata {
    pub description: String,
    pub source: String,
    pub can_undo: bool,
}

impl Default for TransactionMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            source: "ai-edit".to_string(),
            can_undo: true,
        }
    }
}

/// An ordered, id-identified bundle of proposed edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditTransaction {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub edits: Vec<ProposedEdit>,
    pub metadata: TransactionMetadata,
}

impl EditTransaction {
    pub fn new(edits: Vec<ProposedEdit>, metadata: TransactionMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            edits,
            metadata,
        }
    }

    /// Distinct file paths touched by this transaction, in first-seen order.
    pub fn affected_files(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for edit in &self.edits {
            if !seen.contains(&edit.file_path) {
                seen.push(edit.file_path.clone());
            }
        }
        seen
    }

    /// A transaction is valid against a snapshot map iff every edit's file
    /// path is a key in the map.
    pub fn is_valid_against(&self, snapshots: &HashMap<String, FileSnapshot>) -> bool {
        self.edits
            .iter()
            .all(|edit| snapshots.contains_key(&edit.file_path))
    }
}

/// The pre-commit state of every path touched by one transaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionSnapshot {
    pub transaction_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub file_snapshots: HashMap<String, FileSnapshot>,
}

impl TransactionSnapshot {
    /// Captures the pre-commit state of the transaction's affected files
    /// out of the session's snapshot map.
    pub fn capture(
        transaction: &EditTransaction,
        snapshots: &HashMap<String, FileSnapshot>,
    ) -> Self {
        let mut file_snapshots = HashMap::new();
        for path in transaction.affected_files() {
            if let Some(snapshot) = snapshots.get(&path) {
                file_snapshots.insert(path, snapshot.clone());
            }
        }
        Self {
            transaction_id: transaction.id,
            timestamp: Utc::now(),
            file_snapshots,
        }
    }
}
