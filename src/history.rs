//! Bounded transaction history with delta-compressed snapshots.
//!
//! Applied transactions form the undo stack, reverted transactions the redo
//! stack. Snapshot entries are aligned 1:1 with the applied sequence: the
//! first entry stores a full snapshot, every later entry stores only the
//! delta for the files its transaction touched. Reconstruction folds the
//! entry chain, so a long history over a large codebase stays cheap.

use crate::transaction::{EditTransaction, TransactionSnapshot};
use crate::types::FileSnapshot;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

enum SnapshotEntry {
    Full(TransactionSnapshot),
    Delta {
        timestamp: DateTime<Utc>,
        files: HashMap<String, FileSnapshot>,
    },
}

impl SnapshotEntry {
    fn files(&self) -> &HashMap<String, FileSnapshot> {
        match self {
            Self::Full(snapshot) => &snapshot.file_snapshots,
            Self::Delta { files, .. } => files,
        }
    }

    fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Full(snapshot) => snapshot.timestamp,
            Self::Delta { timestamp, .. } => *timestamp,
        }
    }

    fn into_parts(self) -> (DateTime<Utc>, HashMap<String, FileSnapshot>) {
        match self {
            Self::Full(snapshot) => (snapshot.timestamp, snapshot.file_snapshots),
            Self::Delta { timestamp, files } => (timestamp, files),
        }
    }
}

struct RevertedEntry {
    transaction: EditTransaction,
    before_at: DateTime<Utc>,
    before: HashMap<String, FileSnapshot>,
}

/// Bounded sequence of applied/reverted transactions with their pre-commit
/// snapshots.
pub struct TransactionHistory {
    applied: Vec<EditTransaction>,
    entries: Vec<SnapshotEntry>,
    reverted: Vec<RevertedEntry>,
    limit: usize,
}

impl TransactionHistory {
    /// Creates a history bounded to `limit` applied transactions. A limit
    /// of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            applied: Vec::new(),
            entries: Vec::new(),
            reverted: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Records a committed transaction with its pre-commit snapshot.
    /// Clears the redo stack and enforces the size bound by evicting the
    /// oldest transaction together with its snapshot entry.
    pub fn record_applied(&mut self, transaction: EditTransaction, snapshot: TransactionSnapshot) {
        self.reverted.clear();
        let entry = if self.entries.is_empty() {
            SnapshotEntry::Full(snapshot)
        } else {
            let files = transaction
                .affected_files()
                .into_iter()
                .filter_map(|path| {
                    snapshot
                        .file_snapshots
                        .get(&path)
                        .map(|s| (path, s.clone()))
                })
                .collect();
            SnapshotEntry::Delta {
                timestamp: snapshot.timestamp,
                files,
            }
        };
        self.applied.push(transaction);
        self.entries.push(entry);
        self.enforce_bound();
    }

    fn enforce_bound(&mut self) {
        while self.applied.len() > self.limit {
            self.applied.remove(0);
            self.entries.remove(0);
        }
    }

    /// Pops the most recent applied transaction onto the reverted stack and
    /// returns it with its reconstructed pre-commit snapshot. Transactions
    /// flagged `can_undo: false` stay put.
    pub fn undo(&mut self) -> Option<(EditTransaction, TransactionSnapshot)> {
        let last = self.applied.last()?;
        if !last.metadata.can_undo {
            return None;
        }
        let snapshot = self.get_snapshot(last.id)?;
        let transaction = self.applied.pop()?;
        let entry = self.entries.pop()?;
        let (before_at, before) = entry.into_parts();
        self.reverted.push(RevertedEntry {
            transaction: transaction.clone(),
            before_at,
            before,
        });
        Some((transaction, snapshot))
    }

    /// Pushes a transaction onto the reverted stack together with the
    /// pre-commit state of its affected files, making it redoable. `undo`
    /// does this automatically; this entry point exists for callers
    /// replaying reverts recorded elsewhere.
    pub fn record_reverted(
        &mut self,
        transaction: EditTransaction,
        before: HashMap<String, FileSnapshot>,
    ) {
        self.reverted.push(RevertedEntry {
            transaction,
            before_at: Utc::now(),
            before,
        });
    }

    /// Re-applies the most recent reverted transaction to the history and
    /// returns it.
    pub fn redo(&mut self) -> Option<EditTransaction> {
        let RevertedEntry {
            transaction,
            before_at,
            before,
        } = self.reverted.pop()?;
        let entry = if self.entries.is_empty() {
            SnapshotEntry::Full(TransactionSnapshot {
                transaction_id: transaction.id,
                timestamp: before_at,
                file_snapshots: before,
            })
        } else {
            SnapshotEntry::Delta {
                timestamp: before_at,
                files: before,
            }
        };
        self.applied.push(transaction.clone());
        self.entries.push(entry);
        self.enforce_bound();
        Some(transaction)
    }

    /// Reconstructs the pre-commit snapshot for a transaction still in the
    /// applied sequence, restricted to its affected files.
    pub fn get_snapshot(&self, transaction_id: Uuid) -> Option<TransactionSnapshot> {
        let index = self
            .applied
            .iter()
            .position(|tx| tx.id == transaction_id)?;
        let mut accumulated: HashMap<String, FileSnapshot> = HashMap::new();
        for entry in self.entries.iter().take(index + 1) {
            for (path, snapshot) in entry.files() {
                accumulated.insert(path.clone(), snapshot.clone());
            }
        }
        let affected = self.applied[index].affected_files();
        let file_snapshots = accumulated
            .into_iter()
            .filter(|(path, _)| affected.contains(path))
            .collect();
        Some(TransactionSnapshot {
            transaction_id,
            timestamp: self.entries[index].timestamp(),
            file_snapshots,
        })
    }

    pub fn get_last_applied(&self) -> Option<&EditTransaction> {
        self.applied.last()
    }

    pub fn get_last_reverted(&self) -> Option<&EditTransaction> {
        self.reverted.last().map(|entry| &entry.transaction)
    }

    pub fn can_undo(&self) -> bool {
        !self.applied.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.reverted.is_empty()
    }

    pub fn applied_len(&self) -> usize {
        self.applied.len()
    }

    pub fn snapshot_entry_len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.applied.clear();
        self.entries.clear();
        self.reverted.clear();
    }
}
