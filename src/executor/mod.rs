//! Disk execution: the single write pipeline with snapshot-based rollback.
//!
//! The executor is the sole write broker. It captures a workspace snapshot
//! before touching anything, then applies each edit in transaction order
//! through the write adapter. If any write fails, the snapshot is restored
//! (best effort) and the original error is returned, so no partial writes
//! persist. Callers serialize executions; at most one transaction runs
//! against the workspace at a time.

mod fs_adapter;

pub use fs_adapter::{FsSnapshotFactory, FsWriteAdapter};

use crate::error::ExecutorError;
use crate::transaction::EditTransaction;
use crate::types::ProposedEdit;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Performs one edit as an OS write. Writes must be atomic per file.
#[async_trait]
pub trait DiskWriteAdapter: Send + Sync {
    /// Writes (or deletes) one edit under the workspace root and returns
    /// the resulting file path.
    async fn write_edit(
        &self,
        edit: &ProposedEdit,
        workspace_root: &Path,
    ) -> anyhow::Result<PathBuf>;
}

/// Pre-execution state of every file a transaction will touch.
#[async_trait]
pub trait WorkspaceSnapshot: Send + Sync {
    /// Restores every captured file to its captured state.
    async fn restore(&self, workspace_root: &Path) -> anyhow::Result<()>;
}

/// Produces a [`WorkspaceSnapshot`] for a transaction.
#[async_trait]
pub trait SnapshotFactory: Send + Sync {
    async fn capture(
        &self,
        transaction: &EditTransaction,
        workspace_root: &Path,
    ) -> anyhow::Result<Box<dyn WorkspaceSnapshot>>;
}

/// Progress callback `(index, total)`, invoked before each write.
pub type ProgressFn = dyn Fn(usize, usize) + Send + Sync;

/// Executes validated transactions against a workspace.
pub struct DiskExecutor {
    workspace_root: PathBuf,
    adapter: Arc<dyn DiskWriteAdapter>,
    snapshots: Arc<dyn SnapshotFactory>,
}

impl DiskExecutor {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        adapter: Arc<dyn DiskWriteAdapter>,
        snapshots: Arc<dyn SnapshotFactory>,
    ) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            adapter,
            snapshots,
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Runs the write pipeline for one transaction and returns the applied
    /// file paths. On a write failure the workspace is restored from the
    /// snapshot; a restore failure is logged and never masks the original
    /// error.
    pub async fn execute_to_disk(
        &self,
        transaction: &EditTransaction,
        progress: Option<&ProgressFn>,
    ) -> Result<Vec<PathBuf>, ExecutorError> {
        let snapshot = self
            .snapshots
            .capture(transaction, &self.workspace_root)
            .await
            .map_err(|source| ExecutorError::SnapshotFailed { source })?;

        let total = transaction.edits.len();
        let mut applied = Vec::with_capacity(total);
        for (index, edit) in transaction.edits.iter().enumerate() {
            if let Some(progress) = progress {
                progress(index, total);
            }
            match self.adapter.write_edit(edit, &self.workspace_root).await {
                Ok(path) => applied.push(path),
                Err(source) => {
                    tracing::warn!(
                        "Write failed for {}, restoring workspace: {}",
                        edit.file_path,
                        source
                    );
                    if let Err(restore_error) = snapshot.restore(&self.workspace_root).await {
                        tracing::warn!(
                            "Workspace restore failed after write error: {}",
                            restore_error
                        );
                    }
                    return Err(ExecutorError::WriteFailed {
                        path: edit.file_path.clone(),
                        source,
                    });
                }
            }
        }
        tracing::debug!(
            "Executed transaction {} ({} files)",
            transaction.id,
            applied.len()
        );
        Ok(applied)
    }
}
