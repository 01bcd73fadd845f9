//! Default filesystem implementations of the executor capabilities.

use super::{DiskWriteAdapter, SnapshotFactory, WorkspaceSnapshot};
use crate::transaction::EditTransaction;
use crate::types::{EditType, ProposedEdit};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Writes edits under the workspace root via temp file + rename, creating
/// intermediate directories as needed. An edit with `Deletion` type and
/// empty proposed content deletes the file instead.
pub struct FsWriteAdapter;

#[async_trait]
impl DiskWriteAdapter for FsWriteAdapter {
    async fn write_edit(&self, edit: &ProposedEdit, workspace_root: &Path) -> Result<PathBuf> {
        let target = workspace_root.join(&edit.file_path);
        if edit.edit_type == EditType::Deletion && edit.proposed_content.is_empty() {
            remove_if_present(&target).await?;
            return Ok(target);
        }
        write_atomic(&target, &edit.proposed_content).await?;
        Ok(target)
    }
}

async fn write_atomic(target: &Path, content: &str) -> Result<()> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let temp_path = temp_sibling(target);
    tokio::fs::write(&temp_path, content)
        .await
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
    tokio::fs::rename(&temp_path, target)
        .await
        .with_context(|| format!("Failed to rename temp file to: {}", target.display()))?;
    Ok(())
}

async fn remove_if_present(target: &Path) -> Result<()> {
    match tokio::fs::remove_file(target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", target.display())),
    }
}

fn temp_sibling(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Captures the contents (or absence) of a transaction's affected files.
pub struct FsSnapshotFactory;

struct FsWorkspaceSnapshot {
    files: HashMap<String, Option<String>>,
}

#[async_trait]
impl SnapshotFactory for FsSnapshotFactory {
    async fn capture(
        &self,
        transaction: &EditTransaction,
        workspace_root: &Path,
    ) -> Result<Box<dyn WorkspaceSnapshot>> {
        let mut files = HashMap::new();
        for path in transaction.affected_files() {
            let absolute = workspace_root.join(&path);
            let content = match tokio::fs::read_to_string(&absolute).await {
                Ok(content) => Some(content),
                Err(e) if e.kind() == ErrorKind::NotFound => None,
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to read {}", absolute.display()))
                }
            };
            files.insert(path, content);
        }
        Ok(Box::new(FsWorkspaceSnapshot { files }))
    }
}

#[async_trait]
impl WorkspaceSnapshot for FsWorkspaceSnapshot {
    async fn restore(&self, workspace_root: &Path) -> Result<()> {
        for (path, content) in &self.files {
            let absolute = workspace_root.join(path);
            match content {
                Some(content) => write_atomic(&absolute, content).await?,
                None => remove_if_present(&absolute).await?,
            }
        }
        Ok(())
    }
}
