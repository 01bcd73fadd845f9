//! Error types for the edit pipeline.

use std::fmt::{Display, Formatter};

/// Errors that can occur while executing a transaction against the disk.
#[derive(Debug)]
pub enum ExecutorError {
    /// The write adapter failed on a specific edit. The workspace has been
    /// restored from the pre-execution snapshot (best effort).
    WriteFailed { path: String, source: anyhow::Error },
    /// The workspace snapshot could not be captured before any write ran.
    SnapshotFailed { source: anyhow::Error },
}

impl Display for ExecutorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteFailed { path, source } => {
                write!(f, "write failed for {}: {}", path, source)
            }
            Self::SnapshotFailed { source } => {
                write!(f, "workspace snapshot failed: {}", source)
            }
        }
    }
}

impl std::error::Error for ExecutorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::WriteFailed { source, .. } | Self::SnapshotFailed { source } => {
                Some(source.as_ref())
            }
        }
    }
}
