//! The edit session: state machine and orchestrator.
//!
//! A session owns its accumulated stream buffer, its pending transaction,
//! and its history. All mutations happen through the owner's `&mut self`
//! calls (the session executor); the heavy parse+diff pipeline runs on a
//! blocking task and its result is applied back here, so the ordering of
//! state transitions is total.
//!
//! The public surface never panics and never returns `Err`: illegal
//! transitions are silent no-ops and failures are reported through return
//! values or the `Error` state.

mod propose;
mod state;

pub use state::{SessionPhase, SessionState};

use crate::config::SessionConfig;
use crate::diff::DiffEngine;
use crate::history::TransactionHistory;
use crate::transaction::{EditTransaction, TransactionMetadata, TransactionSnapshot};
use crate::types::{EditInstruction, EditToApply, FileSnapshot, ProposedEdit};
use std::collections::HashMap;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Message carried by the `Error` state when a completed stream contained
/// no edits matching the session's snapshot map.
pub const NO_VALID_EDITS: &str = "No valid edits found in stream";

/// One AI edit round against a fixed set of file snapshots.
pub struct EditSession {
    id: Uuid,
    instruction: EditInstruction,
    snapshots: HashMap<String, FileSnapshot>,
    state: SessionState,
    stream_buffer: String,
    pending: Option<EditTransaction>,
    history: TransactionHistory,
    config: SessionConfig,
    engine: DiffEngine,
    phase_tx: watch::Sender<SessionPhase>,
    parse_abort: Option<AbortHandle>,
}

impl EditSession {
    /// Creates a session over the given snapshots.
    ///
    /// Returns the session and a watch receiver observing every state
    /// transition. The snapshot map is fixed for the session's lifetime;
    /// duplicate paths keep the last snapshot.
    pub fn new(
        instruction: EditInstruction,
        snapshots: Vec<FileSnapshot>,
        config: SessionConfig,
    ) -> (Self, watch::Receiver<SessionPhase>) {
        Self::with_engine(instruction, snapshots, config, DiffEngine::new())
    }

    /// Like [`EditSession::new`] with a caller-supplied diff engine.
    pub fn with_engine(
        instruction: EditInstruction,
        snapshots: Vec<FileSnapshot>,
        config: SessionConfig,
        engine: DiffEngine,
    ) -> (Self, watch::Receiver<SessionPhase>) {
        let snapshots: HashMap<String, FileSnapshot> = snapshots
            .into_iter()
            .map(|snapshot| (snapshot.path.clone(), snapshot))
            .collect();
        let state = SessionState::Idle;
        let (phase_tx, phase_rx) = watch::channel(SessionPhase::from(&state));
        let history_limit = config.history_limit;
        let session = Self {
            id: Uuid::new_v4(),
            instruction,
            snapshots,
            state,
            stream_buffer: String::new(),
            pending: None,
            history: TransactionHistory::new(history_limit),
            config,
            engine,
            phase_tx,
            parse_abort: None,
        };
        (session, phase_rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn instruction(&self) -> &EditInstruction {
        &self.instruction
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn file_snapshot(&self, path: &str) -> Option<&FileSnapshot> {
        self.snapshots.get(path)
    }

    /// The transaction awaiting commit or rollback, if any.
    pub fn pending_transaction(&self) -> Option<&EditTransaction> {
        self.pending.as_ref()
    }

    /// The edits currently proposed, if the session is in `Proposed`.
    pub fn proposed_edits(&self) -> Option<&[ProposedEdit]> {
        match &self.state {
            SessionState::Proposed(edits) => Some(edits),
            _ => None,
        }
    }

    /// A fresh receiver for state observation.
    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    /// All mutations go through this single method. Illegal transitions are
    /// ignored and leave the previous state untouched.
    fn transition_to(&mut self, next: SessionState) -> bool {
        if !state::is_valid_transition(&self.state, &next) {
            tracing::warn!(
                "Ignoring illegal transition {} -> {}",
                self.state.label(),
                next.label()
            );
            return false;
        }
        tracing::debug!("Session transition {} -> {}", self.state.label(), next.label());
        self.state = next;
        let _ = self.phase_tx.send(SessionPhase::from(&self.state));
        true
    }

    /// Begins streaming. No-op outside `Idle`.
    pub fn start(&mut self) -> bool {
        self.transition_to(SessionState::Streaming)
    }

    /// Appends one chunk to the stream buffer. Chunks may be of any size
    /// and may split wire-format tokens. No-op outside `Streaming`.
    pub fn append_streaming_text(&mut self, chunk: &str) -> bool {
        if !matches!(self.state, SessionState::Streaming) {
            tracing::warn!(
                "Dropping streamed chunk in state {}",
                self.state.label()
            );
            return false;
        }
        self.stream_buffer.push_str(chunk);
        self.transition_to(SessionState::Streaming)
    }

    /// Ends streaming: transitions to `Parsing`, runs the parse+diff
    /// pipeline on a blocking task, and applies the outcome as `Proposed`
    /// or `Error`. An aborted task performs no transition.
    pub async fn complete_streaming(&mut self) -> bool {
        if !matches!(self.state, SessionState::Streaming) {
            tracing::warn!(
                "Ignoring complete_streaming in state {}",
                self.state.label()
            );
            return false;
        }
        self.transition_to(SessionState::Parsing);

        let text = self.stream_buffer.clone();
        let snapshots = self.snapshots.clone();
        let engine = self.engine.clone();
        let config = self.config.clone();
        let task = tokio::task::spawn_blocking(move || {
            propose::build_proposed_edits(&text, &snapshots, &engine, &config)
        });
        self.parse_abort = Some(task.abort_handle());
        let outcome = task.await;
        self.parse_abort = None;

        match outcome {
            Ok(edits) if !edits.is_empty() => {
                self.transition_to(SessionState::Proposed(edits))
            }
            Ok(_) => self.transition_to(SessionState::Error(NO_VALID_EDITS.to_string())),
            Err(join_error) => {
                if join_error.is_cancelled() {
                    return false;
                }
                self.transition_to(SessionState::Error(NO_VALID_EDITS.to_string()))
            }
        }
    }

    /// Builds the pending transaction from the given subset of proposed
    /// edit ids (or all of them). Returns false and stays in `Proposed` on
    /// an empty selection or an invalid transaction.
    pub fn prepare_transaction(
        &mut self,
        edit_ids: Option<&[Uuid]>,
        metadata: Option<TransactionMetadata>,
    ) -> bool {
        let SessionState::Proposed(edits) = &self.state else {
            tracing::warn!(
                "Ignoring prepare_transaction in state {}",
                self.state.label()
            );
            return false;
        };
        let selected: Vec<ProposedEdit> = match edit_ids {
            Some(ids) => edits
                .iter()
                .filter(|edit| ids.contains(&edit.id))
                .cloned()
                .collect(),
            None => edits.clone(),
        };
        if selected.is_empty() {
            return false;
        }
        let metadata = metadata.unwrap_or_else(|| TransactionMetadata {
            description: self.instruction.text.clone(),
            source: self.config.source.clone(),
            can_undo: true,
        });
        let transaction = EditTransaction::new(selected, metadata);
        if !transaction.is_valid_against(&self.snapshots) {
            return false;
        }
        self.pending = Some(transaction.clone());
        self.transition_to(SessionState::TransactionReady(transaction))
    }

    /// Records the pending transaction as committed and returns the
    /// captured pre-commit snapshot. The session does not write to disk;
    /// executing the edits is the caller's job via the disk executor.
    pub fn commit_transaction(&mut self) -> Option<TransactionSnapshot> {
        let SessionState::TransactionReady(transaction) = &self.state else {
            tracing::warn!(
                "Ignoring commit_transaction in state {}",
                self.state.label()
            );
            return None;
        };
        let transaction = transaction.clone();
        let snapshot = TransactionSnapshot::capture(&transaction, &self.snapshots);
        self.history.record_applied(transaction.clone(), snapshot.clone());
        self.pending = None;
        self.transition_to(SessionState::Committed(transaction));
        Some(snapshot)
    }

    /// Discards the pending transaction.
    pub fn rollback_transaction(&mut self) -> bool {
        let SessionState::TransactionReady(transaction) = &self.state else {
            tracing::warn!(
                "Ignoring rollback_transaction in state {}",
                self.state.label()
            );
            return false;
        };
        let transaction = transaction.clone();
        self.pending = None;
        self.transition_to(SessionState::RolledBack(transaction))
    }

    /// Prepares and commits a transaction over all proposed edits,
    /// returning the edits to apply. Empty on failure.
    pub fn accept_all(&mut self) -> Vec<EditToApply> {
        self.accept_selection(None)
    }

    /// Prepares and commits a transaction over the given edit ids.
    pub fn accept(&mut self, edit_ids: &[Uuid]) -> Vec<EditToApply> {
        self.accept_selection(Some(edit_ids))
    }

    fn accept_selection(&mut self, edit_ids: Option<&[Uuid]>) -> Vec<EditToApply> {
        if !self.prepare_transaction(edit_ids, None) {
            return Vec::new();
        }
        if self.commit_transaction().is_none() {
            return Vec::new();
        }
        match &self.state {
            SessionState::Committed(transaction) => {
                transaction.edits.iter().map(EditToApply::from).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Rejects all proposed edits.
    pub fn reject_all(&mut self) -> bool {
        self.reject_selection(None)
    }

    /// Rejects the given subset of proposed edits.
    pub fn reject(&mut self, edit_ids: &[Uuid]) -> bool {
        self.reject_selection(Some(edit_ids))
    }

    fn reject_selection(&mut self, edit_ids: Option<&[Uuid]>) -> bool {
        let SessionState::Proposed(edits) = &self.state else {
            tracing::warn!("Ignoring reject in state {}", self.state.label());
            return false;
        };
        let subset: Vec<ProposedEdit> = match edit_ids {
            Some(ids) => edits
                .iter()
                .filter(|edit| ids.contains(&edit.id))
                .cloned()
                .collect(),
            None => edits.clone(),
        };
        if subset.is_empty() {
            return false;
        }
        self.transition_to(SessionState::Rejected(subset))
    }

    /// Returns the pre-commit snapshot of the most recent applied
    /// transaction and marks it reverted. Callable from any state; does
    /// not alter the session state. Applying the snapshot is the caller's
    /// responsibility.
    pub fn undo_last_transaction(&mut self) -> Option<TransactionSnapshot> {
        let (transaction, snapshot) = self.history.undo()?;
        tracing::debug!("Reverted transaction {}", transaction.id);
        Some(snapshot)
    }

    /// Re-applies the most recent reverted transaction to the history,
    /// without running it through the state machine, and returns it.
    pub fn redo_last_transaction(&mut self) -> Option<EditTransaction> {
        let transaction = self.history.redo()?;
        tracing::debug!("Re-applied transaction {}", transaction.id);
        Some(transaction)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &TransactionHistory {
        &self.history
    }

    /// Returns the session to `Idle` from a terminal state, aborting any
    /// in-flight parse. A reset during `Parsing` cancels the parse, so no
    /// `Proposed` or `Error` transition will occur. Idempotent in `Idle`.
    pub fn reset(&mut self) -> bool {
        if let Some(handle) = self.parse_abort.take() {
            handle.abort();
        }
        match &self.state {
            SessionState::Idle => true,
            SessionState::Parsing
            | SessionState::Committed(_)
            | SessionState::RolledBack(_)
            | SessionState::Rejected(_)
            | SessionState::Error(_) => {
                self.stream_buffer.clear();
                self.pending = None;
                self.transition_to(SessionState::Idle)
            }
            _ => {
                tracing::warn!("Ignoring reset in state {}", self.state.label());
                false
            }
        }
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        if let Some(handle) = self.parse_abort.take() {
            handle.abort();
        }
    }
}
