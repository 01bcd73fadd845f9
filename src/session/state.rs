//! Session states and the legal-transition table.

use crate::transaction::EditTransaction;
use crate::types::ProposedEdit;

/// The nine session states, with per-variant payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Streaming,
    Parsing,
    Proposed(Vec<ProposedEdit>),
    TransactionReady(EditTransaction),
    Committed(EditTransaction),
    RolledBack(EditTransaction),
    Rejected(Vec<ProposedEdit>),
    Error(String),
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Streaming => "streaming",
            Self::Parsing => "parsing",
            Self::Proposed(_) => "proposed",
            Self::TransactionReady(_) => "transaction_ready",
            Self::Committed(_) => "committed",
            Self::RolledBack(_) => "rolled_back",
            Self::Rejected(_) => "rejected",
            Self::Error(_) => "error",
        }
    }

    /// Terminal states only transition back to `Idle`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Committed(_) | Self::RolledBack(_) | Self::Rejected(_) | Self::Error(_)
        )
    }
}

/// The single source of truth for legal transitions. Anything not listed
/// here is ignored as a no-op. `Parsing -> Idle` is the cancellation leg
/// driven by `reset`.
pub(crate) fn is_valid_transition(from: &SessionState, to: &SessionState) -> bool {
    use SessionState::*;
    matches!(
        (from, to),
        (Idle, Streaming)
            | (Streaming, Streaming)
            | (Streaming, Parsing)
            | (Parsing, Proposed(_))
            | (Parsing, Error(_))
            | (Parsing, Idle)
            | (Proposed(_), TransactionReady(_))
            | (Proposed(_), Rejected(_))
            | (TransactionReady(_), Committed(_))
            | (TransactionReady(_), RolledBack(_))
            | (Committed(_), Idle)
            | (RolledBack(_), Idle)
            | (Rejected(_), Idle)
            | (Error(_), Idle)
    )
}

/// Lightweight snapshot of the session state, broadcast to observers on
/// every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPhase {
    pub state: &'static str,
    pub edit_count: usize,
    pub message: Option<String>,
}

impl From<&SessionState> for SessionPhase {
    fn from(state: &SessionState) -> Self {
        let edit_count = match state {
            SessionState::Proposed(edits) | SessionState::Rejected(edits) => edits.len(),
            SessionState::TransactionReady(tx)
            | SessionState::Committed(tx)
            | SessionState::RolledBack(tx) => tx.edits.len(),
            _ => 0,
        };
        let message = match state {
            SessionState::Error(message) => Some(message.clone()),
            _ => None,
        };
        Self {
            state: state.label(),
            edit_count,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_only_return_to_idle() {
        let terminals = [
            SessionState::Committed(EditTransaction::new(
                Vec::new(),
                crate::transaction::TransactionMetadata::default(),
            )),
            SessionState::RolledBack(EditTransaction::new(
                Vec::new(),
                crate::transaction::TransactionMetadata::default(),
            )),
            SessionState::Rejected(Vec::new()),
            SessionState::Error("boom".to_string()),
        ];
        for terminal in &terminals {
            assert!(terminal.is_terminal());
            assert!(is_valid_transition(terminal, &SessionState::Idle));
            assert!(!is_valid_transition(terminal, &SessionState::Streaming));
            assert!(!is_valid_transition(terminal, &SessionState::Parsing));
        }
    }

    #[test]
    fn test_streaming_self_loop_is_legal() {
        assert!(is_valid_transition(
            &SessionState::Streaming,
            &SessionState::Streaming
        ));
        assert!(!is_valid_transition(&SessionState::Idle, &SessionState::Idle));
        assert!(!is_valid_transition(
            &SessionState::Parsing,
            &SessionState::Parsing
        ));
    }

    #[test]
    fn test_idle_only_starts_streaming() {
        assert!(is_valid_transition(
            &SessionState::Idle,
            &SessionState::Streaming
        ));
        assert!(!is_valid_transition(
            &SessionState::Idle,
            &SessionState::Parsing
        ));
        assert!(!is_valid_transition(
            &SessionState::Idle,
            &SessionState::Proposed(Vec::new())
        ));
    }

    #[test]
    fn test_phase_snapshot_carries_counts_and_message() {
        let phase = SessionPhase::from(&SessionState::Rejected(Vec::new()));
        assert_eq!(phase.state, "rejected");
        assert_eq!(phase.edit_count, 0);
        assert!(phase.message.is_none());

        let phase = SessionPhase::from(&SessionState::Error("nope".to_string()));
        assert_eq!(phase.state, "error");
        assert_eq!(phase.message.as_deref(), Some("nope"));
    }
}
