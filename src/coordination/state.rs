//! Per-run state machine and step outcomes

use crate::error::DepositorError;
use crate::tx::ConfirmationOutcome;

use ethers::types::H256;
use std::fmt;

/// States of one run, in the only order they can be entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Start,
    TransferSent,
    TransferAwaited,
    Delaying,
    ApproveSent,
    ApproveAwaited,
    DepositSent,
    DepositAwaited,
    Done,
}

impl RunState {
    /// Following state; `Done` is terminal
    pub fn next(self) -> Option<RunState> {
        use RunState::*;
        match self {
            Start => Some(TransferSent),
            TransferSent => Some(TransferAwaited),
            TransferAwaited => Some(Delaying),
            Delaying => Some(ApproveSent),
            ApproveSent => Some(ApproveAwaited),
            ApproveAwaited => Some(DepositSent),
            DepositSent => Some(DepositAwaited),
            DepositAwaited => Some(Done),
            Done => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == RunState::Done
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Start => "START",
            RunState::TransferSent => "TRANSFER_SENT",
            RunState::TransferAwaited => "TRANSFER_AWAITED",
            RunState::Delaying => "DELAYING",
            RunState::ApproveSent => "APPROVE_SENT",
            RunState::ApproveAwaited => "APPROVE_AWAITED",
            RunState::DepositSent => "DEPOSIT_SENT",
            RunState::DepositAwaited => "DEPOSIT_AWAITED",
            RunState::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Forward-only walk through [`RunState`]
#[derive(Debug, Clone)]
pub struct RunTracker {
    current: RunState,
    visited: Vec<RunState>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self {
            current: RunState::Start,
            visited: vec![RunState::Start],
        }
    }

    pub fn current(&self) -> RunState {
        self.current
    }

    /// Enter the state after the current one
    pub fn advance(&mut self) {
        if let Some(next) = self.current.next() {
            tracing::debug!("Run state {} -> {}", self.current, next);
            self.current = next;
            self.visited.push(next);
        }
    }

    /// Advance one state at a time until `target` is reached. Every state in
    /// between is visited even when the step that owns it did not happen.
    pub fn advance_to(&mut self, target: RunState) {
        while self.current < target && !self.current.is_terminal() {
            self.advance();
        }
    }

    pub fn visited(&self) -> &[RunState] {
        &self.visited
    }
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one transaction step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Confirmed(H256),
    Unconfirmed {
        tx_hash: H256,
        outcome: ConfirmationOutcome,
    },
    /// Building, signing, or broadcasting failed
    Failed(String),
    /// Not attempted because an earlier error ended the flow
    Skipped,
}

impl StepOutcome {
    pub fn from_confirmation(tx_hash: H256, outcome: ConfirmationOutcome) -> Self {
        if outcome.is_confirmed() {
            StepOutcome::Confirmed(tx_hash)
        } else {
            StepOutcome::Unconfirmed { tx_hash, outcome }
        }
    }

    pub fn failed(err: &DepositorError) -> Self {
        StepOutcome::Failed(err.to_string())
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, StepOutcome::Confirmed(_))
    }

    /// Hash of the broadcast transaction, if it got that far
    pub fn tx_hash(&self) -> Option<H256> {
        match self {
            StepOutcome::Confirmed(hash) => Some(*hash),
            StepOutcome::Unconfirmed { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Outcomes of a full run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub transfer: StepOutcome,
    pub approve: StepOutcome,
    pub deposit: StepOutcome,
    pub states: Vec<RunState>,
}

impl RunReport {
    pub fn confirmed_count(&self) -> usize {
        [&self.transfer, &self.approve, &self.deposit]
            .iter()
            .filter(|s| s.is_confirmed())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_walk() {
        let mut tracker = RunTracker::new();
        while !tracker.current().is_terminal() {
            tracker.advance();
        }

        assert_eq!(
            tracker.visited(),
            &[
                RunState::Start,
                RunState::TransferSent,
                RunState::TransferAwaited,
                RunState::Delaying,
                RunState::ApproveSent,
                RunState::ApproveAwaited,
                RunState::DepositSent,
                RunState::DepositAwaited,
                RunState::Done,
            ]
        );
        assert_eq!(RunState::Done.next(), None);
    }

    #[test]
    fn test_advance_to_walks_every_state() {
        let mut tracker = RunTracker::new();
        tracker.advance_to(RunState::Delaying);
        tracker.advance_to(RunState::TransferSent);

        assert_eq!(tracker.current(), RunState::Delaying);
        assert_eq!(
            tracker.visited(),
            &[
                RunState::Start,
                RunState::TransferSent,
                RunState::TransferAwaited,
                RunState::Delaying,
            ]
        );

        tracker.advance_to(RunState::Done);
        tracker.advance();
        assert_eq!(tracker.current(), RunState::Done);
        assert_eq!(tracker.visited().len(), 9);
    }

    #[test]
    fn test_step_outcome_from_confirmation() {
        let hash = H256::repeat_byte(7);
        assert!(StepOutcome::from_confirmation(hash, ConfirmationOutcome::Confirmed).is_confirmed());

        let pending = StepOutcome::from_confirmation(hash, ConfirmationOutcome::NotFound);
        assert!(!pending.is_confirmed());
        assert_eq!(pending.tx_hash(), Some(hash));
        assert_eq!(StepOutcome::Skipped.tx_hash(), None);
    }
}
