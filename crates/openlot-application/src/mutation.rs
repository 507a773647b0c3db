//! Optimistic mutation controller.
//!
//! One reusable pattern for every entity mutation: commit the local state
//! change synchronously, issue the remote call, and on failure restore the
//! snapshot captured before the apply. The snapshot is the source of the
//! rollback, never the failed response, so a second mutation racing in
//! between cannot compound drift.
//!
//! Per-instance state machine: `Applied -> { Confirmed | RolledBack }`.
//! Both ends are terminal; there is no retry state. A retry is a new
//! mutation instance initiated by the user. Concurrent mutations on the
//! same entity are independent instances with their own snapshots; the
//! controller never coalesces or debounces user intent.

use openlot_core::error::{LotError, Result};

/// Terminal outcome of one mutation instance.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome {
    /// The optimistic state stands (the caller may still reconcile
    /// server-normalized fields from the response payload).
    Confirmed,
    /// The pre-mutation snapshot was restored; `message` is what the user
    /// should see (server-supplied for rejections, generic for transport).
    RolledBack { message: String },
    /// The call was cancelled cooperatively. The pending work is simply
    /// discarded; cancellation is not a failure and triggers no rollback.
    Stopped,
}

/// An in-flight optimistic mutation over observable state `S`.
///
/// Created by [`begin`](Self::begin), which captures the snapshot and
/// commits the apply before any await can run. The caller must not hold
/// the state lock across the remote call; `begin` and `settle` are the
/// two synchronous critical sections on either side of it.
#[must_use = "a begun mutation must be settled against the remote result"]
pub struct OptimisticMutation<S: Clone> {
    snapshot: S,
}

impl<S: Clone> OptimisticMutation<S> {
    /// Captures the snapshot and commits `apply` to the observable state,
    /// synchronously, before the network call is issued.
    pub fn begin(state: &mut S, apply: impl FnOnce(&mut S)) -> Self {
        let snapshot = state.clone();
        apply(state);
        Self { snapshot }
    }

    /// Settles the mutation against the remote result.
    ///
    /// Success leaves the optimistic state in place and yields the response
    /// payload for optional reconciliation. Failure restores the snapshot
    /// and picks the user-facing message. Cancellation discards the pending
    /// result without touching state.
    pub fn settle<T>(self, state: &mut S, remote: Result<T>) -> (MutationOutcome, Option<T>) {
        match remote {
            Ok(payload) => (MutationOutcome::Confirmed, Some(payload)),
            Err(LotError::Cancelled) => (MutationOutcome::Stopped, None),
            Err(err) => {
                tracing::debug!(error = %err, "mutation failed, rolling back");
                *state = self.snapshot;
                (
                    MutationOutcome::RolledBack {
                        message: err.user_message(),
                    },
                    None,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn apply_commits_before_settlement() {
        let mut state: HashSet<u64> = HashSet::new();
        let mutation = OptimisticMutation::begin(&mut state, |s| {
            s.insert(42);
        });
        // Observable immediately, while the "network call" is in flight.
        assert!(state.contains(&42));

        let (outcome, _) = mutation.settle(&mut state, Ok(()));
        assert_eq!(outcome, MutationOutcome::Confirmed);
        assert!(state.contains(&42));
    }

    #[test]
    fn failure_restores_the_exact_snapshot() {
        let mut state: HashSet<u64> = HashSet::from([1, 2]);
        let mutation = OptimisticMutation::begin(&mut state, |s| {
            s.insert(42);
        });

        let (outcome, _) =
            mutation.settle::<()>(&mut state, Err(LotError::rejected("not allowed")));
        assert_eq!(
            outcome,
            MutationOutcome::RolledBack {
                message: "not allowed".to_string()
            }
        );
        assert_eq!(state, HashSet::from([1, 2]));
    }

    #[test]
    fn transport_failure_uses_generic_message() {
        let mut state = 0u32;
        let mutation = OptimisticMutation::begin(&mut state, |s| *s += 1);
        let (outcome, _) =
            mutation.settle::<()>(&mut state, Err(LotError::transport("refused")));
        match outcome {
            MutationOutcome::RolledBack { message } => assert!(!message.contains("refused")),
            other => panic!("expected rollback, got {other:?}"),
        }
        assert_eq!(state, 0);
    }

    #[test]
    fn cancellation_discards_without_rollback() {
        let mut state = 0u32;
        let mutation = OptimisticMutation::begin(&mut state, |s| *s += 1);
        let (outcome, _) = mutation.settle::<()>(&mut state, Err(LotError::Cancelled));
        assert_eq!(outcome, MutationOutcome::Stopped);
        assert_eq!(state, 1);
    }

    #[test]
    fn rollback_is_from_snapshot_not_current_state() {
        // A second mutation raced in between: rollback of the first must
        // restore the first snapshot, the last settled write wins.
        let mut state: Vec<u64> = vec![1];
        let first = OptimisticMutation::begin(&mut state, |s| s.push(2));
        let second = OptimisticMutation::begin(&mut state, |s| s.push(3));

        let (_, _) = second.settle(&mut state, Ok(()));
        let (outcome, _) =
            first.settle::<()>(&mut state, Err(LotError::transport("timeout")));
        assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));
        assert_eq!(state, vec![1]);
    }
}
