//! Session lifecycle state.

use std::fmt;

use crate::error::DriverError;

/// Lifecycle of one session.
///
/// States only move forward: `Connected < Elevating < ShellEntered < Ready`.
/// `Failed` is terminal and reachable from any other state. Getting out of
/// `Failed` means building a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    /// Transport is up, nothing has been sent.
    Connected,
    /// Privilege elevation in progress.
    Elevating,
    /// Vendor sub-shell entered.
    ShellEntered,
    /// Prompt resolved and accepted; commands may run.
    Ready,
    /// Unusable until recreated.
    Failed,
}

impl SessionState {
    pub fn is_ready(self) -> bool {
        self == SessionState::Ready
    }

    pub fn is_failed(self) -> bool {
        self == SessionState::Failed
    }

    /// Validate a transition from `self` to `to`.
    pub fn transition(self, to: SessionState) -> Result<SessionState, DriverError> {
        let allowed = match (self, to) {
            (SessionState::Failed, _) => false,
            (_, SessionState::Failed) => true,
            (from, to) => to > from,
        };

        if allowed {
            Ok(to)
        } else {
            Err(DriverError::IllegalTransition {
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Connected => "connected",
            SessionState::Elevating => "elevating",
            SessionState::ShellEntered => "shell-entered",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        let state = SessionState::Connected;
        let state = state.transition(SessionState::Elevating).unwrap();
        let state = state.transition(SessionState::ShellEntered).unwrap();
        let state = state.transition(SessionState::Ready).unwrap();
        assert!(state.is_ready());
    }

    #[test]
    fn test_skipping_shell_is_allowed() {
        assert_eq!(
            SessionState::Elevating.transition(SessionState::Ready).unwrap(),
            SessionState::Ready
        );
    }

    #[test]
    fn test_backward_transition_rejected() {
        let err = SessionState::Ready
            .transition(SessionState::Elevating)
            .unwrap_err();
        assert!(matches!(err, DriverError::IllegalTransition { .. }));
        assert!(SessionState::Ready.transition(SessionState::Ready).is_err());
    }

    #[test]
    fn test_failed_is_terminal() {
        for from in [
            SessionState::Connected,
            SessionState::Elevating,
            SessionState::ShellEntered,
            SessionState::Ready,
        ] {
            assert!(from.transition(SessionState::Failed).unwrap().is_failed());
        }
        assert!(SessionState::Failed.transition(SessionState::Ready).is_err());
        assert!(SessionState::Failed.transition(SessionState::Failed).is_err());
    }
}
