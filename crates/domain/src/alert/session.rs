/// Lifecycle state of the push-channel session for one identity.
///
/// Transitions: Idle → Connecting → Open → PendingRetry → Connecting
/// (unbounded retry loop while the identity is active). Terminated is
/// terminal and reachable from every state — explicit teardown always
/// wins, including over a pending retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session established yet.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Live connection, receiving pushes.
    Open,
    /// Connection lost; a retry is scheduled after a fixed delay.
    PendingRetry,
    /// Torn down; the session will never reconnect.
    Terminated,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::PendingRetry => "pending-retry",
            Self::Terminated => "terminated",
        }
    }

    /// Whether the session still owns (or is about to own) a transport.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Connecting | Self::Open | Self::PendingRetry)
    }

    /// Legality of a transition. Terminated accepts nothing further.
    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Terminated, _) => false,
            (_, Self::Terminated) => true,
            (Self::Idle | Self::PendingRetry, Self::Connecting) => true,
            (Self::Connecting, Self::Open) => true,
            // Failed attempt or dropped connection.
            (Self::Connecting | Self::Open, Self::PendingRetry) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::{Connecting, Idle, Open, PendingRetry, Terminated};

    #[test]
    fn retry_loop_transitions_are_legal() {
        assert!(Idle.can_transition_to(Connecting));
        assert!(Connecting.can_transition_to(Open));
        assert!(Open.can_transition_to(PendingRetry));
        assert!(PendingRetry.can_transition_to(Connecting));
    }

    #[test]
    fn failed_attempt_goes_back_to_pending_retry() {
        assert!(Connecting.can_transition_to(PendingRetry));
    }

    #[test]
    fn teardown_is_reachable_from_every_live_state() {
        for state in [Idle, Connecting, Open, PendingRetry] {
            assert!(state.can_transition_to(Terminated), "{state} must terminate");
        }
    }

    #[test]
    fn terminated_is_terminal() {
        for next in [Idle, Connecting, Open, PendingRetry, Terminated] {
            assert!(!Terminated.can_transition_to(next));
        }
    }

    #[test]
    fn skipping_states_is_illegal() {
        assert!(!Idle.can_transition_to(Open));
        assert!(!Open.can_transition_to(Connecting));
        assert!(!PendingRetry.can_transition_to(Open));
    }

    #[test]
    fn active_states() {
        assert!(!Idle.is_active());
        assert!(Connecting.is_active());
        assert!(Open.is_active());
        assert!(PendingRetry.is_active());
        assert!(!Terminated.is_active());
    }
}
