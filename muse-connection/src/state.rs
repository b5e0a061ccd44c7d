//! Pure connection transition table
//!
//! [`next_state`] decides what a host control call does from a given
//! state, [`on_sdk_status`] decides what an SDK status report does. The
//! manager applies these and nothing else, so its state after any control
//! sequence is the fold of [`next_state`] over that sequence.

use muse_types::{ConnectionState, SdkConnectionStatus};

use crate::error::{ConnectionError, Result};

/// Host-initiated control operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    StartScan,
    StopScan,
    Connect,
    Disconnect,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::StartScan,
        Operation::StopScan,
        Operation::Connect,
        Operation::Disconnect,
    ];
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::StartScan => "start scan",
            Operation::StopScan => "stop scan",
            Operation::Connect => "connect",
            Operation::Disconnect => "disconnect",
        };
        f.write_str(name)
    }
}

/// Effect of an allowed operation on the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Already where the operation leads; no event is published
    Stay,

    /// One state change
    Move(ConnectionState),

    /// Two state changes in a row, each with its own status event
    Settle {
        via: ConnectionState,
        to: ConnectionState,
    },
}

impl Transition {
    /// State reached once the transition has been applied to `from`
    pub fn resolve(self, from: ConnectionState) -> ConnectionState {
        match self {
            Transition::Stay => from,
            Transition::Move(to) => to,
            Transition::Settle { to, .. } => to,
        }
    }

    /// Number of status events the transition publishes
    pub fn event_count(self) -> usize {
        match self {
            Transition::Stay => 0,
            Transition::Move(_) => 1,
            Transition::Settle { .. } => 2,
        }
    }
}

/// Transition for a host operation, or `InvalidStateTransition`
pub fn next_state(from: ConnectionState, operation: Operation) -> Result<Transition> {
    use muse_types::ConnectionState::*;

    let transition = match (operation, from) {
        (Operation::StartScan, Disconnected) => Transition::Move(Scanning),
        (Operation::StartScan, Scanning) => Transition::Stay,

        (Operation::StopScan, Scanning) => Transition::Move(Disconnected),

        (Operation::Connect, Disconnected | Scanning) => Transition::Move(Connecting),
        // Existing link is torn down before the new attempt
        (Operation::Connect, Connected) => Transition::Settle {
            via: Disconnecting,
            to: Connecting,
        },

        (Operation::Disconnect, Connecting | Connected) => Transition::Move(Disconnecting),
        (Operation::Disconnect, Disconnecting) => Transition::Stay,
        (Operation::Disconnect, Scanning | Failed) => Transition::Settle {
            via: Disconnecting,
            to: Disconnected,
        },

        _ => return Err(ConnectionError::InvalidStateTransition { from, operation }),
    };

    Ok(transition)
}

/// State the SDK's status report moves `current` to, if any
///
/// Reports that make no sense for the current state are ignored. A late
/// `Connected` during teardown is one of them.
pub fn on_sdk_status(current: ConnectionState, status: &SdkConnectionStatus) -> Option<ConnectionState> {
    use muse_types::ConnectionState::*;

    match (current, status) {
        (Connecting, SdkConnectionStatus::Connected) => Some(Connected),
        (Connecting, SdkConnectionStatus::Failed { .. }) => Some(Failed),
        (Connecting, SdkConnectionStatus::Disconnected) => Some(Failed),

        (Connected, SdkConnectionStatus::Disconnected) => Some(Disconnected),
        (Connected, SdkConnectionStatus::Failed { .. }) => Some(Failed),

        (Disconnecting, SdkConnectionStatus::Disconnected | SdkConnectionStatus::Failed { .. }) => {
            Some(Disconnected)
        }

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use muse_types::ConnectionState::*;

    #[rstest]
    #[case(Disconnected, Operation::StartScan, Transition::Move(Scanning))]
    #[case(Scanning, Operation::StartScan, Transition::Stay)]
    #[case(Scanning, Operation::StopScan, Transition::Move(Disconnected))]
    #[case(Disconnected, Operation::Connect, Transition::Move(Connecting))]
    #[case(Scanning, Operation::Connect, Transition::Move(Connecting))]
    #[case(Connected, Operation::Connect, Transition::Settle { via: Disconnecting, to: Connecting })]
    #[case(Connecting, Operation::Disconnect, Transition::Move(Disconnecting))]
    #[case(Connected, Operation::Disconnect, Transition::Move(Disconnecting))]
    #[case(Disconnecting, Operation::Disconnect, Transition::Stay)]
    #[case(Scanning, Operation::Disconnect, Transition::Settle { via: Disconnecting, to: Disconnected })]
    #[case(Failed, Operation::Disconnect, Transition::Settle { via: Disconnecting, to: Disconnected })]
    fn test_allowed_transitions(
        #[case] from: ConnectionState,
        #[case] operation: Operation,
        #[case] expected: Transition,
    ) {
        assert_eq!(next_state(from, operation), Ok(expected));
    }

    #[rstest]
    #[case(Disconnected, Operation::StopScan)]
    #[case(Disconnected, Operation::Disconnect)]
    #[case(Connecting, Operation::StartScan)]
    #[case(Connecting, Operation::Connect)]
    #[case(Connected, Operation::StartScan)]
    #[case(Disconnecting, Operation::Connect)]
    #[case(Failed, Operation::Connect)]
    #[case(Failed, Operation::StopScan)]
    fn test_rejected_transitions(#[case] from: ConnectionState, #[case] operation: Operation) {
        assert_eq!(
            next_state(from, operation),
            Err(ConnectionError::InvalidStateTransition { from, operation })
        );
    }

    #[test]
    fn test_sdk_failure_while_connecting() {
        let failed = SdkConnectionStatus::Failed {
            reason: "timeout".into(),
        };
        assert_eq!(on_sdk_status(Connecting, &failed), Some(Failed));
        assert_eq!(on_sdk_status(Connecting, &SdkConnectionStatus::Disconnected), Some(Failed));
    }

    #[test]
    fn test_unsolicited_disconnect_is_not_a_failure() {
        assert_eq!(
            on_sdk_status(Connected, &SdkConnectionStatus::Disconnected),
            Some(Disconnected)
        );
    }

    #[test]
    fn test_connected_during_teardown_is_suppressed() {
        assert_eq!(on_sdk_status(Disconnecting, &SdkConnectionStatus::Connected), None);
        assert_eq!(
            on_sdk_status(Disconnecting, &SdkConnectionStatus::Disconnected),
            Some(Disconnected)
        );
    }

    #[test]
    fn test_sdk_reports_ignored_outside_link_states() {
        for status in [SdkConnectionStatus::Connected, SdkConnectionStatus::Disconnected] {
            assert_eq!(on_sdk_status(Disconnected, &status), None);
            assert_eq!(on_sdk_status(Scanning, &status), None);
            assert_eq!(on_sdk_status(Failed, &status), None);
        }
        assert_eq!(on_sdk_status(Connecting, &SdkConnectionStatus::Connecting), None);
    }

    #[test]
    fn test_resolve_and_event_count() {
        let settle = Transition::Settle {
            via: Disconnecting,
            to: Disconnected,
        };
        assert_eq!(settle.resolve(Failed), Disconnected);
        assert_eq!(settle.event_count(), 2);
        assert_eq!(Transition::Stay.resolve(Scanning), Scanning);
        assert_eq!(Transition::Stay.event_count(), 0);
    }
}
