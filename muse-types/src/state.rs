//! Connection states shared by the lifecycle manager and its subscribers.

use serde::{Deserialize, Serialize};

use crate::DeviceHandle;

/// Where the bridge is in the discover → connect → stream → disconnect cycle.
///
/// There is exactly one current state per bridge, and at most one device
/// link at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Scanning,
    Connecting,
    Connected,
    Disconnecting,
    Failed,
}

impl ConnectionState {
    /// All states, in declaration order
    pub const ALL: [ConnectionState; 6] = [
        ConnectionState::Disconnected,
        ConnectionState::Scanning,
        ConnectionState::Connecting,
        ConnectionState::Connected,
        ConnectionState::Disconnecting,
        ConnectionState::Failed,
    ];

    /// Whether a device link exists or is being negotiated
    pub fn has_link(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Disconnecting
        )
    }

    /// Upper-case wire name, matching the vendor SDK's naming
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "DISCONNECTED",
            ConnectionState::Scanning => "SCANNING",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Connected => "CONNECTED",
            ConnectionState::Disconnecting => "DISCONNECTING",
            ConnectionState::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a ConnectionStatus event: one state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatusEvent {
    pub previous: ConnectionState,
    pub current: ConnectionState,
    /// Device the change concerns, when there is one
    pub device: Option<DeviceHandle>,
    /// Failure reason; only set when `current` is [`ConnectionState::Failed`]
    pub error: Option<String>,
}

impl ConnectionStatusEvent {
    pub fn new(
        previous: ConnectionState,
        current: ConnectionState,
        device: Option<DeviceHandle>,
    ) -> Self {
        Self {
            previous,
            current,
            device,
            error: None,
        }
    }

    pub fn failed(previous: ConnectionState, device: Option<DeviceHandle>, reason: impl Into<String>) -> Self {
        Self {
            previous,
            current: ConnectionState::Failed,
            device,
            error: Some(reason.into()),
        }
    }
}
