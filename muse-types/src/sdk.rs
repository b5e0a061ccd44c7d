//! The vendor SDK boundary
//!
//! [`MuseSdk`] is what the bridge calls; [`SdkListener`] is what the SDK
//! calls back. Every control call is fire-and-forget: a successful return
//! only means the request was accepted, and the outcome arrives later on an
//! SDK thread.

use std::collections::BTreeSet;
use std::sync::Weak;

use crate::error::Result;
use crate::packet::{ArtifactPacket, DataPacket, PacketType};
use crate::DeviceHandle;

/// Identifies one connection attempt.
///
/// Issued by the bridge for every `connect` and echoed back by the SDK in
/// its status callbacks, so confirmations for an abandoned attempt can be
/// recognised and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptToken(u64);

impl AttemptToken {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AttemptToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "attempt-{}", self.0)
    }
}

/// Everything the SDK needs to open a link and start streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub device: DeviceHandle,
    pub token: AttemptToken,
    /// Packet types the SDK should stream once connected
    pub packet_types: BTreeSet<PacketType>,
}

/// Link status reported by the SDK for a given attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkConnectionStatus {
    Connecting,
    Connected,
    /// The link is gone: requested teardown finished, or the device went away
    Disconnected,
    Failed { reason: String },
}

/// Control surface of the vendor SDK.
///
/// Implementations must be callable from any thread and must never block
/// on radio I/O.
pub trait MuseSdk: Send + Sync {
    /// Install the receiver for all SDK callbacks, replacing any previous one
    fn set_listener(&self, listener: Weak<dyn SdkListener>);

    fn start_discovery(&self) -> Result<()>;

    fn stop_discovery(&self) -> Result<()>;

    fn connect(&self, request: ConnectRequest) -> Result<()>;

    fn disconnect(&self, device: &DeviceHandle) -> Result<()>;

    /// SDK version string, e.g. "6.0.3"
    fn version(&self) -> String;
}

/// Callback channels the SDK drives.
///
/// Called on SDK-owned threads. Implementations hand events off and
/// return promptly.
pub trait SdkListener: Send + Sync {
    fn on_connection_status(&self, token: AttemptToken, status: SdkConnectionStatus);

    fn on_data_packet(&self, packet: DataPacket);

    fn on_artifact(&self, packet: ArtifactPacket);

    /// The full list of currently advertised devices changed
    fn on_devices_changed(&self, devices: Vec<DeviceHandle>);
}
