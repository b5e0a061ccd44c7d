//! Shared data model for the Muse headband bridge
//!
//! This crate holds the types every other layer of the bridge agrees on:
//! discovered devices, connection states, the packets the vendor SDK emits,
//! and the two traits that form the vendor SDK boundary.
//!
//! # Quick Start
//!
//! ```rust
//! use muse_types::{DeviceHandle, PacketType};
//!
//! let device = DeviceHandle::new("00:55:DA:B0:12:34", "Muse-1234");
//! assert_eq!(device.name(), "Muse-1234");
//!
//! let eeg = PacketType::new("EEG");
//! assert!(eeg.is_known());
//! ```
//!
//! # SDK Boundary
//!
//! The vendor SDK is a black box. The bridge drives it through [`MuseSdk`]
//! and receives its callbacks through [`SdkListener`]. Callbacks may arrive
//! on any thread, in any order relative to control calls.

mod error;
mod packet;
mod sdk;
mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

pub use error::{Result, SdkError};
pub use packet::{ArtifactPacket, DataPacket, PacketType, KNOWN_PACKET_TYPES};
pub use sdk::{AttemptToken, ConnectRequest, MuseSdk, SdkConnectionStatus, SdkListener};
pub use state::{ConnectionState, ConnectionStatusEvent};

use serde::{Deserialize, Serialize};

/// A discoverable or paired headband.
///
/// Created from the vendor SDK's discovery callback and never mutated
/// afterwards. Two handles are equal when both identifier and name match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceHandle {
    id: String,
    name: String,
}

impl DeviceHandle {
    /// Create a handle from the SDK-assigned identifier and advertised name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Opaque SDK identifier (typically the Bluetooth address)
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable advertised name, e.g. "Muse-1234"
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
