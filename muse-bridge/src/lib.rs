//! # Muse Bridge
//!
//! Lets a host application runtime drive a Muse headband and receive its
//! data without touching the radio stack or vendor SDK.
//!
//! ## Architecture
//!
//! ```text
//! host call ─▶ MuseBridge ─▶ ConnectionManager ─▶ MuseSdk
//!                                                    │ callbacks (any thread)
//!                                                    ▼
//!            host sink ◀─ ListenerRegistry ◀─ Marshaller ◀─ ConnectionManager
//!                      (host execution context)
//! ```
//!
//! - [`MuseBridge`]: facade for scanning, connecting and listener registration
//! - [`BridgeContext`]: optional process-wide instance for static host entry points
//! - [`host`]: JSON payloads for named host targets
//! - [`logging`]: `tracing-subscriber` setup driven by `MUSE_BRIDGE_LOG_*`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use muse_bridge::{BridgeConfig, BridgeContext, HostTarget, MuseBridge, TracingSink};
//!
//! let bridge = BridgeContext::initialize(MuseBridge::new(
//!     vendor_sdk,
//!     Arc::new(TracingSink),
//!     BridgeConfig::default(),
//! )?)?;
//!
//! bridge.register_muse_listener(HostTarget::new("Menu", "ReceiveMuseList"));
//! bridge.register_data_listener_for(HostTarget::new("Plot", "ReceiveEeg"), ["EEG"]);
//! bridge.start_scan()?;
//! ```

mod bridge;
mod config;
mod context;
mod error;
pub mod host;
pub mod logging;

pub use bridge::MuseBridge;
pub use config::BridgeConfig;
pub use context::BridgeContext;
pub use error::{BridgeError, Result};
pub use host::{host_payload, HostMessage, HostSink, HostTarget, RecordingSink, TracingSink};

/// Scriptable SDK for tests and demos
#[cfg(feature = "test-support")]
pub use muse_types::mock;

pub use muse_connection::{ConnectionConfig, ConnectionError, Operation};
pub use muse_relay::{
    EventCategory, EventEnvelope, EventPayload, PacketFilter, RelayConfig, RelayError,
    SubscriberHandle, SubscriberId,
};
pub use muse_types::{
    ArtifactPacket, ConnectionState, ConnectionStatusEvent, DataPacket, DeviceHandle, MuseSdk,
    PacketType, SdkError, SdkListener,
};
