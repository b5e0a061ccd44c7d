//! Event categories and the envelope every event travels in.

use std::time::SystemTime;

use muse_types::{ArtifactPacket, ConnectionStatusEvent, DataPacket, DeviceHandle, PacketType};

/// The closed set of event kinds a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    ConnectionStatus,
    DataPacket,
    ArtifactEvent,
    DeviceDiscovery,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [
        EventCategory::ConnectionStatus,
        EventCategory::DataPacket,
        EventCategory::ArtifactEvent,
        EventCategory::DeviceDiscovery,
    ];
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventCategory::ConnectionStatus => "connection-status",
            EventCategory::DataPacket => "data-packet",
            EventCategory::ArtifactEvent => "artifact",
            EventCategory::DeviceDiscovery => "device-discovery",
        };
        f.write_str(name)
    }
}

/// Category-specific event content.
///
/// The registry never looks inside; only the packet type of a data packet
/// is read, by the filter.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    ConnectionStatus(ConnectionStatusEvent),
    DataPacket(DataPacket),
    Artifact(ArtifactPacket),
    /// Full list of currently advertised devices
    DeviceDiscovery(Vec<DeviceHandle>),
}

impl EventPayload {
    pub fn category(&self) -> EventCategory {
        match self {
            EventPayload::ConnectionStatus(_) => EventCategory::ConnectionStatus,
            EventPayload::DataPacket(_) => EventCategory::DataPacket,
            EventPayload::Artifact(_) => EventCategory::ArtifactEvent,
            EventPayload::DeviceDiscovery(_) => EventCategory::DeviceDiscovery,
        }
    }
}

/// One event on its way from the SDK to host subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub category: EventCategory,
    /// When the envelope was enqueued
    pub timestamp: SystemTime,
    /// Enqueue position, strictly increasing across all categories
    pub sequence: u64,
    pub payload: EventPayload,
}

impl EventEnvelope {
    /// Wrap a payload; the category is derived from it so the two never disagree
    pub fn new(sequence: u64, payload: EventPayload) -> Self {
        Self {
            category: payload.category(),
            timestamp: SystemTime::now(),
            sequence,
            payload,
        }
    }

    /// Packet type, for DataPacket envelopes only
    pub fn packet_type(&self) -> Option<&PacketType> {
        match &self.payload {
            EventPayload::DataPacket(packet) => Some(&packet.packet_type),
            _ => None,
        }
    }
}
