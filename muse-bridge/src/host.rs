//! Named-target message delivery for host runtimes
//!
//! Host runtimes address listeners by object name and method name and
//! accept a single string argument. This module is the only place those
//! string pairs exist: [`HostTarget`] becomes a [`SubscriberId`], and each
//! envelope is rendered into the JSON payload the host expects.

use serde::Serialize;

use muse_relay::{EventEnvelope, EventPayload, SubscriberHandle, SubscriberId};
use muse_types::{ArtifactPacket, ConnectionStatusEvent, DataPacket, DeviceHandle};

use std::sync::Arc;

/// Receives rendered events for a named host object
pub trait HostSink: Send + Sync {
    fn send_message(&self, object: &str, method: &str, payload: &str);
}

impl<F> HostSink for F
where
    F: Fn(&str, &str, &str) + Send + Sync,
{
    fn send_message(&self, object: &str, method: &str, payload: &str) {
        self(object, method, payload)
    }
}

/// Host sink that only logs, for running without a host attached
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl HostSink for TracingSink {
    fn send_message(&self, object: &str, method: &str, payload: &str) {
        tracing::info!(target: "muse_bridge::host", "{}.{}({})", object, method, payload);
    }
}

/// Object and method a host listener is registered under
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTarget {
    pub object: String,
    pub method: String,
}

impl HostTarget {
    pub fn new(object: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
        }
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        SubscriberId::new(self.object.as_str(), self.method.as_str())
    }

    /// Subscriber that renders each envelope and forwards it to `sink`
    pub fn into_subscriber(self, sink: Arc<dyn HostSink>) -> SubscriberHandle {
        let id = self.subscriber_id();
        SubscriberHandle::new(id, move |envelope: &EventEnvelope| {
            match host_payload(&envelope.payload) {
                Ok(payload) => sink.send_message(&self.object, &self.method, &payload),
                Err(e) => tracing::warn!(
                    "Dropping {} event for {}.{}: {}",
                    envelope.category,
                    self.object,
                    self.method,
                    e
                ),
            }
        })
    }
}

impl std::fmt::Display for HostTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.object, self.method)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ConnectionStatusMessage<'a> {
    previous_connection_state: &'a str,
    current_connection_state: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> From<&'a ConnectionStatusEvent> for ConnectionStatusMessage<'a> {
    fn from(event: &'a ConnectionStatusEvent) -> Self {
        Self {
            previous_connection_state: event.previous.as_str(),
            current_connection_state: event.current.as_str(),
            error: event.error.as_deref(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DataPacketMessage<'a> {
    data_packet_type: &'a str,
    data_packet_value: Vec<f64>,
    time_stamp: i64,
}

impl<'a> From<&'a DataPacket> for DataPacketMessage<'a> {
    fn from(packet: &'a DataPacket) -> Self {
        Self {
            data_packet_type: packet.packet_type.as_str(),
            // JSON has no NaN or infinity
            data_packet_value: packet
                .values
                .iter()
                .map(|value| if value.is_finite() { *value } else { 0.0 })
                .collect(),
            time_stamp: packet.timestamp_us,
        }
    }
}

// Flags are sent as "true"/"false" strings
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ArtifactMessage {
    headband_on: String,
    blink: String,
    jaw_clench: String,
}

impl From<&ArtifactPacket> for ArtifactMessage {
    fn from(packet: &ArtifactPacket) -> Self {
        Self {
            headband_on: packet.headband_on.to_string(),
            blink: packet.blink.to_string(),
            jaw_clench: packet.jaw_clench.to_string(),
        }
    }
}

/// Render a payload as the string a host listener receives
pub fn host_payload(payload: &EventPayload) -> serde_json::Result<String> {
    match payload {
        EventPayload::ConnectionStatus(event) => {
            serde_json::to_string(&ConnectionStatusMessage::from(event))
        }
        EventPayload::DataPacket(packet) => serde_json::to_string(&DataPacketMessage::from(packet)),
        EventPayload::Artifact(packet) => serde_json::to_string(&ArtifactMessage::from(packet)),
        EventPayload::DeviceDiscovery(devices) => Ok(device_list(devices)),
    }
}

fn device_list(devices: &[DeviceHandle]) -> String {
    devices
        .iter()
        .map(DeviceHandle::name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One message delivered to a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMessage {
    pub object: String,
    pub method: String,
    pub payload: String,
}

/// Sink that keeps every message it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: parking_lot::Mutex<Vec<HostMessage>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<HostMessage> {
        self.messages.lock().clone()
    }

    /// Payloads delivered to `object.method`, in delivery order
    pub fn payloads_for(&self, object: &str, method: &str) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|message| message.object == object && message.method == method)
            .map(|message| message.payload.clone())
            .collect()
    }
}

impl HostSink for RecordingSink {
    fn send_message(&self, object: &str, method: &str, payload: &str) {
        self.messages.lock().push(HostMessage {
            object: object.to_string(),
            method: method.to_string(),
            payload: payload.to_string(),
        });
    }
}
