//! Packets emitted by the vendor SDK while a headband is streaming.

use serde::{Deserialize, Serialize};

/// Packet type names the vendor SDK is known to stream.
///
/// [`PacketType`] is an open tag, so names outside this list are still
/// accepted; the list is only used to flag likely typos.
pub const KNOWN_PACKET_TYPES: [&str; 23] = [
    "ACCELEROMETER",
    "GYRO",
    "EEG",
    "QUANTIZATION",
    "BATTERY",
    "DRL_REF",
    "ALPHA_ABSOLUTE",
    "BETA_ABSOLUTE",
    "DELTA_ABSOLUTE",
    "THETA_ABSOLUTE",
    "GAMMA_ABSOLUTE",
    "ALPHA_RELATIVE",
    "BETA_RELATIVE",
    "DELTA_RELATIVE",
    "THETA_RELATIVE",
    "GAMMA_RELATIVE",
    "ALPHA_SCORE",
    "BETA_SCORE",
    "DELTA_SCORE",
    "THETA_SCORE",
    "GAMMA_SCORE",
    "HSI_PRECISION",
    "ARTIFACTS",
];

/// String-identified sub-classification of data packets (e.g. "EEG").
///
/// The bridge never interprets the tag beyond equality; it only narrows
/// which data packets reach which subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketType(String);

impl PacketType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the name appears in [`KNOWN_PACKET_TYPES`]
    pub fn is_known(&self) -> bool {
        KNOWN_PACKET_TYPES.contains(&self.0.as_str())
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PacketType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PacketType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One raw sensor packet as delivered by the SDK.
///
/// `values` is passed through untouched; decoding its meaning is the
/// subscriber's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPacket {
    pub packet_type: PacketType,
    pub values: Vec<f64>,
    /// Device timestamp in microseconds
    pub timestamp_us: i64,
}

impl DataPacket {
    pub fn new(packet_type: impl Into<PacketType>, values: Vec<f64>, timestamp_us: i64) -> Self {
        Self {
            packet_type: packet_type.into(),
            values,
            timestamp_us,
        }
    }
}

/// Artifacts detected on-device (eye blink, jaw clench, headband fit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArtifactPacket {
    pub headband_on: bool,
    pub blink: bool,
    pub jaw_clench: bool,
}
