//! Per-subscriber packet type filtering
//!
//! Each subscriber carries its own filter, so two subscribers can watch
//! different subsets of the data stream at the same time.

use std::collections::BTreeSet;

use muse_types::PacketType;

use crate::event::EventEnvelope;

/// Set of packet types a subscriber opted into. Empty means all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PacketFilter {
    accepted: BTreeSet<PacketType>,
}

impl PacketFilter {
    /// A filter that lets every packet type through
    pub fn all() -> Self {
        Self::default()
    }

    pub fn only<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<PacketType>,
    {
        Self {
            accepted: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn packet_types(&self) -> &BTreeSet<PacketType> {
        &self.accepted
    }

    /// Deliver/drop decision for one packet type
    pub fn accepts(&self, packet_type: &PacketType) -> bool {
        self.accepted.is_empty() || self.accepted.contains(packet_type)
    }

    /// Deliver/drop decision for an envelope; only DataPacket envelopes are filtered
    pub fn matches(&self, envelope: &EventEnvelope) -> bool {
        match envelope.packet_type() {
            Some(packet_type) => self.accepts(packet_type),
            None => true,
        }
    }
}

impl From<Option<BTreeSet<PacketType>>> for PacketFilter {
    fn from(types: Option<BTreeSet<PacketType>>) -> Self {
        Self {
            accepted: types.unwrap_or_default(),
        }
    }
}
