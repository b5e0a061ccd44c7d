//! # Muse Relay
//!
//! Moves headband events from the vendor SDK's callback threads to host-side
//! subscribers, on the one execution context the host allows re-entry on.
//!
//! ## Overview
//!
//! ```text
//! SDK thread(s) ──▶ EnvelopeSender ──▶ Marshaller queue
//!                                           │  drain() on host context
//!                                           ▼
//!                                    ListenerRegistry ──▶ PacketFilter ──▶ subscriber
//! ```
//!
//! - [`ListenerRegistry`]: category → ordered subscribers, replace-on-resubscribe
//! - [`PacketFilter`]: per-subscriber narrowing of DataPacket events
//! - [`Marshaller`]: single ordered queue, drained only on the bound thread
//! - [`HostLoop`]: a dedicated thread acting as the host context
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use muse_relay::{EventCategory, EventPayload, ListenerRegistry, Marshaller, SubscriberHandle, SubscriberId};
//! use muse_types::ArtifactPacket;
//!
//! let registry = Arc::new(ListenerRegistry::new());
//! let marshaller = Marshaller::new(Arc::clone(&registry));
//!
//! let (handle, rx) = SubscriberHandle::channel(SubscriberId::new("Game", "OnArtifact"));
//! registry.subscribe(EventCategory::ArtifactEvent, handle, None);
//!
//! // From any thread:
//! let sender = marshaller.sender();
//! sender.send(EventPayload::Artifact(ArtifactPacket { blink: true, ..Default::default() })).unwrap();
//!
//! // On the host context:
//! marshaller.drain().unwrap();
//! assert!(rx.try_recv().is_ok());
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod marshaller;
pub mod registry;
pub mod subscriber;
pub mod worker;

pub use config::RelayConfig;
pub use error::{RelayError, Result};
pub use event::{EventCategory, EventEnvelope, EventPayload};
pub use filter::PacketFilter;
pub use marshaller::{EnvelopeSender, Marshaller};
pub use registry::ListenerRegistry;
pub use subscriber::{SubscriberHandle, SubscriberId};
pub use worker::HostLoop;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EnvelopeSender, EventCategory, EventEnvelope, EventPayload, HostLoop, ListenerRegistry,
        Marshaller, PacketFilter, RelayConfig, RelayError, Result, SubscriberHandle, SubscriberId,
    };
}
