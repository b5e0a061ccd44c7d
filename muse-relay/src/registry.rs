//! Listener registry with replace-on-resubscribe semantics
//!
//! Maps each [`EventCategory`] to its subscribers in registration order.
//! The map is only locked long enough to mutate it or to snapshot one
//! category's subscriber list; subscriber callbacks always run unlocked, so
//! a callback may subscribe or unsubscribe without deadlocking.

use std::sync::Arc;

use dashmap::DashMap;

use crate::event::{EventCategory, EventEnvelope};
use crate::filter::PacketFilter;
use crate::subscriber::{SubscriberHandle, SubscriberId};

#[derive(Debug)]
struct Registration {
    handle: SubscriberHandle,
    filter: PacketFilter,
}

/// Thread-safe registry of event subscribers
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    subscribers: DashMap<EventCategory, Vec<Arc<Registration>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handle` for `category`, optionally narrowed to some packet types
    ///
    /// A subscriber with the same identity already registered for this
    /// category is replaced in place, keeping its delivery position.
    /// Returns `true` if an existing registration was replaced.
    pub fn subscribe(
        &self,
        category: EventCategory,
        handle: SubscriberHandle,
        filter: Option<PacketFilter>,
    ) -> bool {
        let filter = filter.unwrap_or_default();
        if category != EventCategory::DataPacket && !filter.is_empty() {
            tracing::debug!(
                "Packet filter for {} on {} category has no effect",
                handle.id(),
                category
            );
        }

        let registration = Arc::new(Registration { handle, filter });
        let mut entries = self.subscribers.entry(category).or_default();

        match entries
            .iter()
            .position(|existing| existing.handle.id() == registration.handle.id())
        {
            Some(index) => {
                tracing::debug!("Replacing {} subscriber {}", category, registration.handle.id());
                entries[index] = registration;
                true
            }
            None => {
                tracing::debug!("Adding {} subscriber {}", category, registration.handle.id());
                entries.push(registration);
                false
            }
        }
    }

    /// Remove the subscriber with identity `id` from `category`
    ///
    /// Unknown subscribers are ignored. Returns whether anything was removed.
    pub fn unsubscribe(&self, category: EventCategory, id: &SubscriberId) -> bool {
        let removed = self
            .subscribers
            .get_mut(&category)
            .map(|mut entries| {
                let before = entries.len();
                entries.retain(|existing| existing.handle.id() != id);
                before != entries.len()
            })
            .unwrap_or(false);

        if !removed {
            tracing::debug!("Ignoring unsubscribe for unknown {} subscriber {}", category, id);
        }
        removed
    }

    /// Deliver `envelope` to every matching subscriber of its category
    ///
    /// Subscribers are called in registration order. Returns how many
    /// subscribers received the envelope.
    pub fn publish(&self, envelope: &EventEnvelope) -> usize {
        let snapshot: Vec<Arc<Registration>> = match self.subscribers.get(&envelope.category) {
            Some(entries) => entries.clone(),
            None => return 0,
        };

        let mut delivered = 0;
        for registration in snapshot {
            if registration.filter.matches(envelope) {
                registration.handle.deliver(envelope);
                delivered += 1;
            }
        }
        delivered
    }

    pub fn subscriber_count(&self, category: EventCategory) -> usize {
        self.subscribers
            .get(&category)
            .map(|entries| entries.len())
            .unwrap_or(0)
    }

    pub fn is_subscribed(&self, category: EventCategory, id: &SubscriberId) -> bool {
        self.subscribers
            .get(&category)
            .map(|entries| entries.iter().any(|existing| existing.handle.id() == id))
            .unwrap_or(false)
    }

    /// Subscriber identities for `category`, in delivery order
    pub fn subscribers(&self, category: EventCategory) -> Vec<SubscriberId> {
        self.subscribers
            .get(&category)
            .map(|entries| entries.iter().map(|r| r.handle.id().clone()).collect())
            .unwrap_or_default()
    }

    /// Drop every registration
    pub fn clear(&self) {
        self.subscribers.clear();
    }
}
