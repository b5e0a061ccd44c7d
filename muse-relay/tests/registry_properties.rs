//! Property-based tests for the listener registry and packet filter

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use proptest::prelude::*;

use muse_relay::{
    EventCategory, EventEnvelope, EventPayload, ListenerRegistry, PacketFilter, SubscriberHandle,
    SubscriberId,
};
use muse_types::{ArtifactPacket, DataPacket, PacketType};

// ============================================================================
// Strategies
// ============================================================================

fn category_strategy() -> impl Strategy<Value = EventCategory> {
    prop::sample::select(EventCategory::ALL.to_vec())
}

fn packet_type_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["EEG", "ACC", "GYRO", "BATTERY", "ALPHA_ABSOLUTE"])
        .prop_map(str::to_string)
}

fn filter_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(packet_type_strategy(), 0..4)
}

fn subscriber_id_strategy() -> impl Strategy<Value = SubscriberId> {
    ("[A-Z][a-z]{2,8}", "On[A-Z][a-z]{2,8}").prop_map(|(target, cb)| SubscriberId::new(target, cb))
}

fn data_envelope(packet_type: &str) -> EventEnvelope {
    EventEnvelope::new(0, EventPayload::DataPacket(DataPacket::new(packet_type, vec![1.0], 0)))
}

fn noop(id: SubscriberId) -> SubscriberHandle {
    SubscriberHandle::new(id, |_| {})
}

// ============================================================================
// Idempotent replace
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Subscribing the same identity any number of times leaves one registration
    #[test]
    fn prop_resubscribe_leaves_one_registration(
        category in category_strategy(),
        id in subscriber_id_strategy(),
        repeats in 1usize..6,
    ) {
        let registry = ListenerRegistry::new();
        for _ in 0..repeats {
            registry.subscribe(category, noop(id.clone()), None);
        }
        prop_assert_eq!(registry.subscriber_count(category), 1);
        prop_assert!(registry.is_subscribed(category, &id));
    }

    /// Only the latest registration's callback runs after a replace
    #[test]
    fn prop_replace_uses_latest_callback(
        id in subscriber_id_strategy(),
        repeats in 1usize..6,
    ) {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(Mutex::new(Vec::new()));
        for generation in 0..repeats {
            let hits = Arc::clone(&hits);
            registry.subscribe(
                EventCategory::ArtifactEvent,
                SubscriberHandle::new(id.clone(), move |_| hits.lock().push(generation)),
                None,
            );
        }
        registry.publish(&EventEnvelope::new(0, EventPayload::Artifact(ArtifactPacket::default())));
        prop_assert_eq!(hits.lock().clone(), vec![repeats - 1]);
    }

    /// Distinct identities keep registration order
    #[test]
    fn prop_distinct_subscribers_keep_order(
        ids in prop::collection::btree_set(subscriber_id_strategy(), 1..8),
    ) {
        let registry = ListenerRegistry::new();
        let ordered: Vec<SubscriberId> = ids.into_iter().rev().collect();
        for id in &ordered {
            registry.subscribe(EventCategory::ConnectionStatus, noop(id.clone()), None);
        }
        prop_assert_eq!(registry.subscribers(EventCategory::ConnectionStatus), ordered);
    }
}

// ============================================================================
// Unsubscribe of unknown subscribers
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_unsubscribe_unknown_is_noop(
        category in category_strategy(),
        registered in subscriber_id_strategy(),
        stranger in subscriber_id_strategy(),
    ) {
        prop_assume!(registered != stranger);
        let registry = ListenerRegistry::new();
        registry.subscribe(category, noop(registered.clone()), None);

        prop_assert!(!registry.unsubscribe(category, &stranger));
        prop_assert_eq!(registry.subscriber_count(category), 1);
        prop_assert!(registry.is_subscribed(category, &registered));
    }
}

// ============================================================================
// Packet filter law
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A DataPacket of type P reaches a subscriber iff its filter is empty or contains P
    #[test]
    fn prop_data_packet_delivery_follows_filter(
        filters in prop::collection::vec(filter_strategy(), 1..6),
        packet_type in packet_type_strategy(),
    ) {
        let registry = ListenerRegistry::new();
        let receivers: Vec<_> = filters
            .iter()
            .enumerate()
            .map(|(i, filter)| {
                let (handle, rx) = SubscriberHandle::channel(SubscriberId::new(format!("S{i}"), "OnData"));
                registry.subscribe(
                    EventCategory::DataPacket,
                    handle,
                    Some(PacketFilter::only(filter.iter().map(String::as_str))),
                );
                rx
            })
            .collect();

        registry.publish(&data_envelope(&packet_type));

        for (filter, rx) in filters.iter().zip(&receivers) {
            let expected = filter.is_empty() || filter.contains(&packet_type);
            prop_assert_eq!(rx.try_iter().count(), usize::from(expected));
        }
    }

    /// Filters never affect non-DataPacket categories
    #[test]
    fn prop_filter_ignored_outside_data_packets(filter in filter_strategy()) {
        let registry = ListenerRegistry::new();
        let (handle, rx) = SubscriberHandle::channel(SubscriberId::new("S", "OnArtifact"));
        registry.subscribe(
            EventCategory::ArtifactEvent,
            handle,
            Some(PacketFilter::only(filter.iter().map(|t| PacketType::new(t.as_str())))),
        );

        registry.publish(&EventEnvelope::new(0, EventPayload::Artifact(ArtifactPacket::default())));
        prop_assert_eq!(rx.try_iter().count(), 1);
    }
}

#[test]
fn test_eeg_filter_scenario() {
    let registry = ListenerRegistry::new();
    let (handle, rx) = SubscriberHandle::channel(SubscriberId::new("S", "OnData"));
    registry.subscribe(EventCategory::DataPacket, handle, Some(PacketFilter::only(["EEG"])));

    registry.publish(&data_envelope("ACC"));
    assert_eq!(rx.try_iter().count(), 0);

    registry.publish(&data_envelope("EEG"));
    assert_eq!(rx.try_iter().count(), 1);
}
