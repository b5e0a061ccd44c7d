//! Ordering tests for the marshaller
//!
//! Several producer threads stand in for SDK callback threads feeding the
//! same category while the test thread drains as the host context.

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use muse_relay::{
    EventCategory, EventPayload, ListenerRegistry, Marshaller, PacketFilter, SubscriberHandle,
    SubscriberId,
};
use muse_types::{ArtifactPacket, DataPacket};

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 500;

/// Encode (producer, index) into the packet timestamp so each producer's
/// own order can be checked after delivery.
fn stamp(producer: usize, index: usize) -> i64 {
    (producer * 1_000_000 + index) as i64
}

#[test]
fn test_interleaved_producers_preserve_enqueue_order() {
    let registry = Arc::new(ListenerRegistry::new());
    let (handle, rx) = SubscriberHandle::channel(SubscriberId::new("Host", "OnData"));
    registry.subscribe(EventCategory::DataPacket, handle, None);

    let marshaller = Marshaller::new(Arc::clone(&registry));
    let barrier = Arc::new(Barrier::new(PRODUCERS));

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let sender = marshaller.sender();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for index in 0..PER_PRODUCER {
                    let packet = DataPacket::new("EEG", vec![index as f64], stamp(producer, index));
                    sender.send(EventPayload::DataPacket(packet)).unwrap();
                }
            })
        })
        .collect();

    // Drain concurrently with the producers, as a host frame loop would
    let expected = PRODUCERS * PER_PRODUCER;
    let mut delivered = Vec::with_capacity(expected);
    let deadline = Instant::now() + Duration::from_secs(10);
    while delivered.len() < expected && Instant::now() < deadline {
        marshaller.drain_timeout(Duration::from_millis(5)).unwrap();
        delivered.extend(rx.try_iter());
    }
    for producer in producers {
        producer.join().unwrap();
    }
    marshaller.drain().unwrap();
    delivered.extend(rx.try_iter());

    assert_eq!(delivered.len(), expected);

    // Delivery order is exactly enqueue order
    for pair in delivered.windows(2) {
        assert!(pair[0].sequence < pair[1].sequence, "sequence went backwards");
    }

    // And every producer's own packets arrive in the order it sent them
    let mut last_index = vec![None::<i64>; PRODUCERS];
    for envelope in &delivered {
        let EventPayload::DataPacket(packet) = &envelope.payload else {
            panic!("unexpected payload {:?}", envelope.payload);
        };
        let producer = (packet.timestamp_us / 1_000_000) as usize;
        let index = packet.timestamp_us % 1_000_000;
        if let Some(previous) = last_index[producer] {
            assert!(index > previous, "producer {producer} reordered");
        }
        last_index[producer] = Some(index);
    }
}

#[test]
fn test_categories_keep_their_own_order_when_mixed() {
    let registry = Arc::new(ListenerRegistry::new());
    let (data_handle, data_rx) = SubscriberHandle::channel(SubscriberId::new("Host", "OnData"));
    let (artifact_handle, artifact_rx) =
        SubscriberHandle::channel(SubscriberId::new("Host", "OnArtifact"));
    registry.subscribe(EventCategory::DataPacket, data_handle, Some(PacketFilter::all()));
    registry.subscribe(EventCategory::ArtifactEvent, artifact_handle, None);

    let marshaller = Marshaller::new(Arc::clone(&registry));
    let data_sender = marshaller.sender();
    let artifact_sender = marshaller.sender();

    let data_thread = thread::spawn(move || {
        for index in 0..200 {
            data_sender
                .send(EventPayload::DataPacket(DataPacket::new("ACCELEROMETER", vec![], index)))
                .unwrap();
        }
    });
    let artifact_thread = thread::spawn(move || {
        for index in 0..200 {
            artifact_sender
                .send(EventPayload::Artifact(ArtifactPacket {
                    blink: index % 2 == 0,
                    ..Default::default()
                }))
                .unwrap();
        }
    });
    data_thread.join().unwrap();
    artifact_thread.join().unwrap();

    while marshaller.drain().unwrap() > 0 {}

    let data: Vec<i64> = data_rx
        .try_iter()
        .map(|envelope| match envelope.payload {
            EventPayload::DataPacket(packet) => packet.timestamp_us,
            other => panic!("unexpected payload {other:?}"),
        })
        .collect();
    assert_eq!(data, (0..200).collect::<Vec<_>>());

    let blinks: Vec<bool> = artifact_rx
        .try_iter()
        .map(|envelope| match envelope.payload {
            EventPayload::Artifact(packet) => packet.blink,
            other => panic!("unexpected payload {other:?}"),
        })
        .collect();
    assert_eq!(blinks.len(), 200);
    assert!(blinks.iter().enumerate().all(|(i, blink)| *blink == (i % 2 == 0)));
}

#[test]
fn test_subscriber_finishes_before_next_envelope() {
    let registry = Arc::new(ListenerRegistry::new());
    let in_flight = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let overlaps = Arc::new(std::sync::atomic::AtomicUsize::new(0));

    let flag = Arc::clone(&in_flight);
    let overlap_count = Arc::clone(&overlaps);
    registry.subscribe(
        EventCategory::ArtifactEvent,
        SubscriberHandle::new(SubscriberId::new("Slow", "cb"), move |_| {
            use std::sync::atomic::Ordering;
            if flag.swap(true, Ordering::SeqCst) {
                overlap_count.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_millis(1));
            flag.store(false, Ordering::SeqCst);
        }),
        None,
    );

    let marshaller = Marshaller::new(Arc::clone(&registry));
    for _ in 0..20 {
        marshaller
            .sender()
            .send(EventPayload::Artifact(ArtifactPacket::default()))
            .unwrap();
    }
    assert_eq!(marshaller.drain().unwrap(), 20);
    assert_eq!(overlaps.load(std::sync::atomic::Ordering::SeqCst), 0);
}
