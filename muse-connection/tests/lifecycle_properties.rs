//! Property tests: the manager's state is the fold of the transition table

use std::sync::Arc;

use proptest::prelude::*;

use muse_connection::{next_state, on_sdk_status, ConnectionConfig, ConnectionManager, Operation};
use muse_relay::{EventCategory, EventPayload, ListenerRegistry, Marshaller, SubscriberHandle, SubscriberId};
use muse_types::mock::MockSdk;
use muse_types::{ConnectionState, DeviceHandle, SdkConnectionStatus};

#[derive(Debug, Clone)]
enum Step {
    Host(Operation),
    Sdk(SdkConnectionStatus),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => prop::sample::select(Operation::ALL.to_vec()).prop_map(Step::Host),
        1 => Just(Step::Sdk(SdkConnectionStatus::Connected)),
        1 => Just(Step::Sdk(SdkConnectionStatus::Disconnected)),
        1 => Just(Step::Sdk(SdkConnectionStatus::Failed { reason: "lost".into() })),
    ]
}

fn muse() -> DeviceHandle {
    DeviceHandle::new("00:55:DA:B0:00:01", "Muse-0001")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_state_is_fold_of_transition_table(steps in prop::collection::vec(step_strategy(), 0..40)) {
        let registry = Arc::new(ListenerRegistry::new());
        let (handle, rx) = SubscriberHandle::channel(SubscriberId::new("Prop", "status"));
        registry.subscribe(EventCategory::ConnectionStatus, handle, None);
        let marshaller = Marshaller::new(registry);

        let sdk = MockSdk::new();
        let manager = ConnectionManager::new(sdk.clone(), marshaller.sender(), ConnectionConfig::default());

        let mut expected = ConnectionState::Disconnected;
        let mut expected_events = 0usize;

        for step in steps {
            match step {
                Step::Host(operation) => {
                    let result = match operation {
                        Operation::StartScan => manager.start_scan(),
                        Operation::StopScan => manager.stop_scan(),
                        Operation::Connect => manager.connect(muse()).map(|_| ()),
                        Operation::Disconnect => manager.disconnect(),
                    };
                    match next_state(expected, operation) {
                        Ok(transition) => {
                            prop_assert!(result.is_ok());
                            expected_events += transition.event_count();
                            expected = transition.resolve(expected);
                        }
                        Err(error) => prop_assert_eq!(result, Err(error)),
                    }
                }
                Step::Sdk(status) => {
                    let Some(token) = sdk.last_connect_token() else { continue };
                    if let Some(next) = on_sdk_status(expected, &status) {
                        expected_events += 1;
                        expected = next;
                    }
                    sdk.report_status(token, status);
                }
            }
            prop_assert_eq!(manager.state(), expected);
        }

        while marshaller.drain().unwrap() > 0 {}
        let events: Vec<_> = rx.try_iter().collect();
        prop_assert_eq!(events.len(), expected_events);

        // Consecutive events chain: each one starts where the previous ended
        let mut current = ConnectionState::Disconnected;
        for envelope in events {
            let EventPayload::ConnectionStatus(event) = envelope.payload else {
                panic!("unexpected payload");
            };
            prop_assert_eq!(event.previous, current);
            prop_assert_ne!(event.previous, event.current);
            current = event.current;
        }
        prop_assert_eq!(current, expected);
    }
}
