//! Connection lifecycle manager
//!
//! Owns the connection state, drives the vendor SDK, and turns SDK
//! callbacks into relay envelopes. Control calls and SDK callbacks both go
//! through the pure table in [`crate::state`].
//!
//! Locking: the state lock is held while a transition is decided and its
//! status envelopes are enqueued, so envelopes leave in the order the state
//! changed. It is always released before calling into the SDK, because the
//! SDK may call back synchronously.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::Mutex;

use muse_relay::{EnvelopeSender, EventPayload};
use muse_types::{
    ArtifactPacket, AttemptToken, ConnectRequest, ConnectionState, ConnectionStatusEvent,
    DataPacket, DeviceHandle, MuseSdk, PacketType, SdkConnectionStatus, SdkListener,
};

use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use crate::state::{next_state, on_sdk_status, Operation, Transition};

#[derive(Debug, Default)]
struct Link {
    state: ConnectionState,
    device: Option<DeviceHandle>,
    token: Option<AttemptToken>,
    attempt_started: Option<Instant>,
}

/// SDK work left to do once the state lock is released
enum Teardown {
    None,
    StopDiscovery,
    /// Best effort, the state has already settled
    Release(DeviceHandle),
    /// Confirmation expected through `on_connection_status`
    Await(DeviceHandle, Option<AttemptToken>),
}

/// Drives discovery, connection and teardown against a [`MuseSdk`]
pub struct ConnectionManager {
    sdk: Arc<dyn MuseSdk>,
    events: EnvelopeSender,
    config: ConnectionConfig,
    link: Mutex<Link>,
    next_token: AtomicU64,
    devices: Mutex<Vec<DeviceHandle>>,
    packet_types: Mutex<BTreeSet<PacketType>>,
}

impl ConnectionManager {
    /// Create a manager and register it as the SDK's listener
    ///
    /// The SDK only holds a weak reference, so dropping the returned `Arc`
    /// stops callback delivery.
    pub fn new(sdk: Arc<dyn MuseSdk>, events: EnvelopeSender, config: ConnectionConfig) -> Arc<Self> {
        let manager = Arc::new(Self {
            sdk,
            events,
            config,
            link: Mutex::new(Link::default()),
            next_token: AtomicU64::new(1),
            devices: Mutex::new(Vec::new()),
            packet_types: Mutex::new(BTreeSet::new()),
        });

        let listener = Arc::downgrade(&manager) as Weak<dyn SdkListener>;
        manager.sdk.set_listener(listener);
        tracing::debug!("Connection manager registered with SDK {}", manager.sdk.version());

        manager
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.link.lock().state
    }

    /// Device of the current or most recent attempt; cleared on Disconnected
    pub fn current_device(&self) -> Option<DeviceHandle> {
        self.link.lock().device.clone()
    }

    pub fn sdk_version(&self) -> String {
        self.sdk.version()
    }

    /// Every device the SDK has advertised, in first-seen order
    pub fn known_devices(&self) -> Vec<DeviceHandle> {
        self.devices.lock().clone()
    }

    /// Resolve a host-supplied device name against discovered devices
    pub fn device_by_name(&self, name: &str) -> Result<DeviceHandle> {
        self.devices
            .lock()
            .iter()
            .find(|device| device.name() == name)
            .cloned()
            .ok_or_else(|| ConnectionError::UnknownDevice(name.to_string()))
    }

    /// Ask the SDK to stream `packet_type` on the next connect
    pub fn listen_for_data_packet(&self, packet_type: impl Into<PacketType>) -> Result<()> {
        let packet_type = packet_type.into();
        if packet_type.as_str().is_empty() {
            return Err(ConnectionError::InvalidPacketType(String::new()));
        }
        if !packet_type.is_known() {
            tracing::warn!("Unrecognised packet type {}, requesting it anyway", packet_type);
        }

        let added = self.packet_types.lock().insert(packet_type.clone());
        if added && self.state().has_link() {
            tracing::debug!("Packet type {} takes effect on the next connect", packet_type);
        }
        Ok(())
    }

    pub fn requested_packet_types(&self) -> BTreeSet<PacketType> {
        self.packet_types.lock().clone()
    }

    pub fn start_scan(&self) -> Result<()> {
        {
            let mut link = self.link.lock();
            match next_state(link.state, Operation::StartScan)? {
                Transition::Stay => {
                    tracing::debug!("Already scanning");
                    return Ok(());
                }
                transition => self.apply_transition(&mut link, transition),
            }
        }

        if let Err(e) = self.sdk.start_discovery() {
            tracing::warn!("SDK refused to start discovery: {}", e);
            let mut link = self.link.lock();
            if link.state == ConnectionState::Scanning {
                self.apply(&mut link, ConnectionState::Disconnected, None);
            }
            return Err(e.into());
        }

        tracing::info!("Scanning for headbands");
        Ok(())
    }

    pub fn stop_scan(&self) -> Result<()> {
        {
            let mut link = self.link.lock();
            let transition = next_state(link.state, Operation::StopScan)?;
            self.apply_transition(&mut link, transition);
        }

        if let Err(e) = self.sdk.stop_discovery() {
            tracing::warn!("SDK failed to stop discovery: {}", e);
        }
        Ok(())
    }

    /// Begin a connection attempt to `device`
    ///
    /// From Connected, the existing link is torn down first. The returned
    /// token identifies this attempt in SDK callbacks.
    pub fn connect(&self, device: DeviceHandle) -> Result<AttemptToken> {
        let (request, previous_link, stop_discovery) = {
            let mut link = self.link.lock();
            let from = link.state;
            let transition = next_state(from, Operation::Connect)?;

            let previous_link = match (from, transition) {
                (ConnectionState::Connected, Transition::Settle { via, .. }) => {
                    let old = link.device.clone();
                    self.apply(&mut link, via, None);
                    old
                }
                _ => None,
            };

            let token = AttemptToken::new(self.next_token.fetch_add(1, Ordering::Relaxed));
            link.device = Some(device.clone());
            link.token = Some(token);
            link.attempt_started = Some(Instant::now());
            self.apply(&mut link, ConnectionState::Connecting, None);

            let request = ConnectRequest {
                device,
                token,
                packet_types: self.requested_packet_types(),
            };
            let stop_discovery = from == ConnectionState::Scanning && self.config.stop_scan_on_connect;
            (request, previous_link, stop_discovery)
        };

        if stop_discovery {
            if let Err(e) = self.sdk.stop_discovery() {
                tracing::warn!("SDK failed to stop discovery before connecting: {}", e);
            }
        }
        if let Some(old) = previous_link {
            tracing::info!("Dropping link to {} before reconnecting", old);
            if let Err(e) = self.sdk.disconnect(&old) {
                tracing::warn!("SDK failed to disconnect {}: {}", old, e);
            }
        }

        let token = request.token;
        tracing::info!("Connecting to {} ({})", request.device, token);
        if let Err(e) = self.sdk.connect(request) {
            tracing::warn!("SDK rejected connect for {}: {}", token, e);
            let mut link = self.link.lock();
            if link.token == Some(token) && link.state == ConnectionState::Connecting {
                self.apply(&mut link, ConnectionState::Failed, Some(e.to_string()));
            }
            return Err(e.into());
        }

        Ok(token)
    }

    pub fn disconnect(&self) -> Result<()> {
        let teardown = {
            let mut link = self.link.lock();
            let from = link.state;
            let device = link.device.clone();
            let token = link.token;

            match next_state(from, Operation::Disconnect)? {
                Transition::Stay => {
                    tracing::debug!("Disconnect already in progress");
                    Teardown::None
                }
                transition @ Transition::Move(_) => {
                    self.apply_transition(&mut link, transition);
                    match device {
                        Some(device) => Teardown::Await(device, token),
                        None => Teardown::None,
                    }
                }
                transition @ Transition::Settle { .. } => {
                    self.apply_transition(&mut link, transition);
                    match (from, device) {
                        (ConnectionState::Scanning, _) => Teardown::StopDiscovery,
                        (_, Some(device)) => Teardown::Release(device),
                        (_, None) => Teardown::None,
                    }
                }
            }
        };

        match teardown {
            Teardown::None => Ok(()),
            Teardown::StopDiscovery => {
                if let Err(e) = self.sdk.stop_discovery() {
                    tracing::warn!("SDK failed to stop discovery: {}", e);
                }
                Ok(())
            }
            Teardown::Release(device) => {
                if let Err(e) = self.sdk.disconnect(&device) {
                    tracing::debug!("Best-effort disconnect of {} failed: {}", device, e);
                }
                Ok(())
            }
            Teardown::Await(device, token) => {
                tracing::info!("Disconnecting from {}", device);
                if let Err(e) = self.sdk.disconnect(&device) {
                    // No confirmation will come; settle now rather than hang in Disconnecting
                    tracing::warn!("SDK failed to disconnect {}: {}", device, e);
                    let mut link = self.link.lock();
                    if link.state == ConnectionState::Disconnecting && link.token == token {
                        self.apply(&mut link, ConnectionState::Disconnected, None);
                    }
                    return Err(e.into());
                }
                Ok(())
            }
        }
    }

    /// Fail a Connecting attempt that has outlived `connect_timeout`
    ///
    /// Does nothing when no timeout is configured. Returns whether an
    /// attempt was failed.
    pub fn poll_timeout(&self, now: Instant) -> bool {
        let Some(timeout) = self.config.connect_timeout else {
            return false;
        };

        let device = {
            let mut link = self.link.lock();
            let expired = link.state == ConnectionState::Connecting
                && link
                    .attempt_started
                    .map(|started| now.saturating_duration_since(started) >= timeout)
                    .unwrap_or(false);
            if !expired {
                return false;
            }

            tracing::warn!("Connection attempt timed out after {:?}", timeout);
            let device = link.device.clone();
            self.apply(
                &mut link,
                ConnectionState::Failed,
                Some(format!("Connection attempt timed out after {timeout:?}")),
            );
            device
        };

        if let Some(device) = device {
            if let Err(e) = self.sdk.disconnect(&device) {
                tracing::debug!("Cancelling timed out attempt on {} failed: {}", device, e);
            }
        }
        true
    }

    fn apply_transition(&self, link: &mut Link, transition: Transition) {
        match transition {
            Transition::Stay => {}
            Transition::Move(to) => self.apply(link, to, None),
            Transition::Settle { via, to } => {
                self.apply(link, via, None);
                self.apply(link, to, None);
            }
        }
    }

    /// Change state and enqueue exactly one status envelope for it
    fn apply(&self, link: &mut Link, to: ConnectionState, error: Option<String>) {
        let previous = link.state;
        link.state = to;

        let event = ConnectionStatusEvent {
            previous,
            current: to,
            device: link.device.clone(),
            error,
        };
        match &event.error {
            Some(reason) => tracing::warn!("Connection {} -> {}: {}", previous, to, reason),
            None => tracing::info!("Connection {} -> {}", previous, to),
        }
        self.publish(EventPayload::ConnectionStatus(event));

        match to {
            ConnectionState::Disconnected => {
                link.device = None;
                link.token = None;
                link.attempt_started = None;
            }
            ConnectionState::Failed => {
                link.token = None;
                link.attempt_started = None;
            }
            _ => {}
        }
    }

    fn publish(&self, payload: EventPayload) {
        let category = payload.category();
        if self.events.send(payload).is_err() {
            tracing::debug!("Relay closed, {} event not delivered", category);
        }
    }
}

impl SdkListener for ConnectionManager {
    fn on_connection_status(&self, token: AttemptToken, status: SdkConnectionStatus) {
        let mut link = self.link.lock();
        if link.token != Some(token) {
            tracing::debug!("Discarding {:?} for stale {}", status, token);
            return;
        }

        let Some(next) = on_sdk_status(link.state, &status) else {
            tracing::debug!("Ignoring {:?} while {}", status, link.state);
            return;
        };

        let error = if next == ConnectionState::Failed {
            Some(match status {
                SdkConnectionStatus::Failed { reason } => reason,
                _ => "Link closed by device".to_string(),
            })
        } else {
            None
        };
        if next == ConnectionState::Connected {
            link.attempt_started = None;
        }
        self.apply(&mut link, next, error);
    }

    fn on_data_packet(&self, packet: DataPacket) {
        self.publish(EventPayload::DataPacket(packet));
    }

    fn on_artifact(&self, packet: ArtifactPacket) {
        self.publish(EventPayload::Artifact(packet));
    }

    fn on_devices_changed(&self, devices: Vec<DeviceHandle>) {
        {
            let mut known = self.devices.lock();
            for device in &devices {
                match known.iter_mut().find(|existing| existing.name() == device.name()) {
                    Some(existing) => *existing = device.clone(),
                    None => {
                        tracing::debug!("Discovered {}", device);
                        known.push(device.clone());
                    }
                }
            }
        }
        self.publish(EventPayload::DeviceDiscovery(devices));
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("link", &*self.link.lock())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
