//! MuseBridge - the host-facing facade
//!
//! Wires a [`ConnectionManager`], a [`ListenerRegistry`] and a
//! [`Marshaller`] together behind the calls a host runtime makes.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use muse_connection::ConnectionManager;
use muse_relay::{
    EventCategory, HostLoop, ListenerRegistry, Marshaller, PacketFilter, RelayError,
    SubscriberHandle, SubscriberId,
};
use muse_types::{ConnectionState, DeviceHandle, MuseSdk, PacketType};

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::host::{HostSink, HostTarget};

/// Bridge between a host runtime and one Muse headband
///
/// Control calls can come from any thread. Listener callbacks run on the
/// host execution context: the thread that created the bridge (drained by
/// [`MuseBridge::pump`]) or, with `spawn_host_loop`, a bridge-owned thread.
///
/// # Example
///
/// ```rust,ignore
/// use muse_bridge::{BridgeConfig, HostTarget, MuseBridge};
///
/// let bridge = MuseBridge::new(sdk, sink, BridgeConfig::default())?;
/// bridge.register_muse_listener(HostTarget::new("Menu", "ReceiveMuseList"));
/// bridge.register_connection_listener(HostTarget::new("Menu", "ReceiveConnection"));
/// bridge.listen_for_data_packet("EEG")?;
/// bridge.start_scan()?;
///
/// // Once per host frame:
/// bridge.pump()?;
/// ```
pub struct MuseBridge {
    connection: Arc<ConnectionManager>,
    registry: Arc<ListenerRegistry>,
    marshaller: Arc<Marshaller>,
    sink: Arc<dyn HostSink>,
    host_loop: Mutex<Option<HostLoop>>,
    config: BridgeConfig,
}

impl MuseBridge {
    /// Build a bridge on top of `sdk`, delivering host messages to `sink`
    ///
    /// Without `spawn_host_loop` the calling thread becomes the host
    /// execution context.
    pub fn new(sdk: Arc<dyn MuseSdk>, sink: Arc<dyn HostSink>, config: BridgeConfig) -> Result<Self> {
        let registry = Arc::new(ListenerRegistry::new());
        let marshaller = Arc::new(Marshaller::with_config(
            Arc::clone(&registry),
            config.relay.clone(),
        ));
        let connection = ConnectionManager::new(sdk, marshaller.sender(), config.connection.clone());

        let host_loop = if config.spawn_host_loop {
            let timeouts = Arc::clone(&connection);
            let tick: Box<dyn Fn() + Send> = Box::new(move || {
                timeouts.poll_timeout(Instant::now());
            });
            Some(HostLoop::spawn_with_tick(Arc::clone(&marshaller), Some(tick))?)
        } else {
            None
        };

        tracing::info!(
            "Muse bridge ready (SDK {}, host loop: {})",
            connection.sdk_version(),
            host_loop.is_some()
        );

        Ok(Self {
            connection,
            registry,
            marshaller,
            sink,
            host_loop: Mutex::new(host_loop),
            config,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn connection(&self) -> &Arc<ConnectionManager> {
        &self.connection
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn marshaller(&self) -> &Arc<Marshaller> {
        &self.marshaller
    }

    // ========================================================================
    // Lifecycle control
    // ========================================================================

    /// Start looking for headbands
    pub fn start_scan(&self) -> Result<()> {
        if self.registry.subscriber_count(EventCategory::DeviceDiscovery) == 0 {
            tracing::warn!("Scanning with no device list listener registered; nobody will see results");
        }
        Ok(self.connection.start_scan()?)
    }

    pub fn stop_scan(&self) -> Result<()> {
        Ok(self.connection.stop_scan()?)
    }

    /// Connect to a previously discovered headband by name
    pub fn connect(&self, device_name: &str) -> Result<()> {
        let device = self.connection.device_by_name(device_name)?;
        self.connection.connect(device)?;
        Ok(())
    }

    pub fn disconnect(&self) -> Result<()> {
        Ok(self.connection.disconnect()?)
    }

    /// Request a packet type from the SDK on the next connect
    pub fn listen_for_data_packet(&self, packet_type: &str) -> Result<()> {
        Ok(self.connection.listen_for_data_packet(packet_type)?)
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn known_devices(&self) -> Vec<DeviceHandle> {
        self.connection.known_devices()
    }

    pub fn sdk_version(&self) -> String {
        self.connection.sdk_version()
    }

    // ========================================================================
    // Host listeners
    // ========================================================================

    /// Register a named host target for `category`
    ///
    /// Registering the same target again replaces it, including its packet
    /// filter. Returns `true` when a registration was replaced.
    pub fn register_listener(
        &self,
        category: EventCategory,
        target: HostTarget,
        packet_types: Option<BTreeSet<PacketType>>,
    ) -> bool {
        tracing::debug!("Registering host listener {} for {}", target, category);
        let handle = target.into_subscriber(Arc::clone(&self.sink));
        self.registry
            .subscribe(category, handle, packet_types.map(|types| PacketFilter::from(Some(types))))
    }

    /// Receives the whitespace-separated list of discovered headband names
    pub fn register_muse_listener(&self, target: HostTarget) -> bool {
        self.register_listener(EventCategory::DeviceDiscovery, target, None)
    }

    pub fn register_connection_listener(&self, target: HostTarget) -> bool {
        self.register_listener(EventCategory::ConnectionStatus, target, None)
    }

    /// Receives every data packet the SDK streams
    pub fn register_data_listener(&self, target: HostTarget) -> bool {
        self.register_listener(EventCategory::DataPacket, target, None)
    }

    /// Receives only the listed packet types
    pub fn register_data_listener_for<I, T>(&self, target: HostTarget, packet_types: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<PacketType>,
    {
        let types = packet_types.into_iter().map(Into::into).collect();
        self.register_listener(EventCategory::DataPacket, target, Some(types))
    }

    pub fn register_artifact_listener(&self, target: HostTarget) -> bool {
        self.register_listener(EventCategory::ArtifactEvent, target, None)
    }

    pub fn unregister_listener(&self, category: EventCategory, target: &HostTarget) -> bool {
        self.registry.unsubscribe(category, &target.subscriber_id())
    }

    // ========================================================================
    // Typed subscribers
    // ========================================================================

    pub fn subscribe(
        &self,
        category: EventCategory,
        handle: SubscriberHandle,
        filter: Option<PacketFilter>,
    ) -> bool {
        self.registry.subscribe(category, handle, filter)
    }

    pub fn unsubscribe(&self, category: EventCategory, id: &SubscriberId) -> bool {
        self.registry.unsubscribe(category, id)
    }

    // ========================================================================
    // Host context
    // ========================================================================

    /// Deliver pending events; call from the host execution context
    ///
    /// Also fails a connection attempt that has outlived the configured
    /// timeout, so the resulting status event goes out in the same pump.
    pub fn pump(&self) -> Result<usize> {
        if !self.marshaller.is_host_context() {
            return Err(RelayError::WrongExecutionContext.into());
        }
        self.connection.poll_timeout(Instant::now());
        Ok(self.marshaller.drain()?)
    }

    pub fn has_host_loop(&self) -> bool {
        self.host_loop
            .lock()
            .as_ref()
            .map(HostLoop::is_running)
            .unwrap_or(false)
    }

    /// Disconnect, drop every listener, and stop delivering events
    ///
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        if self.connection.state() != ConnectionState::Disconnected {
            if let Err(e) = self.connection.disconnect() {
                tracing::debug!("Disconnect during shutdown failed: {}", e);
            }
        }
        self.registry.clear();
        self.marshaller.close();

        if let Some(mut host_loop) = self.host_loop.lock().take() {
            host_loop.shutdown();
        }
        tracing::info!("Muse bridge shut down");
    }
}

impl std::fmt::Debug for MuseBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuseBridge")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
