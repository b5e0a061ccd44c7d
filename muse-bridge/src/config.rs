//! Bridge configuration

use muse_connection::ConnectionConfig;
use muse_relay::RelayConfig;

/// Configuration for a [`crate::MuseBridge`]
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    pub connection: ConnectionConfig,
    pub relay: RelayConfig,

    /// Run a dedicated host-context thread instead of relying on `pump()`
    /// Default: false
    pub spawn_host_loop: bool,
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// For hosts without a frame loop: events are delivered on a bridge-owned
    /// thread and connection attempts give up after the default timeout
    pub fn standalone() -> Self {
        Self {
            connection: ConnectionConfig::with_default_timeout(),
            relay: RelayConfig::default(),
            spawn_host_loop: true,
        }
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_relay(mut self, relay: RelayConfig) -> Self {
        self.relay = relay;
        self
    }

    pub fn with_host_loop(mut self, spawn: bool) -> Self {
        self.spawn_host_loop = spawn;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_pumped_by_host() {
        let config = BridgeConfig::default();
        assert!(!config.spawn_host_loop);
        assert!(config.connection.connect_timeout.is_none());
    }

    #[test]
    fn test_standalone_preset() {
        let config = BridgeConfig::standalone();
        assert!(config.spawn_host_loop);
        assert!(config.connection.connect_timeout.is_some());
    }
}
