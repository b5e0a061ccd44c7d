//! Configuration for the connection lifecycle

use std::time::Duration;

/// Controls connection attempts
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Give up on a Connecting attempt after this long
    /// Default: None (wait for the SDK indefinitely)
    pub connect_timeout: Option<Duration>,

    /// Stop discovery before connecting from Scanning
    /// Default: true
    pub stop_scan_on_connect: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            stop_scan_on_connect: true,
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail attempts that haven't connected within 15 seconds
    pub fn with_default_timeout() -> Self {
        Self::default().with_connect_timeout(Duration::from_secs(15))
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn without_connect_timeout(mut self) -> Self {
        self.connect_timeout = None;
        self
    }

    pub fn with_stop_scan_on_connect(mut self, stop: bool) -> Self {
        self.stop_scan_on_connect = stop;
        self
    }
}
