//! Configuration for event marshalling

use std::time::Duration;

/// Controls how the marshaller drains its queue
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Most envelopes published by a single `drain` call; the rest stay queued
    /// Default: 1024. Zero is treated as 1
    pub max_batch: usize,

    /// How long a [`crate::HostLoop`] waits for new envelopes before re-checking shutdown
    /// Default: 10 milliseconds
    pub drain_poll_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_batch: 1024,
            drain_poll_interval: Duration::from_millis(10),
        }
    }
}

impl RelayConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Small batches so one busy stream can't starve a host frame
    pub fn low_latency() -> Self {
        Self {
            max_batch: 64,
            drain_poll_interval: Duration::from_millis(2),
        }
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    pub fn with_drain_poll_interval(mut self, interval: Duration) -> Self {
        self.drain_poll_interval = interval;
        self
    }
}
