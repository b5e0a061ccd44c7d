//! Cross-thread hand-off of events onto the host execution context
//!
//! SDK callbacks may fire on any thread, but the host only accepts
//! re-entry on one. Producers push envelopes through an [`EnvelopeSender`]
//! (a short lock: stamp a sequence number, push, notify). The host context
//! calls [`Marshaller::drain`], which pops a batch under the same lock,
//! releases it, and publishes each envelope through the registry.
//!
//! Because sequence stamping and the push happen under one lock, queue
//! order is enqueue order, and every category's internal order survives.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::event::{EventEnvelope, EventPayload};
use crate::registry::ListenerRegistry;

#[derive(Debug, Default)]
struct Queue {
    envelopes: VecDeque<EventEnvelope>,
    next_sequence: u64,
    closed: bool,
    dropped: u64,
}

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
}

/// Producer side of the marshaller. Cheap to clone, safe to use from any thread.
#[derive(Debug, Clone)]
pub struct EnvelopeSender {
    shared: Arc<Shared>,
}

impl EnvelopeSender {
    /// Enqueue a payload, returning its sequence number
    ///
    /// Never blocks on subscriber code. Fails only once the marshaller is closed.
    pub fn send(&self, payload: EventPayload) -> Result<u64> {
        let mut queue = self.shared.queue.lock();
        if queue.closed {
            queue.dropped += 1;
            tracing::debug!("Dropping {} event, queue closed", payload.category());
            return Err(RelayError::Closed);
        }

        let sequence = queue.next_sequence;
        queue.next_sequence += 1;
        queue.envelopes.push_back(EventEnvelope::new(sequence, payload));
        drop(queue);

        self.shared.available.notify_one();
        Ok(sequence)
    }
}

/// Single ordered event queue, drained only on the bound host context
pub struct Marshaller {
    shared: Arc<Shared>,
    registry: Arc<ListenerRegistry>,
    context: Mutex<ThreadId>,
    draining: AtomicBool,
    config: RelayConfig,
}

/// Clears the re-entrancy flag even if a subscriber panics mid-drain
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Marshaller {
    /// Create a marshaller bound to the calling thread
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self::with_config(registry, RelayConfig::default())
    }

    pub fn with_config(registry: Arc<ListenerRegistry>, config: RelayConfig) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            registry,
            context: Mutex::new(thread::current().id()),
            draining: AtomicBool::new(false),
            config,
        }
    }

    pub fn sender(&self) -> EnvelopeSender {
        EnvelopeSender {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Make the calling thread the host execution context
    pub fn bind_to_current_thread(&self) {
        let current = thread::current().id();
        let mut context = self.context.lock();
        if *context != current {
            tracing::debug!("Rebinding host context from {:?} to {:?}", *context, current);
            *context = current;
        }
    }

    pub fn is_host_context(&self) -> bool {
        *self.context.lock() == thread::current().id()
    }

    /// Number of envelopes waiting to be drained
    pub fn pending(&self) -> usize {
        self.shared.queue.lock().envelopes.len()
    }

    /// Number of envelopes rejected after [`Marshaller::close`]
    pub fn dropped(&self) -> u64 {
        self.shared.queue.lock().dropped
    }

    pub fn is_closed(&self) -> bool {
        self.shared.queue.lock().closed
    }

    /// Publish queued envelopes, in enqueue order, to the registry
    ///
    /// Publishes at most `max_batch` envelopes, and at least one when any
    /// are queued. Envelopes enqueued by subscribers during this drain wait
    /// for the next one. A drain started from inside a subscriber callback
    /// returns `Ok(0)`.
    pub fn drain(&self) -> Result<usize> {
        if !self.is_host_context() {
            return Err(RelayError::WrongExecutionContext);
        }
        if self.draining.swap(true, Ordering::AcqRel) {
            return Ok(0);
        }
        let _guard = DrainGuard(&self.draining);

        let batch: Vec<EventEnvelope> = {
            let mut queue = self.shared.queue.lock();
            let count = queue.envelopes.len().min(self.config.max_batch.max(1));
            let batch: Vec<EventEnvelope> = queue.envelopes.drain(..count).collect();
            batch
        };

        for envelope in &batch {
            let delivered = self.registry.publish(envelope);
            tracing::trace!(
                "Published {} event #{} to {} subscribers",
                envelope.category,
                envelope.sequence,
                delivered
            );
        }

        Ok(batch.len())
    }

    /// Wait up to `timeout` for envelopes to arrive, then drain
    pub fn drain_timeout(&self, timeout: Duration) -> Result<usize> {
        if !self.is_host_context() {
            return Err(RelayError::WrongExecutionContext);
        }

        {
            let mut queue = self.shared.queue.lock();
            if queue.envelopes.is_empty() && !queue.closed {
                let _ = self.shared.available.wait_for(&mut queue, timeout);
            }
        }

        self.drain()
    }

    /// Stop accepting envelopes. Already-queued envelopes can still be drained.
    pub fn close(&self) {
        let mut queue = self.shared.queue.lock();
        if !queue.closed {
            queue.closed = true;
            tracing::debug!("Marshaller closed with {} envelopes pending", queue.envelopes.len());
        }
        drop(queue);
        self.shared.available.notify_all();
    }
}
