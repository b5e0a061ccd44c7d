//! Dedicated host-context thread
//!
//! For hosts without a loop of their own, `HostLoop` spawns a thread,
//! binds the marshaller to it, and drains continuously until shut down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::marshaller::Marshaller;

type Tick = Box<dyn Fn() + Send + 'static>;

/// Background thread acting as the host execution context
pub struct HostLoop {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl HostLoop {
    /// Spawn the loop; the marshaller is rebound to the new thread before the first drain
    pub fn spawn(marshaller: Arc<Marshaller>) -> std::io::Result<Self> {
        Self::spawn_with_tick(marshaller, None)
    }

    /// Spawn the loop, running `tick` after every drain pass
    pub fn spawn_with_tick(marshaller: Arc<Marshaller>, tick: Option<Tick>) -> std::io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let poll_interval = marshaller.config().drain_poll_interval;

        let handle = thread::Builder::new()
            .name("muse-host-loop".to_string())
            .spawn(move || {
                marshaller.bind_to_current_thread();
                tracing::info!("Host loop started");

                while !stop.load(Ordering::Acquire) {
                    if let Err(e) = marshaller.drain_timeout(poll_interval) {
                        tracing::error!("Host loop lost its execution context: {}", e);
                        break;
                    }
                    if let Some(tick) = &tick {
                        tick();
                    }
                }

                // Flush whatever is still queued so late status events aren't lost
                while let Ok(drained) = marshaller.drain() {
                    if drained == 0 {
                        break;
                    }
                }
                tracing::info!("Host loop shut down");
            })?;

        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stop the loop and wait for it to exit
    ///
    /// Called from a subscriber running on the loop itself, this only
    /// signals the loop; it exits once the current drain returns.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            tracing::debug!("Host loop stopping from its own thread; not joining");
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("Host loop panicked during shutdown");
        }
    }
}

impl Drop for HostLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventCategory, EventPayload};
    use crate::registry::ListenerRegistry;
    use crate::subscriber::{SubscriberHandle, SubscriberId};
    use muse_types::ArtifactPacket;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_loop_delivers_on_its_own_thread() {
        let registry = Arc::new(ListenerRegistry::new());
        let (handle, rx) = SubscriberHandle::channel(SubscriberId::new("T", "artifact"));
        registry.subscribe(EventCategory::ArtifactEvent, handle, None);

        let marshaller = Arc::new(Marshaller::new(Arc::clone(&registry)));
        let mut host = HostLoop::spawn(Arc::clone(&marshaller)).unwrap();
        assert!(host.is_running());

        marshaller
            .sender()
            .send(EventPayload::Artifact(ArtifactPacket { blink: true, ..Default::default() }))
            .unwrap();

        let envelope = rx.recv_timeout(Duration::from_secs(2)).expect("envelope delivered");
        assert_eq!(envelope.category, EventCategory::ArtifactEvent);
        assert!(!marshaller.is_host_context());

        host.shutdown();
        assert!(!host.is_running());
    }

    #[test]
    fn test_shutdown_from_loop_thread_does_not_join_itself() {
        let registry = Arc::new(ListenerRegistry::new());
        let marshaller = Arc::new(Marshaller::new(Arc::clone(&registry)));
        let host = Arc::new(parking_lot::Mutex::new(None::<HostLoop>));
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);

        let from_loop = Arc::clone(&host);
        registry.subscribe(
            EventCategory::ArtifactEvent,
            SubscriberHandle::new(SubscriberId::new("T", "stop"), move |_| {
                if let Some(mut host) = from_loop.lock().take() {
                    host.shutdown();
                    let _ = tx.lock().send(host.is_running());
                }
            }),
            None,
        );

        *host.lock() = Some(HostLoop::spawn(Arc::clone(&marshaller)).unwrap());
        marshaller
            .sender()
            .send(EventPayload::Artifact(ArtifactPacket::default()))
            .unwrap();

        let still_running = rx.recv_timeout(Duration::from_secs(2)).expect("shutdown returned");
        assert!(!still_running);
    }

    #[test]
    fn test_tick_runs_between_drains() {
        let marshaller = Arc::new(Marshaller::new(Arc::new(ListenerRegistry::new())));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let host = HostLoop::spawn_with_tick(
            marshaller,
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            })),
        )
        .unwrap();

        thread::sleep(Duration::from_millis(60));
        drop(host);
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }
}
