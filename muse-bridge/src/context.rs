//! Process-wide bridge instance
//!
//! Host runtimes that address the bridge through static entry points need
//! one shared instance. It is installed explicitly, handed out as an `Arc`,
//! and removed by [`BridgeContext::teardown`].

use std::sync::Arc;

use parking_lot::RwLock;

use crate::bridge::MuseBridge;
use crate::error::{BridgeError, Result};

static CONTEXT: RwLock<Option<Arc<MuseBridge>>> = parking_lot::const_rwlock(None);

/// Access point for the process-wide [`MuseBridge`]
pub struct BridgeContext;

impl BridgeContext {
    /// Install `bridge` as the process-wide instance
    pub fn initialize(bridge: MuseBridge) -> Result<Arc<MuseBridge>> {
        let mut context = CONTEXT.write();
        if context.is_some() {
            return Err(BridgeError::AlreadyInitialized);
        }
        let bridge = Arc::new(bridge);
        *context = Some(Arc::clone(&bridge));
        tracing::debug!("Bridge context initialized");
        Ok(bridge)
    }

    pub fn get() -> Result<Arc<MuseBridge>> {
        CONTEXT.read().clone().ok_or(BridgeError::NotInitialized)
    }

    /// Return the installed instance, building it with `init` on first use
    ///
    /// If `init` fails nothing is installed and the error is returned.
    pub fn get_or_initialize<F>(init: F) -> Result<Arc<MuseBridge>>
    where
        F: FnOnce() -> Result<MuseBridge>,
    {
        if let Some(bridge) = CONTEXT.read().as_ref() {
            return Ok(Arc::clone(bridge));
        }

        let mut context = CONTEXT.write();
        // Another thread may have won the race between the two locks
        if let Some(bridge) = context.as_ref() {
            return Ok(Arc::clone(bridge));
        }
        let bridge = Arc::new(init()?);
        *context = Some(Arc::clone(&bridge));
        tracing::debug!("Bridge context initialized on first use");
        Ok(bridge)
    }

    pub fn is_initialized() -> bool {
        CONTEXT.read().is_some()
    }

    /// Shut down and remove the instance. Returns `false` if there was none.
    ///
    /// Handles still held elsewhere stay valid but deliver no more events.
    pub fn teardown() -> bool {
        let Some(bridge) = CONTEXT.write().take() else {
            return false;
        };
        bridge.shutdown();
        tracing::debug!("Bridge context torn down");
        true
    }
}
