//! In-memory SDK double for tests and demos
//!
//! `MockSdk` records every control call and lets the test play the SDK's
//! side of the conversation: advertise devices, confirm or fail a
//! connection attempt, stream packets.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{Result, SdkError};
use crate::packet::{ArtifactPacket, DataPacket};
use crate::sdk::{AttemptToken, ConnectRequest, MuseSdk, SdkConnectionStatus, SdkListener};
use crate::DeviceHandle;

/// A control call received by [`MockSdk`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkCall {
    StartDiscovery,
    StopDiscovery,
    Connect(ConnectRequest),
    Disconnect(DeviceHandle),
}

/// Scriptable stand-in for the vendor SDK
#[derive(Default)]
pub struct MockSdk {
    listener: Mutex<Option<Weak<dyn SdkListener>>>,
    calls: Mutex<Vec<SdkCall>>,
    reject_next: Mutex<Option<SdkError>>,
}

impl MockSdk {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every control call so far, in order
    pub fn calls(&self) -> Vec<SdkCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Token of the most recent connect request
    pub fn last_connect_token(&self) -> Option<AttemptToken> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SdkCall::Connect(request) => Some(request.token),
            _ => None,
        })
    }

    /// Most recent connect request
    pub fn last_connect(&self) -> Option<ConnectRequest> {
        self.calls.lock().iter().rev().find_map(|call| match call {
            SdkCall::Connect(request) => Some(request.clone()),
            _ => None,
        })
    }

    /// Make the next control call fail synchronously with `error`
    pub fn reject_next(&self, error: SdkError) {
        *self.reject_next.lock() = Some(error);
    }

    pub fn has_listener(&self) -> bool {
        self.listener().is_some()
    }

    pub fn advertise(&self, devices: Vec<DeviceHandle>) {
        if let Some(listener) = self.listener() {
            listener.on_devices_changed(devices);
        }
    }

    pub fn report_status(&self, token: AttemptToken, status: SdkConnectionStatus) {
        if let Some(listener) = self.listener() {
            listener.on_connection_status(token, status);
        }
    }

    pub fn confirm_connected(&self, token: AttemptToken) {
        self.report_status(token, SdkConnectionStatus::Connected);
    }

    pub fn confirm_disconnected(&self, token: AttemptToken) {
        self.report_status(token, SdkConnectionStatus::Disconnected);
    }

    pub fn fail_connection(&self, token: AttemptToken, reason: &str) {
        self.report_status(
            token,
            SdkConnectionStatus::Failed {
                reason: reason.to_string(),
            },
        );
    }

    pub fn stream(&self, packet: DataPacket) {
        if let Some(listener) = self.listener() {
            listener.on_data_packet(packet);
        }
    }

    pub fn artifact(&self, packet: ArtifactPacket) {
        if let Some(listener) = self.listener() {
            listener.on_artifact(packet);
        }
    }

    fn listener(&self) -> Option<Arc<dyn SdkListener>> {
        self.listener.lock().as_ref().and_then(Weak::upgrade)
    }

    fn record(&self, call: SdkCall) -> Result<()> {
        if let Some(error) = self.reject_next.lock().take() {
            return Err(error);
        }
        self.calls.lock().push(call);
        Ok(())
    }
}

impl MuseSdk for MockSdk {
    fn set_listener(&self, listener: Weak<dyn SdkListener>) {
        *self.listener.lock() = Some(listener);
    }

    fn start_discovery(&self) -> Result<()> {
        self.record(SdkCall::StartDiscovery)
    }

    fn stop_discovery(&self) -> Result<()> {
        self.record(SdkCall::StopDiscovery)
    }

    fn connect(&self, request: ConnectRequest) -> Result<()> {
        self.record(SdkCall::Connect(request))
    }

    fn disconnect(&self, device: &DeviceHandle) -> Result<()> {
        self.record(SdkCall::Disconnect(device.clone()))
    }

    fn version(&self) -> String {
        "mock-1.0.0".to_string()
    }
}
