//! Simulated headband session
//!
//! Runs the bridge against the mock SDK with a bridge-owned host loop and
//! prints what a host runtime would receive.
//!
//! ```text
//! MUSE_BRIDGE_LOG_MODE=development cargo run -p muse-bridge --example simulated_session --features test-support
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use muse_bridge::logging;
use muse_bridge::mock::MockSdk;
use muse_bridge::{
    ArtifactPacket, BridgeConfig, ConnectionState, DataPacket, DeviceHandle, HostTarget, MuseBridge,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging_from_env()?;

    let sdk = MockSdk::new();
    let sink = Arc::new(|object: &str, method: &str, payload: &str| {
        println!("{object}.{method} <- {payload}");
    });
    let bridge = MuseBridge::new(sdk.clone(), sink, BridgeConfig::standalone())?;
    println!("SDK version: {}", bridge.sdk_version());

    bridge.register_muse_listener(HostTarget::new("Menu", "ReceiveMuseList"));
    bridge.register_connection_listener(HostTarget::new("Menu", "ReceiveConnection"));
    bridge.register_data_listener_for(HostTarget::new("Plot", "ReceiveEeg"), ["EEG"]);
    bridge.register_artifact_listener(HostTarget::new("Plot", "ReceiveArtifacts"));
    bridge.listen_for_data_packet("EEG")?;
    bridge.listen_for_data_packet("ARTIFACTS")?;

    bridge.start_scan()?;
    sdk.advertise(vec![
        DeviceHandle::new("00:55:DA:B0:1A:2B", "Muse-1A2B"),
        DeviceHandle::new("00:55:DA:B0:3C:4D", "Muse-3C4D"),
    ]);
    thread::sleep(Duration::from_millis(50));

    bridge.connect("Muse-1A2B")?;
    let token = sdk
        .last_connect_token()
        .ok_or("connect request never reached the SDK")?;

    // The vendor SDK reports from its own thread
    let radio = {
        let sdk = Arc::clone(&sdk);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            sdk.confirm_connected(token);
            for tick in 0..5i64 {
                let phase = tick as f64 * 0.3;
                let channels = (0..4).map(|c| 800.0 + 20.0 * (phase + c as f64).sin()).collect();
                sdk.stream(DataPacket::new("EEG", channels, tick * 3_906));
                sdk.stream(DataPacket::new("ACCELEROMETER", vec![0.0, 0.02, 0.98], tick * 3_906));
                sdk.artifact(ArtifactPacket {
                    headband_on: true,
                    blink: tick == 2,
                    jaw_clench: false,
                });
                thread::sleep(Duration::from_millis(20));
            }
        })
    };
    radio.join().map_err(|_| "simulated radio thread panicked")?;

    bridge.disconnect()?;
    sdk.confirm_disconnected(token);
    thread::sleep(Duration::from_millis(50));

    assert_eq!(bridge.state(), ConnectionState::Disconnected);
    bridge.shutdown();
    Ok(())
}
