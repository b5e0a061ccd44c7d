//! # Muse Connection
//!
//! Connection lifecycle for a single Muse headband: discovery, connect,
//! teardown, and translation of SDK callbacks into relay envelopes.
//!
//! ```text
//!            start_scan            connect
//! Disconnected ────────▶ Scanning ────────▶ Connecting ──SDK ok──▶ Connected
//!      ▲                                        │                      │
//!      │                                    SDK error              disconnect
//!      │                                        ▼                      ▼
//!      └──────────── disconnect ─────────── Failed      Disconnecting ─┘
//! ```
//!
//! The transition rules live in [`state`] as pure functions; the
//! [`ConnectionManager`] applies them and publishes one ConnectionStatus
//! envelope per state change.

pub mod config;
pub mod error;
pub mod manager;
pub mod state;

pub use config::ConnectionConfig;
pub use error::{ConnectionError, Result};
pub use manager::ConnectionManager;
pub use state::{next_state, on_sdk_status, Operation, Transition};
