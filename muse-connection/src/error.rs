//! Error types for connection lifecycle operations

use muse_types::{ConnectionState, SdkError};
use thiserror::Error;

use crate::state::Operation;

/// Errors returned by [`crate::ConnectionManager`] control calls
///
/// A failed connection attempt is not one of these. It is reported as a
/// ConnectionStatus event with state `Failed` and an error reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The operation is not allowed from the current state; state is unchanged
    #[error("Cannot {operation} while {from}")]
    InvalidStateTransition {
        from: ConnectionState,
        operation: Operation,
    },

    /// No device with this name has been discovered
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Invalid packet type: {0:?}")]
    InvalidPacketType(String),

    /// The SDK refused a call synchronously
    #[error("SDK error: {0}")]
    Sdk(#[from] SdkError),
}

/// Result type for connection operations
pub type Result<T> = std::result::Result<T, ConnectionError>;
