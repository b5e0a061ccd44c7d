//! Error types for the vendor SDK boundary.

use thiserror::Error;

/// Error returned synchronously by a [`crate::MuseSdk`] call.
///
/// Asynchronous failures never use this type; they arrive through
/// [`crate::SdkListener::on_connection_status`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// The radio stack or SDK runtime is not available (adapter off, permission denied)
    #[error("SDK unavailable: {0}")]
    Unavailable(String),

    /// The SDK refused the request outright
    #[error("SDK rejected request: {0}")]
    Rejected(String),
}

/// Convenience Result type alias for SDK calls.
pub type Result<T> = std::result::Result<T, SdkError>;
