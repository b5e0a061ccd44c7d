use thiserror::Error;

/// Errors that can occur while relaying events
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// `drain` was called from a thread other than the bound host context
    #[error("Events can only be drained on the host execution context")]
    WrongExecutionContext,

    /// The marshaller has been closed and accepts no more envelopes
    #[error("Event queue has been closed")]
    Closed,
}

/// Result type for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
