use muse_connection::ConnectionError;
use muse_relay::RelayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Muse bridge has not been initialized")]
    NotInitialized,

    #[error("Muse bridge is already initialized")]
    AlreadyInitialized,

    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Failed to start host loop: {0}")]
    HostLoop(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
