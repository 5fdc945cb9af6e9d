use thiserror::Error;

/// Failure reported by a host capability.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host does not offer this capability (e.g. no file system on the web).
    #[error("Host capability not available: {0}")]
    NotAvailable(String),

    /// The host tried and failed; the message comes from the host.
    #[error("Host operation failed: {0}")]
    OperationFailed(String),

    /// The audio engine refused a buffer.
    #[error("Audio engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
