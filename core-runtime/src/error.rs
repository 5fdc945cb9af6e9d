use thiserror::Error;

/// Runtime setup failures. None of these occur once a load is under way.
#[derive(Error, Debug)]
pub enum Error {
    /// A setting is out of range or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A component needs a host capability that was not injected.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Persisted settings are not valid JSON.
    #[error("Settings could not be parsed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
