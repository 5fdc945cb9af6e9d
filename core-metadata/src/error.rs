use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    /// A length field cannot represent the data it describes.
    #[error("{field} too large: {size} bytes exceeds {max}")]
    FieldOverflow {
        field: &'static str,
        size: usize,
        max: u64,
    },

    #[error("Invalid tag configuration: {0}")]
    InvalidConfig(String),

    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
