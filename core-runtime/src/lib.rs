//! # Core Runtime
//!
//! Shared setup for the format crates:
//! - [`config`]: validated decoder limits and encoder identity, built once
//!   and passed to every loader and tag writer
//! - [`logging`]: the `tracing` subscriber and host log forwarding

pub mod config;
pub mod error;
pub mod logging;

pub use config::{CoreConfig, CoreConfigBuilder, FormatSettings};
pub use error::{Error, Result};
pub use logging::{init_logging, strip_path, LogFormat, LogSettings};
