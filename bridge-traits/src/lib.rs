//! # Host Bridge Traits
//!
//! Capabilities the format subsystem borrows from the editor shell.
//!
//! | Trait | Used for |
//! |-------|----------|
//! | [`FileSystemAccess`](storage::FileSystemAccess) | chunked project reads, whole-file tag rewrites |
//! | [`AudioEngine`](engine::AudioEngine) | allocating and committing decoded sample buffers |
//! | [`Clock`](time::Clock) | the `timestamp` written into saved projects |
//! | [`LoggerSink`](log::LoggerSink) | mirroring core log events into the host log |
//!
//! Every trait is `Send + Sync` and reports failures as [`BridgeError`].
//! Hosts translate their platform errors into it before they cross the
//! boundary.
//!
//! ## Implementing AudioEngine
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::engine::{AudioBuffer, AudioEngine};
//! use bridge_traits::error::Result;
//!
//! struct WaveformView;
//!
//! #[async_trait]
//! impl AudioEngine for WaveformView {
//!     async fn load_decoded_buffer(&self, name: &str, buffer: AudioBuffer) -> Result<()> {
//!         println!("{name}: {} frames", buffer.frames());
//!         Ok(())
//!     }
//! }
//! ```

pub mod engine;
pub mod error;
pub mod log;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use engine::{AudioBuffer, AudioEngine};
pub use log::{LogEntry, LogLevel, LoggerSink};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, FixedClock, SystemClock};
