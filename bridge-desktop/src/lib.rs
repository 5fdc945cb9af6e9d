//! # Desktop Bridge
//!
//! Bridge implementations for the desktop shell (macOS, Windows, Linux).
//!
//! ```ignore
//! use bridge_desktop::TokioFileSystem;
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .file_system(Arc::new(TokioFileSystem::new()))
//!     .build()?;
//! ```

mod filesystem;

pub use filesystem::TokioFileSystem;
