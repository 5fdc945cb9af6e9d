//! # Core Configuration Module
//!
//! Provides configuration management for the format subsystem.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding the limits the project decoders enforce and the identity
//! the tag codecs stamp into files. `build()` validates every value so that a
//! bad configuration fails at startup rather than in the middle of a load.
//!
//! ## Optional Dependencies
//!
//! - `FileSystemAccess` - Chunked and whole-file I/O (desktop default: tokio fs)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .read_chunk_bytes(256 * 1024)
//!     .encoder_name("RECwerk")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Persistence
//!
//! The tunable part of the configuration is `serde` (de)serializable as
//! [`FormatSettings`] so hosts can keep it next to their own preferences:
//!
//! ```ignore
//! let settings = FormatSettings::from_json(r#"{"header_limit_bytes": 65536}"#)?;
//! let config = CoreConfig::builder().settings(settings).build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::FileSystemAccess;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Host stream high-water mark for project reads.
pub const DEFAULT_READ_CHUNK_BYTES: usize = 1024 * 1024;

/// Header bytes scanned for the channel-array key before giving up.
pub const DEFAULT_HEADER_LIMIT_BYTES: usize = 1024 * 1024;

/// Longest numeric literal accepted inside the sample arrays.
pub const DEFAULT_MAX_NUMBER_TOKEN_BYTES: usize = 64;

pub const DEFAULT_PROJECT_EXTENSION: &str = "recwerk";
pub const DEFAULT_PROJECT_NAME: &str = "project.recwerk";
pub const DEFAULT_ENCODER_NAME: &str = "RECwerk";

/// Tunable settings of the format subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSettings {
    /// Size of each read issued against a project stream.
    ///
    /// Default: 1 MiB.
    #[serde(default = "default_read_chunk_bytes")]
    pub read_chunk_bytes: usize,

    /// Maximum header region scanned before a project is rejected.
    ///
    /// Default: 1 MiB.
    #[serde(default = "default_header_limit_bytes")]
    pub header_limit_bytes: usize,

    /// Maximum length of a single numeric literal.
    ///
    /// Default: 64 bytes.
    #[serde(default = "default_max_number_token_bytes")]
    pub max_number_token_bytes: usize,

    /// Project file extension, without the dot.
    #[serde(default = "default_project_extension")]
    pub project_extension: String,

    /// Display name used when neither caller nor file provides one.
    #[serde(default = "default_project_name")]
    pub default_project_name: String,

    /// Encoder/software name written into every tag block.
    #[serde(default = "default_encoder_name")]
    pub encoder_name: String,
}

fn default_read_chunk_bytes() -> usize {
    DEFAULT_READ_CHUNK_BYTES
}

fn default_header_limit_bytes() -> usize {
    DEFAULT_HEADER_LIMIT_BYTES
}

fn default_max_number_token_bytes() -> usize {
    DEFAULT_MAX_NUMBER_TOKEN_BYTES
}

fn default_project_extension() -> String {
    DEFAULT_PROJECT_EXTENSION.to_string()
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn default_encoder_name() -> String {
    DEFAULT_ENCODER_NAME.to_string()
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            read_chunk_bytes: default_read_chunk_bytes(),
            header_limit_bytes: default_header_limit_bytes(),
            max_number_token_bytes: default_max_number_token_bytes(),
            project_extension: default_project_extension(),
            default_project_name: default_project_name(),
            encoder_name: default_encoder_name(),
        }
    }
}

impl FormatSettings {
    /// Parse settings from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.read_chunk_bytes == 0 {
            return Err(Error::Config("read_chunk_bytes must be > 0".to_string()));
        }

        if self.header_limit_bytes == 0 {
            return Err(Error::Config("header_limit_bytes must be > 0".to_string()));
        }

        if self.max_number_token_bytes == 0 {
            return Err(Error::Config(
                "max_number_token_bytes must be > 0".to_string(),
            ));
        }

        let extension = self.project_extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "invalid project extension '{}'",
                self.project_extension
            )));
        }

        if self.default_project_name.trim().is_empty() {
            return Err(Error::Config(
                "default_project_name cannot be empty".to_string(),
            ));
        }

        if self.encoder_name.trim().is_empty() {
            return Err(Error::Config("encoder_name cannot be empty".to_string()));
        }

        Ok(())
    }
}

/// Core configuration for the format subsystem.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Validated tunables
    pub settings: FormatSettings,

    /// File system access abstraction (optional with desktop default)
    pub file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("settings", &self.settings)
            .field(
                "file_system",
                &self
                    .file_system
                    .as_ref()
                    .map(|_| "FileSystemAccess { ... }"),
            )
            .finish()
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            settings: FormatSettings::default(),
            file_system: None,
        }
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn read_chunk_bytes(&self) -> usize {
        self.settings.read_chunk_bytes
    }

    pub fn header_limit_bytes(&self) -> usize {
        self.settings.header_limit_bytes
    }

    pub fn max_number_token_bytes(&self) -> usize {
        self.settings.max_number_token_bytes
    }

    /// Project extension without a leading dot.
    pub fn project_extension(&self) -> &str {
        self.settings.project_extension.trim_start_matches('.')
    }

    pub fn default_project_name(&self) -> &str {
        &self.settings.default_project_name
    }

    pub fn encoder_name(&self) -> &str {
        &self.settings.encoder_name
    }

    /// The configured file system, or a `CapabilityMissing` error.
    pub fn require_file_system(&self) -> Result<Arc<dyn FileSystemAccess>> {
        self.file_system
            .clone()
            .ok_or_else(|| Error::CapabilityMissing {
                capability: "FileSystemAccess".to_string(),
                message: "No file system implementation provided. \
                          Desktop: inject bridge_desktop::TokioFileSystem."
                    .to_string(),
            })
    }
}

/// Builder for constructing `CoreConfig` instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    settings: Option<FormatSettings>,
    read_chunk_bytes: Option<usize>,
    header_limit_bytes: Option<usize>,
    max_number_token_bytes: Option<usize>,
    project_extension: Option<String>,
    default_project_name: Option<String>,
    encoder_name: Option<String>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
}

impl CoreConfigBuilder {
    /// Start from previously persisted settings; individual setters still win.
    pub fn settings(mut self, settings: FormatSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn read_chunk_bytes(mut self, bytes: usize) -> Self {
        self.read_chunk_bytes = Some(bytes);
        self
    }

    pub fn header_limit_bytes(mut self, bytes: usize) -> Self {
        self.header_limit_bytes = Some(bytes);
        self
    }

    pub fn max_number_token_bytes(mut self, bytes: usize) -> Self {
        self.max_number_token_bytes = Some(bytes);
        self
    }

    pub fn project_extension(mut self, extension: impl Into<String>) -> Self {
        self.project_extension = Some(extension.into());
        self
    }

    pub fn default_project_name(mut self, name: impl Into<String>) -> Self {
        self.default_project_name = Some(name.into());
        self
    }

    pub fn encoder_name(mut self, name: impl Into<String>) -> Self {
        self.encoder_name = Some(name.into());
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Builds the `CoreConfig`, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for zero limits or empty names.
    pub fn build(self) -> Result<CoreConfig> {
        let mut settings = self.settings.unwrap_or_default();

        if let Some(bytes) = self.read_chunk_bytes {
            settings.read_chunk_bytes = bytes;
        }
        if let Some(bytes) = self.header_limit_bytes {
            settings.header_limit_bytes = bytes;
        }
        if let Some(bytes) = self.max_number_token_bytes {
            settings.max_number_token_bytes = bytes;
        }
        if let Some(extension) = self.project_extension {
            settings.project_extension = extension;
        }
        if let Some(name) = self.default_project_name {
            settings.default_project_name = name;
        }
        if let Some(name) = self.encoder_name {
            settings.encoder_name = name;
        }

        settings.validate()?;

        Ok(CoreConfig {
            settings,
            file_system: self.file_system,
        })
    }
}
