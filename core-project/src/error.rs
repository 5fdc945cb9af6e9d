//! # Project Error Types
//!
//! Errors raised while decoding or loading a project file. Every variant is
//! terminal for the decode in flight.

use thiserror::Error;

/// Errors that can occur while decoding a project.
#[derive(Error, Debug)]
pub enum ProjectError {
    // ========================================================================
    // Format Errors
    // ========================================================================
    /// Header region missing, oversized or not shaped like a project.
    #[error("Malformed project header: {0}")]
    MalformedHeader(String),

    /// Sample rate absent, non-numeric, non-finite or not positive.
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(String),

    /// A sample token did not parse to a finite number.
    #[error("Invalid sample at channel {channel}, index {index}: {token:?}")]
    InvalidSample {
        channel: usize,
        index: usize,
        token: String,
    },

    /// Channels do not all share the first channel's length.
    #[error("Mismatched channel lengths: channel {channel} has {actual} samples, expected {expected}")]
    MismatchedChannelLengths {
        expected: usize,
        channel: usize,
        actual: usize,
    },

    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The source ended before the channel array closed.
    #[error("Unexpected end of project file")]
    UnexpectedEof,

    /// Reading the underlying source failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The second pass of a streaming load saw a different shape than the
    /// first, i.e. the file changed between the two reads.
    #[error("Project changed while loading: {0}")]
    SourceChanged(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Host bridge failure (file system, audio engine).
    #[error("Bridge error: {0}")]
    Bridge(#[from] bridge_traits::error::BridgeError),

    /// Missing capability or invalid configuration.
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl ProjectError {
    /// Returns `true` if the project content itself is at fault.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ProjectError::MalformedHeader(_)
                | ProjectError::InvalidSampleRate(_)
                | ProjectError::InvalidSample { .. }
                | ProjectError::MismatchedChannelLengths { .. }
        )
    }

    /// Returns `true` if reading the source failed.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            ProjectError::UnexpectedEof
                | ProjectError::Transport(_)
                | ProjectError::SourceChanged(_)
                | ProjectError::Bridge(_)
        )
    }
}

impl From<std::io::Error> for ProjectError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => ProjectError::UnexpectedEof,
            _ => ProjectError::Transport(err.to_string()),
        }
    }
}

/// Result type for project operations.
pub type Result<T> = std::result::Result<T, ProjectError>;
