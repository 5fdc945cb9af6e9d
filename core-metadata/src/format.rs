//! Container format detection from file names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio containers the tag writer knows how to edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// MPEG audio with a leading ID3v2 tag
    Mp3,
    /// RIFF/WAVE with a `LIST/INFO` chunk
    Wav,
    /// FLAC with a `VORBIS_COMMENT` block
    Flac,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 3] = [ContainerFormat::Mp3, ContainerFormat::Wav, ContainerFormat::Flac];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Mp3 => "mp3",
            ContainerFormat::Wav => "wav",
            ContainerFormat::Flac => "flac",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::Mp3 => "audio/mpeg",
            ContainerFormat::Wav => "audio/wav",
            ContainerFormat::Flac => "audio/flac",
        }
    }

    /// Match a bare extension (`"mp3"`) or any name containing `".mp3"`,
    /// ignoring case.
    pub fn guess(name_or_path: &str) -> Option<Self> {
        let lower = name_or_path.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| lower == format.as_str() || lower.contains(&format!(".{}", format.as_str())))
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shorthand for [`ContainerFormat::guess`].
pub fn guess_format(name_or_path: &str) -> Option<ContainerFormat> {
    ContainerFormat::guess(name_or_path)
}
