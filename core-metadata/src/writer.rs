//! Tag Writer
//!
//! Routes a file to the codec for its container and applies a [`TagSet`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::{TagField, TagSet, TagWriter, TagWriterConfig};
//!
//! let writer = TagWriter::new(TagWriterConfig::default())?;
//! let tags = TagSet::new().with(TagField::Title, "Take 3");
//! let tagged = writer.apply_metadata_to_bytes(bytes, "take3.flac", &tags)?;
//! ```

use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::flac::apply_flac_tags;
use crate::format::{guess_format, ContainerFormat};
use crate::id3::{apply_mp3_tags, strip_id3v2};
use crate::riff::apply_wav_tags;
use crate::tags::{TagSet, TagWriterConfig};

/// Applies tags to MP3, WAV and FLAC files held in memory.
#[derive(Debug, Clone, Default)]
pub struct TagWriter {
    config: TagWriterConfig,
}

impl TagWriter {
    /// Create a writer after validating the field maps.
    pub fn new(config: TagWriterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TagWriterConfig {
        &self.config
    }

    /// Apply `tags` to `bytes` of a known container.
    ///
    /// With no tags present the result is a normalized passthrough: MP3 loses
    /// any ID3v2 header, WAV and FLAC come back unchanged.
    pub fn apply_tags(&self, bytes: Bytes, format: ContainerFormat, tags: &TagSet) -> Result<Bytes> {
        if !tags.has_tags() {
            return Ok(match format {
                ContainerFormat::Mp3 => strip_id3v2(&bytes),
                ContainerFormat::Wav | ContainerFormat::Flac => bytes,
            });
        }

        match format {
            ContainerFormat::Mp3 => apply_mp3_tags(&bytes, tags, &self.config),
            ContainerFormat::Wav => apply_wav_tags(&bytes, tags, &self.config),
            ContainerFormat::Flac => apply_flac_tags(&bytes, tags, &self.config),
        }
    }

    /// Guess the container from `name_or_path` and apply `tags`.
    ///
    /// Unrecognized names pass the bytes through unchanged.
    #[instrument(skip(self, bytes, tags), fields(len = bytes.len()))]
    pub fn apply_metadata_to_bytes(&self, bytes: Bytes, name_or_path: &str, tags: &TagSet) -> Result<Bytes> {
        match guess_format(name_or_path) {
            Some(format) => {
                debug!(%format, "Applying tags");
                self.apply_tags(bytes, format, tags)
            }
            None => {
                debug!("Unrecognized container, passing through");
                Ok(bytes)
            }
        }
    }

    /// Read `path`, apply `tags` and write the result back in place.
    ///
    /// Returns `false` without touching the file when its container is not
    /// recognized.
    #[instrument(skip(self, fs, tags), fields(path = %path.display()))]
    pub async fn apply_metadata_to_file(
        &self,
        fs: &dyn FileSystemAccess,
        path: &Path,
        tags: &TagSet,
    ) -> Result<bool> {
        let name = path.to_string_lossy();
        let Some(format) = guess_format(&name) else {
            debug!("Unrecognized container, leaving file alone");
            return Ok(false);
        };

        let original = fs.read_file(path).await?;
        let original_len = original.len();
        let tagged = self.apply_tags(original, format, tags)?;

        info!(%format, original_len, new_len = tagged.len(), "Writing tagged file");
        fs.write_file(path, tagged).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{TagField, TagFieldMap};

    #[test]
    fn test_new_rejects_invalid_map() {
        let mut config = TagWriterConfig::default();
        config.id3 = TagFieldMap::new(vec![], "TOOLONG");
        assert!(TagWriter::new(config).is_err());
    }

    #[test]
    fn test_unknown_format_passthrough() {
        let writer = TagWriter::default();
        let bytes = Bytes::from_static(b"ID3\x03\x00\x00\x00\x00\x00\x00payload");
        let tags = TagSet::new().with(TagField::Title, "A");
        let out = writer.apply_metadata_to_bytes(bytes.clone(), "notes.ogg", &tags).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_no_tags_mp3_strips_only() {
        let writer = TagWriter::default();
        let bytes = Bytes::from_static(b"ID3\x03\x00\x00\x00\x00\x00\x00payload");
        let out = writer.apply_metadata_to_bytes(bytes, "a.mp3", &TagSet::new()).unwrap();
        assert_eq!(out, Bytes::from_static(b"payload"));
    }

    #[test]
    fn test_no_tags_wav_unchanged() {
        let writer = TagWriter::default();
        let bytes = Bytes::from_static(b"RIFF\x04\x00\x00\x00WAVEjunk-after-region");
        let out = writer.apply_metadata_to_bytes(bytes.clone(), "a.wav", &TagSet::new()).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_custom_encoder_name() {
        let writer = TagWriter::new(TagWriterConfig::default().with_encoder_name("Tapedeck")).unwrap();
        let tags = TagSet::new().with(TagField::Title, "A");
        let out = writer
            .apply_tags(Bytes::from_static(b"fLaC\x80\x00\x00\x00"), ContainerFormat::Flac, &tags)
            .unwrap();
        assert!(out.windows(16).any(|w| w == b"ENCODER=Tapedeck"));
    }
}
