//! Descriptive tag values and the per-container field maps.
//!
//! A [`TagSet`] is what the host hands in; a [`TagFieldMap`] says which frame,
//! chunk or comment key each field becomes inside one container. The maps are
//! plain values carried by [`TagWriterConfig`] so alternative layouts can be
//! injected without touching the codecs.

use core_runtime::config::{CoreConfig, DEFAULT_ENCODER_NAME};
use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, Result};

/// One descriptive field of a [`TagSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagField {
    Title,
    Artist,
    Album,
    Track,
    Year,
    Genre,
    Comment,
}

impl TagField {
    pub const ALL: [TagField; 7] = [
        TagField::Title,
        TagField::Artist,
        TagField::Album,
        TagField::Track,
        TagField::Year,
        TagField::Genre,
        TagField::Comment,
    ];
}

/// Tag values supplied by the caller.
///
/// Every field is optional; an empty or whitespace-only value counts as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSet {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track: String,
    pub year: String,
    pub genre: String,
    pub comment: String,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: TagField, value: impl Into<String>) -> Self {
        *self.slot_mut(field) = value.into();
        self
    }

    /// Trimmed value of `field`, `None` when absent.
    pub fn get(&self, field: TagField) -> Option<&str> {
        let value = match field {
            TagField::Title => &self.title,
            TagField::Artist => &self.artist,
            TagField::Album => &self.album,
            TagField::Track => &self.track,
            TagField::Year => &self.year,
            TagField::Genre => &self.genre,
            TagField::Comment => &self.comment,
        }
        .trim();

        (!value.is_empty()).then_some(value)
    }

    /// True if any field is present after trimming.
    pub fn has_tags(&self) -> bool {
        TagField::ALL.iter().any(|field| self.get(*field).is_some())
    }

    fn slot_mut(&mut self, field: TagField) -> &mut String {
        match field {
            TagField::Title => &mut self.title,
            TagField::Artist => &mut self.artist,
            TagField::Album => &mut self.album,
            TagField::Track => &mut self.track,
            TagField::Year => &mut self.year,
            TagField::Genre => &mut self.genre,
            TagField::Comment => &mut self.comment,
        }
    }
}

/// Ordered mapping from tag fields to container keys, plus the key that
/// carries the encoder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFieldMap {
    fields: Vec<(TagField, String)>,
    encoder_key: String,
}

impl TagFieldMap {
    pub fn new(fields: Vec<(TagField, String)>, encoder_key: impl Into<String>) -> Self {
        Self {
            fields,
            encoder_key: encoder_key.into(),
        }
    }

    /// ID3v2.3 frame ids. `COMM` is written as a comment frame.
    pub fn id3v23() -> Self {
        Self::from_static(
            &[
                (TagField::Title, "TIT2"),
                (TagField::Artist, "TPE1"),
                (TagField::Album, "TALB"),
                (TagField::Track, "TRCK"),
                (TagField::Year, "TYER"),
                (TagField::Genre, "TCON"),
                (TagField::Comment, "COMM"),
            ],
            "TENC",
        )
    }

    /// RIFF `LIST/INFO` sub-chunk ids.
    pub fn riff_info() -> Self {
        Self::from_static(
            &[
                (TagField::Title, "INAM"),
                (TagField::Artist, "IART"),
                (TagField::Album, "IPRD"),
                (TagField::Track, "ITRK"),
                (TagField::Year, "ICRD"),
                (TagField::Genre, "IGNR"),
                (TagField::Comment, "ICMT"),
            ],
            "ISFT",
        )
    }

    /// Vorbis comment field names.
    pub fn vorbis_comment() -> Self {
        Self::from_static(
            &[
                (TagField::Title, "TITLE"),
                (TagField::Artist, "ARTIST"),
                (TagField::Album, "ALBUM"),
                (TagField::Track, "TRACKNUMBER"),
                (TagField::Year, "DATE"),
                (TagField::Genre, "GENRE"),
                (TagField::Comment, "DESCRIPTION"),
            ],
            "ENCODER",
        )
    }

    fn from_static(fields: &[(TagField, &str)], encoder_key: &str) -> Self {
        Self::new(
            fields
                .iter()
                .map(|(field, key)| (*field, key.to_string()))
                .collect(),
            encoder_key,
        )
    }

    pub fn key(&self, field: TagField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, key)| key.as_str())
    }

    pub fn encoder_key(&self) -> &str {
        &self.encoder_key
    }

    /// `(key, value)` pairs for the present fields of `tags`, in map order.
    pub fn entries<'a>(&'a self, tags: &'a TagSet) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.fields
            .iter()
            .filter_map(move |(field, key)| tags.get(*field).map(|value| (key.as_str(), value)))
    }

    fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|(_, key)| key.as_str())
            .chain(std::iter::once(self.encoder_key.as_str()))
    }

    /// Require every key to be a four-character ASCII code.
    fn validate_fourcc(&self, container: &str) -> Result<()> {
        match self
            .keys()
            .find(|key| key.len() != 4 || !key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b' '))
        {
            Some(key) => Err(MetadataError::InvalidConfig(format!(
                "{} key '{}' is not a four-character code",
                container, key
            ))),
            None => Ok(()),
        }
    }

    /// Vorbis keys are printable ASCII without '='.
    fn validate_vorbis(&self) -> Result<()> {
        match self
            .keys()
            .find(|key| key.is_empty() || !key.bytes().all(|b| (0x20..=0x7D).contains(&b) && b != b'='))
        {
            Some(key) => Err(MetadataError::InvalidConfig(format!(
                "vorbis comment key '{}' is invalid",
                key
            ))),
            None => Ok(()),
        }
    }
}

/// Everything the tag codecs need besides the bytes and the tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagWriterConfig {
    /// Written as ID3 `TENC`, RIFF `ISFT`, Vorbis vendor and `ENCODER`.
    pub encoder_name: String,
    pub id3: TagFieldMap,
    pub riff: TagFieldMap,
    pub vorbis: TagFieldMap,
}

impl Default for TagWriterConfig {
    fn default() -> Self {
        Self {
            encoder_name: DEFAULT_ENCODER_NAME.to_string(),
            id3: TagFieldMap::id3v23(),
            riff: TagFieldMap::riff_info(),
            vorbis: TagFieldMap::vorbis_comment(),
        }
    }
}

impl From<&CoreConfig> for TagWriterConfig {
    fn from(config: &CoreConfig) -> Self {
        Self {
            encoder_name: config.encoder_name().to_string(),
            ..Self::default()
        }
    }
}

impl TagWriterConfig {
    pub fn with_encoder_name(mut self, name: impl Into<String>) -> Self {
        self.encoder_name = name.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.encoder_name.trim().is_empty() {
            return Err(MetadataError::InvalidConfig(
                "encoder name cannot be empty".to_string(),
            ));
        }
        self.id3.validate_fourcc("ID3")?;
        self.riff.validate_fourcc("RIFF")?;
        self.vorbis.validate_vorbis()
    }
}
