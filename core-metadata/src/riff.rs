//! RIFF/WAVE `LIST/INFO` tag writer.
//!
//! Top-level sub-chunks are walked only to find their boundaries. Every chunk
//! other than an existing `LIST/INFO` is copied through byte-for-byte in its
//! original order.

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::Result;
use crate::primitives::{ascii_bytes, checked_len, read_u32_le, utf8_bytes, write_u32_le};
use crate::tags::{TagSet, TagWriterConfig};

const RIFF_MAGIC: &[u8; 4] = b"RIFF";
const WAVE_MAGIC: &[u8; 4] = b"WAVE";
const LIST_ID: &[u8; 4] = b"LIST";
const INFO_ID: &[u8; 4] = b"INFO";
const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

/// Result of walking the top-level chunks of a RIFF/WAVE file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiffLayout {
    /// Whole chunks (header, payload and pad byte) other than `LIST/INFO`.
    pub kept: Vec<Bytes>,
    /// Unwalked tail of the RIFF region, e.g. a chunk that overruns the file.
    pub remainder: Bytes,
    /// Whether a `LIST/INFO` chunk was dropped.
    pub dropped_info: bool,
}

fn is_riff_wave(bytes: &[u8]) -> bool {
    bytes.len() >= RIFF_HEADER_LEN && &bytes[..4] == RIFF_MAGIC && &bytes[8..12] == WAVE_MAGIC
}

fn is_info_list(chunk: &[u8]) -> bool {
    chunk.len() >= CHUNK_HEADER_LEN + 4
        && &chunk[..4] == LIST_ID
        && &chunk[CHUNK_HEADER_LEN..CHUNK_HEADER_LEN + 4] == INFO_ID
}

/// Split a RIFF/WAVE file into its sub-chunks, or `None` if it is not one.
pub fn walk_chunks(bytes: &Bytes) -> Option<RiffLayout> {
    if !is_riff_wave(bytes) {
        return None;
    }

    let declared = read_u32_le(bytes, 4)? as usize;
    let end = bytes.len().min(declared.saturating_add(CHUNK_HEADER_LEN));

    let mut kept = Vec::new();
    let mut dropped_info = false;
    let mut offset = RIFF_HEADER_LEN;

    while offset + CHUNK_HEADER_LEN <= end {
        let Some(size) = read_u32_le(bytes, offset + 4) else {
            break;
        };
        let size = size as usize;
        let total = CHUNK_HEADER_LEN + size + (size % 2);
        if offset + total > bytes.len() {
            warn!(offset, size, "RIFF chunk overruns file, keeping the rest untouched");
            break;
        }

        let chunk = bytes.slice(offset..offset + total);
        if is_info_list(&chunk) {
            dropped_info = true;
        } else {
            kept.push(chunk);
        }
        offset += total;
    }

    let remainder = if offset < end {
        bytes.slice(offset..end)
    } else {
        Bytes::new()
    };

    Some(RiffLayout {
        kept,
        remainder,
        dropped_info,
    })
}

/// Build a padded `LIST` chunk holding `INFO` sub-chunks for `tags`.
///
/// The encoder entry is always written, so a chunk is returned whenever the
/// map has an encoder key.
pub fn build_info_chunk(tags: &TagSet, config: &TagWriterConfig) -> Result<Option<Vec<u8>>> {
    let mut body = INFO_ID.to_vec();

    let entries = config
        .riff
        .entries(tags)
        .chain(std::iter::once((config.riff.encoder_key(), config.encoder_name.as_str())));

    for (key, value) in entries {
        if value.is_empty() {
            continue;
        }
        let text = utf8_bytes(value);
        // NUL terminator counts toward the declared size, the pad byte does not
        let declared = text.len() + 1;
        let padded = declared + (declared % 2);

        body.extend_from_slice(&ascii_bytes(key));
        body.extend_from_slice(&write_u32_le(checked_len("INFO entry", declared, u32::MAX)?));
        body.extend_from_slice(&text);
        body.resize(body.len() + (padded - text.len()), 0);
    }

    if body.len() == INFO_ID.len() {
        return Ok(None);
    }

    let mut chunk = Vec::with_capacity(CHUNK_HEADER_LEN + body.len() + 1);
    chunk.extend_from_slice(LIST_ID);
    chunk.extend_from_slice(&write_u32_le(checked_len("LIST chunk", body.len(), u32::MAX)?));
    chunk.extend_from_slice(&body);
    if body.len() % 2 == 1 {
        chunk.push(0);
    }
    Ok(Some(chunk))
}

/// Replace the `LIST/INFO` chunk of a WAV file with one built from `tags`.
///
/// Input that is not a RIFF/WAVE file is returned unchanged.
pub fn apply_wav_tags(bytes: &Bytes, tags: &TagSet, config: &TagWriterConfig) -> Result<Bytes> {
    let Some(layout) = walk_chunks(bytes) else {
        debug!("Not a RIFF/WAVE file, passing through");
        return Ok(bytes.clone());
    };

    let info = if tags.has_tags() {
        build_info_chunk(tags, config)?
    } else {
        None
    };

    let body_len = WAVE_MAGIC.len()
        + layout.kept.iter().map(Bytes::len).sum::<usize>()
        + info.as_ref().map_or(0, Vec::len)
        + layout.remainder.len();
    let riff_size = checked_len("RIFF body", body_len, u32::MAX)?;

    let mut out = BytesMut::with_capacity(CHUNK_HEADER_LEN + body_len);
    out.extend_from_slice(RIFF_MAGIC);
    out.extend_from_slice(&write_u32_le(riff_size));
    out.extend_from_slice(WAVE_MAGIC);
    for chunk in &layout.kept {
        out.extend_from_slice(chunk);
    }
    if let Some(info) = &info {
        out.extend_from_slice(info);
    }
    out.extend_from_slice(&layout.remainder);

    debug!(
        kept_chunks = layout.kept.len(),
        replaced_info = layout.dropped_info,
        wrote_info = info.is_some(),
        "Rebuilt RIFF/WAVE container"
    );
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagField;

    fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn wav(chunks: &[Vec<u8>]) -> Bytes {
        let body: Vec<u8> = b"WAVE".iter().copied().chain(chunks.concat()).collect();
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        Bytes::from(out)
    }

    fn fmt_chunk() -> Vec<u8> {
        chunk(b"fmt ", &[1, 0, 1, 0, 0x44, 0xAC, 0, 0, 0x88, 0x58, 1, 0, 2, 0, 16, 0])
    }

    #[test]
    fn test_not_riff_passthrough() {
        let bytes = Bytes::from_static(b"RIFX\x00\x00\x00\x00WAVEdata");
        let out = apply_wav_tags(&bytes, &TagSet::new().with(TagField::Title, "A"), &TagWriterConfig::default()).unwrap();
        assert_eq!(out, bytes);

        let short = Bytes::from_static(b"RIFF");
        assert!(walk_chunks(&short).is_none());
    }

    #[test]
    fn test_info_chunk_layout() {
        let tags = TagSet::new().with(TagField::Title, "Ab");
        let info = build_info_chunk(&tags, &TagWriterConfig::default()).unwrap().unwrap();

        let mut expected = b"INFO".to_vec();
        // "Ab\0" declared 3, padded to 4
        expected.extend_from_slice(b"INAM\x03\x00\x00\x00Ab\x00\x00");
        // "RECwerk\0" declared 8
        expected.extend_from_slice(b"ISFT\x08\x00\x00\x00RECwerk\x00");
        assert_eq!(info, chunk(b"LIST", &expected));
    }

    #[test]
    fn test_walk_drops_only_info_list() {
        let adtl = chunk(b"LIST", b"adtlxxxx");
        let old_info = chunk(b"LIST", b"INFOINAM\x02\x00\x00\x00X\x00");
        let data = chunk(b"data", &[1, 2, 3]);
        let bytes = wav(&[fmt_chunk(), adtl.clone(), old_info, data.clone()]);

        let layout = walk_chunks(&bytes).unwrap();
        assert!(layout.dropped_info);
        assert_eq!(layout.kept, vec![Bytes::from(fmt_chunk()), Bytes::from(adtl), Bytes::from(data)]);
        assert!(layout.remainder.is_empty());
    }

    #[test]
    fn test_overrunning_chunk_is_kept_after_info() {
        // data chunk claims 1000 bytes but the file is truncated
        let mut truncated = b"data".to_vec();
        truncated.extend_from_slice(&1000u32.to_le_bytes());
        truncated.extend_from_slice(&[9, 9, 9, 9]);

        let mut raw = b"RIFF".to_vec();
        raw.extend_from_slice(&2000u32.to_le_bytes());
        raw.extend_from_slice(b"WAVE");
        raw.extend_from_slice(&fmt_chunk());
        raw.extend_from_slice(&truncated);
        let bytes = Bytes::from(raw);

        let tags = TagSet::new().with(TagField::Artist, "B");
        let out = apply_wav_tags(&bytes, &tags, &TagWriterConfig::default()).unwrap();

        assert!(out.ends_with(&truncated));
        let info_at = 12 + fmt_chunk().len();
        assert_eq!(&out[info_at..info_at + 4], b"LIST");
        assert_eq!(read_u32_le(&out, 4).unwrap() as usize, out.len() - 8);
    }

    #[test]
    fn test_riff_size_recomputed() {
        let bytes = wav(&[fmt_chunk(), chunk(b"data", &[0; 10])]);
        let tags = TagSet::new().with(TagField::Year, "2024");
        let out = apply_wav_tags(&bytes, &tags, &TagWriterConfig::default()).unwrap();
        assert_eq!(read_u32_le(&out, 4).unwrap() as usize, out.len() - 8);
        assert_eq!(out.len() % 2, 0);
    }
}
