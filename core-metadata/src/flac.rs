//! FLAC `VORBIS_COMMENT` block writer.

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::Result;
use crate::primitives::{checked_len, concat, read_u24_be, utf8_bytes, write_u24_be, write_u32_le, U24_MAX};
use crate::tags::{TagSet, TagWriterConfig};

const FLAC_MAGIC: &[u8; 4] = b"fLaC";
const BLOCK_HEADER_LEN: usize = 4;
const LAST_BLOCK_FLAG: u8 = 0x80;

pub const BLOCK_TYPE_STREAMINFO: u8 = 0;
pub const BLOCK_TYPE_VORBIS_COMMENT: u8 = 4;

/// One metadata block without its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataBlock {
    pub block_type: u8,
    pub payload: Bytes,
}

/// Metadata blocks of a FLAC stream and the audio frames that follow them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlacLayout {
    pub blocks: Vec<MetadataBlock>,
    pub audio: Bytes,
}

/// Walk the metadata blocks up to the one flagged last.
///
/// Returns `None` for input without the `fLaC` magic or whose block list
/// runs past the end of the buffer.
pub fn walk_blocks(bytes: &Bytes) -> Option<FlacLayout> {
    if bytes.len() < FLAC_MAGIC.len() || &bytes[..4] != FLAC_MAGIC {
        return None;
    }

    let mut blocks = Vec::new();
    let mut offset = FLAC_MAGIC.len();

    while offset < bytes.len() {
        let header = bytes[offset];
        let len = read_u24_be(bytes, offset + 1)? as usize;
        let start = offset + BLOCK_HEADER_LEN;
        if start + len > bytes.len() {
            warn!(offset, len, "FLAC metadata block overruns file");
            return None;
        }

        blocks.push(MetadataBlock {
            block_type: header & !LAST_BLOCK_FLAG,
            payload: bytes.slice(start..start + len),
        });
        offset = start + len;

        if header & LAST_BLOCK_FLAG != 0 {
            break;
        }
    }

    Some(FlacLayout {
        blocks,
        audio: bytes.slice(offset..),
    })
}

/// Serialize a `VORBIS_COMMENT` payload: vendor string, then one
/// `KEY=value` entry per present tag and a trailing encoder entry.
pub fn build_vorbis_comment(tags: &TagSet, config: &TagWriterConfig) -> Result<Vec<u8>> {
    let vendor = utf8_bytes(&config.encoder_name);

    let comments: Vec<Vec<u8>> = config
        .vorbis
        .entries(tags)
        .chain(std::iter::once((config.vorbis.encoder_key(), config.encoder_name.as_str())))
        .map(|(key, value)| utf8_bytes(&format!("{}={}", key, value)))
        .collect();

    let mut parts: Vec<Vec<u8>> = vec![
        write_u32_le(checked_len("vendor string", vendor.len(), u32::MAX)?).to_vec(),
        vendor,
        write_u32_le(checked_len("comment count", comments.len(), u32::MAX)?).to_vec(),
    ];
    for comment in comments {
        parts.push(write_u32_le(checked_len("comment", comment.len(), u32::MAX)?).to_vec());
        parts.push(comment);
    }

    let payload = concat(&parts);
    checked_len("VORBIS_COMMENT block", payload.len(), U24_MAX)?;
    Ok(payload)
}

/// Replace the Vorbis comment block of a FLAC file with one built from
/// `tags`.
///
/// Input without the FLAC magic, or with a truncated block list, is returned
/// unchanged.
pub fn apply_flac_tags(bytes: &Bytes, tags: &TagSet, config: &TagWriterConfig) -> Result<Bytes> {
    let Some(layout) = walk_blocks(bytes) else {
        debug!("Not a walkable FLAC stream, passing through");
        return Ok(bytes.clone());
    };

    let mut blocks: Vec<MetadataBlock> = layout
        .blocks
        .into_iter()
        .filter(|block| block.block_type != BLOCK_TYPE_VORBIS_COMMENT)
        .collect();

    if tags.has_tags() {
        let comment = MetadataBlock {
            block_type: BLOCK_TYPE_VORBIS_COMMENT,
            payload: Bytes::from(build_vorbis_comment(tags, config)?),
        };
        let index = if blocks.is_empty() { 0 } else { 1 };
        blocks.insert(index, comment);
    }

    let metadata_len: usize = blocks
        .iter()
        .map(|block| BLOCK_HEADER_LEN + block.payload.len())
        .sum();
    let mut out = BytesMut::with_capacity(FLAC_MAGIC.len() + metadata_len + layout.audio.len());
    out.extend_from_slice(FLAC_MAGIC);

    let last = blocks.len().saturating_sub(1);
    for (i, block) in blocks.iter().enumerate() {
        let len = checked_len("FLAC metadata block", block.payload.len(), U24_MAX)?;
        let flag = if i == last { LAST_BLOCK_FLAG } else { 0 };
        out.extend_from_slice(&[block.block_type | flag]);
        out.extend_from_slice(&write_u24_be(len));
        out.extend_from_slice(&block.payload);
    }
    out.extend_from_slice(&layout.audio);

    debug!(blocks = blocks.len(), "Rebuilt FLAC metadata blocks");
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::read_u32_le;
    use crate::tags::TagField;

    fn block(header: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![header];
        out.extend_from_slice(&write_u24_be(payload.len() as u32));
        out.extend_from_slice(payload);
        out
    }

    fn flac(blocks: &[Vec<u8>], audio: &[u8]) -> Bytes {
        let mut out = b"fLaC".to_vec();
        for b in blocks {
            out.extend_from_slice(b);
        }
        out.extend_from_slice(audio);
        Bytes::from(out)
    }

    const AUDIO: &[u8] = &[0xFF, 0xF8, 0x69, 0x18, 0x00, 0x00];

    #[test]
    fn test_walk_stops_at_last_block() {
        let bytes = flac(&[block(0, &[0; 34]), block(0x80 | 1, &[0; 8])], AUDIO);
        let layout = walk_blocks(&bytes).unwrap();
        assert_eq!(layout.blocks.len(), 2);
        assert_eq!(layout.blocks[1].block_type, 1);
        assert_eq!(layout.audio, Bytes::from_static(AUDIO));
    }

    #[test]
    fn test_overrunning_block_passthrough() {
        let mut raw = b"fLaC".to_vec();
        raw.extend_from_slice(&[0x80, 0x00, 0x10, 0x00, 1, 2, 3]);
        let bytes = Bytes::from(raw);
        let out = apply_flac_tags(&bytes, &TagSet::new().with(TagField::Title, "A"), &TagWriterConfig::default()).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_comment_payload_layout() {
        let tags = TagSet::new().with(TagField::Title, "A");
        let payload = build_vorbis_comment(&tags, &TagWriterConfig::default()).unwrap();

        assert_eq!(read_u32_le(&payload, 0), Some(7));
        assert_eq!(&payload[4..11], b"RECwerk");
        assert_eq!(read_u32_le(&payload, 11), Some(2));
        assert_eq!(read_u32_le(&payload, 15), Some(7));
        assert_eq!(&payload[19..26], b"TITLE=A");
        assert_eq!(read_u32_le(&payload, 26), Some(15));
        assert_eq!(&payload[30..], b"ENCODER=RECwerk");
    }

    #[test]
    fn test_comment_inserted_after_streaminfo() {
        let old_comment = block(4, b"stale");
        let bytes = flac(
            &[block(0, &[0; 34]), old_comment, block(0x80 | 3, &[0; 18])],
            AUDIO,
        );
        let out = apply_flac_tags(&bytes, &TagSet::new().with(TagField::Genre, "Ska"), &TagWriterConfig::default()).unwrap();

        let layout = walk_blocks(&out).unwrap();
        let types: Vec<u8> = layout.blocks.iter().map(|b| b.block_type).collect();
        assert_eq!(types, vec![0, 4, 3]);
        assert_eq!(layout.audio, Bytes::from_static(AUDIO));
        assert!(!layout.blocks[1].payload.windows(5).any(|w| w == b"stale"));
    }

    #[test]
    fn test_exactly_one_last_flag() {
        let bytes = flac(&[block(0x80, &[0; 34])], AUDIO);
        let out = apply_flac_tags(&bytes, &TagSet::new().with(TagField::Artist, "B"), &TagWriterConfig::default()).unwrap();

        // STREAMINFO lost its flag; the comment block carries it
        assert_eq!(out[4], 0);
        let comment_at = 4 + 4 + 34;
        assert_eq!(out[comment_at], 0x80 | 4);
        assert!(out.ends_with(AUDIO));
    }

    #[test]
    fn test_no_tags_drops_old_comment() {
        let bytes = flac(&[block(0, &[0; 34]), block(0x80 | 4, b"old")], AUDIO);
        let out = apply_flac_tags(&bytes, &TagSet::new(), &TagWriterConfig::default()).unwrap();
        assert_eq!(out, flac(&[block(0x80, &[0; 34])], AUDIO));
    }

    #[test]
    fn test_not_flac_passthrough() {
        let bytes = Bytes::from_static(b"OggS\x00\x02");
        let out = apply_flac_tags(&bytes, &TagSet::new().with(TagField::Title, "A"), &TagWriterConfig::default()).unwrap();
        assert_eq!(out, bytes);
    }
}
