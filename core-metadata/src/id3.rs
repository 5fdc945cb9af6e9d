//! ID3v2.3 tag writer for MP3 files.
//!
//! The MPEG audio frames are never parsed. An existing ID3v2 header at offset
//! 0 is skipped using its declared size; everything after it is copied
//! through as-is.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::error::Result;
use crate::primitives::{
    ascii_bytes, checked_len, read_sync_safe_28, utf16le_with_bom, write_sync_safe_28,
    write_u32_be, SYNC_SAFE_MAX,
};
use crate::tags::{TagSet, TagWriterConfig};

const ID3_MAGIC: &[u8; 3] = b"ID3";
const HEADER_LEN: usize = 10;
const COMMENT_FRAME_ID: &str = "COMM";

/// `$01`: UTF-16 with BOM.
const ENCODING_UTF16: u8 = 0x01;

/// Remove a leading ID3v2 tag, if any.
///
/// A declared size running past the end of the buffer leaves an empty
/// payload.
pub fn strip_id3v2(bytes: &Bytes) -> Bytes {
    if bytes.len() < HEADER_LEN || &bytes[..3] != ID3_MAGIC {
        return bytes.clone();
    }

    let size = read_sync_safe_28(bytes, 6).unwrap_or(0) as usize;
    let start = (HEADER_LEN + size).min(bytes.len());
    debug!(tag_bytes = start, "Stripped ID3v2 tag");
    bytes.slice(start..)
}

fn frame(id: &str, payload: &[u8]) -> Result<Vec<u8>> {
    let len = checked_len("ID3 frame", payload.len(), u32::MAX)?;
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&ascii_bytes(id));
    out.extend_from_slice(&write_u32_be(len));
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(payload);
    Ok(out)
}

fn text_frame(id: &str, value: &str) -> Result<Vec<u8>> {
    let mut payload = vec![ENCODING_UTF16];
    payload.extend_from_slice(&utf16le_with_bom(value));
    frame(id, &payload)
}

/// `COMM` with language `eng` and an empty description.
fn comment_frame(value: &str) -> Result<Vec<u8>> {
    let mut payload = vec![ENCODING_UTF16, b'e', b'n', b'g'];
    payload.extend_from_slice(&utf16le_with_bom(""));
    // UTF-16 terminator of the description
    payload.extend_from_slice(&[0, 0]);
    payload.extend_from_slice(&utf16le_with_bom(value));
    frame(COMMENT_FRAME_ID, &payload)
}

/// Serialize a complete ID3v2.3 tag (header + frames) for `tags`.
///
/// The encoder frame is always present, so the tag is never empty.
pub fn build_id3v23(tags: &TagSet, config: &TagWriterConfig) -> Result<Vec<u8>> {
    let mut body = Vec::new();

    for (key, value) in config.id3.entries(tags) {
        let frame = if key == COMMENT_FRAME_ID {
            comment_frame(value)?
        } else {
            text_frame(key, value)?
        };
        body.extend_from_slice(&frame);
    }
    body.extend_from_slice(&text_frame(config.id3.encoder_key(), &config.encoder_name)?);

    let size = checked_len("ID3 tag", body.len(), SYNC_SAFE_MAX)?;

    let mut tag = Vec::with_capacity(HEADER_LEN + body.len());
    tag.extend_from_slice(ID3_MAGIC);
    // v2.3.0, no flags
    tag.extend_from_slice(&[3, 0, 0]);
    tag.extend_from_slice(&write_sync_safe_28(size)?);
    tag.extend_from_slice(&body);
    Ok(tag)
}

/// Replace any ID3v2 tag of `bytes` with one built from `tags`.
///
/// Without tags the existing header is stripped and nothing is added.
pub fn apply_mp3_tags(bytes: &Bytes, tags: &TagSet, config: &TagWriterConfig) -> Result<Bytes> {
    let clean = strip_id3v2(bytes);
    if !tags.has_tags() {
        return Ok(clean);
    }

    let tag = build_id3v23(tags, config)?;
    let mut out = BytesMut::with_capacity(tag.len() + clean.len());
    out.extend_from_slice(&tag);
    out.extend_from_slice(&clean);
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagField;

    fn audio() -> Bytes {
        Bytes::from_static(&[0xFF, 0xFB, 0x90, 0x64, 0x00, 0x11, 0x22, 0x33])
    }

    /// Walk the frames of a tag produced by `build_id3v23`.
    fn frames(tag: &[u8]) -> Vec<(String, Vec<u8>)> {
        let size = read_sync_safe_28(tag, 6).unwrap() as usize;
        let body = &tag[10..10 + size];
        let mut out = Vec::new();
        let mut offset = 0;
        while offset + 10 <= body.len() {
            let id = String::from_utf8(body[offset..offset + 4].to_vec()).unwrap();
            let len = u32::from_be_bytes(body[offset + 4..offset + 8].try_into().unwrap()) as usize;
            out.push((id, body[offset + 10..offset + 10 + len].to_vec()));
            offset += 10 + len;
        }
        out
    }

    #[test]
    fn test_strip_without_tag() {
        let bytes = audio();
        assert_eq!(strip_id3v2(&bytes), bytes);
        assert_eq!(strip_id3v2(&Bytes::from_static(b"ID3")), Bytes::from_static(b"ID3"));
    }

    #[test]
    fn test_strip_existing_tag() {
        let mut data = b"ID3\x03\x00\x00\x00\x00\x00\x04abcd".to_vec();
        data.extend_from_slice(&audio());
        assert_eq!(strip_id3v2(&Bytes::from(data)), audio());
    }

    #[test]
    fn test_strip_clamps_oversized_header() {
        let data = Bytes::from_static(b"ID3\x03\x00\x00\x00\x00\x7F\x7Fshort");
        assert!(strip_id3v2(&data).is_empty());
    }

    #[test]
    fn test_header_layout() {
        let tags = TagSet::new().with(TagField::Title, "A");
        let tag = build_id3v23(&tags, &TagWriterConfig::default()).unwrap();

        assert_eq!(&tag[..6], b"ID3\x03\x00\x00");
        assert!(tag[6..10].iter().all(|b| b & 0x80 == 0));
        assert_eq!(read_sync_safe_28(&tag, 6).unwrap() as usize, tag.len() - 10);
    }

    #[test]
    fn test_text_frames_and_encoder() {
        let tags = TagSet::new()
            .with(TagField::Title, "A")
            .with(TagField::Genre, "Jazz");
        let tag = build_id3v23(&tags, &TagWriterConfig::default()).unwrap();
        let frames = frames(&tag);

        let ids: Vec<_> = frames.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["TIT2", "TCON", "TENC"]);
        assert_eq!(frames[0].1, vec![0x01, 0xFF, 0xFE, b'A', 0x00]);

        let mut expected = vec![0x01, 0xFF, 0xFE];
        for unit in "RECwerk".encode_utf16() {
            expected.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(frames[2].1, expected);
    }

    #[test]
    fn test_comment_frame_layout() {
        let tags = TagSet::new().with(TagField::Comment, "hi");
        let tag = build_id3v23(&tags, &TagWriterConfig::default()).unwrap();
        let frames = frames(&tag);

        assert_eq!(frames[0].0, "COMM");
        assert_eq!(
            frames[0].1,
            vec![
                0x01, b'e', b'n', b'g', 0xFF, 0xFE, 0x00, 0x00, 0xFF, 0xFE, b'h', 0x00, b'i', 0x00
            ]
        );
    }

    #[test]
    fn test_apply_then_strip_restores_payload() {
        let tags = TagSet::new()
            .with(TagField::Title, "A")
            .with(TagField::Artist, "B");
        let tagged = apply_mp3_tags(&audio(), &tags, &TagWriterConfig::default()).unwrap();

        assert!(tagged.starts_with(b"ID3"));
        assert_eq!(strip_id3v2(&tagged), audio());
    }

    #[test]
    fn test_retag_replaces_old_tag() {
        let config = TagWriterConfig::default();
        let first = apply_mp3_tags(&audio(), &TagSet::new().with(TagField::Title, "Old"), &config).unwrap();
        let second = apply_mp3_tags(&first, &TagSet::new().with(TagField::Title, "New"), &config).unwrap();
        let direct = apply_mp3_tags(&audio(), &TagSet::new().with(TagField::Title, "New"), &config).unwrap();
        assert_eq!(second, direct);
    }

    #[test]
    fn test_empty_tags_strip_only() {
        let config = TagWriterConfig::default();
        let tagged = apply_mp3_tags(&audio(), &TagSet::new().with(TagField::Album, "X"), &config).unwrap();
        let once = apply_mp3_tags(&tagged, &TagSet::new(), &config).unwrap();
        let twice = apply_mp3_tags(&once, &TagSet::new(), &config).unwrap();
        assert_eq!(once, audio());
        assert_eq!(twice, once);
    }
}
