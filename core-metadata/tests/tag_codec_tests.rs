//! End-to-end tests for the tag writer across all three containers.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{FileMetadata, FileSystemAccess};
use bytes::Bytes;
use core_metadata::flac::walk_blocks;
use core_metadata::id3::strip_id3v2;
use core_metadata::primitives::{read_sync_safe_28, read_u32_le};
use core_metadata::riff::walk_chunks;
use core_metadata::{guess_format, ContainerFormat, TagField, TagSet, TagWriter};
use mockall::mock;
use std::path::{Path, PathBuf};

mock! {
    FileSystem {}

    #[async_trait]
    impl FileSystemAccess for FileSystem {
        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata>;
        async fn read_file(&self, path: &Path) -> BridgeResult<Bytes>;
        async fn write_file(&self, path: &Path, data: Bytes) -> BridgeResult<()>;
        async fn open_read_stream(&self, path: &Path) -> BridgeResult<Box<dyn tokio::io::AsyncRead + Send + Unpin>>;
    }
}

fn sample_tags() -> TagSet {
    TagSet::new()
        .with(TagField::Title, "Night Drive")
        .with(TagField::Artist, "Ödön")
        .with(TagField::Track, "3")
        .with(TagField::Comment, "rough mix")
}

fn riff_chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn wav_file(chunks: &[Vec<u8>]) -> Bytes {
    let mut body = b"WAVE".to_vec();
    for chunk in chunks {
        body.extend_from_slice(chunk);
    }
    let mut out = b"RIFF".to_vec();
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Bytes::from(out)
}

fn flac_file() -> Bytes {
    let mut out = b"fLaC".to_vec();
    // STREAMINFO
    out.extend_from_slice(&[0x00, 0x00, 0x00, 34]);
    out.extend_from_slice(&[0x11; 34]);
    // SEEKTABLE, last
    out.extend_from_slice(&[0x83, 0x00, 0x00, 18]);
    out.extend_from_slice(&[0x22; 18]);
    out.extend_from_slice(&[0xFF, 0xF8, 0xC9, 0x08, 0x00, 0x01]);
    Bytes::from(out)
}

#[test]
fn test_mp3_tag_is_prepended_to_untouched_audio() {
    let writer = TagWriter::default();
    let audio = Bytes::from_static(&[0xFF, 0xFB, 0x90, 0x64, 0xAA, 0xBB]);

    let tagged = writer
        .apply_metadata_to_bytes(audio.clone(), "Song.MP3", &sample_tags())
        .unwrap();

    let size = read_sync_safe_28(&tagged, 6).unwrap() as usize;
    assert_eq!(tagged.len(), 10 + size + audio.len());
    assert_eq!(strip_id3v2(&tagged), audio);
}

/// `(id, value)` pairs of an INFO payload, values without the NUL terminator.
fn info_entries(payload: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut entries = Vec::new();
    let mut offset = 0;
    while offset + 8 <= payload.len() {
        let id = String::from_utf8_lossy(&payload[offset..offset + 4]).into_owned();
        let size = read_u32_le(payload, offset + 4).unwrap() as usize;
        let value = &payload[offset + 8..offset + 8 + size];
        entries.push((id, value.strip_suffix(&[0]).unwrap_or(value).to_vec()));
        offset += 8 + size + size % 2;
    }
    entries
}

#[test]
fn test_wav_preserves_foreign_chunks_in_order() {
    let writer = TagWriter::default();
    let fmt = riff_chunk(b"fmt ", &[1, 0, 2, 0, 0x80, 0xBB, 0, 0, 0, 0xEE, 2, 0, 4, 0, 16, 0]);
    let cue = riff_chunk(b"cue ", &[0; 4]);
    let data = riff_chunk(b"data", &[7; 9]);
    let stale = riff_chunk(b"LIST", b"INFOIART\x02\x00\x00\x00Z\x00");
    let bytes = wav_file(&[fmt.clone(), stale, cue.clone(), data.clone()]);

    let tagged = writer
        .apply_metadata_to_bytes(bytes, "/exports/mix.wav", &sample_tags())
        .unwrap();

    let layout = walk_chunks(&tagged).unwrap();
    let ids: Vec<&[u8]> = layout.kept.iter().map(|c| &c[..4]).collect();
    assert_eq!(ids, vec![&b"fmt "[..], &b"cue "[..], &b"data"[..]]);
    assert_eq!(layout.kept[0], Bytes::from(fmt.clone()));
    assert_eq!(layout.kept[1], Bytes::from(cue.clone()));
    assert_eq!(layout.kept[2], Bytes::from(data.clone()));
    assert!(layout.dropped_info);

    let info_at = 12 + fmt.len() + cue.len() + data.len();
    assert_eq!(&tagged[info_at..info_at + 4], b"LIST");
    assert_eq!(&tagged[info_at + 8..info_at + 12], b"INFO");
    assert_eq!(read_u32_le(&tagged, 4).unwrap() as usize, tagged.len() - 8);

    let list_size = read_u32_le(&tagged, info_at + 4).unwrap() as usize;
    let entries = info_entries(&tagged[info_at + 12..info_at + 8 + list_size]);
    assert!(entries.contains(&("INAM".to_string(), b"Night Drive".to_vec())));
    assert!(entries.contains(&("IART".to_string(), "Ödön".as_bytes().to_vec())));
    assert_eq!(entries.iter().filter(|(id, _)| id == "IART").count(), 1);
    assert!(!entries.iter().any(|(_, value)| value == b"Z"));
    assert_eq!(tagged.windows(4).filter(|w| *w == b"INFO").count(), 1);
}

#[test]
fn test_flac_single_last_block_and_audio_preserved() {
    let writer = TagWriter::default();
    let original = flac_file();
    let audio = walk_blocks(&original).unwrap().audio;

    let once = writer
        .apply_metadata_to_bytes(original, "take.flac", &sample_tags())
        .unwrap();
    let twice = writer
        .apply_metadata_to_bytes(once.clone(), "take.flac", &sample_tags())
        .unwrap();
    assert_eq!(once, twice);

    let layout = walk_blocks(&twice).unwrap();
    let types: Vec<u8> = layout.blocks.iter().map(|b| b.block_type).collect();
    assert_eq!(types, vec![0, 4, 3]);
    assert_eq!(layout.audio, audio);

    // only the final metadata block carries the last flag
    let mut offset = 4;
    let mut flags = Vec::new();
    for block in &layout.blocks {
        flags.push(twice[offset] & 0x80 != 0);
        offset += 4 + block.payload.len();
    }
    assert_eq!(flags, vec![false, false, true]);
}

#[test]
fn test_retagging_is_idempotent_for_every_container() {
    let writer = TagWriter::default();
    let inputs = [
        ("a.mp3", Bytes::from_static(&[0xFF, 0xFB, 0x10, 0x00])),
        ("a.wav", wav_file(&[riff_chunk(b"data", &[0; 4])])),
        ("a.flac", flac_file()),
    ];

    for (name, bytes) in inputs {
        let once = writer.apply_metadata_to_bytes(bytes, name, &sample_tags()).unwrap();
        let twice = writer.apply_metadata_to_bytes(once.clone(), name, &sample_tags()).unwrap();
        assert_eq!(once, twice, "{name} changed on second pass");
    }
}

#[test]
fn test_dispatch_names() {
    assert_eq!(guess_format("B:/Takes/VOX.Wav"), Some(ContainerFormat::Wav));
    assert_eq!(guess_format("project.recwerk"), None);
}

#[tokio::test]
async fn test_apply_metadata_to_file_roundtrip() {
    let path = PathBuf::from("/music/take.flac");
    let original = flac_file();

    let mut fs = MockFileSystem::new();
    let served = original.clone();
    fs.expect_read_file()
        .withf(|path| path == Path::new("/music/take.flac"))
        .times(1)
        .returning(move |_| Ok(served.clone()));
    fs.expect_write_file()
        .withf(|path, data| path == Path::new("/music/take.flac") && data.starts_with(b"fLaC"))
        .times(1)
        .returning(|_, _| Ok(()));

    let written = TagWriter::default()
        .apply_metadata_to_file(&fs, &path, &sample_tags())
        .await
        .unwrap();
    assert!(written);
}

#[tokio::test]
async fn test_apply_metadata_to_file_skips_unknown_format() {
    let mut fs = MockFileSystem::new();
    fs.expect_read_file().times(0);
    fs.expect_write_file().times(0);

    let written = TagWriter::default()
        .apply_metadata_to_file(&fs, Path::new("/music/take.ogg"), &sample_tags())
        .await
        .unwrap();
    assert!(!written);
}

#[tokio::test]
async fn test_apply_metadata_to_file_propagates_read_error() {
    let mut fs = MockFileSystem::new();
    fs.expect_read_file()
        .returning(|_| Err(BridgeError::OperationFailed("disk gone".to_string())));
    fs.expect_write_file().times(0);

    let result = TagWriter::default()
        .apply_metadata_to_file(&fs, Path::new("/music/take.mp3"), &sample_tags())
        .await;
    assert!(matches!(result, Err(core_metadata::MetadataError::Bridge(_))));
}
