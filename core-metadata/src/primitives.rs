//! Fixed-width integer and text encoders shared by the tag codecs.
//!
//! All functions are pure. Readers return `None` instead of panicking when
//! the requested range is out of bounds.

use crate::error::{MetadataError, Result};

/// Largest value a 28-bit sync-safe integer can hold (256 MiB - 1).
pub const SYNC_SAFE_MAX: u32 = 0x0FFF_FFFF;

/// Largest value a 24-bit big-endian field can hold.
pub const U24_MAX: u32 = 0x00FF_FFFF;

pub fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

pub fn read_u24_be(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(3)?)?;
    Some(((raw[0] as u32) << 16) | ((raw[1] as u32) << 8) | raw[2] as u32)
}

pub fn write_u32_le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn write_u32_be(value: u32) -> [u8; 4] {
    value.to_be_bytes()
}

/// Low 24 bits of `value`, big-endian.
pub fn write_u24_be(value: u32) -> [u8; 3] {
    let [_, hi, mid, lo] = value.to_be_bytes();
    [hi, mid, lo]
}

/// Decode a 28-bit sync-safe integer, ignoring each byte's top bit.
pub fn read_sync_safe_28(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset.checked_add(4)?)?;
    Some(
        ((raw[0] as u32 & 0x7F) << 21)
            | ((raw[1] as u32 & 0x7F) << 14)
            | ((raw[2] as u32 & 0x7F) << 7)
            | (raw[3] as u32 & 0x7F),
    )
}

/// Encode `value` as a 28-bit sync-safe integer.
///
/// Values above [`SYNC_SAFE_MAX`] cannot be represented and are rejected
/// rather than truncated.
pub fn write_sync_safe_28(value: u32) -> Result<[u8; 4]> {
    if value > SYNC_SAFE_MAX {
        return Err(MetadataError::FieldOverflow {
            field: "sync-safe size",
            size: value as usize,
            max: SYNC_SAFE_MAX as u64,
        });
    }

    Ok([
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ])
}

/// Convert a byte length to a `u32` field no larger than `max`.
pub(crate) fn checked_len(field: &'static str, len: usize, max: u32) -> Result<u32> {
    match u32::try_from(len) {
        Ok(value) if value <= max => Ok(value),
        _ => Err(MetadataError::FieldOverflow {
            field,
            size: len,
            max: max as u64,
        }),
    }
}

/// One byte per char, high bit cleared.
pub fn ascii_bytes(text: &str) -> Vec<u8> {
    text.chars().map(|c| (c as u32 & 0x7F) as u8).collect()
}

pub fn utf8_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// UTF-16LE code units prefixed with the `FF FE` byte-order mark.
///
/// The BOM is emitted even for the empty string.
pub fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&[0xFF, 0xFE]);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

pub fn concat<T: AsRef<[u8]>>(chunks: &[T]) -> Vec<u8> {
    let total = chunks.iter().map(|chunk| chunk.as_ref().len()).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend_from_slice(chunk.as_ref());
    }
    out
}
