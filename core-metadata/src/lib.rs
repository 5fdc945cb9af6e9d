//! # Audio Metadata Tag Codecs
//!
//! Writes descriptive tags into exported audio files without decoding the
//! audio itself.
//!
//! ## Overview
//!
//! This module handles:
//! - ID3v2.3 tags prepended to MP3 streams
//! - `LIST/INFO` chunks inside RIFF/WAVE files
//! - `VORBIS_COMMENT` blocks in FLAC streams
//! - Container detection from file names
//!
//! Every codec treats the encoded audio as opaque bytes: chunks, blocks and
//! frames it does not own are copied through untouched.

pub mod error;
pub mod flac;
pub mod format;
pub mod id3;
pub mod primitives;
pub mod riff;
pub mod tags;
pub mod writer;

pub use error::{MetadataError, Result};
pub use format::{guess_format, ContainerFormat};
pub use tags::{TagField, TagFieldMap, TagSet, TagWriterConfig};
pub use writer::TagWriter;
