//! # Project Format Module
//!
//! Reads and writes RECwerk project files: a JSON document holding a name,
//! a sample rate and one array of floating-point samples per channel.
//!
//! ## Overview
//!
//! - [`stream`]: chunked decoder with a bounded working set, for desktop
//!   files of any size
//! - [`text`]: whole-document decoder for payloads already in memory
//! - [`writer`]: project encoder
//! - [`loader`]: two-pass load into the host audio engine
//!
//! Both decoders accept the legacy `data` and `samplerate` spellings.

pub mod error;
pub mod loader;
pub mod meta;
pub mod stream;
pub mod text;
pub mod writer;

pub use error::{ProjectError, Result};
pub use loader::{is_project_file, LoadProgress, LocalFile, NoProgress, ProjectLoader};
pub use meta::ProjectMeta;
pub use stream::{decode_project_stream, FillBuffer, MetaOnly, ProjectScanner, ProjectVisitor};
pub use text::{decode_project_bytes, decode_project_text, DecodedProject};
pub use writer::{encode_project, save_project};
