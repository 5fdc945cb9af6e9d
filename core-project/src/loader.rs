//! # Project Loader
//!
//! Opens a project and hands its samples to the audio engine.
//!
//! ## Two-pass streaming load
//!
//! ```text
//! pass 1: stream ──▶ MetaOnly     ──▶ ProjectMeta      progress  1..48 %
//!         engine.create_buffer(channels, frames, rate)          48 %
//! pass 2: stream ──▶ FillBuffer   ──▶ ProjectMeta (== pass 1)  50..99 %
//!         engine.load_decoded_buffer(name, buffer)              100 %
//! ```
//!
//! The source is read twice so the destination can be allocated once at
//! its final size, keeping memory bounded for very long projects.

use bridge_traits::engine::AudioEngine;
use bridge_traits::storage::FileSystemAccess;
use bytes::Bytes;
use core_runtime::config::CoreConfig;
use core_runtime::logging::strip_path;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{ProjectError, Result};
use crate::meta::ProjectMeta;
use crate::stream::{decode_project_stream, FillBuffer, MetaOnly, ProjectVisitor};
use crate::text::{decode_project_bytes, decode_project_text, DecodedProject};

const PASS_ONE_START: f64 = 1.0;
const PASS_ONE_SPAN: f64 = 47.0;
const BUFFER_READY: f64 = 48.0;
const PASS_TWO_START: f64 = 50.0;
const PASS_TWO_SPAN: f64 = 49.0;
const DONE: f64 = 100.0;

/// Receives load progress in percent.
pub trait LoadProgress: Send + Sync {
    fn report(&self, percent: f64);
}

/// Progress sink that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl LoadProgress for NoProgress {
    fn report(&self, _percent: f64) {}
}

/// True if `name` ends with `.<extension>`, ignoring case.
pub fn is_project_file(name: &str, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    !name.is_empty()
        && !extension.is_empty()
        && name
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", extension.to_ascii_lowercase()))
}

/// A file handed over by the host's open dialog or drag and drop.
#[derive(Debug, Clone)]
pub enum LocalFile {
    /// Desktop file the core can read itself.
    Path { name: String, path: PathBuf },
    /// Contents already read as text.
    Text { name: String, text: String },
    /// Contents already read as raw bytes.
    Bytes { name: String, bytes: Bytes },
}

impl LocalFile {
    pub fn name(&self) -> &str {
        match self {
            LocalFile::Path { name, .. } | LocalFile::Text { name, .. } | LocalFile::Bytes { name, .. } => {
                name
            }
        }
    }
}

/// Maps a pass's byte progress onto a slice of the overall percentage.
struct Reporting<'a, V> {
    inner: V,
    progress: &'a dyn LoadProgress,
    start: f64,
    span: f64,
}

impl<V: ProjectVisitor> ProjectVisitor for Reporting<'_, V> {
    fn on_channel_start(&mut self, channel: usize) {
        self.inner.on_channel_start(channel)
    }

    fn on_value(&mut self, channel: usize, index: usize, value: f64) -> Result<()> {
        self.inner.on_value(channel, index, value)
    }

    fn on_channel_end(&mut self, channel: usize, length: usize) {
        self.inner.on_channel_end(channel, length)
    }

    fn on_progress(&mut self, bytes_read: u64, total_bytes: u64) {
        let ratio = (bytes_read as f64 / total_bytes as f64).min(1.0);
        self.progress.report(self.start + ratio * self.span);
        self.inner.on_progress(bytes_read, total_bytes)
    }
}

/// Loads projects into the audio engine.
pub struct ProjectLoader {
    config: CoreConfig,
    file_system: Arc<dyn FileSystemAccess>,
    engine: Arc<dyn AudioEngine>,
}

impl ProjectLoader {
    /// Create a loader using the file system configured in `config`.
    pub fn new(config: CoreConfig, engine: Arc<dyn AudioEngine>) -> Result<Self> {
        let file_system = config.require_file_system()?;
        Ok(Self {
            config,
            file_system,
            engine,
        })
    }

    pub fn with_file_system(
        config: CoreConfig,
        file_system: Arc<dyn FileSystemAccess>,
        engine: Arc<dyn AudioEngine>,
    ) -> Self {
        Self {
            config,
            file_system,
            engine,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn is_project_file(&self, name: &str) -> bool {
        is_project_file(name, self.config.project_extension())
    }

    /// Caller name, else the name stored in the project, else the default.
    fn display_name(&self, name: Option<&str>, meta: &ProjectMeta) -> String {
        name.filter(|name| !name.is_empty())
            .or_else(|| Some(meta.name.as_str()).filter(|name| !name.is_empty()))
            .unwrap_or_else(|| self.config.default_project_name())
            .to_string()
    }

    /// Stream a project from disk in two passes and load it.
    #[instrument(skip(self, path, progress))]
    pub async fn load_from_path(
        &self,
        path: &Path,
        name: Option<&str>,
        progress: &dyn LoadProgress,
    ) -> Result<ProjectMeta> {
        let display_path = path.to_string_lossy();
        info!(file = strip_path(&display_path), "Loading project from disk");
        let total = self.file_system.size_hint(path).await;

        let reader = self.file_system.open_read_stream(path).await?;
        let mut counting = Reporting {
            inner: MetaOnly,
            progress,
            start: PASS_ONE_START,
            span: PASS_ONE_SPAN,
        };
        let meta = decode_project_stream(reader, total, &mut counting, &self.config).await?;
        if meta.channel_count == 0 {
            return Err(ProjectError::MalformedHeader("missing channel data".to_string()));
        }
        progress.report(BUFFER_READY);
        debug!(
            channels = meta.channel_count,
            frames = meta.frame_count,
            sample_rate = meta.sample_rate,
            "First pass complete"
        );

        let mut buffer =
            self.engine
                .create_buffer(meta.channel_count, meta.frame_count, meta.sample_rate)?;

        let reader = self.file_system.open_read_stream(path).await?;
        let mut filling = Reporting {
            inner: FillBuffer::new(&mut buffer),
            progress,
            start: PASS_TWO_START,
            span: PASS_TWO_SPAN,
        };
        let second = decode_project_stream(reader, total, &mut filling, &self.config).await?;
        if !second.same_shape(&meta) {
            return Err(ProjectError::SourceChanged(format!(
                "first pass saw {}x{} at {} Hz, second pass {}x{} at {} Hz",
                meta.channel_count,
                meta.frame_count,
                meta.sample_rate,
                second.channel_count,
                second.frame_count,
                second.sample_rate
            )));
        }
        progress.report(DONE);

        let display_name = self.display_name(name, &meta);
        self.engine.load_decoded_buffer(&display_name, buffer).await?;
        info!(name = %display_name, "Project loaded");
        Ok(meta)
    }

    /// Decode a project held in memory as text and load it.
    #[instrument(skip(self, text, progress), fields(len = text.len()))]
    pub async fn load_from_text(
        &self,
        text: &str,
        name: Option<&str>,
        progress: &dyn LoadProgress,
    ) -> Result<ProjectMeta> {
        let project = decode_project_text(text)?;
        self.load_decoded(project, name, progress).await
    }

    /// Decode a project held in memory as UTF-8 bytes and load it.
    #[instrument(skip(self, bytes, progress), fields(len = bytes.len()))]
    pub async fn load_from_bytes(
        &self,
        bytes: &[u8],
        name: Option<&str>,
        progress: &dyn LoadProgress,
    ) -> Result<ProjectMeta> {
        let project = decode_project_bytes(bytes)?;
        self.load_decoded(project, name, progress).await
    }

    async fn load_decoded(
        &self,
        project: DecodedProject,
        name: Option<&str>,
        progress: &dyn LoadProgress,
    ) -> Result<ProjectMeta> {
        let meta = project.meta.clone();
        let display_name = self.display_name(name, &meta);
        let buffer = project.into_audio_buffer()?;

        self.engine.load_decoded_buffer(&display_name, buffer).await?;
        progress.report(DONE);
        info!(name = %display_name, "Project loaded");
        Ok(meta)
    }

    /// Route a file from the host to the matching loader.
    ///
    /// Only project files are accepted; audio import is the engine's job.
    pub async fn open_local_file(&self, file: LocalFile, progress: &dyn LoadProgress) -> Result<ProjectMeta> {
        if !self.is_project_file(file.name()) {
            return Err(ProjectError::MalformedHeader(format!(
                "{} is not a .{} project",
                strip_path(file.name()),
                self.config.project_extension()
            )));
        }

        match file {
            LocalFile::Path { name, path } => self.load_from_path(&path, Some(&name), progress).await,
            LocalFile::Text { name, text } => self.load_from_text(&text, Some(&name), progress).await,
            LocalFile::Bytes { name, bytes } => self.load_from_bytes(&bytes, Some(&name), progress).await,
        }
    }
}
