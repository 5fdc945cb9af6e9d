//! # Streaming Project Decoder
//!
//! Decodes a project file chunk by chunk with a fixed working set, however
//! many samples it holds.
//!
//! ## Architecture
//!
//! ```text
//! AsyncRead ──chunks──▶ ProjectScanner ──events──▶ ProjectVisitor
//!                       AwaitingHeader
//!                            │ "channels": [
//!                            ▼
//!                        Scanning ──] at depth 0──▶ Completed
//! ```
//!
//! The header region (everything up to the opening bracket of the
//! `channels` or `data` array) is buffered and scanned for `sampleRate` and
//! `name`. After that the scanner only understands `[`, `]`, `,`, whitespace
//! and number tokens. Reading stops as soon as the outer array closes, so
//! fields after it are never inspected.
//!
//! ## Usage
//!
//! ```ignore
//! use core_project::stream::{decode_project_stream, MetaOnly};
//!
//! let reader = fs.open_read_stream(path).await?;
//! let total = fs.size_hint(path).await;
//! let meta = decode_project_stream(reader, total, &mut MetaOnly, &config).await?;
//! println!("{} channels x {} frames", meta.channel_count, meta.frame_count);
//! ```

use bridge_traits::engine::AudioBuffer;
use core_runtime::config::CoreConfig;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, instrument};

use crate::error::{ProjectError, Result};
use crate::meta::ProjectMeta;

/// Receives decode events in strictly increasing `(channel, index)` order.
///
/// Every method defaults to a no-op, so a pass that only needs the shape of
/// the project implements nothing.
pub trait ProjectVisitor {
    fn on_channel_start(&mut self, _channel: usize) {}

    /// A finite sample value. Returning an error aborts the decode.
    fn on_value(&mut self, _channel: usize, _index: usize, _value: f64) -> Result<()> {
        Ok(())
    }

    fn on_channel_end(&mut self, _channel: usize, _length: usize) {}

    /// Called once per chunk, before the chunk is parsed, when the total
    /// size of the source is known.
    fn on_progress(&mut self, _bytes_read: u64, _total_bytes: u64) {}
}

/// Visitor for a counting-only pass.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaOnly;

impl ProjectVisitor for MetaOnly {}

/// Visitor that writes each sample into a pre-allocated buffer.
///
/// A sample outside the buffer's shape means the source no longer matches
/// the pass that sized the buffer.
pub struct FillBuffer<'a> {
    buffer: &'a mut AudioBuffer,
}

impl<'a> FillBuffer<'a> {
    pub fn new(buffer: &'a mut AudioBuffer) -> Self {
        Self { buffer }
    }
}

impl ProjectVisitor for FillBuffer<'_> {
    fn on_value(&mut self, channel: usize, index: usize, value: f64) -> Result<()> {
        let (channels, frames) = (self.buffer.channel_count(), self.buffer.frames());
        let slot = self
            .buffer
            .channel_mut(channel)
            .and_then(|samples| samples.get_mut(index))
            .ok_or_else(|| {
                ProjectError::SourceChanged(format!(
                    "sample {}:{} outside a {}x{} buffer",
                    channel, index, channels, frames
                ))
            })?;
        *slot = value as f32;
        Ok(())
    }
}

impl<V: ProjectVisitor + ?Sized> ProjectVisitor for &mut V {
    fn on_channel_start(&mut self, channel: usize) {
        (**self).on_channel_start(channel)
    }

    fn on_value(&mut self, channel: usize, index: usize, value: f64) -> Result<()> {
        (**self).on_value(channel, index, value)
    }

    fn on_channel_end(&mut self, channel: usize, length: usize) {
        (**self).on_channel_end(channel, length)
    }

    fn on_progress(&mut self, bytes_read: u64, total_bytes: u64) {
        (**self).on_progress(bytes_read, total_bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    AwaitingHeader,
    Scanning,
    Completed,
}

/// Push-based project tokenizer.
///
/// Feed it chunks in order; it reports `true` once the channel array has
/// closed, after which further input is ignored.
#[derive(Debug)]
pub struct ProjectScanner {
    header_limit: usize,
    max_token: usize,
    state: ScanState,
    header: Vec<u8>,
    header_scan_from: usize,
    name: String,
    sample_rate: f64,
    depth: usize,
    channel: Option<usize>,
    sample_index: usize,
    token: Vec<u8>,
    lengths: Vec<usize>,
    meta: Option<ProjectMeta>,
}

impl ProjectScanner {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            header_limit: config.header_limit_bytes(),
            max_token: config.max_number_token_bytes(),
            state: ScanState::AwaitingHeader,
            header: Vec::new(),
            header_scan_from: 0,
            name: String::new(),
            sample_rate: 0.0,
            depth: 0,
            channel: None,
            sample_index: 0,
            token: Vec::new(),
            lengths: Vec::new(),
            meta: None,
        }
    }

    /// Consume one chunk. Returns `true` once decoding is complete.
    pub fn feed<V: ProjectVisitor + ?Sized>(&mut self, chunk: &[u8], visitor: &mut V) -> Result<bool> {
        match self.state {
            ScanState::Completed => Ok(true),
            ScanState::Scanning => self.scan(chunk, visitor),
            ScanState::AwaitingHeader => {
                self.header.extend_from_slice(chunk);
                let body_start = match locate_channel_array(&self.header, self.header_scan_from) {
                    Ok(body_start) => body_start,
                    Err(resume_at) => {
                        if self.header.len() > self.header_limit {
                            return Err(ProjectError::MalformedHeader(format!(
                                "no channel array within the first {} bytes",
                                self.header_limit
                            )));
                        }
                        self.header_scan_from = resume_at;
                        return Ok(false);
                    }
                };

                let header = std::mem::take(&mut self.header);
                self.parse_header(&header[..body_start])?;
                self.state = ScanState::Scanning;
                self.depth = 1;
                self.scan(&header[body_start..], visitor)
            }
        }
    }

    /// The decoded shape, or `UnexpectedEof` if the array never closed.
    pub fn finish(self) -> Result<ProjectMeta> {
        self.meta.ok_or(ProjectError::UnexpectedEof)
    }

    fn parse_header(&mut self, header: &[u8]) -> Result<()> {
        let (start, end) = find_field(header, &["sampleRate", "samplerate"], number_value)
            .ok_or_else(|| ProjectError::InvalidSampleRate("missing sampleRate".to_string()))?;
        let text = String::from_utf8_lossy(&header[start..end]);
        self.sample_rate = text
            .parse::<f64>()
            .ok()
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| ProjectError::InvalidSampleRate(text.to_string()))?;

        self.name = find_field(header, &["name"], string_value)
            .and_then(|(start, end)| serde_json::from_slice::<String>(&header[start..end]).ok())
            .unwrap_or_default();

        debug!(
            name = %self.name,
            sample_rate = self.sample_rate,
            header_bytes = header.len(),
            "Parsed project header"
        );
        Ok(())
    }

    fn scan<V: ProjectVisitor + ?Sized>(&mut self, text: &[u8], visitor: &mut V) -> Result<bool> {
        for &byte in text {
            match byte {
                b'[' => {
                    self.flush(visitor)?;
                    if self.depth != 1 {
                        return Err(ProjectError::MalformedHeader(
                            "nested array inside a channel".to_string(),
                        ));
                    }
                    let channel = self.channel.map_or(0, |c| c + 1);
                    self.channel = Some(channel);
                    self.sample_index = 0;
                    visitor.on_channel_start(channel);
                    self.depth += 1;
                }
                b']' => {
                    self.flush(visitor)?;
                    if self.depth == 2 {
                        let channel = self.channel.unwrap_or(0);
                        self.lengths.push(self.sample_index);
                        visitor.on_channel_end(channel, self.sample_index);
                        debug!(channel, length = self.sample_index, "Channel closed");
                    }
                    self.depth -= 1;
                    if self.depth == 0 {
                        self.complete()?;
                        return Ok(true);
                    }
                }
                b',' => self.flush(visitor)?,
                b' ' | b'\n' | b'\r' | b'\t' => {}
                other => {
                    if self.token.len() >= self.max_token {
                        return Err(self.invalid_sample());
                    }
                    self.token.push(other);
                }
            }
        }
        Ok(false)
    }

    fn flush<V: ProjectVisitor + ?Sized>(&mut self, visitor: &mut V) -> Result<()> {
        if self.token.is_empty() {
            return Ok(());
        }

        let Some(channel) = self.channel.filter(|_| self.depth == 2) else {
            return Err(ProjectError::MalformedHeader(format!(
                "sample {:?} outside a channel array",
                String::from_utf8_lossy(&self.token)
            )));
        };

        let value = std::str::from_utf8(&self.token)
            .ok()
            .and_then(|token| token.parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .ok_or_else(|| self.invalid_sample())?;
        self.token.clear();

        visitor.on_value(channel, self.sample_index, value)?;
        self.sample_index += 1;
        Ok(())
    }

    fn invalid_sample(&self) -> ProjectError {
        ProjectError::InvalidSample {
            channel: self.channel.unwrap_or(0),
            index: self.sample_index,
            token: String::from_utf8_lossy(&self.token).into_owned(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        let frame_count = self.lengths.first().copied().unwrap_or(0);
        if let Some((channel, &actual)) = self
            .lengths
            .iter()
            .enumerate()
            .find(|(_, length)| **length != frame_count)
        {
            return Err(ProjectError::MismatchedChannelLengths {
                expected: frame_count,
                channel,
                actual,
            });
        }

        self.state = ScanState::Completed;
        self.meta = Some(ProjectMeta {
            name: std::mem::take(&mut self.name),
            sample_rate: self.sample_rate,
            channel_count: self.lengths.len(),
            frame_count,
        });
        Ok(())
    }
}

/// Stream a project from `reader`, pushing its events into `visitor`.
///
/// `total_bytes` enables progress reporting. The reader is dropped as soon
/// as the channel array closes, without draining the rest of the source.
#[instrument(skip(reader, visitor, config))]
pub async fn decode_project_stream<R, V>(
    mut reader: R,
    total_bytes: Option<u64>,
    visitor: &mut V,
    config: &CoreConfig,
) -> Result<ProjectMeta>
where
    R: AsyncRead + Unpin,
    V: ProjectVisitor + ?Sized,
{
    let mut scanner = ProjectScanner::new(config);
    let mut chunk = vec![0u8; config.read_chunk_bytes()];
    let total = total_bytes.filter(|total| *total > 0);
    let mut bytes_read = 0u64;

    loop {
        let read = reader.read(&mut chunk).await?;
        if read == 0 {
            break;
        }

        bytes_read += read as u64;
        if let Some(total) = total {
            visitor.on_progress(bytes_read, total);
        }

        if scanner.feed(&chunk[..read], visitor)? {
            break;
        }
    }
    drop(reader);

    let meta = scanner.finish()?;
    info!(
        channels = meta.channel_count,
        frames = meta.frame_count,
        bytes_read,
        "Decoded project stream"
    );
    Ok(meta)
}

fn skip_whitespace(buf: &[u8], mut at: usize) -> usize {
    while buf.get(at).is_some_and(u8::is_ascii_whitespace) {
        at += 1;
    }
    at
}

/// First `"<key>" : <value>` in `buf` whose value `value` accepts.
///
/// Returns the byte range of the value.
fn find_field<F>(buf: &[u8], keys: &[&str], value: F) -> Option<(usize, usize)>
where
    F: Fn(&[u8], usize) -> Option<usize>,
{
    let quotes = buf
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'"')
        .map(|(at, _)| at);

    for start in quotes {
        for key in keys {
            let key = key.as_bytes();
            let key_end = start + 1 + key.len();
            if buf.get(start + 1..key_end) != Some(key) || buf.get(key_end) != Some(&b'"') {
                continue;
            }

            let colon = skip_whitespace(buf, key_end + 1);
            if buf.get(colon) != Some(&b':') {
                continue;
            }

            let value_start = skip_whitespace(buf, colon + 1);
            if let Some(value_end) = value(buf, value_start) {
                return Some((value_start, value_end));
            }
        }
    }
    None
}

enum Probe {
    Found(usize),
    Missing,
    Incomplete,
}

/// Check whether the quote at `quote` opens `"channels" : [` or `"data" : [`.
fn probe_channel_key(buf: &[u8], quote: usize) -> Probe {
    let rest = &buf[quote + 1..];
    for key in [&b"channels"[..], &b"data"[..]] {
        let seen = key.len().min(rest.len());
        if rest[..seen] != key[..seen] {
            continue;
        }
        if rest.len() <= key.len() {
            return Probe::Incomplete;
        }
        if rest[key.len()] != b'"' {
            continue;
        }

        let colon = skip_whitespace(buf, quote + key.len() + 2);
        match buf.get(colon) {
            None => return Probe::Incomplete,
            Some(b':') => {}
            Some(_) => continue,
        }

        let bracket = skip_whitespace(buf, colon + 1);
        match buf.get(bracket) {
            None => return Probe::Incomplete,
            Some(b'[') => return Probe::Found(bracket + 1),
            Some(_) => continue,
        }
    }
    Probe::Missing
}

/// Offset just past the `[` of the `channels`/`data` array.
///
/// Scanning starts at `from`. When no match is found yet, the error holds
/// the offset to resume from once more bytes arrive, so a key split across
/// chunks is still recognized and earlier bytes are not scanned twice.
fn locate_channel_array(buf: &[u8], from: usize) -> std::result::Result<usize, usize> {
    for quote in from..buf.len() {
        if buf[quote] != b'"' {
            continue;
        }
        match probe_channel_key(buf, quote) {
            Probe::Found(body_start) => return Ok(body_start),
            Probe::Incomplete => return Err(quote),
            Probe::Missing => {}
        }
    }
    Err(buf.len())
}

fn is_number_byte(byte: u8) -> bool {
    matches!(byte, b'0'..=b'9' | b'.' | b'+' | b'-' | b'e' | b'E')
}

fn number_value(buf: &[u8], at: usize) -> Option<usize> {
    let len = buf
        .get(at..)
        .map_or(0, |rest| rest.iter().take_while(|byte| is_number_byte(**byte)).count());
    (len > 0).then_some(at + len)
}

/// A JSON string literal, quotes included.
fn string_value(buf: &[u8], at: usize) -> Option<usize> {
    if buf.get(at) != Some(&b'"') {
        return None;
    }

    let mut cursor = at + 1;
    while let Some(byte) = buf.get(cursor) {
        match byte {
            b'\\' => cursor += 2,
            b'"' => return Some(cursor + 1),
            _ => cursor += 1,
        }
    }
    None
}
