//! Audio engine bridge trait and the buffer type exchanged with it.
//!
//! The waveform engine owns playback buffers. The core only asks it for a
//! destination buffer of a known shape, fills it, and hands it back.

use async_trait::async_trait;

use crate::error::{BridgeError, Result};

/// Planar floating-point audio buffer.
///
/// One `Vec<f32>` per channel; every channel has exactly `frames` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: f64,
    frames: usize,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Allocate a zero-filled buffer of the given shape.
    pub fn new(channel_count: usize, frames: usize, sample_rate: f64) -> Self {
        Self {
            sample_rate,
            frames,
            channels: vec![vec![0.0; frames]; channel_count],
        }
    }

    /// Wrap already decoded channel data.
    ///
    /// Fails if the channels do not share one length.
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: f64) -> Result<Self> {
        let frames = channels.first().map(Vec::len).unwrap_or(0);
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, channel)| channel.len() != frames)
        {
            return Err(BridgeError::Engine(format!(
                "channel {} has {} frames, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        Ok(Self {
            sample_rate,
            frames,
            channels,
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.frames as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f32]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }
}

/// Audio engine trait
///
/// Implemented by the host's waveform engine:
/// - `create_buffer` allocates the pass-2 destination of a streaming load
/// - `load_decoded_buffer` commits a filled buffer as the active project
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Allocate a destination buffer of `(channels, frames, sample_rate)`.
    ///
    /// The default allocates a zero-filled [`AudioBuffer`]; engines with their
    /// own allocator (e.g. shared memory) override this.
    fn create_buffer(&self, channels: usize, frames: usize, sample_rate: f64) -> Result<AudioBuffer> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(BridgeError::Engine(format!(
                "invalid sample rate {}",
                sample_rate
            )));
        }
        Ok(AudioBuffer::new(channels, frames, sample_rate))
    }

    /// Commit a fully decoded buffer as the active project.
    async fn load_decoded_buffer(&self, name: &str, buffer: AudioBuffer) -> Result<()>;
}
