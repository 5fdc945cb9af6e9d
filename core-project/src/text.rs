//! In-memory project decoder for payloads that are already resident.
//!
//! Parses the whole document with `serde_json`; no partial result is ever
//! returned.

use bridge_traits::engine::AudioBuffer;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ProjectError, Result};
use crate::meta::ProjectMeta;

/// A fully decoded project.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedProject {
    pub meta: ProjectMeta,
    pub channels: Vec<Vec<f64>>,
}

impl DecodedProject {
    /// Convert to the engine's `f32` planar buffer.
    pub fn into_audio_buffer(self) -> Result<AudioBuffer> {
        let channels = self
            .channels
            .into_iter()
            .map(|channel| channel.into_iter().map(|sample| sample as f32).collect())
            .collect();
        Ok(AudioBuffer::from_channels(channels, self.meta.sample_rate)?)
    }
}

/// Decode a project held as UTF-8 bytes.
pub fn decode_project_bytes(bytes: &[u8]) -> Result<DecodedProject> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ProjectError::MalformedHeader(format!("project is not UTF-8: {}", e)))?;
    decode_project_text(text)
}

/// Decode a project held as text.
///
/// Accepts `channels` or the legacy `data` array, and `sampleRate` or the
/// legacy `samplerate` field, either as a number or a numeric string.
pub fn decode_project_text(text: &str) -> Result<DecodedProject> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| ProjectError::MalformedHeader(e.to_string()))?;
    let empty = Map::new();
    let project = document.as_object().unwrap_or(&empty);

    let raw_channels = ["channels", "data"]
        .iter()
        .find_map(|key| project.get(*key).and_then(Value::as_array))
        .filter(|channels| !channels.is_empty())
        .ok_or_else(|| ProjectError::MalformedHeader("missing channel data".to_string()))?;

    let sample_rate = project_sample_rate(project)?;

    let mut channels = Vec::with_capacity(raw_channels.len());
    let mut frame_count = None;
    for (channel, raw) in raw_channels.iter().enumerate() {
        let samples = raw.as_array().ok_or_else(|| {
            ProjectError::MalformedHeader(format!("channel {} is not an array", channel))
        })?;

        let expected = *frame_count.get_or_insert(samples.len());
        if samples.len() != expected {
            return Err(ProjectError::MismatchedChannelLengths {
                expected,
                channel,
                actual: samples.len(),
            });
        }

        let values = samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                if sample.is_array() {
                    return Err(ProjectError::MalformedHeader(
                        "nested array inside a channel".to_string(),
                    ));
                }
                sample
                    .as_f64()
                    .filter(|value| value.is_finite())
                    .ok_or_else(|| ProjectError::InvalidSample {
                        channel,
                        index,
                        token: sample.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        channels.push(values);
    }

    let meta = ProjectMeta {
        name: project
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        sample_rate,
        channel_count: channels.len(),
        frame_count: frame_count.unwrap_or(0),
    };
    debug!(
        channels = meta.channel_count,
        frames = meta.frame_count,
        "Decoded in-memory project"
    );

    Ok(DecodedProject { meta, channels })
}

/// `sampleRate` when it is set to something non-zero, else `samplerate`.
fn project_sample_rate(project: &Map<String, Value>) -> Result<f64> {
    let raw = project
        .get("sampleRate")
        .filter(|value| is_truthy(value))
        .or_else(|| project.get("samplerate"));

    raw.and_then(numeric_value)
        .filter(|rate| rate.is_finite() && *rate > 0.0)
        .ok_or_else(|| {
            ProjectError::InvalidSampleRate(
                raw.map_or_else(|| "missing sampleRate".to_string(), Value::to_string),
            )
        })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
