//! Project file writer.
//!
//! Produces the document both decoders accept. `channels` is written before
//! `timestamp`, and the streaming decoder stops reading at the end of the
//! channel array.

use bridge_traits::engine::AudioBuffer;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use bytes::Bytes;
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument};

use crate::error::{ProjectError, Result};

/// Format version written to every project.
pub const PROJECT_VERSION: &str = "1.0";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDocument<'a> {
    name: &'a str,
    version: &'static str,
    sample_rate: f64,
    channels: &'a [Vec<f32>],
    timestamp: i64,
}

/// Serialize `buffer` as a project document named `name`.
///
/// Fails with [`ProjectError::InvalidSampleRate`] for a non-finite or
/// non-positive rate and [`ProjectError::InvalidSample`] for the first
/// non-finite sample.
pub fn encode_project(name: &str, buffer: &AudioBuffer, clock: &dyn Clock) -> Result<String> {
    check_encodable(buffer)?;
    let document = ProjectDocument {
        name,
        version: PROJECT_VERSION,
        sample_rate: buffer.sample_rate(),
        channels: buffer.channels(),
        timestamp: clock.unix_timestamp_millis(),
    };
    serde_json::to_string(&document)
        .map_err(|e| ProjectError::MalformedHeader(format!("cannot encode project: {}", e)))
}

fn check_encodable(buffer: &AudioBuffer) -> Result<()> {
    let sample_rate = buffer.sample_rate();
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(ProjectError::InvalidSampleRate(sample_rate.to_string()));
    }

    for (channel, samples) in buffer.channels().iter().enumerate() {
        if let Some((index, sample)) = samples
            .iter()
            .enumerate()
            .find(|(_, sample)| !sample.is_finite())
        {
            return Err(ProjectError::InvalidSample {
                channel,
                index,
                token: sample.to_string(),
            });
        }
    }
    Ok(())
}

/// Encode `buffer` and write it to `path` through the host file system.
#[instrument(skip(fs, buffer, clock), fields(path = %path.display()))]
pub async fn save_project(
    fs: &dyn FileSystemAccess,
    path: &Path,
    name: &str,
    buffer: &AudioBuffer,
    clock: &dyn Clock,
) -> Result<()> {
    let document = encode_project(name, buffer, clock)?;
    let size = document.len();
    fs.write_file(path, Bytes::from(document)).await?;
    info!(size, channels = buffer.channel_count(), "Saved project");
    Ok(())
}
