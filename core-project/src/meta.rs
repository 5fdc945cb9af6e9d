use serde::{Deserialize, Serialize};

/// Shape of a decoded project.
///
/// Produced by a completed decode pass. Every channel holds exactly
/// `frame_count` samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMeta {
    pub name: String,
    pub sample_rate: f64,
    pub channel_count: usize,
    pub frame_count: usize,
}

impl ProjectMeta {
    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frame_count as f64 / self.sample_rate
    }

    /// Same channel layout and rate, ignoring the name.
    pub fn same_shape(&self, other: &ProjectMeta) -> bool {
        self.sample_rate == other.sample_rate
            && self.channel_count == other.channel_count
            && self.frame_count == other.frame_count
    }
}
