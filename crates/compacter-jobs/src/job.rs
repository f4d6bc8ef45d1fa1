//! The per-item compression request.

use serde::{Deserialize, Serialize};

use compacter_core::{CompressionPreset, QueueItem, SourceMediaInfo, VideoItem};

/// Everything a handler needs to compress one queued video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionJob {
    /// Queue item id; also the job id in worker events.
    pub id: String,
    pub input_uri: String,
    /// Requested output size as a percentage of the original. `None`
    /// falls back to `preset`.
    pub target_percentage: Option<u8>,
    #[serde(default)]
    pub preset: CompressionPreset,
    pub original_size_bytes: u64,
    pub original_name: String,
    pub duration_ms: u64,
    /// 0 when unknown.
    #[serde(default)]
    pub width: u32,
    /// 0 when unknown.
    #[serde(default)]
    pub height: u32,
    /// 0 when unknown.
    #[serde(default)]
    pub bitrate_bps: u32,
}

impl CompressionJob {
    /// Job for a queued item. The queue does not store bitrate; the handler
    /// probes it from the media library when one is attached.
    pub fn from_queue_item(item: &QueueItem) -> Self {
        Self {
            id: item.id.clone(),
            input_uri: item.uri.clone(),
            target_percentage: item.target_percentage,
            preset: item.preset,
            original_size_bytes: item.size_bytes,
            original_name: item.name.clone(),
            duration_ms: item.duration_ms,
            width: item.width,
            height: item.height,
            bitrate_bps: 0,
        }
    }

    /// Fill in dimensions from library metadata.
    pub fn with_video(mut self, video: &VideoItem) -> Self {
        self.width = video.width;
        self.height = video.height;
        self
    }

    pub fn with_bitrate(mut self, bitrate_bps: u32) -> Self {
        self.bitrate_bps = bitrate_bps;
        self
    }

    pub fn with_preset(mut self, preset: CompressionPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Use the preset ceiling instead of a percentage.
    pub fn without_percentage(mut self) -> Self {
        self.target_percentage = None;
        self
    }

    /// Policy input. Unknown dimensions resolve to 1920x1080 in the policy.
    pub fn media_info(&self) -> SourceMediaInfo {
        SourceMediaInfo::new(self.original_size_bytes, self.duration_ms)
            .with_dimensions(self.width, self.height)
            .with_bitrate(self.bitrate_bps)
    }
}
