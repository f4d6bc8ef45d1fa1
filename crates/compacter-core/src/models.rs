//! Data models shared across compacter crates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// SOURCE MEDIA / COMPRESSION TARGET
// =============================================================================

/// Source metadata for one library item, as reported by the content index.
///
/// Zero means "unknown" for every field. Width and height fall back to
/// 1920×1080 through [`SourceMediaInfo::dimensions`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMediaInfo {
    /// Container bitrate in bits per second.
    pub bitrate_bps: u32,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Size of the source file in bytes.
    pub original_size_bytes: u64,
}

impl SourceMediaInfo {
    /// Create media info with known size and duration and unknown everything else.
    pub fn new(original_size_bytes: u64, duration_ms: u64) -> Self {
        Self {
            original_size_bytes,
            duration_ms,
            ..Default::default()
        }
    }

    /// Set frame dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the source bitrate.
    pub fn with_bitrate(mut self, bitrate_bps: u32) -> Self {
        self.bitrate_bps = bitrate_bps;
        self
    }

    /// Take bitrate and dimensions from probed details where this info has
    /// none. Dimensions are only taken as a pair.
    pub fn fill_unknown(mut self, details: &SourceDetails) -> Self {
        if self.bitrate_bps == 0 {
            self.bitrate_bps = details.bitrate_bps;
        }
        if (self.width == 0 || self.height == 0) && details.width > 0 && details.height > 0 {
            self.width = details.width;
            self.height = details.height;
        }
        self
    }

    /// Frame dimensions with unknown values replaced by 1920×1080.
    pub fn dimensions(&self) -> (u32, u32) {
        let width = if self.width == 0 {
            defaults::DEFAULT_WIDTH
        } else {
            self.width
        };
        let height = if self.height == 0 {
            defaults::DEFAULT_HEIGHT
        } else {
            self.height
        };
        (width, height)
    }
}

/// What the media library reports about one item when asked by URI.
///
/// Numeric fields are 0 when the library could not read them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDetails {
    #[serde(default)]
    pub bitrate_bps: u32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// File name as the library shows it.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Directory relative to the volume root, e.g. `DCIM/Camera/`.
    #[serde(default)]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub volume_name: Option<String>,
}

/// Encode parameters handed to the transcoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionTarget {
    /// Encoder bitrate in bits per second; always positive.
    pub target_bitrate_bps: u32,
    /// Output height, or `None` to keep the source height.
    pub target_height: Option<u32>,
    /// Encode HEVC instead of AVC.
    pub use_hevc: bool,
}

impl CompressionTarget {
    /// Pass the user's codec preference through.
    pub fn with_hevc(mut self, use_hevc: bool) -> Self {
        self.use_hevc = use_hevc;
        self
    }

    /// Output video MIME type for the selected codec.
    pub fn video_mime_type(&self) -> &'static str {
        if self.use_hevc {
            "video/hevc"
        } else {
            "video/avc"
        }
    }
}

// =============================================================================
// PRESETS
// =============================================================================

/// Bitrate ceiling and suggested height used when percentage-based
/// computation is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPreset {
    pub bitrate_ceiling: u32,
    pub suggested_height: Option<u32>,
}

/// Legacy fixed compression tiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompressionPreset {
    Quality,
    #[default]
    Balanced,
    Light,
    Small,
    ExtraSmall,
}

impl CompressionPreset {
    /// All tiers, highest quality first.
    pub const ALL: [CompressionPreset; 5] = [
        CompressionPreset::Quality,
        CompressionPreset::Balanced,
        CompressionPreset::Light,
        CompressionPreset::Small,
        CompressionPreset::ExtraSmall,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            CompressionPreset::Quality => "Quality",
            CompressionPreset::Balanced => "Balanced",
            CompressionPreset::Light => "Light",
            CompressionPreset::Small => "Small",
            CompressionPreset::ExtraSmall => "Extra Small",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CompressionPreset::Quality => "1.5GB/hour - 1080p",
            CompressionPreset::Balanced => "800MB/hour - 1080p",
            CompressionPreset::Light => "470MB/hour - 1080p",
            CompressionPreset::Small => "350MB/hour - 720p",
            CompressionPreset::ExtraSmall => "200MB/hour - 480p",
        }
    }

    /// Bitrate ceiling in bits per second.
    pub fn bitrate(&self) -> u32 {
        match self {
            CompressionPreset::Quality => 3_300_000,
            CompressionPreset::Balanced => 1_800_000,
            CompressionPreset::Light => 1_000_000,
            CompressionPreset::Small => 780_000,
            CompressionPreset::ExtraSmall => 450_000,
        }
    }

    /// Suggested output height.
    pub fn height(&self) -> Option<u32> {
        match self {
            CompressionPreset::Quality | CompressionPreset::Balanced | CompressionPreset::Light => {
                Some(1080)
            }
            CompressionPreset::Small => Some(720),
            CompressionPreset::ExtraSmall => Some(480),
        }
    }

    /// Stable storage name ("BALANCED", "EXTRA_SMALL", ...).
    pub fn name(&self) -> &'static str {
        match self {
            CompressionPreset::Quality => "QUALITY",
            CompressionPreset::Balanced => "BALANCED",
            CompressionPreset::Light => "LIGHT",
            CompressionPreset::Small => "SMALL",
            CompressionPreset::ExtraSmall => "EXTRA_SMALL",
        }
    }

    /// Parse a storage name; unknown names resolve to `Balanced`.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// Estimated output size in bytes for the given duration.
    pub fn estimated_size(&self, duration_ms: u64) -> u64 {
        (self.bitrate() as f64 * (duration_ms as f64 / 1000.0) / 8.0) as u64
    }

    pub fn as_fallback(&self) -> FallbackPreset {
        FallbackPreset {
            bitrate_ceiling: self.bitrate(),
            suggested_height: self.height(),
        }
    }
}

// =============================================================================
// LIBRARY
// =============================================================================

/// A video as listed by the media library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItem {
    pub id: i64,
    pub uri: String,
    pub name: String,
    pub duration_ms: u64,
    pub size_bytes: u64,
    /// Seconds since the epoch.
    pub date_added: i64,
    pub width: u32,
    pub height: u32,
    pub mime_type: String,
}

impl VideoItem {
    /// `H:MM:SS` when at least an hour long, else `M:SS`.
    pub fn duration_formatted(&self) -> String {
        let seconds = self.duration_ms / 1000;
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        let secs = seconds % 60;
        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{}:{:02}", minutes, secs)
        }
    }

    /// "4K" for 2160-line video, otherwise "{shorter side}p".
    pub fn resolution_label(&self) -> String {
        let min_dim = self.width.min(self.height);
        if min_dim == 2160 {
            "4K".to_string()
        } else {
            format!("{}p", min_dim)
        }
    }

    pub fn size_formatted(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / (1024.0 * 1024.0))
    }

    /// Policy input for this item. The library does not report bitrate.
    pub fn media_info(&self) -> SourceMediaInfo {
        SourceMediaInfo {
            bitrate_bps: 0,
            duration_ms: self.duration_ms,
            width: self.width,
            height: self.height,
            original_size_bytes: self.size_bytes,
        }
    }
}

/// Library ordering options, stored by numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    SizeDesc,
    SizeAsc,
    NameAsc,
}

impl SortOrder {
    pub fn code(&self) -> u8 {
        match self {
            SortOrder::DateDesc => 0,
            SortOrder::DateAsc => 1,
            SortOrder::SizeDesc => 2,
            SortOrder::SizeAsc => 3,
            SortOrder::NameAsc => 4,
        }
    }

    /// Unknown codes map to `DateDesc`.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => SortOrder::DateAsc,
            2 => SortOrder::SizeDesc,
            3 => SortOrder::SizeAsc,
            4 => SortOrder::NameAsc,
            _ => SortOrder::DateDesc,
        }
    }
}

// =============================================================================
// QUEUE / RESULTS / SETTINGS
// =============================================================================

/// A video waiting to be compressed.
///
/// With a `target_percentage` the item is planned by output size; without
/// one it falls back to `preset`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub size_bytes: u64,
    pub duration_ms: u64,
    /// 0 when unknown.
    #[serde(default)]
    pub width: u32,
    /// 0 when unknown.
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub preset: CompressionPreset,
    #[serde(default, alias = "compression_percentage")]
    pub target_percentage: Option<u8>,
}

impl QueueItem {
    /// Queue a library video on the default preset with a fresh id.
    pub fn from_video(video: &VideoItem) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: video.name.clone(),
            uri: video.uri.clone(),
            size_bytes: video.size_bytes,
            duration_ms: video.duration_ms,
            width: video.width,
            height: video.height,
            preset: CompressionPreset::default(),
            target_percentage: None,
        }
    }

    pub fn with_percentage(mut self, percentage: u8) -> Self {
        self.target_percentage = Some(percentage);
        self
    }

    pub fn with_preset(mut self, preset: CompressionPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Expected output size: the percentage of the original, or the preset
    /// bitrate over the duration (never more than the original).
    pub fn estimated_size_bytes(&self) -> u64 {
        match self.target_percentage {
            Some(percentage) => crate::policy::estimate_output_size(self.size_bytes, percentage),
            None => self
                .preset
                .estimated_size(self.duration_ms)
                .min(self.size_bytes),
        }
    }

    pub fn size_formatted(&self) -> String {
        format_megabytes(self.size_bytes)
    }

    pub fn estimated_size_formatted(&self) -> String {
        format_megabytes(self.estimated_size_bytes())
    }

    /// "{m}m {s}s", or "{s}s" under a minute.
    pub fn duration_formatted(&self) -> String {
        let seconds = self.duration_ms / 1000;
        let minutes = seconds / 60;
        let secs = seconds % 60;
        if minutes > 0 {
            format!("{}m {}s", minutes, secs)
        } else {
            format!("{}s", secs)
        }
    }
}

/// Aggregate numbers shown above the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub total_bytes: u64,
    pub estimated_bytes: u64,
    /// Whole percent saved; 0 for an empty queue.
    pub savings_percent: u32,
}

impl QueueStats {
    pub fn from_items(items: &[QueueItem]) -> Self {
        let total_bytes: u64 = items.iter().map(|i| i.size_bytes).sum();
        let estimated_bytes: u64 = items.iter().map(|i| i.estimated_size_bytes()).sum();
        let savings_percent = percent_saved(total_bytes, estimated_bytes);
        Self {
            total_bytes,
            estimated_bytes,
            savings_percent,
        }
    }

    pub fn total_formatted(&self) -> String {
        format_megabytes(self.total_bytes)
    }

    pub fn estimated_formatted(&self) -> String {
        format_megabytes(self.estimated_bytes)
    }
}

/// Outcome of one compression job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub original_uri: Option<String>,
    pub output_path: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub is_success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub original_display_name: Option<String>,
    #[serde(default)]
    pub original_relative_path: Option<String>,
    #[serde(default)]
    pub original_volume_name: Option<String>,
}

impl ResultItem {
    pub fn success(
        name: impl Into<String>,
        original_uri: impl Into<String>,
        output_path: impl Into<String>,
        original_size: u64,
        compressed_size: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            original_uri: Some(original_uri.into()),
            output_path: output_path.into(),
            original_size,
            compressed_size,
            is_success: true,
            error_message: None,
            original_display_name: None,
            original_relative_path: None,
            original_volume_name: None,
        }
    }

    pub fn failure(
        name: impl Into<String>,
        original_uri: impl Into<String>,
        original_size: u64,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            original_uri: Some(original_uri.into()),
            output_path: String::new(),
            original_size,
            compressed_size: 0,
            is_success: false,
            error_message: Some(error_message.into()),
            original_display_name: None,
            original_relative_path: None,
            original_volume_name: None,
        }
    }

    /// Record where the original lives so it can be replaced later.
    pub fn with_original_location(mut self, details: &SourceDetails) -> Self {
        self.original_display_name = details.display_name.clone();
        self.original_relative_path = details.relative_path.clone();
        self.original_volume_name = details.volume_name.clone();
        self
    }

    /// Whole percent saved; 0 when the original size is unknown.
    pub fn savings_percent(&self) -> u32 {
        percent_saved(self.original_size, self.compressed_size)
    }
}

fn default_max_parallel() -> usize {
    defaults::JOB_MAX_PARALLEL
}

fn default_true() -> bool {
    true
}

fn default_max_selection() -> u32 {
    defaults::MAX_SELECTION
}

/// User-facing preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub show_resolution: bool,
    #[serde(default = "default_max_selection")]
    pub max_selection: u32,
    #[serde(default)]
    pub onboarding_completed: bool,
    #[serde(default = "default_true")]
    pub is_grid_view: bool,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub use_hevc: bool,
    #[serde(default = "default_max_parallel")]
    pub max_parallel_tasks: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            show_resolution: false,
            max_selection: defaults::MAX_SELECTION,
            onboarding_completed: false,
            is_grid_view: true,
            sort_order: SortOrder::DateDesc,
            use_hevc: false,
            max_parallel_tasks: defaults::JOB_MAX_PARALLEL,
        }
    }
}

impl UserSettings {
    /// Parallel chain count clamped to the supported range.
    pub fn clamped_parallel_tasks(&self) -> usize {
        self.max_parallel_tasks
            .clamp(1, defaults::JOB_MAX_PARALLEL_LIMIT)
    }
}

/// Whole percent saved going from `before` to `after` bytes, truncated.
fn percent_saved(before: u64, after: u64) -> u32 {
    if before == 0 {
        return 0;
    }
    (before.saturating_sub(after) as u128 * 100 / before as u128) as u32
}

/// Format a byte count as "{:.1} MB".
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
}
