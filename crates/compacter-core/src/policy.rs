//! Bitrate and resolution target selection.
//!
//! Turns a requested "percentage of original size" into encoder parameters.
//! The bitrate is derived directly from the size budget. The resolution is
//! lowered only when that bitrate would leave too few bits per pixel at the
//! source resolution.
//!
//! # Paths
//!
//! - **Percentage path**: percentage present, duration > 0, size > 0.
//!   `bitrate = floor(size * pct/100 * 8 / (duration_ms / 1000))`. If
//!   `bitrate / (w * h * fps)` is below the quality floor, downscale to the
//!   tallest ladder rung strictly below the source height.
//! - **Fallback path**: everything else. The preset ceiling, further capped at
//!   80% of the source bitrate when that is known. The preset height is used
//!   only when it is below the source height.
//!
//! Both paths are total: missing metadata degrades to a conservative default
//! and the returned bitrate is always positive. The height is never raised.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults;
use crate::models::{CompressionTarget, FallbackPreset, SourceMediaInfo};

/// Tunable constants for the policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Frame rate assumed for bits-per-pixel computation
    pub assumed_fps: u32,
    /// Bits-per-pixel-per-frame below which the output is downscaled
    pub min_bits_per_pixel: f64,
    /// Candidate output heights, tallest first
    pub downscale_ladder: Vec<u32>,
    /// Fraction of the source bitrate allowed on the fallback path
    pub source_bitrate_factor: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            assumed_fps: defaults::ASSUMED_FPS,
            min_bits_per_pixel: defaults::MIN_BITS_PER_PIXEL,
            downscale_ladder: defaults::DOWNSCALE_LADDER.to_vec(),
            source_bitrate_factor: defaults::SOURCE_BITRATE_FACTOR,
        }
    }
}

/// Compute encode parameters with the default [`PolicyConfig`].
///
/// `use_hevc` is left `false`; callers pass the user's codec preference
/// through with [`CompressionTarget::with_hevc`].
///
/// # Examples
///
/// ```
/// use compacter_core::{compute_compression_target, CompressionPreset, SourceMediaInfo};
///
/// // 1 GB, one hour, 1080p, asking for 50%
/// let source = SourceMediaInfo::new(1_000_000_000, 3_600_000).with_dimensions(1920, 1080);
/// let target = compute_compression_target(
///     Some(50),
///     &source,
///     &CompressionPreset::Balanced.as_fallback(),
/// );
/// assert_eq!(target.target_bitrate_bps, 1_111_111);
/// assert_eq!(target.target_height, Some(720));
/// ```
pub fn compute_compression_target(
    target_percentage: Option<u8>,
    source: &SourceMediaInfo,
    fallback: &FallbackPreset,
) -> CompressionTarget {
    compute_compression_target_with(&PolicyConfig::default(), target_percentage, source, fallback)
}

/// Compute encode parameters with explicit policy constants.
pub fn compute_compression_target_with(
    config: &PolicyConfig,
    target_percentage: Option<u8>,
    source: &SourceMediaInfo,
    fallback: &FallbackPreset,
) -> CompressionTarget {
    let (width, height) = source.dimensions();

    let target = match target_percentage {
        Some(pct) if source.duration_ms > 0 && source.original_size_bytes > 0 => {
            let pct = pct.clamp(defaults::TARGET_PERCENT_MIN, defaults::TARGET_PERCENT_MAX);
            percentage_target(config, pct, source, width, height)
        }
        _ => fallback_target(config, source, fallback, height),
    };

    debug!(
        subsystem = "policy",
        target_bitrate = target.target_bitrate_bps,
        target_height = ?target.target_height,
        source_height = height,
        "Computed compression target"
    );

    target
}

fn percentage_target(
    config: &PolicyConfig,
    pct: u8,
    source: &SourceMediaInfo,
    width: u32,
    height: u32,
) -> CompressionTarget {
    let target_bits = source.original_size_bytes as f64 * (pct as f64 / 100.0) * 8.0;
    let duration_secs = source.duration_ms as f64 / 1000.0;
    let bitrate = clamp_bitrate((target_bits / duration_secs).floor());

    let bpp = bits_per_pixel(bitrate, width, height, config.assumed_fps);
    let target_height = if bpp < config.min_bits_per_pixel {
        downscale_height(&config.downscale_ladder, height)
    } else {
        None
    };

    debug!(
        path = "percentage",
        pct,
        bpp,
        downscale = target_height.is_some(),
        "Percentage path"
    );

    CompressionTarget {
        target_bitrate_bps: bitrate,
        target_height,
        use_hevc: false,
    }
}

fn fallback_target(
    config: &PolicyConfig,
    source: &SourceMediaInfo,
    fallback: &FallbackPreset,
    height: u32,
) -> CompressionTarget {
    let ceiling = fallback.bitrate_ceiling.max(1);
    let bitrate = if source.bitrate_bps > 0 {
        let capped = clamp_bitrate(source.bitrate_bps as f64 * config.source_bitrate_factor);
        ceiling.min(capped)
    } else {
        ceiling
    };

    let target_height = fallback.suggested_height.filter(|h| *h < height);

    debug!(
        path = "fallback",
        source_bitrate = source.bitrate_bps,
        ceiling,
        "Fallback path"
    );

    CompressionTarget {
        target_bitrate_bps: bitrate,
        target_height,
        use_hevc: false,
    }
}

/// Bits per pixel per frame for a bitrate at the given resolution.
pub fn bits_per_pixel(bitrate_bps: u32, width: u32, height: u32, fps: u32) -> f64 {
    let pixels_per_sec = width as f64 * height as f64 * fps as f64;
    if pixels_per_sec <= 0.0 {
        return f64::INFINITY;
    }
    bitrate_bps as f64 / pixels_per_sec
}

/// Tallest rung strictly below `source_height`, if any.
pub fn downscale_height(ladder: &[u32], source_height: u32) -> Option<u32> {
    ladder
        .iter()
        .copied()
        .filter(|h| *h < source_height)
        .max()
}

/// Estimated output size in bytes when compressing to `percentage` of the original.
pub fn estimate_output_size(size_bytes: u64, percentage: u8) -> u64 {
    (size_bytes as u128 * percentage as u128 / 100) as u64
}

fn clamp_bitrate(value: f64) -> u32 {
    value.clamp(1.0, u32::MAX as f64) as u32
}
