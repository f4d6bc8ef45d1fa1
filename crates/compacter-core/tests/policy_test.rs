//! Compression target properties over a grid of realistic sources.

use compacter_core::{
    bits_per_pixel, compute_compression_target, CompressionPreset, SourceMediaInfo,
};

const RESOLUTIONS: [(u32, u32); 6] = [
    (3840, 2160),
    (1920, 1080),
    (1280, 720),
    (854, 480),
    (640, 360),
    (0, 0),
];

fn sources() -> Vec<SourceMediaInfo> {
    let mut sources = Vec::new();
    for (width, height) in RESOLUTIONS {
        for (size, duration_ms) in [
            (5_000_000u64, 10_000u64),
            (300_000_000, 600_000),
            (2_000_000_000, 3_600_000),
            (1, 7_200_000),
        ] {
            for bitrate in [0u32, 800_000, 12_000_000] {
                sources.push(
                    SourceMediaInfo::new(size, duration_ms)
                        .with_dimensions(width, height)
                        .with_bitrate(bitrate),
                );
            }
        }
    }
    sources
}

fn percentages() -> Vec<Option<u8>> {
    let mut all: Vec<Option<u8>> = (0..=110).step_by(5).map(|p| Some(p as u8)).collect();
    all.push(None);
    all
}

#[test]
fn test_no_upscale_and_positive_bitrate() {
    for source in sources() {
        let (_, height) = source.dimensions();
        for preset in CompressionPreset::ALL {
            for pct in percentages() {
                let target = compute_compression_target(pct, &source, &preset.as_fallback());
                assert!(target.target_bitrate_bps > 0, "{:?} {:?}", source, pct);
                if let Some(h) = target.target_height {
                    assert!(h < height, "upscale {} -> {} for {:?}", height, h, source);
                }
            }
        }
    }
}

#[test]
fn test_bitrate_monotonic_in_percentage() {
    let fallback = CompressionPreset::Balanced.as_fallback();
    for source in sources() {
        let mut previous = 0;
        for pct in 10..=100u8 {
            let bitrate = compute_compression_target(Some(pct), &source, &fallback).target_bitrate_bps;
            assert!(bitrate >= previous, "{:?} at {}%", source, pct);
            previous = bitrate;
        }
    }
}

#[test]
fn test_quality_floor_picks_ladder_rung() {
    let fallback = CompressionPreset::Balanced.as_fallback();
    for source in sources() {
        if source.duration_ms == 0 || source.original_size_bytes == 0 {
            continue;
        }
        let (width, height) = source.dimensions();
        let target = compute_compression_target(Some(10), &source, &fallback);
        let bpp = bits_per_pixel(target.target_bitrate_bps, width, height, 30);

        let expected = if bpp >= 0.05 {
            None
        } else if height > 1080 {
            Some(1080)
        } else if height > 720 {
            Some(720)
        } else if height > 480 {
            Some(480)
        } else {
            None
        };
        assert_eq!(target.target_height, expected, "{:?}", source);
    }
}

#[test]
fn test_hevc_flag_is_independent_of_policy() {
    let source = SourceMediaInfo::new(300_000_000, 600_000).with_dimensions(1920, 1080);
    let fallback = CompressionPreset::Light.as_fallback();
    let avc = compute_compression_target(Some(30), &source, &fallback);
    let hevc = avc.with_hevc(true);
    assert_eq!(avc.target_bitrate_bps, hevc.target_bitrate_bps);
    assert_eq!(avc.target_height, hevc.target_height);
    assert_eq!(hevc.video_mime_type(), "video/hevc");
    assert_eq!(avc.video_mime_type(), "video/avc");
}
