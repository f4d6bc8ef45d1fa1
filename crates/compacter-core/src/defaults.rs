//! Centralized default constants for compacter.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers. Organized by domain area.

// =============================================================================
// COMPRESSION POLICY
// =============================================================================

/// Frame rate assumed when computing bits-per-pixel. No probing is done.
pub const ASSUMED_FPS: u32 = 30;

/// Bits-per-pixel-per-frame below which the policy downscales.
pub const MIN_BITS_PER_PIXEL: f64 = 0.05;

/// Downscale ladder, tallest first. The policy picks the first rung below
/// the source height.
pub const DOWNSCALE_LADDER: [u32; 3] = [1080, 720, 480];

/// Fraction of the source bitrate used as a ceiling on the fallback path.
pub const SOURCE_BITRATE_FACTOR: f64 = 0.8;

/// Lowest accepted target percentage.
pub const TARGET_PERCENT_MIN: u8 = 10;

/// Highest accepted target percentage.
pub const TARGET_PERCENT_MAX: u8 = 100;

/// Starting percentage for a size-based request, before the user adjusts it.
pub const TARGET_PERCENT_DEFAULT: u8 = 50;

/// Width assumed when the content index reports none.
pub const DEFAULT_WIDTH: u32 = 1920;

/// Height assumed when the content index reports none.
pub const DEFAULT_HEIGHT: u32 = 1080;

// =============================================================================
// SUGGESTIONS
// =============================================================================

/// Capacity of the normalization LRU cache.
pub const NORMALIZATION_CACHE_CAPACITY: usize = 500;

/// Number of library items indexed for suggestions.
pub const TAG_INDEX_CAP: usize = 600;

/// Candidates collected before the suggestion scan stops.
pub const SUGGESTION_SCAN_LIMIT: usize = 200;

/// Default number of suggestions returned.
pub const SUGGESTION_MAX_RESULTS: usize = 10;

/// Highest score that still counts as a match.
pub const SUGGESTION_MAX_SCORE: u8 = 4;

/// Score assigned to non-matching tags.
pub const SUGGESTION_NO_MATCH: u8 = 99;

/// Input stillness hosts should wait before asking for suggestions.
pub const SUGGESTION_DEBOUNCE_MS: u64 = 120;

/// Names longer than this are not indexed as a whole-title tag.
pub const TAG_WHOLE_NAME_MAX_CHARS: usize = 80;

/// Minimum token length for CJK and Latin tags.
pub const TAG_TOKEN_MIN_CHARS: usize = 2;

/// Maximum token length for CJK and Latin tags.
pub const TAG_TOKEN_MAX_CHARS: usize = 16;

// =============================================================================
// STORES
// =============================================================================

/// Maximum queued items; older entries are dropped first.
pub const QUEUE_MAX_ITEMS: usize = 100;

/// Maximum stored results; oldest entries are dropped first.
pub const RESULTS_MAX_ITEMS: usize = 50;

/// Default cap on how many videos can be selected at once.
pub const MAX_SELECTION: u32 = 100;

// =============================================================================
// JOB PROCESSING
// =============================================================================

/// Default number of parallel compression chains.
pub const JOB_MAX_PARALLEL: usize = 1;

/// Upper bound for parallel compression chains.
pub const JOB_MAX_PARALLEL_LIMIT: usize = 3;

/// Linear backoff interval in milliseconds (attempt × interval).
pub const JOB_BACKOFF_INTERVAL_MS: u64 = 30_000;

/// Default maximum retry count for jobs asking to be retried.
pub const JOB_MAX_RETRIES: u32 = 3;

/// Default event broadcast channel capacity.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Free space required relative to the original size.
pub const STORAGE_MULTIPLIER: f64 = 1.5;

/// Free space always required, regardless of source size (50 MiB).
pub const MIN_REQUIRED_SPACE_BYTES: u64 = 50 * 1024 * 1024;

/// URI schemes accepted as compression input.
pub const ALLOWED_INPUT_SCHEMES: [&str; 2] = ["content", "file"];

/// Prefix of generated output files.
pub const OUTPUT_FILE_PREFIX: &str = "compressed_";

/// Extension of generated output files.
pub const OUTPUT_FILE_EXTENSION: &str = "mp4";
