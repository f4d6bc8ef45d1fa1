//! Structured logging field name constants for compacter.
//!
//! All crates use these constants as `tracing` field names so log output can
//! be queried consistently across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Job or store failure the user will see |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Worker lifecycle, job completions |
//! | DEBUG | Decision points (policy path, downscale choice, index rebuilds) |
//! | TRACE | Per-item iteration (tag scoring, cache hits) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "policy", "search", "store", "jobs", "cli"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "suggestion_engine", "queue_store", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Job identifier (the queue item id it was created from).
pub const JOB_ID: &str = "job_id";

/// Index of the chain a job runs in.
pub const CHAIN: &str = "chain";

/// Suggestion query text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned.
pub const RESULT_COUNT: &str = "result_count";

/// Number of tags in an index.
pub const TAG_COUNT: &str = "tag_count";

/// Computed encoder bitrate.
pub const TARGET_BITRATE: &str = "target_bitrate";

/// Computed output height, when downscaling.
pub const TARGET_HEIGHT: &str = "target_height";

/// Bits per pixel per frame.
pub const BITS_PER_PIXEL: &str = "bpp";

/// Transcode progress percentage.
pub const PROGRESS: &str = "progress";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Error category (see `Error::kind`).
pub const ERROR_KIND: &str = "error_kind";
