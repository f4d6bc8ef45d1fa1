//! Interfaces to the platform services compacter drives.
//!
//! Transcoding, the media library, storage probing and durable key-value
//! storage are external collaborators. These traits are the seams where
//! concrete backends (or test doubles) plug in.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{CompressionTarget, SourceDetails, VideoItem};

// =============================================================================
// TRANSCODER
// =============================================================================

/// One transcode request: source, destination, and encode parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeRequest {
    /// Source URI (`content://` or `file://`)
    pub input_uri: String,
    /// Destination file
    pub output_path: PathBuf,
    /// Bitrate, height and codec
    pub target: CompressionTarget,
}

/// Successful transcode outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOutput {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
}

/// Progress sink: receives whole percentages (0-100).
///
/// Borrowed for the duration of one transcode, so the callback may capture
/// references.
pub type ProgressSink<'a> = dyn Fn(u8) + Send + Sync + 'a;

/// Media transcoding backend.
///
/// Implementations report progress through `progress` and return once the
/// export has completed or failed. Failures are reported as
/// [`crate::Error::Execution`] with the backend's message preserved.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(
        &self,
        request: &TranscodeRequest,
        progress: &ProgressSink<'_>,
    ) -> Result<TranscodeOutput>;
}

// =============================================================================
// MEDIA LIBRARY
// =============================================================================

/// Paged listing of the device video library, newest first.
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn list_videos(&self, limit: usize, offset: usize) -> Result<Vec<VideoItem>>;

    /// Probe one item by URI: bitrate, dimensions and where it is stored.
    ///
    /// `None` when the library no longer has the item.
    async fn source_details(&self, uri: &str) -> Result<Option<SourceDetails>>;
}

// =============================================================================
// OUTPUT STORAGE
// =============================================================================

/// File-system operations needed around a transcode.
#[async_trait]
pub trait OutputStorage: Send + Sync {
    /// Directory compressed files are written to.
    fn output_dir(&self) -> PathBuf;

    /// Free bytes on the output volume.
    async fn available_bytes(&self) -> Result<u64>;

    /// Size of a file, if it exists.
    async fn file_size(&self, path: &Path) -> Result<Option<u64>>;

    /// Remove a file; missing files are not an error.
    async fn remove_file(&self, path: &Path) -> Result<()>;
}

// =============================================================================
// KEY-VALUE STORE
// =============================================================================

/// Durable string key-value store backing queue, results and settings.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}
