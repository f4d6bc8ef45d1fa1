//! Compression job handler: validate, allocate, check storage, pick a
//! target, transcode, and record the outcome.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{debug, field, info, instrument, warn, Span};

use compacter_core::defaults::{
    ALLOWED_INPUT_SCHEMES, MIN_REQUIRED_SPACE_BYTES, OUTPUT_FILE_EXTENSION, OUTPUT_FILE_PREFIX,
    STORAGE_MULTIPLIER,
};
use compacter_core::{
    compute_compression_target, logging, CompressionTarget, Error, MediaLibrary, OutputStorage,
    Result, ResultItem, ResultStore, SettingsStore, SourceDetails, TranscodeRequest, Transcoder,
};

use crate::handler::{JobContext, JobHandler, JobResult};

/// What a successful compression produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressionOutcome {
    pub result_id: String,
    pub output_path: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
    pub target: CompressionTarget,
}

/// Accept only `content:` and `file:` URIs.
pub fn validate_input_uri(uri: &str) -> Result<()> {
    let scheme = uri.split_once(':').map(|(scheme, _)| scheme);
    match scheme {
        Some(s) if ALLOWED_INPUT_SCHEMES.contains(&s) => Ok(()),
        _ => Err(Error::Validation("Invalid input URI".to_string())),
    }
}

/// Free space needed before starting: 1.5x the original, at least 50 MiB.
pub fn required_space(original_size_bytes: u64) -> u64 {
    ((original_size_bytes as f64 * STORAGE_MULTIPLIER) as u64).max(MIN_REQUIRED_SPACE_BYTES)
}

/// `compressed_<millis>.mp4`
pub fn output_file_name(stamp_millis: i64) -> String {
    format!(
        "{}{}.{}",
        OUTPUT_FILE_PREFIX, stamp_millis, OUTPUT_FILE_EXTENSION
    )
}

/// Map a handler error to the worker's view of it.
///
/// Storage and I/O failures are treated as transient; everything else is
/// final.
pub fn job_result_for(error: &Error) -> JobResult {
    match error {
        Error::Storage(_) | Error::Io(_) => JobResult::Retry(error.to_string()),
        _ => JobResult::Failed(error.to_string()),
    }
}

/// Handler that compresses one queued video.
pub struct CompressionHandler {
    transcoder: Arc<dyn Transcoder>,
    storage: Arc<dyn OutputStorage>,
    results: ResultStore,
    settings: SettingsStore,
    library: Option<Arc<dyn MediaLibrary>>,
    last_stamp: AtomicI64,
}

impl CompressionHandler {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        storage: Arc<dyn OutputStorage>,
        results: ResultStore,
        settings: SettingsStore,
    ) -> Self {
        Self {
            transcoder,
            storage,
            results,
            settings,
            library: None,
            last_stamp: AtomicI64::new(0),
        }
    }

    /// Probe sources through `library` for bitrate, missing dimensions and
    /// the original's location.
    pub fn with_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    /// Run one job end to end.
    ///
    /// Validation and storage failures return before anything is written.
    /// A transcoder failure removes the partial output and records a failed
    /// [`ResultItem`] before returning [`Error::Execution`]. Transient
    /// transcoder errors (storage, I/O) only remove the partial output and
    /// are passed through unchanged.
    #[instrument(
        skip(self, ctx),
        fields(
            subsystem = "jobs",
            job_id = %ctx.job.id,
            attempt = ctx.attempt,
            target_bitrate = field::Empty,
            target_height = field::Empty
        )
    )]
    pub async fn compress(&self, ctx: &JobContext) -> Result<CompressionOutcome> {
        let job = &ctx.job;

        validate_input_uri(&job.input_uri)?;
        let output_path = self.allocate_output_path().await?;

        let available = self.storage.available_bytes().await?;
        let required = required_space(job.original_size_bytes);
        if available < required {
            debug!(available, required, "Storage check failed");
            return Err(Error::Resource("Insufficient storage space".to_string()));
        }

        let details = self.source_details(&job.input_uri).await;
        let media = match &details {
            Some(details) => job.media_info().fill_unknown(details),
            None => job.media_info(),
        };

        let settings = self.settings.load().await?;
        let target =
            compute_compression_target(job.target_percentage, &media, &job.preset.as_fallback())
                .with_hevc(settings.use_hevc);

        let span = Span::current();
        span.record(logging::TARGET_BITRATE, target.target_bitrate_bps);
        if let Some(height) = target.target_height {
            span.record(logging::TARGET_HEIGHT, height);
        }

        let request = TranscodeRequest {
            input_uri: job.input_uri.clone(),
            output_path: output_path.clone(),
            target,
        };
        let progress = |percent: u8| ctx.report_progress(percent, None);

        match self.transcoder.transcode(&request, &progress).await {
            Ok(output) => {
                let mut item = ResultItem::success(
                    job.original_name.clone(),
                    job.input_uri.clone(),
                    output.output_path.display().to_string(),
                    job.original_size_bytes,
                    output.output_size_bytes,
                );
                if let Some(details) = &details {
                    item = item.with_original_location(details);
                }
                let result_id = item.id.clone();
                self.results.add(item).await?;

                info!(
                    output = %output.output_path.display(),
                    compressed_size = output.output_size_bytes,
                    "Compression finished"
                );
                Ok(CompressionOutcome {
                    result_id,
                    output_path: output.output_path,
                    original_size: job.original_size_bytes,
                    compressed_size: output.output_size_bytes,
                    target,
                })
            }
            Err(e @ (Error::Storage(_) | Error::Io(_))) => {
                // Transient: the job will be retried, so no result is recorded.
                self.discard_partial_output(&output_path).await;
                Err(e)
            }
            Err(e) => {
                let cause = match e {
                    Error::Execution(message) => message,
                    other => other.to_string(),
                };

                self.discard_partial_output(&output_path).await;
                self.results
                    .add(ResultItem::failure(
                        job.original_name.clone(),
                        job.input_uri.clone(),
                        job.original_size_bytes,
                        cause.clone(),
                    ))
                    .await?;

                Err(Error::Execution(cause))
            }
        }
    }

    /// Library details for the source. A failed probe is logged and treated
    /// as unknown metadata.
    async fn source_details(&self, uri: &str) -> Option<SourceDetails> {
        let library = self.library.as_ref()?;
        match library.source_details(uri).await {
            Ok(details) => details,
            Err(e) => {
                warn!(error = %e, uri, "Could not probe source, using queued metadata");
                None
            }
        }
    }

    async fn discard_partial_output(&self, path: &Path) {
        if let Err(e) = self.storage.remove_file(path).await {
            warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove partial output"
            );
        }
    }

    /// Pick an unused `compressed_<millis>.mp4` inside the output directory.
    async fn allocate_output_path(&self) -> Result<PathBuf> {
        let dir = self.storage.output_dir();
        if !dir.is_absolute() {
            return Err(Error::Validation("Invalid output file path".to_string()));
        }

        loop {
            let path = dir.join(output_file_name(self.next_stamp()));
            if !path.starts_with(&dir) || path.parent() != Some(dir.as_path()) {
                return Err(Error::Validation("Invalid output file path".to_string()));
            }
            if self.storage.file_size(&path).await?.is_none() {
                return Ok(path);
            }
        }
    }

    // Strictly increasing, so parallel chains never share a file name.
    fn next_stamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = match self
            .last_stamp
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                Some(now.max(prev + 1))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        now.max(prev + 1)
    }
}

#[async_trait]
impl JobHandler for CompressionHandler {
    async fn execute(&self, ctx: JobContext) -> JobResult {
        match self.compress(&ctx).await {
            Ok(outcome) => JobResult::Success(serde_json::to_value(&outcome).ok()),
            Err(e) => {
                warn!(
                    job_id = %ctx.job.id,
                    error_kind = e.kind(),
                    error = %e,
                    "Compression job failed"
                );
                job_result_for(&e)
            }
        }
    }
}
