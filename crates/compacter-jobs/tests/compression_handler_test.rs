//! Compression handler behavior against fake collaborators.

mod common;

use std::path::Path;
use std::sync::{Arc, Mutex};

use common::{job, Harness, Outcome, FakeStorage, OUTPUT_DIR};
use compacter_jobs::{
    compute_compression_target, CompressionPreset, Error, JobContext, JobHandler, JobResult,
    SourceDetails,
};

const MIB: u64 = 1024 * 1024;

#[tokio::test]
async fn test_successful_compression_records_result() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(40 * MIB));
    let handler = harness.handler();
    let job = job("1");

    let outcome = handler.compress(&JobContext::new(job.clone())).await.unwrap();

    assert_eq!(outcome.output_path.parent(), Some(Path::new(OUTPUT_DIR)));
    let file_name = outcome.output_path.file_name().unwrap().to_string_lossy();
    assert!(file_name.starts_with("compressed_"));
    assert!(file_name.ends_with(".mp4"));
    assert_eq!(outcome.compressed_size, 40 * MIB);

    let expected = compute_compression_target(
        Some(50),
        &job.media_info(),
        &CompressionPreset::Balanced.as_fallback(),
    );
    assert_eq!(outcome.target, expected);
    assert_eq!(harness.transcoder.requests()[0].target, expected);

    let results = harness.results.list().await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_success);
    assert_eq!(results[0].id, outcome.result_id);
    assert_eq!(results[0].name, "1.mp4");
    assert_eq!(results[0].compressed_size, 40 * MIB);
    assert_eq!(results[0].savings_percent(), 60);
}

#[tokio::test]
async fn test_progress_is_forwarded() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let ctx = JobContext::new(job("1"))
        .with_progress_callback(move |percent, _| sink.lock().unwrap().push(percent));

    harness.handler().compress(&ctx).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![0, 50, 100]);
}

#[tokio::test]
async fn test_invalid_uri_is_validation_error() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let mut job = job("1");
    job.input_uri = "https://example.com/video.mp4".to_string();

    let err = harness
        .handler()
        .compress(&JobContext::new(job))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == "Invalid input URI"));
    assert!(harness.transcoder.requests().is_empty());
    assert!(harness.results.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relative_output_dir_is_rejected() {
    let harness = Harness::build(
        FakeStorage::with_dir("movies", u64::MAX),
        Outcome::Succeed(MIB),
        Vec::new(),
    );
    let err = harness
        .handler()
        .compress(&JobContext::new(job("1")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == "Invalid output file path"));
}

#[tokio::test]
async fn test_low_storage_is_resource_error() {
    // 100 MiB original needs 150 MiB free
    let harness = Harness::new(149 * MIB, Outcome::Succeed(MIB));
    let err = harness
        .handler()
        .compress(&JobContext::new(job("1")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Resource(ref m) if m == "Insufficient storage space"));
    assert!(harness.transcoder.requests().is_empty());
}

#[tokio::test]
async fn test_small_file_still_needs_minimum_space() {
    let harness = Harness::new(49 * MIB, Outcome::Succeed(MIB));
    let mut job = job("1");
    job.original_size_bytes = MIB;
    let result = harness.handler().execute(JobContext::new(job)).await;
    assert_eq!(
        result,
        JobResult::Failed("Resource error: Insufficient storage space".to_string())
    );
}

#[tokio::test]
async fn test_transcoder_failure_cleans_up_and_records() {
    let harness = Harness::new(u64::MAX, Outcome::Fail("encoder crashed".to_string()));
    let err = harness
        .handler()
        .compress(&JobContext::new(job("1")))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Execution(ref m) if m == "encoder crashed"));
    assert!(harness.storage.files().is_empty());
    assert_eq!(harness.storage.removed().len(), 1);

    let results = harness.results.list().await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].is_success);
    assert_eq!(results[0].error_message.as_deref(), Some("encoder crashed"));
    assert_eq!(results[0].output_path, "");
    assert_eq!(results[0].compressed_size, 0);
}

#[tokio::test]
async fn test_execute_maps_failures() {
    let harness = Harness::new(u64::MAX, Outcome::Fail("bad frame".to_string()));
    let result = harness.handler().execute(JobContext::new(job("1"))).await;
    assert_eq!(result, JobResult::Failed("Execution error: bad frame".to_string()));

    let harness = Harness::new(u64::MAX, Outcome::Transient("store busy".to_string()));
    let result = harness.handler().execute(JobContext::new(job("1"))).await;
    assert!(matches!(result, JobResult::Retry(_)));
}

#[tokio::test]
async fn test_execute_success_carries_outcome() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let result = harness.handler().execute(JobContext::new(job("1"))).await;
    match result {
        JobResult::Success(Some(value)) => {
            assert_eq!(value["compressed_size"], MIB);
            assert!(value["output_path"].as_str().unwrap().starts_with(OUTPUT_DIR));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_hevc_setting_is_applied() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    harness.settings.set_use_hevc(true).await.unwrap();

    harness
        .handler()
        .compress(&JobContext::new(job("1")))
        .await
        .unwrap();
    let request = &harness.transcoder.requests()[0];
    assert!(request.target.use_hevc);
    assert_eq!(request.target.video_mime_type(), "video/hevc");
}

#[tokio::test]
async fn test_preset_fallback_without_percentage() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let job = job("1")
        .with_preset(CompressionPreset::Small)
        .without_percentage();

    let outcome = harness
        .handler()
        .compress(&JobContext::new(job))
        .await
        .unwrap();
    assert_eq!(outcome.target.target_bitrate_bps, 780_000);
    assert_eq!(outcome.target.target_height, Some(720));
}

#[tokio::test]
async fn test_output_names_are_unique() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let handler = harness.handler();
    let first = handler.compress(&JobContext::new(job("1"))).await.unwrap();
    let second = handler.compress(&JobContext::new(job("2"))).await.unwrap();
    assert_ne!(first.output_path, second.output_path);
    assert_eq!(harness.storage.files().len(), 2);
}

#[tokio::test]
async fn test_probed_bitrate_caps_preset_fallback() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let job = job("1")
        .with_preset(CompressionPreset::Small)
        .without_percentage();
    harness.library.insert(
        &job.input_uri,
        SourceDetails {
            bitrate_bps: 800_000,
            ..Default::default()
        },
    );

    let outcome = harness
        .handler()
        .compress(&JobContext::new(job))
        .await
        .unwrap();
    // 0.8 x 800 kbps is below the 780 kbps ceiling
    assert_eq!(outcome.target.target_bitrate_bps, 640_000);
    assert_eq!(outcome.target.target_height, Some(720));
}

#[tokio::test]
async fn test_probed_dimensions_prevent_upscale() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let mut job = job("1");
    job.width = 0;
    job.height = 0;
    job.target_percentage = Some(10);
    harness.library.insert(
        &job.input_uri,
        SourceDetails {
            width: 854,
            height: 480,
            ..Default::default()
        },
    );

    let outcome = harness
        .handler()
        .compress(&JobContext::new(job))
        .await
        .unwrap();
    // planned as 854x480 rather than the 1920x1080 default, which would pick 720
    assert_eq!(outcome.target.target_bitrate_bps, 1_398_101);
    assert_eq!(outcome.target.target_height, None);
}

#[tokio::test]
async fn test_success_records_original_location() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    let job = job("1");
    harness.library.insert(
        &job.input_uri,
        SourceDetails {
            display_name: Some("1.mp4".to_string()),
            relative_path: Some("DCIM/Camera/".to_string()),
            volume_name: Some("external_primary".to_string()),
            ..Default::default()
        },
    );

    harness
        .handler()
        .compress(&JobContext::new(job))
        .await
        .unwrap();

    let result = &harness.results.list().await.unwrap()[0];
    assert_eq!(result.original_display_name.as_deref(), Some("1.mp4"));
    assert_eq!(result.original_relative_path.as_deref(), Some("DCIM/Camera/"));
    assert_eq!(result.original_volume_name.as_deref(), Some("external_primary"));
}

#[tokio::test]
async fn test_failed_probe_uses_job_metadata() {
    let harness = Harness::new(u64::MAX, Outcome::Succeed(MIB));
    harness.library.set_unavailable();
    let job = job("1");

    let outcome = harness
        .handler()
        .compress(&JobContext::new(job.clone()))
        .await
        .unwrap();
    let expected = compute_compression_target(
        Some(50),
        &job.media_info(),
        &CompressionPreset::Balanced.as_fallback(),
    );
    assert_eq!(outcome.target, expected);

    let result = &harness.results.list().await.unwrap()[0];
    assert!(result.is_success);
    assert_eq!(result.original_display_name, None);
}
